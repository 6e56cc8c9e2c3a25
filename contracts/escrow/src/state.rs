use cosmwasm_schema::cw_serde;
use cosmwasm_std::{to_json_vec, Addr, HexBinary, StdResult, Uint128};
use cw_storage_plus::Map;
use sha2::{Digest, Sha256};

pub const SALT_LEN: usize = 12;
pub const SETTLEMENT_ID_LEN: usize = 32;

#[cw_serde]
pub enum Token {
    Native { denom: String },
    Cw20 { contract: Addr },
}

/// Funds locked for one cross-chain intent
#[cw_serde]
pub struct Escrow {
    /// Random salt for escrow uniqueness
    pub salt: HexBinary,
    /// Address that deposited the funds
    pub depositor: Addr,
    /// Address paid on settlement
    pub recipient: Addr,
    pub token: Token,
    /// Settler queried for the attestation
    pub settler: Addr,
    /// Attesting sender on the output chain; not validated here
    pub sender: String,
    /// Usually the output intent digest
    pub settlement_id: HexBinary,
    pub sender_chain_id: u64,
    pub escrow_amount: Uint128,
    /// Paid back to the depositor on refund
    pub refund_amount: Uint128,
    /// Refunds open strictly after this time (seconds)
    pub refund_timestamp: u64,
}

impl Escrow {
    /// sha256 of the record's JSON encoding
    pub fn id(&self) -> StdResult<HexBinary> {
        let encoded = to_json_vec(self)?;
        Ok(HexBinary::from(Sha256::digest(&encoded).as_slice()))
    }

    /// Share of a refund that goes to the recipient
    pub fn recipient_refund(&self) -> Uint128 {
        self.escrow_amount.saturating_sub(self.refund_amount)
    }
}

#[cw_serde]
pub enum EscrowStatus {
    /// No escrow with this id
    Null,
    Created,
    /// Depositor share refunded, recipient share pending
    RefundDeposit,
    /// Recipient share refunded, depositor share pending
    RefundRecipient,
    Finalized,
}

pub const ESCROWS: Map<&[u8], Escrow> = Map::new("escrows");
pub const STATUSES: Map<&[u8], EscrowStatus> = Map::new("statuses");
