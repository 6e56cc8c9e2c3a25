use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{HexBinary, Uint128};

use crate::state::{Escrow, EscrowStatus};

#[cw_serde]
pub struct InstantiateMsg {}

#[cw_serde]
pub enum ExecuteMsg {
    /// Lock funds for each record
    ///
    /// Native records must be paid exactly by the attached funds; cw20
    /// records are pulled from the caller with `transfer_from`.
    Escrow { escrows: Vec<Escrow> },
    /// Pay the depositor share of expired escrows
    RefundDepositor { ids: Vec<HexBinary> },
    /// Pay the recipient share of expired escrows
    RefundRecipient { ids: Vec<HexBinary> },
    /// Pay every still-pending share of expired escrows
    Refund { ids: Vec<HexBinary> },
    /// Release escrows whose settlement the settler has attested
    Settle { ids: Vec<HexBinary> },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(EscrowResponse)]
    Escrow { id: HexBinary },

    #[returns(StatusResponse)]
    Status { id: HexBinary },

    /// Id a record would be stored under
    #[returns(HexBinary)]
    EscrowId { escrow: Escrow },
}

#[cw_serde]
pub struct EscrowResponse {
    pub id: HexBinary,
    pub escrow: Escrow,
    pub status: EscrowStatus,
}

#[cw_serde]
pub struct StatusResponse {
    pub status: EscrowStatus,
}

/// Subset of the cw20 interface the escrow calls
#[cw_serde]
pub enum Cw20ExecuteMsg {
    Transfer {
        recipient: String,
        amount: Uint128,
    },
    TransferFrom {
        owner: String,
        recipient: String,
        amount: Uint128,
    },
}
