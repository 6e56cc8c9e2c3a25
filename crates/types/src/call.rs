use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Binary, HexBinary, Uint128};

use crate::codec::{decode_list, encode_list, DecodeError, DecodeLimits, Table, TableWriter};
use crate::key::Key;

/// One step of an execution batch
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub to: Addr,
    /// Amount of the native denom attached to the call
    pub value: Uint128,
    pub data: Binary,
}

impl Call {
    pub const FIELDS: usize = 3;

    pub fn new(to: impl Into<String>, value: u128, data: impl Into<Binary>) -> Self {
        Self {
            to: Addr::unchecked(to.into()),
            value: Uint128::new(value),
            data: data.into(),
        }
    }

    /// A self-call carrying an account management action
    pub fn account(account: &Addr, call: &AccountCall) -> Result<Self, serde_json::Error> {
        Ok(Self {
            to: account.clone(),
            value: Uint128::zero(),
            data: Binary::from(serde_json::to_vec(call)?),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        TableWriter::new()
            .str(self.to.as_str())
            .u128(self.value.u128())
            .bytes(&self.data)
            .finish()
    }

    pub fn decode(bytes: &[u8], limits: &DecodeLimits) -> Result<Self, DecodeError> {
        let table = Table::parse(bytes, Self::FIELDS, limits)?;
        Ok(Self {
            to: Addr::unchecked(table.string(0)?),
            value: Uint128::new(table.u128(1)?),
            data: Binary::from(table.bytes(2)?),
        })
    }
}

/// Encode a batch of calls as execution data
pub fn encode_calls(calls: &[Call]) -> Vec<u8> {
    encode_list(calls.iter().map(Call::encode))
}

pub fn decode_calls(bytes: &[u8], limits: &DecodeLimits) -> Result<Vec<Call>, DecodeError> {
    decode_list(bytes, limits.max_calls, limits)?
        .into_iter()
        .map(|raw| Call::decode(raw, limits))
        .collect()
}

/// A transfer the funder must make before the batch runs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub token: String,
    pub amount: Uint128,
}

impl Transfer {
    pub const FIELDS: usize = 2;

    pub fn new(token: impl Into<String>, amount: u128) -> Self {
        Self {
            token: token.into(),
            amount: Uint128::new(amount),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        TableWriter::new()
            .str(&self.token)
            .u128(self.amount.u128())
            .finish()
    }

    pub fn decode(bytes: &[u8], limits: &DecodeLimits) -> Result<Self, DecodeError> {
        let table = Table::parse(bytes, Self::FIELDS, limits)?;
        Ok(Self {
            token: table.string(0)?,
            amount: Uint128::new(table.u128(1)?),
        })
    }
}

/// Account management actions, carried as JSON in self-calls
#[cw_serde]
pub enum AccountCall {
    Authorize {
        key: Key,
    },
    Revoke {
        key_hash: HexBinary,
    },
    SetSignatureCheckerApproval {
        key_hash: HexBinary,
        checker: String,
        is_approved: bool,
    },
}
