//! Messages every settler backend answers, shared by the orchestrator,
//! the escrow and the settler contract.

use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{to_json_binary, Binary, HexBinary, StdResult};

#[cw_serde]
pub enum SettlerExecuteMsg {
    /// Publish that `settlement_id` was executed; `context` is backend specific
    Send {
        settlement_id: HexBinary,
        context: Binary,
    },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum SettlerQueryMsg {
    /// Has `attester` attested `settlement_id` from `chain_id`
    #[returns(ReadResponse)]
    Read {
        settlement_id: HexBinary,
        attester: String,
        chain_id: u64,
    },
}

#[cw_serde]
pub struct ReadResponse {
    pub is_settled: bool,
}

/// Oracle settler context: destination chain ids
pub fn encode_chain_ids(chain_ids: &[u64]) -> StdResult<Binary> {
    to_json_binary(chain_ids)
}

/// Bridge settler context: destination endpoint ids
pub fn encode_endpoint_ids(endpoint_ids: &[u32]) -> StdResult<Binary> {
    to_json_binary(endpoint_ids)
}
