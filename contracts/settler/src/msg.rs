use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Binary, Coin, HexBinary};
use relay_intents_types::ReadResponse;

use crate::state::{Backend, Route};

#[cw_serde]
pub struct InstantiateMsg {
    pub owner: String,
    pub backend: BackendConfig,
}

#[cw_serde]
pub enum BackendConfig {
    Oracle {
        /// Compressed or uncompressed secp256k1 key of the attesting oracle
        owner_public_key: Binary,
    },
    Bridge {
        endpoint: String,
        local_chain_id: u64,
        routes: Vec<RouteMsg>,
    },
}

#[cw_serde]
pub struct RouteMsg {
    pub eid: u32,
    pub chain_id: u64,
    pub peer: String,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Publish a settlement. Same shape as the shared settler `Send`.
    Send {
        settlement_id: HexBinary,
        context: Binary,
    },
    /// Record an attestation as the owner
    Write {
        sender: String,
        settlement_id: HexBinary,
        chain_id: u64,
    },
    /// Record an attestation carrying the oracle's signature
    WriteSigned {
        sender: String,
        settlement_id: HexBinary,
        chain_id: u64,
        signature: Binary,
    },
    /// Deliver a previously recorded bridge send, paying the endpoint fees
    ExecuteSend {
        sender: String,
        settlement_id: HexBinary,
        context: Binary,
    },
    /// Inbound bridge message; only the endpoint may call
    Receive {
        src_eid: u32,
        sender: String,
        payload: Binary,
    },
    SetPeer {
        eid: u32,
        chain_id: u64,
        peer: String,
    },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ReadResponse)]
    Read {
        settlement_id: HexBinary,
        attester: String,
        chain_id: u64,
    },

    #[returns(ConfigResponse)]
    Config {},

    #[returns(Option<Route>)]
    Route { eid: u32 },

    /// Whether `send` has recorded this (sender, settlement, context)
    #[returns(bool)]
    SendAuthorized {
        sender: String,
        settlement_id: HexBinary,
        context: Binary,
    },
}

#[cw_serde]
pub struct ConfigResponse {
    pub owner: String,
    pub backend: Backend,
}

/// Message carried across the bridge
#[cw_serde]
pub struct BridgePayload {
    pub settlement_id: HexBinary,
    pub sender: String,
    /// Chain the receiving settler must be deployed on
    pub destination_chain_id: u64,
}

/// Subset of the messaging endpoint interface
#[cw_serde]
pub enum EndpointExecuteMsg {
    Send {
        dst_eid: u32,
        receiver: String,
        payload: Binary,
    },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum EndpointQueryMsg {
    #[returns(QuoteResponse)]
    Quote {
        dst_eid: u32,
        receiver: String,
        payload: Binary,
    },
}

#[cw_serde]
pub struct QuoteResponse {
    pub fee: Coin,
}
