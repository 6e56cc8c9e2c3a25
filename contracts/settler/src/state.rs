use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Binary};
use cw_storage_plus::{Item, Map};

#[cw_serde]
pub struct Config {
    /// May write attestations directly and manage routes
    pub owner: Addr,
    pub backend: Backend,
}

/// How attestations reach this chain
#[cw_serde]
pub enum Backend {
    /// An off-chain oracle watches `settlement_sent` events and writes
    /// attestations signed by `owner_public_key`
    Oracle { owner_public_key: Binary },
    /// A messaging endpoint delivers attestations from peer settlers
    Bridge { endpoint: Addr, local_chain_id: u64 },
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Oracle { .. } => "oracle",
            Backend::Bridge { .. } => "bridge",
        }
    }
}

/// Peer settler reachable through a bridge endpoint id
#[cw_serde]
pub struct Route {
    /// Chain id attestations from this endpoint are recorded under
    pub chain_id: u64,
    /// Settler address on the remote chain
    pub peer: String,
}

pub const CONFIG: Item<Config> = Item::new("config");

/// (settlement_id, sender, sender chain id) -> attested
pub const ATTESTATIONS: Map<(&[u8], &str, u64), bool> = Map::new("attestations");

/// Bridge sends recorded by `send`, keyed by `send_authorization_key`
pub const SEND_AUTHORIZATIONS: Map<&[u8], bool> = Map::new("send_authorizations");

pub const ROUTES: Map<u32, Route> = Map::new("routes");
