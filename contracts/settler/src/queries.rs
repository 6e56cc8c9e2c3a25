use cosmwasm_std::{Binary, Deps, HexBinary, StdResult};
use relay_intents_types::ReadResponse;

use crate::helpers::send_authorization_key;
use crate::msg::ConfigResponse;
use crate::state::{Route, ATTESTATIONS, CONFIG, ROUTES, SEND_AUTHORIZATIONS};

pub fn query_read(
    deps: Deps,
    settlement_id: HexBinary,
    attester: String,
    chain_id: u64,
) -> StdResult<ReadResponse> {
    let is_settled = ATTESTATIONS
        .may_load(deps.storage, (settlement_id.as_slice(), attester.as_str(), chain_id))?
        .unwrap_or(false);
    Ok(ReadResponse { is_settled })
}

pub fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    let config = CONFIG.load(deps.storage)?;
    Ok(ConfigResponse {
        owner: config.owner.to_string(),
        backend: config.backend,
    })
}

pub fn query_route(deps: Deps, eid: u32) -> StdResult<Option<Route>> {
    ROUTES.may_load(deps.storage, eid)
}

pub fn query_send_authorized(
    deps: Deps,
    sender: String,
    settlement_id: HexBinary,
    context: Binary,
) -> StdResult<bool> {
    let key = send_authorization_key(&sender, &settlement_id, &context);
    Ok(SEND_AUTHORIZATIONS
        .may_load(deps.storage, &key)?
        .unwrap_or(false))
}
