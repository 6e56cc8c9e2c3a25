#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{to_json_binary, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult};

use crate::error::ContractError;
use crate::handlers::{
    execute_bridge_send, execute_receive, execute_send, execute_set_peer, execute_write,
    execute_write_signed,
};
use crate::msg::{BackendConfig, ExecuteMsg, InstantiateMsg, QueryMsg};
use crate::queries::{query_config, query_read, query_route, query_send_authorized};
use crate::state::{Backend, Config, Route, CONFIG, ROUTES};

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    let owner = deps.api.addr_validate(&msg.owner)?;
    let backend = match msg.backend {
        BackendConfig::Oracle { owner_public_key } => {
            let len = owner_public_key.len();
            if len != 33 && len != 65 {
                return Err(ContractError::InvalidPublicKey { len });
            }
            Backend::Oracle { owner_public_key }
        }
        BackendConfig::Bridge {
            endpoint,
            local_chain_id,
            routes,
        } => {
            for route in routes {
                ROUTES.save(
                    deps.storage,
                    route.eid,
                    &Route {
                        chain_id: route.chain_id,
                        peer: route.peer,
                    },
                )?;
            }
            Backend::Bridge {
                endpoint: deps.api.addr_validate(&endpoint)?,
                local_chain_id,
            }
        }
    };
    let backend_name = backend.name();
    CONFIG.save(deps.storage, &Config { owner, backend })?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("backend", backend_name))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::Send {
            settlement_id,
            context,
        } => execute_send(deps, info, settlement_id, context),
        ExecuteMsg::Write {
            sender,
            settlement_id,
            chain_id,
        } => execute_write(deps, info, sender, settlement_id, chain_id),
        ExecuteMsg::WriteSigned {
            sender,
            settlement_id,
            chain_id,
            signature,
        } => execute_write_signed(deps, env, sender, settlement_id, chain_id, signature),
        ExecuteMsg::ExecuteSend {
            sender,
            settlement_id,
            context,
        } => execute_bridge_send(deps, info, sender, settlement_id, context),
        ExecuteMsg::Receive {
            src_eid,
            sender,
            payload,
        } => execute_receive(deps, info, src_eid, sender, payload),
        ExecuteMsg::SetPeer {
            eid,
            chain_id,
            peer,
        } => execute_set_peer(deps, info, eid, chain_id, peer),
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Read {
            settlement_id,
            attester,
            chain_id,
        } => to_json_binary(&query_read(deps, settlement_id, attester, chain_id)?),
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?),
        QueryMsg::Route { eid } => to_json_binary(&query_route(deps, eid)?),
        QueryMsg::SendAuthorized {
            sender,
            settlement_id,
            context,
        } => to_json_binary(&query_send_authorized(deps, sender, settlement_id, context)?),
    }
}
