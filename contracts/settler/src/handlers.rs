use cosmwasm_std::{
    to_json_binary, BankMsg, Binary, DepsMut, Env, Event, HexBinary, MessageInfo, Response,
    WasmMsg,
};

use crate::error::ContractError;
use crate::helpers::{
    decode_chain_ids, decode_endpoint_ids, fee_change, send_authorization_key, sum_coins,
    write_digest,
};
use crate::msg::{BridgePayload, EndpointExecuteMsg, EndpointQueryMsg, QuoteResponse};
use crate::state::{Backend, Config, Route, ATTESTATIONS, CONFIG, ROUTES, SEND_AUTHORIZATIONS};

fn unsupported(operation: &str, config: &Config) -> ContractError {
    ContractError::UnsupportedOperation {
        operation: operation.to_string(),
        backend: config.backend.name().to_string(),
    }
}

fn record_attestation(
    deps: DepsMut,
    sender: &str,
    settlement_id: &HexBinary,
    chain_id: u64,
) -> Result<bool, ContractError> {
    let key = (settlement_id.as_slice(), sender, chain_id);
    let existed = ATTESTATIONS.may_load(deps.storage, key)?.unwrap_or(false);
    if !existed {
        ATTESTATIONS.save(deps.storage, key, &true)?;
    }
    Ok(!existed)
}

fn written_response(
    action: &str,
    sender: &str,
    settlement_id: &HexBinary,
    chain_id: u64,
    fresh: bool,
) -> Response {
    let mut response = Response::new()
        .add_attribute("action", action)
        .add_attribute("settlement_id", settlement_id.to_hex())
        .add_attribute("sender", sender)
        .add_attribute("chain_id", chain_id.to_string());
    if fresh {
        response = response.add_event(
            Event::new("attestation_written")
                .add_attribute("settlement_id", settlement_id.to_hex())
                .add_attribute("sender", sender)
                .add_attribute("chain_id", chain_id.to_string()),
        );
    }
    response
}

pub fn execute_send(
    deps: DepsMut,
    info: MessageInfo,
    settlement_id: HexBinary,
    context: Binary,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    match config.backend {
        Backend::Oracle { .. } => {
            if !info.funds.is_empty() {
                return Err(ContractError::UnexpectedFunds {});
            }
            let chain_ids = decode_chain_ids(&context)?;
            let events = chain_ids.iter().map(|chain_id| {
                Event::new("settlement_sent")
                    .add_attribute("sender", info.sender.as_str())
                    .add_attribute("settlement_id", settlement_id.to_hex())
                    .add_attribute("receiver_chain_id", chain_id.to_string())
            });
            Ok(Response::new()
                .add_events(events)
                .add_attribute("action", "send")
                .add_attribute("settlement_id", settlement_id.to_hex())
                .add_attribute("destinations", chain_ids.len().to_string()))
        }
        Backend::Bridge { .. } => {
            // Delivery is paid for later through execute_send
            let key = send_authorization_key(info.sender.as_str(), &settlement_id, &context);
            SEND_AUTHORIZATIONS.save(deps.storage, &key, &true)?;
            Ok(Response::new()
                .add_attribute("action", "send")
                .add_attribute("sender", info.sender)
                .add_attribute("settlement_id", settlement_id.to_hex()))
        }
    }
}

pub fn execute_write(
    deps: DepsMut,
    info: MessageInfo,
    sender: String,
    settlement_id: HexBinary,
    chain_id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized {});
    }
    if !matches!(config.backend, Backend::Oracle { .. }) {
        return Err(unsupported("write", &config));
    }

    let fresh = record_attestation(deps, &sender, &settlement_id, chain_id)?;
    Ok(written_response("write", &sender, &settlement_id, chain_id, fresh))
}

pub fn execute_write_signed(
    deps: DepsMut,
    env: Env,
    sender: String,
    settlement_id: HexBinary,
    chain_id: u64,
    signature: Binary,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let Backend::Oracle { owner_public_key } = &config.backend else {
        return Err(unsupported("write_signed", &config));
    };

    let digest = write_digest(
        env.contract.address.as_str(),
        &sender,
        &settlement_id,
        chain_id,
    );
    if !deps
        .api
        .secp256k1_verify(&digest, &signature, owner_public_key)?
    {
        return Err(ContractError::InvalidSignature {});
    }

    let fresh = record_attestation(deps, &sender, &settlement_id, chain_id)?;
    Ok(written_response(
        "write_signed",
        &sender,
        &settlement_id,
        chain_id,
        fresh,
    ))
}

pub fn execute_bridge_send(
    deps: DepsMut,
    info: MessageInfo,
    sender: String,
    settlement_id: HexBinary,
    context: Binary,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let Backend::Bridge { endpoint, .. } = &config.backend else {
        return Err(unsupported("execute_send", &config));
    };

    let key = send_authorization_key(&sender, &settlement_id, &context);
    if !SEND_AUTHORIZATIONS
        .may_load(deps.storage, &key)?
        .unwrap_or(false)
    {
        return Err(ContractError::SendNotAuthorized {
            settlement_id: settlement_id.to_hex(),
        });
    }

    let mut fees = Vec::new();
    let mut messages = Vec::new();
    for dst_eid in decode_endpoint_ids(&context)? {
        let route = ROUTES
            .may_load(deps.storage, dst_eid)?
            .ok_or(ContractError::UnknownRoute { eid: dst_eid })?;
        let payload = to_json_binary(&BridgePayload {
            settlement_id: settlement_id.clone(),
            sender: sender.clone(),
            destination_chain_id: route.chain_id,
        })?;
        let quote: QuoteResponse = deps.querier.query_wasm_smart(
            endpoint.as_str(),
            &EndpointQueryMsg::Quote {
                dst_eid,
                receiver: route.peer.clone(),
                payload: payload.clone(),
            },
        )?;
        let funds = if quote.fee.amount.is_zero() {
            vec![]
        } else {
            vec![quote.fee.clone()]
        };
        fees.push(quote.fee);
        messages.push(WasmMsg::Execute {
            contract_addr: endpoint.to_string(),
            msg: to_json_binary(&EndpointExecuteMsg::Send {
                dst_eid,
                receiver: route.peer,
                payload,
            })?,
            funds,
        });
    }

    let change = fee_change(&sum_coins(&fees)?, &sum_coins(&info.funds)?)?;

    let mut response = Response::new()
        .add_messages(messages)
        .add_attribute("action", "execute_send")
        .add_attribute("sender", sender)
        .add_attribute("settlement_id", settlement_id.to_hex());
    if !change.is_empty() {
        response = response.add_message(BankMsg::Send {
            to_address: info.sender.to_string(),
            amount: change,
        });
    }
    Ok(response)
}

pub fn execute_receive(
    deps: DepsMut,
    info: MessageInfo,
    src_eid: u32,
    sender: String,
    payload: Binary,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let Backend::Bridge {
        endpoint,
        local_chain_id,
    } = &config.backend
    else {
        return Err(unsupported("receive", &config));
    };
    if info.sender != *endpoint {
        return Err(ContractError::Unauthorized {});
    }

    let route = ROUTES
        .may_load(deps.storage, src_eid)?
        .ok_or(ContractError::UnknownRoute { eid: src_eid })?;
    if route.peer != sender {
        return Err(ContractError::UntrustedPeer {
            eid: src_eid,
            peer: sender,
        });
    }

    let message: BridgePayload =
        cosmwasm_std::from_json(&payload).map_err(|err| ContractError::InvalidPayload {
            reason: err.to_string(),
        })?;
    if message.destination_chain_id != *local_chain_id {
        return Err(ContractError::WrongDestination {
            expected: *local_chain_id,
            got: message.destination_chain_id,
        });
    }
    record_attestation(deps, &message.sender, &message.settlement_id, route.chain_id)?;

    Ok(Response::new()
        .add_event(
            Event::new("attestation_received")
                .add_attribute("src_eid", src_eid.to_string())
                .add_attribute("settlement_id", message.settlement_id.to_hex())
                .add_attribute("sender", &message.sender)
                .add_attribute("chain_id", route.chain_id.to_string()),
        )
        .add_attribute("action", "receive"))
}

pub fn execute_set_peer(
    deps: DepsMut,
    info: MessageInfo,
    eid: u32,
    chain_id: u64,
    peer: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized {});
    }
    if !matches!(config.backend, Backend::Bridge { .. }) {
        return Err(unsupported("set_peer", &config));
    }

    ROUTES.save(
        deps.storage,
        eid,
        &Route {
            chain_id,
            peer: peer.clone(),
        },
    )?;

    Ok(Response::new()
        .add_attribute("action", "set_peer")
        .add_attribute("eid", eid.to_string())
        .add_attribute("chain_id", chain_id.to_string())
        .add_attribute("peer", peer))
}
