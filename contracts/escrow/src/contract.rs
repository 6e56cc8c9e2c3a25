use std::collections::{BTreeMap, BTreeSet};

#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    to_json_binary, Addr, Api, BankMsg, Binary, Coin, CosmosMsg, Deps, DepsMut, Env, Event,
    HexBinary, MessageInfo, Response, StdResult, Storage, Uint128, WasmMsg,
};
use relay_intents_types::{ReadResponse, SettlerQueryMsg};

use crate::error::ContractError;
use crate::msg::{Cw20ExecuteMsg, EscrowResponse, ExecuteMsg, InstantiateMsg, QueryMsg, StatusResponse};
use crate::state::{Escrow, EscrowStatus, Token, ESCROWS, SALT_LEN, SETTLEMENT_ID_LEN, STATUSES};

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    _deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    _msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    Ok(Response::new().add_attribute("action", "instantiate"))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::Escrow { escrows } => execute_escrow(deps, env, info, escrows),
        ExecuteMsg::RefundDepositor { ids } => {
            execute_refund(deps, env, ids, RefundMode::Depositor)
        }
        ExecuteMsg::RefundRecipient { ids } => {
            execute_refund(deps, env, ids, RefundMode::Recipient)
        }
        ExecuteMsg::Refund { ids } => execute_refund(deps, env, ids, RefundMode::Both),
        ExecuteMsg::Settle { ids } => execute_settle(deps, info, ids),
    }
}

fn execute_escrow(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    escrows: Vec<Escrow>,
) -> Result<Response, ContractError> {
    if escrows.is_empty() {
        return Err(ContractError::EmptyBatch {});
    }

    // Validate the whole batch before moving anything
    let mut ids = BTreeSet::new();
    let mut native_due: BTreeMap<String, Uint128> = BTreeMap::new();
    let mut validated = Vec::with_capacity(escrows.len());
    for escrow in escrows {
        let escrow = validate_escrow(deps.api, escrow)?;
        let id = escrow.id()?;
        if !ids.insert(id.clone()) || STATUSES.has(deps.storage, id.as_slice()) {
            return Err(ContractError::EscrowAlreadyExists { id: id.to_hex() });
        }
        if let Token::Native { denom } = &escrow.token {
            let due = native_due.entry(denom.clone()).or_default();
            *due = due.checked_add(escrow.escrow_amount).map_err(cosmwasm_std::StdError::from)?;
        }
        validated.push((id, escrow));
    }
    check_native_funds(&native_due, &info.funds)?;

    let mut response = Response::new()
        .add_attribute("action", "escrow")
        .add_attribute("count", validated.len().to_string());
    for (id, escrow) in validated {
        if let Token::Cw20 { contract } = &escrow.token {
            if !escrow.escrow_amount.is_zero() {
                response = response.add_message(WasmMsg::Execute {
                    contract_addr: contract.to_string(),
                    msg: to_json_binary(&Cw20ExecuteMsg::TransferFrom {
                        owner: info.sender.to_string(),
                        recipient: env.contract.address.to_string(),
                        amount: escrow.escrow_amount,
                    })?,
                    funds: vec![],
                });
            }
        }

        ESCROWS.save(deps.storage, id.as_slice(), &escrow)?;
        STATUSES.save(deps.storage, id.as_slice(), &EscrowStatus::Created)?;
        response = response.add_event(
            Event::new("escrow_created")
                .add_attribute("id", id.to_hex())
                .add_attribute("depositor", escrow.depositor.as_str())
                .add_attribute("recipient", escrow.recipient.as_str())
                .add_attribute("escrow_amount", escrow.escrow_amount),
        );
    }

    Ok(response)
}

fn validate_escrow(api: &dyn Api, escrow: Escrow) -> Result<Escrow, ContractError> {
    if escrow.refund_amount > escrow.escrow_amount {
        return Err(ContractError::InvalidRefundAmount {
            refund_amount: escrow.refund_amount,
            escrow_amount: escrow.escrow_amount,
        });
    }
    if escrow.salt.len() != SALT_LEN {
        return Err(ContractError::InvalidEscrow {
            reason: format!("salt must be {SALT_LEN} bytes"),
        });
    }
    if escrow.settlement_id.len() != SETTLEMENT_ID_LEN {
        return Err(ContractError::InvalidEscrow {
            reason: format!("settlement id must be {SETTLEMENT_ID_LEN} bytes"),
        });
    }

    let token = match escrow.token {
        Token::Native { denom } if denom.is_empty() => {
            return Err(ContractError::InvalidEscrow {
                reason: "empty denom".to_string(),
            })
        }
        Token::Native { denom } => Token::Native { denom },
        Token::Cw20 { contract } => Token::Cw20 {
            contract: api.addr_validate(contract.as_str())?,
        },
    };

    Ok(Escrow {
        depositor: api.addr_validate(escrow.depositor.as_str())?,
        recipient: api.addr_validate(escrow.recipient.as_str())?,
        settler: api.addr_validate(escrow.settler.as_str())?,
        token,
        ..escrow
    })
}

/// Attached funds must match the native amounts owed, denom by denom
fn check_native_funds(due: &BTreeMap<String, Uint128>, funds: &[Coin]) -> Result<(), ContractError> {
    let mut sent: BTreeMap<String, Uint128> = BTreeMap::new();
    for coin in funds {
        let total = sent.entry(coin.denom.clone()).or_default();
        *total = total.checked_add(coin.amount).map_err(cosmwasm_std::StdError::from)?;
    }
    sent.retain(|_, amount| !amount.is_zero());
    let expected: BTreeMap<_, _> = due
        .iter()
        .filter(|(_, amount)| !amount.is_zero())
        .map(|(denom, amount)| (denom.clone(), *amount))
        .collect();

    if sent != expected {
        return Err(ContractError::InvalidFunds {
            expected: format_coins(&expected),
            got: format_coins(&sent),
        });
    }
    Ok(())
}

fn format_coins(coins: &BTreeMap<String, Uint128>) -> String {
    if coins.is_empty() {
        return "nothing".to_string();
    }
    coins
        .iter()
        .map(|(denom, amount)| format!("{amount}{denom}"))
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RefundMode {
    Depositor,
    Recipient,
    Both,
}

impl RefundMode {
    fn action(&self) -> &'static str {
        match self {
            RefundMode::Depositor => "refund_depositor",
            RefundMode::Recipient => "refund_recipient",
            RefundMode::Both => "refund",
        }
    }
}

/// Status after paying one side of a refund
fn refund_transition(status: &EscrowStatus, depositor_side: bool) -> Option<EscrowStatus> {
    match (status, depositor_side) {
        (EscrowStatus::Created, true) => Some(EscrowStatus::RefundDeposit),
        (EscrowStatus::Created, false) => Some(EscrowStatus::RefundRecipient),
        (EscrowStatus::RefundRecipient, true) | (EscrowStatus::RefundDeposit, false) => {
            Some(EscrowStatus::Finalized)
        }
        _ => None,
    }
}

fn execute_refund(
    deps: DepsMut,
    env: Env,
    ids: Vec<HexBinary>,
    mode: RefundMode,
) -> Result<Response, ContractError> {
    if ids.is_empty() {
        return Err(ContractError::EmptyBatch {});
    }
    let now = env.block.time.seconds();

    let mut response = Response::new().add_attribute("action", mode.action());
    for id in ids {
        let escrow = load_escrow(deps.storage, &id)?;
        let mut status = load_status(deps.storage, &id)?;

        if now <= escrow.refund_timestamp {
            return Err(ContractError::RefundNotYetEligible {
                id: id.to_hex(),
                refund_timestamp: escrow.refund_timestamp,
            });
        }

        let sides: &[bool] = match (mode, &status) {
            (RefundMode::Depositor, _) => &[true],
            (RefundMode::Recipient, _) => &[false],
            (RefundMode::Both, EscrowStatus::Created) => &[true, false],
            (RefundMode::Both, EscrowStatus::RefundDeposit) => &[false],
            (RefundMode::Both, EscrowStatus::RefundRecipient) => &[true],
            (RefundMode::Both, _) => &[],
        };
        if sides.is_empty() {
            return Err(invalid_status(&id, &status));
        }

        for &depositor_side in sides {
            status = refund_transition(&status, depositor_side)
                .ok_or_else(|| invalid_status(&id, &status))?;
            let (to, amount) = if depositor_side {
                (&escrow.depositor, escrow.refund_amount)
            } else {
                (&escrow.recipient, escrow.recipient_refund())
            };
            if let Some(msg) = payout(&escrow.token, to, amount)? {
                response = response.add_message(msg);
            }
            response = response.add_event(
                Event::new("escrow_refunded")
                    .add_attribute("id", id.to_hex())
                    .add_attribute("side", if depositor_side { "depositor" } else { "recipient" })
                    .add_attribute("to", to.as_str())
                    .add_attribute("amount", amount),
            );
        }
        STATUSES.save(deps.storage, id.as_slice(), &status)?;
    }

    Ok(response)
}

fn execute_settle(
    deps: DepsMut,
    info: MessageInfo,
    ids: Vec<HexBinary>,
) -> Result<Response, ContractError> {
    if ids.is_empty() {
        return Err(ContractError::EmptyBatch {});
    }

    let mut response = Response::new()
        .add_attribute("action", "settle")
        .add_attribute("caller", info.sender);
    for id in ids {
        let escrow = load_escrow(deps.storage, &id)?;
        let status = load_status(deps.storage, &id)?;
        // Settling ignores the refund deadline
        if status != EscrowStatus::Created {
            return Err(invalid_status(&id, &status));
        }

        let read: ReadResponse = deps.querier.query_wasm_smart(
            escrow.settler.as_str(),
            &SettlerQueryMsg::Read {
                settlement_id: escrow.settlement_id.clone(),
                attester: escrow.sender.clone(),
                chain_id: escrow.sender_chain_id,
            },
        )?;
        if !read.is_settled {
            return Err(ContractError::SettlementNotAttested { id: id.to_hex() });
        }

        STATUSES.save(deps.storage, id.as_slice(), &EscrowStatus::Finalized)?;
        if let Some(msg) = payout(&escrow.token, &escrow.recipient, escrow.escrow_amount)? {
            response = response.add_message(msg);
        }
        response = response.add_event(
            Event::new("escrow_settled")
                .add_attribute("id", id.to_hex())
                .add_attribute("recipient", escrow.recipient.as_str())
                .add_attribute("amount", escrow.escrow_amount),
        );
    }

    Ok(response)
}

fn load_escrow(storage: &dyn Storage, id: &HexBinary) -> Result<Escrow, ContractError> {
    ESCROWS
        .may_load(storage, id.as_slice())?
        .ok_or_else(|| ContractError::EscrowNotFound { id: id.to_hex() })
}

fn load_status(storage: &dyn Storage, id: &HexBinary) -> StdResult<EscrowStatus> {
    Ok(STATUSES
        .may_load(storage, id.as_slice())?
        .unwrap_or(EscrowStatus::Null))
}

fn invalid_status(id: &HexBinary, status: &EscrowStatus) -> ContractError {
    ContractError::InvalidStatus {
        id: id.to_hex(),
        status: format!("{status:?}"),
    }
}

/// Transfer message for `amount` of `token`; nothing for zero
fn payout(token: &Token, to: &Addr, amount: Uint128) -> StdResult<Option<CosmosMsg>> {
    if amount.is_zero() {
        return Ok(None);
    }
    let msg = match token {
        Token::Native { denom } => BankMsg::Send {
            to_address: to.to_string(),
            amount: vec![Coin::new(amount, denom)],
        }
        .into(),
        Token::Cw20 { contract } => WasmMsg::Execute {
            contract_addr: contract.to_string(),
            msg: to_json_binary(&Cw20ExecuteMsg::Transfer {
                recipient: to.to_string(),
                amount,
            })?,
            funds: vec![],
        }
        .into(),
    };
    Ok(Some(msg))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Escrow { id } => to_json_binary(&query_escrow(deps, id)?),
        QueryMsg::Status { id } => to_json_binary(&StatusResponse {
            status: load_status(deps.storage, &id)?,
        }),
        QueryMsg::EscrowId { escrow } => to_json_binary(&query_escrow_id(deps, escrow)?),
    }
}

/// Id the contract would store for `escrow`, after the same normalization as `escrow`
fn query_escrow_id(deps: Deps, escrow: Escrow) -> StdResult<HexBinary> {
    validate_escrow(deps.api, escrow)
        .map_err(|e| cosmwasm_std::StdError::generic_err(e.to_string()))?
        .id()
}

fn query_escrow(deps: Deps, id: HexBinary) -> StdResult<EscrowResponse> {
    let escrow = ESCROWS.load(deps.storage, id.as_slice())?;
    let status = load_status(deps.storage, &id)?;
    Ok(EscrowResponse { id, escrow, status })
}
