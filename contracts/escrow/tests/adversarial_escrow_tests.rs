/// Adversarial tests for the escrow contract
///
/// These tests simulate attacks where things could go horribly wrong:
/// - Double-settle and double-refund attacks
/// - Races between settlement and refunds
/// - Attestations for the wrong chain, sender or settlement
/// - Underpaid and overpaid deposits
/// - Time manipulation around the refund deadline

use cosmwasm_std::testing::{message_info, mock_dependencies, mock_env, MockApi, MockQuerier};
use cosmwasm_std::{
    from_json, to_json_binary, Addr, BankMsg, Coin, ContractResult, CosmosMsg, Env, HexBinary,
    MemoryStorage, OwnedDeps, Response, SystemError, SystemResult, Uint128, WasmQuery,
};

use relay_intents_escrow::contract::{execute, instantiate, query};
use relay_intents_escrow::error::ContractError;
use relay_intents_escrow::msg::{ExecuteMsg, InstantiateMsg, QueryMsg, StatusResponse};
use relay_intents_escrow::state::{Escrow, EscrowStatus, Token};
use relay_intents_types::{ReadResponse, SettlerQueryMsg};

type TestDeps = OwnedDeps<MemoryStorage, MockApi, MockQuerier>;

const OUTPUT_CHAIN_ID: u64 = 2;
const OUTPUT_ORCHESTRATOR: &str = "orchestrator-on-chain-2";

struct TestAddrs {
    depositor: Addr,
    recipient: Addr,
    settler: Addr,
    attacker: Addr,
}

fn test_addrs(api: &MockApi) -> TestAddrs {
    TestAddrs {
        depositor: api.addr_make("depositor"),
        recipient: api.addr_make("recipient"),
        settler: api.addr_make("settler"),
        attacker: api.addr_make("attacker"),
    }
}

fn setup_contract() -> (TestDeps, Env, TestAddrs) {
    let mut deps = mock_dependencies();
    let env = mock_env();
    let addrs = test_addrs(&deps.api);

    instantiate(
        deps.as_mut(),
        env.clone(),
        message_info(&addrs.depositor, &[]),
        InstantiateMsg {},
    )
    .unwrap();

    (deps, env, addrs)
}

fn settlement_id() -> HexBinary {
    HexBinary::from(vec![0x5e; 32])
}

/// Settler mock that has attested exactly one (settlement, sender, chain)
fn mock_settler(deps: &mut TestDeps, settler: &Addr) {
    let settler = settler.to_string();
    deps.querier.update_wasm(move |query| match query {
        WasmQuery::Smart { contract_addr, msg } if *contract_addr == settler => {
            let SettlerQueryMsg::Read {
                settlement_id: id,
                attester,
                chain_id,
            } = from_json(msg).unwrap();
            let is_settled =
                id == settlement_id() && attester == OUTPUT_ORCHESTRATOR && chain_id == OUTPUT_CHAIN_ID;
            SystemResult::Ok(ContractResult::Ok(
                to_json_binary(&ReadResponse { is_settled }).unwrap(),
            ))
        }
        _ => SystemResult::Err(SystemError::UnsupportedRequest {
            kind: "unexpected wasm query".to_string(),
        }),
    });
}

fn record(env: &Env, addrs: &TestAddrs, escrow_amount: u128, refund_amount: u128) -> Escrow {
    Escrow {
        salt: HexBinary::from(vec![3u8; 12]),
        depositor: addrs.depositor.clone(),
        recipient: addrs.recipient.clone(),
        token: Token::Native {
            denom: "uatom".to_string(),
        },
        settler: addrs.settler.clone(),
        sender: OUTPUT_ORCHESTRATOR.to_string(),
        settlement_id: settlement_id(),
        sender_chain_id: OUTPUT_CHAIN_ID,
        escrow_amount: Uint128::new(escrow_amount),
        refund_amount: Uint128::new(refund_amount),
        refund_timestamp: env.block.time.seconds() + 600,
    }
}

fn create(deps: &mut TestDeps, env: &Env, escrow: &Escrow) -> HexBinary {
    execute(
        deps.as_mut(),
        env.clone(),
        message_info(
            &escrow.depositor,
            &[Coin::new(escrow.escrow_amount, "uatom")],
        ),
        ExecuteMsg::Escrow {
            escrows: vec![escrow.clone()],
        },
    )
    .unwrap();
    escrow.id().unwrap()
}

fn run(
    deps: &mut TestDeps,
    env: &Env,
    caller: &Addr,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    execute(deps.as_mut(), env.clone(), message_info(caller, &[]), msg)
}

fn status(deps: &TestDeps, id: &HexBinary) -> EscrowStatus {
    let res: StatusResponse =
        from_json(query(deps.as_ref(), mock_env(), QueryMsg::Status { id: id.clone() }).unwrap())
            .unwrap();
    res.status
}

fn expired(env: &Env) -> Env {
    let mut env = env.clone();
    env.block.time = env.block.time.plus_seconds(601);
    env
}

/// (recipient of each bank send, amount) in message order
fn bank_sends(res: &Response) -> Vec<(String, u128)> {
    res.messages
        .iter()
        .filter_map(|m| match &m.msg {
            CosmosMsg::Bank(BankMsg::Send { to_address, amount }) => {
                Some((to_address.clone(), amount[0].amount.u128()))
            }
            _ => None,
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// SPLIT REFUND TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_split_refund_depositor_first() {
    let (mut deps, env, addrs) = setup_contract();
    let id = create(&mut deps, &env, &record(&env, &addrs, 1000, 800));
    let later = expired(&env);

    let res = run(&mut deps, &later, &addrs.attacker, ExecuteMsg::RefundDepositor { ids: vec![id.clone()] }).unwrap();
    assert_eq!(bank_sends(&res), vec![(addrs.depositor.to_string(), 800)]);
    assert_eq!(status(&deps, &id), EscrowStatus::RefundDeposit);

    let res = run(&mut deps, &later, &addrs.attacker, ExecuteMsg::RefundRecipient { ids: vec![id.clone()] }).unwrap();
    assert_eq!(bank_sends(&res), vec![(addrs.recipient.to_string(), 200)]);
    assert_eq!(status(&deps, &id), EscrowStatus::Finalized);
}

#[test]
fn test_split_refund_recipient_first() {
    let (mut deps, env, addrs) = setup_contract();
    let id = create(&mut deps, &env, &record(&env, &addrs, 1000, 800));
    let later = expired(&env);

    let res = run(&mut deps, &later, &addrs.recipient, ExecuteMsg::RefundRecipient { ids: vec![id.clone()] }).unwrap();
    assert_eq!(bank_sends(&res), vec![(addrs.recipient.to_string(), 200)]);
    assert_eq!(status(&deps, &id), EscrowStatus::RefundRecipient);

    // The combined refund only pays what is still pending
    let res = run(&mut deps, &later, &addrs.depositor, ExecuteMsg::Refund { ids: vec![id.clone()] }).unwrap();
    assert_eq!(bank_sends(&res), vec![(addrs.depositor.to_string(), 800)]);
    assert_eq!(status(&deps, &id), EscrowStatus::Finalized);
}

#[test]
fn test_double_refund_attack_fails() {
    let (mut deps, env, addrs) = setup_contract();
    let id = create(&mut deps, &env, &record(&env, &addrs, 1000, 800));
    let later = expired(&env);

    run(&mut deps, &later, &addrs.attacker, ExecuteMsg::Refund { ids: vec![id.clone()] }).unwrap();

    for msg in [
        ExecuteMsg::Refund { ids: vec![id.clone()] },
        ExecuteMsg::RefundDepositor { ids: vec![id.clone()] },
        ExecuteMsg::RefundRecipient { ids: vec![id.clone()] },
    ] {
        let err = run(&mut deps, &later, &addrs.attacker, msg).unwrap_err();
        assert!(matches!(err, ContractError::InvalidStatus { .. }));
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SETTLE VS REFUND RACE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_settle_then_refund_fails() {
    let (mut deps, env, addrs) = setup_contract();
    mock_settler(&mut deps, &addrs.settler);
    let id = create(&mut deps, &env, &record(&env, &addrs, 1000, 800));

    let res = run(&mut deps, &env, &addrs.attacker, ExecuteMsg::Settle { ids: vec![id.clone()] }).unwrap();
    assert_eq!(bank_sends(&res), vec![(addrs.recipient.to_string(), 1000)]);

    let err = run(&mut deps, &expired(&env), &addrs.depositor, ExecuteMsg::RefundDepositor { ids: vec![id.clone()] })
        .unwrap_err();
    assert!(matches!(err, ContractError::InvalidStatus { .. }));

    let err = run(&mut deps, &env, &addrs.recipient, ExecuteMsg::Settle { ids: vec![id] }).unwrap_err();
    assert!(matches!(err, ContractError::InvalidStatus { .. }));
}

#[test]
fn test_refund_then_settle_fails() {
    let (mut deps, env, addrs) = setup_contract();
    mock_settler(&mut deps, &addrs.settler);
    let id = create(&mut deps, &env, &record(&env, &addrs, 1000, 800));
    let later = expired(&env);

    run(&mut deps, &later, &addrs.depositor, ExecuteMsg::RefundRecipient { ids: vec![id.clone()] }).unwrap();

    let err = run(&mut deps, &later, &addrs.recipient, ExecuteMsg::Settle { ids: vec![id.clone()] }).unwrap_err();
    assert!(matches!(err, ContractError::InvalidStatus { .. }));
    assert_eq!(status(&deps, &id), EscrowStatus::RefundRecipient);
}

// ═══════════════════════════════════════════════════════════════════════════
// ATTESTATION MISMATCH TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_attestation_from_other_chain_not_accepted() {
    let (mut deps, env, addrs) = setup_contract();
    mock_settler(&mut deps, &addrs.settler);
    let mut escrow = record(&env, &addrs, 1000, 800);
    escrow.sender_chain_id = OUTPUT_CHAIN_ID + 1;
    let id = create(&mut deps, &env, &escrow);

    let err = run(&mut deps, &env, &addrs.recipient, ExecuteMsg::Settle { ids: vec![id.clone()] }).unwrap_err();
    assert!(matches!(err, ContractError::SettlementNotAttested { .. }));
    assert_eq!(status(&deps, &id), EscrowStatus::Created);
}

#[test]
fn test_attestation_from_other_sender_not_accepted() {
    let (mut deps, env, addrs) = setup_contract();
    mock_settler(&mut deps, &addrs.settler);
    let mut escrow = record(&env, &addrs, 1000, 800);
    escrow.sender = "attacker-orchestrator".to_string();
    let id = create(&mut deps, &env, &escrow);

    let err = run(&mut deps, &env, &addrs.recipient, ExecuteMsg::Settle { ids: vec![id] }).unwrap_err();
    assert!(matches!(err, ContractError::SettlementNotAttested { .. }));
}

#[test]
fn test_attestation_for_other_settlement_not_accepted() {
    let (mut deps, env, addrs) = setup_contract();
    mock_settler(&mut deps, &addrs.settler);
    let mut other = record(&env, &addrs, 10, 0);
    other.settlement_id = HexBinary::from(vec![0x01; 32]);
    let other_id = create(&mut deps, &env, &other);

    let err = run(&mut deps, &env, &addrs.recipient, ExecuteMsg::Settle { ids: vec![other_id] }).unwrap_err();
    assert!(matches!(err, ContractError::SettlementNotAttested { .. }));
}

// ═══════════════════════════════════════════════════════════════════════════
// DEPOSIT TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_underpaid_and_overpaid_deposits_rejected() {
    let (mut deps, env, addrs) = setup_contract();
    let escrow = record(&env, &addrs, 1000, 800);

    for funds in [
        vec![Coin::new(999u128, "uatom")],
        vec![Coin::new(1001u128, "uatom")],
        vec![Coin::new(1000u128, "uosmo")],
        vec![Coin::new(1000u128, "uatom"), Coin::new(1u128, "uosmo")],
    ] {
        let err = execute(
            deps.as_mut(),
            env.clone(),
            message_info(&addrs.depositor, &funds),
            ExecuteMsg::Escrow {
                escrows: vec![escrow.clone()],
            },
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::InvalidFunds { .. }));
    }
    assert_eq!(status(&deps, &escrow.id().unwrap()), EscrowStatus::Null);
}

#[test]
fn test_batch_with_one_bad_record_stores_nothing() {
    let (mut deps, env, addrs) = setup_contract();
    let good = record(&env, &addrs, 1000, 800);
    let mut bad = record(&env, &addrs, 500, 600);
    bad.salt = HexBinary::from(vec![4u8; 12]);

    let err = execute(
        deps.as_mut(),
        env,
        message_info(&addrs.depositor, &[Coin::new(1500u128, "uatom")]),
        ExecuteMsg::Escrow {
            escrows: vec![good.clone(), bad],
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::InvalidRefundAmount { .. }));
    assert_eq!(status(&deps, &good.id().unwrap()), EscrowStatus::Null);
}

#[test]
fn test_salt_distinguishes_identical_escrows() {
    let (mut deps, env, addrs) = setup_contract();
    let first = record(&env, &addrs, 1000, 800);
    let mut second = first.clone();
    second.salt = HexBinary::from(vec![9u8; 12]);

    let first_id = create(&mut deps, &env, &first);
    let second_id = create(&mut deps, &env, &second);
    assert_ne!(first_id, second_id);

    let queried: HexBinary = from_json(
        query(deps.as_ref(), mock_env(), QueryMsg::EscrowId { escrow: second }).unwrap(),
    )
    .unwrap();
    assert_eq!(queried, second_id);
}

// ═══════════════════════════════════════════════════════════════════════════
// TIME MANIPULATION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_refund_at_exact_deadline_blocked() {
    let (mut deps, env, addrs) = setup_contract();
    let escrow = record(&env, &addrs, 1000, 800);
    let id = create(&mut deps, &env, &escrow);

    let mut at_deadline = env.clone();
    at_deadline.block.time = cosmwasm_std::Timestamp::from_seconds(escrow.refund_timestamp);
    let err = run(&mut deps, &at_deadline, &addrs.depositor, ExecuteMsg::Refund { ids: vec![id.clone()] })
        .unwrap_err();
    assert!(matches!(err, ContractError::RefundNotYetEligible { .. }));

    let mut after = env;
    after.block.time = cosmwasm_std::Timestamp::from_seconds(escrow.refund_timestamp + 1);
    run(&mut deps, &after, &addrs.depositor, ExecuteMsg::Refund { ids: vec![id.clone()] }).unwrap();
    assert_eq!(status(&deps, &id), EscrowStatus::Finalized);
}

#[test]
fn test_refund_goes_to_recorded_parties_not_caller() {
    let (mut deps, env, addrs) = setup_contract();
    let id = create(&mut deps, &env, &record(&env, &addrs, 1000, 1000));

    let res = run(&mut deps, &expired(&env), &addrs.attacker, ExecuteMsg::Refund { ids: vec![id] }).unwrap();
    // Zero recipient share produces no transfer
    assert_eq!(bank_sends(&res), vec![(addrs.depositor.to_string(), 1000)]);
}
