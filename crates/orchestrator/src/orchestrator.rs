use std::collections::BTreeMap;
use std::sync::Arc;

use cosmwasm_std::{
    to_json_binary, Addr, Binary, Coin, CosmosMsg, Event, HexBinary, WasmMsg,
};
use relay_intents_account::{Account, Signer};
use relay_intents_config::{validate_config, AppConfig};
use relay_intents_types::{
    intent_digest, pre_call_digest, Call, DecodeLimits, Domain, Intent, MerkleSignature,
    SettlerExecuteMsg, SignedCall,
};
use tracing::{debug, info, warn};

use crate::bootstrap::Bootstrapper;
use crate::error::{OrchestratorError, ResultCode};
use crate::funder::{FundContext, Funder, SimpleFunder};
use crate::ledger::{Ledger, LedgerError};
use crate::pause::PauseController;

/// Configuration for the orchestrator
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Address signed into every digest; default payment recipient
    pub address: Addr,

    /// Chain id signed into non-multichain digests
    pub chain_id: u64,

    /// Denom used for call values
    pub native_denom: String,

    pub pause_authority: Addr,

    /// Structural limits applied to every decoded intent
    pub limits: DecodeLimits,

    /// Implementation label expected of bootstrapped accounts
    pub account_implementation: String,
}

impl OrchestratorConfig {
    pub fn new(address: Addr, chain_id: u64, pause_authority: Addr) -> Self {
        Self {
            address,
            chain_id,
            native_denom: "uatom".to_string(),
            pause_authority,
            limits: DecodeLimits::default(),
            account_implementation: "account-v1".to_string(),
        }
    }

    pub fn with_native_denom(mut self, denom: impl Into<String>) -> Self {
        self.native_denom = denom.into();
        self
    }

    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Validate and convert loaded application settings
    pub fn from_app_config(config: &AppConfig) -> Result<Self, OrchestratorError> {
        validate_config(config).map_err(|e| OrchestratorError::Config(e.to_string()))?;

        let settings = &config.orchestrator;
        let limits = &config.limits;
        Ok(Self {
            address: Addr::unchecked(&settings.address),
            chain_id: settings.chain_id,
            native_denom: settings.native_denom.clone(),
            pause_authority: Addr::unchecked(&settings.pause_authority),
            limits: DecodeLimits {
                max_encoded_len: limits.max_encoded_len,
                max_field_len: limits.max_field_len,
                max_list_len: limits.max_list_len,
                max_pre_calls: limits.max_pre_calls,
                max_calls: limits.max_calls,
            },
            account_implementation: settings.account_implementation.clone(),
        })
    }
}

/// Result of one `execute` or `simulate` call
#[derive(Clone, Debug, PartialEq)]
pub struct ExecuteOutcome {
    pub code: ResultCode,

    /// Present once the intent decoded
    pub digest: Option<[u8; 32]>,

    pub error: Option<OrchestratorError>,

    /// Outbound messages for the host chain to dispatch, in call order
    pub messages: Vec<CosmosMsg>,

    pub events: Vec<Event>,
}

impl ExecuteOutcome {
    fn failed(error: OrchestratorError, digest: Option<[u8; 32]>) -> Self {
        Self {
            code: error.code(),
            digest,
            error: Some(error),
            messages: vec![],
            events: vec![],
        }
    }

    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }
}

/// Everything a hard failure must roll back
#[derive(Clone, Debug, Default)]
struct EngineState {
    accounts: BTreeMap<Addr, Account>,
    ledger: Ledger,
}

/// Undo point for one intent; only the eoa's account is ever mutated
struct Snapshot {
    eoa: Addr,
    account: Option<Account>,
    ledger_mark: usize,
}

impl EngineState {
    fn snapshot(&self, eoa: &Addr) -> Snapshot {
        Snapshot {
            eoa: eoa.clone(),
            account: self.accounts.get(eoa).cloned(),
            ledger_mark: self.ledger.mark(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        match snapshot.account {
            Some(account) => {
                self.accounts.insert(snapshot.eoa, account);
            }
            None => {
                self.accounts.remove(&snapshot.eoa);
            }
        }
        self.ledger.rollback_to(snapshot.ledger_mark);
    }
}

/// Verifies, charges for and executes signed intents on one chain
pub struct Orchestrator {
    config: OrchestratorConfig,
    domain: Domain,
    pause: PauseController,
    state: EngineState,
    funders: BTreeMap<Addr, Arc<dyn Funder>>,
    bootstrapper: Option<Arc<dyn Bootstrapper>>,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        let domain = Domain::new(config.chain_id, config.address.clone());
        let pause = PauseController::new(config.pause_authority.clone());
        Self {
            config,
            domain,
            pause,
            state: EngineState::default(),
            funders: BTreeMap::new(),
            bootstrapper: None,
        }
    }

    /// Build an orchestrator with a `SimpleFunder` per configured funder
    pub fn from_app_config(config: &AppConfig) -> Result<Self, OrchestratorError> {
        let mut orchestrator = Self::new(OrchestratorConfig::from_app_config(config)?);
        for (name, funder) in &config.funders {
            let key = hex::decode(&funder.signer_public_key)
                .map_err(|e| OrchestratorError::Config(format!("funder {name}: {e}")))?;
            orchestrator.add_funder(Arc::new(SimpleFunder::new(
                Addr::unchecked(&funder.address),
                Binary::from(key),
            )));
        }
        info!(
            address = %orchestrator.config.address,
            chain_id = orchestrator.config.chain_id,
            funders = orchestrator.funders.len(),
            "orchestrator configured"
        );
        Ok(orchestrator)
    }

    pub fn with_funder(mut self, funder: Arc<dyn Funder>) -> Self {
        self.add_funder(funder);
        self
    }

    pub fn add_funder(&mut self, funder: Arc<dyn Funder>) {
        self.funders.insert(funder.address().clone(), funder);
    }

    pub fn with_bootstrapper(mut self, bootstrapper: Arc<dyn Bootstrapper>) -> Self {
        self.bootstrapper = Some(bootstrapper);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Install an account, replacing any existing one at the same address
    pub fn register_account(&mut self, account: Account) -> Option<Account> {
        self.state
            .accounts
            .insert(account.address().clone(), account)
    }

    pub fn account(&self, address: &Addr) -> Option<&Account> {
        self.state.accounts.get(address)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.state.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.state.ledger
    }

    pub fn compute_digest(&self, intent: &Intent) -> [u8; 32] {
        intent_digest(&self.domain, intent)
    }

    // ==================== Pause ====================

    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    pub fn pause(&mut self, caller: &Addr, now: u64, paused: bool) -> Result<(), OrchestratorError> {
        Ok(self.pause.pause(caller, now, paused)?)
    }

    pub fn set_pause_authority(
        &mut self,
        caller: &Addr,
        authority: Addr,
    ) -> Result<(), OrchestratorError> {
        Ok(self.pause.set_pause_authority(caller, authority)?)
    }

    /// `(authority, last transition time)`
    pub fn pause_config(&self) -> (Addr, u64) {
        self.pause.config()
    }

    // ==================== Execution ====================

    /// Execute one encoded intent and commit its effects
    pub fn execute(&mut self, now: u64, encoded: &[u8]) -> ExecuteOutcome {
        let mut state = std::mem::take(&mut self.state);
        let outcome = self.process(&mut state, now, encoded, false);
        self.state = state;
        outcome
    }

    /// Execute intents independently, in order
    pub fn execute_batch<B: AsRef<[u8]>>(&mut self, now: u64, encoded: &[B]) -> Vec<ExecuteOutcome> {
        encoded
            .iter()
            .map(|intent| self.execute(now, intent.as_ref()))
            .collect()
    }

    /// Run `execute` against a copy of state; funder signatures are not enforced
    pub fn simulate(&self, now: u64, encoded: &[u8]) -> ExecuteOutcome {
        let mut state = self.state.clone();
        self.process(&mut state, now, encoded, true)
    }

    fn process(
        &self,
        state: &mut EngineState,
        now: u64,
        encoded: &[u8],
        simulation: bool,
    ) -> ExecuteOutcome {
        if self.pause.is_paused() {
            return ExecuteOutcome::failed(OrchestratorError::Paused, None);
        }

        let intent = match Intent::decode(encoded, &self.config.limits) {
            Ok(intent) => intent,
            Err(e) => {
                warn!(error = %e, "rejected malformed intent");
                return ExecuteOutcome::failed(e.into(), None);
            }
        };
        let digest = self.compute_digest(&intent);

        state.ledger.commit();

        // A hard failure in phase 1 leaves no trace
        let pristine = state.snapshot(&intent.eoa);
        let mut messages = Vec::new();
        let signer =
            match self.verify_and_charge(state, &intent, &digest, now, simulation, &mut messages) {
                Ok(signer) => signer,
                Err(e) => {
                    state.restore(pristine);
                    state.ledger.commit();
                    warn!(
                        eoa = %intent.eoa,
                        digest = %hex::encode(digest),
                        code = %e.code(),
                        error = %e,
                        "intent rejected"
                    );
                    return ExecuteOutcome::failed(e, Some(digest));
                }
            };

        let checkpoint = state.snapshot(&intent.eoa);
        let (code, error) = match self.execute_main_batch(state, &intent, &signer, &digest) {
            Ok(batch) => {
                messages.extend(batch);
                info!(
                    eoa = %intent.eoa,
                    digest = %hex::encode(digest),
                    messages = messages.len(),
                    simulation,
                    "intent executed"
                );
                (ResultCode::SUCCESS, None)
            }
            Err(e) => {
                let code = e.code();
                if e.is_soft() {
                    state.restore(checkpoint);
                    warn!(
                        eoa = %intent.eoa,
                        digest = %hex::encode(digest),
                        error = %e,
                        "intent batch failed; nonce and payment kept"
                    );
                } else {
                    state.restore(pristine);
                    warn!(
                        eoa = %intent.eoa,
                        digest = %hex::encode(digest),
                        code = %code,
                        error = %e,
                        "intent rejected after verification"
                    );
                }
                (code, Some(e))
            }
        };
        state.ledger.commit();

        let event = Event::new("intent_executed")
            .add_attribute("eoa", intent.eoa.as_str())
            .add_attribute("digest", hex::encode(digest))
            .add_attribute("nonce_key", intent.nonce.key.to_hex())
            .add_attribute("nonce_seq", intent.nonce.seq.to_string())
            .add_attribute("code", code.to_string())
            .add_attribute("code_bytes", hex::encode(code.to_be_bytes()));

        ExecuteOutcome {
            code,
            digest: Some(digest),
            error,
            messages,
            events: vec![event],
        }
    }

    fn verify_and_charge(
        &self,
        state: &mut EngineState,
        intent: &Intent,
        digest: &[u8; 32],
        now: u64,
        simulation: bool,
        messages: &mut Vec<CosmosMsg>,
    ) -> Result<Signer, OrchestratorError> {
        if intent.is_expired(now) {
            return Err(OrchestratorError::Expired {
                expiry: intent.expiry,
                now,
            });
        }

        self.ensure_account(state, &intent.eoa)?;
        if let Some(expected) = &intent.supported_account_implementation {
            let actual = self.account_ref(state, &intent.eoa)?.implementation();
            if actual != expected.as_str() {
                return Err(OrchestratorError::UnsupportedImplementation {
                    expected: expected.clone(),
                    actual: actual.to_string(),
                });
            }
        }

        for (index, pre_call) in intent.pre_calls.iter().enumerate() {
            self.apply_pre_call(state, intent, pre_call, now, messages)
                .map_err(|reason| OrchestratorError::PreCall { index, reason })?;
            debug!(eoa = %intent.eoa, index, "pre-call applied");
        }

        let signer = self.verify_signature(self.account_ref(state, &intent.eoa)?, intent, digest, now)?;

        self.account_mut(state, &intent.eoa)?
            .check_and_increment_nonce(&intent.nonce)
            .map_err(|e| OrchestratorError::InvalidNonce(e.to_string()))?;

        if !intent.fund_transfers.is_empty() {
            self.fund(state, intent, digest, simulation)?;
        }
        if !intent.payment_amount.is_zero() {
            self.charge(state, intent, digest, now)?;
        }

        Ok(signer)
    }

    fn ensure_account(&self, state: &mut EngineState, eoa: &Addr) -> Result<(), OrchestratorError> {
        if state.accounts.contains_key(eoa) {
            return Ok(());
        }
        let account = self
            .bootstrapper
            .as_ref()
            .and_then(|bootstrapper| bootstrapper.bootstrap(eoa))
            .ok_or_else(|| OrchestratorError::UnknownAccount(eoa.to_string()))?;
        if account.implementation() != self.config.account_implementation {
            return Err(OrchestratorError::Verification(format!(
                "bootstrapped account {eoa} runs {}, orchestrator requires {}",
                account.implementation(),
                self.config.account_implementation
            )));
        }
        debug!(eoa = %eoa, implementation = account.implementation(), "account bootstrapped");
        state.accounts.insert(eoa.clone(), account);
        Ok(())
    }

    fn account_ref<'s>(
        &self,
        state: &'s EngineState,
        eoa: &Addr,
    ) -> Result<&'s Account, OrchestratorError> {
        state
            .accounts
            .get(eoa)
            .ok_or_else(|| OrchestratorError::UnknownAccount(eoa.to_string()))
    }

    fn account_mut<'s>(
        &self,
        state: &'s mut EngineState,
        eoa: &Addr,
    ) -> Result<&'s mut Account, OrchestratorError> {
        state
            .accounts
            .get_mut(eoa)
            .ok_or_else(|| OrchestratorError::UnknownAccount(eoa.to_string()))
    }

    fn apply_pre_call(
        &self,
        state: &mut EngineState,
        intent: &Intent,
        pre_call: &SignedCall,
        now: u64,
        messages: &mut Vec<CosmosMsg>,
    ) -> Result<(), String> {
        let eoa = match &pre_call.eoa {
            None => &intent.eoa,
            Some(eoa) if *eoa == intent.eoa => eoa,
            Some(other) => return Err(format!("signer {other} is not the intent eoa")),
        };
        let limits = &self.config.limits;
        let calls = pre_call.calls(limits).map_err(|e| e.to_string())?;
        let pre_digest = pre_call_digest(&self.domain, eoa, pre_call);

        let EngineState { accounts, ledger } = state;
        let account = accounts
            .get_mut(eoa)
            .ok_or_else(|| format!("unknown account {eoa}"))?;
        let signer = account
            .unwrap_and_validate_signature(&pre_digest, &pre_call.signature, now, limits)
            .map_err(|e| e.to_string())?;
        account
            .check_and_increment_nonce(&pre_call.nonce)
            .map_err(|e| e.to_string())?;
        let outbound = account.execute(&calls, &signer).map_err(|e| e.to_string())?;
        let dispatched = dispatch(ledger, eoa, &outbound, &self.config.native_denom)
            .map_err(|e| e.to_string())?;
        messages.extend(dispatched);
        Ok(())
    }

    fn verify_signature(
        &self,
        account: &Account,
        intent: &Intent,
        digest: &[u8; 32],
        now: u64,
    ) -> Result<Signer, OrchestratorError> {
        let limits = &self.config.limits;
        let result = if intent.is_multichain {
            let merkle = MerkleSignature::decode(&intent.signature, limits)
                .map_err(|e| OrchestratorError::Verification(e.to_string()))?;
            merkle
                .check_leaf(digest)
                .map_err(|e| OrchestratorError::Verification(e.to_string()))?;
            account.unwrap_and_validate_signature(&merkle.root, &merkle.root_signature, now, limits)
        } else {
            account.unwrap_and_validate_signature(digest, &intent.signature, now, limits)
        };
        result.map_err(|e| OrchestratorError::Verification(e.to_string()))
    }

    fn fund(
        &self,
        state: &mut EngineState,
        intent: &Intent,
        digest: &[u8; 32],
        simulation: bool,
    ) -> Result<(), OrchestratorError> {
        let address = intent.funder.as_ref().ok_or_else(|| {
            OrchestratorError::Payment("fund transfers require a funder".to_string())
        })?;
        let funder = self
            .funders
            .get(address)
            .ok_or_else(|| OrchestratorError::Payment(format!("funder {address} is not registered")))?;

        let ctx = FundContext {
            eoa: &intent.eoa,
            digest,
            transfers: &intent.fund_transfers,
            signature: &intent.funder_signature,
            simulation,
        };
        funder
            .fund(&ctx, &mut state.ledger)
            .map_err(|e| OrchestratorError::Payment(e.to_string()))
    }

    fn charge(
        &self,
        state: &mut EngineState,
        intent: &Intent,
        digest: &[u8; 32],
        now: u64,
    ) -> Result<(), OrchestratorError> {
        if intent.payment_amount > intent.payment_max_amount {
            return Err(OrchestratorError::Payment(format!(
                "amount {} exceeds max {}",
                intent.payment_amount, intent.payment_max_amount
            )));
        }

        let payer = intent.payer();
        if *payer != intent.eoa {
            let account = state.accounts.get(payer).ok_or_else(|| {
                OrchestratorError::Payment(format!("unknown payer {payer}"))
            })?;
            if !account.is_valid_signature(
                &self.config.address,
                digest,
                &intent.payment_signature,
                now,
                &self.config.limits,
            ) {
                return Err(OrchestratorError::Payment(
                    "payer did not approve the digest".to_string(),
                ));
            }
        }

        let denom = if intent.payment_token.is_empty() {
            self.config.native_denom.as_str()
        } else {
            intent.payment_token.as_str()
        };
        let recipient = intent
            .payment_recipient
            .as_ref()
            .unwrap_or(&self.config.address);
        state
            .ledger
            .transfer(payer, recipient, denom, intent.payment_amount)
            .map_err(|e| OrchestratorError::Payment(e.to_string()))?;
        debug!(payer = %payer, recipient = %recipient, amount = %intent.payment_amount, denom, "payment charged");
        Ok(())
    }

    fn execute_main_batch(
        &self,
        state: &mut EngineState,
        intent: &Intent,
        signer: &Signer,
        digest: &[u8; 32],
    ) -> Result<Vec<CosmosMsg>, OrchestratorError> {
        let calls = intent
            .calls(&self.config.limits)
            .map_err(|e| OrchestratorError::Execution(e.to_string()))?;

        let EngineState { accounts, ledger } = state;
        let account = accounts
            .get_mut(&intent.eoa)
            .ok_or_else(|| OrchestratorError::UnknownAccount(intent.eoa.to_string()))?;
        let outbound = account
            .execute(&calls, signer)
            .map_err(|e| OrchestratorError::Execution(e.to_string()))?;
        let mut messages = dispatch(ledger, &intent.eoa, &outbound, &self.config.native_denom)
            .map_err(|e| OrchestratorError::Execution(e.to_string()))?;

        if intent.is_output() {
            if let Some(settler) = &intent.settler {
                let msg = to_json_binary(&SettlerExecuteMsg::Send {
                    settlement_id: HexBinary::from(digest.as_slice()),
                    context: intent.settler_context.clone(),
                })
                .map_err(|e| OrchestratorError::Execution(e.to_string()))?;
                messages.push(
                    WasmMsg::Execute {
                        contract_addr: settler.to_string(),
                        msg,
                        funds: vec![],
                    }
                    .into(),
                );
                debug!(settler = %settler, digest = %hex::encode(digest), "settlement sent");
            }
        }

        Ok(messages)
    }
}

/// Apply the ledger side of outbound calls and build their messages
fn dispatch(
    ledger: &mut Ledger,
    from: &Addr,
    calls: &[Call],
    denom: &str,
) -> Result<Vec<CosmosMsg>, LedgerError> {
    let mut messages = Vec::new();
    for call in calls {
        if !call.value.is_zero() {
            ledger.debit(from, denom, call.value)?;
        }
        if call.data.is_empty() {
            if !call.value.is_zero() {
                ledger.credit(&call.to, denom, call.value)?;
            }
            continue;
        }

        let funds = if call.value.is_zero() {
            vec![]
        } else {
            vec![Coin::new(call.value, denom)]
        };
        messages.push(
            WasmMsg::Execute {
                contract_addr: call.to.to_string(),
                msg: call.data.clone(),
                funds,
            }
            .into(),
        );
    }
    Ok(messages)
}
