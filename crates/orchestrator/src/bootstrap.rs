use std::collections::BTreeMap;

use cosmwasm_std::{Addr, Binary};
use relay_intents_account::Account;

/// Creates an account the first time an unknown eoa submits an intent
pub trait Bootstrapper: Send + Sync {
    fn bootstrap(&self, eoa: &Addr) -> Option<Account>;
}

/// Delegations published ahead of time: eoa -> (root key, implementation)
#[derive(Debug, Clone, Default)]
pub struct DelegationRegistry {
    delegations: BTreeMap<Addr, (Binary, String)>,
}

impl DelegationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, eoa: Addr, root_key: Binary, implementation: impl Into<String>) {
        self.delegations
            .insert(eoa, (root_key, implementation.into()));
    }

    pub fn len(&self) -> usize {
        self.delegations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegations.is_empty()
    }
}

impl Bootstrapper for DelegationRegistry {
    fn bootstrap(&self, eoa: &Addr) -> Option<Account> {
        self.delegations
            .get(eoa)
            .map(|(root_key, implementation)| {
                Account::new(eoa.clone(), root_key.clone(), implementation.clone())
            })
    }
}
