use std::collections::BTreeMap;

use cosmwasm_std::{Addr, Uint128};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LedgerError {
    #[error("insufficient {denom} balance for {holder}: need {needed}, have {available}")]
    InsufficientBalance {
        holder: String,
        denom: String,
        needed: Uint128,
        available: Uint128,
    },

    #[error("balance overflow for {holder} in {denom}")]
    Overflow { holder: String, denom: String },
}

/// Balances per holder and denom
///
/// Every write records the prior balance in an undo journal, so the engine
/// can roll back to a [`Ledger::mark`] without copying the whole book.
#[derive(Clone, Debug, Default)]
pub struct Ledger {
    balances: BTreeMap<(Addr, String), Uint128>,
    journal: Vec<((Addr, String), Option<Uint128>)>,
}

impl PartialEq for Ledger {
    fn eq(&self, other: &Self) -> bool {
        self.balances == other.balances
    }
}

impl Eq for Ledger {}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance(&self, holder: &Addr, denom: &str) -> Uint128 {
        self.balances
            .get(&(holder.clone(), denom.to_string()))
            .copied()
            .unwrap_or_default()
    }

    pub fn credit(&mut self, holder: &Addr, denom: &str, amount: Uint128) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }
        let key = (holder.clone(), denom.to_string());
        let previous = self.balances.get(&key).copied();
        let updated = previous
            .unwrap_or_default()
            .checked_add(amount)
            .map_err(|_| LedgerError::Overflow {
                holder: holder.to_string(),
                denom: denom.to_string(),
            })?;
        self.journal.push((key.clone(), previous));
        self.balances.insert(key, updated);
        Ok(())
    }

    pub fn debit(&mut self, holder: &Addr, denom: &str, amount: Uint128) -> Result<(), LedgerError> {
        if amount.is_zero() {
            return Ok(());
        }
        let available = self.balance(holder, denom);
        let remaining =
            available
                .checked_sub(amount)
                .map_err(|_| LedgerError::InsufficientBalance {
                    holder: holder.to_string(),
                    denom: denom.to_string(),
                    needed: amount,
                    available,
                })?;
        let key = (holder.clone(), denom.to_string());
        self.journal.push((key.clone(), Some(available)));
        if remaining.is_zero() {
            self.balances.remove(&key);
        } else {
            self.balances.insert(key, remaining);
        }
        Ok(())
    }

    pub fn transfer(
        &mut self,
        from: &Addr,
        to: &Addr,
        denom: &str,
        amount: Uint128,
    ) -> Result<(), LedgerError> {
        self.debit(from, denom, amount)?;
        self.credit(to, denom, amount)
    }

    /// Position in the undo journal to pass to `rollback_to`
    pub fn mark(&self) -> usize {
        self.journal.len()
    }

    /// Undo every write made after `mark`, newest first
    pub fn rollback_to(&mut self, mark: usize) {
        while self.journal.len() > mark {
            let Some((key, previous)) = self.journal.pop() else {
                break;
            };
            match previous {
                Some(amount) if !amount.is_zero() => {
                    self.balances.insert(key, amount);
                }
                _ => {
                    self.balances.remove(&key);
                }
            }
        }
    }

    /// Drop the undo journal; writes so far become permanent
    pub fn commit(&mut self) {
        self.journal.clear();
    }
}
