use std::collections::BTreeMap;

use cosmwasm_std::{from_json, Binary, Coin, StdResult, Uint128};
use relay_intents_types::settler_write_preimage;
use sha2::{Digest, Sha256};

use crate::error::ContractError;

/// Storage key of a bridge send recorded for later delivery
///
/// Each field is length prefixed so that no two distinct triples share a key.
pub fn send_authorization_key(sender: &str, settlement_id: &[u8], context: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    for field in [sender.as_bytes(), settlement_id, context] {
        hasher.update((field.len() as u32).to_be_bytes());
        hasher.update(field);
    }
    hasher.finalize().to_vec()
}

/// Hash the oracle signs for a write on settler `settler`
pub fn write_digest(settler: &str, sender: &str, settlement_id: &[u8], chain_id: u64) -> [u8; 32] {
    Sha256::digest(settler_write_preimage(settler, sender, settlement_id, chain_id)).into()
}

pub fn decode_chain_ids(context: &Binary) -> Result<Vec<u64>, ContractError> {
    from_json(context).map_err(|err| ContractError::InvalidContext {
        reason: format!("expected a list of chain ids: {err}"),
    })
}

pub fn decode_endpoint_ids(context: &Binary) -> Result<Vec<u32>, ContractError> {
    from_json(context).map_err(|err| ContractError::InvalidContext {
        reason: format!("expected a list of endpoint ids: {err}"),
    })
}

pub fn sum_coins<'a>(coins: impl IntoIterator<Item = &'a Coin>) -> StdResult<BTreeMap<String, Uint128>> {
    let mut totals: BTreeMap<String, Uint128> = BTreeMap::new();
    for coin in coins {
        let total = totals.entry(coin.denom.clone()).or_default();
        *total = total.checked_add(coin.amount)?;
    }
    Ok(totals)
}

/// Funds left over once `required` is paid out of `provided`
pub fn fee_change(
    required: &BTreeMap<String, Uint128>,
    provided: &BTreeMap<String, Uint128>,
) -> Result<Vec<Coin>, ContractError> {
    let mut change = Vec::new();
    for (denom, amount) in required {
        let paid = provided.get(denom).copied().unwrap_or_default();
        if paid < *amount {
            return Err(ContractError::InsufficientFee {
                required: format_coins(required),
                provided: format_coins(provided),
            });
        }
    }
    for (denom, paid) in provided {
        let owed = required.get(denom).copied().unwrap_or_default();
        let rest = paid.saturating_sub(owed);
        if !rest.is_zero() {
            change.push(Coin::new(rest, denom.clone()));
        }
    }
    Ok(change)
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
