use std::collections::{BTreeMap, BTreeSet};

use cosmwasm_std::{Addr, Binary};
use relay_intents_types::{
    verify_secp256k1, AccountCall, Call, DecodeLimits, Key, KeyHash, Nonce, SequenceKey, Verifier,
    WrappedSignature,
};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::AccountError;
use crate::keystore::KeyStore;

/// Who produced a validated signature
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signer {
    /// The account's own secp256k1 key
    Root,
    Key(KeyHash),
}

/// A user's account: keys, nonces and checker approvals
#[derive(Clone, Debug)]
pub struct Account {
    address: Addr,
    root_key: Binary,
    implementation: String,
    keys: KeyStore,
    nonces: BTreeMap<SequenceKey, u64>,
    checkers: BTreeMap<KeyHash, BTreeSet<Addr>>,
}

impl Account {
    pub fn new(address: Addr, root_key: Binary, implementation: impl Into<String>) -> Self {
        Self {
            address,
            root_key,
            implementation: implementation.into(),
            keys: KeyStore::new(),
            nonces: BTreeMap::new(),
            checkers: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> &Addr {
        &self.address
    }

    pub fn root_key(&self) -> &Binary {
        &self.root_key
    }

    pub fn implementation(&self) -> &str {
        &self.implementation
    }

    // ==================== Keys ====================

    /// Add a key or update the expiry and admin flag of an existing one
    pub fn authorize(&mut self, key: Key) -> Result<KeyHash, AccountError> {
        key.validate()?;
        let hash = key.hash();
        let inserted = self.keys.upsert(key);
        debug!(account = %self.address, key_hash = %hash, inserted, "key authorized");
        Ok(hash)
    }

    /// Remove a key along with every checker approved for it
    pub fn revoke(&mut self, key_hash: &KeyHash) -> Result<Key, AccountError> {
        let key = self
            .keys
            .remove(key_hash)
            .ok_or(AccountError::KeyNotFound(*key_hash))?;
        self.checkers.remove(key_hash);
        debug!(account = %self.address, key_hash = %key_hash, "key revoked");
        Ok(key)
    }

    pub fn set_signature_checker_approval(
        &mut self,
        key_hash: &KeyHash,
        checker: Addr,
        is_approved: bool,
    ) -> Result<(), AccountError> {
        if !self.keys.contains(key_hash) {
            return Err(AccountError::KeyNotFound(*key_hash));
        }
        let approved = self.checkers.entry(*key_hash).or_default();
        if is_approved {
            approved.insert(checker);
        } else {
            approved.remove(&checker);
        }
        Ok(())
    }

    pub fn approved_checkers(&self, key_hash: &KeyHash) -> Vec<Addr> {
        self.checkers
            .get(key_hash)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get_key(&self, key_hash: &KeyHash) -> Option<&Key> {
        self.keys.get(key_hash)
    }

    pub fn key_at(&self, index: usize) -> Option<(KeyHash, &Key)> {
        self.keys.at(index)
    }

    /// Unexpired keys, in key-store order
    pub fn get_keys(&self, now: u64) -> Vec<(KeyHash, Key)> {
        self.keys
            .iter()
            .filter(|(_, key)| !key.is_expired(now))
            .map(|(hash, key)| (hash, key.clone()))
            .collect()
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    // ==================== Nonces ====================

    /// Next usable nonce for `key`
    pub fn get_nonce(&self, key: SequenceKey) -> Nonce {
        Nonce::new(key, self.nonces.get(&key).copied().unwrap_or(0))
    }

    pub fn check_and_increment_nonce(&mut self, nonce: &Nonce) -> Result<(), AccountError> {
        let current = self.nonces.entry(nonce.key).or_insert(0);
        if *current != nonce.seq {
            return Err(AccountError::InvalidNonce {
                key: nonce.key.to_hex(),
                expected: *current,
                got: nonce.seq,
            });
        }
        *current = current
            .checked_add(1)
            .ok_or_else(|| AccountError::InvalidCall("nonce space exhausted".to_string()))?;
        Ok(())
    }

    // ==================== Signatures ====================

    /// Validate a wrapped signature over `digest` and report who signed it
    pub fn unwrap_and_validate_signature(
        &self,
        digest: &[u8; 32],
        signature: &[u8],
        now: u64,
        limits: &DecodeLimits,
    ) -> Result<Signer, AccountError> {
        match WrappedSignature::parse(signature)? {
            WrappedSignature::Root(inner) => {
                verify_secp256k1(digest, &inner, &self.root_key)?;
                Ok(Signer::Root)
            }
            WrappedSignature::Key {
                inner,
                key_hash,
                prehash,
            } => {
                let key = self
                    .keys
                    .get(&key_hash)
                    .ok_or(AccountError::KeyNotFound(key_hash))?;
                if key.is_expired(now) {
                    return Err(AccountError::KeyExpired(key_hash));
                }
                let message: [u8; 32] = if prehash {
                    Sha256::digest(digest).into()
                } else {
                    *digest
                };
                Verifier::for_key(key).verify(&message, &inner, limits)?;
                Ok(Signer::Key(key_hash))
            }
        }
    }

    pub fn is_super_admin(&self, signer: &Signer) -> bool {
        match signer {
            Signer::Root => true,
            Signer::Key(hash) => self.keys.get(hash).is_some_and(|key| key.is_super_admin),
        }
    }

    /// Signature check on behalf of `caller`
    ///
    /// Valid when the signature verifies and the signer is the root key, a
    /// super-admin key, or a key that approved `caller` as its checker.
    pub fn is_valid_signature(
        &self,
        caller: &Addr,
        digest: &[u8; 32],
        signature: &[u8],
        now: u64,
        limits: &DecodeLimits,
    ) -> bool {
        match self.unwrap_and_validate_signature(digest, signature, now, limits) {
            Ok(Signer::Root) => true,
            Ok(Signer::Key(hash)) => {
                self.is_super_admin(&Signer::Key(hash))
                    || self
                        .checkers
                        .get(&hash)
                        .is_some_and(|set| set.contains(caller))
            }
            Err(_) => false,
        }
    }

    // ==================== Execution ====================

    /// Apply a batch on behalf of `signer`
    ///
    /// Self-calls are account management actions and need an admin signer;
    /// everything else is returned for the caller to dispatch.
    pub fn execute(&mut self, calls: &[Call], signer: &Signer) -> Result<Vec<Call>, AccountError> {
        let mut outbound = Vec::new();
        for call in calls {
            if call.to != self.address {
                outbound.push(call.clone());
                continue;
            }

            if !self.is_super_admin(signer) {
                return Err(AccountError::Unauthorized(
                    "self-call requires an admin key".to_string(),
                ));
            }
            if !call.value.is_zero() {
                return Err(AccountError::InvalidCall(
                    "self-call cannot carry value".to_string(),
                ));
            }
            let action: AccountCall = serde_json::from_slice(&call.data)
                .map_err(|e| AccountError::InvalidCall(e.to_string()))?;
            self.apply(action)?;
        }
        Ok(outbound)
    }

    fn apply(&mut self, action: AccountCall) -> Result<(), AccountError> {
        match action {
            AccountCall::Authorize { key } => self.authorize(key).map(|_| ()),
            AccountCall::Revoke { key_hash } => {
                self.revoke(&KeyHash::from_slice(&key_hash)?).map(|_| ())
            }
            AccountCall::SetSignatureCheckerApproval {
                key_hash,
                checker,
                is_approved,
            } => self.set_signature_checker_approval(
                &KeyHash::from_slice(&key_hash)?,
                Addr::unchecked(checker),
                is_approved,
            ),
        }
    }
}
