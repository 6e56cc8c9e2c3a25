use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Binary, HexBinary};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("{0:?} keys cannot be super admin")]
    SuperAdminNotAllowed(KeyType),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("key hash must be 32 bytes, got {0}")]
    InvalidKeyHash(usize),
}

/// Verifier family of a key, with its stable wire tag
#[cw_serde]
#[derive(Copy, Eq, Hash)]
pub enum KeyType {
    P256,
    WebAuthnP256,
    Secp256k1,
}

impl KeyType {
    pub fn tag(&self) -> u8 {
        match self {
            KeyType::P256 => 0,
            KeyType::WebAuthnP256 => 1,
            KeyType::Secp256k1 => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(KeyType::P256),
            1 => Some(KeyType::WebAuthnP256),
            2 => Some(KeyType::Secp256k1),
            _ => None,
        }
    }

    /// Raw P-256 session keys are never allowed to administer the account
    pub fn may_be_super_admin(&self) -> bool {
        !matches!(self, KeyType::P256)
    }
}

/// Identity of a key: sha256(type tag || public key)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyHash(pub [u8; 32]);

impl KeyHash {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let hash: [u8; 32] = bytes
            .try_into()
            .map_err(|_| KeyError::InvalidKeyHash(bytes.len()))?;
        Ok(Self(hash))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<KeyHash> for HexBinary {
    fn from(hash: KeyHash) -> Self {
        HexBinary::from(hash.0.as_slice())
    }
}

impl std::fmt::Display for KeyHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A key authorized on an account
#[cw_serde]
pub struct Key {
    /// Unix seconds after which the key is ignored; 0 never expires
    pub expiry: u64,
    pub key_type: KeyType,
    pub is_super_admin: bool,
    /// SEC1-encoded public key
    pub public_key: Binary,
}

impl Key {
    pub fn new(key_type: KeyType, public_key: impl Into<Binary>) -> Self {
        Self {
            expiry: 0,
            key_type,
            is_super_admin: false,
            public_key: public_key.into(),
        }
    }

    pub fn with_expiry(mut self, expiry: u64) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn super_admin(mut self) -> Self {
        self.is_super_admin = true;
        self
    }

    pub fn hash(&self) -> KeyHash {
        let mut hasher = Sha256::new();
        hasher.update([self.key_type.tag()]);
        hasher.update(self.public_key.as_slice());
        KeyHash(hasher.finalize().into())
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.expiry != 0 && now > self.expiry
    }

    /// Check the super-admin rule and that the public key parses for its curve
    pub fn validate(&self) -> Result<(), KeyError> {
        if self.is_super_admin && !self.key_type.may_be_super_admin() {
            return Err(KeyError::SuperAdminNotAllowed(self.key_type));
        }
        match self.key_type {
            KeyType::Secp256k1 => {
                k256::ecdsa::VerifyingKey::from_sec1_bytes(self.public_key.as_slice())
                    .map(|_| ())
                    .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))
            }
            KeyType::P256 | KeyType::WebAuthnP256 => {
                p256::ecdsa::VerifyingKey::from_sec1_bytes(self.public_key.as_slice())
                    .map(|_| ())
                    .map_err(|e| KeyError::InvalidPublicKey(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{derive_p256_public_key, derive_public_key};

    #[test]
    fn test_hash_ignores_expiry_and_admin_flag() {
        let pk = derive_public_key(&[0x11; 32]).unwrap();
        let a = Key::new(KeyType::Secp256k1, pk.clone());
        let b = Key::new(KeyType::Secp256k1, pk).with_expiry(99).super_admin();
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_hash_depends_on_type() {
        let pk = derive_p256_public_key(&[0x22; 32]).unwrap();
        let a = Key::new(KeyType::P256, pk.clone());
        let b = Key::new(KeyType::WebAuthnP256, pk);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_p256_super_admin_rejected() {
        let pk = derive_p256_public_key(&[0x22; 32]).unwrap();
        let key = Key::new(KeyType::P256, pk.clone()).super_admin();
        assert_eq!(
            key.validate(),
            Err(KeyError::SuperAdminNotAllowed(KeyType::P256))
        );
        assert!(Key::new(KeyType::WebAuthnP256, pk)
            .super_admin()
            .validate()
            .is_ok());
    }

    #[test]
    fn test_garbage_public_key_rejected() {
        let key = Key::new(KeyType::Secp256k1, vec![1u8, 2, 3]);
        assert!(matches!(
            key.validate(),
            Err(KeyError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn test_expiry() {
        let pk = derive_public_key(&[0x11; 32]).unwrap();
        let key = Key::new(KeyType::Secp256k1, pk);
        assert!(!key.is_expired(u64::MAX));
        let key = key.with_expiry(100);
        assert!(!key.is_expired(100));
        assert!(key.is_expired(101));
    }
}
