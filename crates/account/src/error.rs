use relay_intents_types::{KeyError, KeyHash, SignatureError};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AccountError {
    #[error("key not found: {0}")]
    KeyNotFound(KeyHash),

    #[error("key expired: {0}")]
    KeyExpired(KeyHash),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid nonce for sequence key {key}: expected {expected}, got {got}")]
    InvalidNonce { key: String, expected: u64, got: u64 },

    #[error("invalid call: {0}")]
    InvalidCall(String),
}
