//! Account aggregate for signed-intent execution
//!
//! Each account owns its key store, its two-dimensional nonce space and its
//! signature-checker approvals. Nothing here is shared between accounts.

mod account;
mod error;
mod keystore;

pub use account::{Account, Signer};
pub use error::AccountError;
pub use keystore::KeyStore;
