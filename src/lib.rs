//! Signed-intent execution with escrowed cross-chain settlement
//!
//! - [`orchestrator`] verifies, charges and executes intents against accounts
//! - [`escrow`] locks input-chain funds until a settlement is attested
//! - [`settler`] carries attestations between chains

pub use relay_intents_account as account;
pub use relay_intents_config as config;
pub use relay_intents_escrow as escrow;
pub use relay_intents_orchestrator as orchestrator;
pub use relay_intents_settler as settler;
pub use relay_intents_types as types;
