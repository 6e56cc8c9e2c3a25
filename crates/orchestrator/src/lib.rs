pub mod bootstrap;
pub mod error;
pub mod funder;
pub mod ledger;
pub mod orchestrator;
pub mod pause;


// Re-export main types
pub use bootstrap::{Bootstrapper, DelegationRegistry};
pub use error::{OrchestratorError, ResultCode};
pub use funder::{FundContext, Funder, FunderError, SimpleFunder};
pub use ledger::{Ledger, LedgerError};
pub use orchestrator::{ExecuteOutcome, Orchestrator, OrchestratorConfig};
pub use pause::{PauseController, PauseError, MAX_PAUSE_DURATION, PAUSE_COOLDOWN};
