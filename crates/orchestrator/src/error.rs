use relay_intents_types::DecodeError;
use thiserror::Error;

use crate::pause::PauseError;

/// Four-byte status returned by `execute`; zero is success
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResultCode(pub u32);

impl ResultCode {
    pub const SUCCESS: ResultCode = ResultCode(0x0000_0000);
    pub const MALFORMED_ENCODING: ResultCode = ResultCode(0x1000_0001);
    pub const UNAUTHORIZED: ResultCode = ResultCode(0x1000_0002);
    pub const INVALID_NONCE: ResultCode = ResultCode(0x1000_0003);
    pub const PAUSED: ResultCode = ResultCode(0x1000_0004);
    pub const VERIFICATION_ERROR: ResultCode = ResultCode(0x1000_0005);
    pub const PAYMENT_ERROR: ResultCode = ResultCode(0x1000_0006);
    pub const INTENT_EXPIRED: ResultCode = ResultCode(0x1000_0007);
    /// Verified and charged, but the batch itself failed
    pub const EXECUTION_FAILED: ResultCode = ResultCode(0x2000_0001);

    pub fn is_success(&self) -> bool {
        *self == Self::SUCCESS
    }

    pub fn to_be_bytes(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrchestratorError {
    #[error("malformed encoding: {0}")]
    Malformed(#[from] DecodeError),

    #[error("orchestrator is paused")]
    Paused,

    #[error("intent expired at {expiry}, now {now}")]
    Expired { expiry: u64, now: u64 },

    #[error("unknown account {0}")]
    UnknownAccount(String),

    #[error("account runs {actual}, intent requires {expected}")]
    UnsupportedImplementation { expected: String, actual: String },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid nonce: {0}")]
    InvalidNonce(String),

    #[error("signature verification failed: {0}")]
    Verification(String),

    #[error("pre-call {index} failed: {reason}")]
    PreCall { index: usize, reason: String },

    #[error("payment failed: {0}")]
    Payment(String),

    #[error("execution failed: {0}")]
    Execution(String),

    #[error(transparent)]
    Pause(#[from] PauseError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl OrchestratorError {
    pub fn code(&self) -> ResultCode {
        match self {
            OrchestratorError::Malformed(_) => ResultCode::MALFORMED_ENCODING,
            OrchestratorError::Paused => ResultCode::PAUSED,
            OrchestratorError::Expired { .. } => ResultCode::INTENT_EXPIRED,
            OrchestratorError::UnknownAccount(_)
            | OrchestratorError::UnsupportedImplementation { .. }
            | OrchestratorError::Unauthorized(_)
            | OrchestratorError::Pause(_)
            | OrchestratorError::Config(_) => ResultCode::UNAUTHORIZED,
            OrchestratorError::InvalidNonce(_) => ResultCode::INVALID_NONCE,
            OrchestratorError::Verification(_) | OrchestratorError::PreCall { .. } => {
                ResultCode::VERIFICATION_ERROR
            }
            OrchestratorError::Payment(_) => ResultCode::PAYMENT_ERROR,
            OrchestratorError::Execution(_) => ResultCode::EXECUTION_FAILED,
        }
    }

    /// Failures that leave verification and payment committed
    pub fn is_soft(&self) -> bool {
        matches!(self, OrchestratorError::Execution(_))
    }
}
