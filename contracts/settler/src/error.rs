use cosmwasm_std::{StdError, VerificationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Verification(#[from] VerificationError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("{operation} is not supported by the {backend} backend")]
    UnsupportedOperation { operation: String, backend: String },

    #[error("Funds are not accepted by this operation")]
    UnexpectedFunds {},

    #[error("Invalid settler context: {reason}")]
    InvalidContext { reason: String },

    #[error("Invalid public key length: {len}")]
    InvalidPublicKey { len: usize },

    #[error("Invalid attestation signature")]
    InvalidSignature {},

    #[error("Send not authorized for settlement {settlement_id}")]
    SendNotAuthorized { settlement_id: String },

    #[error("No route for endpoint id {eid}")]
    UnknownRoute { eid: u32 },

    #[error("Untrusted peer {peer} for endpoint id {eid}")]
    UntrustedPeer { eid: u32, peer: String },

    #[error("Insufficient fee: required {required}, provided {provided}")]
    InsufficientFee { required: String, provided: String },

    #[error("Invalid bridge payload: {reason}")]
    InvalidPayload { reason: String },

    #[error("Bridge payload addressed to chain {got}, this is chain {expected}")]
    WrongDestination { expected: u64, got: u64 },
}
