use cosmwasm_std::{StdError, Uint128};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Escrow not found: {id}")]
    EscrowNotFound { id: String },

    #[error("Escrow already exists: {id}")]
    EscrowAlreadyExists { id: String },

    #[error("Invalid escrow: {reason}")]
    InvalidEscrow { reason: String },

    #[error("Refund amount {refund_amount} exceeds escrow amount {escrow_amount}")]
    InvalidRefundAmount {
        refund_amount: Uint128,
        escrow_amount: Uint128,
    },

    #[error("Invalid funds: expected {expected}, got {got}")]
    InvalidFunds { expected: String, got: String },

    #[error("Invalid escrow status for this operation: {id} is {status}")]
    InvalidStatus { id: String, status: String },

    #[error("Escrow {id} is refundable after {refund_timestamp}")]
    RefundNotYetEligible { id: String, refund_timestamp: u64 },

    #[error("Settlement not attested for escrow {id}")]
    SettlementNotAttested { id: String },

    #[error("Empty batch")]
    EmptyBatch {},
}
