//! Error types for GigMesh
//!
//! Every failure is explicit. Services return these errors unwrapped and the
//! core never retries on its own; `is_retriable` is advisory for callers.

use thiserror::Error;

/// Result type for GigMesh operations
pub type Result<T> = std::result::Result<T, GigMeshError>;

/// GigMesh error types
#[derive(Debug, Clone, Error)]
pub enum GigMeshError {
    // ========================================================================
    // Amount Errors
    // ========================================================================

    /// Amount overflow during arithmetic
    #[error("Amount overflow during arithmetic operation")]
    AmountOverflow,

    /// Amount underflow during arithmetic
    #[error("Amount underflow during arithmetic operation")]
    AmountUnderflow,

    // ========================================================================
    // Job Errors
    // ========================================================================

    /// Job not found
    #[error("Job {job_id} not found")]
    JobNotFound { job_id: String },

    /// Job was claimed by another worker first
    #[error("Job {job_id} is no longer available")]
    JobNotAvailable { job_id: String },

    /// Requested transition is not in the lifecycle table
    #[error("Invalid transition for job {job_id}: {from} -> {to}")]
    InvalidTransition {
        job_id: String,
        from: String,
        to: String,
    },

    /// Deadline has already passed
    #[error("Deadline for job {job_id} passed at {deadline}")]
    DeadlinePassed { job_id: String, deadline: String },

    // ========================================================================
    // Escrow Errors
    // ========================================================================

    /// Escrow not found
    #[error("Escrow for job {job_id} not found")]
    EscrowNotFound { job_id: String },

    /// Escrow already funded
    #[error("Escrow for job {job_id} is already funded")]
    AlreadyFunded { job_id: String },

    /// Escrow already reached a terminal state
    #[error("Escrow for job {job_id} already executed (status: {status})")]
    AlreadyExecuted { job_id: String, status: String },

    /// Approver is not in the escrow's oracle set
    #[error("Oracle {oracle_id} is not registered on escrow for job {job_id}")]
    UnknownOracle { job_id: String, oracle_id: String },

    /// Approval or reveal set has not reached the required threshold
    #[error("Job {job_id} has {approvals} of {threshold} required approvals")]
    ThresholdNotMet {
        job_id: String,
        approvals: usize,
        threshold: usize,
    },

    /// Funds mover reported a failure
    #[error("Transfer for job {job_id} failed: {reason}")]
    TransferFailed { job_id: String, reason: String },

    // ========================================================================
    // Dispute Errors
    // ========================================================================

    /// Dispute not found
    #[error("Dispute {dispute_id} not found")]
    DisputeNotFound { dispute_id: String },

    /// Voter is not in the dispute's juror set
    #[error("Juror {juror_id} is not empaneled on dispute {dispute_id}")]
    UnknownJuror {
        dispute_id: String,
        juror_id: String,
    },

    /// Revealed vote does not hash to the committed value
    #[error("Reveal by juror {juror_id} does not match commitment on dispute {dispute_id}")]
    CommitmentMismatch {
        dispute_id: String,
        juror_id: String,
    },

    // ========================================================================
    // Verification Errors
    // ========================================================================

    /// Proof could not be checked (wrong payload variant or collaborator failure)
    #[error("Verification failed for job {job_id}: {reason}")]
    VerificationFailed { job_id: String, reason: String },

    // ========================================================================
    // Security Errors
    // ========================================================================

    /// Unauthorized action
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    // ========================================================================
    // Storage Errors
    // ========================================================================

    /// Conditional update lost a race with a concurrent writer
    #[error("Version conflict on {entity}: expected {expected}, found {actual}")]
    VersionConflict {
        entity: String,
        expected: u64,
        actual: u64,
    },

    // ========================================================================
    // General Errors
    // ========================================================================

    /// Invalid input
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl GigMeshError {
    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Check if this is a retriable error
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::Internal { .. } | Self::VersionConflict { .. } | Self::TransferFailed { .. }
        )
    }

    /// Get an error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::AmountUnderflow => "AMOUNT_UNDERFLOW",
            Self::JobNotFound { .. } => "JOB_NOT_FOUND",
            Self::JobNotAvailable { .. } => "JOB_NOT_AVAILABLE",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::DeadlinePassed { .. } => "DEADLINE_PASSED",
            Self::EscrowNotFound { .. } => "ESCROW_NOT_FOUND",
            Self::AlreadyFunded { .. } => "ALREADY_FUNDED",
            Self::AlreadyExecuted { .. } => "ALREADY_EXECUTED",
            Self::UnknownOracle { .. } => "UNKNOWN_ORACLE",
            Self::ThresholdNotMet { .. } => "THRESHOLD_NOT_MET",
            Self::TransferFailed { .. } => "TRANSFER_FAILED",
            Self::DisputeNotFound { .. } => "DISPUTE_NOT_FOUND",
            Self::UnknownJuror { .. } => "UNKNOWN_JUROR",
            Self::CommitmentMismatch { .. } => "COMMITMENT_MISMATCH",
            Self::VerificationFailed { .. } => "VERIFICATION_FAILED",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::VersionConflict { .. } => "VERSION_CONFLICT",
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
