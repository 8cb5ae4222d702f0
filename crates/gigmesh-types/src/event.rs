//! Outbound market events
//!
//! Events are recorded in the outbox after a state commit and delivered by
//! the dispatcher. They describe what happened; they never drive state.

use crate::{AccountId, Amount, DisputeId, DisputeVerdict, JobId, TransferRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything the settlement core announces to the outside world
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarketEvent {
    JobCreated {
        job_id: JobId,
        poster: AccountId,
        budget: Amount,
        timestamp: DateTime<Utc>,
    },
    JobLocked {
        job_id: JobId,
        worker: AccountId,
        timestamp: DateTime<Utc>,
    },
    WorkSubmitted {
        job_id: JobId,
        worker: AccountId,
        deliverable_url: Option<String>,
        timestamp: DateTime<Utc>,
    },
    JobCompleted {
        job_id: JobId,
        timestamp: DateTime<Utc>,
    },
    JobDisputed {
        job_id: JobId,
        dispute_id: DisputeId,
        initiator: AccountId,
        timestamp: DateTime<Utc>,
    },
    DisputeResolved {
        dispute_id: DisputeId,
        job_id: JobId,
        verdict: DisputeVerdict,
        timestamp: DateTime<Utc>,
    },
    EscrowFunded {
        job_id: JobId,
        amount: Amount,
        timestamp: DateTime<Utc>,
    },
    EscrowReleased {
        job_id: JobId,
        amount: Amount,
        transfer_ref: TransferRef,
        timestamp: DateTime<Utc>,
    },
    EscrowRefunded {
        job_id: JobId,
        amount: Amount,
        transfer_ref: TransferRef,
        timestamp: DateTime<Utc>,
    },
}

impl MarketEvent {
    /// Stable name for logs and webhook headers
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::JobCreated { .. } => "job.created",
            Self::JobLocked { .. } => "job.locked",
            Self::WorkSubmitted { .. } => "job.work_submitted",
            Self::JobCompleted { .. } => "job.completed",
            Self::JobDisputed { .. } => "job.disputed",
            Self::DisputeResolved { .. } => "dispute.resolved",
            Self::EscrowFunded { .. } => "escrow.funded",
            Self::EscrowReleased { .. } => "escrow.released",
            Self::EscrowRefunded { .. } => "escrow.refunded",
        }
    }

    /// The job this event concerns
    pub fn job_id(&self) -> JobId {
        match self {
            Self::JobCreated { job_id, .. }
            | Self::JobLocked { job_id, .. }
            | Self::WorkSubmitted { job_id, .. }
            | Self::JobCompleted { job_id, .. }
            | Self::JobDisputed { job_id, .. }
            | Self::DisputeResolved { job_id, .. }
            | Self::EscrowFunded { job_id, .. }
            | Self::EscrowReleased { job_id, .. }
            | Self::EscrowRefunded { job_id, .. } => *job_id,
        }
    }

    /// When the event was recorded
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::JobCreated { timestamp, .. }
            | Self::JobLocked { timestamp, .. }
            | Self::WorkSubmitted { timestamp, .. }
            | Self::JobCompleted { timestamp, .. }
            | Self::JobDisputed { timestamp, .. }
            | Self::DisputeResolved { timestamp, .. }
            | Self::EscrowFunded { timestamp, .. }
            | Self::EscrowReleased { timestamp, .. }
            | Self::EscrowRefunded { timestamp, .. } => *timestamp,
        }
    }
}
