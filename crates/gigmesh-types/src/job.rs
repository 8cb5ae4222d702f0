//! Job records and lifecycle status

use crate::{AccountId, Amount, Geofence, JobId, PhotoAudit, ProofType, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad category of marketplace work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobCategory {
    /// Software development and automation
    Development,
    /// Writing, design, and media production
    Creative,
    /// Data collection, labeling, and analysis
    Research,
    /// Physical-world tasks with photo evidence
    Field,
    /// Anything else
    Other,
}

/// Lifecycle state of a job
///
/// Only the job state machine mutates this, and only along the published
/// transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Posted and waiting for a worker
    Open,
    /// Accepted by a worker, escrow funded
    Locked,
    /// Deliverable handed in, awaiting poster approval
    Submitted,
    /// Approved; terminal
    Completed,
    /// Under dispute adjudication
    Disputed,
    /// Funds returned to the poster; terminal
    Refunded,
}

impl JobStatus {
    /// Check if the job can never change state again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Refunded)
    }

    /// Check if a dispute may be opened from this state
    pub fn is_disputable(&self) -> bool {
        matches!(self, Self::Locked | Self::Submitted)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Locked => "locked",
            Self::Submitted => "submitted",
            Self::Completed => "completed",
            Self::Disputed => "disputed",
            Self::Refunded => "refunded",
        };
        write!(f, "{}", s)
    }
}

/// A posted unit of paid work
///
/// Poster, budget, deadline and proof requirements are write-once at posting
/// time. Worker and deliverable fields are written exactly once along the
/// lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub poster: AccountId,
    pub worker: Option<AccountId>,
    pub title: String,
    pub description: String,
    pub budget: Amount,
    pub deadline: DateTime<Utc>,
    pub category: JobCategory,
    pub proof_type: ProofType,
    /// Required for photo-proof jobs
    pub geofence: Option<Geofence>,
    /// Minimum coverage percentage for code-proof jobs
    pub min_coverage: Option<u8>,
    pub deliverable_url: Option<String>,
    pub deliverable_hash: Option<String>,
    /// Advisory verdict recorded on submit
    pub verification: Option<Verdict>,
    /// Extracted photo metadata recorded on successful photo verification
    pub photo_audit: Option<PhotoAudit>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a new open job
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        poster: AccountId,
        title: impl Into<String>,
        description: impl Into<String>,
        budget: Amount,
        deadline: DateTime<Utc>,
        category: JobCategory,
        proof_type: ProofType,
    ) -> Self {
        Self {
            id: JobId::new(),
            poster,
            worker: None,
            title: title.into(),
            description: description.into(),
            budget,
            deadline,
            category,
            proof_type,
            geofence: None,
            min_coverage: None,
            deliverable_url: None,
            deliverable_hash: None,
            verification: None,
            photo_audit: None,
            status: JobStatus::Open,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Attach a geofence requirement (photo-proof jobs)
    pub fn with_geofence(mut self, geofence: Geofence) -> Self {
        self.geofence = Some(geofence);
        self
    }

    /// Attach a minimum coverage requirement (code-proof jobs)
    pub fn with_min_coverage(mut self, min_coverage: u8) -> Self {
        self.min_coverage = Some(min_coverage);
        self
    }

    /// Check if the given account posted this job
    pub fn is_poster(&self, account: &AccountId) -> bool {
        &self.poster == account
    }

    /// Check if the given account is the accepted worker
    pub fn is_worker(&self, account: &AccountId) -> bool {
        self.worker.as_ref() == Some(account)
    }
}

/// Per-account activity counters maintained by the job layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reputation {
    pub jobs_posted: u64,
    pub jobs_completed: u64,
    pub total_earned: Amount,
    pub total_spent: Amount,
}
