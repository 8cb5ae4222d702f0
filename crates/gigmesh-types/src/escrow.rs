//! Escrow records and approval bookkeeping
//!
//! One escrow per job, keyed by the job id. The oracle set and threshold are
//! fixed at open time; approvals accumulate until the threshold gates an
//! execution, which happens at most once.

use crate::{AccountId, Amount, JobId, OracleId, TransferRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an escrow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    /// Opened, not yet funded
    Pending,
    /// Holding the job budget
    Funded,
    /// Paid out to the worker; terminal
    Released,
    /// Returned to the poster; terminal
    Refunded,
    /// Frozen pending dispute adjudication
    Disputed,
}

impl EscrowStatus {
    /// Check if funds have already moved
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Released | Self::Refunded)
    }

    /// Check if the escrow currently holds funds
    pub fn is_holding(&self) -> bool {
        matches!(self, Self::Funded | Self::Disputed)
    }
}

impl fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Funded => "funded",
            Self::Released => "released",
            Self::Refunded => "refunded",
            Self::Disputed => "disputed",
        };
        write!(f, "{}", s)
    }
}

/// The custody record for one job's budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Escrow {
    /// The job whose budget this escrow holds; also the custody key
    pub job_id: JobId,
    /// Account refunds flow back to
    pub poster: AccountId,
    /// Account releases pay out to; recorded when the escrow is funded
    pub worker: Option<AccountId>,
    pub amount: Amount,
    /// Ordered, deduplicated set of accounts allowed to approve payout
    pub oracles: Vec<OracleId>,
    /// Approvals required before execution, 1..=oracles.len()
    pub threshold: usize,
    pub release_approvals: Vec<OracleId>,
    pub refund_approvals: Vec<OracleId>,
    pub status: EscrowStatus,
    /// Reference returned by the funds mover once executed
    pub transfer_ref: Option<TransferRef>,
    pub created_at: DateTime<Utc>,
    pub funded_at: Option<DateTime<Utc>>,
    pub executed_at: Option<DateTime<Utc>>,
}

impl Escrow {
    /// Create a pending escrow with a deduplicated oracle set
    pub fn new(
        job_id: JobId,
        poster: AccountId,
        amount: Amount,
        oracles: Vec<OracleId>,
        threshold: usize,
    ) -> Self {
        let mut deduped: Vec<OracleId> = Vec::with_capacity(oracles.len());
        for oracle in oracles {
            if !deduped.contains(&oracle) {
                deduped.push(oracle);
            }
        }
        Self {
            job_id,
            poster,
            worker: None,
            amount,
            oracles: deduped,
            threshold,
            release_approvals: Vec::new(),
            refund_approvals: Vec::new(),
            status: EscrowStatus::Pending,
            transfer_ref: None,
            created_at: Utc::now(),
            funded_at: None,
            executed_at: None,
        }
    }

    /// Check if the oracle is registered on this escrow
    pub fn has_oracle(&self, oracle: &OracleId) -> bool {
        self.oracles.contains(oracle)
    }

    /// Record a release approval; returns false if already recorded
    pub fn approve_release(&mut self, oracle: OracleId) -> bool {
        if self.release_approvals.contains(&oracle) {
            return false;
        }
        self.release_approvals.push(oracle);
        true
    }

    /// Record a refund approval; returns false if already recorded
    pub fn approve_refund(&mut self, oracle: OracleId) -> bool {
        if self.refund_approvals.contains(&oracle) {
            return false;
        }
        self.refund_approvals.push(oracle);
        true
    }

    /// Check if release approvals have reached the threshold
    pub fn release_threshold_met(&self) -> bool {
        self.release_approvals.len() >= self.threshold
    }

    /// Check if refund approvals have reached the threshold
    pub fn refund_threshold_met(&self) -> bool {
        self.refund_approvals.len() >= self.threshold
    }
}
