//! Dispute records for commit-reveal juror voting

use crate::{AccountId, Amount, DisputeId, JobId, JurorId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of a dispute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    /// Accepting commitments
    Open,
    /// Commit phase closed, accepting reveals
    Voting,
    /// Verdict recorded; terminal
    Resolved,
}

impl DisputeStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved)
    }
}

impl fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::Voting => "voting",
            Self::Resolved => "resolved",
        };
        write!(f, "{}", s)
    }
}

/// What happened to a juror's stake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeStatus {
    /// Locked for the duration of the dispute
    Held,
    /// Returned after an honest reveal
    Returned,
    /// Sent to the juror pool after a mismatch or a missed reveal
    Forfeited,
}

/// Outcome of an adjudicated dispute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeVerdict {
    /// Pay the worker per the release split
    ReleaseToWorker,
    /// Return funds to the poster per the disputed-refund split
    RefundToPoster,
}

/// One juror's participation in a dispute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JurorBallot {
    pub juror: JurorId,
    /// Hex-encoded SHA-256 of vote byte plus salt
    pub commitment: Option<String>,
    /// Revealed vote; true favors the worker
    pub revealed: Option<bool>,
    pub stake: Amount,
    pub stake_status: StakeStatus,
}

/// An open question about a job, adjudicated by an empaneled jury
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispute {
    pub id: DisputeId,
    pub job_id: JobId,
    pub initiator: AccountId,
    pub ballots: Vec<JurorBallot>,
    /// Valid reveals required to adjudicate, default strict majority of jurors
    pub quorum: usize,
    pub reveal_deadline: DateTime<Utc>,
    pub status: DisputeStatus,
    pub verdict: Option<DisputeVerdict>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Dispute {
    /// Empanel a jury with one ballot per juror, stake held
    ///
    /// Duplicate juror ids are dropped; quorum defaults to a strict majority
    /// of the deduplicated panel.
    pub fn new(
        job_id: JobId,
        initiator: AccountId,
        jurors: Vec<JurorId>,
        stake: Amount,
        reveal_deadline: DateTime<Utc>,
    ) -> Self {
        let mut ballots: Vec<JurorBallot> = Vec::with_capacity(jurors.len());
        for juror in jurors {
            if ballots.iter().any(|b| b.juror == juror) {
                continue;
            }
            ballots.push(JurorBallot {
                juror,
                commitment: None,
                revealed: None,
                stake,
                stake_status: StakeStatus::Held,
            });
        }
        let quorum = ballots.len() / 2 + 1;
        Self {
            id: DisputeId::new(),
            job_id,
            initiator,
            ballots,
            quorum,
            reveal_deadline,
            status: DisputeStatus::Open,
            verdict: None,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    /// Look up a juror's ballot
    pub fn ballot(&self, juror: &JurorId) -> Option<&JurorBallot> {
        self.ballots.iter().find(|b| &b.juror == juror)
    }

    /// Look up a juror's ballot mutably
    pub fn ballot_mut(&mut self, juror: &JurorId) -> Option<&mut JurorBallot> {
        self.ballots.iter_mut().find(|b| &b.juror == juror)
    }

    /// Number of ballots with a commitment recorded
    pub fn committed_count(&self) -> usize {
        self.ballots.iter().filter(|b| b.commitment.is_some()).count()
    }

    /// Number of ballots with a valid reveal recorded
    pub fn revealed_count(&self) -> usize {
        self.ballots.iter().filter(|b| b.revealed.is_some()).count()
    }

    /// Tally of revealed votes as (favor worker, favor poster)
    pub fn tally(&self) -> (usize, usize) {
        let worker = self
            .ballots
            .iter()
            .filter(|b| b.revealed == Some(true))
            .count();
        let poster = self
            .ballots
            .iter()
            .filter(|b| b.revealed == Some(false))
            .count();
        (worker, poster)
    }
}
