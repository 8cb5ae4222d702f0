//! The dispute coordinator
//!
//! Walks a dispute Open -> Voting -> Resolved. Commitments are accepted only
//! while Open, reveals only while Voting and before the reveal deadline, and
//! the verdict is forwarded into the job state machine exactly once. Stake
//! statuses are the instruction to the external custodian; no funds move in
//! this crate.

use crate::vote_commitment;
use chrono::{DateTime, Utc};
use gigmesh_jobs::JobService;
use gigmesh_store::DisputeStore;
use gigmesh_types::{
    AccountId, Amount, Dispute, DisputeId, DisputeStatus, DisputeVerdict, GigMeshError, JobId,
    JobStatus, JurorId, Result, StakeStatus,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Commit-reveal adjudication of disputed jobs
pub struct DisputeCoordinator {
    disputes: Arc<dyn DisputeStore>,
    jobs: Arc<JobService>,
}

impl DisputeCoordinator {
    pub fn new(disputes: Arc<dyn DisputeStore>, jobs: Arc<JobService>) -> Self {
        Self { disputes, jobs }
    }

    /// Contest a job and empanel a jury
    ///
    /// The job flip and escrow freeze happen through the job service, which
    /// also checks that the initiator is a party to the job.
    pub async fn open_dispute(
        &self,
        job_id: JobId,
        initiator: AccountId,
        jurors: Vec<JurorId>,
        stake: Amount,
        reveal_deadline: DateTime<Utc>,
    ) -> Result<Dispute> {
        if stake.is_negative() {
            return Err(GigMeshError::invalid_input(
                "stake",
                "juror stake cannot be negative",
            ));
        }
        if reveal_deadline <= Utc::now() {
            return Err(GigMeshError::invalid_input(
                "reveal_deadline",
                "reveal deadline must be in the future",
            ));
        }
        let dispute = Dispute::new(job_id, initiator, jurors, stake, reveal_deadline);
        if dispute.ballots.is_empty() {
            return Err(GigMeshError::invalid_input(
                "jurors",
                "dispute needs at least one juror",
            ));
        }

        self.jobs.dispute(job_id, initiator, dispute.id).await?;
        self.disputes.insert(dispute.clone()).await?;

        info!(
            dispute_id = %dispute.id,
            job_id = %job_id,
            jurors = dispute.ballots.len(),
            quorum = dispute.quorum,
            "dispute opened"
        );
        Ok(dispute)
    }

    /// Record a juror's vote commitment during the commit phase
    pub async fn commit_vote(
        &self,
        dispute_id: DisputeId,
        juror: JurorId,
        commitment: impl Into<String>,
    ) -> Result<Dispute> {
        let stored = self.disputes.get(&dispute_id).await?;
        let mut dispute = stored.record;

        if dispute.status != DisputeStatus::Open {
            return Err(self.bad_phase(&dispute, "commit"));
        }
        let ballot = dispute
            .ballot_mut(&juror)
            .ok_or_else(|| GigMeshError::UnknownJuror {
                dispute_id: dispute_id.to_string(),
                juror_id: juror.to_string(),
            })?;
        if ballot.commitment.is_some() {
            return Err(GigMeshError::invalid_input(
                "commitment",
                "juror has already committed",
            ));
        }
        ballot.commitment = Some(commitment.into());

        self.disputes
            .update(&dispute_id, stored.version, dispute.clone())
            .await?;
        info!(dispute_id = %dispute_id, juror = %juror, "vote committed");
        Ok(dispute)
    }

    /// Close the commit phase and start accepting reveals
    pub async fn begin_reveal(&self, dispute_id: DisputeId) -> Result<Dispute> {
        let stored = self.disputes.get(&dispute_id).await?;
        let mut dispute = stored.record;

        if dispute.status != DisputeStatus::Open {
            return Err(self.bad_phase(&dispute, "voting"));
        }
        dispute.status = DisputeStatus::Voting;

        self.disputes
            .update(&dispute_id, stored.version, dispute.clone())
            .await?;
        info!(
            dispute_id = %dispute_id,
            committed = dispute.committed_count(),
            "reveal phase opened"
        );
        Ok(dispute)
    }

    /// Reveal a committed vote
    ///
    /// The coordinator recomputes the commitment from the revealed vote and
    /// salt. A mismatch forfeits the juror's stake and is persisted before
    /// the error returns.
    pub async fn reveal_vote(
        &self,
        dispute_id: DisputeId,
        juror: JurorId,
        vote: bool,
        salt: &str,
    ) -> Result<Dispute> {
        let stored = self.disputes.get(&dispute_id).await?;
        let mut dispute = stored.record;

        if dispute.status != DisputeStatus::Voting {
            return Err(self.bad_phase(&dispute, "reveal"));
        }
        if Utc::now() > dispute.reveal_deadline {
            return Err(GigMeshError::invalid_input(
                "reveal_deadline",
                "reveal window has closed",
            ));
        }

        let matched;
        {
            let ballot = dispute
                .ballot_mut(&juror)
                .ok_or_else(|| GigMeshError::UnknownJuror {
                    dispute_id: dispute_id.to_string(),
                    juror_id: juror.to_string(),
                })?;
            let commitment = ballot.commitment.clone().ok_or_else(|| {
                GigMeshError::invalid_input("commitment", "no commitment to reveal")
            })?;
            if ballot.revealed.is_some() {
                return Err(GigMeshError::invalid_input(
                    "reveal",
                    "juror has already revealed",
                ));
            }
            if ballot.stake_status == StakeStatus::Forfeited {
                return Err(GigMeshError::invalid_input(
                    "reveal",
                    "stake already forfeited",
                ));
            }

            matched = vote_commitment(vote, salt) == commitment;
            if matched {
                ballot.revealed = Some(vote);
            } else {
                ballot.stake_status = StakeStatus::Forfeited;
            }
        }

        self.disputes
            .update(&dispute_id, stored.version, dispute.clone())
            .await?;
        if !matched {
            warn!(dispute_id = %dispute_id, juror = %juror, "reveal mismatched commitment, stake forfeited");
            return Err(GigMeshError::CommitmentMismatch {
                dispute_id: dispute_id.to_string(),
                juror_id: juror.to_string(),
            });
        }
        info!(dispute_id = %dispute_id, juror = %juror, vote, "vote revealed");
        Ok(dispute)
    }

    /// Adjudicate from the revealed votes
    ///
    /// Requires a quorum of valid reveals. Majority decides; a tie favors
    /// the poster.
    pub async fn resolve(&self, dispute_id: DisputeId) -> Result<Dispute> {
        let stored = self.disputes.get(&dispute_id).await?;
        let dispute = stored.record;

        if dispute.status != DisputeStatus::Voting {
            return Err(self.bad_phase(&dispute, "resolve"));
        }
        if dispute.revealed_count() < dispute.quorum {
            return Err(GigMeshError::ThresholdNotMet {
                job_id: dispute.job_id.to_string(),
                approvals: dispute.revealed_count(),
                threshold: dispute.quorum,
            });
        }

        let (worker_votes, poster_votes) = dispute.tally();
        let verdict = if worker_votes > poster_votes {
            DisputeVerdict::ReleaseToWorker
        } else {
            DisputeVerdict::RefundToPoster
        };
        self.apply(dispute, stored.version, verdict).await
    }

    /// Adjudicate a dispute whose reveal deadline passed without quorum
    ///
    /// The conservative default: funds go back to the poster. Jurors who
    /// never revealed forfeit their stake.
    pub async fn resolve_expired(&self, dispute_id: DisputeId) -> Result<Dispute> {
        let stored = self.disputes.get(&dispute_id).await?;
        let dispute = stored.record;

        if dispute.status.is_terminal() {
            return Err(self.bad_phase(&dispute, "resolve"));
        }
        if Utc::now() <= dispute.reveal_deadline {
            return Err(GigMeshError::invalid_input(
                "reveal_deadline",
                "reveal window is still open",
            ));
        }
        if dispute.revealed_count() >= dispute.quorum {
            return Err(GigMeshError::invalid_input(
                "quorum",
                "quorum was reached, resolve by tally",
            ));
        }

        self.apply(dispute, stored.version, DisputeVerdict::RefundToPoster)
            .await
    }

    /// Current dispute record
    pub async fn get(&self, dispute_id: DisputeId) -> Result<Dispute> {
        Ok(self.disputes.get(&dispute_id).await?.record)
    }

    /// Forward the verdict, settle stakes, and close the record
    ///
    /// The job state machine settles at most once, so a retry after a lost
    /// record write finds the job already closed in the verdict's direction
    /// and treats the forward as done.
    async fn apply(
        &self,
        mut dispute: Dispute,
        version: u64,
        verdict: DisputeVerdict,
    ) -> Result<Dispute> {
        let settled_status = match verdict {
            DisputeVerdict::ReleaseToWorker => JobStatus::Completed,
            DisputeVerdict::RefundToPoster => JobStatus::Refunded,
        };
        if let Err(e) = self.jobs.resolve(dispute.job_id, dispute.id, verdict).await {
            let already_settled = matches!(e, GigMeshError::InvalidTransition { .. })
                && self.jobs.get(dispute.job_id).await?.status == settled_status;
            if !already_settled {
                return Err(e);
            }
        }

        for ballot in &mut dispute.ballots {
            if ballot.stake_status == StakeStatus::Held {
                ballot.stake_status = if ballot.revealed.is_some() {
                    StakeStatus::Returned
                } else {
                    StakeStatus::Forfeited
                };
            }
        }
        dispute.status = DisputeStatus::Resolved;
        dispute.verdict = Some(verdict);
        dispute.resolved_at = Some(Utc::now());

        self.disputes
            .update(&dispute.id, version, dispute.clone())
            .await?;
        info!(
            dispute_id = %dispute.id,
            job_id = %dispute.job_id,
            verdict = ?verdict,
            "dispute resolved"
        );
        Ok(dispute)
    }

    fn bad_phase(&self, dispute: &Dispute, to: &str) -> GigMeshError {
        GigMeshError::InvalidTransition {
            job_id: dispute.job_id.to_string(),
            from: dispute.status.to_string(),
            to: to.to_string(),
        }
    }
}
