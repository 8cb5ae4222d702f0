//! The job state machine
//!
//! Every status write goes through a compare-and-set against the version the
//! operation read, so two actors racing on the same job cannot both win.
//! Escrow effects (fund, freeze, settle) are driven from here but executed
//! by the ledger; events are pushed only after the store commit.

use crate::ReputationBook;
use chrono::Utc;
use gigmesh_escrow::EscrowLedger;
use gigmesh_events::Outbox;
use gigmesh_store::JobStore;
use gigmesh_types::{
    AccountId, DisputeId, DisputeVerdict, GigMeshError, Job, JobId, JobStatus, MarketEvent,
    OracleId, ProofPayload, ProofType, Result,
};
use gigmesh_verify::Verifier;
use std::sync::Arc;
use tracing::info;

/// Lifecycle operations on jobs
pub struct JobService {
    jobs: Arc<dyn JobStore>,
    ledger: Arc<EscrowLedger>,
    verifier: Arc<Verifier>,
    outbox: Arc<Outbox>,
    reputation: ReputationBook,
}

impl JobService {
    pub fn new(
        jobs: Arc<dyn JobStore>,
        ledger: Arc<EscrowLedger>,
        verifier: Arc<Verifier>,
        outbox: Arc<Outbox>,
    ) -> Self {
        Self {
            jobs,
            ledger,
            verifier,
            outbox,
            reputation: ReputationBook::new(),
        }
    }

    /// Post a job and open its escrow
    ///
    /// The escrow starts Pending with the given oracle set; it is funded when
    /// a worker accepts.
    pub async fn create(
        &self,
        job: Job,
        oracles: Vec<OracleId>,
        threshold: usize,
    ) -> Result<Job> {
        if !job.budget.is_positive() {
            return Err(GigMeshError::invalid_input(
                "budget",
                "job budget must be positive",
            ));
        }
        if job.deadline <= Utc::now() {
            return Err(GigMeshError::invalid_input(
                "deadline",
                "deadline must be in the future",
            ));
        }

        self.jobs.insert(job.clone()).await?;
        self.ledger
            .open(job.id, job.poster, job.budget, oracles, threshold)
            .await?;
        self.reputation.record_posted(job.poster);

        info!(job_id = %job.id, poster = %job.poster, budget = %job.budget, "job created");
        self.outbox.push(MarketEvent::JobCreated {
            job_id: job.id,
            poster: job.poster,
            budget: job.budget,
            timestamp: Utc::now(),
        });
        Ok(job)
    }

    /// Accept an open job as a worker
    ///
    /// Exactly one of any number of racing workers wins; the rest see
    /// `JobNotAvailable`. The winner's acceptance also funds the escrow.
    pub async fn accept(&self, job_id: JobId, worker: AccountId) -> Result<Job> {
        let stored = self.jobs.get(&job_id).await?;
        let mut job = stored.record;

        if job.status != JobStatus::Open {
            return Err(GigMeshError::JobNotAvailable {
                job_id: job_id.to_string(),
            });
        }
        if Utc::now() >= job.deadline {
            return Err(GigMeshError::DeadlinePassed {
                job_id: job_id.to_string(),
                deadline: job.deadline.to_rfc3339(),
            });
        }
        if worker == job.poster {
            return Err(GigMeshError::unauthorized(
                "poster cannot accept their own job",
            ));
        }

        job.worker = Some(worker);
        job.status = JobStatus::Locked;
        match self.jobs.update(&job_id, stored.version, job.clone()).await {
            Ok(_) => {}
            Err(GigMeshError::VersionConflict { .. }) => {
                return Err(GigMeshError::JobNotAvailable {
                    job_id: job_id.to_string(),
                })
            }
            Err(e) => return Err(e),
        }

        info!(job_id = %job_id, worker = %worker, "job locked");
        self.outbox.push(MarketEvent::JobLocked {
            job_id,
            worker,
            timestamp: Utc::now(),
        });
        self.ledger.fund(job_id, worker).await?;
        Ok(job)
    }

    /// Hand in a deliverable for a locked job
    ///
    /// Verification is advisory: the verdict is recorded on the job but a
    /// failed check never blocks submission or the poster's approval.
    pub async fn submit(
        &self,
        job_id: JobId,
        worker: AccountId,
        deliverable_url: impl Into<String>,
        deliverable_hash: impl Into<String>,
        payload: &ProofPayload,
    ) -> Result<Job> {
        let stored = self.jobs.get(&job_id).await?;
        let mut job = stored.record;

        if job.status != JobStatus::Locked {
            return Err(self.bad_transition(&job, JobStatus::Submitted));
        }
        if !job.is_worker(&worker) {
            return Err(GigMeshError::unauthorized(
                "only the locked worker may submit",
            ));
        }

        job.deliverable_url = Some(deliverable_url.into());
        job.deliverable_hash = Some(deliverable_hash.into());
        if job.proof_type != ProofType::Manual {
            let verdict = self.verifier.verify(&mut job, payload).await?;
            info!(
                job_id = %job_id,
                passed = verdict.passed,
                reason = verdict.reason.as_deref().unwrap_or(""),
                "proof checked"
            );
            job.verification = Some(verdict);
        }
        job.status = JobStatus::Submitted;
        self.jobs.update(&job_id, stored.version, job.clone()).await?;

        info!(job_id = %job_id, worker = %worker, "work submitted");
        self.outbox.push(MarketEvent::WorkSubmitted {
            job_id,
            worker,
            deliverable_url: job.deliverable_url.clone(),
            timestamp: Utc::now(),
        });
        Ok(job)
    }

    /// Approve submitted work as the poster
    ///
    /// Completes the job and updates reputation counters. Funds still move
    /// through the escrow's oracle threshold, not from here.
    pub async fn approve(&self, job_id: JobId, actor: AccountId) -> Result<Job> {
        let stored = self.jobs.get(&job_id).await?;
        let mut job = stored.record;

        if job.status != JobStatus::Submitted {
            return Err(self.bad_transition(&job, JobStatus::Completed));
        }
        if !job.is_poster(&actor) {
            return Err(GigMeshError::unauthorized("only the poster may approve"));
        }
        let worker = job
            .worker
            .ok_or_else(|| GigMeshError::internal("submitted job has no worker"))?;

        job.status = JobStatus::Completed;
        job.completed_at = Some(Utc::now());
        self.jobs.update(&job_id, stored.version, job.clone()).await?;
        self.reputation
            .record_completed(job.poster, worker, job.budget)?;

        info!(job_id = %job_id, "job completed");
        self.outbox.push(MarketEvent::JobCompleted {
            job_id,
            timestamp: Utc::now(),
        });
        Ok(job)
    }

    /// Contest a locked or submitted job
    ///
    /// Flips the job to Disputed and freezes the escrow. The caller supplies
    /// the dispute id minted by the coordinator so consumers can correlate.
    pub async fn dispute(
        &self,
        job_id: JobId,
        actor: AccountId,
        dispute_id: DisputeId,
    ) -> Result<Job> {
        let stored = self.jobs.get(&job_id).await?;
        let mut job = stored.record;

        if !job.status.is_disputable() {
            return Err(self.bad_transition(&job, JobStatus::Disputed));
        }
        if !job.is_poster(&actor) && !job.is_worker(&actor) {
            return Err(GigMeshError::unauthorized(
                "only the poster or the worker may dispute",
            ));
        }

        job.status = JobStatus::Disputed;
        self.jobs.update(&job_id, stored.version, job.clone()).await?;
        self.ledger.mark_disputed(job_id).await?;

        info!(job_id = %job_id, dispute_id = %dispute_id, initiator = %actor, "job disputed");
        self.outbox.push(MarketEvent::JobDisputed {
            job_id,
            dispute_id,
            initiator: actor,
            timestamp: Utc::now(),
        });
        Ok(job)
    }

    /// Apply an adjudicated dispute verdict
    ///
    /// Called once by the dispute coordinator. Settles the escrow first,
    /// then closes the job to match.
    pub async fn resolve(
        &self,
        job_id: JobId,
        dispute_id: DisputeId,
        verdict: DisputeVerdict,
    ) -> Result<Job> {
        let stored = self.jobs.get(&job_id).await?;
        let mut job = stored.record;

        if job.status != JobStatus::Disputed {
            return Err(GigMeshError::InvalidTransition {
                job_id: job_id.to_string(),
                from: job.status.to_string(),
                to: "resolved".to_string(),
            });
        }

        self.ledger.resolve_dispute(job_id, verdict).await?;
        match verdict {
            DisputeVerdict::ReleaseToWorker => {
                let worker = job
                    .worker
                    .ok_or_else(|| GigMeshError::internal("disputed job has no worker"))?;
                job.status = JobStatus::Completed;
                job.completed_at = Some(Utc::now());
                self.reputation
                    .record_completed(job.poster, worker, job.budget)?;
            }
            DisputeVerdict::RefundToPoster => {
                job.status = JobStatus::Refunded;
            }
        }
        self.jobs.update(&job_id, stored.version, job.clone()).await?;

        info!(job_id = %job_id, dispute_id = %dispute_id, verdict = ?verdict, "dispute applied");
        self.outbox.push(MarketEvent::DisputeResolved {
            dispute_id,
            job_id,
            verdict,
            timestamp: Utc::now(),
        });
        Ok(job)
    }

    /// Current job record
    pub async fn get(&self, job_id: JobId) -> Result<Job> {
        Ok(self.jobs.get(&job_id).await?.record)
    }

    /// All jobs, in no particular order
    pub async fn list(&self) -> Result<Vec<Job>> {
        self.jobs.list().await
    }

    /// Reputation counters for an account
    pub fn reputation(&self, account: &AccountId) -> gigmesh_types::Reputation {
        self.reputation.get(account)
    }

    fn bad_transition(&self, job: &Job, to: JobStatus) -> GigMeshError {
        GigMeshError::InvalidTransition {
            job_id: job.id.to_string(),
            from: job.status.to_string(),
            to: to.to_string(),
        }
    }
}
