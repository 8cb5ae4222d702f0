//! The escrow ledger
//!
//! Holds one escrow per job and walks it Pending -> Funded -> Released or
//! Refunded, with Disputed as a frozen detour. Execution is gated on the
//! oracle approval threshold and serialized by the store's compare-and-set,
//! and the status flips to a terminal state only after the funds mover
//! confirms, so a payout can happen at most once.

use crate::{
    disputed_refund_split, refund_split, release_split, EscrowConfig, FundsMover, Split,
};
use chrono::Utc;
use gigmesh_events::Outbox;
use gigmesh_store::EscrowStore;
use gigmesh_types::{
    AccountId, Amount, DisputeVerdict, Escrow, EscrowStatus, GigMeshError, JobId, MarketEvent,
    OracleId, Result, TransferRef,
};
use std::sync::Arc;
use tracing::info;

/// Which approval set an operation works on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Release,
    Refund,
}

/// Escrow custody and settlement for the marketplace
pub struct EscrowLedger {
    store: Arc<dyn EscrowStore>,
    mover: Arc<dyn FundsMover>,
    outbox: Arc<Outbox>,
    config: EscrowConfig,
}

impl EscrowLedger {
    pub fn new(
        store: Arc<dyn EscrowStore>,
        mover: Arc<dyn FundsMover>,
        outbox: Arc<Outbox>,
        config: EscrowConfig,
    ) -> Self {
        Self {
            store,
            mover,
            outbox,
            config,
        }
    }

    /// Open a pending escrow for a job
    ///
    /// The oracle set is deduplicated; the threshold must land inside it.
    pub async fn open(
        &self,
        job_id: JobId,
        poster: AccountId,
        amount: Amount,
        oracles: Vec<OracleId>,
        threshold: usize,
    ) -> Result<Escrow> {
        if !amount.is_positive() {
            return Err(GigMeshError::invalid_input(
                "amount",
                "escrow amount must be positive",
            ));
        }
        let escrow = Escrow::new(job_id, poster, amount, oracles, threshold);
        if escrow.oracles.is_empty() {
            return Err(GigMeshError::invalid_input(
                "oracles",
                "escrow needs at least one oracle",
            ));
        }
        if threshold < 1 || threshold > escrow.oracles.len() {
            return Err(GigMeshError::invalid_input(
                "threshold",
                format!(
                    "threshold {} outside 1..={}",
                    threshold,
                    escrow.oracles.len()
                ),
            ));
        }

        self.store.insert(escrow.clone()).await?;
        info!(job_id = %job_id, amount = %amount, "escrow opened");
        Ok(escrow)
    }

    /// Move the job budget into custody and record the payee
    pub async fn fund(&self, job_id: JobId, worker: AccountId) -> Result<Escrow> {
        let stored = self.store.get(&job_id).await?;
        let mut escrow = stored.record;

        match escrow.status {
            EscrowStatus::Pending => {}
            EscrowStatus::Funded | EscrowStatus::Disputed => {
                return Err(GigMeshError::AlreadyFunded {
                    job_id: job_id.to_string(),
                })
            }
            status => {
                return Err(GigMeshError::AlreadyExecuted {
                    job_id: job_id.to_string(),
                    status: status.to_string(),
                })
            }
        }

        escrow.status = EscrowStatus::Funded;
        escrow.worker = Some(worker);
        escrow.funded_at = Some(Utc::now());
        self.store
            .update(&job_id, stored.version, escrow.clone())
            .await?;

        info!(job_id = %job_id, amount = %escrow.amount, "escrow funded");
        self.outbox.push(MarketEvent::EscrowFunded {
            job_id,
            amount: escrow.amount,
            timestamp: Utc::now(),
        });
        Ok(escrow)
    }

    /// Record an oracle's approval to release; repeats are no-ops
    pub async fn approve_release(&self, job_id: JobId, oracle: OracleId) -> Result<Escrow> {
        self.approve(job_id, oracle, Direction::Release).await
    }

    /// Record an oracle's approval to refund; repeats are no-ops
    pub async fn approve_refund(&self, job_id: JobId, oracle: OracleId) -> Result<Escrow> {
        self.approve(job_id, oracle, Direction::Refund).await
    }

    async fn approve(
        &self,
        job_id: JobId,
        oracle: OracleId,
        direction: Direction,
    ) -> Result<Escrow> {
        let stored = self.store.get(&job_id).await?;
        let mut escrow = stored.record;

        self.require_funded(&escrow, direction)?;
        if !escrow.has_oracle(&oracle) {
            return Err(GigMeshError::UnknownOracle {
                job_id: job_id.to_string(),
                oracle_id: oracle.to_string(),
            });
        }

        let recorded = match direction {
            Direction::Release => escrow.approve_release(oracle),
            Direction::Refund => escrow.approve_refund(oracle),
        };
        if !recorded {
            // Already approved; nothing to write
            return Ok(escrow);
        }

        self.store
            .update(&job_id, stored.version, escrow.clone())
            .await?;
        info!(
            job_id = %job_id,
            oracle = %oracle,
            direction = ?direction,
            "oracle approval recorded"
        );
        Ok(escrow)
    }

    /// Pay the worker once the release threshold is met
    ///
    /// Callable by anyone; the approval set is the authorization.
    pub async fn execute_release(&self, job_id: JobId) -> Result<Escrow> {
        let stored = self.store.get(&job_id).await?;
        let escrow = stored.record;

        self.require_funded(&escrow, Direction::Release)?;
        if !escrow.release_threshold_met() {
            return Err(GigMeshError::ThresholdNotMet {
                job_id: job_id.to_string(),
                approvals: escrow.release_approvals.len(),
                threshold: escrow.threshold,
            });
        }
        let worker = escrow
            .worker
            .ok_or_else(|| GigMeshError::internal("funded escrow has no worker"))?;

        let splits = release_split(escrow.amount, worker, &self.config)?;
        self.settle(
            escrow,
            stored.version,
            EscrowStatus::Released,
            &splits,
        )
        .await
    }

    /// Return funds to the poster once the refund threshold is met
    ///
    /// This is the non-disputed path: the poster gets everything back.
    pub async fn execute_refund(&self, job_id: JobId) -> Result<Escrow> {
        let stored = self.store.get(&job_id).await?;
        let escrow = stored.record;

        self.require_funded(&escrow, Direction::Refund)?;
        if !escrow.refund_threshold_met() {
            return Err(GigMeshError::ThresholdNotMet {
                job_id: job_id.to_string(),
                approvals: escrow.refund_approvals.len(),
                threshold: escrow.threshold,
            });
        }

        let splits = refund_split(escrow.amount, escrow.poster);
        self.settle(
            escrow,
            stored.version,
            EscrowStatus::Refunded,
            &splits,
        )
        .await
    }

    /// Freeze the escrow while a dispute is adjudicated
    pub async fn mark_disputed(&self, job_id: JobId) -> Result<Escrow> {
        let stored = self.store.get(&job_id).await?;
        let mut escrow = stored.record;

        if escrow.status.is_terminal() {
            return Err(GigMeshError::AlreadyExecuted {
                job_id: job_id.to_string(),
                status: escrow.status.to_string(),
            });
        }
        if escrow.status != EscrowStatus::Funded {
            return Err(GigMeshError::InvalidTransition {
                job_id: job_id.to_string(),
                from: escrow.status.to_string(),
                to: EscrowStatus::Disputed.to_string(),
            });
        }

        escrow.status = EscrowStatus::Disputed;
        self.store
            .update(&job_id, stored.version, escrow.clone())
            .await?;
        info!(job_id = %job_id, "escrow frozen for dispute");
        Ok(escrow)
    }

    /// Settle a frozen escrow according to a dispute verdict
    ///
    /// A verdict supersedes the oracle threshold. A refund ordered here
    /// carries the juror-pool allocation; only this path does.
    pub async fn resolve_dispute(
        &self,
        job_id: JobId,
        verdict: DisputeVerdict,
    ) -> Result<Escrow> {
        let stored = self.store.get(&job_id).await?;
        let escrow = stored.record;

        if escrow.status.is_terminal() {
            return Err(GigMeshError::AlreadyExecuted {
                job_id: job_id.to_string(),
                status: escrow.status.to_string(),
            });
        }
        if escrow.status != EscrowStatus::Disputed {
            return Err(GigMeshError::InvalidTransition {
                job_id: job_id.to_string(),
                from: escrow.status.to_string(),
                to: "resolved".to_string(),
            });
        }

        let (splits, target) = match verdict {
            DisputeVerdict::ReleaseToWorker => {
                let worker = escrow
                    .worker
                    .ok_or_else(|| GigMeshError::internal("disputed escrow has no worker"))?;
                (
                    release_split(escrow.amount, worker, &self.config)?,
                    EscrowStatus::Released,
                )
            }
            DisputeVerdict::RefundToPoster => (
                disputed_refund_split(escrow.amount, escrow.poster, &self.config)?,
                EscrowStatus::Refunded,
            ),
        };

        self.settle(escrow, stored.version, target, &splits).await
    }

    /// Current escrow record
    pub async fn get(&self, job_id: JobId) -> Result<Escrow> {
        Ok(self.store.get(&job_id).await?.record)
    }

    fn require_funded(&self, escrow: &Escrow, direction: Direction) -> Result<()> {
        match escrow.status {
            EscrowStatus::Funded => Ok(()),
            status if status.is_terminal() => Err(GigMeshError::AlreadyExecuted {
                job_id: escrow.job_id.to_string(),
                status: status.to_string(),
            }),
            status => Err(GigMeshError::InvalidTransition {
                job_id: escrow.job_id.to_string(),
                from: status.to_string(),
                to: match direction {
                    Direction::Release => EscrowStatus::Released.to_string(),
                    Direction::Refund => EscrowStatus::Refunded.to_string(),
                },
            }),
        }
    }

    /// Move funds, then flip the status
    ///
    /// The mover's idempotency makes the retry after a lost compare-and-set
    /// safe: if another executor already settled, the re-read shows a
    /// terminal status and we report `AlreadyExecuted` instead of paying
    /// twice.
    async fn settle(
        &self,
        mut escrow: Escrow,
        version: u64,
        target: EscrowStatus,
        splits: &[Split],
    ) -> Result<Escrow> {
        let job_id = escrow.job_id;
        let transfer_ref = self
            .mover
            .transfer(job_id, splits)
            .await
            .map_err(|e| GigMeshError::TransferFailed {
                job_id: job_id.to_string(),
                reason: e.to_string(),
            })?;

        escrow.status = target;
        escrow.transfer_ref = Some(transfer_ref);
        escrow.executed_at = Some(Utc::now());

        match self.store.update(&job_id, version, escrow.clone()).await {
            Ok(_) => {}
            Err(GigMeshError::VersionConflict { .. }) => {
                let current = self.store.get(&job_id).await?;
                if current.record.status.is_terminal() {
                    return Err(GigMeshError::AlreadyExecuted {
                        job_id: job_id.to_string(),
                        status: current.record.status.to_string(),
                    });
                }
                return Err(GigMeshError::VersionConflict {
                    entity: format!("escrow {}", job_id),
                    expected: version,
                    actual: current.version,
                });
            }
            Err(e) => return Err(e),
        }

        info!(
            job_id = %job_id,
            status = %target,
            amount = %escrow.amount,
            transfer_ref = %transfer_ref,
            "escrow settled"
        );
        self.outbox.push(self.settled_event(&escrow, transfer_ref));
        Ok(escrow)
    }

    fn settled_event(&self, escrow: &Escrow, transfer_ref: TransferRef) -> MarketEvent {
        match escrow.status {
            EscrowStatus::Released => MarketEvent::EscrowReleased {
                job_id: escrow.job_id,
                amount: escrow.amount,
                transfer_ref,
                timestamp: Utc::now(),
            },
            _ => MarketEvent::EscrowRefunded {
                job_id: escrow.job_id,
                amount: escrow.amount,
                transfer_ref,
                timestamp: Utc::now(),
            },
        }
    }
}
