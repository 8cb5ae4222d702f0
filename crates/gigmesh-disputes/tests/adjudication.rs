//! Commit-reveal adjudication tests over the full settlement wiring.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use gigmesh_disputes::{vote_commitment, DisputeCoordinator};
use gigmesh_escrow::{EscrowConfig, EscrowLedger, LedgerMover};
use gigmesh_events::Outbox;
use gigmesh_jobs::JobService;
use gigmesh_store::MemoryStore;
use gigmesh_types::{
    AccountId, Amount, Dispute, DisputeStatus, DisputeVerdict, GigMeshError, Job, JobCategory,
    JobId, JobStatus, JurorId, OracleId, ProofType, Result, StakeStatus,
};
use gigmesh_verify::{EvidenceSource, Verifier};
use std::sync::Arc;

struct NoEvidence;

#[async_trait]
impl EvidenceSource for NoEvidence {
    async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
        Err(GigMeshError::internal("no evidence configured"))
    }
}

struct World {
    service: Arc<JobService>,
    coordinator: DisputeCoordinator,
    mover: Arc<LedgerMover>,
    config: EscrowConfig,
}

fn world() -> World {
    let store = Arc::new(MemoryStore::new());
    let mover = Arc::new(LedgerMover::new());
    let outbox = Arc::new(Outbox::new());
    let config = EscrowConfig {
        treasury: AccountId::new(),
        juror_pool: AccountId::new(),
    };
    let ledger = Arc::new(EscrowLedger::new(
        store.clone(),
        mover.clone(),
        outbox.clone(),
        config,
    ));
    let verifier = Arc::new(Verifier::new(Arc::new(NoEvidence)));
    let service = Arc::new(JobService::new(store.clone(), ledger, verifier, outbox));
    let coordinator = DisputeCoordinator::new(store, service.clone());
    World {
        service,
        coordinator,
        mover,
        config,
    }
}

fn panel(n: usize) -> Vec<JurorId> {
    (0..n).map(|_| JurorId::new()).collect()
}

async fn disputed(
    w: &World,
    jurors: Vec<JurorId>,
    reveal_deadline: DateTime<Utc>,
) -> (JobId, AccountId, AccountId, Dispute) {
    let poster = AccountId::new();
    let worker = AccountId::new();
    let job = Job::new(
        poster,
        "Label 500 images",
        "Bounding boxes for the traffic dataset",
        Amount::from_units(100),
        Utc::now() + Duration::days(7),
        JobCategory::Research,
        ProofType::Manual,
    );
    let job = w
        .service
        .create(job, vec![OracleId::new()], 1)
        .await
        .unwrap();
    w.service.accept(job.id, worker).await.unwrap();
    let dispute = w
        .coordinator
        .open_dispute(job.id, poster, jurors, Amount::from_units(10), reveal_deadline)
        .await
        .unwrap();
    (job.id, poster, worker, dispute)
}

#[tokio::test]
async fn majority_release_pays_worker_and_forfeits_the_silent_juror() {
    let w = world();
    let jurors = panel(3);
    let deadline = Utc::now() + Duration::days(1);
    let (job_id, _, worker, dispute) = disputed(&w, jurors.clone(), deadline).await;
    assert_eq!(dispute.quorum, 2);

    for (i, juror) in jurors.iter().enumerate() {
        let salt = format!("salt-{}", i);
        w.coordinator
            .commit_vote(dispute.id, *juror, vote_commitment(true, &salt))
            .await
            .unwrap();
    }
    w.coordinator.begin_reveal(dispute.id).await.unwrap();
    w.coordinator
        .reveal_vote(dispute.id, jurors[0], true, "salt-0")
        .await
        .unwrap();
    w.coordinator
        .reveal_vote(dispute.id, jurors[1], true, "salt-1")
        .await
        .unwrap();
    // jurors[2] never reveals

    let dispute = w.coordinator.resolve(dispute.id).await.unwrap();
    assert_eq!(dispute.status, DisputeStatus::Resolved);
    assert_eq!(dispute.verdict, Some(DisputeVerdict::ReleaseToWorker));
    assert!(dispute.resolved_at.is_some());

    assert_eq!(
        w.service.get(job_id).await.unwrap().status,
        JobStatus::Completed
    );
    assert_eq!(w.mover.balance(&worker), Amount::from_units(95));

    assert_eq!(
        dispute.ballot(&jurors[0]).unwrap().stake_status,
        StakeStatus::Returned
    );
    assert_eq!(
        dispute.ballot(&jurors[1]).unwrap().stake_status,
        StakeStatus::Returned
    );
    assert_eq!(
        dispute.ballot(&jurors[2]).unwrap().stake_status,
        StakeStatus::Forfeited
    );
}

#[tokio::test]
async fn majority_refund_returns_funds_with_juror_allocation() {
    let w = world();
    let jurors = panel(3);
    let (job_id, poster, worker, dispute) =
        disputed(&w, jurors.clone(), Utc::now() + Duration::days(1)).await;

    let votes = [false, false, true];
    for (i, juror) in jurors.iter().enumerate() {
        let salt = format!("salt-{}", i);
        w.coordinator
            .commit_vote(dispute.id, *juror, vote_commitment(votes[i], &salt))
            .await
            .unwrap();
    }
    w.coordinator.begin_reveal(dispute.id).await.unwrap();
    for (i, juror) in jurors.iter().enumerate() {
        w.coordinator
            .reveal_vote(dispute.id, *juror, votes[i], &format!("salt-{}", i))
            .await
            .unwrap();
    }

    let dispute = w.coordinator.resolve(dispute.id).await.unwrap();
    assert_eq!(dispute.verdict, Some(DisputeVerdict::RefundToPoster));
    assert_eq!(
        w.service.get(job_id).await.unwrap().status,
        JobStatus::Refunded
    );
    assert_eq!(w.mover.balance(&poster), Amount::from_units(99));
    assert_eq!(w.mover.balance(&w.config.juror_pool), Amount::from_units(1));
    assert_eq!(w.mover.balance(&worker), Amount::zero());
}

#[tokio::test]
async fn tie_favors_the_poster() {
    let w = world();
    let jurors = panel(2);
    let (job_id, _, _, dispute) =
        disputed(&w, jurors.clone(), Utc::now() + Duration::days(1)).await;
    assert_eq!(dispute.quorum, 2);

    w.coordinator
        .commit_vote(dispute.id, jurors[0], vote_commitment(true, "a"))
        .await
        .unwrap();
    w.coordinator
        .commit_vote(dispute.id, jurors[1], vote_commitment(false, "b"))
        .await
        .unwrap();
    w.coordinator.begin_reveal(dispute.id).await.unwrap();
    w.coordinator
        .reveal_vote(dispute.id, jurors[0], true, "a")
        .await
        .unwrap();
    w.coordinator
        .reveal_vote(dispute.id, jurors[1], false, "b")
        .await
        .unwrap();

    let dispute = w.coordinator.resolve(dispute.id).await.unwrap();
    assert_eq!(dispute.verdict, Some(DisputeVerdict::RefundToPoster));
    assert_eq!(
        w.service.get(job_id).await.unwrap().status,
        JobStatus::Refunded
    );
}

#[tokio::test]
async fn mismatched_reveal_forfeits_the_stake() {
    let w = world();
    let jurors = panel(1);
    let (_, _, _, dispute) =
        disputed(&w, jurors.clone(), Utc::now() + Duration::days(1)).await;

    w.coordinator
        .commit_vote(dispute.id, jurors[0], vote_commitment(true, "honest-salt"))
        .await
        .unwrap();
    w.coordinator.begin_reveal(dispute.id).await.unwrap();

    let err = w
        .coordinator
        .reveal_vote(dispute.id, jurors[0], true, "wrong-salt")
        .await
        .unwrap_err();
    assert!(matches!(err, GigMeshError::CommitmentMismatch { .. }));

    // The forfeiture is persisted and the ballot stays unrevealed
    let dispute = w.coordinator.get(dispute.id).await.unwrap();
    assert_eq!(
        dispute.ballot(&jurors[0]).unwrap().stake_status,
        StakeStatus::Forfeited
    );
    assert!(dispute.ballot(&jurors[0]).unwrap().revealed.is_none());

    // No second chance with the right salt
    let err = w
        .coordinator
        .reveal_vote(dispute.id, jurors[0], true, "honest-salt")
        .await
        .unwrap_err();
    assert!(matches!(err, GigMeshError::InvalidInput { .. }));
}

#[tokio::test]
async fn expiry_without_quorum_refunds_the_poster() {
    let w = world();
    let jurors = panel(3);
    let deadline = Utc::now() + Duration::milliseconds(500);
    let (job_id, poster, _, dispute) = disputed(&w, jurors.clone(), deadline).await;

    for (i, juror) in jurors.iter().enumerate() {
        w.coordinator
            .commit_vote(dispute.id, *juror, vote_commitment(true, &format!("s{}", i)))
            .await
            .unwrap();
    }
    w.coordinator.begin_reveal(dispute.id).await.unwrap();
    w.coordinator
        .reveal_vote(dispute.id, jurors[0], true, "s0")
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(700)).await;

    // Late reveals bounce off the closed window
    let err = w
        .coordinator
        .reveal_vote(dispute.id, jurors[1], true, "s1")
        .await
        .unwrap_err();
    assert!(matches!(err, GigMeshError::InvalidInput { .. }));

    // Tally resolution is off the table without quorum
    let err = w.coordinator.resolve(dispute.id).await.unwrap_err();
    assert!(matches!(err, GigMeshError::ThresholdNotMet { .. }));

    let dispute = w.coordinator.resolve_expired(dispute.id).await.unwrap();
    assert_eq!(dispute.verdict, Some(DisputeVerdict::RefundToPoster));
    assert_eq!(
        w.service.get(job_id).await.unwrap().status,
        JobStatus::Refunded
    );
    assert_eq!(w.mover.balance(&poster), Amount::from_units(99));

    assert_eq!(
        dispute.ballot(&jurors[0]).unwrap().stake_status,
        StakeStatus::Returned
    );
    assert_eq!(
        dispute.ballot(&jurors[1]).unwrap().stake_status,
        StakeStatus::Forfeited
    );
    assert_eq!(
        dispute.ballot(&jurors[2]).unwrap().stake_status,
        StakeStatus::Forfeited
    );
}

#[tokio::test]
async fn phases_are_enforced() {
    let w = world();
    let jurors = panel(3);
    let (_, _, _, dispute) =
        disputed(&w, jurors.clone(), Utc::now() + Duration::days(1)).await;

    // Outsiders cannot vote
    let err = w
        .coordinator
        .commit_vote(dispute.id, JurorId::new(), "feedface")
        .await
        .unwrap_err();
    assert!(matches!(err, GigMeshError::UnknownJuror { .. }));

    // Reveals wait for the commit phase to close
    let err = w
        .coordinator
        .reveal_vote(dispute.id, jurors[0], true, "s0")
        .await
        .unwrap_err();
    assert!(matches!(err, GigMeshError::InvalidTransition { .. }));

    w.coordinator
        .commit_vote(dispute.id, jurors[0], vote_commitment(true, "s0"))
        .await
        .unwrap();
    let err = w
        .coordinator
        .commit_vote(dispute.id, jurors[0], vote_commitment(false, "s0"))
        .await
        .unwrap_err();
    assert!(matches!(err, GigMeshError::InvalidInput { .. }));

    w.coordinator.begin_reveal(dispute.id).await.unwrap();

    // Commit phase is over
    let err = w
        .coordinator
        .commit_vote(dispute.id, jurors[1], vote_commitment(true, "s1"))
        .await
        .unwrap_err();
    assert!(matches!(err, GigMeshError::InvalidTransition { .. }));

    // One reveal per juror
    w.coordinator
        .reveal_vote(dispute.id, jurors[0], true, "s0")
        .await
        .unwrap();
    let err = w
        .coordinator
        .reveal_vote(dispute.id, jurors[0], true, "s0")
        .await
        .unwrap_err();
    assert!(matches!(err, GigMeshError::InvalidInput { .. }));

    // Quorum is 2, one reveal is not enough
    let err = w.coordinator.resolve(dispute.id).await.unwrap_err();
    assert!(matches!(
        err,
        GigMeshError::ThresholdNotMet {
            approvals: 1,
            threshold: 2,
            ..
        }
    ));
}

#[tokio::test]
async fn resolved_disputes_are_closed_for_good() {
    let w = world();
    let jurors = panel(1);
    let (_, _, _, dispute) =
        disputed(&w, jurors.clone(), Utc::now() + Duration::days(1)).await;

    w.coordinator
        .commit_vote(dispute.id, jurors[0], vote_commitment(false, "s"))
        .await
        .unwrap();
    w.coordinator.begin_reveal(dispute.id).await.unwrap();
    w.coordinator
        .reveal_vote(dispute.id, jurors[0], false, "s")
        .await
        .unwrap();
    w.coordinator.resolve(dispute.id).await.unwrap();

    let err = w.coordinator.resolve(dispute.id).await.unwrap_err();
    assert!(matches!(err, GigMeshError::InvalidTransition { .. }));
    let err = w
        .coordinator
        .commit_vote(dispute.id, jurors[0], "deadbeef")
        .await
        .unwrap_err();
    assert!(matches!(err, GigMeshError::InvalidTransition { .. }));
    let err = w
        .coordinator
        .reveal_vote(dispute.id, jurors[0], false, "s")
        .await
        .unwrap_err();
    assert!(matches!(err, GigMeshError::InvalidTransition { .. }));
    let err = w.coordinator.resolve_expired(dispute.id).await.unwrap_err();
    assert!(matches!(err, GigMeshError::InvalidTransition { .. }));
}

#[tokio::test]
async fn only_parties_open_disputes() {
    let w = world();
    let poster = AccountId::new();
    let worker = AccountId::new();
    let job = Job::new(
        poster,
        "Label 500 images",
        "Bounding boxes for the traffic dataset",
        Amount::from_units(100),
        Utc::now() + Duration::days(7),
        JobCategory::Research,
        ProofType::Manual,
    );
    let job = w
        .service
        .create(job, vec![OracleId::new()], 1)
        .await
        .unwrap();

    // Not disputable while still Open
    let err = w
        .coordinator
        .open_dispute(
            job.id,
            poster,
            panel(3),
            Amount::from_units(10),
            Utc::now() + Duration::days(1),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GigMeshError::InvalidTransition { .. }));

    w.service.accept(job.id, worker).await.unwrap();

    let err = w
        .coordinator
        .open_dispute(
            job.id,
            AccountId::new(),
            panel(3),
            Amount::from_units(10),
            Utc::now() + Duration::days(1),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GigMeshError::Unauthorized { .. }));
}
