//! GigMesh demo
//!
//! Wires the whole settlement core together over the in-memory store and
//! walks two jobs end to end: one through the happy path to an oracle
//! release, one through a dispute adjudicated by a three-juror panel.
//!
//! Run with `RUST_LOG=info cargo run -p gigmesh-demo` to watch the
//! state machine narrate itself.

use chrono::{Duration, Utc};
use gigmesh_disputes::{vote_commitment, DisputeCoordinator};
use gigmesh_escrow::{EscrowConfig, EscrowLedger, LedgerMover};
use gigmesh_events::{Dispatcher, MemoryNotifier, Outbox};
use gigmesh_jobs::JobService;
use gigmesh_store::MemoryStore;
use gigmesh_types::{
    AccountId, Amount, Job, JobCategory, JurorId, OracleId, ProofPayload, ProofType,
};
use gigmesh_verify::{HttpEvidenceSource, Verifier};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

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
    let verifier = Arc::new(Verifier::new(Arc::new(HttpEvidenceSource::new())));
    let service = Arc::new(JobService::new(
        store.clone(),
        ledger.clone(),
        verifier,
        outbox.clone(),
    ));
    let coordinator = DisputeCoordinator::new(store, service.clone());

    let notifier = Arc::new(MemoryNotifier::new());
    let dispatcher = Dispatcher::spawn(outbox.clone(), notifier.clone());

    // ---- Happy path: post, accept, submit, approve, release ----

    let poster = AccountId::new();
    let worker = AccountId::new();
    let oracles = vec![OracleId::new(), OracleId::new()];

    let job = Job::new(
        poster,
        "Port the ingest parser to the new schema",
        "Migrate the CSV ingest parser and keep the test suite green",
        Amount::from_units(250),
        Utc::now() + Duration::days(7),
        JobCategory::Development,
        ProofType::Code,
    );
    let job = service.create(job, oracles.clone(), 2).await?;
    info!(job_id = %job.id, "posted: {}", job.title);

    service.accept(job.id, worker).await?;
    let job = service
        .submit(
            job.id,
            worker,
            "https://ci.gigmesh.dev/runs/4821",
            "9f2c41d8",
            &ProofPayload::Code {
                passed: true,
                coverage: 92,
            },
        )
        .await?;
    if let Some(verdict) = &job.verification {
        info!(passed = verdict.passed, "automated check recorded");
    }

    service.approve(job.id, poster).await?;
    for oracle in &oracles {
        ledger.approve_release(job.id, *oracle).await?;
    }
    ledger.execute_release(job.id).await?;
    info!(
        worker = %mover.balance(&worker),
        treasury = %mover.balance(&config.treasury),
        juror_pool = %mover.balance(&config.juror_pool),
        "release settled"
    );

    // ---- Dispute path: contested delivery, jury refunds the poster ----

    let poster = AccountId::new();
    let worker = AccountId::new();
    let job = Job::new(
        poster,
        "Summarize 40 interview transcripts",
        "One-page structured summary per transcript",
        Amount::from_units(100),
        Utc::now() + Duration::days(3),
        JobCategory::Research,
        ProofType::Manual,
    );
    let job = service.create(job, vec![OracleId::new()], 1).await?;
    service.accept(job.id, worker).await?;
    service
        .submit(job.id, worker, "ipfs://bafy...summaries", "77aa01", &ProofPayload::Manual)
        .await?;

    let jurors: Vec<JurorId> = (0..3).map(|_| JurorId::new()).collect();
    let dispute = coordinator
        .open_dispute(
            job.id,
            poster,
            jurors.clone(),
            Amount::from_units(10),
            Utc::now() + Duration::hours(24),
        )
        .await?;

    let votes = [false, false, true];
    for (i, juror) in jurors.iter().enumerate() {
        let salt = format!("demo-salt-{}", i);
        coordinator
            .commit_vote(dispute.id, *juror, vote_commitment(votes[i], &salt))
            .await?;
    }
    coordinator.begin_reveal(dispute.id).await?;
    for (i, juror) in jurors.iter().enumerate() {
        coordinator
            .reveal_vote(dispute.id, *juror, votes[i], &format!("demo-salt-{}", i))
            .await?;
    }
    let dispute = coordinator.resolve(dispute.id).await?;
    info!(
        verdict = ?dispute.verdict,
        poster = %mover.balance(&poster),
        juror_pool = %mover.balance(&config.juror_pool),
        "dispute settled"
    );

    // Let the dispatcher flush, then show what the outside world saw
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    for event in notifier.delivered() {
        info!(event_type = event.event_type(), job_id = %event.job_id(), "delivered");
    }
    dispatcher.abort();
    Ok(())
}
