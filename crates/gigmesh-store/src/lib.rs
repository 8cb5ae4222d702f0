//! GigMesh Store - persistence boundary for the settlement core
//!
//! Every mutation in the settlement core is a conditional update against the
//! version last read, so concurrent writers are serialized per record and a
//! stale write surfaces as `VersionConflict` instead of silently clobbering
//! state. Production deployments implement these traits over their database;
//! [`MemoryStore`] is the in-process reference used by tests and the demo.

pub mod memory;

pub use memory::MemoryStore;

use gigmesh_types::{Dispute, DisputeId, Escrow, Job, JobId, Result};

/// A stored record together with the version that guards its next update
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub record: T,
    pub version: u64,
}

/// Persistence for job records
#[async_trait::async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job; the id must not already exist
    async fn insert(&self, job: Job) -> Result<()>;

    /// Fetch a job with its current version
    async fn get(&self, id: &JobId) -> Result<Versioned<Job>>;

    /// Replace the record if the stored version still matches
    ///
    /// Returns the new version. A mismatch returns `VersionConflict` and
    /// leaves the record untouched.
    async fn update(&self, id: &JobId, expected_version: u64, job: Job) -> Result<u64>;

    /// All jobs, in no particular order
    async fn list(&self) -> Result<Vec<Job>>;
}

/// Persistence for escrow records, keyed by the owning job
#[async_trait::async_trait]
pub trait EscrowStore: Send + Sync {
    /// Insert a new escrow; one per job
    async fn insert(&self, escrow: Escrow) -> Result<()>;

    /// Fetch an escrow with its current version
    async fn get(&self, job_id: &JobId) -> Result<Versioned<Escrow>>;

    /// Replace the record if the stored version still matches
    async fn update(&self, job_id: &JobId, expected_version: u64, escrow: Escrow)
        -> Result<u64>;
}

/// Persistence for dispute records
#[async_trait::async_trait]
pub trait DisputeStore: Send + Sync {
    /// Insert a new dispute; the id must not already exist
    async fn insert(&self, dispute: Dispute) -> Result<()>;

    /// Fetch a dispute with its current version
    async fn get(&self, id: &DisputeId) -> Result<Versioned<Dispute>>;

    /// Replace the record if the stored version still matches
    async fn update(
        &self,
        id: &DisputeId,
        expected_version: u64,
        dispute: Dispute,
    ) -> Result<u64>;
}
