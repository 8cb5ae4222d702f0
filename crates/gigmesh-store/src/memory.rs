//! In-memory reference store
//!
//! Backed by `DashMap` so updates to one record hold only that record's shard
//! entry. The version check and the write happen under the same entry guard,
//! which is what makes the compare-and-set atomic.

use crate::{DisputeStore, EscrowStore, JobStore, Versioned};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use gigmesh_types::{Dispute, DisputeId, Escrow, GigMeshError, Job, JobId, Result};

/// In-process store for tests and the demo binary
#[derive(Default)]
pub struct MemoryStore {
    jobs: DashMap<JobId, Versioned<Job>>,
    escrows: DashMap<JobId, Versioned<Escrow>>,
    disputes: DashMap<DisputeId, Versioned<Dispute>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl JobStore for MemoryStore {
    async fn insert(&self, job: Job) -> Result<()> {
        match self.jobs.entry(job.id) {
            Entry::Occupied(_) => Err(GigMeshError::invalid_input(
                "job_id",
                format!("job {} already exists", job.id),
            )),
            Entry::Vacant(slot) => {
                slot.insert(Versioned { record: job, version: 1 });
                Ok(())
            }
        }
    }

    async fn get(&self, id: &JobId) -> Result<Versioned<Job>> {
        self.jobs
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| GigMeshError::JobNotFound {
                job_id: id.to_string(),
            })
    }

    async fn update(&self, id: &JobId, expected_version: u64, job: Job) -> Result<u64> {
        let mut entry = self
            .jobs
            .get_mut(id)
            .ok_or_else(|| GigMeshError::JobNotFound {
                job_id: id.to_string(),
            })?;
        if entry.version != expected_version {
            return Err(GigMeshError::VersionConflict {
                entity: format!("job {}", id),
                expected: expected_version,
                actual: entry.version,
            });
        }
        entry.record = job;
        entry.version += 1;
        Ok(entry.version)
    }

    async fn list(&self) -> Result<Vec<Job>> {
        Ok(self
            .jobs
            .iter()
            .map(|entry| entry.value().record.clone())
            .collect())
    }
}

#[async_trait::async_trait]
impl EscrowStore for MemoryStore {
    async fn insert(&self, escrow: Escrow) -> Result<()> {
        match self.escrows.entry(escrow.job_id) {
            Entry::Occupied(_) => Err(GigMeshError::invalid_input(
                "job_id",
                format!("escrow for job {} already exists", escrow.job_id),
            )),
            Entry::Vacant(slot) => {
                slot.insert(Versioned {
                    record: escrow,
                    version: 1,
                });
                Ok(())
            }
        }
    }

    async fn get(&self, job_id: &JobId) -> Result<Versioned<Escrow>> {
        self.escrows
            .get(job_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| GigMeshError::EscrowNotFound {
                job_id: job_id.to_string(),
            })
    }

    async fn update(
        &self,
        job_id: &JobId,
        expected_version: u64,
        escrow: Escrow,
    ) -> Result<u64> {
        let mut entry =
            self.escrows
                .get_mut(job_id)
                .ok_or_else(|| GigMeshError::EscrowNotFound {
                    job_id: job_id.to_string(),
                })?;
        if entry.version != expected_version {
            return Err(GigMeshError::VersionConflict {
                entity: format!("escrow {}", job_id),
                expected: expected_version,
                actual: entry.version,
            });
        }
        entry.record = escrow;
        entry.version += 1;
        Ok(entry.version)
    }
}

#[async_trait::async_trait]
impl DisputeStore for MemoryStore {
    async fn insert(&self, dispute: Dispute) -> Result<()> {
        match self.disputes.entry(dispute.id) {
            Entry::Occupied(_) => Err(GigMeshError::invalid_input(
                "dispute_id",
                format!("dispute {} already exists", dispute.id),
            )),
            Entry::Vacant(slot) => {
                slot.insert(Versioned {
                    record: dispute,
                    version: 1,
                });
                Ok(())
            }
        }
    }

    async fn get(&self, id: &DisputeId) -> Result<Versioned<Dispute>> {
        self.disputes
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| GigMeshError::DisputeNotFound {
                dispute_id: id.to_string(),
            })
    }

    async fn update(
        &self,
        id: &DisputeId,
        expected_version: u64,
        dispute: Dispute,
    ) -> Result<u64> {
        let mut entry =
            self.disputes
                .get_mut(id)
                .ok_or_else(|| GigMeshError::DisputeNotFound {
                    dispute_id: id.to_string(),
                })?;
        if entry.version != expected_version {
            return Err(GigMeshError::VersionConflict {
                entity: format!("dispute {}", id),
                expected: expected_version,
                actual: entry.version,
            });
        }
        entry.record = dispute;
        entry.version += 1;
        Ok(entry.version)
    }
}
