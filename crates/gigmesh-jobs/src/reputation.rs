//! Per-account activity counters
//!
//! Updated by the job service as jobs are posted and completed. Counters are
//! informational; nothing in settlement reads them back.

use dashmap::DashMap;
use gigmesh_types::{AccountId, Amount, Reputation, Result};

/// In-memory reputation counters, one record per account
#[derive(Default)]
pub struct ReputationBook {
    accounts: DashMap<AccountId, Reputation>,
}

impl ReputationBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of an account's counters, zeroed if never seen
    pub fn get(&self, account: &AccountId) -> Reputation {
        self.accounts
            .get(account)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Count a newly posted job against the poster
    pub fn record_posted(&self, poster: AccountId) {
        self.accounts.entry(poster).or_default().jobs_posted += 1;
    }

    /// Count a completed job: the worker earned the budget, the poster spent it
    pub fn record_completed(
        &self,
        poster: AccountId,
        worker: AccountId,
        budget: Amount,
    ) -> Result<()> {
        {
            let mut record = self.accounts.entry(worker).or_default();
            record.jobs_completed += 1;
            record.total_earned = record.total_earned.checked_add(budget)?;
        }
        {
            let mut record = self.accounts.entry(poster).or_default();
            record.total_spent = record.total_spent.checked_add(budget)?;
        }
        Ok(())
    }
}
