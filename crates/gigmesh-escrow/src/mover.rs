//! Funds movement boundary
//!
//! Actual money lives outside the settlement core. A [`FundsMover`] executes
//! a payout and hands back an opaque reference. Implementations MUST be
//! idempotent per job id: calling `transfer` again for a job that already
//! settled returns the original reference without moving funds twice. That
//! contract is what lets the ledger retry after a crash between the transfer
//! and the status flip.

use crate::Split;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use gigmesh_types::{AccountId, Amount, JobId, Result, TransferRef};
use tracing::info;

/// Executes payouts in an external money system
#[async_trait::async_trait]
pub trait FundsMover: Send + Sync {
    /// Move the escrowed funds out along `splits`
    ///
    /// Idempotent per `job_id`.
    async fn transfer(&self, job_id: JobId, splits: &[Split]) -> Result<TransferRef>;
}

/// In-memory mover that tracks account balances
///
/// The reference implementation for tests and the demo; doubles as a worked
/// example of the idempotency contract.
#[derive(Default)]
pub struct LedgerMover {
    balances: DashMap<AccountId, Amount>,
    transfers: DashMap<JobId, TransferRef>,
}

impl LedgerMover {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance of an account, zero if never credited
    pub fn balance(&self, account: &AccountId) -> Amount {
        self.balances
            .get(account)
            .map(|entry| *entry.value())
            .unwrap_or_else(Amount::zero)
    }
}

#[async_trait::async_trait]
impl FundsMover for LedgerMover {
    async fn transfer(&self, job_id: JobId, splits: &[Split]) -> Result<TransferRef> {
        match self.transfers.entry(job_id) {
            Entry::Occupied(existing) => Ok(*existing.get()),
            Entry::Vacant(slot) => {
                for split in splits {
                    let mut balance = self
                        .balances
                        .entry(split.to)
                        .or_insert_with(Amount::zero);
                    *balance = balance.checked_add(split.amount)?;
                }
                let transfer_ref = TransferRef::new();
                info!(job_id = %job_id, transfer_ref = %transfer_ref, "funds moved");
                slot.insert(transfer_ref);
                Ok(transfer_ref)
            }
        }
    }
}
