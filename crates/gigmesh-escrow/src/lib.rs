//! Escrow custody and settlement for GigMesh
//!
//! Funds for a job are locked here when a worker is hired and leave exactly
//! once, either to the worker on approval or back to the poster on refund.
//! [`ledger`] holds the state machine, [`split`] decides who gets what, and
//! [`mover`] is the boundary to whatever actually moves money.

pub mod ledger;
pub mod mover;
pub mod split;

pub use ledger::EscrowLedger;
pub use mover::{FundsMover, LedgerMover};
pub use split::{
    disputed_refund_split, refund_split, release_split, Split, JUROR_POOL_FEE_BPS,
    TREASURY_FEE_BPS,
};

use gigmesh_types::AccountId;

/// Platform accounts that receive fee legs of a payout
#[derive(Debug, Clone, Copy)]
pub struct EscrowConfig {
    pub treasury: AccountId,
    pub juror_pool: AccountId,
}
