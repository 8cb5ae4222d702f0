//! Dispute adjudication for GigMesh
//!
//! A disputed job is decided by an empaneled jury voting in two phases:
//! commit a hash of the vote plus a salt, then reveal both. Copying another
//! juror's visible commitment is useless without the salt, and a reveal that
//! does not hash back to the commitment forfeits the juror's stake. The
//! [`DisputeCoordinator`] tallies valid reveals and forwards a single verdict
//! into the job state machine.

pub mod commitment;
pub mod coordinator;

pub use commitment::vote_commitment;
pub use coordinator::DisputeCoordinator;
