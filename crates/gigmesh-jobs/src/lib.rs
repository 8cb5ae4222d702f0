//! Job lifecycle for GigMesh
//!
//! A job moves Open -> Locked -> Submitted -> Completed, with Disputed and
//! Refunded as the adversarial exits. [`JobService`] is the only writer of
//! job status and enforces the transition table; everything it decides is
//! committed through the versioned store before any event leaves the
//! process.

pub mod reputation;
pub mod service;

pub use reputation::ReputationBook;
pub use service::JobService;
