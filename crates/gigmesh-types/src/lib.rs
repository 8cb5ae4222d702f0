//! GigMesh Types - Canonical domain types for marketplace settlement
//!
//! This crate contains all foundational types for GigMesh with zero
//! dependencies on other gigmesh crates:
//!
//! - Identity types (JobId, AccountId, OracleId, etc.)
//! - Fixed-point amounts in 6-decimal settlement base units
//! - Job, escrow, and dispute records with their lifecycle enums
//! - Proof payloads and verification verdicts
//! - Outbound market events
//! - The error taxonomy shared by every service crate
//!
//! # Settlement invariants
//!
//! The types here back the core guarantees of the settlement layer:
//!
//! 1. Funds never move directly between counterparties; every job budget
//!    sits in escrow until release or refund
//! 2. An escrow executes at most once
//! 3. Job status moves only along the published transition table
//! 4. Payout splits always sum exactly to the escrow amount

pub mod amount;
pub mod dispute;
pub mod error;
pub mod escrow;
pub mod event;
pub mod identity;
pub mod job;
pub mod proof;

pub use amount::*;
pub use dispute::*;
pub use error::*;
pub use escrow::*;
pub use event::*;
pub use identity::*;
pub use job::*;
pub use proof::*;
