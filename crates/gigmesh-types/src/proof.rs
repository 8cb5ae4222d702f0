//! Proof-of-work-done types
//!
//! A job declares the kind of proof its deliverable carries; the submitted
//! payload is a tagged union checked by the verifier against that declaration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of proof a job expects on submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofType {
    /// No automated check; the poster reviews by hand
    Manual,
    /// Test-run result with coverage percentage
    Code,
    /// Text deliverable scored for plagiarism and quality
    Content,
    /// Geotagged photo of completed physical work
    Photo,
}

impl fmt::Display for ProofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Manual => "manual",
            Self::Code => "code",
            Self::Content => "content",
            Self::Photo => "photo",
        };
        write!(f, "{}", s)
    }
}

/// Submitted proof payload, one variant per [`ProofType`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProofPayload {
    /// Nothing to check automatically
    Manual,
    /// Test-suite outcome reported by the worker's CI run
    Code {
        /// Whether the suite passed
        passed: bool,
        /// Line coverage percentage, 0-100
        coverage: u8,
    },
    /// Scores produced by the content-analysis collaborator
    Content {
        /// Similarity to known sources, 0-100
        plagiarism_score: u8,
        /// Editorial quality, 0-10
        quality_score: u8,
    },
    /// Photo evidence, fetched and inspected through the evidence source
    Photo {
        /// Where the photo bytes live
        deliverable_url: String,
    },
}

impl ProofPayload {
    /// The proof type this payload satisfies
    pub fn proof_type(&self) -> ProofType {
        match self {
            Self::Manual => ProofType::Manual,
            Self::Code { .. } => ProofType::Code,
            Self::Content { .. } => ProofType::Content,
            Self::Photo { .. } => ProofType::Photo,
        }
    }
}

/// Outcome of an advisory verification pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the automated check passed
    pub passed: bool,
    /// Human-readable reason when the check failed
    pub reason: Option<String>,
}

impl Verdict {
    /// A passing verdict
    pub fn pass() -> Self {
        Self {
            passed: true,
            reason: None,
        }
    }

    /// A failing verdict with a reason
    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Circular geofence a photo proof must fall inside
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geofence {
    /// Center latitude in degrees
    pub lat: f64,
    /// Center longitude in degrees
    pub lng: f64,
    /// Radius in meters
    pub radius_m: f64,
}

/// Metadata extracted from a verified photo, persisted on the job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoAudit {
    /// Latitude from the photo's GPS tag
    pub lat: f64,
    /// Longitude from the photo's GPS tag
    pub lng: f64,
    /// Capture timestamp from the photo metadata
    pub captured_at: DateTime<Utc>,
    /// Haversine distance from the geofence center in meters
    pub distance_m: f64,
}
