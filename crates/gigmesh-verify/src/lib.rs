//! GigMesh Verify - advisory proof verification
//!
//! The verifier inspects a submitted [`ProofPayload`] against the job's
//! declared requirements and produces a [`Verdict`]. Verdicts are advisory:
//! a failed check is recorded on the job but never blocks the poster's
//! manual approval.
//!
//! A payload whose variant does not match the job's declared proof type is
//! an error, not a failing verdict, so callers can distinguish "checked and
//! failed" from "could not check".

pub mod evidence;
pub mod geo;

pub use evidence::{EvidenceSource, HttpEvidenceSource, PhotoEvidence};
pub use geo::{haversine_distance_m, EARTH_RADIUS_M};

use gigmesh_types::{GigMeshError, Job, PhotoAudit, ProofPayload, Result, Verdict};
use std::sync::Arc;
use tracing::debug;

/// Coverage percentage required of code proofs unless the job overrides it
pub const DEFAULT_MIN_COVERAGE: u8 = 80;

/// Highest plagiarism score a content proof may carry
pub const MAX_PLAGIARISM_SCORE: u8 = 15;

/// Lowest quality score (0-10) a content proof must reach
pub const MIN_QUALITY_SCORE: u8 = 7;

/// Geofence radius applied when a job's geofence does not carry one
pub const DEFAULT_GEOFENCE_RADIUS_M: f64 = 100.0;

/// Checks submitted proofs against job requirements
pub struct Verifier {
    evidence: Arc<dyn EvidenceSource>,
}

impl Verifier {
    pub fn new(evidence: Arc<dyn EvidenceSource>) -> Self {
        Self { evidence }
    }

    /// Verify a submitted payload against the job's declared proof type
    ///
    /// On a successful photo check the extracted metadata is recorded on the
    /// job as a [`PhotoAudit`]; the caller persists the job afterwards.
    pub async fn verify(&self, job: &mut Job, payload: &ProofPayload) -> Result<Verdict> {
        if payload.proof_type() != job.proof_type {
            return Err(GigMeshError::VerificationFailed {
                job_id: job.id.to_string(),
                reason: format!(
                    "payload is {} but job requires {} proof",
                    payload.proof_type(),
                    job.proof_type
                ),
            });
        }

        let verdict = match payload {
            ProofPayload::Manual => Verdict::fail("manual review required"),
            ProofPayload::Code { passed, coverage } => {
                self.check_code(job, *passed, *coverage)
            }
            ProofPayload::Content {
                plagiarism_score,
                quality_score,
            } => self.check_content(*plagiarism_score, *quality_score),
            ProofPayload::Photo { deliverable_url } => {
                self.check_photo(job, deliverable_url).await?
            }
        };

        debug!(
            job_id = %job.id,
            passed = verdict.passed,
            reason = verdict.reason.as_deref().unwrap_or(""),
            "proof verified"
        );
        Ok(verdict)
    }

    fn check_code(&self, job: &Job, passed: bool, coverage: u8) -> Verdict {
        if !passed {
            return Verdict::fail("test suite did not pass");
        }
        let min_coverage = job.min_coverage.unwrap_or(DEFAULT_MIN_COVERAGE);
        if coverage < min_coverage {
            return Verdict::fail(format!(
                "coverage {} below minimum {}",
                coverage, min_coverage
            ));
        }
        Verdict::pass()
    }

    fn check_content(&self, plagiarism_score: u8, quality_score: u8) -> Verdict {
        if plagiarism_score > MAX_PLAGIARISM_SCORE {
            return Verdict::fail(format!(
                "plagiarism score {} above maximum {}",
                plagiarism_score, MAX_PLAGIARISM_SCORE
            ));
        }
        if quality_score < MIN_QUALITY_SCORE {
            return Verdict::fail(format!(
                "quality score {} below minimum {}",
                quality_score, MIN_QUALITY_SCORE
            ));
        }
        Verdict::pass()
    }

    async fn check_photo(&self, job: &mut Job, deliverable_url: &str) -> Result<Verdict> {
        let geofence = job.geofence.ok_or_else(|| GigMeshError::VerificationFailed {
            job_id: job.id.to_string(),
            reason: "photo-proof job has no geofence".to_string(),
        })?;

        let evidence = self
            .evidence
            .photo_evidence(deliverable_url)
            .await
            .map_err(|e| GigMeshError::VerificationFailed {
                job_id: job.id.to_string(),
                reason: format!("evidence unavailable: {}", e),
            })?;

        let Some(evidence) = evidence else {
            return Ok(Verdict::fail("photo carries no location metadata"));
        };

        let radius = if geofence.radius_m > 0.0 {
            geofence.radius_m
        } else {
            DEFAULT_GEOFENCE_RADIUS_M
        };
        let distance =
            haversine_distance_m(geofence.lat, geofence.lng, evidence.lat, evidence.lng);
        if distance > radius {
            return Ok(Verdict::fail(format!(
                "photo taken {:.1} m from site, outside the {:.0} m geofence",
                distance, radius
            )));
        }

        if evidence.captured_at > job.deadline {
            return Ok(Verdict::fail(format!(
                "photo captured at {} after the deadline {}",
                evidence.captured_at, job.deadline
            )));
        }

        job.photo_audit = Some(PhotoAudit {
            lat: evidence.lat,
            lng: evidence.lng,
            captured_at: evidence.captured_at,
            distance_m: distance,
        });
        Ok(Verdict::pass())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use gigmesh_types::{AccountId, Amount, Geofence, JobCategory, ProofType, Result};

    struct StaticEvidence(Option<PhotoEvidence>);

    #[async_trait::async_trait]
    impl EvidenceSource for StaticEvidence {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }

        async fn photo_evidence(&self, _url: &str) -> Result<Option<PhotoEvidence>> {
            Ok(self.0)
        }
    }

    struct FailingEvidence;

    #[async_trait::async_trait]
    impl EvidenceSource for FailingEvidence {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            Err(GigMeshError::internal(format!("unreachable: {}", url)))
        }
    }

    fn job_with(proof_type: ProofType) -> Job {
        Job::new(
            AccountId::new(),
            "test job",
            "test",
            Amount::from_units(100),
            Utc::now() + Duration::days(7),
            JobCategory::Development,
            proof_type,
        )
    }

    fn verifier(evidence: impl EvidenceSource + 'static) -> Verifier {
        Verifier::new(Arc::new(evidence))
    }

    #[tokio::test]
    async fn manual_proof_always_needs_review() {
        let v = verifier(StaticEvidence(None));
        let mut job = job_with(ProofType::Manual);
        let verdict = v.verify(&mut job, &ProofPayload::Manual).await.unwrap();
        assert!(!verdict.passed);
        assert_eq!(verdict.reason.as_deref(), Some("manual review required"));
    }

    #[tokio::test]
    async fn mismatched_payload_is_an_error_not_a_verdict() {
        let v = verifier(StaticEvidence(None));
        let mut job = job_with(ProofType::Code);
        let err = v.verify(&mut job, &ProofPayload::Manual).await.unwrap_err();
        assert_eq!(err.error_code(), "VERIFICATION_FAILED");
    }

    #[tokio::test]
    async fn code_coverage_below_default_minimum_fails() {
        let v = verifier(StaticEvidence(None));
        let mut job = job_with(ProofType::Code);
        let verdict = v
            .verify(
                &mut job,
                &ProofPayload::Code {
                    passed: true,
                    coverage: 75,
                },
            )
            .await
            .unwrap();
        assert!(!verdict.passed);
        assert!(verdict.reason.unwrap().contains("75"));
    }

    #[tokio::test]
    async fn code_coverage_at_minimum_passes() {
        let v = verifier(StaticEvidence(None));
        let mut job = job_with(ProofType::Code);
        let verdict = v
            .verify(
                &mut job,
                &ProofPayload::Code {
                    passed: true,
                    coverage: 80,
                },
            )
            .await
            .unwrap();
        assert!(verdict.passed);
    }

    #[tokio::test]
    async fn job_specific_coverage_overrides_default() {
        let v = verifier(StaticEvidence(None));
        let mut job = job_with(ProofType::Code).with_min_coverage(90);
        let verdict = v
            .verify(
                &mut job,
                &ProofPayload::Code {
                    passed: true,
                    coverage: 85,
                },
            )
            .await
            .unwrap();
        assert!(!verdict.passed);
    }

    #[tokio::test]
    async fn failing_suite_fails_regardless_of_coverage() {
        let v = verifier(StaticEvidence(None));
        let mut job = job_with(ProofType::Code);
        let verdict = v
            .verify(
                &mut job,
                &ProofPayload::Code {
                    passed: false,
                    coverage: 100,
                },
            )
            .await
            .unwrap();
        assert!(!verdict.passed);
    }

    #[tokio::test]
    async fn content_boundaries() {
        let v = verifier(StaticEvidence(None));
        let mut job = job_with(ProofType::Content);

        let at_limits = v
            .verify(
                &mut job,
                &ProofPayload::Content {
                    plagiarism_score: 15,
                    quality_score: 7,
                },
            )
            .await
            .unwrap();
        assert!(at_limits.passed);

        let too_similar = v
            .verify(
                &mut job,
                &ProofPayload::Content {
                    plagiarism_score: 16,
                    quality_score: 10,
                },
            )
            .await
            .unwrap();
        assert!(!too_similar.passed);

        let too_rough = v
            .verify(
                &mut job,
                &ProofPayload::Content {
                    plagiarism_score: 0,
                    quality_score: 6,
                },
            )
            .await
            .unwrap();
        assert!(!too_rough.passed);
    }

    fn photo_job(geofence: Geofence) -> Job {
        job_with(ProofType::Photo).with_geofence(geofence)
    }

    fn photo_payload() -> ProofPayload {
        ProofPayload::Photo {
            deliverable_url: "https://cdn.example/evidence.json".to_string(),
        }
    }

    #[tokio::test]
    async fn photo_inside_geofence_passes_and_records_audit() {
        let captured_at = Utc::now();
        let v = verifier(StaticEvidence(Some(PhotoEvidence {
            lat: 37.7749,
            lng: -122.4194,
            captured_at,
        })));
        let mut job = photo_job(Geofence {
            lat: 37.7749,
            lng: -122.4194,
            radius_m: 100.0,
        });

        let verdict = v.verify(&mut job, &photo_payload()).await.unwrap();
        assert!(verdict.passed);
        let audit = job.photo_audit.unwrap();
        assert_eq!(audit.captured_at, captured_at);
        assert!(audit.distance_m < 1e-6);
    }

    #[tokio::test]
    async fn photo_at_exact_radius_passes() {
        // Roughly 111 m north of the geofence center
        let center = (37.0, -122.0);
        let point = (37.001, -122.0);
        let distance = haversine_distance_m(center.0, center.1, point.0, point.1);

        let v = verifier(StaticEvidence(Some(PhotoEvidence {
            lat: point.0,
            lng: point.1,
            captured_at: Utc::now(),
        })));
        let mut job = photo_job(Geofence {
            lat: center.0,
            lng: center.1,
            radius_m: distance,
        });

        let verdict = v.verify(&mut job, &photo_payload()).await.unwrap();
        assert!(verdict.passed);
    }

    #[tokio::test]
    async fn photo_outside_geofence_fails() {
        let v = verifier(StaticEvidence(Some(PhotoEvidence {
            lat: 37.01,
            lng: -122.0,
            captured_at: Utc::now(),
        })));
        let mut job = photo_job(Geofence {
            lat: 37.0,
            lng: -122.0,
            radius_m: 100.0,
        });

        let verdict = v.verify(&mut job, &photo_payload()).await.unwrap();
        assert!(!verdict.passed);
        assert!(job.photo_audit.is_none());
    }

    #[tokio::test]
    async fn photo_captured_at_deadline_passes_after_fails() {
        let mut job = photo_job(Geofence {
            lat: 37.0,
            lng: -122.0,
            radius_m: 100.0,
        });
        let deadline = job.deadline;

        let at_deadline = verifier(StaticEvidence(Some(PhotoEvidence {
            lat: 37.0,
            lng: -122.0,
            captured_at: deadline,
        })));
        let verdict = at_deadline.verify(&mut job, &photo_payload()).await.unwrap();
        assert!(verdict.passed);

        let mut late_job = photo_job(Geofence {
            lat: 37.0,
            lng: -122.0,
            radius_m: 100.0,
        });
        let late = verifier(StaticEvidence(Some(PhotoEvidence {
            lat: 37.0,
            lng: -122.0,
            captured_at: late_job.deadline + Duration::seconds(1),
        })));
        let verdict = late.verify(&mut late_job, &photo_payload()).await.unwrap();
        assert!(!verdict.passed);
    }

    #[tokio::test]
    async fn photo_without_metadata_fails() {
        let v = verifier(StaticEvidence(None));
        let mut job = photo_job(Geofence {
            lat: 37.0,
            lng: -122.0,
            radius_m: 100.0,
        });
        let verdict = v.verify(&mut job, &photo_payload()).await.unwrap();
        assert!(!verdict.passed);
    }

    #[tokio::test]
    async fn unreachable_evidence_is_an_error() {
        let v = verifier(FailingEvidence);
        let mut job = photo_job(Geofence {
            lat: 37.0,
            lng: -122.0,
            radius_m: 100.0,
        });
        let err = v.verify(&mut job, &photo_payload()).await.unwrap_err();
        assert_eq!(err.error_code(), "VERIFICATION_FAILED");
    }
}
