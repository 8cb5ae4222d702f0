//! Evidence collaborator boundary
//!
//! The verifier never talks to storage providers directly. An
//! [`EvidenceSource`] fetches deliverable bytes and surfaces whatever
//! location metadata the evidence carries; how that metadata is extracted is
//! the collaborator's business.

use chrono::{DateTime, Utc};
use gigmesh_types::{GigMeshError, Result};
use serde::{Deserialize, Serialize};

/// Location and capture-time metadata attached to photo evidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhotoEvidence {
    pub lat: f64,
    pub lng: f64,
    pub captured_at: DateTime<Utc>,
}

/// Supplies deliverable bytes and photo metadata on demand
#[async_trait::async_trait]
pub trait EvidenceSource: Send + Sync {
    /// Download the deliverable at `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;

    /// Fetch photo evidence and surface its metadata
    ///
    /// `Ok(None)` means the evidence exists but carries no usable location
    /// metadata; an `Err` means the evidence could not be obtained at all.
    /// The default implementation fetches an evidence document and decodes
    /// it as JSON.
    async fn photo_evidence(&self, url: &str) -> Result<Option<PhotoEvidence>> {
        let bytes = self.fetch(url).await?;
        Ok(serde_json::from_slice::<PhotoEvidence>(&bytes).ok())
    }
}

/// Evidence source backed by plain HTTP GET
pub struct HttpEvidenceSource {
    client: reqwest::Client,
}

impl HttpEvidenceSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpEvidenceSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl EvidenceSource for HttpEvidenceSource {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GigMeshError::internal(format!("fetch {}: {}", url, e)))?;
        let response = response
            .error_for_status()
            .map_err(|e| GigMeshError::internal(format!("fetch {}: {}", url, e)))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GigMeshError::internal(format!("read {}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedSource(Vec<u8>);

    #[async_trait::async_trait]
    impl EvidenceSource for CannedSource {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn default_photo_evidence_decodes_json() {
        let doc = br#"{"lat":37.0,"lng":-122.0,"captured_at":"2026-01-15T12:00:00Z"}"#;
        let source = CannedSource(doc.to_vec());
        let evidence = source.photo_evidence("x").await.unwrap().unwrap();
        assert_eq!(evidence.lat, 37.0);
        assert_eq!(evidence.lng, -122.0);
    }

    #[tokio::test]
    async fn unparseable_evidence_is_missing_metadata() {
        let source = CannedSource(b"\xff\xd8\xff\xe0 not json".to_vec());
        let evidence = source.photo_evidence("x").await.unwrap();
        assert!(evidence.is_none());
    }
}
