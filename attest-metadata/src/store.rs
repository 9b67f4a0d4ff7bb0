//! Shared, atomically replaced metadata snapshot.
//!
//! Readers clone the current `Arc` and keep using it for the whole
//! verification, so a concurrent `publish` never exposes a half-updated
//! BLOB. Fetching and signature-checking the BLOB happen elsewhere.

use std::sync::{Arc, RwLock};

use uuid::Uuid;

use crate::error::{MetadataError, Result};
use crate::payload::MetadataBLOBPayload;
use crate::status_report::StatusReport;

#[derive(Debug, Default)]
pub struct MetadataTrustStore {
    current: RwLock<Option<Arc<MetadataBLOBPayload>>>,
}

impl MetadataTrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current snapshot. The payload sequence number must grow.
    pub fn publish(&self, payload: MetadataBLOBPayload) -> Result<Arc<MetadataBLOBPayload>> {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(existing) = current.as_ref() {
            if payload.no() <= existing.no() {
                return Err(MetadataError::StaleSnapshot {
                    current: existing.no(),
                    offered: payload.no(),
                });
            }
        }

        let payload = Arc::new(payload);
        *current = Some(Arc::clone(&payload));

        tracing::info!(
            no = payload.no(),
            next_update = %payload.next_update(),
            entries = payload.entries().len(),
            "Published metadata snapshot"
        );
        Ok(payload)
    }

    pub fn snapshot(&self) -> Option<Arc<MetadataBLOBPayload>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Attestation roots (PEM) declared by the model's metadata statement.
    /// Empty when the model is unknown or carries no statement. The BLOB
    /// signing roots are never attestation anchors.
    pub fn trust_anchors_for_aaguid(&self, aaguid: &Uuid) -> Result<Vec<String>> {
        let Some(snapshot) = self.snapshot() else {
            return Ok(Vec::new());
        };
        let Some(entry) = snapshot.find_by_aaguid(aaguid) else {
            return Ok(Vec::new());
        };

        match entry.metadata_statement() {
            Some(statement) => statement.attestation_root_certificates_pem(),
            None => Ok(Vec::new()),
        }
    }

    pub fn status_for_aaguid(&self, aaguid: &Uuid) -> Option<StatusReport> {
        self.snapshot()?
            .find_by_aaguid(aaguid)?
            .latest_status_report()
            .cloned()
    }
}
