//! The metadata BLOB payload: a numbered snapshot of all known authenticator models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::entry::MetadataBLOBPayloadEntry;
use crate::error::{MetadataError, Result};
use crate::utils::{object, optional, require};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "Value")]
pub struct MetadataBLOBPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    legal_header: Option<String>,
    next_update: String,
    no: u64,
    entries: Vec<MetadataBLOBPayloadEntry>,
    /// PEM roots of the BLOB signing chain, set by whoever verified the BLOB.
    #[serde(skip)]
    root_certificates: Vec<String>,
}

impl MetadataBLOBPayload {
    pub fn new(no: u64, next_update: impl Into<String>, legal_header: Option<String>) -> Self {
        Self {
            legal_header,
            next_update: next_update.into(),
            no,
            entries: Vec::new(),
            root_certificates: Vec::new(),
        }
    }

    /// Build a payload from the decoded JSON body of an already verified BLOB.
    pub fn create_from(value: &Value) -> Result<Self> {
        let map = object(value, "payload")?;
        for key in ["no", "nextUpdate", "entries"] {
            require(&map, key)?;
        }

        let no = map["no"].as_u64().ok_or_else(|| {
            MetadataError::loading("Invalid data. The parameter \"no\" shall be an integer")
        })?;
        let next_update = map["nextUpdate"].as_str().ok_or_else(|| {
            MetadataError::loading("Invalid data. The parameter \"nextUpdate\" shall be a string")
        })?;
        let entries = map["entries"].as_array().ok_or_else(|| {
            MetadataError::loading(
                "Invalid data. The parameter \"entries\" shall be an array of entries",
            )
        })?;

        let mut payload = Self::new(no, next_update, optional(&map, "legalHeader")?);
        for entry in entries {
            payload.add_entry(MetadataBLOBPayloadEntry::create_from(entry)?);
        }

        tracing::debug!(no, entries = payload.entries.len(), "Parsed metadata BLOB payload");
        Ok(payload)
    }

    pub fn add_entry(&mut self, entry: MetadataBLOBPayloadEntry) -> &mut Self {
        self.entries.push(entry);
        self
    }

    pub fn with_root_certificates(mut self, root_certificates: Vec<String>) -> Self {
        self.root_certificates = root_certificates;
        self
    }

    pub fn legal_header(&self) -> Option<&str> {
        self.legal_header.as_deref()
    }

    pub fn next_update(&self) -> &str {
        &self.next_update
    }

    pub fn no(&self) -> u64 {
        self.no
    }

    pub fn entries(&self) -> &[MetadataBLOBPayloadEntry] {
        &self.entries
    }

    pub fn root_certificates(&self) -> &[String] {
        &self.root_certificates
    }

    /// `nextUpdate` as a calendar date (`YYYY-MM-DD`).
    pub fn next_update_date(&self) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(&self.next_update, "%Y-%m-%d").map_err(|e| {
            MetadataError::StatementLoading(format!(
                "Invalid data. The parameter \"nextUpdate\" is not a date: {}",
                e
            ))
        })
    }

    pub fn find_by_aaguid(&self, aaguid: &Uuid) -> Option<&MetadataBLOBPayloadEntry> {
        self.entries
            .iter()
            .find(|entry| entry.aaguid().as_ref() == Some(aaguid))
    }

    pub fn find_by_aaid(&self, aaid: &str) -> Option<&MetadataBLOBPayloadEntry> {
        self.entries.iter().find(|entry| entry.aaid() == Some(aaid))
    }

    /// Matches case-insensitively; stored identifiers are lowercase.
    pub fn find_by_key_identifier(
        &self,
        key_identifier: &str,
    ) -> Option<&MetadataBLOBPayloadEntry> {
        let wanted = key_identifier.to_ascii_lowercase();
        self.entries.iter().find(|entry| {
            entry
                .attestation_certificate_key_identifiers()
                .iter()
                .any(|id| *id == wanted)
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| MetadataError::Serialization(e.to_string()))
    }
}

impl TryFrom<Value> for MetadataBLOBPayload {
    type Error = MetadataError;

    fn try_from(value: Value) -> Result<Self> {
        Self::create_from(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "legalHeader": "Retrieval and use of this BLOB indicates acceptance of the terms.",
            "no": 42,
            "nextUpdate": "2026-11-01",
            "entries": [
                {
                    "aaguid": "0132d110-bf4e-4208-a403-ab4f5f12efe5",
                    "statusReports": [{ "status": "FIDO_CERTIFIED" }],
                    "timeOfLastStatusChange": "2024-02-10"
                },
                {
                    "aaid": "4e4e#4005",
                    "statusReports": [{ "status": "FIDO_CERTIFIED" }],
                    "timeOfLastStatusChange": "2024-02-10"
                },
                {
                    "attestationCertificateKeyIdentifiers": ["923881fe2f214ee465484371aeb72e97f5a58e0a"],
                    "statusReports": [{ "status": "NOT_FIDO_CERTIFIED" }],
                    "timeOfLastStatusChange": "2024-02-10"
                }
            ]
        })
    }

    #[test]
    fn test_create_and_lookup() {
        let payload = MetadataBLOBPayload::create_from(&payload()).unwrap();

        assert_eq!(payload.no(), 42);
        assert_eq!(
            payload.next_update_date().unwrap(),
            NaiveDate::from_ymd_opt(2026, 11, 1).unwrap()
        );
        let aaguid = Uuid::parse_str("0132d110-bf4e-4208-a403-ab4f5f12efe5").unwrap();
        assert!(payload.find_by_aaguid(&aaguid).is_some());
        assert!(payload.find_by_aaid("4e4e#4005").is_some());
        assert!(payload
            .find_by_key_identifier("923881FE2F214EE465484371AEB72E97F5A58E0A")
            .is_some());
        assert!(payload.find_by_aaid("0000#0000").is_none());
    }

    #[test]
    fn test_required_parameters() {
        for key in ["no", "nextUpdate", "entries"] {
            let mut value = payload();
            value.as_object_mut().unwrap().remove(key);
            let err = MetadataBLOBPayload::create_from(&value).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Invalid data. The parameter \"{}\" is missing", key)
            );
        }
    }

    #[test]
    fn test_parameter_types() {
        let mut value = payload();
        value["no"] = json!("42");
        assert!(MetadataBLOBPayload::create_from(&value)
            .unwrap_err()
            .to_string()
            .contains("shall be an integer"));

        let mut value = payload();
        value["nextUpdate"] = json!(20261101);
        assert!(MetadataBLOBPayload::create_from(&value)
            .unwrap_err()
            .to_string()
            .contains("shall be a string"));

        let mut value = payload();
        value["entries"] = json!({});
        assert!(MetadataBLOBPayload::create_from(&value).is_err());
    }

    #[test]
    fn test_invalid_entry_fails_whole_payload() {
        let mut value = payload();
        value["entries"][0]["aaid"] = json!("4e4e#4005");
        assert!(MetadataBLOBPayload::create_from(&value).is_err());
    }

    #[test]
    fn test_bad_next_update_date() {
        let payload = MetadataBLOBPayload::new(1, "next tuesday", None);
        assert!(payload.next_update_date().is_err());
    }
}
