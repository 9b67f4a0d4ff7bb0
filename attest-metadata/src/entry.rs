//! One authenticator model in the metadata BLOB.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{MetadataError, Result};
use crate::statement::MetadataStatement;
use crate::status_report::{BiometricStatusReport, StatusReport};
use crate::utils::{field, object, optional, require};

const INVALID_KEY_IDENTIFIER: &str =
    "Invalid attestation certificate identifier. Shall be a list of strings";

/// How an entry names the authenticator model it describes.
///
/// AAID and AAGUID exclude each other. Either may still list the key
/// identifiers of its attestation certificates; without both, the list is
/// the identifier and must not be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AuthenticatorIdentifier {
    /// UAF authenticators.
    Aaid {
        aaid: String,
        #[serde(
            rename = "attestationCertificateKeyIdentifiers",
            skip_serializing_if = "Vec::is_empty"
        )]
        key_identifiers: Vec<String>,
    },
    /// FIDO2 authenticators.
    Aaguid {
        aaguid: Uuid,
        #[serde(
            rename = "attestationCertificateKeyIdentifiers",
            skip_serializing_if = "Vec::is_empty"
        )]
        key_identifiers: Vec<String>,
    },
    /// U2F authenticators, by SHA-1 of the attestation public key (lowercase hex).
    KeyIdentifiers {
        #[serde(rename = "attestationCertificateKeyIdentifiers")]
        key_identifiers: Vec<String>,
    },
}

impl AuthenticatorIdentifier {
    fn from_parts(
        aaid: Option<String>,
        aaguid: Option<Uuid>,
        key_identifiers: Vec<String>,
    ) -> Result<Self> {
        match (aaid, aaguid) {
            (Some(_), Some(_)) => Err(MetadataError::loading(
                "Authenticators cannot support both AAID and AAGUID",
            )),
            (Some(aaid), None) => Ok(Self::Aaid {
                aaid,
                key_identifiers,
            }),
            (None, Some(aaguid)) => Ok(Self::Aaguid {
                aaguid,
                key_identifiers,
            }),
            (None, None) if key_identifiers.is_empty() => Err(MetadataError::loading(
                "If neither AAID nor AAGUID are set, the attestation certificate identifier list shall not be empty",
            )),
            (None, None) => Ok(Self::KeyIdentifiers { key_identifiers }),
        }
    }

    pub fn key_identifiers(&self) -> &[String] {
        match self {
            Self::Aaid {
                key_identifiers, ..
            }
            | Self::Aaguid {
                key_identifiers, ..
            }
            | Self::KeyIdentifiers { key_identifiers } => key_identifiers,
        }
    }
}

/// `^[0-9a-f]+$`
pub fn is_valid_key_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && identifier
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn key_identifiers(map: &Map<String, Value>) -> Result<Vec<String>> {
    let Some(value) = map.get("attestationCertificateKeyIdentifiers") else {
        return Ok(Vec::new());
    };
    let items = value
        .as_array()
        .ok_or_else(|| MetadataError::loading(INVALID_KEY_IDENTIFIER))?;

    items
        .iter()
        .map(|item| match item.as_str() {
            Some(id) if is_valid_key_identifier(id) => Ok(id.to_string()),
            _ => Err(MetadataError::loading(INVALID_KEY_IDENTIFIER)),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "Value")]
pub struct MetadataBLOBPayloadEntry {
    #[serde(flatten)]
    identifier: AuthenticatorIdentifier,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata_statement: Option<MetadataStatement>,
    status_reports: Vec<StatusReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    biometric_status_reports: Vec<BiometricStatusReport>,
    time_of_last_status_change: String,
    #[serde(rename = "rogueListURL", skip_serializing_if = "Option::is_none")]
    rogue_list_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rogue_list_hash: Option<String>,
}

impl MetadataBLOBPayloadEntry {
    pub fn new(
        identifier: AuthenticatorIdentifier,
        status_reports: Vec<StatusReport>,
        time_of_last_status_change: impl Into<String>,
    ) -> Result<Self> {
        if status_reports.is_empty() {
            return Err(MetadataError::loading(
                "Invalid data. The parameter \"statusReports\" shall not be empty",
            ));
        }
        let ids = identifier.key_identifiers();
        if !ids.iter().all(|id| is_valid_key_identifier(id)) {
            return Err(MetadataError::loading(INVALID_KEY_IDENTIFIER));
        }
        let keys_only = matches!(identifier, AuthenticatorIdentifier::KeyIdentifiers { .. });
        if keys_only && ids.is_empty() {
            return Err(MetadataError::loading(
                "If neither AAID nor AAGUID are set, the attestation certificate identifier list shall not be empty",
            ));
        }
        Ok(Self {
            identifier,
            metadata_statement: None,
            status_reports,
            biometric_status_reports: Vec::new(),
            time_of_last_status_change: time_of_last_status_change.into(),
            rogue_list_url: None,
            rogue_list_hash: None,
        })
    }

    /// Parse one entry of the `entries` list.
    pub fn create_from(value: &Value) -> Result<Self> {
        let map = object(value, "entry")?;

        let time_of_last_status_change: String =
            field("timeOfLastStatusChange", require(&map, "timeOfLastStatusChange")?)?;
        let reports = require(&map, "statusReports")?.as_array().ok_or_else(|| {
            MetadataError::loading(
                "Invalid data. The parameter \"statusReports\" shall be an array of StatusReport objects",
            )
        })?;
        let status_reports = reports
            .iter()
            .map(|report| field("statusReports", report))
            .collect::<Result<Vec<StatusReport>>>()?;

        let identifier = AuthenticatorIdentifier::from_parts(
            optional(&map, "aaid")?,
            optional(&map, "aaguid")?,
            key_identifiers(&map)?,
        )?;

        let mut entry = Self::new(identifier, status_reports, time_of_last_status_change)?;
        entry.metadata_statement = map
            .get("metadataStatement")
            .map(MetadataStatement::create_from)
            .transpose()?;
        entry.biometric_status_reports = optional(&map, "biometricStatusReports")?
            .or(optional(&map, "biometricStatusReport")?)
            .unwrap_or_default();
        entry.rogue_list_url = optional(&map, "rogueListURL")?;
        entry.rogue_list_hash = optional(&map, "rogueListHash")?;

        Ok(entry)
    }

    pub fn with_metadata_statement(mut self, statement: MetadataStatement) -> Self {
        self.metadata_statement = Some(statement);
        self
    }

    pub fn identifier(&self) -> &AuthenticatorIdentifier {
        &self.identifier
    }

    pub fn aaid(&self) -> Option<&str> {
        match &self.identifier {
            AuthenticatorIdentifier::Aaid { aaid, .. } => Some(aaid),
            _ => None,
        }
    }

    pub fn aaguid(&self) -> Option<Uuid> {
        match self.identifier {
            AuthenticatorIdentifier::Aaguid { aaguid, .. } => Some(aaguid),
            _ => None,
        }
    }

    pub fn attestation_certificate_key_identifiers(&self) -> &[String] {
        self.identifier.key_identifiers()
    }

    pub fn metadata_statement(&self) -> Option<&MetadataStatement> {
        self.metadata_statement.as_ref()
    }

    pub fn status_reports(&self) -> &[StatusReport] {
        &self.status_reports
    }

    pub fn biometric_status_reports(&self) -> &[BiometricStatusReport] {
        &self.biometric_status_reports
    }

    pub fn time_of_last_status_change(&self) -> &str {
        &self.time_of_last_status_change
    }

    pub fn rogue_list_url(&self) -> Option<&str> {
        self.rogue_list_url.as_deref()
    }

    pub fn rogue_list_hash(&self) -> Option<&str> {
        self.rogue_list_hash.as_deref()
    }

    /// Report with the most recent effective date; undated reports sort first.
    pub fn latest_status_report(&self) -> Option<&StatusReport> {
        self.status_reports
            .iter()
            .max_by(|a, b| a.effective_date.cmp(&b.effective_date))
    }
}

impl TryFrom<Value> for MetadataBLOBPayloadEntry {
    type Error = MetadataError;

    fn try_from(value: Value) -> Result<Self> {
        Self::create_from(&value)
    }
}
