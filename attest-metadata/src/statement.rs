//! Metadata statements: the per-model description embedded in BLOB entries.
//!
//! Only the members the trust store reads are modelled. Everything else is
//! kept verbatim in `other` so a statement serializes back unchanged.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{MetadataError, Result};
use crate::utils::filter_null_values;

/// Protocol version (`upv`). At least one of the two numbers is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawVersion")]
pub struct Version {
    #[serde(skip_serializing_if = "Option::is_none")]
    major: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    minor: Option<u16>,
}

#[derive(Deserialize)]
struct RawVersion {
    major: Option<i64>,
    minor: Option<i64>,
}

impl Version {
    pub fn new(major: Option<i64>, minor: Option<i64>) -> Result<Self> {
        if major.is_none() && minor.is_none() {
            return Err(MetadataError::loading("Invalid data. Must contain at least one item"));
        }
        Ok(Self {
            major: version_part("major", major)?,
            minor: version_part("minor", minor)?,
        })
    }

    pub fn major(&self) -> Option<u16> {
        self.major
    }

    pub fn minor(&self) -> Option<u16> {
        self.minor
    }
}

fn version_part(name: &str, value: Option<i64>) -> Result<Option<u16>> {
    value
        .map(|v| {
            u16::try_from(v).map_err(|_| {
                MetadataError::StatementLoading(format!("Invalid argument \"{}\"", name))
            })
        })
        .transpose()
}

impl TryFrom<RawVersion> for Version {
    type Error = MetadataError;

    fn try_from(raw: RawVersion) -> Result<Self> {
        Self::new(raw.major, raw.minor)
    }
}

/// Accuracy of a pattern-based user verification method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawPatternAccuracyDescriptor")]
pub struct PatternAccuracyDescriptor {
    min_complexity: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_retries: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_slowdown: Option<u16>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPatternAccuracyDescriptor {
    min_complexity: Option<i64>,
    max_retries: Option<u16>,
    block_slowdown: Option<u16>,
}

impl PatternAccuracyDescriptor {
    pub fn new(
        min_complexity: i64,
        max_retries: Option<u16>,
        block_slowdown: Option<u16>,
    ) -> Result<Self> {
        let min_complexity = u64::try_from(min_complexity).map_err(|_| {
            MetadataError::loading(
                "Invalid data. The value of \"minComplexity\" must be a positive integer",
            )
        })?;
        Ok(Self {
            min_complexity,
            max_retries,
            block_slowdown,
        })
    }

    pub fn min_complexity(&self) -> u64 {
        self.min_complexity
    }

    pub fn max_retries(&self) -> Option<u16> {
        self.max_retries
    }

    pub fn block_slowdown(&self) -> Option<u16> {
        self.block_slowdown
    }
}

impl TryFrom<RawPatternAccuracyDescriptor> for PatternAccuracyDescriptor {
    type Error = MetadataError;

    fn try_from(raw: RawPatternAccuracyDescriptor) -> Result<Self> {
        let min_complexity = raw
            .min_complexity
            .ok_or_else(|| MetadataError::loading("The key \"minComplexity\" is missing"))?;
        Self::new(min_complexity, raw.max_retries, raw.block_slowdown)
    }
}

/// One user verification method and its accuracy descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethodDescriptor {
    pub user_verification_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pa_desc: Option<PatternAccuracyDescriptor>,
    /// caDesc, baDesc and any later additions
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// FIDO metadata statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aaid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aaguid: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attestation_certificate_key_identifiers: Vec<String>,
    pub description: String,
    pub authenticator_version: u32,
    pub protocol_family: String,
    pub schema: u16,
    pub upv: Vec<Version>,
    pub attestation_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_verification_details: Vec<Vec<VerificationMethodDescriptor>>,
    /// Base64 (not base64url) DER trust anchors.
    pub attestation_root_certificates: Vec<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl MetadataStatement {
    pub fn create_from(value: &Value) -> Result<Self> {
        serde_json::from_value(filter_null_values(value.clone())).map_err(|e| {
            MetadataError::StatementLoading(format!("Invalid metadata statement: {}", e))
        })
    }

    /// Root certificates as PEM, ready for chain validation.
    pub fn attestation_root_certificates_pem(&self) -> Result<Vec<String>> {
        self.attestation_root_certificates
            .iter()
            .map(|encoded| {
                let der = STANDARD.decode(encoded.trim()).map_err(|e| {
                    MetadataError::StatementLoading(format!(
                        "Invalid attestation root certificate: {}",
                        e
                    ))
                })?;
                Ok(attest_core::convert_der_to_pem(&der))
            })
            .collect()
    }
}
