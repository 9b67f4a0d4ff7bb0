//! Parsed, format-tagged attestation statements.

use std::collections::BTreeMap;

use ciborium::value::Value;
use serde::{Deserialize, Serialize};

use crate::trust_path::TrustPath;

/// Raw `attStmt` fields keyed by their text key.
pub type StatementMap = BTreeMap<String, Value>;

/// Attestation type conveyed by a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttestationType {
    None,
    Basic,
    #[serde(rename = "self")]
    SelfAttestation,
    #[serde(rename = "attca")]
    AttCA,
    #[serde(rename = "anonca")]
    AnonCA,
    Ecdaa,
}

/// Attestation statement after structural validation.
///
/// Only the constructors below can build one, and each fixes the trust path
/// variant that goes with its attestation type.
#[derive(Debug, Clone, PartialEq)]
pub struct AttestationStatement {
    fmt: String,
    att_stmt: StatementMap,
    trust_path: TrustPath,
    attestation_type: AttestationType,
}

impl AttestationStatement {
    pub fn none(fmt: impl Into<String>, att_stmt: StatementMap) -> Self {
        Self::build(fmt, att_stmt, TrustPath::Empty, AttestationType::None)
    }

    pub fn basic(fmt: impl Into<String>, att_stmt: StatementMap, x5c: Vec<String>) -> Self {
        Self::build(
            fmt,
            att_stmt,
            TrustPath::Certificate { x5c },
            AttestationType::Basic,
        )
    }

    pub fn att_ca(fmt: impl Into<String>, att_stmt: StatementMap, x5c: Vec<String>) -> Self {
        Self::build(
            fmt,
            att_stmt,
            TrustPath::Certificate { x5c },
            AttestationType::AttCA,
        )
    }

    pub fn self_attested(fmt: impl Into<String>, att_stmt: StatementMap) -> Self {
        Self::build(
            fmt,
            att_stmt,
            TrustPath::Empty,
            AttestationType::SelfAttestation,
        )
    }

    pub fn ecdaa(fmt: impl Into<String>, att_stmt: StatementMap, ecdaa_key_id: Vec<u8>) -> Self {
        Self::build(
            fmt,
            att_stmt,
            TrustPath::EcdaaKeyId { ecdaa_key_id },
            AttestationType::Ecdaa,
        )
    }

    pub fn anonymization_ca(
        fmt: impl Into<String>,
        att_stmt: StatementMap,
        x5c: Vec<String>,
    ) -> Self {
        Self::build(
            fmt,
            att_stmt,
            TrustPath::AnonymizationCA { x5c },
            AttestationType::AnonCA,
        )
    }

    fn build(
        fmt: impl Into<String>,
        att_stmt: StatementMap,
        trust_path: TrustPath,
        attestation_type: AttestationType,
    ) -> Self {
        Self {
            fmt: fmt.into(),
            att_stmt,
            trust_path,
            attestation_type,
        }
    }

    pub fn fmt(&self) -> &str {
        &self.fmt
    }

    pub fn att_stmt(&self) -> &StatementMap {
        &self.att_stmt
    }

    pub fn has(&self, key: &str) -> bool {
        self.att_stmt.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.att_stmt.get(key)
    }

    pub fn trust_path(&self) -> &TrustPath {
        &self.trust_path
    }

    pub fn attestation_type(&self) -> AttestationType {
        self.attestation_type
    }
}
