//! Decoding of the CBOR attestation object returned at registration.

use ciborium::value::Value;

use crate::authenticator_data::AuthenticatorData;
use crate::error::{AttestError, Result};
use crate::statement::StatementMap;

/// Attestation object: format tag, format-specific statement and authenticator data.
#[derive(Debug, Clone, PartialEq)]
pub struct AttestationObject {
    fmt: String,
    att_stmt: StatementMap,
    auth_data: AuthenticatorData,
}

impl AttestationObject {
    pub fn new(
        fmt: impl Into<String>,
        att_stmt: StatementMap,
        auth_data: AuthenticatorData,
    ) -> Self {
        Self {
            fmt: fmt.into(),
            att_stmt,
            auth_data,
        }
    }

    /// Decode an attestation object from its CBOR encoding.
    ///
    /// The input must hold exactly one CBOR item.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        let mut cursor = bytes;
        let value: Value = ciborium::from_reader(&mut cursor)
            .map_err(|e| AttestError::Loading(format!("Invalid attestation object: {e}")))?;
        if !cursor.is_empty() {
            return Err(AttestError::loading(
                "Invalid attestation object. Presence of extra bytes.",
            ));
        }
        Self::from_value(&value)
    }

    /// Build an attestation object from an already decoded CBOR tree.
    pub fn from_value(value: &Value) -> Result<Self> {
        let entries = value
            .as_map()
            .ok_or_else(|| AttestError::loading("Attestation object must be a CBOR map"))?;

        let mut fmt = None;
        let mut att_stmt = None;
        let mut auth_data = None;

        for (key, item) in entries {
            match key.as_text() {
                Some("fmt") => fmt = Some(item),
                Some("attStmt") => att_stmt = Some(item),
                Some("authData") => auth_data = Some(item),
                _ => {}
            }
        }

        let fmt = fmt
            .ok_or_else(|| AttestError::loading("Invalid attestation object: missing fmt"))?
            .as_text()
            .ok_or_else(|| AttestError::loading("Invalid attestation object: fmt must be text"))?;

        let att_stmt = att_stmt
            .ok_or_else(|| AttestError::loading("Invalid attestation object: missing attStmt"))?;
        let att_stmt = statement_map(att_stmt)?;

        let auth_data = auth_data
            .ok_or_else(|| AttestError::loading("Invalid attestation object: missing authData"))?
            .as_bytes()
            .ok_or_else(|| {
                AttestError::loading("Invalid attestation object: authData must be a byte string")
            })?;
        let auth_data = AuthenticatorData::from_bytes(auth_data)?;

        Ok(Self::new(fmt, att_stmt, auth_data))
    }

    pub fn fmt(&self) -> &str {
        &self.fmt
    }

    pub fn att_stmt(&self) -> &StatementMap {
        &self.att_stmt
    }

    pub fn auth_data(&self) -> &AuthenticatorData {
        &self.auth_data
    }
}

fn statement_map(value: &Value) -> Result<StatementMap> {
    let entries = value
        .as_map()
        .ok_or_else(|| AttestError::loading("Invalid attestation object: attStmt must be a map"))?;

    entries
        .iter()
        .map(|(key, item)| {
            key.as_text()
                .map(|k| (k.to_string(), item.clone()))
                .ok_or_else(|| {
                    AttestError::loading("Invalid attestation object: attStmt keys must be text")
                })
        })
        .collect()
}
