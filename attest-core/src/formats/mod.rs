//! Attestation statement formats.
//!
//! Every supported format is a variant of [`AttestationFormat`], and
//! [`FormatVerifier`] dispatches to its implementation. Adding a format means
//! adding a variant to both, so `match` exhaustiveness covers every call site.

mod apple;
mod none;
mod packed;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::attestation_object::AttestationObject;
use crate::authenticator_data::AuthenticatorData;
use crate::error::{AttestError, Result};
use crate::statement::AttestationStatement;

pub use apple::AppleAttestationStatementSupport;
pub use none::NoneAttestationStatementSupport;
pub use packed::PackedAttestationStatementSupport;

/// Structural loading and cryptographic validation of one attestation format.
pub trait AttestationStatementSupport: Send + Sync {
    /// Format tag, as found in `fmt`.
    fn name(&self) -> &'static str;

    /// Validate the statement structure and build the trust path.
    fn load(&self, attestation: &AttestationObject) -> Result<AttestationStatement>;

    /// Validate the statement against the client data hash and authenticator data.
    ///
    /// `Ok(false)` means the statement is cryptographically invalid; errors
    /// report malformed input found during validation.
    fn is_valid(
        &self,
        client_data_hash: &[u8],
        statement: &AttestationStatement,
        auth_data: &AuthenticatorData,
    ) -> Result<bool>;
}

/// Attestation formats this crate implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationFormat {
    None,
    Packed,
    Apple,
}

impl AttestationFormat {
    pub const ALL: [AttestationFormat; 3] = [Self::None, Self::Packed, Self::Apple];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Packed => "packed",
            Self::Apple => "apple",
        }
    }
}

impl fmt::Display for AttestationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttestationFormat {
    type Err = AttestError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "packed" => Ok(Self::Packed),
            "apple" => Ok(Self::Apple),
            other => Err(AttestError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// A registered verifier, one variant per format.
#[derive(Debug, Clone)]
pub enum FormatVerifier {
    None(NoneAttestationStatementSupport),
    Packed(PackedAttestationStatementSupport),
    Apple(AppleAttestationStatementSupport),
}

impl FormatVerifier {
    pub fn format(&self) -> AttestationFormat {
        match self {
            Self::None(_) => AttestationFormat::None,
            Self::Packed(_) => AttestationFormat::Packed,
            Self::Apple(_) => AttestationFormat::Apple,
        }
    }

    fn support(&self) -> &dyn AttestationStatementSupport {
        match self {
            Self::None(v) => v,
            Self::Packed(v) => v,
            Self::Apple(v) => v,
        }
    }
}

impl AttestationStatementSupport for FormatVerifier {
    fn name(&self) -> &'static str {
        self.support().name()
    }

    fn load(&self, attestation: &AttestationObject) -> Result<AttestationStatement> {
        self.support().load(attestation)
    }

    fn is_valid(
        &self,
        client_data_hash: &[u8],
        statement: &AttestationStatement,
        auth_data: &AuthenticatorData,
    ) -> Result<bool> {
        self.support()
            .is_valid(client_data_hash, statement, auth_data)
    }
}

impl From<NoneAttestationStatementSupport> for FormatVerifier {
    fn from(v: NoneAttestationStatementSupport) -> Self {
        Self::None(v)
    }
}

impl From<PackedAttestationStatementSupport> for FormatVerifier {
    fn from(v: PackedAttestationStatementSupport) -> Self {
        Self::Packed(v)
    }
}

impl From<AppleAttestationStatementSupport> for FormatVerifier {
    fn from(v: AppleAttestationStatementSupport) -> Self {
        Self::Apple(v)
    }
}

/// Attested credential data is required by every certificate-based check.
pub(crate) fn attested_credential(
    auth_data: &AuthenticatorData,
) -> Result<&crate::authenticator_data::AttestedCredentialData> {
    auth_data
        .attested_credential_data()
        .ok_or_else(|| AttestError::verification("No attested credential available"))
}

/// DER certificates from an `x5c` entry, which must be a non-empty array of byte strings.
pub(crate) fn x5c_certificates(attestation: &AttestationObject) -> Result<Vec<Vec<u8>>> {
    let invalid = || {
        AttestError::loading(
            "The attestation statement value \"x5c\" must be a list with at least one certificate.",
        )
    };

    let list = attestation
        .att_stmt()
        .get("x5c")
        .and_then(|v| v.as_array())
        .ok_or_else(invalid)?;
    if list.is_empty() {
        return Err(invalid());
    }
    list.iter()
        .map(|item| item.as_bytes().cloned().ok_or_else(invalid))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tags() {
        for format in AttestationFormat::ALL {
            assert_eq!(format.as_str().parse::<AttestationFormat>().unwrap(), format);
        }
        assert!(matches!(
            "tpm".parse::<AttestationFormat>(),
            Err(AttestError::UnsupportedFormat(name)) if name == "tpm"
        ));
    }

    #[test]
    fn test_verifier_reports_its_format() {
        let verifier = FormatVerifier::from(NoneAttestationStatementSupport::new());
        assert_eq!(verifier.format(), AttestationFormat::None);
        assert_eq!(verifier.name(), "none");
    }
}
