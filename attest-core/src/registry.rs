//! Format registry: resolves the verifier for an attestation format tag.

use std::collections::HashMap;
use std::sync::Arc;

use crate::attestation_object::AttestationObject;
use crate::authenticator_data::AuthenticatorData;
use crate::cose::algorithm::AlgorithmManager;
use crate::error::{AttestError, Result};
use crate::formats::{
    AppleAttestationStatementSupport, AttestationFormat, AttestationStatementSupport,
    FormatVerifier, NoneAttestationStatementSupport, PackedAttestationStatementSupport,
};
use crate::statement::AttestationStatement;

/// Verifiers keyed by format.
///
/// Populated once at start-up and then shared read-only; all methods besides
/// [`FormatRegistry::add`] take `&self`.
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    verifiers: HashMap<AttestationFormat, FormatVerifier>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `none`, `packed` and `apple` registered.
    pub fn with_defaults(algorithm_manager: Arc<AlgorithmManager>) -> Self {
        let mut registry = Self::new();
        registry
            .add(NoneAttestationStatementSupport::new())
            .add(PackedAttestationStatementSupport::new(algorithm_manager))
            .add(AppleAttestationStatementSupport::new());
        registry
    }

    /// Register a verifier, replacing any previous one for the same format.
    pub fn add(&mut self, verifier: impl Into<FormatVerifier>) -> &mut Self {
        let verifier = verifier.into();
        self.verifiers.insert(verifier.format(), verifier);
        self
    }

    pub fn has(&self, fmt: &str) -> bool {
        fmt.parse::<AttestationFormat>()
            .map(|format| self.verifiers.contains_key(&format))
            .unwrap_or(false)
    }

    pub fn resolve(&self, fmt: &str) -> Result<&FormatVerifier> {
        let format: AttestationFormat = fmt.parse()?;
        self.verifiers
            .get(&format)
            .ok_or_else(|| AttestError::UnsupportedFormat(fmt.to_string()))
    }

    /// Load the statement of `attestation` with the verifier for its `fmt`.
    #[tracing::instrument(level = "debug", skip_all, fields(format = %attestation.fmt()))]
    pub fn load(&self, attestation: &AttestationObject) -> Result<AttestationStatement> {
        let verifier = self.resolve(attestation.fmt())?;
        tracing::debug!("Loading attestation statement");
        verifier.load(attestation)
    }

    /// Validate a loaded statement with the verifier for its `fmt`.
    #[tracing::instrument(level = "debug", skip_all, fields(format = %statement.fmt()))]
    pub fn is_valid(
        &self,
        client_data_hash: &[u8],
        statement: &AttestationStatement,
        auth_data: &AuthenticatorData,
    ) -> Result<bool> {
        let verifier = self.resolve(statement.fmt())?;
        let valid = verifier.is_valid(client_data_hash, statement, auth_data)?;
        tracing::debug!(valid, "Attestation statement checked");
        Ok(valid)
    }

    /// Registered formats, in a stable order.
    pub fn formats(&self) -> Vec<AttestationFormat> {
        let mut formats: Vec<_> = self.verifiers.keys().copied().collect();
        formats.sort();
        formats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        attestation_object, auth_data, client_data_hash, TestAuthenticator, AAGUID,
    };

    #[test]
    fn test_defaults_register_all_formats() {
        let registry = FormatRegistry::with_defaults(Arc::new(AlgorithmManager::with_defaults()));
        assert_eq!(registry.formats(), AttestationFormat::ALL.to_vec());
        assert!(registry.has("packed"));
        assert!(!registry.has("tpm"));
    }

    #[test]
    fn test_resolve_unknown_format() {
        let registry = FormatRegistry::new();
        assert!(matches!(
            registry.resolve("none"),
            Err(AttestError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            registry.resolve("fido-u2f"),
            Err(AttestError::UnsupportedFormat(name)) if name == "fido-u2f"
        ));
    }

    #[test]
    fn test_dispatch_by_format() {
        let mut registry = FormatRegistry::new();
        registry.add(NoneAttestationStatementSupport::new());

        let data = auth_data(AAGUID, &TestAuthenticator::new().cose_key(-7));
        let object = attestation_object("none", vec![], &data);
        let statement = registry.load(&object).unwrap();
        assert!(registry
            .is_valid(&client_data_hash(), &statement, &data)
            .unwrap());

        let packed = attestation_object("packed", vec![], &data);
        assert!(matches!(
            registry.load(&packed),
            Err(AttestError::UnsupportedFormat(_))
        ));
    }
}
