//! Attest Core - WebAuthn/FIDO2 attestation verification engine
//!
//! This crate checks that a credential created during a WebAuthn registration
//! comes from a genuine authenticator and has not been tampered with.
//!
//! # Features
//!
//! - Authenticator data and attestation object decoding (CBOR)
//! - `none`, `packed` (basic, self, ECDAA detection) and `apple` formats
//! - COSE keys and signature algorithms (ECDSA, RSA PKCS#1 v1.5, RSA-PSS, EdDSA)
//! - Signature counter checks for clone detection
//!
//! # Example
//!
//! ```no_run
//! use attest_core::{AttestationConfig, AttestationObject};
//!
//! # fn example(attestation_object: &[u8], client_data_hash: &[u8]) -> attest_core::Result<()> {
//! let registry = AttestationConfig::default().build_registry()?;
//!
//! let attestation = AttestationObject::from_cbor(attestation_object)?;
//! let statement = registry.load(&attestation)?;
//! let valid = registry.is_valid(client_data_hash, &statement, attestation.auth_data())?;
//! assert!(valid);
//! # Ok(())
//! # }
//! ```

pub mod attestation_object;
pub mod authenticator_data;
pub mod certificate;
pub mod config;
pub mod cose;
pub mod counter;
pub mod credential;
pub mod error;
pub mod formats;
pub mod registry;
pub mod statement;
pub mod trust_path;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use attestation_object::AttestationObject;
pub use authenticator_data::{AttestedCredentialData, AuthenticatorData, AuthenticatorFlags};
pub use certificate::{convert_all_der_to_pem, convert_der_to_pem, AttestationCertificate};
pub use config::{AttestationConfig, CounterPolicy};
pub use cose::algorithm::{AlgorithmManager, SignatureAlgorithm};
pub use cose::CoseKey;
pub use counter::{CounterChecker, NoopCounterChecker, StrictCounterChecker};
pub use credential::PublicKeyCredentialSource;
pub use error::{AttestError, Result};
pub use formats::{AttestationFormat, AttestationStatementSupport, FormatVerifier};
pub use registry::FormatRegistry;
pub use statement::{AttestationStatement, AttestationType, StatementMap};
pub use trust_path::TrustPath;
