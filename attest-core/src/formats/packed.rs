use std::sync::Arc;

use x509_parser::der_parser::der::parse_der_octetstring;

use crate::attestation_object::AttestationObject;
use crate::authenticator_data::AuthenticatorData;
use crate::certificate::{convert_all_der_to_pem, AttestationCertificate};
use crate::cose::algorithm::{certificate_algorithm, verify_with_certificate, AlgorithmManager};
use crate::cose::signature::fix_signature;
use crate::cose::CoseKey;
use crate::error::{AttestError, Result};
use crate::formats::{attested_credential, x5c_certificates, AttestationStatementSupport};
use crate::statement::AttestationStatement;
use crate::trust_path::TrustPath;

/// id-fido-gen-ce-aaguid
const AAGUID_EXTENSION_OID: &str = "1.3.6.1.4.1.45724.1.1.4";
const ATTESTATION_OU: &str = "Authenticator Attestation";

/// The `packed` format: basic (x5c), ECDAA or self attestation.
#[derive(Debug, Clone)]
pub struct PackedAttestationStatementSupport {
    algorithm_manager: Arc<AlgorithmManager>,
}

impl PackedAttestationStatementSupport {
    pub fn new(algorithm_manager: Arc<AlgorithmManager>) -> Self {
        Self { algorithm_manager }
    }

    fn process_with_certificate(
        &self,
        client_data_hash: &[u8],
        statement: &AttestationStatement,
        auth_data: &AuthenticatorData,
        certificates: &[String],
    ) -> Result<bool> {
        let leaf = certificates.first().ok_or_else(|| {
            AttestError::verification("The certificate trust path must not be empty")
        })?;
        let certificate = check_certificate(leaf, auth_data)?;

        let scheme = certificate_algorithm(statement_alg(statement)?)?;
        let signed_data = [auth_data.raw(), client_data_hash].concat();

        verify_with_certificate(
            scheme,
            certificate.x509(),
            &signed_data,
            statement_sig(statement)?,
        )
    }

    fn process_with_self_attestation(
        &self,
        client_data_hash: &[u8],
        statement: &AttestationStatement,
        auth_data: &AuthenticatorData,
    ) -> Result<bool> {
        let credential = attested_credential(auth_data)?;
        let public_key = CoseKey::from_cbor_strict(credential.credential_public_key())?;

        let alg = statement_alg(statement)?;
        if public_key.alg() != Some(alg) {
            return Err(AttestError::verification(
                "The algorithm of the attestation statement and the key are not identical.",
            ));
        }

        let algorithm = self.algorithm_manager.get(alg).ok_or_else(|| {
            AttestError::Verification(format!("The algorithm \"{}\" is not supported", alg))
        })?;
        let signature = fix_signature(statement_sig(statement)?, algorithm.signature_encoding())?;
        let signed_data = [auth_data.raw(), client_data_hash].concat();

        algorithm.verify(&signed_data, &public_key, &signature)
    }
}

impl AttestationStatementSupport for PackedAttestationStatementSupport {
    fn name(&self) -> &'static str {
        "packed"
    }

    fn load(&self, attestation: &AttestationObject) -> Result<AttestationStatement> {
        let att_stmt = attestation.att_stmt();

        if !att_stmt.get("sig").is_some_and(|v| v.is_bytes()) {
            return Err(AttestError::loading(
                "The attestation statement value \"sig\" is missing.",
            ));
        }
        if !att_stmt.get("alg").is_some_and(|v| v.is_integer()) {
            return Err(AttestError::loading(
                "The attestation statement value \"alg\" is missing.",
            ));
        }

        if att_stmt.contains_key("x5c") {
            let certificates = convert_all_der_to_pem(x5c_certificates(attestation)?);
            tracing::debug!(chain_len = certificates.len(), "Packed attestation with x5c");
            return Ok(AttestationStatement::basic(
                attestation.fmt(),
                att_stmt.clone(),
                certificates,
            ));
        }

        if let Some(key_id) = att_stmt.get("ecdaaKeyId") {
            let key_id = key_id.as_bytes().ok_or_else(|| {
                AttestError::loading("The attestation statement value \"ecdaaKeyId\" is invalid.")
            })?;
            tracing::debug!("Packed attestation with ECDAA key id");
            return Ok(AttestationStatement::ecdaa(
                attestation.fmt(),
                att_stmt.clone(),
                key_id.clone(),
            ));
        }

        tracing::debug!("Packed self attestation");
        Ok(AttestationStatement::self_attested(
            attestation.fmt(),
            att_stmt.clone(),
        ))
    }

    fn is_valid(
        &self,
        client_data_hash: &[u8],
        statement: &AttestationStatement,
        auth_data: &AuthenticatorData,
    ) -> Result<bool> {
        match statement.trust_path() {
            TrustPath::Certificate { x5c } => {
                self.process_with_certificate(client_data_hash, statement, auth_data, x5c)
            }
            TrustPath::EcdaaKeyId { .. } => {
                tracing::warn!("ECDAA attestation received, verification is not implemented");
                Err(AttestError::UnsupportedFeature("ECDAA not supported".into()))
            }
            TrustPath::Empty => {
                self.process_with_self_attestation(client_data_hash, statement, auth_data)
            }
            TrustPath::AnonymizationCA { .. } => Err(AttestError::verification(
                "Unsupported attestation statement",
            )),
        }
    }
}

/// Requirements on a packed attestation certificate.
fn check_certificate(pem: &str, auth_data: &AuthenticatorData) -> Result<AttestationCertificate> {
    let certificate = AttestationCertificate::from_pem(pem)?;

    if certificate.version()? != 2 {
        return Err(AttestError::verification("Invalid certificate version"));
    }

    if !certificate
        .subject_organizational_units()?
        .iter()
        .any(|unit| unit == ATTESTATION_OU)
    {
        return Err(AttestError::verification(
            "Invalid certificate name. The Subject Organization Unit must be \"Authenticator Attestation\"",
        ));
    }

    if certificate.basic_constraints_ca()? != Some(false) {
        return Err(AttestError::verification(
            "The Basic Constraints extension must have the CA component set to false",
        ));
    }

    let credential = attested_credential(auth_data)?;

    if let Some(extension) = certificate.extension(AAGUID_EXTENSION_OID)? {
        let aaguid = parse_der_octetstring(&extension)
            .ok()
            .filter(|(rest, _)| rest.is_empty())
            .and_then(|(_, object)| object.as_slice().ok().map(<[u8]>::to_vec))
            .ok_or_else(|| AttestError::verification("Invalid AAGUID certificate extension"))?;
        if aaguid.as_slice() != credential.aaguid().as_bytes() {
            return Err(AttestError::verification(
                "The value of the \"aaguid\" does not match with the certificate",
            ));
        }
    }

    Ok(certificate)
}

fn statement_alg(statement: &AttestationStatement) -> Result<i64> {
    statement
        .get("alg")
        .and_then(|v| v.as_integer())
        .and_then(|i| i64::try_from(i).ok())
        .ok_or_else(|| {
            AttestError::verification("The attestation statement value \"alg\" is invalid.")
        })
}

fn statement_sig(statement: &AttestationStatement) -> Result<&[u8]> {
    statement
        .get("sig")
        .and_then(|v| v.as_bytes())
        .map(Vec::as_slice)
        .ok_or_else(|| {
            AttestError::verification("The attestation statement value \"sig\" is invalid.")
        })
}
