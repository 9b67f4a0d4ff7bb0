use crate::attestation_object::AttestationObject;
use crate::authenticator_data::AuthenticatorData;
use crate::certificate::{convert_all_der_to_pem, AttestationCertificate};
use crate::cose::{CoseKey, KeyType};
use crate::error::{AttestError, Result};
use crate::formats::{attested_credential, x5c_certificates, AttestationStatementSupport};
use crate::statement::AttestationStatement;
use crate::trust_path::TrustPath;

const NONCE_EXTENSION_OID: &str = "1.2.840.113635.100.8.2";

/// DER header of the nonce extension: SEQUENCE { [1] { OCTET STRING (32) } }.
///
/// Matching on this fixed header assumes a 32-byte nonce in exactly this
/// encoding. A longer or differently tagged value is rejected.
const NONCE_EXTENSION_PREFIX: [u8; 6] = [0x30, 0x24, 0xa1, 0x22, 0x04, 0x20];

/// The `apple` anonymous attestation format.
///
/// Validation either succeeds or fails with an error: every failure here is
/// a non-conforming certificate rather than a bad signature.
#[derive(Debug, Clone, Default)]
pub struct AppleAttestationStatementSupport;

impl AppleAttestationStatementSupport {
    pub fn new() -> Self {
        Self
    }
}

impl AttestationStatementSupport for AppleAttestationStatementSupport {
    fn name(&self) -> &'static str {
        "apple"
    }

    fn load(&self, attestation: &AttestationObject) -> Result<AttestationStatement> {
        if !attestation.att_stmt().contains_key("x5c") {
            return Err(AttestError::loading(
                "The attestation statement value \"x5c\" is missing.",
            ));
        }
        let certificates = convert_all_der_to_pem(x5c_certificates(attestation)?);

        Ok(AttestationStatement::anonymization_ca(
            attestation.fmt(),
            attestation.att_stmt().clone(),
            certificates,
        ))
    }

    fn is_valid(
        &self,
        client_data_hash: &[u8],
        statement: &AttestationStatement,
        auth_data: &AuthenticatorData,
    ) -> Result<bool> {
        let leaf = match statement.trust_path() {
            TrustPath::AnonymizationCA { x5c } => x5c
                .first()
                .ok_or_else(|| AttestError::verification("Invalid trust path"))?,
            _ => return Err(AttestError::verification("Invalid trust path")),
        };
        let certificate = AttestationCertificate::from_pem(leaf)?;

        check_public_key(&certificate, auth_data)?;
        check_nonce(&certificate, auth_data, client_data_hash)?;

        Ok(true)
    }
}

/// The certificate must certify the attested credential key itself.
fn check_public_key(
    certificate: &AttestationCertificate,
    auth_data: &AuthenticatorData,
) -> Result<()> {
    let certificate_key = certificate
        .public_key_pem()
        .map_err(|_| AttestError::verification("Unable to read the certificate"))?;

    let credential = attested_credential(auth_data)?;
    let public_key = CoseKey::from_cbor_strict(credential.credential_public_key())?;
    if !matches!(public_key.key_type(), KeyType::Ec2 | KeyType::Rsa) {
        return Err(AttestError::verification("Unsupported key type"));
    }

    if public_key.to_pem()? != certificate_key {
        return Err(AttestError::verification("Invalid key"));
    }
    Ok(())
}

fn check_nonce(
    certificate: &AttestationCertificate,
    auth_data: &AuthenticatorData,
    client_data_hash: &[u8],
) -> Result<()> {
    let extension = certificate.extension(NONCE_EXTENSION_OID)?.ok_or_else(|| {
        AttestError::Verification(format!(
            "The certificate extension \"{}\" is missing",
            NONCE_EXTENSION_OID
        ))
    })?;

    let nonce = openssl::sha::sha256(&[auth_data.raw(), client_data_hash].concat());
    let expected = format!("{}{}", hex::encode(NONCE_EXTENSION_PREFIX), hex::encode(nonce));

    if hex::encode(&extension) != expected {
        tracing::debug!(extension = %hex::encode(&extension), "Apple nonce extension mismatch");
        return Err(AttestError::verification("The client data hash is not valid"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ciborium::value::Value;

    use openssl::pkey::PKey;

    use crate::cose::int;
    use crate::statement::AttestationType;
    use crate::test_support::{
        attestation_object, auth_data, client_data_hash, encode, signed_data, CertificateOptions,
        TestAuthenticator, AAGUID,
    };

    fn fixture() -> (TestAuthenticator, AuthenticatorData, Vec<u8>) {
        let authenticator = TestAuthenticator::new();
        let data = auth_data(AAGUID, &authenticator.cose_key(-7));
        let nonce = openssl::sha::sha256(&signed_data(&data, &client_data_hash()));
        let cert = authenticator.certificate_der(&CertificateOptions::apple(&nonce));
        (authenticator, data, cert)
    }

    fn load(data: &AuthenticatorData, cert: Vec<u8>) -> AttestationStatement {
        let object = attestation_object(
            "apple",
            vec![("x5c", Value::Array(vec![Value::Bytes(cert)]))],
            data,
        );
        AppleAttestationStatementSupport::new().load(&object).unwrap()
    }

    #[test]
    fn test_valid_apple_attestation() {
        let (_, data, cert) = fixture();
        let statement = load(&data, cert);

        assert_eq!(statement.attestation_type(), AttestationType::AnonCA);
        assert!(AppleAttestationStatementSupport::new()
            .is_valid(&client_data_hash(), &statement, &data)
            .unwrap());
    }

    #[test]
    fn test_altered_client_data_hash_fails() {
        let (_, data, cert) = fixture();
        let statement = load(&data, cert);

        let mut hash = client_data_hash();
        hash[0] ^= 0xFF;
        let err = AppleAttestationStatementSupport::new()
            .is_valid(&hash, &statement, &data)
            .unwrap_err();
        assert!(matches!(err, AttestError::Verification(_)));
        assert!(err.to_string().contains("client data hash"));
    }

    #[test]
    fn test_certificate_for_other_key_fails() {
        let (_, data, _) = fixture();
        let other = TestAuthenticator::new();
        let nonce = openssl::sha::sha256(&signed_data(&data, &client_data_hash()));
        let cert = other.certificate_der(&CertificateOptions::apple(&nonce));
        let statement = load(&data, cert);

        let err = AppleAttestationStatementSupport::new()
            .is_valid(&client_data_hash(), &statement, &data)
            .unwrap_err();
        assert!(err.to_string().contains("Invalid key"));
    }

    #[test]
    fn test_missing_extension_fails() {
        let (authenticator, data, _) = fixture();
        let cert = authenticator.certificate_der(&CertificateOptions {
            apple_nonce: None,
            ..CertificateOptions::apple(&[])
        });
        let statement = load(&data, cert);

        let err = AppleAttestationStatementSupport::new()
            .is_valid(&client_data_hash(), &statement, &data)
            .unwrap_err();
        assert!(err.to_string().contains("is missing"));
    }

    #[test]
    fn test_okp_credential_key_rejected() {
        let ed25519 = PKey::generate_ed25519().unwrap();
        let cose_key = encode(&Value::Map(vec![
            (int(1), int(1)),
            (int(3), int(-8)),
            (int(-1), int(6)),
            (int(-2), Value::Bytes(ed25519.raw_public_key().unwrap())),
        ]));
        let data = auth_data(AAGUID, &cose_key);
        let nonce = openssl::sha::sha256(&signed_data(&data, &client_data_hash()));
        let cert = TestAuthenticator::new().certificate_der(&CertificateOptions::apple(&nonce));
        let statement = load(&data, cert);

        let err = AppleAttestationStatementSupport::new()
            .is_valid(&client_data_hash(), &statement, &data)
            .unwrap_err();
        assert!(matches!(&err, AttestError::Verification(msg) if msg == "Unsupported key type"));
    }

    #[test]
    fn test_load_requires_x5c() {
        let (_, data, _) = fixture();
        let support = AppleAttestationStatementSupport::new();

        let missing = attestation_object("apple", vec![], &data);
        assert!(matches!(
            support.load(&missing),
            Err(AttestError::Loading(_))
        ));

        let empty = attestation_object("apple", vec![("x5c", Value::Array(vec![]))], &data);
        assert!(matches!(support.load(&empty), Err(AttestError::Loading(_))));
    }

    #[test]
    fn test_certificate_trust_path_rejected() {
        let (_, data, _) = fixture();
        let statement = AttestationStatement::basic("apple", Default::default(), vec![]);
        assert!(AppleAttestationStatementSupport::new()
            .is_valid(&client_data_hash(), &statement, &data)
            .is_err());
    }
}
