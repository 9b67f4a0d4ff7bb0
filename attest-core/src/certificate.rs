//! Certificate toolbox: DER to PEM armor and attestation certificate inspection.

use base64::{engine::general_purpose::STANDARD, Engine};
use openssl::x509::X509;
use x509_parser::certificate::X509Certificate;

use crate::error::{AttestError, Result};

const PEM_LINE_LEN: usize = 64;

/// Wrap a DER certificate in PEM armor. The bytes are not parsed.
pub fn convert_der_to_pem(der: &[u8]) -> String {
    let encoded = STANDARD.encode(der);
    let mut pem = String::with_capacity(encoded.len() + encoded.len() / PEM_LINE_LEN + 64);
    pem.push_str("-----BEGIN CERTIFICATE-----\n");
    for line in encoded.as_bytes().chunks(PEM_LINE_LEN) {
        // base64 output is ASCII, so every chunk is valid UTF-8
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str("-----END CERTIFICATE-----\n");
    pem
}

pub fn convert_all_der_to_pem<I, B>(certificates: I) -> Vec<String>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    certificates
        .into_iter()
        .map(|der| convert_der_to_pem(der.as_ref()))
        .collect()
}

/// A leaf attestation certificate loaded for inspection.
#[derive(Clone)]
pub struct AttestationCertificate {
    x509: X509,
    der: Vec<u8>,
}

impl AttestationCertificate {
    pub fn from_pem(pem: &str) -> Result<Self> {
        let x509 = X509::from_pem(pem.as_bytes())
            .map_err(|e| AttestError::Verification(format!("Invalid certificate: {}", e)))?;
        let der = x509
            .to_der()
            .map_err(|e| AttestError::Verification(format!("Invalid certificate: {}", e)))?;
        // Reject anything x509-parser cannot read up front.
        parse(&der)?;
        Ok(Self { x509, der })
    }

    pub fn x509(&self) -> &X509 {
        &self.x509
    }

    /// Raw X.509 version field: 2 for a v3 certificate.
    pub fn version(&self) -> Result<u32> {
        Ok(parse(&self.der)?.version().0)
    }

    pub fn subject_organizational_units(&self) -> Result<Vec<String>> {
        let cert = parse(&self.der)?;
        let units = cert
            .subject()
            .iter_organizational_unit()
            .filter_map(|attr| attr.as_str().ok())
            .map(str::to_string)
            .collect();
        Ok(units)
    }

    /// CA flag of the basic constraints extension, `None` when the extension is absent.
    pub fn basic_constraints_ca(&self) -> Result<Option<bool>> {
        let cert = parse(&self.der)?;
        let constraints = cert.basic_constraints().map_err(|e| {
            AttestError::Verification(format!("Invalid basic constraints extension: {}", e))
        })?;
        Ok(constraints.map(|ext| ext.value.ca))
    }

    /// Raw value of the extension with the given dotted OID.
    pub fn extension(&self, oid: &str) -> Result<Option<Vec<u8>>> {
        let cert = parse(&self.der)?;
        let value = cert
            .extensions()
            .iter()
            .find(|ext| ext.oid.to_id_string() == oid)
            .map(|ext| ext.value.to_vec());
        Ok(value)
    }

    /// SubjectPublicKeyInfo PEM of the certificate key.
    pub fn public_key_pem(&self) -> Result<String> {
        let pem = self
            .x509
            .public_key()
            .and_then(|key| key.public_key_to_pem())
            .map_err(|e| {
                AttestError::Verification(format!(
                    "Unable to read the certificate public key: {}",
                    e
                ))
            })?;
        String::from_utf8(pem)
            .map_err(|e| AttestError::Verification(format!("Invalid PEM encoding: {}", e)))
    }
}

impl std::fmt::Debug for AttestationCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttestationCertificate")
            .field("der_len", &self.der.len())
            .finish_non_exhaustive()
    }
}

fn parse(der: &[u8]) -> Result<X509Certificate<'_>> {
    x509_parser::parse_x509_certificate(der)
        .map(|(_, cert)| cert)
        .map_err(|e| AttestError::Verification(format!("Invalid certificate: {}", e)))
}
