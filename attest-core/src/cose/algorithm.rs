//! COSE signature algorithms and the manager that resolves them by id.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use openssl::hash::MessageDigest;
use openssl::pkey::{PKeyRef, Public};
use openssl::rsa::Padding;
use openssl::sign::{RsaPssSaltlen, Verifier};
use openssl::x509::X509Ref;

use crate::cose::{CoseKey, CoseKeyParams, EcCurve, KeyType};
use crate::error::{AttestError, Result};

pub const ES256: i64 = -7;
pub const EDDSA: i64 = -8;
pub const ES384: i64 = -35;
pub const ES512: i64 = -36;
pub const PS256: i64 = -37;
pub const PS384: i64 = -38;
pub const PS512: i64 = -39;
pub const ES256K: i64 = -47;
pub const RS256: i64 = -257;
pub const RS384: i64 = -258;
pub const RS512: i64 = -259;

/// Every algorithm id the default manager knows.
pub const DEFAULT_ALGORITHMS: [i64; 11] = [
    ES256, ES384, ES512, ES256K, EDDSA, RS256, RS384, RS512, PS256, PS384, PS512,
];

/// Hash function paired with a signature scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    fn message_digest(self) -> MessageDigest {
        match self {
            Self::Sha256 => MessageDigest::sha256(),
            Self::Sha384 => MessageDigest::sha384(),
            Self::Sha512 => MessageDigest::sha512(),
        }
    }
}

/// Signature encoding an algorithm consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureEncoding {
    /// DER `Ecdsa-Sig-Value`; each integer is at most `component_len` bytes.
    EcdsaDer { component_len: usize },
    /// Bytes are verified as received.
    Opaque,
}

/// OpenSSL verification scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationScheme {
    /// Digest then verify with the key's native scheme (ECDSA or RSASSA-PKCS1-v1_5).
    Digest(HashAlgorithm),
    /// RSASSA-PSS with MGF1 over the same digest and a digest-length salt.
    RsaPss(HashAlgorithm),
    /// Pure EdDSA over the message.
    EdDsa,
}

/// A signature algorithm identified by its COSE id.
pub trait SignatureAlgorithm: Send + Sync + fmt::Debug {
    fn identifier(&self) -> i64;

    fn signature_encoding(&self) -> SignatureEncoding {
        SignatureEncoding::Opaque
    }

    /// Verify `signature` over `data` with a COSE public key.
    ///
    /// A key of the wrong family is an error; a signature that does not
    /// verify is `Ok(false)`.
    fn verify(&self, data: &[u8], key: &CoseKey, signature: &[u8]) -> Result<bool>;
}

#[derive(Debug, Clone, Copy)]
pub struct Ecdsa {
    id: i64,
    curve: EcCurve,
    hash: HashAlgorithm,
}

impl Ecdsa {
    pub fn es256() -> Self {
        Self {
            id: ES256,
            curve: EcCurve::P256,
            hash: HashAlgorithm::Sha256,
        }
    }

    pub fn es384() -> Self {
        Self {
            id: ES384,
            curve: EcCurve::P384,
            hash: HashAlgorithm::Sha384,
        }
    }

    pub fn es512() -> Self {
        Self {
            id: ES512,
            curve: EcCurve::P521,
            hash: HashAlgorithm::Sha512,
        }
    }

    pub fn es256k() -> Self {
        Self {
            id: ES256K,
            curve: EcCurve::Secp256k1,
            hash: HashAlgorithm::Sha256,
        }
    }
}

impl SignatureAlgorithm for Ecdsa {
    fn identifier(&self) -> i64 {
        self.id
    }

    fn signature_encoding(&self) -> SignatureEncoding {
        SignatureEncoding::EcdsaDer {
            component_len: self.curve.component_len(),
        }
    }

    fn verify(&self, data: &[u8], key: &CoseKey, signature: &[u8]) -> Result<bool> {
        match key.params() {
            CoseKeyParams::Ec2 { curve, .. } if *curve == self.curve => {}
            CoseKeyParams::Ec2 { curve, .. } => {
                return Err(AttestError::Verification(format!(
                    "Algorithm {} cannot be used with curve {:?}",
                    self.id, curve
                )))
            }
            _ => return Err(family_mismatch(self.id, key)),
        }
        let pkey = key.to_pkey()?;
        verify_with_key(VerificationScheme::Digest(self.hash), &pkey, data, signature)
    }
}

/// RSASSA-PKCS1-v1_5.
#[derive(Debug, Clone, Copy)]
pub struct Rsa {
    id: i64,
    hash: HashAlgorithm,
}

impl Rsa {
    pub fn rs256() -> Self {
        Self {
            id: RS256,
            hash: HashAlgorithm::Sha256,
        }
    }

    pub fn rs384() -> Self {
        Self {
            id: RS384,
            hash: HashAlgorithm::Sha384,
        }
    }

    pub fn rs512() -> Self {
        Self {
            id: RS512,
            hash: HashAlgorithm::Sha512,
        }
    }
}

impl SignatureAlgorithm for Rsa {
    fn identifier(&self) -> i64 {
        self.id
    }

    fn verify(&self, data: &[u8], key: &CoseKey, signature: &[u8]) -> Result<bool> {
        if key.key_type() != KeyType::Rsa {
            return Err(family_mismatch(self.id, key));
        }
        let pkey = key.to_pkey()?;
        verify_with_key(VerificationScheme::Digest(self.hash), &pkey, data, signature)
    }
}

/// RSASSA-PSS.
#[derive(Debug, Clone, Copy)]
pub struct RsaPss {
    id: i64,
    hash: HashAlgorithm,
}

impl RsaPss {
    pub fn ps256() -> Self {
        Self {
            id: PS256,
            hash: HashAlgorithm::Sha256,
        }
    }

    pub fn ps384() -> Self {
        Self {
            id: PS384,
            hash: HashAlgorithm::Sha384,
        }
    }

    pub fn ps512() -> Self {
        Self {
            id: PS512,
            hash: HashAlgorithm::Sha512,
        }
    }
}

impl SignatureAlgorithm for RsaPss {
    fn identifier(&self) -> i64 {
        self.id
    }

    fn verify(&self, data: &[u8], key: &CoseKey, signature: &[u8]) -> Result<bool> {
        if key.key_type() != KeyType::Rsa {
            return Err(family_mismatch(self.id, key));
        }
        let pkey = key.to_pkey()?;
        verify_with_key(VerificationScheme::RsaPss(self.hash), &pkey, data, signature)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EdDsa;

impl SignatureAlgorithm for EdDsa {
    fn identifier(&self) -> i64 {
        EDDSA
    }

    fn verify(&self, data: &[u8], key: &CoseKey, signature: &[u8]) -> Result<bool> {
        if key.key_type() != KeyType::Okp {
            return Err(family_mismatch(EDDSA, key));
        }
        let pkey = key.to_pkey()?;
        verify_with_key(VerificationScheme::EdDsa, &pkey, data, signature)
    }
}

fn family_mismatch(id: i64, key: &CoseKey) -> AttestError {
    AttestError::Verification(format!(
        "Algorithm {} cannot be used with a {:?} key",
        id,
        key.key_type()
    ))
}

/// Registry of signature algorithms keyed by COSE id.
#[derive(Debug, Default, Clone)]
pub struct AlgorithmManager {
    algorithms: HashMap<i64, Arc<dyn SignatureAlgorithm>>,
}

impl AlgorithmManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager with every built-in algorithm registered.
    pub fn with_defaults() -> Self {
        let mut manager = Self::new();
        for id in DEFAULT_ALGORITHMS {
            if let Some(algorithm) = builtin(id) {
                manager.add(algorithm);
            }
        }
        manager
    }

    pub fn add(&mut self, algorithm: Arc<dyn SignatureAlgorithm>) -> &mut Self {
        self.algorithms.insert(algorithm.identifier(), algorithm);
        self
    }

    pub fn get(&self, id: i64) -> Option<Arc<dyn SignatureAlgorithm>> {
        self.algorithms.get(&id).cloned()
    }

    pub fn has(&self, id: i64) -> bool {
        self.algorithms.contains_key(&id)
    }

    pub fn identifiers(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.algorithms.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Built-in implementation for a COSE algorithm id.
pub fn builtin(id: i64) -> Option<Arc<dyn SignatureAlgorithm>> {
    let algorithm: Arc<dyn SignatureAlgorithm> = match id {
        ES256 => Arc::new(Ecdsa::es256()),
        ES384 => Arc::new(Ecdsa::es384()),
        ES512 => Arc::new(Ecdsa::es512()),
        ES256K => Arc::new(Ecdsa::es256k()),
        EDDSA => Arc::new(EdDsa),
        RS256 => Arc::new(Rsa::rs256()),
        RS384 => Arc::new(Rsa::rs384()),
        RS512 => Arc::new(Rsa::rs512()),
        PS256 => Arc::new(RsaPss::ps256()),
        PS384 => Arc::new(RsaPss::ps384()),
        PS512 => Arc::new(RsaPss::ps512()),
        _ => return None,
    };
    Some(algorithm)
}

/// Scheme used to check a signature against a certificate's public key.
pub fn certificate_algorithm(cose_id: i64) -> Result<VerificationScheme> {
    let scheme = match cose_id {
        ES256 | ES256K | RS256 => VerificationScheme::Digest(HashAlgorithm::Sha256),
        ES384 | RS384 => VerificationScheme::Digest(HashAlgorithm::Sha384),
        ES512 | RS512 => VerificationScheme::Digest(HashAlgorithm::Sha512),
        PS256 => VerificationScheme::RsaPss(HashAlgorithm::Sha256),
        PS384 => VerificationScheme::RsaPss(HashAlgorithm::Sha384),
        PS512 => VerificationScheme::RsaPss(HashAlgorithm::Sha512),
        EDDSA => VerificationScheme::EdDsa,
        other => {
            return Err(AttestError::Verification(format!(
                "The algorithm \"{}\" is not supported",
                other
            )))
        }
    };
    Ok(scheme)
}

/// Verify `signature` over `data` with the certificate's public key.
pub fn verify_with_certificate(
    scheme: VerificationScheme,
    certificate: &X509Ref,
    data: &[u8],
    signature: &[u8],
) -> Result<bool> {
    let pkey = certificate.public_key().map_err(|e| {
        AttestError::Verification(format!("Unable to read the certificate public key: {}", e))
    })?;
    verify_with_key(scheme, &pkey, data, signature)
}

/// Run an OpenSSL verification.
///
/// OpenSSL reports an undecodable signature as an error; it is a failed
/// verification like any other.
pub fn verify_with_key(
    scheme: VerificationScheme,
    pkey: &PKeyRef<Public>,
    data: &[u8],
    signature: &[u8],
) -> Result<bool> {
    let setup = |e: openssl::error::ErrorStack| {
        AttestError::Verification(format!("Unable to initialise the verifier: {}", e))
    };

    let outcome = match scheme {
        VerificationScheme::Digest(hash) => {
            let mut verifier = Verifier::new(hash.message_digest(), pkey).map_err(setup)?;
            verifier.update(data).map_err(setup)?;
            verifier.verify(signature)
        }
        VerificationScheme::RsaPss(hash) => {
            let mut verifier = Verifier::new(hash.message_digest(), pkey).map_err(setup)?;
            verifier.set_rsa_padding(Padding::PKCS1_PSS).map_err(setup)?;
            verifier
                .set_rsa_pss_saltlen(RsaPssSaltlen::DIGEST_LENGTH)
                .map_err(setup)?;
            verifier
                .set_rsa_mgf1_md(hash.message_digest())
                .map_err(setup)?;
            verifier.update(data).map_err(setup)?;
            verifier.verify(signature)
        }
        VerificationScheme::EdDsa => {
            let mut verifier = Verifier::new_without_digest(pkey).map_err(setup)?;
            verifier.verify_oneshot(signature, data)
        }
    };

    match outcome {
        Ok(valid) => Ok(valid),
        Err(e) => {
            tracing::debug!(error = %e, "Signature rejected by OpenSSL");
            Ok(false)
        }
    }
}
