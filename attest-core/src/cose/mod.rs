//! COSE public keys as carried in attested credential data.
//!
//! Keys are decoded from the CBOR map form (RFC 9053) and converted to
//! OpenSSL public keys for signature verification and PEM comparison.

pub mod algorithm;
pub mod signature;

use ciborium::value::{Integer, Value};
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::nid::Nid;
use openssl::pkey::{Id, PKey, Public};

use crate::error::{AttestError, Result};

const LABEL_KTY: i128 = 1;
const LABEL_ALG: i128 = 3;
const LABEL_CRV: i128 = -1;
const LABEL_X: i128 = -2;
const LABEL_Y: i128 = -3;
const LABEL_RSA_N: i128 = -1;
const LABEL_RSA_E: i128 = -2;

/// COSE key type (`kty`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Okp,
    Ec2,
    Rsa,
}

impl KeyType {
    fn from_cose(kty: i128) -> Result<Self> {
        match kty {
            1 => Ok(Self::Okp),
            2 => Ok(Self::Ec2),
            3 => Ok(Self::Rsa),
            other => Err(AttestError::Verification(format!(
                "Unsupported COSE key type: {}",
                other
            ))),
        }
    }
}

/// Elliptic curves usable with EC2 keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurve {
    P256,
    P384,
    P521,
    Secp256k1,
}

impl EcCurve {
    fn from_cose(crv: i128) -> Result<Self> {
        match crv {
            1 => Ok(Self::P256),
            2 => Ok(Self::P384),
            3 => Ok(Self::P521),
            8 => Ok(Self::Secp256k1),
            other => Err(AttestError::Verification(format!(
                "Unsupported EC2 curve: {}",
                other
            ))),
        }
    }

    pub fn cose_id(self) -> i64 {
        match self {
            Self::P256 => 1,
            Self::P384 => 2,
            Self::P521 => 3,
            Self::Secp256k1 => 8,
        }
    }

    pub fn nid(self) -> Nid {
        match self {
            Self::P256 => Nid::X9_62_PRIME256V1,
            Self::P384 => Nid::SECP384R1,
            Self::P521 => Nid::SECP521R1,
            Self::Secp256k1 => Nid::SECP256K1,
        }
    }

    /// Byte length of one coordinate, and of each half of a raw signature.
    pub fn component_len(self) -> usize {
        match self {
            Self::P256 | Self::Secp256k1 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }
}

/// Edwards curves usable with OKP keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OkpCurve {
    Ed25519,
    Ed448,
}

impl OkpCurve {
    fn from_cose(crv: i128) -> Result<Self> {
        match crv {
            6 => Ok(Self::Ed25519),
            7 => Ok(Self::Ed448),
            other => Err(AttestError::Verification(format!(
                "Unsupported OKP curve: {}",
                other
            ))),
        }
    }

    pub fn cose_id(self) -> i64 {
        match self {
            Self::Ed25519 => 6,
            Self::Ed448 => 7,
        }
    }

    fn key_len(self) -> usize {
        match self {
            Self::Ed25519 => 32,
            Self::Ed448 => 57,
        }
    }

    fn pkey_id(self) -> Id {
        match self {
            Self::Ed25519 => Id::ED25519,
            Self::Ed448 => Id::ED448,
        }
    }
}

/// Type-specific key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoseKeyParams {
    Ec2 { curve: EcCurve, x: Vec<u8>, y: Vec<u8> },
    Okp { curve: OkpCurve, x: Vec<u8> },
    Rsa { n: Vec<u8>, e: Vec<u8> },
}

/// A decoded COSE public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoseKey {
    alg: Option<i64>,
    params: CoseKeyParams,
}

impl CoseKey {
    pub fn new(alg: Option<i64>, params: CoseKeyParams) -> Self {
        Self { alg, params }
    }

    /// Decode a COSE key that must span the whole input.
    pub fn from_cbor_strict(bytes: &[u8]) -> Result<Self> {
        let mut cursor = bytes;
        let value: Value = ciborium::from_reader(&mut cursor).map_err(|e| {
            AttestError::Verification(format!("Unable to decode the public key: {}", e))
        })?;
        if !cursor.is_empty() {
            return Err(AttestError::verification(
                "Invalid public key. Presence of extra bytes.",
            ));
        }
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let entries = value.as_map().ok_or_else(|| {
            AttestError::verification(
                "The attested credential data does not contain a valid public key.",
            )
        })?;

        let int_param = |label: i128| -> Option<i128> {
            find(entries, label)
                .and_then(Value::as_integer)
                .map(i128::from)
        };
        let bytes_param = |label: i128, name: &str| -> Result<Vec<u8>> {
            find(entries, label)
                .and_then(Value::as_bytes)
                .cloned()
                .ok_or_else(|| {
                    AttestError::Verification(format!("Invalid COSE key: missing {}", name))
                })
        };

        let kty = int_param(LABEL_KTY)
            .ok_or_else(|| AttestError::verification("Invalid COSE key: missing kty"))?;

        let alg = match find(entries, LABEL_ALG) {
            None => None,
            Some(v) => Some(
                v.as_integer()
                    .and_then(|i| i64::try_from(i).ok())
                    .ok_or_else(|| AttestError::verification("Invalid COSE key: bad alg"))?,
            ),
        };

        let params = match KeyType::from_cose(kty)? {
            KeyType::Ec2 => {
                let curve = EcCurve::from_cose(
                    int_param(LABEL_CRV)
                        .ok_or_else(|| AttestError::verification("Invalid COSE key: missing crv"))?,
                )?;
                let x = bytes_param(LABEL_X, "x")?;
                let y = bytes_param(LABEL_Y, "y")?;
                if x.len() != curve.component_len() || y.len() != curve.component_len() {
                    return Err(AttestError::verification(
                        "Invalid COSE key: coordinate length does not match the curve",
                    ));
                }
                CoseKeyParams::Ec2 { curve, x, y }
            }
            KeyType::Okp => {
                let curve = OkpCurve::from_cose(
                    int_param(LABEL_CRV)
                        .ok_or_else(|| AttestError::verification("Invalid COSE key: missing crv"))?,
                )?;
                let x = bytes_param(LABEL_X, "x")?;
                if x.len() != curve.key_len() {
                    return Err(AttestError::verification(
                        "Invalid COSE key: public key length does not match the curve",
                    ));
                }
                CoseKeyParams::Okp { curve, x }
            }
            KeyType::Rsa => CoseKeyParams::Rsa {
                n: bytes_param(LABEL_RSA_N, "n")?,
                e: bytes_param(LABEL_RSA_E, "e")?,
            },
        };

        Ok(Self { alg, params })
    }

    /// Declared COSE algorithm, if the key carries one.
    pub fn alg(&self) -> Option<i64> {
        self.alg
    }

    pub fn params(&self) -> &CoseKeyParams {
        &self.params
    }

    pub fn key_type(&self) -> KeyType {
        match self.params {
            CoseKeyParams::Ec2 { .. } => KeyType::Ec2,
            CoseKeyParams::Okp { .. } => KeyType::Okp,
            CoseKeyParams::Rsa { .. } => KeyType::Rsa,
        }
    }

    pub fn to_pkey(&self) -> Result<PKey<Public>> {
        let invalid = |e: openssl::error::ErrorStack| {
            AttestError::Verification(format!("Invalid public key material: {}", e))
        };

        match &self.params {
            CoseKeyParams::Ec2 { curve, x, y } => {
                let group = EcGroup::from_curve_name(curve.nid()).map_err(invalid)?;
                let x = BigNum::from_slice(x).map_err(invalid)?;
                let y = BigNum::from_slice(y).map_err(invalid)?;
                let ec_key =
                    EcKey::from_public_key_affine_coordinates(&group, &x, &y).map_err(invalid)?;
                ec_key.check_key().map_err(invalid)?;
                PKey::from_ec_key(ec_key).map_err(invalid)
            }
            CoseKeyParams::Okp { curve, x } => {
                PKey::public_key_from_raw_bytes(x, curve.pkey_id()).map_err(invalid)
            }
            CoseKeyParams::Rsa { n, e } => {
                let n = BigNum::from_slice(n).map_err(invalid)?;
                let e = BigNum::from_slice(e).map_err(invalid)?;
                let rsa = openssl::rsa::Rsa::from_public_components(n, e).map_err(invalid)?;
                PKey::from_rsa(rsa).map_err(invalid)
            }
        }
    }

    /// SubjectPublicKeyInfo PEM of this key.
    pub fn to_pem(&self) -> Result<String> {
        let pem = self.to_pkey()?.public_key_to_pem().map_err(|e| {
            AttestError::Verification(format!("Unable to encode the public key: {}", e))
        })?;
        String::from_utf8(pem)
            .map_err(|e| AttestError::Verification(format!("Invalid PEM encoding: {}", e)))
    }
}

fn find(entries: &[(Value, Value)], label: i128) -> Option<&Value> {
    entries.iter().find_map(|(k, v)| match k {
        Value::Integer(i) if i128::from(*i) == label => Some(v),
        _ => None,
    })
}

/// Encode an integer label or value the way COSE maps carry them.
pub(crate) fn int(value: i64) -> Value {
    Value::Integer(Integer::from(value))
}
