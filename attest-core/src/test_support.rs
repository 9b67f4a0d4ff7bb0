//! Fixtures for unit tests: P-256 authenticators, attestation certificates
//! generated on the fly, authenticator data and attestation objects.

use ciborium::value::Value;
use openssl::asn1::{Asn1Object, Asn1OctetString, Asn1Time};
use openssl::bn::{BigNum, BigNumContext};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::sign::Signer;
use openssl::x509::extension::BasicConstraints;
use openssl::x509::{X509Builder, X509Extension, X509NameBuilder};

use crate::attestation_object::AttestationObject;
use crate::authenticator_data::AuthenticatorData;
use crate::cose::int;

pub const AAGUID_OID: &str = "1.3.6.1.4.1.45724.1.1.4";
pub const APPLE_NONCE_OID: &str = "1.2.840.113635.100.8.2";

pub const AAGUID: [u8; 16] = [
    0xf8, 0xa0, 0x11, 0xf3, 0x8c, 0x0a, 0x4d, 0x15, 0x80, 0x06, 0x17, 0x11, 0x1f, 0x9e, 0xdc, 0x7d,
];

/// What to put in a generated certificate.
#[derive(Debug, Clone)]
pub struct CertificateOptions {
    pub version: i32,
    pub organizational_unit: Option<&'static str>,
    pub ca: Option<bool>,
    pub aaguid: Option<[u8; 16]>,
    /// Appended after the AAGUID octet string.
    pub aaguid_trailer: Vec<u8>,
    pub apple_nonce: Option<Vec<u8>>,
}

impl CertificateOptions {
    /// A conforming packed attestation certificate.
    pub fn packed(aaguid: [u8; 16]) -> Self {
        Self {
            version: 2,
            organizational_unit: Some("Authenticator Attestation"),
            ca: Some(false),
            aaguid: Some(aaguid),
            aaguid_trailer: Vec::new(),
            apple_nonce: None,
        }
    }

    /// An Apple anonymous attestation certificate carrying `nonce`.
    pub fn apple(nonce: &[u8]) -> Self {
        Self {
            version: 2,
            organizational_unit: None,
            ca: None,
            aaguid: None,
            aaguid_trailer: Vec::new(),
            apple_nonce: Some(nonce.to_vec()),
        }
    }
}

/// A software P-256 key standing in for an authenticator.
pub struct TestAuthenticator {
    key: PKey<Private>,
    x: Vec<u8>,
    y: Vec<u8>,
}

impl TestAuthenticator {
    pub fn new() -> Self {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let ec = EcKey::generate(&group).unwrap();
        let mut ctx = BigNumContext::new().unwrap();
        let mut x = BigNum::new().unwrap();
        let mut y = BigNum::new().unwrap();
        ec.public_key()
            .affine_coordinates(&group, &mut x, &mut y, &mut ctx)
            .unwrap();

        Self {
            key: PKey::from_ec_key(ec).unwrap(),
            x: x.to_vec_padded(32).unwrap(),
            y: y.to_vec_padded(32).unwrap(),
        }
    }

    /// COSE EC2 key declaring `alg`.
    pub fn cose_key(&self, alg: i64) -> Vec<u8> {
        let value = Value::Map(vec![
            (int(1), int(2)),
            (int(3), int(alg)),
            (int(-1), int(1)),
            (int(-2), Value::Bytes(self.x.clone())),
            (int(-3), Value::Bytes(self.y.clone())),
        ]);
        encode(&value)
    }

    pub fn public_key_pem(&self) -> String {
        String::from_utf8(self.key.public_key_to_pem().unwrap()).unwrap()
    }

    /// ES256 signature, DER encoded.
    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        let mut signer = Signer::new(MessageDigest::sha256(), &self.key).unwrap();
        signer.update(data).unwrap();
        signer.sign_to_vec().unwrap()
    }

    /// Self-signed certificate over this authenticator's key.
    pub fn certificate_der(&self, options: &CertificateOptions) -> Vec<u8> {
        let mut builder = X509Builder::new().unwrap();
        builder.set_version(options.version).unwrap();
        let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
        builder.set_serial_number(&serial).unwrap();

        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("C", "US").unwrap();
        name.append_entry_by_text("O", "Attest Test Vendor").unwrap();
        if let Some(unit) = options.organizational_unit {
            name.append_entry_by_text("OU", unit).unwrap();
        }
        name.append_entry_by_text("CN", "Attest Test Authenticator").unwrap();
        let name = name.build();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();

        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(365).unwrap())
            .unwrap();
        builder.set_pubkey(&self.key).unwrap();

        match options.ca {
            Some(true) => builder
                .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
                .unwrap(),
            Some(false) => builder
                .append_extension(BasicConstraints::new().build().unwrap())
                .unwrap(),
            None => {}
        }
        if let Some(aaguid) = options.aaguid {
            let mut value = vec![0x04, 0x10];
            value.extend_from_slice(&aaguid);
            value.extend_from_slice(&options.aaguid_trailer);
            builder
                .append_extension(custom_extension(AAGUID_OID, &value))
                .unwrap();
        }
        if let Some(nonce) = &options.apple_nonce {
            let mut value = vec![0x30, 0x24, 0xa1, 0x22, 0x04, 0x20];
            value.extend_from_slice(nonce);
            builder
                .append_extension(custom_extension(APPLE_NONCE_OID, &value))
                .unwrap();
        }

        builder.sign(&self.key, MessageDigest::sha256()).unwrap();
        builder.build().to_der().unwrap()
    }
}

fn custom_extension(oid: &str, value: &[u8]) -> X509Extension {
    let oid = Asn1Object::from_str(oid).unwrap();
    let contents = Asn1OctetString::new_from_bytes(value).unwrap();
    X509Extension::new_from_der(&oid, false, &contents).unwrap()
}

pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    ciborium::into_writer(value, &mut out).unwrap();
    out
}

/// Authenticator data with attested credential data (flags UP | UV | AT).
pub fn auth_data_bytes(aaguid: [u8; 16], cose_key: &[u8], sign_count: u32) -> Vec<u8> {
    let mut data = vec![0x49; 32];
    data.push(0x45);
    data.extend_from_slice(&sign_count.to_be_bytes());
    data.extend_from_slice(&aaguid);
    let credential_id = [0xCA, 0xFE, 0xBA, 0xBE];
    data.extend_from_slice(&(credential_id.len() as u16).to_be_bytes());
    data.extend_from_slice(&credential_id);
    data.extend_from_slice(cose_key);
    data
}

pub fn auth_data(aaguid: [u8; 16], cose_key: &[u8]) -> AuthenticatorData {
    AuthenticatorData::from_bytes(&auth_data_bytes(aaguid, cose_key, 0)).unwrap()
}

pub fn client_data_hash() -> Vec<u8> {
    openssl::sha::sha256(br#"{"type":"webauthn.create","challenge":"dGVzdA"}"#).to_vec()
}

pub fn signed_data(auth_data: &AuthenticatorData, client_data_hash: &[u8]) -> Vec<u8> {
    [auth_data.raw(), client_data_hash].concat()
}

pub fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

/// Attestation object with the given `attStmt` entries.
pub fn attestation_object(
    fmt: &str,
    att_stmt: Vec<(&str, Value)>,
    auth_data: &AuthenticatorData,
) -> AttestationObject {
    let statement = Value::Map(
        att_stmt
            .into_iter()
            .map(|(key, value)| (text(key), value))
            .collect(),
    );
    let object = Value::Map(vec![
        (text("fmt"), text(fmt)),
        (text("attStmt"), statement),
        (text("authData"), Value::Bytes(auth_data.raw().to_vec())),
    ]);
    AttestationObject::from_cbor(&encode(&object)).unwrap()
}
