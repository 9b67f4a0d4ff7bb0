//! Authenticator data as produced by a WebAuthn authenticator.
//!
//! The raw bytes are kept verbatim: every signature and nonce in the
//! attestation formats is computed over them, never over a re-encoding.

use ciborium::value::Value;
use uuid::Uuid;

use crate::error::{AttestError, Result};

const RP_ID_HASH_LEN: usize = 32;
const AAGUID_LEN: usize = 16;
/// rpIdHash (32) + flags (1) + signCount (4)
const FIXED_HEADER_LEN: usize = 37;

/// Authenticator data flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatorFlags(u8);

impl AuthenticatorFlags {
    pub const USER_PRESENT: u8 = 0x01;
    pub const USER_VERIFIED: u8 = 0x04;
    pub const BACKUP_ELIGIBLE: u8 = 0x08;
    pub const BACKUP_STATE: u8 = 0x10;
    pub const ATTESTED_CREDENTIAL_DATA: u8 = 0x40;
    pub const EXTENSION_DATA: u8 = 0x80;

    pub fn new(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn is_user_present(&self) -> bool {
        self.0 & Self::USER_PRESENT != 0
    }

    pub fn is_user_verified(&self) -> bool {
        self.0 & Self::USER_VERIFIED != 0
    }

    pub fn is_backup_eligible(&self) -> bool {
        self.0 & Self::BACKUP_ELIGIBLE != 0
    }

    pub fn is_backed_up(&self) -> bool {
        self.0 & Self::BACKUP_STATE != 0
    }

    pub fn has_attested_credential_data(&self) -> bool {
        self.0 & Self::ATTESTED_CREDENTIAL_DATA != 0
    }

    pub fn has_extensions(&self) -> bool {
        self.0 & Self::EXTENSION_DATA != 0
    }
}

/// Credential data attested at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedCredentialData {
    aaguid: Uuid,
    credential_id: Vec<u8>,
    credential_public_key: Vec<u8>,
}

impl AttestedCredentialData {
    pub fn new(aaguid: Uuid, credential_id: Vec<u8>, credential_public_key: Vec<u8>) -> Self {
        Self {
            aaguid,
            credential_id,
            credential_public_key,
        }
    }

    pub fn aaguid(&self) -> &Uuid {
        &self.aaguid
    }

    pub fn credential_id(&self) -> &[u8] {
        &self.credential_id
    }

    /// COSE-encoded credential public key, exactly as sent by the authenticator.
    pub fn credential_public_key(&self) -> &[u8] {
        &self.credential_public_key
    }
}

/// Parsed authenticator data with its raw encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatorData {
    raw: Vec<u8>,
    rp_id_hash: [u8; 32],
    flags: AuthenticatorFlags,
    sign_count: u32,
    attested_credential_data: Option<AttestedCredentialData>,
    extensions: Option<Value>,
}

impl AuthenticatorData {
    /// Build authenticator data from already-decoded parts.
    ///
    /// `raw` must be the exact byte string the authenticator signed.
    pub fn new(
        raw: Vec<u8>,
        rp_id_hash: [u8; 32],
        flags: AuthenticatorFlags,
        sign_count: u32,
        attested_credential_data: Option<AttestedCredentialData>,
        extensions: Option<Value>,
    ) -> Self {
        Self {
            raw,
            rp_id_hash,
            flags,
            sign_count,
            attested_credential_data,
            extensions,
        }
    }

    /// Parse the binary authenticator data structure.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() < FIXED_HEADER_LEN {
            return Err(AttestError::loading("Authenticator data too short"));
        }

        let mut rp_id_hash = [0u8; RP_ID_HASH_LEN];
        rp_id_hash.copy_from_slice(&raw[..RP_ID_HASH_LEN]);
        let flags = AuthenticatorFlags::new(raw[RP_ID_HASH_LEN]);
        let sign_count = u32::from_be_bytes([raw[33], raw[34], raw[35], raw[36]]);

        let mut rest = &raw[FIXED_HEADER_LEN..];

        let attested_credential_data = if flags.has_attested_credential_data() {
            Some(read_attested_credential_data(&mut rest)?)
        } else {
            None
        };

        let extensions = if flags.has_extensions() {
            let value: Value = ciborium::from_reader(&mut rest)
                .map_err(|e| AttestError::Loading(format!("Invalid extension data: {e}")))?;
            if !value.is_map() {
                return Err(AttestError::loading("Extension data must be a CBOR map"));
            }
            Some(value)
        } else {
            None
        };

        if !rest.is_empty() {
            return Err(AttestError::loading(
                "Invalid authenticator data. Presence of extra bytes.",
            ));
        }

        Ok(Self {
            raw: raw.to_vec(),
            rp_id_hash,
            flags,
            sign_count,
            attested_credential_data,
            extensions,
        })
    }

    /// The exact bytes the authenticator produced.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn rp_id_hash(&self) -> &[u8; 32] {
        &self.rp_id_hash
    }

    pub fn flags(&self) -> AuthenticatorFlags {
        self.flags
    }

    pub fn sign_count(&self) -> u32 {
        self.sign_count
    }

    pub fn attested_credential_data(&self) -> Option<&AttestedCredentialData> {
        self.attested_credential_data.as_ref()
    }

    pub fn extensions(&self) -> Option<&Value> {
        self.extensions.as_ref()
    }
}

fn read_attested_credential_data(rest: &mut &[u8]) -> Result<AttestedCredentialData> {
    let input: &[u8] = *rest;
    if input.len() < AAGUID_LEN + 2 {
        return Err(AttestError::loading(
            "Authenticator data too short for attested credential data",
        ));
    }

    let mut aaguid = [0u8; AAGUID_LEN];
    aaguid.copy_from_slice(&input[..AAGUID_LEN]);
    let id_len = u16::from_be_bytes([input[AAGUID_LEN], input[AAGUID_LEN + 1]]) as usize;

    let id_start = AAGUID_LEN + 2;
    if input.len() < id_start + id_len {
        return Err(AttestError::loading(
            "Authenticator data too short for credential ID",
        ));
    }
    let credential_id = input[id_start..id_start + id_len].to_vec();

    // The COSE key is a single CBOR item; its length is only known once decoded.
    let key_bytes = &input[id_start + id_len..];
    let mut cursor = key_bytes;
    let _: Value = ciborium::from_reader(&mut cursor)
        .map_err(|e| AttestError::Loading(format!("Invalid credential public key: {e}")))?;
    let consumed = key_bytes.len() - cursor.len();

    *rest = cursor;

    Ok(AttestedCredentialData::new(
        Uuid::from_bytes(aaguid),
        credential_id,
        key_bytes[..consumed].to_vec(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &Value) -> Vec<u8> {
        let mut out = Vec::new();
        ciborium::into_writer(value, &mut out).expect("encode");
        out
    }

    fn sample_key() -> Vec<u8> {
        encode(&Value::Map(vec![
            (Value::Integer(1i64.into()), Value::Integer(2i64.into())),
            (Value::Integer(3i64.into()), Value::Integer((-7i64).into())),
        ]))
    }

    fn auth_data(flags: u8, key: &[u8], trailer: &[u8]) -> Vec<u8> {
        let mut data = vec![0xAA; 32];
        data.push(flags);
        data.extend_from_slice(&7u32.to_be_bytes());
        if flags & AuthenticatorFlags::ATTESTED_CREDENTIAL_DATA != 0 {
            data.extend_from_slice(&[0x11; 16]);
            data.extend_from_slice(&[0x00, 0x04]);
            data.extend_from_slice(&[0xC1, 0xC2, 0xC3, 0xC4]);
            data.extend_from_slice(key);
        }
        data.extend_from_slice(trailer);
        data
    }

    #[test]
    fn test_parse_without_credential_data() {
        let raw = auth_data(0x05, &[], &[]);
        let parsed = AuthenticatorData::from_bytes(&raw).unwrap();

        assert_eq!(parsed.raw(), raw.as_slice());
        assert_eq!(parsed.sign_count(), 7);
        assert!(parsed.flags().is_user_present());
        assert!(parsed.flags().is_user_verified());
        assert!(parsed.attested_credential_data().is_none());
    }

    #[test]
    fn test_parse_with_credential_data() {
        let key = sample_key();
        let raw = auth_data(0x41, &key, &[]);
        let parsed = AuthenticatorData::from_bytes(&raw).unwrap();

        let acd = parsed.attested_credential_data().expect("credential data");
        assert_eq!(acd.aaguid().as_bytes(), &[0x11; 16]);
        assert_eq!(acd.credential_id(), &[0xC1, 0xC2, 0xC3, 0xC4]);
        assert_eq!(acd.credential_public_key(), key.as_slice());
    }

    #[test]
    fn test_parse_with_extensions() {
        let key = sample_key();
        let ext = encode(&Value::Map(vec![(
            Value::Text("credProtect".into()),
            Value::Integer(2i64.into()),
        )]));
        let raw = auth_data(0xC1, &key, &ext);
        let parsed = AuthenticatorData::from_bytes(&raw).unwrap();

        assert!(parsed.extensions().is_some());
        assert_eq!(
            parsed.attested_credential_data().unwrap().credential_public_key(),
            key.as_slice()
        );
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let key = sample_key();
        let raw = auth_data(0x41, &key, &[0x00]);
        let err = AuthenticatorData::from_bytes(&raw).unwrap_err();
        assert!(matches!(err, AttestError::Loading(_)));
    }

    #[test]
    fn test_truncated_rejected() {
        assert!(AuthenticatorData::from_bytes(&[0u8; 36]).is_err());

        let mut raw = auth_data(0x41, &sample_key(), &[]);
        raw.truncate(40);
        assert!(matches!(
            AuthenticatorData::from_bytes(&raw),
            Err(AttestError::Loading(_))
        ));
    }
}
