use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authenticator_data::AuthenticatorData;
use crate::error::{AttestError, Result};
use crate::statement::{AttestationStatement, AttestationType};
use crate::trust_path::TrustPath;

/// A registered credential as stored by the relying party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyCredentialSource {
    credential_id: Vec<u8>,
    user_handle: Vec<u8>,
    aaguid: Uuid,
    credential_public_key: Vec<u8>,
    trust_path: TrustPath,
    attestation_type: AttestationType,
    counter: u32,
}

impl PublicKeyCredentialSource {
    pub fn new(
        credential_id: Vec<u8>,
        user_handle: Vec<u8>,
        aaguid: Uuid,
        credential_public_key: Vec<u8>,
        trust_path: TrustPath,
        attestation_type: AttestationType,
        counter: u32,
    ) -> Self {
        Self {
            credential_id,
            user_handle,
            aaguid,
            credential_public_key,
            trust_path,
            attestation_type,
            counter,
        }
    }

    /// Build the credential record from a verified registration.
    pub fn from_registration(
        statement: &AttestationStatement,
        auth_data: &AuthenticatorData,
        user_handle: impl Into<Vec<u8>>,
    ) -> Result<Self> {
        let credential = auth_data
            .attested_credential_data()
            .ok_or_else(|| AttestError::verification("No attested credential available"))?;

        Ok(Self::new(
            credential.credential_id().to_vec(),
            user_handle.into(),
            *credential.aaguid(),
            credential.credential_public_key().to_vec(),
            statement.trust_path().clone(),
            statement.attestation_type(),
            auth_data.sign_count(),
        ))
    }

    pub fn credential_id(&self) -> &[u8] {
        &self.credential_id
    }

    pub fn user_handle(&self) -> &[u8] {
        &self.user_handle
    }

    pub fn aaguid(&self) -> &Uuid {
        &self.aaguid
    }

    pub fn credential_public_key(&self) -> &[u8] {
        &self.credential_public_key
    }

    pub fn trust_path(&self) -> &TrustPath {
        &self.trust_path
    }

    pub fn attestation_type(&self) -> AttestationType {
        self.attestation_type
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn set_counter(&mut self, counter: u32) {
        self.counter = counter;
    }
}
