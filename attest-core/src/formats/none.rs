use crate::attestation_object::AttestationObject;
use crate::authenticator_data::AuthenticatorData;
use crate::error::Result;
use crate::formats::AttestationStatementSupport;
use crate::statement::AttestationStatement;

/// The `none` format: the authenticator provides no attestation.
#[derive(Debug, Clone, Default)]
pub struct NoneAttestationStatementSupport;

impl NoneAttestationStatementSupport {
    pub fn new() -> Self {
        Self
    }
}

impl AttestationStatementSupport for NoneAttestationStatementSupport {
    fn name(&self) -> &'static str {
        "none"
    }

    fn load(&self, attestation: &AttestationObject) -> Result<AttestationStatement> {
        Ok(AttestationStatement::none(
            attestation.fmt(),
            attestation.att_stmt().clone(),
        ))
    }

    fn is_valid(
        &self,
        _client_data_hash: &[u8],
        statement: &AttestationStatement,
        _auth_data: &AuthenticatorData,
    ) -> Result<bool> {
        // Any field at all means the authenticator sent attestation data under "none".
        Ok(statement.att_stmt().is_empty())
    }
}
