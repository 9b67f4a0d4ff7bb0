//! Status reports attached to metadata BLOB entries.

use serde::{Deserialize, Serialize};

/// FIDO authenticator status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthenticatorStatus {
    NotFidoCertified,
    FidoCertified,
    UserVerificationBypass,
    AttestationKeyCompromise,
    UserKeyRemoteCompromise,
    UserKeyPhysicalCompromise,
    UpdateAvailable,
    Revoked,
    SelfAssertionSubmitted,
    #[serde(rename = "FIDO_CERTIFIED_L1")]
    FidoCertifiedL1,
    #[serde(rename = "FIDO_CERTIFIED_L1plus")]
    FidoCertifiedL1Plus,
    #[serde(rename = "FIDO_CERTIFIED_L2")]
    FidoCertifiedL2,
    #[serde(rename = "FIDO_CERTIFIED_L2plus")]
    FidoCertifiedL2Plus,
    #[serde(rename = "FIDO_CERTIFIED_L3")]
    FidoCertifiedL3,
    #[serde(rename = "FIDO_CERTIFIED_L3plus")]
    FidoCertifiedL3Plus,
}

impl AuthenticatorStatus {
    /// Statuses under which the authenticator must not be trusted.
    pub fn is_compromised(&self) -> bool {
        matches!(
            self,
            Self::AttestationKeyCompromise
                | Self::UserVerificationBypass
                | Self::UserKeyRemoteCompromise
                | Self::UserKeyPhysicalCompromise
                | Self::Revoked
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub status: AuthenticatorStatus,
    /// ISO-8601 date since which the status applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_version: Option<u32>,
    /// Base64 DER certificate related to the status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification_descriptor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification_policy_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification_requirements_version: Option<String>,
}

impl StatusReport {
    pub fn new(status: AuthenticatorStatus) -> Self {
        Self {
            status,
            effective_date: None,
            authenticator_version: None,
            certificate: None,
            url: None,
            certification_descriptor: None,
            certificate_number: None,
            certification_policy_version: None,
            certification_requirements_version: None,
        }
    }

    pub fn is_compromised(&self) -> bool {
        self.status.is_compromised()
    }
}

/// Certification of one biometric modality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricStatusReport {
    pub cert_level: u16,
    pub modality: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification_descriptor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification_policy_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification_requirements_version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_codes() {
        let report: StatusReport = serde_json::from_value(json!({
            "status": "FIDO_CERTIFIED_L1plus",
            "effectiveDate": "2023-01-01"
        }))
        .unwrap();
        assert_eq!(report.status, AuthenticatorStatus::FidoCertifiedL1Plus);
        assert!(!report.is_compromised());

        let revoked: AuthenticatorStatus = serde_json::from_value(json!("REVOKED")).unwrap();
        assert!(revoked.is_compromised());
        assert_eq!(
            serde_json::to_value(AuthenticatorStatus::UserKeyPhysicalCompromise).unwrap(),
            json!("USER_KEY_PHYSICAL_COMPROMISE")
        );
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!(serde_json::from_value::<StatusReport>(json!({ "status": "MAYBE" })).is_err());
        assert!(serde_json::from_value::<StatusReport>(json!({ "url": "https://x" })).is_err());
    }

    #[test]
    fn test_absent_fields_not_serialized() {
        let report = StatusReport::new(AuthenticatorStatus::FidoCertified);
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json, json!({ "status": "FIDO_CERTIFIED" }));
    }
}
