use serde::{Deserialize, Serialize};

/// How the authenticity chain of an attestation statement was expressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrustPath {
    /// PEM certificate chain, leaf first.
    Certificate { x5c: Vec<String> },
    /// PEM certificate chain issued by an anonymization CA, leaf first.
    #[serde(rename = "anonymization_ca")]
    AnonymizationCA { x5c: Vec<String> },
    /// Identifier into an ECDAA issuer registry.
    EcdaaKeyId { ecdaa_key_id: Vec<u8> },
    /// Self attestation or no attestation.
    Empty,
}

impl TrustPath {
    /// Certificate chain for the certificate-bearing variants.
    pub fn certificates(&self) -> Option<&[String]> {
        match self {
            Self::Certificate { x5c } | Self::AnonymizationCA { x5c } => Some(x5c),
            Self::EcdaaKeyId { .. } | Self::Empty => None,
        }
    }

    /// Leaf certificate of the chain, if any.
    pub fn leaf(&self) -> Option<&str> {
        self.certificates()
            .and_then(|chain| chain.first())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}
