use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttestError {
    #[error("Unsupported attestation format: {0}")]
    UnsupportedFormat(String),

    #[error("Attestation loading error: {0}")]
    Loading(String),

    #[error("Attestation verification error: {0}")]
    Verification(String),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Invalid counter: stored={stored}, current={current}")]
    Counter { stored: u32, current: u32 },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AttestError {
    pub(crate) fn loading(msg: impl Into<String>) -> Self {
        Self::Loading(msg.into())
    }

    pub(crate) fn verification(msg: impl Into<String>) -> Self {
        Self::Verification(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AttestError>;
