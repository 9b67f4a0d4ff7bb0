use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    /// Malformed metadata input; the message names the offending field.
    #[error("{0}")]
    StatementLoading(String),

    #[error("Stale metadata BLOB: current no={current}, offered no={offered}")]
    StaleSnapshot { current: u64, offered: u64 },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl MetadataError {
    pub(crate) fn loading(msg: impl Into<String>) -> Self {
        Self::StatementLoading(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;
