//! Error types for PatientChain

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainError {
    #[error("Chain is empty")]
    EmptyChain,
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Proof-of-work search cancelled")]
    Cancelled,
    #[error("Invalid block linkage at block {index}")]
    InvalidBlockLinkage { index: u64 },
    #[error("Invalid proof of work at block {index}")]
    InvalidProofOfWork { index: u64 },
    #[error("Invalid block: {0}")]
    InvalidBlock(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::Config(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
