//! Error types for the distribution runner

use thiserror::Error;

use crate::amount::AmountError;

/// Result type alias
pub type Result<T> = std::result::Result<T, DistributionError>;

/// Main error type for a distribution run
#[derive(Debug, Error)]
pub enum DistributionError {
    /// Recipient source or settings missing, unreadable or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// A single recipient amount failed validation, the whole batch is aborted
    #[error("Amount error for recipient {recipient}: {source}")]
    Amount {
        recipient: String,
        #[source]
        source: AmountError,
    },

    /// The network rejected the batch before inclusion
    #[error("Submission error: {0}")]
    Submission(String),

    /// Waiting for inclusion failed, timed out or the transaction reverted
    #[error("Confirmation error: {0}")]
    Confirmation(String),

    /// RPC failure outside submission and confirmation
    #[error("Network error: {0}")]
    Network(String),
}

impl DistributionError {
    /// Short kind label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Amount { .. } => "amount",
            Self::Submission(_) => "submission",
            Self::Confirmation(_) => "confirmation",
            Self::Network(_) => "network",
        }
    }
}

impl From<config::ConfigError> for DistributionError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
