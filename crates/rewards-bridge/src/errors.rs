//! Bridge error types (thiserror).

pub mod recovery;

pub use recovery::RecoveryAction;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Rewards service unavailable: {reason}")]
    BackendUnavailable { reason: String },

    #[error("No publisher info cached for tab {tab_id}")]
    UnknownTab { tab_id: i64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type BridgeResult<T> = Result<T, BridgeError>;
