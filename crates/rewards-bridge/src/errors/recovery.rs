//! RecoveryAction: what the UI should do when a bridge or ledger operation fails.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::BridgeError;
use crate::types::LedgerResult;

/// Recommended recovery action for a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecoveryAction {
    /// Retry the operation (transient ledger condition).
    Retry,
    /// Keep showing cached data; the ledger is not serving requests.
    Fallback,
    /// Surface to the user; the request itself was rejected.
    Escalate,
    /// Nothing to do.
    Ignore,
}

impl RecoveryAction {
    /// Determine the recommended recovery action for a BridgeError.
    pub fn for_error(error: &BridgeError) -> Self {
        match error {
            BridgeError::BackendUnavailable { .. } => Self::Fallback,
            BridgeError::UnknownTab { .. } => Self::Ignore,
            BridgeError::InvalidInput(_) => Self::Escalate,
            BridgeError::Config(_) | BridgeError::ConfigParse(_) => Self::Escalate,
            BridgeError::Io(_) => Self::Retry,
            BridgeError::Serialization(_) => Self::Escalate,
        }
    }

    /// Determine the recommended recovery action for a ledger result code.
    pub fn for_result(result: LedgerResult) -> Self {
        match result {
            LedgerResult::Ok => Self::Ignore,
            LedgerResult::Retry | LedgerResult::ExpiredToken => Self::Retry,
            LedgerResult::LedgerShutdown | LedgerResult::NoLedgerState => Self::Fallback,
            LedgerResult::Error
            | LedgerResult::NotFound
            | LedgerResult::CaptchaFailed
            | LedgerResult::NotEnoughFunds
            | LedgerResult::AlreadyExists
            | LedgerResult::GrantAlreadyClaimed
            | LedgerResult::Unknown(_) => Self::Escalate,
        }
    }
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retry => write!(f, "Retry"),
            Self::Fallback => write!(f, "Fallback"),
            Self::Escalate => write!(f, "Escalate"),
            Self::Ignore => write!(f, "Ignore"),
        }
    }
}
