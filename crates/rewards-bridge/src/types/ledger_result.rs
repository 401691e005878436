//! LedgerResult: result codes reported by every ledger completion.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result code attached to every completion and result-bearing observer callback.
///
/// Anything other than [`LedgerResult::Ok`] suppresses cache mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerResult {
    Ok,
    Error,
    NoLedgerState,
    CaptchaFailed,
    NotFound,
    NotEnoughFunds,
    AlreadyExists,
    GrantAlreadyClaimed,
    ExpiredToken,
    Retry,
    /// The ledger is shutting down; requests in flight will not be served.
    LedgerShutdown,
    /// A code this bridge does not know about. Treated as a failure.
    Unknown(i32),
}

impl LedgerResult {
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Numeric wire code, stable across releases.
    pub fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Error => 1,
            Self::NoLedgerState => 3,
            Self::CaptchaFailed => 6,
            Self::NotFound => 9,
            Self::NotEnoughFunds => 15,
            Self::AlreadyExists => 26,
            Self::GrantAlreadyClaimed => 18,
            Self::ExpiredToken => 24,
            Self::Retry => 29,
            Self::LedgerShutdown => 40,
            Self::Unknown(code) => code,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::Error,
            3 => Self::NoLedgerState,
            6 => Self::CaptchaFailed,
            9 => Self::NotFound,
            15 => Self::NotEnoughFunds,
            18 => Self::GrantAlreadyClaimed,
            24 => Self::ExpiredToken,
            26 => Self::AlreadyExists,
            29 => Self::Retry,
            40 => Self::LedgerShutdown,
            other => Self::Unknown(other),
        }
    }
}

impl From<bool> for LedgerResult {
    fn from(success: bool) -> Self {
        if success {
            Self::Ok
        } else {
            Self::Error
        }
    }
}

impl fmt::Display for LedgerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "Unknown({})", code),
            other => write!(f, "{:?}", other),
        }
    }
}
