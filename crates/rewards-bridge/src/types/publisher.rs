//! Publisher records: panel publisher info (keyed by tab) and recurring donations.

use serde::{Deserialize, Serialize};

/// Browser tab identifier used to correlate panel publisher lookups.
pub type TabId = u64;

/// Verification status of a publisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PublisherStatus {
    #[default]
    NotVerified,
    Connected,
    Verified,
}

impl PublisherStatus {
    pub fn code(self) -> i32 {
        match self {
            Self::NotVerified => 0,
            Self::Connected => 1,
            Self::Verified => 2,
        }
    }

    /// Unknown codes fall back to `NotVerified`.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Connected,
            2 => Self::Verified,
            _ => Self::NotVerified,
        }
    }
}

/// Publisher information as reported by the ledger for a page or tip target.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PublisherInfo {
    /// Publisher key.
    pub id: String,
    pub name: String,
    pub url: String,
    pub favicon_url: String,
    /// Auto-contribution share, 0–100.
    pub percent: u32,
    pub excluded: bool,
    pub status: PublisherStatus,
    #[serde(default)]
    pub provider: String,
    /// Tab this record was looked up for, if any.
    #[serde(default)]
    pub tab_id: Option<TabId>,
}

impl PublisherInfo {
    /// Clamp `percent` into 0–100. Returns true if it had to be clamped.
    pub fn normalize_percent(&mut self) -> bool {
        if self.percent > 100 {
            self.percent = 100;
            true
        } else {
            false
        }
    }
}

/// A publisher the user tips every month.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecurringDonation {
    pub publisher: PublisherInfo,
    /// Monthly amount in BAT.
    pub amount: f64,
}

impl RecurringDonation {
    pub fn publisher_key(&self) -> &str {
        &self.publisher.id
    }
}
