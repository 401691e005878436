//! Rewards notifications shown in the UI panel.

use serde::{Deserialize, Serialize};

use super::Identified;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NotificationType {
    #[default]
    Invalid,
    AutoContribute,
    Grant,
    GrantAds,
    FailedContribution,
    ImpendingContribution,
    InsufficientFunds,
    BackupWallet,
    TipsProcessed,
    AdsOnboarding,
    VerifiedPublisher,
    PendingNotEnoughFunds,
    GeneralLedger,
}

impl NotificationType {
    const ORDERED: [NotificationType; 13] = [
        Self::Invalid,
        Self::AutoContribute,
        Self::Grant,
        Self::GrantAds,
        Self::FailedContribution,
        Self::ImpendingContribution,
        Self::InsufficientFunds,
        Self::BackupWallet,
        Self::TipsProcessed,
        Self::AdsOnboarding,
        Self::VerifiedPublisher,
        Self::PendingNotEnoughFunds,
        Self::GeneralLedger,
    ];

    pub fn code(self) -> i32 {
        Self::ORDERED
            .iter()
            .position(|t| *t == self)
            .map(|i| i as i32)
            .unwrap_or(0)
    }

    pub fn from_code(code: i32) -> Self {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ORDERED.get(i).copied())
            .unwrap_or(Self::Invalid)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub notification_type: NotificationType,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    /// Positional arguments rendered into the notification text.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Identified for Notification {
    fn id(&self) -> &str {
        &self.id
    }
}
