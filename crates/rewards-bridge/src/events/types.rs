//! BridgeEvent: change notifications pushed to the UI.

use crate::correlator::Operation;
use crate::errors::RecoveryAction;
use crate::types::{LedgerResult, PublisherStatus, TabId};

/// A change the UI should react to by re-querying the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    RewardsParametersUpdated,
    PublisherInfoUpdated { tab_id: TabId },
    BalanceUpdated,
    BalanceReportUpdated,
    AutoContributePropertiesUpdated,
    ReconcileStampUpdated,
    PendingContributionsUpdated,
    RecurringDonationsUpdated,
    NotificationAdded { id: String },
    NotificationsUpdated,
    NotificationDeleted { id: String },
    PromotionsUpdated,
    GrantClaimed { promotion_id: String },
    DonationSent {
        publisher_key: String,
        amount: f64,
        recurring: bool,
    },
    ExternalWalletUpdated { wallet_type: String },
    WalletDisconnected { wallet_type: String },
    RewardsPageUrlProcessed {
        wallet_type: String,
        action: String,
        /// Action arguments as a JSON object string.
        args: String,
    },
    WalletRecovered,
    PublisherRefreshed {
        publisher_key: String,
        status: PublisherStatus,
    },
    ProcessStarted,
    ResetComplete,
    OperationFailed {
        operation: Operation,
        result: LedgerResult,
        recovery: RecoveryAction,
    },
}

impl BridgeEvent {
    /// Stable event name used by the UI channel.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RewardsParametersUpdated => "rewards-parameters-updated",
            Self::PublisherInfoUpdated { .. } => "publisher-info-updated",
            Self::BalanceUpdated => "balance-updated",
            Self::BalanceReportUpdated => "balance-report-updated",
            Self::AutoContributePropertiesUpdated => "auto-contribute-properties-updated",
            Self::ReconcileStampUpdated => "reconcile-stamp-updated",
            Self::PendingContributionsUpdated => "pending-contributions-updated",
            Self::RecurringDonationsUpdated => "recurring-donations-updated",
            Self::NotificationAdded { .. } => "notification-added",
            Self::NotificationsUpdated => "notifications-updated",
            Self::NotificationDeleted { .. } => "notification-deleted",
            Self::PromotionsUpdated => "promotions-updated",
            Self::GrantClaimed { .. } => "grant-claimed",
            Self::DonationSent { .. } => "donation-sent",
            Self::ExternalWalletUpdated { .. } => "external-wallet-updated",
            Self::WalletDisconnected { .. } => "wallet-disconnected",
            Self::RewardsPageUrlProcessed { .. } => "rewards-page-url-processed",
            Self::WalletRecovered => "wallet-recovered",
            Self::PublisherRefreshed { .. } => "publisher-refreshed",
            Self::ProcessStarted => "process-started",
            Self::ResetComplete => "reset-complete",
            Self::OperationFailed { .. } => "operation-failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::OperationFailed { .. })
    }
}
