//! Request identity and lifecycle.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::TabId;

/// Opaque identifier handed back by every action method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Asynchronous ledger operations the bridge issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    FetchRewardsParameters,
    FetchPublisherInfo,
    FetchBalance,
    FetchBalanceReport,
    SetPublisherExclude,
    Donate,
    FetchRecurringDonations,
    RemoveRecurringDonation,
    FetchAutoContributeProperties,
    SetAutoContributeEnabled,
    SetAutoContributionAmount,
    FetchReconcileStamp,
    FetchPendingContributionsTotal,
    FetchPromotions,
    ClaimPromotion,
    FinishPromotion,
    FetchNotifications,
    DeleteNotification,
    FetchExternalWallet,
    DisconnectWallet,
    ProcessRewardsPageUrl,
    RecoverWallet,
    RefreshPublisher,
    StartProcess,
    ResetState,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FetchRewardsParameters => "fetch_rewards_parameters",
            Self::FetchPublisherInfo => "fetch_publisher_info",
            Self::FetchBalance => "fetch_balance",
            Self::FetchBalanceReport => "fetch_balance_report",
            Self::SetPublisherExclude => "set_publisher_exclude",
            Self::Donate => "donate",
            Self::FetchRecurringDonations => "fetch_recurring_donations",
            Self::RemoveRecurringDonation => "remove_recurring_donation",
            Self::FetchAutoContributeProperties => "fetch_auto_contribute_properties",
            Self::SetAutoContributeEnabled => "set_auto_contribute_enabled",
            Self::SetAutoContributionAmount => "set_auto_contribution_amount",
            Self::FetchReconcileStamp => "fetch_reconcile_stamp",
            Self::FetchPendingContributionsTotal => "fetch_pending_contributions_total",
            Self::FetchPromotions => "fetch_promotions",
            Self::ClaimPromotion => "claim_promotion",
            Self::FinishPromotion => "finish_promotion",
            Self::FetchNotifications => "fetch_notifications",
            Self::DeleteNotification => "delete_notification",
            Self::FetchExternalWallet => "fetch_external_wallet",
            Self::DisconnectWallet => "disconnect_wallet",
            Self::ProcessRewardsPageUrl => "process_rewards_page_url",
            Self::RecoverWallet => "recover_wallet",
            Self::RefreshPublisher => "refresh_publisher",
            Self::StartProcess => "start_process",
            Self::ResetState => "reset_state",
        }
    }

    /// Answered through an observer callback rather than a completion. The
    /// ledger may never answer these, so they expire instead of stalling.
    pub fn is_observer_routed(self) -> bool {
        matches!(
            self,
            Self::FetchPublisherInfo
                | Self::FinishPromotion
                | Self::FetchNotifications
                | Self::DeleteNotification
                | Self::DisconnectWallet
                | Self::RecoverWallet
                | Self::StartProcess
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a request's response must be matched against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrelationKey {
    /// Singleton fetches (balance, parameters, ...).
    None,
    Tab(TabId),
    Publisher(String),
    WalletType(String),
    Promotion(String),
    Notification(String),
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "-"),
            Self::Tab(tab) => write!(f, "tab:{}", tab),
            Self::Publisher(key) => write!(f, "publisher:{}", key),
            Self::WalletType(t) => write!(f, "wallet:{}", t),
            Self::Promotion(id) => write!(f, "promotion:{}", id),
            Self::Notification(id) => write!(f, "notification:{}", id),
        }
    }
}

/// Issued → {Fulfilled, Failed, Abandoned}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestState {
    Issued,
    Fulfilled,
    Failed,
    /// Never answered: the bridge was torn down, or an observer-routed
    /// request outlived its expiry.
    Abandoned,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Issued)
    }
}

/// A request that has been sent to the ledger and not yet answered.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub id: RequestId,
    pub operation: Operation,
    pub key: CorrelationKey,
    /// Issue order across all operations.
    pub sequence: u64,
    pub issued_at: DateTime<Utc>,
    pub state: RequestState,
}
