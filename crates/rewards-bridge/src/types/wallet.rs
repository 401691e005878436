//! Wallet records: balance, monthly report, external wallets, rewards-page actions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Wallet balance: total plus per-provider amounts. Always replaced as a whole.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Balance {
    pub total: f64,
    /// Provider name (e.g. "anonymous", "uphold") → amount.
    #[serde(default)]
    pub wallets: BTreeMap<String, f64>,
}

/// Provider key of the built-in wallet in `Balance::wallets`.
pub const ANONYMOUS_PROVIDER: &str = "anonymous";

impl Balance {
    pub fn provider_amount(&self, provider: &str) -> f64 {
        self.wallets.get(provider).copied().unwrap_or(0.0)
    }

    /// Whether every provider other than the anonymous wallet holds nothing.
    pub fn is_anonymous_only(&self) -> bool {
        self.wallets
            .iter()
            .all(|(provider, amount)| provider == ANONYMOUS_PROVIDER || *amount <= 0.0)
    }
}

/// Monthly activity totals for the current balance report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BalanceReport {
    pub grants: f64,
    pub earning_from_ads: f64,
    pub auto_contribute: f64,
    pub recurring_donation: f64,
    pub one_time_donation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WalletStatus {
    #[default]
    NotConnected,
    Connected,
    Verified,
    DisconnectedNotVerified,
    DisconnectedVerified,
    Pending,
}

/// A wallet held with an external custodial provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExternalWallet {
    /// Provider identifier, e.g. "uphold".
    pub wallet_type: String,
    pub address: String,
    pub status: WalletStatus,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub account_url: String,
}

/// Outcome of processing a rewards-page URL (e.g. an OAuth redirect).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RewardsPageAction {
    pub wallet_type: String,
    pub action: String,
    #[serde(default)]
    pub args: BTreeMap<String, String>,
}

impl RewardsPageAction {
    /// Arguments as a flat JSON object string, the form handed to the UI layer.
    pub fn args_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.args)
    }
}
