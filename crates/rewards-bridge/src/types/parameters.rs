//! Process-wide rewards settings: ledger parameters and auto-contribute properties.

use serde::{Deserialize, Serialize};

/// Ledger-wide parameters fetched from the rewards server.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RewardsParameters {
    /// BAT → fiat exchange rate.
    pub rate: f64,
    #[serde(default)]
    pub fee: f64,
    /// Default monthly auto-contribution amount.
    pub auto_contribute_choice: f64,
    pub auto_contribute_choices: Vec<f64>,
    /// One-time tip denominations.
    pub tip_choices: Vec<f64>,
    #[serde(default)]
    pub monthly_tip_choices: Vec<f64>,
}

/// Auto-contribute settings bundle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AutoContributeProperties {
    pub enabled: bool,
    /// Monthly amount in BAT.
    pub amount: f64,
    /// Minimum visit duration in seconds before a visit counts.
    pub min_visit_time: u64,
    pub min_visits: u32,
    #[serde(default)]
    pub allow_non_verified: bool,
    #[serde(default)]
    pub allow_videos: bool,
}
