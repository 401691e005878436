//! BridgeConfig: all bridge settings from the `[rewards_bridge]` TOML section.

use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::errors::{BridgeError, BridgeResult};

/// Default ads shown per hour when the user never chose a value.
pub const DEFAULT_ADS_PER_HOUR: u32 = 2;
/// Upper bound accepted by `set_ads_per_hour`.
pub const MAX_ADS_PER_HOUR: u32 = 10;
/// Outstanding requests older than this make the bridge report itself degraded.
pub const DEFAULT_STALLED_REQUEST_SECS: u64 = 300;
/// Upper bound for `stalled_request_secs` (one week).
pub const MAX_STALLED_REQUEST_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Drop publisher-info callbacks for tabs removed after the request was issued.
    pub discard_removed_tab_callbacks: bool,
    /// Skip change events when a callback stores a value equal to the cached one.
    pub suppress_unchanged_events: bool,
    pub default_ads_per_hour: u32,
    pub max_ads_per_hour: u32,
    /// Age in seconds after which an unanswered request counts as stalled.
    pub stalled_request_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            discard_removed_tab_callbacks: true,
            suppress_unchanged_events: true,
            default_ads_per_hour: DEFAULT_ADS_PER_HOUR,
            max_ads_per_hour: MAX_ADS_PER_HOUR,
            stalled_request_secs: DEFAULT_STALLED_REQUEST_SECS,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    #[serde(default)]
    rewards_bridge: BridgeConfig,
}

impl BridgeConfig {
    /// Parse a TOML document containing a `[rewards_bridge]` table. Missing
    /// fields (or a missing table) fall back to defaults.
    pub fn from_toml(toml_str: &str) -> BridgeResult<Self> {
        let file: ConfigFile = toml::from_str(toml_str)?;
        file.rewards_bridge.validate()?;
        Ok(file.rewards_bridge)
    }

    /// Load and validate configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn validate(&self) -> BridgeResult<()> {
        if self.max_ads_per_hour == 0 {
            return Err(BridgeError::Config(
                "max_ads_per_hour must be at least 1".to_string(),
            ));
        }
        if self.default_ads_per_hour == 0 || self.default_ads_per_hour > self.max_ads_per_hour {
            return Err(BridgeError::Config(format!(
                "default_ads_per_hour must be within 1..={}, got {}",
                self.max_ads_per_hour, self.default_ads_per_hour
            )));
        }
        if self.stalled_request_secs == 0 || self.stalled_request_secs > MAX_STALLED_REQUEST_SECS {
            return Err(BridgeError::Config(format!(
                "stalled_request_secs must be within 1..={}, got {}",
                MAX_STALLED_REQUEST_SECS, self.stalled_request_secs
            )));
        }
        Ok(())
    }

    /// `stalled_request_secs` as a duration. Saturates instead of panicking
    /// for values `validate` would reject.
    pub fn stall_after(&self) -> Duration {
        i64::try_from(self.stalled_request_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }
}
