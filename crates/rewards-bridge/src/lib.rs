//! # rewards-bridge
//!
//! A synchronous cache in front of the event-driven rewards ledger service.
//! The ledger answers only through completions and observer callbacks that
//! may arrive late, twice, on any thread, or never; the UI needs instant
//! answers. The bridge keeps the last accepted state of everything the UI
//! asks about and tells the UI when it changed.
//!
//! ## Modules
//! - `cache` — ValueCell, KeyedRegistry, ListCache, RewardsCache
//! - `config` — BridgeConfig, TOML loading, validation
//! - `correlator` — RequestTracker, RequestId, Operation, CorrelationKey, tab evictions
//! - `errors` — BridgeError, RecoveryAction
//! - `events` — BridgeEvent, EventBus (UI push channel)
//! - `health` — per-subsystem checks
//! - `traits` — IRewardsService (requests out), RewardsObserver (results in)
//! - `types` — payload records (PublisherInfo, Balance, Promotion, ...)

pub mod cache;
pub mod config;
pub mod correlator;
pub mod errors;
pub mod events;
pub mod health;
mod runtime;
pub mod traits;
pub mod types;

pub use config::BridgeConfig;
pub use correlator::{CorrelatorStats, PendingRequest, RequestId};
pub use errors::{BridgeError, BridgeResult};
pub use events::BridgeEvent;
pub use traits::{Completion, IRewardsService, RewardsObserver};

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use chrono::{Datelike, Utc};
use crossbeam_channel::Receiver;
use tracing::{debug, info};

use correlator::{CorrelationKey, Operation};
use runtime::BridgeRuntime;
use types::{
    AutoContributeProperties, Balance, BalanceReport, Notification, Promotion, PublisherInfo,
    PublisherStatus, RecurringDonation, RewardsParameters, TabId,
};

/// UI-facing bridge. Queries read only the local cache; actions return as
/// soon as the request has been handed to the ledger.
///
/// Dropping the bridge invalidates every outstanding completion and the
/// observer registration.
pub struct RewardsBridge {
    runtime: Arc<BridgeRuntime>,
}

/// Tab ids arrive from the UI as signed integers; negative ids name no tab.
fn tab(tab_id: i64) -> Option<TabId> {
    TabId::try_from(tab_id).ok()
}

fn require_tab(tab_id: i64) -> BridgeResult<TabId> {
    tab(tab_id).ok_or_else(|| BridgeError::InvalidInput(format!("invalid tab id {}", tab_id)))
}

fn require_non_empty(field: &str, value: &str) -> BridgeResult<()> {
    if value.is_empty() {
        return Err(BridgeError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn require_amount(field: &str, amount: f64) -> BridgeResult<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(BridgeError::InvalidInput(format!(
            "{} must be a non-negative number, got {}",
            field, amount
        )));
    }
    Ok(())
}

impl RewardsBridge {
    /// Create a bridge over `service` and register it as an observer. Only a
    /// weak reference to the service is kept.
    pub fn new(service: &Arc<dyn IRewardsService>, config: BridgeConfig) -> BridgeResult<Self> {
        config.validate()?;
        let runtime = Arc::new(BridgeRuntime::new(Arc::downgrade(service), config));
        let weak_runtime = Arc::downgrade(&runtime);
        let observer: Weak<dyn RewardsObserver> = weak_runtime;
        service.add_observer(observer);
        info!("Rewards bridge created");
        Ok(Self { runtime })
    }

    /// Subscribe to change events.
    pub fn subscribe(&self) -> Receiver<BridgeEvent> {
        self.runtime.events.subscribe()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.runtime.config
    }

    /// Whether the rewards service is still alive.
    pub fn is_backend_available(&self) -> bool {
        self.runtime.is_backend_alive()
    }

    // ── Wallet & parameters ──

    pub fn fetch_rewards_parameters(&self) -> BridgeResult<RequestId> {
        self.runtime.dispatch(
            Operation::FetchRewardsParameters,
            CorrelationKey::None,
            |service, done| service.fetch_rewards_parameters(done),
            |rt, _, parameters| rt.apply_parameters(parameters),
        )
    }

    pub fn rewards_parameters(&self) -> RewardsParameters {
        self.runtime.cache.parameters.get()
    }

    /// BAT exchange rate; 0.0 until parameters arrive.
    pub fn wallet_rate(&self) -> f64 {
        self.runtime
            .cache
            .parameters
            .try_get()
            .map(|p| p.rate)
            .unwrap_or(0.0)
    }

    pub fn fetch_balance(&self) -> BridgeResult<RequestId> {
        self.runtime.dispatch(
            Operation::FetchBalance,
            CorrelationKey::None,
            |service, done| service.fetch_balance(done),
            |rt, _, balance| rt.apply_balance(balance),
        )
    }

    /// Last accepted balance; zero total and no providers until one arrives.
    pub fn wallet_balance(&self) -> Balance {
        self.runtime.cache.balance.get()
    }

    /// True while the cached balance holds no funds outside the anonymous
    /// wallet, including before any balance has arrived.
    pub fn is_anon_wallet(&self) -> bool {
        self.runtime.cache.balance.get().is_anonymous_only()
    }

    /// Fetch the balance report for the current UTC month.
    pub fn fetch_current_balance_report(&self) -> BridgeResult<RequestId> {
        let now = Utc::now();
        let (year, month) = (now.year(), now.month());
        self.runtime.dispatch(
            Operation::FetchBalanceReport,
            CorrelationKey::None,
            move |service, done| service.get_balance_report(year, month, done),
            |rt, _, report| rt.apply_balance_report(report),
        )
    }

    pub fn balance_report(&self) -> BalanceReport {
        self.runtime.cache.balance_report.get()
    }

    pub fn fetch_reconcile_stamp(&self) -> BridgeResult<RequestId> {
        self.runtime.dispatch(
            Operation::FetchReconcileStamp,
            CorrelationKey::None,
            |service, done| service.get_reconcile_stamp(done),
            |rt, _, stamp| rt.apply_reconcile_stamp(stamp),
        )
    }

    /// Next reconcile time in seconds since the epoch; 0 if unknown.
    pub fn reconcile_stamp(&self) -> u64 {
        self.runtime.cache.reconcile_stamp.get()
    }

    pub fn fetch_pending_contributions_total(&self) -> BridgeResult<RequestId> {
        self.runtime.dispatch(
            Operation::FetchPendingContributionsTotal,
            CorrelationKey::None,
            |service, done| service.get_pending_contributions_total(done),
            |rt, _, total| rt.apply_pending_total(total),
        )
    }

    pub fn pending_contributions_total(&self) -> f64 {
        self.runtime.cache.pending_contributions_total.get()
    }

    // ── Publishers by tab ──

    /// Look up the publisher for the page shown in `tab_id`. The answer
    /// arrives as `PublisherInfoUpdated { tab_id }`.
    pub fn fetch_publisher_info(&self, tab_id: i64, host: &str) -> BridgeResult<RequestId> {
        let tab = require_tab(tab_id)?;
        require_non_empty("host", host)?;
        self.runtime.dispatch_observed(
            Operation::FetchPublisherInfo,
            CorrelationKey::Tab(tab),
            |service| service.get_publisher_activity_from_url(tab, host),
        )
    }

    pub fn publisher_info(&self, tab_id: i64) -> Option<PublisherInfo> {
        self.runtime.cache.publishers.get(&tab(tab_id)?)
    }

    fn project_publisher<R: Default>(&self, tab_id: i64, f: impl FnOnce(&PublisherInfo) -> R) -> R {
        tab(tab_id)
            .and_then(|tab| self.runtime.cache.publishers.project(&tab, f))
            .unwrap_or_default()
    }

    pub fn publisher_url(&self, tab_id: i64) -> String {
        self.project_publisher(tab_id, |p| p.url.clone())
    }

    pub fn publisher_favicon_url(&self, tab_id: i64) -> String {
        self.project_publisher(tab_id, |p| p.favicon_url.clone())
    }

    pub fn publisher_name(&self, tab_id: i64) -> String {
        self.project_publisher(tab_id, |p| p.name.clone())
    }

    /// Publisher key for the tab.
    pub fn publisher_id(&self, tab_id: i64) -> String {
        self.project_publisher(tab_id, |p| p.id.clone())
    }

    pub fn publisher_percent(&self, tab_id: i64) -> u32 {
        self.project_publisher(tab_id, |p| p.percent)
    }

    pub fn publisher_excluded(&self, tab_id: i64) -> bool {
        self.project_publisher(tab_id, |p| p.excluded)
    }

    pub fn publisher_status(&self, tab_id: i64) -> PublisherStatus {
        self.project_publisher(tab_id, |p| p.status)
    }

    /// Forget the publisher cached for `tab_id` (e.g. the tab closed). Any
    /// lookup still in flight for the tab is dropped when it answers. Once
    /// this returns, no callback can bring the entry back unless the tab is
    /// fetched again.
    pub fn remove_publisher_from_map(&self, tab_id: i64) {
        let Some(tab) = tab(tab_id) else {
            return;
        };
        let (removed, dropped) = self.runtime.remove_tab(tab);
        debug!(tab_id = tab, removed, dropped, "Publisher removed from map");
    }

    /// Include or exclude the tab's publisher from auto-contribution.
    pub fn include_in_auto_contribution(
        &self,
        tab_id: i64,
        exclude: bool,
    ) -> BridgeResult<RequestId> {
        let tab = require_tab(tab_id)?;
        let publisher_key = self
            .runtime
            .cache
            .publishers
            .project(&tab, |p| p.id.clone())
            .ok_or(BridgeError::UnknownTab { tab_id })?;
        let key = publisher_key.clone();
        self.runtime.dispatch(
            Operation::SetPublisherExclude,
            CorrelationKey::Publisher(publisher_key.clone()),
            move |service, done| service.set_publisher_exclude(&key, exclude, done),
            move |rt, _, ()| rt.apply_publisher_exclude(&publisher_key, exclude),
        )
    }

    /// Re-check a publisher's verification status.
    pub fn refresh_publisher(&self, publisher_key: &str) -> BridgeResult<RequestId> {
        require_non_empty("publisher_key", publisher_key)?;
        self.runtime.dispatch(
            Operation::RefreshPublisher,
            CorrelationKey::Publisher(publisher_key.to_string()),
            |service, done| service.refresh_publisher(publisher_key, done),
            |rt, key, status| rt.apply_publisher_status(key, status),
        )
    }

    // ── Contributions ──

    pub fn donate(
        &self,
        publisher_key: &str,
        amount: f64,
        recurring: bool,
    ) -> BridgeResult<RequestId> {
        require_non_empty("publisher_key", publisher_key)?;
        require_amount("amount", amount)?;
        if amount == 0.0 {
            return Err(BridgeError::InvalidInput("donation amount must be positive".to_string()));
        }
        let key = publisher_key.to_string();
        self.runtime.dispatch(
            Operation::Donate,
            CorrelationKey::Publisher(publisher_key.to_string()),
            |service, done| service.send_tip(publisher_key, amount, recurring, done),
            move |rt, _, ()| {
                rt.events.publish(BridgeEvent::DonationSent {
                    publisher_key: key,
                    amount,
                    recurring,
                });
            },
        )
    }

    /// Refresh recurring donations. The result replaces the cached set.
    pub fn fetch_recurring_donations(&self) -> BridgeResult<RequestId> {
        self.runtime.dispatch(
            Operation::FetchRecurringDonations,
            CorrelationKey::None,
            |service, done| service.get_recurring_tips(done),
            |rt, _, donations| rt.apply_recurring(donations),
        )
    }

    pub fn recurring_donations(&self) -> Vec<RecurringDonation> {
        self.runtime
            .cache
            .recurring
            .snapshot()
            .into_iter()
            .map(|(_, donation)| donation)
            .collect()
    }

    pub fn is_current_publisher_in_recurrent_donations(&self, publisher_key: &str) -> bool {
        self.runtime.cache.recurring.contains(&publisher_key.to_string())
    }

    /// Monthly amount for `publisher_key`; 0.0 if it has no recurring donation.
    pub fn publisher_recurrent_donation_amount(&self, publisher_key: &str) -> f64 {
        self.runtime
            .cache
            .recurring
            .project(&publisher_key.to_string(), |d| d.amount)
            .unwrap_or(0.0)
    }

    pub fn remove_recurring_donation(&self, publisher_key: &str) -> BridgeResult<RequestId> {
        require_non_empty("publisher_key", publisher_key)?;
        self.runtime.dispatch(
            Operation::RemoveRecurringDonation,
            CorrelationKey::Publisher(publisher_key.to_string()),
            |service, done| service.remove_recurring_tip(publisher_key, done),
            |rt, key, ()| rt.apply_recurring_removed(key),
        )
    }

    pub fn fetch_auto_contribute_properties(&self) -> BridgeResult<RequestId> {
        self.runtime.dispatch(
            Operation::FetchAutoContributeProperties,
            CorrelationKey::None,
            |service, done| service.get_auto_contribute_properties(done),
            |rt, _, properties| rt.apply_auto_contribute(properties),
        )
    }

    pub fn auto_contribute_properties(&self) -> AutoContributeProperties {
        self.runtime.cache.auto_contribute.get()
    }

    pub fn is_auto_contribute_enabled(&self) -> bool {
        self.runtime
            .cache
            .auto_contribute
            .try_get()
            .map(|p| p.enabled)
            .unwrap_or(false)
    }

    pub fn set_auto_contribute_enabled(&self, enabled: bool) -> BridgeResult<RequestId> {
        self.runtime.dispatch(
            Operation::SetAutoContributeEnabled,
            CorrelationKey::None,
            |service, done| service.set_auto_contribute_enabled(enabled, done),
            move |rt, _, ()| rt.apply_auto_contribute_change(|p| p.enabled = enabled),
        )
    }

    pub fn set_auto_contribution_amount(&self, amount: f64) -> BridgeResult<RequestId> {
        require_amount("amount", amount)?;
        self.runtime.dispatch(
            Operation::SetAutoContributionAmount,
            CorrelationKey::None,
            |service, done| service.set_auto_contribution_amount(amount, done),
            move |rt, _, ()| rt.apply_auto_contribute_change(|p| p.amount = amount),
        )
    }

    // ── Notifications ──

    pub fn fetch_all_notifications(&self) -> BridgeResult<RequestId> {
        self.runtime.dispatch_observed(
            Operation::FetchNotifications,
            CorrelationKey::None,
            |service| service.get_all_notifications(),
        )
    }

    pub fn delete_notification(&self, notification_id: &str) -> BridgeResult<RequestId> {
        require_non_empty("notification_id", notification_id)?;
        self.runtime.dispatch_observed(
            Operation::DeleteNotification,
            CorrelationKey::Notification(notification_id.to_string()),
            |service| service.delete_notification(notification_id),
        )
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.runtime.cache.notifications.snapshot()
    }

    // ── Promotions ──

    pub fn fetch_promotions(&self) -> BridgeResult<RequestId> {
        self.runtime.dispatch(
            Operation::FetchPromotions,
            CorrelationKey::None,
            |service, done| service.fetch_promotions(done),
            |rt, _, promotions| rt.apply_promotions(promotions),
        )
    }

    /// Start claiming a promotion. `GrantClaimed` follows once the ledger
    /// finishes the grant.
    pub fn claim_promotion(&self, promotion_id: &str) -> BridgeResult<RequestId> {
        require_non_empty("promotion_id", promotion_id)?;
        self.runtime.dispatch(
            Operation::ClaimPromotion,
            CorrelationKey::Promotion(promotion_id.to_string()),
            |service, done| service.claim_promotion(promotion_id, done),
            |rt, _, promotion| rt.apply_claimed_promotion(promotion),
        )
    }

    pub fn promotions(&self) -> Vec<Promotion> {
        self.runtime.cache.promotions.snapshot()
    }

    /// Promotion at `position` in the cached list.
    pub fn current_grant(&self, position: usize) -> Option<Promotion> {
        self.runtime.cache.promotions.get(position)
    }

    // ── External wallets ──

    pub fn fetch_external_wallet(&self, wallet_type: &str) -> BridgeResult<RequestId> {
        require_non_empty("wallet_type", wallet_type)?;
        self.runtime.dispatch(
            Operation::FetchExternalWallet,
            CorrelationKey::WalletType(wallet_type.to_string()),
            |service, done| service.get_external_wallet(wallet_type, done),
            |rt, key, wallet| rt.apply_external_wallet(key, wallet),
        )
    }

    /// Cached address for `wallet_type`; empty if never discovered.
    pub fn external_wallet_address(&self, wallet_type: &str) -> String {
        self.runtime
            .cache
            .wallet_addresses
            .get(&wallet_type.to_string())
            .unwrap_or_default()
    }

    pub fn external_wallet_addresses(&self) -> BTreeMap<String, String> {
        self.runtime.cache.wallet_addresses.snapshot().into_iter().collect()
    }

    pub fn disconnect_wallet(&self, wallet_type: &str) -> BridgeResult<RequestId> {
        require_non_empty("wallet_type", wallet_type)?;
        self.runtime.dispatch_observed(
            Operation::DisconnectWallet,
            CorrelationKey::WalletType(wallet_type.to_string()),
            |service| service.disconnect_wallet(wallet_type),
        )
    }

    /// Hand a rewards-page URL (e.g. an OAuth redirect) to the ledger.
    pub fn process_rewards_page_url(&self, path: &str, query: &str) -> BridgeResult<RequestId> {
        require_non_empty("path", path)?;
        self.runtime.dispatch(
            Operation::ProcessRewardsPageUrl,
            CorrelationKey::None,
            |service, done| service.process_rewards_page_url(path, query, done),
            |rt, _, action| rt.apply_page_action(action),
        )
    }

    pub fn recover_wallet(&self, pass_phrase: &str) -> BridgeResult<RequestId> {
        require_non_empty("pass_phrase", pass_phrase)?;
        self.runtime.dispatch_observed(
            Operation::RecoverWallet,
            CorrelationKey::None,
            |service| service.recover_wallet(pass_phrase),
        )
    }

    // ── Ads & lifecycle ──

    /// Ads per hour; the configured default until the user picks a value.
    pub fn ads_per_hour(&self) -> u32 {
        self.runtime
            .cache
            .ads_per_hour
            .try_get()
            .unwrap_or(self.runtime.config.default_ads_per_hour)
    }

    pub fn set_ads_per_hour(&self, value: u32) -> BridgeResult<()> {
        let max = self.runtime.config.max_ads_per_hour;
        if value == 0 || value > max {
            return Err(BridgeError::InvalidInput(format!(
                "ads per hour must be within 1..={}, got {}",
                max, value
            )));
        }
        self.runtime.service()?.set_ads_per_hour(value);
        self.runtime.cache.ads_per_hour.set(value);
        Ok(())
    }

    pub fn start_process(&self) -> BridgeResult<RequestId> {
        self.runtime.dispatch_observed(Operation::StartProcess, CorrelationKey::None, |service| {
            service.start_process()
        })
    }

    /// Ask the ledger to wipe its state. Local caches are cleared only after
    /// the ledger confirms; on failure they keep their values.
    pub fn reset_the_whole_state(&self) -> BridgeResult<RequestId> {
        self.runtime.dispatch(
            Operation::ResetState,
            CorrelationKey::None,
            |service, done| service.reset_the_whole_state(done),
            |rt, _, ()| rt.apply_reset(),
        )
    }

    // ── Diagnostics ──

    pub fn correlator_stats(&self) -> CorrelatorStats {
        self.runtime.tracker.stats()
    }

    /// Requests issued and not yet answered, oldest first.
    pub fn pending_requests(&self) -> Vec<PendingRequest> {
        self.runtime.tracker.pending()
    }

    /// Observer-routed requests the ledger never answered are abandoned
    /// first; only completion-routed requests can stall.
    pub fn health_check(&self) -> health::BridgeHealth {
        self.runtime.expire_stale();
        let pending = self.runtime.tracker.pending();
        let stall_after = self.runtime.config.stall_after();
        let checks = vec![
            health::checks::check_rewards_service(self.runtime.is_backend_alive()),
            health::checks::check_event_subscribers(self.runtime.events.subscriber_count()),
            health::checks::check_pending_requests(
                pending.first().map(|r| r.issued_at),
                pending.len(),
                stall_after,
                Utc::now(),
            ),
        ];
        health::compute_health(&checks)
    }
}
