//! The ledger service seam: `IRewardsService` (requests out) and
//! `RewardsObserver` (unsolicited and observer-routed results in).
//!
//! Requests that answer through a [`Completion`] must invoke it at most once,
//! on any thread, possibly before the request method returns. Requests
//! without a completion answer through the matching `RewardsObserver` method.

use std::sync::Weak;

use crate::types::{
    AutoContributeProperties, Balance, BalanceReport, ExternalWallet, LedgerResult, Notification,
    Promotion, PublisherInfo, PublisherStatus, RecurringDonation, RewardsPageAction,
    RewardsParameters, TabId,
};

/// One-shot completion handle passed with a request.
pub type Completion<T> = Box<dyn FnOnce(LedgerResult, T) + Send + 'static>;

/// The rewards ledger service as seen by the bridge.
pub trait IRewardsService: Send + Sync {
    // ── Observers ──

    /// Register an observer. The service must not keep it alive; dead
    /// observers may be pruned whenever it is convenient.
    fn add_observer(&self, observer: Weak<dyn RewardsObserver>);

    // ── Wallet & parameters ──

    fn fetch_rewards_parameters(&self, callback: Completion<Option<RewardsParameters>>);

    fn fetch_balance(&self, callback: Completion<Option<Balance>>);

    /// Monthly report; `month` is 1-based.
    fn get_balance_report(
        &self,
        year: i32,
        month: u32,
        callback: Completion<Option<BalanceReport>>,
    );

    fn get_reconcile_stamp(&self, callback: Completion<u64>);

    fn get_pending_contributions_total(&self, callback: Completion<f64>);

    // ── Publishers ──

    /// Answers through [`RewardsObserver::on_panel_publisher_info`] with the same tab id.
    fn get_publisher_activity_from_url(&self, tab_id: TabId, host: &str);

    fn set_publisher_exclude(&self, publisher_key: &str, exclude: bool, callback: Completion<()>);

    fn refresh_publisher(&self, publisher_key: &str, callback: Completion<PublisherStatus>);

    // ── Contributions ──

    fn send_tip(&self, publisher_key: &str, amount: f64, recurring: bool, callback: Completion<()>);

    fn get_recurring_tips(&self, callback: Completion<Vec<RecurringDonation>>);

    fn remove_recurring_tip(&self, publisher_key: &str, callback: Completion<()>);

    fn get_auto_contribute_properties(
        &self,
        callback: Completion<Option<AutoContributeProperties>>,
    );

    fn set_auto_contribute_enabled(&self, enabled: bool, callback: Completion<()>);

    fn set_auto_contribution_amount(&self, amount: f64, callback: Completion<()>);

    // ── Promotions ──

    fn fetch_promotions(&self, callback: Completion<Vec<Promotion>>);

    /// The claim completion reports the attested promotion; the final grant
    /// arrives through [`RewardsObserver::on_promotion_finished`].
    fn claim_promotion(&self, promotion_id: &str, callback: Completion<Option<Promotion>>);

    // ── Notifications (observer-routed) ──

    fn get_all_notifications(&self);

    fn delete_notification(&self, notification_id: &str);

    // ── External wallets ──

    fn get_external_wallet(&self, wallet_type: &str, callback: Completion<Option<ExternalWallet>>);

    /// Answers through [`RewardsObserver::on_disconnect_wallet`].
    fn disconnect_wallet(&self, wallet_type: &str);

    fn process_rewards_page_url(
        &self,
        path: &str,
        query: &str,
        callback: Completion<RewardsPageAction>,
    );

    /// Answers through [`RewardsObserver::on_recover_wallet`].
    fn recover_wallet(&self, pass_phrase: &str);

    // ── Lifecycle ──

    fn set_ads_per_hour(&self, value: u32);

    /// Answers through [`RewardsObserver::on_start_process`].
    fn start_process(&self);

    /// Wipe the ledger's persisted state.
    fn reset_the_whole_state(&self, callback: Completion<()>);
}

/// Observer protocol of the rewards service. Every method defaults to a no-op.
pub trait RewardsObserver: Send + Sync {
    fn on_panel_publisher_info(
        &self,
        _result: LedgerResult,
        _info: Option<&PublisherInfo>,
        _tab_id: TabId,
    ) {
    }

    fn on_notification_added(&self, _notification: &Notification) {}

    fn on_get_all_notifications(&self, _notifications: &[Notification]) {}

    fn on_notification_deleted(&self, _notification: &Notification) {}

    fn on_promotion_finished(&self, _result: LedgerResult, _promotion: Option<&Promotion>) {}

    fn on_disconnect_wallet(&self, _result: LedgerResult, _wallet_type: &str) {}

    fn on_recover_wallet(&self, _result: LedgerResult) {}

    fn on_start_process(&self, _result: LedgerResult) {}
}
