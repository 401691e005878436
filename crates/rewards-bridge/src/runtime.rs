//! BridgeRuntime: shared bridge state, request dispatch, and the observer
//! implementation that folds ledger results into the cache.
//!
//! The runtime lives behind an `Arc` owned by [`crate::RewardsBridge`]. Every
//! completion and observer registration only holds a `Weak` to it, so once
//! the bridge is dropped late callbacks find nothing to upgrade and do
//! nothing.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use chrono::Utc;
use tracing::{debug, info, trace, warn};

use crate::cache::RewardsCache;
use crate::config::BridgeConfig;
use crate::correlator::{
    CorrelationKey, Operation, RequestId, RequestState, RequestTracker, TabCorrelation,
};
use crate::errors::{BridgeError, BridgeResult, RecoveryAction};
use crate::events::{BridgeEvent, EventBus};
use crate::traits::{Completion, IRewardsService, RewardsObserver};
use crate::types::{
    AutoContributeProperties, Balance, BalanceReport, ExternalWallet, LedgerResult, Notification,
    Promotion, PublisherInfo, PublisherStatus, RecurringDonation, RewardsPageAction,
    RewardsParameters, TabId,
};

pub(crate) struct BridgeRuntime {
    pub(crate) config: BridgeConfig,
    service: Weak<dyn IRewardsService>,
    pub(crate) cache: RewardsCache,
    pub(crate) tracker: RequestTracker,
    pub(crate) events: EventBus,
    /// Serializes publisher-tab writes with tab removal so a callback that
    /// passed correlation cannot re-insert a tab removed meanwhile.
    tab_gate: Mutex<()>,
}

impl BridgeRuntime {
    pub(crate) fn new(service: Weak<dyn IRewardsService>, config: BridgeConfig) -> Self {
        Self {
            service,
            cache: RewardsCache::new(),
            tracker: RequestTracker::with_expiry(config.stall_after()),
            events: EventBus::new(),
            tab_gate: Mutex::new(()),
            config,
        }
    }

    pub(crate) fn service(&self) -> BridgeResult<Arc<dyn IRewardsService>> {
        self.service.upgrade().ok_or_else(|| {
            warn!("Rewards service is gone, request not sent");
            BridgeError::BackendUnavailable {
                reason: "rewards service has been dropped".to_string(),
            }
        })
    }

    pub(crate) fn is_backend_alive(&self) -> bool {
        self.service.strong_count() > 0
    }

    /// Issue a request answered through a completion handle.
    ///
    /// `apply` runs only for an `Ok` result, with the key captured at issue time.
    pub(crate) fn dispatch<T, S, A>(
        self: &Arc<Self>,
        operation: Operation,
        key: CorrelationKey,
        send: S,
        apply: A,
    ) -> BridgeResult<RequestId>
    where
        T: Send + 'static,
        S: FnOnce(&dyn IRewardsService, Completion<T>),
        A: FnOnce(&BridgeRuntime, &CorrelationKey, T) + Send + 'static,
    {
        let service = self.service()?;
        let id = self.tracker.issue(operation, key.clone());
        debug!(request = %id, operation = %operation, key = %key, "Issued ledger request");

        let weak = Arc::downgrade(self);
        let completion: Completion<T> = Box::new(move |result, payload| match weak.upgrade() {
            Some(runtime) => runtime.complete(id, operation, &key, result, payload, apply),
            None => trace!(
                request = %id,
                operation = %operation,
                "Bridge torn down, completion dropped"
            ),
        });
        send(service.as_ref(), completion);
        Ok(id)
    }

    /// Issue a request whose result comes back through the observer.
    pub(crate) fn dispatch_observed(
        &self,
        operation: Operation,
        key: CorrelationKey,
        send: impl FnOnce(&dyn IRewardsService),
    ) -> BridgeResult<RequestId> {
        let service = self.service()?;
        debug!(operation = %operation, key = %key, "Issued observer-routed ledger request");
        let id = self.tracker.issue(operation, key);
        send(service.as_ref());
        Ok(id)
    }

    fn complete<T, A>(
        &self,
        id: RequestId,
        operation: Operation,
        key: &CorrelationKey,
        result: LedgerResult,
        payload: T,
        apply: A,
    ) where
        A: FnOnce(&BridgeRuntime, &CorrelationKey, T),
    {
        if !result.is_ok() {
            // A repeated failure for an already-resolved request is not reported twice.
            if self.tracker.resolve(id, RequestState::Failed).is_some() {
                self.fail(operation, result);
            }
            return;
        }
        // Misses still apply: every cache write is a wholesale overwrite.
        self.tracker.resolve(id, RequestState::Fulfilled);
        apply(self, key, payload);
    }

    fn fail(&self, operation: Operation, result: LedgerResult) {
        let recovery = RecoveryAction::for_result(result);
        warn!(
            operation = %operation,
            result = %result,
            recovery = %recovery,
            "Ledger operation failed, cache left untouched"
        );
        self.events.publish(BridgeEvent::OperationFailed {
            operation,
            result,
            recovery,
        });
    }

    /// Publish `event` for an accepted write, unless it changed nothing and
    /// unchanged writes are configured to stay silent.
    fn notify(&self, changed: bool, event: BridgeEvent) {
        if changed || !self.config.suppress_unchanged_events {
            self.events.publish(event);
        } else {
            trace!(event = event.name(), "Value unchanged, event suppressed");
        }
    }

    // ── Result application ──

    pub(crate) fn apply_parameters(&self, parameters: Option<RewardsParameters>) {
        let Some(parameters) = parameters else {
            debug!("Rewards parameters completion carried no payload");
            return;
        };
        let changed = self.cache.parameters.set(parameters);
        self.notify(changed, BridgeEvent::RewardsParametersUpdated);
    }

    pub(crate) fn apply_balance(&self, balance: Option<Balance>) {
        let Some(balance) = balance else {
            debug!("Balance completion carried no payload");
            return;
        };
        let changed = self.cache.balance.set(balance);
        self.notify(changed, BridgeEvent::BalanceUpdated);
    }

    pub(crate) fn apply_balance_report(&self, report: Option<BalanceReport>) {
        let Some(report) = report else {
            debug!("Balance report completion carried no payload");
            return;
        };
        let changed = self.cache.balance_report.set(report);
        self.notify(changed, BridgeEvent::BalanceReportUpdated);
    }

    pub(crate) fn apply_auto_contribute(&self, properties: Option<AutoContributeProperties>) {
        let Some(properties) = properties else {
            debug!("Auto-contribute completion carried no payload");
            return;
        };
        let changed = self.cache.auto_contribute.set(properties);
        self.notify(changed, BridgeEvent::AutoContributePropertiesUpdated);
    }

    pub(crate) fn apply_auto_contribute_change(
        &self,
        f: impl FnOnce(&mut AutoContributeProperties),
    ) {
        let changed = self.cache.auto_contribute.modify(f);
        self.notify(changed, BridgeEvent::AutoContributePropertiesUpdated);
    }

    pub(crate) fn apply_reconcile_stamp(&self, stamp: u64) {
        let changed = self.cache.reconcile_stamp.set(stamp);
        self.notify(changed, BridgeEvent::ReconcileStampUpdated);
    }

    pub(crate) fn apply_pending_total(&self, total: f64) {
        let changed = self.cache.pending_contributions_total.set(total);
        self.notify(changed, BridgeEvent::PendingContributionsUpdated);
    }

    pub(crate) fn apply_recurring(&self, donations: Vec<RecurringDonation>) {
        let changed = self.cache.recurring.replace_all(
            donations
                .into_iter()
                .map(|d| (d.publisher_key().to_string(), d)),
        );
        self.notify(changed, BridgeEvent::RecurringDonationsUpdated);
    }

    pub(crate) fn apply_recurring_removed(&self, key: &CorrelationKey) {
        let CorrelationKey::Publisher(publisher_key) = key else {
            return;
        };
        if self.cache.recurring.remove(publisher_key).is_some() {
            self.events.publish(BridgeEvent::RecurringDonationsUpdated);
        }
    }

    pub(crate) fn apply_publisher_exclude(&self, publisher_key: &str, exclude: bool) {
        let tabs = self.cache.publishers.modify_all(|_, info| {
            if info.id == publisher_key && info.excluded != exclude {
                info.excluded = exclude;
                true
            } else {
                false
            }
        });
        for tab_id in tabs {
            self.events.publish(BridgeEvent::PublisherInfoUpdated { tab_id });
        }
    }

    pub(crate) fn apply_publisher_status(&self, key: &CorrelationKey, status: PublisherStatus) {
        let CorrelationKey::Publisher(publisher_key) = key else {
            return;
        };
        let tabs = self.cache.publishers.modify_all(|_, info| {
            if info.id == *publisher_key && info.status != status {
                info.status = status;
                true
            } else {
                false
            }
        });
        self.cache.recurring.modify(publisher_key, |donation| {
            let changed = donation.publisher.status != status;
            donation.publisher.status = status;
            changed
        });
        for tab_id in tabs {
            self.events.publish(BridgeEvent::PublisherInfoUpdated { tab_id });
        }
        self.events.publish(BridgeEvent::PublisherRefreshed {
            publisher_key: publisher_key.clone(),
            status,
        });
    }

    pub(crate) fn apply_promotions(&self, promotions: Vec<Promotion>) {
        let changed = self.cache.promotions.replace_all(promotions);
        self.notify(changed, BridgeEvent::PromotionsUpdated);
    }

    pub(crate) fn apply_claimed_promotion(&self, promotion: Option<Promotion>) {
        let Some(promotion) = promotion else {
            return;
        };
        // The grant itself arrives later through `on_promotion_finished`.
        self.tracker.issue(Operation::FinishPromotion, CorrelationKey::None);
        let changed = self.cache.promotions.update(promotion);
        self.notify(changed, BridgeEvent::PromotionsUpdated);
    }

    pub(crate) fn apply_external_wallet(
        &self,
        key: &CorrelationKey,
        wallet: Option<ExternalWallet>,
    ) {
        let (CorrelationKey::WalletType(wallet_type), Some(wallet)) = (key, wallet) else {
            return;
        };
        if wallet.address.is_empty() {
            debug!(wallet_type = %wallet_type, "External wallet has no address yet");
            return;
        }
        let changed = self
            .cache
            .wallet_addresses
            .upsert(wallet_type.clone(), wallet.address);
        self.notify(
            changed,
            BridgeEvent::ExternalWalletUpdated {
                wallet_type: wallet_type.clone(),
            },
        );
    }

    pub(crate) fn apply_page_action(&self, action: RewardsPageAction) {
        let args = action.args_json().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to serialize rewards page arguments");
            "{}".to_string()
        });
        self.events.publish(BridgeEvent::RewardsPageUrlProcessed {
            wallet_type: action.wallet_type,
            action: action.action,
            args,
        });
    }

    /// Forget the publisher shown in `tab` and drop fetches still in flight
    /// for it. Returns whether an entry was cached and how many fetches were
    /// dropped.
    pub(crate) fn remove_tab(&self, tab: TabId) -> (bool, usize) {
        let _gate = self.tab_gate.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = self.cache.publishers.remove(&tab).is_some();
        (removed, self.tracker.evict_tab(tab))
    }

    /// Abandon observer-routed requests the ledger never answered.
    pub(crate) fn expire_stale(&self) {
        let expired = self.tracker.expire(Utc::now());
        for request in &expired {
            warn!(
                request = %request.id,
                operation = %request.operation,
                key = %request.key,
                "Ledger never answered, request abandoned"
            );
        }
    }

    /// Empty every cache after the ledger confirmed its own reset.
    pub(crate) fn apply_reset(&self) {
        self.cache.clear();
        self.tracker.clear_evictions();
        info!("Rewards state reset, local cache cleared");
        self.events.publish(BridgeEvent::ResetComplete);
    }

    /// Resolve an observer-routed request and report a failure if one was outstanding.
    fn settle_observed(
        &self,
        operation: Operation,
        key: &CorrelationKey,
        result: LedgerResult,
    ) -> bool {
        let outcome = if result.is_ok() {
            RequestState::Fulfilled
        } else {
            RequestState::Failed
        };
        let matched = self.tracker.resolve_oldest(operation, key, outcome).is_some();
        if !result.is_ok() {
            if matched {
                self.fail(operation, result);
            } else {
                debug!(operation = %operation, result = %result, "Unsolicited failure ignored");
            }
        }
        result.is_ok()
    }
}

impl RewardsObserver for BridgeRuntime {
    fn on_panel_publisher_info(
        &self,
        result: LedgerResult,
        info: Option<&PublisherInfo>,
        tab_id: TabId,
    ) {
        let outcome = match (result.is_ok(), info.is_some()) {
            (true, true) => RequestState::Fulfilled,
            _ => RequestState::Failed,
        };
        let gate = self.tab_gate.lock().unwrap_or_else(PoisonError::into_inner);
        let correlation = self.tracker.correlate_tab(tab_id, outcome);

        if !result.is_ok() {
            drop(gate);
            if matches!(correlation, TabCorrelation::Pending(_)) {
                self.fail(Operation::FetchPublisherInfo, result);
            }
            return;
        }
        let Some(info) = info else {
            debug!(tab_id, "Publisher info callback carried no record");
            return;
        };
        if correlation == TabCorrelation::Evicted && self.config.discard_removed_tab_callbacks {
            self.tracker.record_discard();
            debug!(tab_id, publisher = %info.id, "Discarded publisher info for removed tab");
            return;
        }

        let mut record = info.clone();
        record.tab_id = Some(tab_id);
        if record.normalize_percent() {
            warn!(tab_id, publisher = %record.id, "Publisher percent above 100 clamped");
        }
        let changed = self.cache.publishers.upsert(tab_id, record);
        drop(gate);
        self.notify(changed, BridgeEvent::PublisherInfoUpdated { tab_id });
    }

    fn on_notification_added(&self, notification: &Notification) {
        let changed = self.cache.notifications.append(notification.clone());
        self.notify(
            changed,
            BridgeEvent::NotificationAdded {
                id: notification.id.clone(),
            },
        );
    }

    fn on_get_all_notifications(&self, notifications: &[Notification]) {
        let key = CorrelationKey::None;
        self.settle_observed(Operation::FetchNotifications, &key, LedgerResult::Ok);
        let changed = self.cache.notifications.replace_all(notifications.to_vec());
        self.notify(changed, BridgeEvent::NotificationsUpdated);
    }

    fn on_notification_deleted(&self, notification: &Notification) {
        let key = CorrelationKey::Notification(notification.id.clone());
        self.settle_observed(Operation::DeleteNotification, &key, LedgerResult::Ok);
        if self.cache.notifications.remove_by_id(&notification.id) {
            self.events.publish(BridgeEvent::NotificationDeleted {
                id: notification.id.clone(),
            });
        } else {
            debug!(id = %notification.id, "Deleted notification was not cached");
        }
    }

    fn on_promotion_finished(&self, result: LedgerResult, promotion: Option<&Promotion>) {
        if !self.settle_observed(Operation::FinishPromotion, &CorrelationKey::None, result) {
            return;
        }
        let Some(promotion) = promotion else {
            debug!("Finished promotion callback carried no record");
            return;
        };
        self.cache.promotions.remove_by_id(&promotion.id);
        self.events.publish(BridgeEvent::GrantClaimed {
            promotion_id: promotion.id.clone(),
        });
    }

    fn on_disconnect_wallet(&self, result: LedgerResult, wallet_type: &str) {
        let key = CorrelationKey::WalletType(wallet_type.to_string());
        if !self.settle_observed(Operation::DisconnectWallet, &key, result) {
            return;
        }
        self.cache.wallet_addresses.remove(&wallet_type.to_string());
        self.events.publish(BridgeEvent::WalletDisconnected {
            wallet_type: wallet_type.to_string(),
        });
    }

    fn on_recover_wallet(&self, result: LedgerResult) {
        if self.settle_observed(Operation::RecoverWallet, &CorrelationKey::None, result) {
            self.events.publish(BridgeEvent::WalletRecovered);
        }
    }

    fn on_start_process(&self, result: LedgerResult) {
        if self.settle_observed(Operation::StartProcess, &CorrelationKey::None, result) {
            self.events.publish(BridgeEvent::ProcessStarted);
        }
    }
}

impl Drop for BridgeRuntime {
    fn drop(&mut self) {
        let abandoned = self.tracker.abandon_all();
        for request in &abandoned {
            trace!(request = %request.id, operation = %request.operation, "Request abandoned");
        }
        info!(abandoned = abandoned.len(), "Rewards bridge torn down");
    }
}
