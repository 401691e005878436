//! Scripted rewards service shared by the integration tests.
//!
//! Every request is recorded and its completion parked per method name. Tests
//! decide when, in what order, and on which thread each completion fires.

#![allow(dead_code)]

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, Weak};

use crossbeam_channel::Receiver;
use rewards_bridge::traits::{Completion, IRewardsService, RewardsObserver};
use rewards_bridge::types::*;
use rewards_bridge::{BridgeConfig, BridgeEvent, RewardsBridge};

type Parked = Box<dyn Any + Send>;

#[derive(Default)]
pub struct ScriptedService {
    observers: Mutex<Vec<Weak<dyn RewardsObserver>>>,
    parked: Mutex<HashMap<&'static str, VecDeque<Parked>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedService {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn park<T: 'static>(&self, method: &'static str, callback: Completion<T>) {
        self.record(method.to_string());
        self.parked
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(Box::new(callback));
    }

    fn take<T: 'static>(&self, method: &str, newest: bool) -> Completion<T> {
        let parked = {
            let mut map = self.parked.lock().unwrap();
            let queue = map
                .get_mut(method)
                .unwrap_or_else(|| panic!("no completion parked for {}", method));
            if newest {
                queue.pop_back()
            } else {
                queue.pop_front()
            }
        }
        .unwrap_or_else(|| panic!("no completion left for {}", method));
        *parked
            .downcast::<Completion<T>>()
            .unwrap_or_else(|_| panic!("completion for {} has a different payload type", method))
    }

    /// Oldest parked completion for `method`.
    pub fn take_oldest<T: 'static>(&self, method: &str) -> Completion<T> {
        self.take(method, false)
    }

    /// Most recently parked completion for `method`.
    pub fn take_newest<T: 'static>(&self, method: &str) -> Completion<T> {
        self.take(method, true)
    }

    /// Fire the oldest parked completion for `method`.
    pub fn complete<T: 'static>(&self, method: &str, result: LedgerResult, payload: T) {
        (self.take_oldest::<T>(method))(result, payload);
    }

    pub fn parked_count(&self, method: &str) -> usize {
        self.parked
            .lock()
            .unwrap()
            .get(method)
            .map_or(0, VecDeque::len)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn live_observers(&self) -> Vec<Arc<dyn RewardsObserver>> {
        self.observers
            .lock()
            .unwrap()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    pub fn registered_observers(&self) -> usize {
        self.observers.lock().unwrap().len()
    }

    /// Deliver an observer callback to every live observer.
    pub fn broadcast(&self, f: impl Fn(&dyn RewardsObserver)) {
        for observer in self.live_observers() {
            f(observer.as_ref());
        }
    }
}

impl IRewardsService for ScriptedService {
    fn add_observer(&self, observer: Weak<dyn RewardsObserver>) {
        self.observers.lock().unwrap().push(observer);
    }

    fn fetch_rewards_parameters(&self, callback: Completion<Option<RewardsParameters>>) {
        self.park("fetch_rewards_parameters", callback);
    }

    fn fetch_balance(&self, callback: Completion<Option<Balance>>) {
        self.park("fetch_balance", callback);
    }

    fn get_balance_report(
        &self,
        year: i32,
        month: u32,
        callback: Completion<Option<BalanceReport>>,
    ) {
        self.record(format!("balance_report_month:{}-{}", year, month));
        self.park("get_balance_report", callback);
    }

    fn get_reconcile_stamp(&self, callback: Completion<u64>) {
        self.park("get_reconcile_stamp", callback);
    }

    fn get_pending_contributions_total(&self, callback: Completion<f64>) {
        self.park("get_pending_contributions_total", callback);
    }

    fn get_publisher_activity_from_url(&self, tab_id: TabId, host: &str) {
        self.record(format!("get_publisher_activity_from_url:{}:{}", tab_id, host));
    }

    fn set_publisher_exclude(&self, publisher_key: &str, exclude: bool, callback: Completion<()>) {
        self.record(format!("set_publisher_exclude:{}:{}", publisher_key, exclude));
        self.park("set_publisher_exclude", callback);
    }

    fn refresh_publisher(&self, publisher_key: &str, callback: Completion<PublisherStatus>) {
        self.record(format!("refresh_publisher:{}", publisher_key));
        self.park("refresh_publisher", callback);
    }

    fn send_tip(
        &self,
        publisher_key: &str,
        amount: f64,
        recurring: bool,
        callback: Completion<()>,
    ) {
        self.record(format!("send_tip:{}:{}:{}", publisher_key, amount, recurring));
        self.park("send_tip", callback);
    }

    fn get_recurring_tips(&self, callback: Completion<Vec<RecurringDonation>>) {
        self.park("get_recurring_tips", callback);
    }

    fn remove_recurring_tip(&self, publisher_key: &str, callback: Completion<()>) {
        self.record(format!("remove_recurring_tip:{}", publisher_key));
        self.park("remove_recurring_tip", callback);
    }

    fn get_auto_contribute_properties(
        &self,
        callback: Completion<Option<AutoContributeProperties>>,
    ) {
        self.park("get_auto_contribute_properties", callback);
    }

    fn set_auto_contribute_enabled(&self, enabled: bool, callback: Completion<()>) {
        self.record(format!("set_auto_contribute_enabled:{}", enabled));
        self.park("set_auto_contribute_enabled", callback);
    }

    fn set_auto_contribution_amount(&self, amount: f64, callback: Completion<()>) {
        self.record(format!("set_auto_contribution_amount:{}", amount));
        self.park("set_auto_contribution_amount", callback);
    }

    fn fetch_promotions(&self, callback: Completion<Vec<Promotion>>) {
        self.park("fetch_promotions", callback);
    }

    fn claim_promotion(&self, promotion_id: &str, callback: Completion<Option<Promotion>>) {
        self.record(format!("claim_promotion:{}", promotion_id));
        self.park("claim_promotion", callback);
    }

    fn get_all_notifications(&self) {
        self.record("get_all_notifications".to_string());
    }

    fn delete_notification(&self, notification_id: &str) {
        self.record(format!("delete_notification:{}", notification_id));
    }

    fn get_external_wallet(&self, wallet_type: &str, callback: Completion<Option<ExternalWallet>>) {
        self.record(format!("get_external_wallet:{}", wallet_type));
        self.park("get_external_wallet", callback);
    }

    fn disconnect_wallet(&self, wallet_type: &str) {
        self.record(format!("disconnect_wallet:{}", wallet_type));
    }

    fn process_rewards_page_url(
        &self,
        path: &str,
        query: &str,
        callback: Completion<RewardsPageAction>,
    ) {
        self.record(format!("process_rewards_page_url:{}?{}", path, query));
        self.park("process_rewards_page_url", callback);
    }

    fn recover_wallet(&self, _pass_phrase: &str) {
        self.record("recover_wallet".to_string());
    }

    fn set_ads_per_hour(&self, value: u32) {
        self.record(format!("set_ads_per_hour:{}", value));
    }

    fn start_process(&self) {
        self.record("start_process".to_string());
    }

    fn reset_the_whole_state(&self, callback: Completion<()>) {
        self.park("reset_the_whole_state", callback);
    }
}

// ── Fixtures ──

pub fn setup() -> (Arc<ScriptedService>, RewardsBridge) {
    setup_with(BridgeConfig::default())
}

pub fn setup_with(config: BridgeConfig) -> (Arc<ScriptedService>, RewardsBridge) {
    let service = Arc::new(ScriptedService::default());
    let dyn_service: Arc<dyn IRewardsService> = service.clone();
    let bridge = RewardsBridge::new(&dyn_service, config).unwrap();
    (service, bridge)
}

pub fn drain(rx: &Receiver<BridgeEvent>) -> Vec<BridgeEvent> {
    rx.try_iter().collect()
}

pub fn failures(events: &[BridgeEvent]) -> usize {
    events.iter().filter(|e| e.is_failure()).count()
}

pub fn publisher(key: &str, name: &str) -> PublisherInfo {
    PublisherInfo {
        id: key.to_string(),
        name: name.to_string(),
        url: format!("https://{}/", key),
        favicon_url: format!("https://{}/favicon.ico", key),
        percent: 25,
        excluded: false,
        status: PublisherStatus::Verified,
        provider: String::new(),
        tab_id: None,
    }
}

pub fn recurring(key: &str, amount: f64) -> RecurringDonation {
    RecurringDonation {
        publisher: publisher(key, key),
        amount,
    }
}

pub fn notification(id: &str) -> Notification {
    Notification {
        id: id.to_string(),
        notification_type: NotificationType::default(),
        timestamp: 1_700_000_000,
        args: Vec::new(),
    }
}

pub fn promotion(id: &str, amount: f64) -> Promotion {
    Promotion {
        id: id.to_string(),
        amount,
        promotion_type: PromotionType::Ugp,
        expires_at: 1_900_000_000,
        status: PromotionStatus::Active,
    }
}

pub fn balance(total: f64) -> Balance {
    let mut wallets = std::collections::BTreeMap::new();
    wallets.insert("anonymous".to_string(), total);
    Balance { total, wallets }
}
