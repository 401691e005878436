//! Local cache: value cells, keyed registries and list caches.
//!
//! Every component carries its own coarse `RwLock`. Reads hand out clones so a
//! concurrent writer can never mutate data a reader is holding. Poisoned locks
//! are recovered rather than propagated; a cache must stay queryable.

pub mod list;
pub mod registry;
pub mod value;

pub use list::ListCache;
pub use registry::KeyedRegistry;
pub use value::ValueCell;

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::types::{
    AutoContributeProperties, Balance, BalanceReport, Notification, Promotion, PublisherInfo,
    RecurringDonation, RewardsParameters, TabId,
};

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// Every cached piece of rewards state, owned exclusively by the bridge.
#[derive(Default)]
pub struct RewardsCache {
    pub parameters: ValueCell<RewardsParameters>,
    pub balance: ValueCell<Balance>,
    pub balance_report: ValueCell<BalanceReport>,
    pub auto_contribute: ValueCell<AutoContributeProperties>,
    /// Next reconcile time, seconds since the Unix epoch.
    pub reconcile_stamp: ValueCell<u64>,
    pub pending_contributions_total: ValueCell<f64>,
    pub ads_per_hour: ValueCell<u32>,
    /// Panel publisher info keyed by tab.
    pub publishers: KeyedRegistry<TabId, PublisherInfo>,
    /// Recurring donations keyed by publisher key.
    pub recurring: KeyedRegistry<String, RecurringDonation>,
    /// External wallet addresses keyed by wallet type.
    pub wallet_addresses: KeyedRegistry<String, String>,
    pub notifications: ListCache<Notification>,
    pub promotions: ListCache<Promotion>,
}

impl RewardsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every cached value, returning each component to its empty state.
    pub fn clear(&self) {
        self.parameters.clear();
        self.balance.clear();
        self.balance_report.clear();
        self.auto_contribute.clear();
        self.reconcile_stamp.clear();
        self.pending_contributions_total.clear();
        self.ads_per_hour.clear();
        self.publishers.clear();
        self.recurring.clear();
        self.wallet_addresses.clear();
        self.notifications.clear();
        self.promotions.clear();
    }
}
