//! RequestTracker: the pending-request table plus publisher-tab tombstones.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::request::{CorrelationKey, Operation, PendingRequest, RequestId, RequestState};
use crate::config::bridge_config::DEFAULT_STALLED_REQUEST_SECS;
use crate::types::TabId;

/// How an observer-delivered publisher-info callback relates to issued requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabCorrelation {
    /// Answers the oldest outstanding fetch for the tab.
    Pending(RequestId),
    /// No fetch outstanding and the tab was never evicted (e.g. pushed on navigation).
    Unsolicited,
    /// The tab was removed while a fetch for it was outstanding.
    Evicted,
}

/// Counters for correlation outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrelatorStats {
    pub issued: u64,
    pub fulfilled: u64,
    pub failed: u64,
    /// Completions that matched no outstanding request.
    pub misses: u64,
    /// Callbacks dropped because their key is no longer of interest.
    pub discarded: u64,
    /// Observer-routed requests abandoned after outliving the expiry.
    pub expired: u64,
}

#[derive(Default)]
struct TrackerState {
    pending: HashMap<RequestId, PendingRequest>,
    /// Tabs removed with a fetch in flight, and when. Lifted by a new fetch
    /// or once older than the expiry.
    evicted_tabs: HashMap<TabId, DateTime<Utc>>,
}

pub struct RequestTracker {
    state: Mutex<TrackerState>,
    expiry: Duration,
    issued: AtomicU64,
    fulfilled: AtomicU64,
    failed: AtomicU64,
    misses: AtomicU64,
    discarded: AtomicU64,
    expired: AtomicU64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::with_expiry(Duration::seconds(DEFAULT_STALLED_REQUEST_SECS as i64))
    }

    /// Observer-routed requests and tab tombstones older than `expiry` are
    /// dropped on the next `issue` or `expire`.
    pub fn with_expiry(expiry: Duration) -> Self {
        Self {
            state: Mutex::new(TrackerState::default()),
            expiry,
            issued: AtomicU64::new(0),
            fulfilled: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            expired: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a new outstanding request. A fetch for a tab lifts that tab's eviction.
    pub fn issue(&self, operation: Operation, key: CorrelationKey) -> RequestId {
        let id = RequestId::new();
        let sequence = self.issued.fetch_add(1, Ordering::Relaxed);
        let now = Utc::now();
        let mut state = self.lock();
        self.expire_locked(&mut state, now);
        if let CorrelationKey::Tab(tab) = &key {
            state.evicted_tabs.remove(tab);
        }
        state.pending.insert(
            id,
            PendingRequest {
                id,
                operation,
                key,
                sequence,
                issued_at: now,
                state: RequestState::Issued,
            },
        );
        id
    }

    /// Move a request to a terminal state. Returns the request if it was
    /// outstanding, `None` for a correlation miss (duplicate or unknown id).
    pub fn resolve(&self, id: RequestId, outcome: RequestState) -> Option<PendingRequest> {
        let resolved = self.lock().pending.remove(&id);
        match resolved {
            Some(mut request) => {
                request.state = outcome;
                self.count_outcome(outcome);
                Some(request)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(request = %id, "Completion matched no outstanding request");
                None
            }
        }
    }

    /// Resolve the oldest outstanding `operation` request for `key`, if any.
    /// Used for results delivered through the observer rather than a completion.
    pub fn resolve_oldest(
        &self,
        operation: Operation,
        key: &CorrelationKey,
        outcome: RequestState,
    ) -> Option<RequestId> {
        let id = take_oldest(&mut self.lock(), operation, key)?;
        self.count_outcome(outcome);
        Some(id)
    }

    /// Classify a publisher-info callback for `tab`. An outstanding fetch is
    /// resolved (oldest first) with `outcome`.
    pub fn correlate_tab(&self, tab: TabId, outcome: RequestState) -> TabCorrelation {
        let mut state = self.lock();
        let key = CorrelationKey::Tab(tab);
        if let Some(id) = take_oldest(&mut state, Operation::FetchPublisherInfo, &key) {
            self.count_outcome(outcome);
            return TabCorrelation::Pending(id);
        }
        if state.evicted_tabs.contains_key(&tab) {
            return TabCorrelation::Evicted;
        }
        TabCorrelation::Unsolicited
    }

    fn count_outcome(&self, outcome: RequestState) {
        match outcome {
            RequestState::Failed => self.failed.fetch_add(1, Ordering::Relaxed),
            _ => self.fulfilled.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Drop outstanding fetches for `tab`. If any were dropped, later
    /// callbacks for the tab are reported as [`TabCorrelation::Evicted`]
    /// until a new fetch or the expiry. Returns the number dropped.
    pub fn evict_tab(&self, tab: TabId) -> usize {
        let mut state = self.lock();
        let before = state.pending.len();
        state.pending.retain(|_, r| {
            !(r.operation == Operation::FetchPublisherInfo && r.key == CorrelationKey::Tab(tab))
        });
        let dropped = before - state.pending.len();
        if dropped > 0 {
            state.evicted_tabs.insert(tab, Utc::now());
        }
        dropped
    }

    pub fn is_tab_evicted(&self, tab: TabId) -> bool {
        self.lock().evicted_tabs.contains_key(&tab)
    }

    pub fn tombstone_count(&self) -> usize {
        self.lock().evicted_tabs.len()
    }

    /// Forget all tab evictions (after a full state reset).
    pub fn clear_evictions(&self) {
        self.lock().evicted_tabs.clear();
    }

    pub fn record_discard(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Abandon observer-routed requests and drop tombstones older than the
    /// expiry as of `now`. Returns the abandoned requests, oldest first.
    pub fn expire(&self, now: DateTime<Utc>) -> Vec<PendingRequest> {
        self.expire_locked(&mut self.lock(), now)
    }

    fn expire_locked(&self, state: &mut TrackerState, now: DateTime<Utc>) -> Vec<PendingRequest> {
        let expiry = self.expiry;
        state.evicted_tabs.retain(|_, at| now - *at <= expiry);

        let stale: Vec<RequestId> = state
            .pending
            .values()
            .filter(|r| r.operation.is_observer_routed() && now - r.issued_at > expiry)
            .map(|r| r.id)
            .collect();
        let mut abandoned: Vec<PendingRequest> = stale
            .iter()
            .filter_map(|id| state.pending.remove(id))
            .map(|mut r| {
                r.state = RequestState::Abandoned;
                r
            })
            .collect();
        if !abandoned.is_empty() {
            self.expired.fetch_add(abandoned.len() as u64, Ordering::Relaxed);
            debug!(count = abandoned.len(), "Expired unanswered observer requests");
        }
        abandoned.sort_by_key(|r| r.sequence);
        abandoned
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    /// Copy of outstanding requests, oldest first.
    pub fn pending(&self) -> Vec<PendingRequest> {
        let mut requests: Vec<PendingRequest> = self.lock().pending.values().cloned().collect();
        requests.sort_by_key(|r| r.sequence);
        requests
    }

    /// Mark every outstanding request abandoned and return them, oldest first.
    pub fn abandon_all(&self) -> Vec<PendingRequest> {
        let mut abandoned: Vec<PendingRequest> = self
            .lock()
            .pending
            .drain()
            .map(|(_, mut r)| {
                r.state = RequestState::Abandoned;
                r
            })
            .collect();
        abandoned.sort_by_key(|r| r.sequence);
        abandoned
    }

    pub fn stats(&self) -> CorrelatorStats {
        CorrelatorStats {
            issued: self.issued.load(Ordering::Relaxed),
            fulfilled: self.fulfilled.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }
}

fn take_oldest(
    state: &mut TrackerState,
    operation: Operation,
    key: &CorrelationKey,
) -> Option<RequestId> {
    let id = state
        .pending
        .values()
        .filter(|r| r.operation == operation && r.key == *key)
        .min_by_key(|r| r.sequence)
        .map(|r| r.id)?;
    state.pending.remove(&id);
    Some(id)
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self::new()
    }
}
