//! Request/response correlation: every asynchronous ledger request is tracked
//! from issue to completion so its callback can be matched to a cache slot.

pub mod request;
pub mod tracker;

pub use request::{CorrelationKey, Operation, PendingRequest, RequestId, RequestState};
pub use tracker::{CorrelatorStats, RequestTracker, TabCorrelation};
