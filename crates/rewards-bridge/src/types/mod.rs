//! Payload records exchanged with the ledger service (no logic beyond projections).

pub mod ledger_result;
pub mod notification;
pub mod parameters;
pub mod promotion;
pub mod publisher;
pub mod wallet;

pub use ledger_result::LedgerResult;
pub use notification::{Notification, NotificationType};
pub use parameters::{AutoContributeProperties, RewardsParameters};
pub use promotion::{Promotion, PromotionStatus, PromotionType};
pub use publisher::{PublisherInfo, PublisherStatus, RecurringDonation, TabId};
pub use wallet::{Balance, BalanceReport, ExternalWallet, RewardsPageAction, WalletStatus};

/// Records stored in a list cache expose a stable string id.
pub trait Identified {
    fn id(&self) -> &str;
}
