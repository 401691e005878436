//! Promotions (grants) the user can claim.

use serde::{Deserialize, Serialize};

use super::Identified;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PromotionType {
    #[default]
    Ugp,
    Ads,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PromotionStatus {
    #[default]
    Active,
    Attested,
    Finished,
    Over,
    Corrupted,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Promotion {
    pub id: String,
    /// Grant amount in BAT.
    pub amount: f64,
    pub promotion_type: PromotionType,
    /// Expiry as seconds since the Unix epoch.
    pub expires_at: u64,
    pub status: PromotionStatus,
}

impl Identified for Promotion {
    fn id(&self) -> &str {
        &self.id
    }
}
