use super::{FeedbackId, OrderId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewType {
    BuyerOnSeller,
    SellerOnBuyer,
}

/// One party's review of the other after a released order. At most one per
/// `(order, reviewer)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: FeedbackId,
    pub order_id: OrderId,
    pub reviewer_id: UserId,
    pub reviewee_id: UserId,
    /// 1 to 5; 4 and above counts positive, 2 and below negative.
    pub score: u8,
    pub comment: Option<String>,
    pub review_type: ReviewType,
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    pub fn is_positive(&self) -> bool {
        self.score >= 4
    }

    pub fn is_negative(&self) -> bool {
        self.score <= 2
    }
}
