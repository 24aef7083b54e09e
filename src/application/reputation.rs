use super::ids::IdSeq;
use super::locks::LockRegistry;
use crate::domain::feedback::{Feedback, ReviewType};
use crate::domain::order::OrderStatus;
use crate::domain::ports::{FeedbackStoreRef, OrderStoreRef, UserStoreRef};
use crate::domain::{OrderId, UserId};
use crate::error::{EscrowError, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Trust data derived from feedback and order history.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub user_id: UserId,
    /// Mean score across received reviews, two decimals; `None` until the
    /// first review lands.
    pub avg_score: Option<Decimal>,
    pub review_count: usize,
    pub positive_feedback: u32,
    pub negative_feedback: u32,
    /// Sales and purchases that reached RELEASED or later.
    pub completed_sales: usize,
    pub completed_purchases: usize,
}

/// Records post-sale reviews and aggregates them into user trust profiles.
pub struct Reputation {
    feedback: FeedbackStoreRef,
    orders: OrderStoreRef,
    users: UserStoreRef,
    /// Serializes the check-then-insert per order so a reviewer cannot slip
    /// in two rows concurrently. Shared with the lifecycle engine.
    order_locks: Arc<LockRegistry>,
    user_locks: LockRegistry,
    seq: IdSeq,
}

impl Reputation {
    pub async fn new(
        feedback: FeedbackStoreRef,
        orders: OrderStoreRef,
        users: UserStoreRef,
        order_locks: Arc<LockRegistry>,
    ) -> Result<Self> {
        let last_id = feedback.max_id().await?;
        Ok(Self {
            feedback,
            orders,
            users,
            order_locks,
            user_locks: LockRegistry::new(),
            seq: IdSeq::starting_after(last_id),
        })
    }

    /// Records one party's review of the other after the order released.
    ///
    /// Accepted while the order is RELEASED or COMPLETED (the withdrawal
    /// worker may finish the order before either party reviews). The
    /// reviewee is always the counterparty; scores of 4 and above bump their
    /// positive counter, 2 and below the negative one.
    pub async fn record_feedback(
        &self,
        order_id: OrderId,
        reviewer_id: UserId,
        score: u8,
        comment: Option<&str>,
    ) -> Result<Feedback> {
        if !(1..=5).contains(&score) {
            return Err(EscrowError::InvalidScore(score));
        }

        let _order_guard = self.order_locks.acquire(order_id).await;
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(EscrowError::OrderNotFound { order_id })?;

        if !matches!(order.status, OrderStatus::Released | OrderStatus::Completed) {
            return Err(EscrowError::InvalidTransition {
                order_id,
                from: order.status.as_str().to_string(),
                op: "record_feedback".to_string(),
            });
        }

        let (reviewee_id, review_type) = if reviewer_id == order.buyer_id {
            (order.seller_id, ReviewType::BuyerOnSeller)
        } else if reviewer_id == order.seller_id {
            (order.buyer_id, ReviewType::SellerOnBuyer)
        } else {
            return Err(EscrowError::NotAuthorized {
                user_id: reviewer_id,
                action: format!("review order {order_id}"),
            });
        };

        if self
            .feedback
            .by_order_and_reviewer(order_id, reviewer_id)
            .await?
            .is_some()
        {
            return Err(EscrowError::DuplicateFeedback {
                order_id,
                reviewer_id,
            });
        }

        let feedback = Feedback {
            id: self.seq.next(),
            order_id,
            reviewer_id,
            reviewee_id,
            score,
            comment: comment.map(str::to_string),
            review_type,
            created_at: Utc::now(),
        };
        self.feedback.store(feedback.clone()).await?;
        self.bump_counters(&feedback).await?;
        tracing::info!(order_id, reviewer_id, reviewee_id, score, "feedback recorded");
        Ok(feedback)
    }

    /// Read-only aggregation over the feedback and order tables.
    pub async fn profile(&self, user_id: UserId) -> Result<Profile> {
        let user = self
            .users
            .get(user_id)
            .await?
            .ok_or(EscrowError::UserNotFound { user_id })?;

        let reviews = self.feedback.for_reviewee(user_id).await?;
        let avg_score = if reviews.is_empty() {
            None
        } else {
            let total: Decimal = reviews.iter().map(|f| Decimal::from(f.score)).sum();
            Some((total / Decimal::from(reviews.len() as u64)).round_dp(2))
        };

        let orders = self.orders.for_user(user_id).await?;
        let reached_release = |status: OrderStatus| {
            matches!(status, OrderStatus::Released | OrderStatus::Completed)
        };
        let completed_sales = orders
            .iter()
            .filter(|o| o.seller_id == user_id && reached_release(o.status))
            .count();
        let completed_purchases = orders
            .iter()
            .filter(|o| o.buyer_id == user_id && reached_release(o.status))
            .count();

        Ok(Profile {
            user_id,
            avg_score,
            review_count: reviews.len(),
            positive_feedback: user.positive_feedback,
            negative_feedback: user.negative_feedback,
            completed_sales,
            completed_purchases,
        })
    }

    async fn bump_counters(&self, feedback: &Feedback) -> Result<()> {
        let _guard = self.user_locks.acquire(feedback.reviewee_id).await;
        let Some(mut user) = self.users.get(feedback.reviewee_id).await? else {
            return Ok(());
        };
        if feedback.is_positive() {
            user.positive_feedback += 1;
        } else if feedback.is_negative() {
            user.negative_feedback += 1;
        }
        self.users.store(user).await
    }
}
