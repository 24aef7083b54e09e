use super::ids::IdSeq;
use super::ledger::Ledger;
use super::locks::LockRegistry;
use crate::domain::dispute::{Dispute, Verdict};
use crate::domain::ledger::EntryKind;
use crate::domain::order::Order;
use crate::domain::ports::{DisputeStoreRef, NotificationSinkRef, OrderStoreRef};
use crate::domain::{DisputeId, OrderId, UserId};
use crate::error::{EscrowError, Result};
use std::sync::Arc;

/// Freezes escrowed funds behind an adjudication and maps the verdict back
/// to the ledger.
///
/// This is the only writer of dispute status and the only path out of a
/// DISPUTED order. Caller identity for `resolve` is checked at the adapter
/// boundary; the resolver itself guards state, not identity.
pub struct DisputeResolver {
    disputes: DisputeStoreRef,
    orders: OrderStoreRef,
    ledger: Arc<Ledger>,
    /// Shared with the lifecycle engine so order transitions stay
    /// single-writer across both components.
    order_locks: Arc<LockRegistry>,
    notifier: NotificationSinkRef,
    seq: IdSeq,
}

impl DisputeResolver {
    pub async fn new(
        disputes: DisputeStoreRef,
        orders: OrderStoreRef,
        ledger: Arc<Ledger>,
        order_locks: Arc<LockRegistry>,
        notifier: NotificationSinkRef,
    ) -> Result<Self> {
        let last_id = disputes.max_id().await?;
        Ok(Self {
            disputes,
            orders,
            ledger,
            order_locks,
            notifier,
            seq: IdSeq::starting_after(last_id),
        })
    }

    /// Opens a dispute on a funds-held order. Either party may open one;
    /// the order freezes in DISPUTED until an operator resolves it.
    pub async fn open(
        &self,
        order_id: OrderId,
        acting_user: UserId,
        reason: &str,
    ) -> Result<Dispute> {
        let _guard = self.order_locks.acquire(order_id).await;
        let mut order = self.load_order(order_id).await?;

        if acting_user != order.buyer_id && acting_user != order.seller_id {
            return Err(EscrowError::NotAuthorized {
                user_id: acting_user,
                action: format!("dispute order {order_id}"),
            });
        }
        order.mark_disputed()?;

        let dispute = Dispute::new(self.seq.next(), order_id, acting_user, reason);
        self.disputes.store(dispute.clone()).await?;
        self.orders.store(order.clone()).await?;
        tracing::info!(order_id, dispute_id = dispute.id, acting_user, "dispute opened");

        let counterpart = if acting_user == order.buyer_id {
            order.seller_id
        } else {
            order.buyer_id
        };
        self.notifier
            .notify(
                counterpart,
                &format!("Order #{order_id} is now disputed: {reason}"),
            )
            .await;
        Ok(dispute)
    }

    /// Applies an operator verdict to an open dispute.
    ///
    /// Buyer verdict refunds the hold and the order ends REFUNDED. Seller
    /// verdict closes the hold as a payout and the order re-enters RELEASED
    /// for the withdrawal worker to complete. A resolution interrupted by a
    /// storage fault is retried with the same verdict until the order has
    /// left DISPUTED.
    pub async fn resolve(&self, dispute_id: DisputeId, verdict: Verdict) -> Result<Order> {
        let mut dispute = self
            .disputes
            .get(dispute_id)
            .await?
            .ok_or(EscrowError::DisputeNotFound { dispute_id })?;

        let _guard = self.order_locks.acquire(dispute.order_id).await;
        let mut order = self.load_order(dispute.order_id).await?;

        // A retried resolution can find the dispute already recorded closed
        // while the order write is still missing. The same verdict picks up
        // where the failed attempt stopped; anything else fails in `close`.
        if dispute.status != verdict.closed_status() {
            dispute.close(verdict)?;
        }
        let hold_tx = order.hold_tx.ok_or_else(|| {
            EscrowError::Unavailable(Box::new(std::io::Error::other(format!(
                "order {} is disputed but has no hold",
                order.id
            ))))
        })?;

        let (as_refund, expected_close) = match verdict {
            Verdict::Buyer => {
                order.mark_refunded()?;
                (true, EntryKind::Refund)
            }
            Verdict::Seller => {
                order.mark_awarded_seller()?;
                (false, EntryKind::Payout)
            }
        };
        match self.ledger.release_hold(hold_tx, as_refund).await {
            Ok(_) => {}
            // A retried resolution whose earlier attempt already moved the
            // money is fine, as long as it moved the same way.
            Err(EscrowError::AlreadyClosed { .. })
                if self.ledger.closed_as(hold_tx).await? == Some(expected_close) => {}
            Err(e) => return Err(e),
        }
        self.disputes.store(dispute.clone()).await?;
        self.orders.store(order.clone()).await?;
        tracing::info!(
            dispute_id,
            order_id = order.id,
            status = %dispute.status,
            "dispute resolved"
        );

        let outcome = match verdict {
            Verdict::Buyer => format!("Order #{} was refunded to the buyer", order.id),
            Verdict::Seller => format!("Order #{} was awarded to the seller", order.id),
        };
        self.notifier.notify(order.buyer_id, &outcome).await;
        self.notifier.notify(order.seller_id, &outcome).await;
        Ok(order)
    }

    /// Resolves by order id, for surfaces that track orders rather than
    /// dispute ids.
    pub async fn resolve_by_order(&self, order_id: OrderId, verdict: Verdict) -> Result<Order> {
        match self.disputes.open_for_order(order_id).await? {
            Some(dispute) => self.resolve(dispute.id, verdict).await,
            None => {
                let order = self.load_order(order_id).await?;
                Err(EscrowError::InvalidTransition {
                    order_id,
                    from: order.status.as_str().to_string(),
                    op: "resolve".to_string(),
                })
            }
        }
    }

    pub async fn get(&self, dispute_id: DisputeId) -> Result<Dispute> {
        self.disputes
            .get(dispute_id)
            .await?
            .ok_or(EscrowError::DisputeNotFound { dispute_id })
    }

    /// Plain-text adjudication brief for the operator surface.
    pub async fn summary(&self, dispute_id: DisputeId) -> Result<String> {
        let dispute = self.get(dispute_id).await?;
        let order = self.load_order(dispute.order_id).await?;
        Ok(format!(
            "Dispute #{id} [{status}]\n\
             Order #{order_id} ({order_status}), {amount} {asset} in escrow\n\
             Buyer #{buyer} / Seller #{seller}, opened by #{opened_by}\n\
             Reason: {reason}",
            id = dispute.id,
            status = dispute.status,
            order_id = order.id,
            order_status = order.status,
            amount = order.expected_amount,
            asset = order.asset,
            buyer = order.buyer_id,
            seller = order.seller_id,
            opened_by = dispute.opened_by,
            reason = dispute.reason,
        ))
    }

    async fn load_order(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .get(order_id)
            .await?
            .ok_or(EscrowError::OrderNotFound { order_id })
    }
}
