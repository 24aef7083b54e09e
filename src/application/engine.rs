use super::catalog::Catalog;
use super::disputes::DisputeResolver;
use super::ids::IdSeq;
use super::ledger::Ledger;
use super::locks::LockRegistry;
use super::payout::PayoutWorker;
use super::reputation::Reputation;
use super::sessions::{GigDraft, SessionStore};
use super::users::UserService;
use crate::config::Settings;
use crate::domain::asset::AssetKind;
use crate::domain::dispute::{Dispute, Verdict};
use crate::domain::feedback::Feedback;
use crate::domain::gig::Gig;
use crate::domain::ledger::EntryKind;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ports::{
    DepositAddressProviderRef, DepositVerifierRef, NotificationSinkRef, OrderStoreRef, Stores,
};
use crate::domain::{DisputeId, GigId, OrderId, UserId};
use crate::error::{EscrowError, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// The escrow engine: one explicit instance owning every service and port,
/// built once at startup and passed by reference into every handler.
///
/// Order lifecycle operations live here. Each one runs its read-check-write
/// inside the per-order critical section; the deposit verifier is the one
/// external call deliberately kept outside it.
pub struct Engine {
    settings: Settings,
    users: UserService,
    catalog: Catalog,
    ledger: Arc<Ledger>,
    disputes: DisputeResolver,
    reputation: Reputation,
    sessions: SessionStore,
    orders: OrderStoreRef,
    order_locks: Arc<LockRegistry>,
    seq: IdSeq,
    /// Verifier per asset, resolved once at construction.
    verifiers: HashMap<AssetKind, DepositVerifierRef>,
    addresses: DepositAddressProviderRef,
    notifier: NotificationSinkRef,
    payout_tx: Mutex<Option<mpsc::UnboundedSender<OrderId>>>,
}

impl Engine {
    /// Builds the engine and its payout worker. The worker is returned
    /// unstarted; spawn `worker.run()` to settle released orders.
    ///
    /// Fails if any supported asset lacks a deposit verifier; nothing
    /// resolves providers after this point.
    pub async fn new(
        stores: Stores,
        verifiers: HashMap<AssetKind, DepositVerifierRef>,
        addresses: DepositAddressProviderRef,
        notifier: NotificationSinkRef,
        settings: Settings,
    ) -> Result<(Arc<Self>, PayoutWorker)> {
        for asset in AssetKind::ALL {
            if !verifiers.contains_key(&asset) {
                return Err(EscrowError::InvalidInput(format!(
                    "no deposit verifier configured for {asset}"
                )));
            }
        }

        let order_locks = Arc::new(LockRegistry::new());
        let ledger = Arc::new(
            Ledger::new(
                stores.wallets.clone(),
                stores.entries.clone(),
                settings.asset,
            )
            .await?,
        );
        let users = UserService::new(stores.users.clone()).await?;
        let catalog = Catalog::new(stores.gigs.clone(), stores.users.clone()).await?;
        let disputes = DisputeResolver::new(
            stores.disputes.clone(),
            stores.orders.clone(),
            ledger.clone(),
            order_locks.clone(),
            notifier.clone(),
        )
        .await?;
        let reputation = Reputation::new(
            stores.feedback.clone(),
            stores.orders.clone(),
            stores.users.clone(),
            order_locks.clone(),
        )
        .await?;
        let sessions = SessionStore::new(settings.session_capacity, settings.session_ttl);
        let seq = IdSeq::starting_after(stores.orders.max_id().await?);
        let (tx, rx) = mpsc::unbounded_channel();

        let engine = Arc::new(Self {
            settings,
            users,
            catalog,
            ledger,
            disputes,
            reputation,
            sessions,
            orders: stores.orders,
            order_locks,
            seq,
            verifiers,
            addresses,
            notifier,
            payout_tx: Mutex::new(Some(tx)),
        });
        let worker = PayoutWorker::new(engine.clone(), rx);
        Ok((engine, worker))
    }

    /// Opens an order for an active gig: allocates a deposit address and
    /// waits for the buyer's payment.
    pub async fn create_order(&self, gig_id: GigId, buyer_id: UserId) -> Result<Order> {
        let gig = self.catalog.active_gig(gig_id).await?;
        let buyer = self.users.get(buyer_id).await?;
        if buyer.id == gig.seller_id {
            return Err(EscrowError::SelfPurchase { gig_id });
        }

        let order_id = self.seq.next();
        let address = self
            .addresses
            .new_deposit_address(order_id, gig.asset)
            .await?;
        let order = Order::new(order_id, &gig, buyer_id, address, self.settings.escrow_fee_pct);
        self.orders.store(order.clone()).await?;
        tracing::info!(order_id, gig_id, buyer_id, seller_id = gig.seller_id, "order created");

        self.notifier
            .notify(
                gig.seller_id,
                &format!("Your gig '{}' was ordered (order #{order_id})", gig.title),
            )
            .await;
        Ok(order)
    }

    /// Confirms the buyer's deposit against the external chain.
    ///
    /// The verifier runs outside the order lock. On a positive verdict the
    /// buyer's wallet is credited and immediately held for the escrowed
    /// amount, and the order moves to FUNDS_HELD. Both ledger writes are
    /// keyed to this order and the claimed reference, so a replayed
    /// confirmation cannot credit or hold twice; a concurrent one loses the
    /// re-check under the lock. Claiming one chain transfer for two
    /// different orders is the verifier's domain to reject.
    pub async fn confirm_deposit(&self, order_id: OrderId, claimed_ref: &str) -> Result<Order> {
        let order = self.load_order(order_id).await?;
        Self::ensure_awaiting_deposit(&order)?;

        let verifier = self.verifier_for(order.asset)?;
        let verified = verifier
            .verify(&order.deposit_address, claimed_ref, order.expected_amount)
            .await;
        if !verified {
            tracing::warn!(order_id, claimed_ref, "deposit rejected by verifier");
            return Err(EscrowError::DepositRejected {
                order_id,
                claimed_ref: claimed_ref.to_string(),
            });
        }

        let _guard = self.order_locks.acquire(order_id).await;
        let mut order = self.load_order(order_id).await?;
        Self::ensure_awaiting_deposit(&order)?;

        let ledger_ref = format!("order-{order_id}:{claimed_ref}");
        self.ledger
            .deposit(order.buyer_id, order.expected_amount, Some(&ledger_ref))
            .await?;
        let hold = self
            .ledger
            .hold(order.buyer_id, order.expected_amount, Some(&ledger_ref))
            .await?;
        order.mark_funds_held(hold.id, claimed_ref)?;
        self.orders.store(order.clone()).await?;
        tracing::info!(order_id, hold_tx = hold.id, "deposit confirmed, funds held");

        self.notifier
            .notify(
                order.seller_id,
                &format!("Order #{order_id} is funded; you can start working"),
            )
            .await;
        Ok(order)
    }

    /// Buyer accepts the delivered work. The order releases and a payout job
    /// is queued; funds stay held until the worker settles it.
    pub async fn release(&self, order_id: OrderId, acting_user: UserId) -> Result<Order> {
        let _guard = self.order_locks.acquire(order_id).await;
        let mut order = self.load_order(order_id).await?;

        if order.status == OrderStatus::FundsHeld && acting_user != order.buyer_id {
            return Err(EscrowError::NotAuthorized {
                user_id: acting_user,
                action: format!("release order {order_id}"),
            });
        }
        order.mark_released()?;
        self.orders.store(order.clone()).await?;
        self.schedule_payout(order_id);
        tracing::info!(order_id, "buyer released escrow");

        self.notifier
            .notify(
                order.seller_id,
                &format!("Order #{order_id} was released; payout is on the way"),
            )
            .await;
        Ok(order)
    }

    /// Freezes a funded order behind a dispute. Buyer or seller only.
    pub async fn open_dispute(
        &self,
        order_id: OrderId,
        acting_user: UserId,
        reason: &str,
    ) -> Result<Dispute> {
        self.disputes.open(order_id, acting_user, reason).await
    }

    /// Applies an operator verdict and, when the seller wins, queues the
    /// payout that completes the order.
    pub async fn resolve_dispute(&self, dispute_id: DisputeId, verdict: Verdict) -> Result<Order> {
        let order = self.disputes.resolve(dispute_id, verdict).await?;
        if order.status == OrderStatus::Released {
            self.schedule_payout(order.id);
        }
        Ok(order)
    }

    /// `resolve_dispute` keyed by order instead of dispute id.
    pub async fn resolve_dispute_by_order(
        &self,
        order_id: OrderId,
        verdict: Verdict,
    ) -> Result<Order> {
        let order = self.disputes.resolve_by_order(order_id, verdict).await?;
        if order.status == OrderStatus::Released {
            self.schedule_payout(order.id);
        }
        Ok(order)
    }

    /// Settles a released order: closes its hold as a payout and completes
    /// it. Idempotent for redelivered jobs, and tolerant of a hold a seller
    /// verdict already paid out.
    pub async fn complete_withdrawal(&self, order_id: OrderId) -> Result<Order> {
        let _guard = self.order_locks.acquire(order_id).await;
        let mut order = self.load_order(order_id).await?;

        if order.status == OrderStatus::Completed {
            return Ok(order);
        }
        if order.status != OrderStatus::Released {
            return Err(EscrowError::InvalidTransition {
                order_id,
                from: order.status.as_str().to_string(),
                op: "complete_withdrawal".to_string(),
            });
        }
        let hold_tx = order.hold_tx.ok_or_else(|| {
            EscrowError::Unavailable(Box::new(std::io::Error::other(format!(
                "order {order_id} released without a hold"
            ))))
        })?;

        match self.ledger.release_hold(hold_tx, false).await {
            Ok(_) => {}
            Err(EscrowError::AlreadyClosed { .. })
                if self.ledger.closed_as(hold_tx).await? == Some(EntryKind::Payout) => {}
            Err(e) => return Err(e),
        }
        order.mark_completed()?;
        self.orders.store(order.clone()).await?;
        tracing::info!(order_id, "withdrawal completed");

        self.notifier
            .notify(
                order.seller_id,
                &format!("Payout for order #{order_id} left custody"),
            )
            .await;
        Ok(order)
    }

    /// Turns a finished wizard draft into a published gig, priced in the
    /// platform's custody asset.
    pub async fn publish_draft(&self, seller_id: UserId, draft: GigDraft) -> Result<Gig> {
        self.catalog
            .create_gig(
                seller_id,
                &draft.title,
                &draft.description,
                draft.price.value(),
                self.settings.asset,
            )
            .await
    }

    pub async fn record_feedback(
        &self,
        order_id: OrderId,
        reviewer_id: UserId,
        score: u8,
        comment: Option<&str>,
    ) -> Result<Feedback> {
        self.reputation
            .record_feedback(order_id, reviewer_id, score, comment)
            .await
    }

    pub async fn order(&self, order_id: OrderId) -> Result<Order> {
        self.load_order(order_id).await
    }

    /// Orders where the user is buyer or seller, newest first.
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let mut orders = self.orders.for_user(user_id).await?;
        orders.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(orders)
    }

    pub async fn all_orders(&self) -> Result<Vec<Order>> {
        let mut orders = self.orders.all().await?;
        orders.sort_by_key(|o| o.id);
        Ok(orders)
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn disputes(&self) -> &DisputeResolver {
        &self.disputes
    }

    pub fn reputation(&self) -> &Reputation {
        &self.reputation
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Closes the payout queue; the worker drains queued jobs and exits.
    /// Releases after this point log a warning instead of queueing.
    pub fn close_payout_queue(&self) {
        self.payout_tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
    }

    fn schedule_payout(&self, order_id: OrderId) {
        let guard = self.payout_tx.lock().unwrap_or_else(|e| e.into_inner());
        let sent = guard.as_ref().is_some_and(|tx| tx.send(order_id).is_ok());
        if !sent {
            tracing::warn!(order_id, "payout queue closed; withdrawal must be driven manually");
        }
    }

    fn verifier_for(&self, asset: AssetKind) -> Result<&DepositVerifierRef> {
        self.verifiers.get(&asset).ok_or_else(|| {
            EscrowError::Unavailable(Box::new(std::io::Error::other(format!(
                "no deposit verifier for {asset}"
            ))))
        })
    }

    fn ensure_awaiting_deposit(order: &Order) -> Result<()> {
        if order.status == OrderStatus::AwaitDeposit {
            Ok(())
        } else {
            Err(EscrowError::InvalidTransition {
                order_id: order.id,
                from: order.status.as_str().to_string(),
                op: "confirm_deposit".to_string(),
            })
        }
    }

    async fn load_order(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .get(order_id)
            .await?
            .ok_or(EscrowError::OrderNotFound { order_id })
    }
}
