use crate::domain::dispute::{Dispute, DisputeStatus};
use crate::domain::feedback::Feedback;
use crate::domain::gig::Gig;
use crate::domain::ledger::{LedgerEntry, Wallet};
use crate::domain::order::Order;
use crate::domain::ports::{
    DisputeStore, EntryStore, FeedbackStore, GigStore, OrderStore, Stores, UserStore, WalletStore,
};
use crate::domain::user::User;
use crate::domain::{DisputeId, FeedbackId, GigId, OrderId, TxId, UserId};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The full in-memory backend: every table wired into one `Stores`.
///
/// This is the default storage and what the test suites run against.
pub fn stores() -> Stores {
    Stores {
        users: Arc::new(InMemoryUserStore::new()),
        gigs: Arc::new(InMemoryGigStore::new()),
        orders: Arc::new(InMemoryOrderStore::new()),
        disputes: Arc::new(InMemoryDisputeStore::new()),
        feedback: Arc::new(InMemoryFeedbackStore::new()),
        wallets: Arc::new(InMemoryWalletStore::new()),
        entries: Arc::new(InMemoryEntryStore::new()),
    }
}

/// A thread-safe in-memory store for users.
///
/// Uses `Arc<RwLock<HashMap<u64, User>>>` to allow shared concurrent access.
/// Ideal for testing or small datasets where persistence is not required;
/// every other table here follows the same shape.
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn store(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        users.insert(user.id, user);
        Ok(())
    }

    async fn get(&self, user_id: UserId) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).cloned())
    }

    async fn by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.external_id == external_id).cloned())
    }

    async fn max_id(&self) -> Result<UserId> {
        let users = self.users.read().await;
        Ok(users.keys().max().copied().unwrap_or(0))
    }
}

/// In-memory gig catalog.
#[derive(Default, Clone)]
pub struct InMemoryGigStore {
    gigs: Arc<RwLock<HashMap<GigId, Gig>>>,
}

impl InMemoryGigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GigStore for InMemoryGigStore {
    async fn store(&self, gig: Gig) -> Result<()> {
        let mut gigs = self.gigs.write().await;
        gigs.insert(gig.id, gig);
        Ok(())
    }

    async fn get(&self, gig_id: GigId) -> Result<Option<Gig>> {
        let gigs = self.gigs.read().await;
        Ok(gigs.get(&gig_id).cloned())
    }

    async fn active(&self) -> Result<Vec<Gig>> {
        let gigs = self.gigs.read().await;
        Ok(gigs.values().filter(|g| g.active).cloned().collect())
    }

    async fn by_seller(&self, seller_id: UserId) -> Result<Vec<Gig>> {
        let gigs = self.gigs.read().await;
        Ok(gigs
            .values()
            .filter(|g| g.seller_id == seller_id)
            .cloned()
            .collect())
    }

    async fn max_id(&self) -> Result<GigId> {
        let gigs = self.gigs.read().await;
        Ok(gigs.keys().max().copied().unwrap_or(0))
    }
}

/// In-memory order table.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn store(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id, order);
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(&order_id).cloned())
    }

    async fn for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|o| o.buyer_id == user_id || o.seller_id == user_id)
            .cloned()
            .collect())
    }

    async fn all(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.values().cloned().collect())
    }

    async fn max_id(&self) -> Result<OrderId> {
        let orders = self.orders.read().await;
        Ok(orders.keys().max().copied().unwrap_or(0))
    }
}

/// In-memory dispute table.
#[derive(Default, Clone)]
pub struct InMemoryDisputeStore {
    disputes: Arc<RwLock<HashMap<DisputeId, Dispute>>>,
}

impl InMemoryDisputeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DisputeStore for InMemoryDisputeStore {
    async fn store(&self, dispute: Dispute) -> Result<()> {
        let mut disputes = self.disputes.write().await;
        disputes.insert(dispute.id, dispute);
        Ok(())
    }

    async fn get(&self, dispute_id: DisputeId) -> Result<Option<Dispute>> {
        let disputes = self.disputes.read().await;
        Ok(disputes.get(&dispute_id).cloned())
    }

    async fn open_for_order(&self, order_id: OrderId) -> Result<Option<Dispute>> {
        let disputes = self.disputes.read().await;
        Ok(disputes
            .values()
            .find(|d| d.order_id == order_id && d.status == DisputeStatus::Open)
            .cloned())
    }

    async fn max_id(&self) -> Result<DisputeId> {
        let disputes = self.disputes.read().await;
        Ok(disputes.keys().max().copied().unwrap_or(0))
    }
}

/// In-memory feedback table.
#[derive(Default, Clone)]
pub struct InMemoryFeedbackStore {
    feedback: Arc<RwLock<HashMap<FeedbackId, Feedback>>>,
}

impl InMemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedbackStore for InMemoryFeedbackStore {
    async fn store(&self, feedback: Feedback) -> Result<()> {
        let mut rows = self.feedback.write().await;
        rows.insert(feedback.id, feedback);
        Ok(())
    }

    async fn by_order_and_reviewer(
        &self,
        order_id: OrderId,
        reviewer_id: UserId,
    ) -> Result<Option<Feedback>> {
        let rows = self.feedback.read().await;
        Ok(rows
            .values()
            .find(|f| f.order_id == order_id && f.reviewer_id == reviewer_id)
            .cloned())
    }

    async fn for_reviewee(&self, reviewee_id: UserId) -> Result<Vec<Feedback>> {
        let rows = self.feedback.read().await;
        Ok(rows
            .values()
            .filter(|f| f.reviewee_id == reviewee_id)
            .cloned()
            .collect())
    }

    async fn max_id(&self) -> Result<FeedbackId> {
        let rows = self.feedback.read().await;
        Ok(rows.keys().max().copied().unwrap_or(0))
    }
}

/// In-memory wallet table, keyed by owner.
#[derive(Default, Clone)]
pub struct InMemoryWalletStore {
    wallets: Arc<RwLock<HashMap<UserId, Wallet>>>,
}

impl InMemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletStore for InMemoryWalletStore {
    async fn store(&self, wallet: Wallet) -> Result<()> {
        let mut wallets = self.wallets.write().await;
        wallets.insert(wallet.user_id, wallet);
        Ok(())
    }

    async fn get(&self, user_id: UserId) -> Result<Option<Wallet>> {
        let wallets = self.wallets.read().await;
        Ok(wallets.get(&user_id).cloned())
    }

    async fn all(&self) -> Result<Vec<Wallet>> {
        let wallets = self.wallets.read().await;
        Ok(wallets.values().cloned().collect())
    }
}

/// In-memory append-only ledger log.
///
/// `for_user` returns entries sorted by id so the balance fold sees them in
/// the order they were appended.
#[derive(Default, Clone)]
pub struct InMemoryEntryStore {
    entries: Arc<RwLock<HashMap<TxId, LedgerEntry>>>,
}

impl InMemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntryStore for InMemoryEntryStore {
    async fn append(&self, entry: LedgerEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(entry.id, entry);
        Ok(())
    }

    async fn get(&self, tx_id: TxId) -> Result<Option<LedgerEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(&tx_id).cloned())
    }

    async fn for_user(&self, user_id: UserId) -> Result<Vec<LedgerEntry>> {
        let entries = self.entries.read().await;
        let mut log: Vec<LedgerEntry> = entries
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        log.sort_by_key(|e| e.id);
        Ok(log)
    }

    async fn max_id(&self) -> Result<TxId> {
        let entries = self.entries.read().await;
        Ok(entries.keys().max().copied().unwrap_or(0))
    }
}
