use super::asset::AssetKind;
use super::dispute::Dispute;
use super::feedback::Feedback;
use super::gig::Gig;
use super::ledger::{LedgerEntry, Wallet};
use super::money::Amount;
use super::order::{DepositAddress, Order};
use super::user::User;
use super::{DisputeId, FeedbackId, GigId, OrderId, TxId, UserId};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn store(&self, user: User) -> Result<()>;
    async fn get(&self, user_id: UserId) -> Result<Option<User>>;
    async fn by_external_id(&self, external_id: &str) -> Result<Option<User>>;
    async fn max_id(&self) -> Result<UserId>;
}

#[async_trait]
pub trait GigStore: Send + Sync {
    async fn store(&self, gig: Gig) -> Result<()>;
    async fn get(&self, gig_id: GigId) -> Result<Option<Gig>>;
    async fn active(&self) -> Result<Vec<Gig>>;
    async fn by_seller(&self, seller_id: UserId) -> Result<Vec<Gig>>;
    async fn max_id(&self) -> Result<GigId>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn store(&self, order: Order) -> Result<()>;
    async fn get(&self, order_id: OrderId) -> Result<Option<Order>>;
    async fn for_user(&self, user_id: UserId) -> Result<Vec<Order>>;
    async fn all(&self) -> Result<Vec<Order>>;
    async fn max_id(&self) -> Result<OrderId>;
}

#[async_trait]
pub trait DisputeStore: Send + Sync {
    async fn store(&self, dispute: Dispute) -> Result<()>;
    async fn get(&self, dispute_id: DisputeId) -> Result<Option<Dispute>>;
    async fn open_for_order(&self, order_id: OrderId) -> Result<Option<Dispute>>;
    async fn max_id(&self) -> Result<DisputeId>;
}

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn store(&self, feedback: Feedback) -> Result<()>;
    async fn by_order_and_reviewer(
        &self,
        order_id: OrderId,
        reviewer_id: UserId,
    ) -> Result<Option<Feedback>>;
    async fn for_reviewee(&self, reviewee_id: UserId) -> Result<Vec<Feedback>>;
    async fn max_id(&self) -> Result<FeedbackId>;
}

#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn store(&self, wallet: Wallet) -> Result<()>;
    async fn get(&self, user_id: UserId) -> Result<Option<Wallet>>;
    async fn all(&self) -> Result<Vec<Wallet>>;
}

/// Append-only transaction log. `for_user` returns entries in ascending id
/// order; entry ids give the total order the ledger fold relies on.
#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn append(&self, entry: LedgerEntry) -> Result<()>;
    async fn get(&self, tx_id: TxId) -> Result<Option<LedgerEntry>>;
    async fn for_user(&self, user_id: UserId) -> Result<Vec<LedgerEntry>>;
    async fn max_id(&self) -> Result<TxId>;
}

/// External proof that a claimed chain transfer paid the expected amount to
/// the order's deposit address.
///
/// Implementations are idempotent and never touch the ledger. A `false`
/// verdict is final for the attempt; retries and timeouts stay inside the
/// adapter.
#[async_trait]
pub trait DepositVerifier: Send + Sync {
    async fn verify(&self, address: &DepositAddress, claimed_ref: &str, expected: Amount) -> bool;
}

/// Allocates the address a buyer pays into. Real derivation happens outside
/// the core.
#[async_trait]
pub trait DepositAddressProvider: Send + Sync {
    async fn new_deposit_address(&self, order_id: OrderId, asset: AssetKind)
    -> Result<DepositAddress>;
}

/// Fire-and-forget delivery of status changes to the affected user.
/// Implementations swallow and log their own failures.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, user_id: UserId, message: &str);
}

pub type UserStoreRef = Arc<dyn UserStore>;
pub type GigStoreRef = Arc<dyn GigStore>;
pub type OrderStoreRef = Arc<dyn OrderStore>;
pub type DisputeStoreRef = Arc<dyn DisputeStore>;
pub type FeedbackStoreRef = Arc<dyn FeedbackStore>;
pub type WalletStoreRef = Arc<dyn WalletStore>;
pub type EntryStoreRef = Arc<dyn EntryStore>;
pub type DepositVerifierRef = Arc<dyn DepositVerifier>;
pub type DepositAddressProviderRef = Arc<dyn DepositAddressProvider>;
pub type NotificationSinkRef = Arc<dyn NotificationSink>;

/// The full set of storage ports the engine is built over. One backend
/// usually implements them all.
#[derive(Clone)]
pub struct Stores {
    pub users: UserStoreRef,
    pub gigs: GigStoreRef,
    pub orders: OrderStoreRef,
    pub disputes: DisputeStoreRef,
    pub feedback: FeedbackStoreRef,
    pub wallets: WalletStoreRef,
    pub entries: EntryStoreRef,
}
