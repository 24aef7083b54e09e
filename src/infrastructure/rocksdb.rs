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
use crate::error::{EscrowError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// Column Family for user profiles.
pub const CF_USERS: &str = "users";
/// Column Family for the gig catalog.
pub const CF_GIGS: &str = "gigs";
/// Column Family for escrow orders.
pub const CF_ORDERS: &str = "orders";
/// Column Family for disputes.
pub const CF_DISPUTES: &str = "disputes";
/// Column Family for feedback rows.
pub const CF_FEEDBACK: &str = "feedback";
/// Column Family for wallet snapshots.
pub const CF_WALLETS: &str = "wallets";
/// Column Family for the append-only ledger log.
pub const CF_ENTRIES: &str = "entries";

const ALL_CFS: [&str; 7] = [
    CF_USERS,
    CF_GIGS,
    CF_ORDERS,
    CF_DISPUTES,
    CF_FEEDBACK,
    CF_WALLETS,
    CF_ENTRIES,
];

/// A persistent backend using RocksDB, one Column Family per table.
///
/// Keys are ids in big-endian so the natural key order is numeric order;
/// `max_id` reads the last key of a family to reseed id sequences after a
/// restart. Values are `serde_json` documents.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`) and
/// implements every storage port itself.
#[derive(Clone)]
pub struct RocksDbStores {
    db: Arc<DB>,
}

impl RocksDbStores {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// all required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect::<Vec<_>>();
        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Wires this backend into the full set of storage ports.
    pub fn stores(&self) -> Stores {
        Stores {
            users: Arc::new(self.clone()),
            gigs: Arc::new(self.clone()),
            orders: Arc::new(self.clone()),
            disputes: Arc::new(self.clone()),
            feedback: Arc::new(self.clone()),
            wallets: Arc::new(self.clone()),
            entries: Arc::new(self.clone()),
        }
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            EscrowError::Unavailable(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn put_json<T: Serialize>(&self, cf_name: &str, key: u64, value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value).map_err(|e| {
            EscrowError::Unavailable(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("serialization error: {e}"),
            )))
        })?;
        self.db.put_cf(cf, key.to_be_bytes(), bytes)?;
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, cf_name: &str, key: u64) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key.to_be_bytes())? {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes).map_err(|e| {
                    EscrowError::Unavailable(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("deserialization error: {e}"),
                    )))
                })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Full scan of one family, in key (id) order.
    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut rows = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item.map_err(|e| {
                EscrowError::Unavailable(Box::new(std::io::Error::other(format!(
                    "RocksDB iteration error: {e}"
                ))))
            })?;
            let row = serde_json::from_slice(&value).map_err(|e| {
                EscrowError::Unavailable(Box::new(std::io::Error::other(format!(
                    "deserialization error: {e}"
                ))))
            })?;
            rows.push(row);
        }
        Ok(rows)
    }

    fn last_key(&self, cf_name: &str) -> Result<u64> {
        let cf = self.cf(cf_name)?;
        match self.db.iterator_cf(cf, IteratorMode::End).next() {
            Some(item) => {
                let (key, _value) = item.map_err(|e| {
                    EscrowError::Unavailable(Box::new(std::io::Error::other(format!(
                        "RocksDB iteration error: {e}"
                    ))))
                })?;
                let bytes: [u8; 8] = key.as_ref().try_into().map_err(|_| {
                    EscrowError::Unavailable(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("{cf_name} key is not 8 bytes"),
                    )))
                })?;
                Ok(u64::from_be_bytes(bytes))
            }
            None => Ok(0),
        }
    }
}

#[async_trait]
impl UserStore for RocksDbStores {
    async fn store(&self, user: User) -> Result<()> {
        self.put_json(CF_USERS, user.id, &user)
    }

    async fn get(&self, user_id: UserId) -> Result<Option<User>> {
        self.get_json(CF_USERS, user_id)
    }

    async fn by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        let users: Vec<User> = self.scan(CF_USERS)?;
        Ok(users.into_iter().find(|u| u.external_id == external_id))
    }

    async fn max_id(&self) -> Result<UserId> {
        self.last_key(CF_USERS)
    }
}

#[async_trait]
impl GigStore for RocksDbStores {
    async fn store(&self, gig: Gig) -> Result<()> {
        self.put_json(CF_GIGS, gig.id, &gig)
    }

    async fn get(&self, gig_id: GigId) -> Result<Option<Gig>> {
        self.get_json(CF_GIGS, gig_id)
    }

    async fn active(&self) -> Result<Vec<Gig>> {
        let gigs: Vec<Gig> = self.scan(CF_GIGS)?;
        Ok(gigs.into_iter().filter(|g| g.active).collect())
    }

    async fn by_seller(&self, seller_id: UserId) -> Result<Vec<Gig>> {
        let gigs: Vec<Gig> = self.scan(CF_GIGS)?;
        Ok(gigs.into_iter().filter(|g| g.seller_id == seller_id).collect())
    }

    async fn max_id(&self) -> Result<GigId> {
        self.last_key(CF_GIGS)
    }
}

#[async_trait]
impl OrderStore for RocksDbStores {
    async fn store(&self, order: Order) -> Result<()> {
        self.put_json(CF_ORDERS, order.id, &order)
    }

    async fn get(&self, order_id: OrderId) -> Result<Option<Order>> {
        self.get_json(CF_ORDERS, order_id)
    }

    async fn for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let orders: Vec<Order> = self.scan(CF_ORDERS)?;
        Ok(orders
            .into_iter()
            .filter(|o| o.buyer_id == user_id || o.seller_id == user_id)
            .collect())
    }

    async fn all(&self) -> Result<Vec<Order>> {
        self.scan(CF_ORDERS)
    }

    async fn max_id(&self) -> Result<OrderId> {
        self.last_key(CF_ORDERS)
    }
}

#[async_trait]
impl DisputeStore for RocksDbStores {
    async fn store(&self, dispute: Dispute) -> Result<()> {
        self.put_json(CF_DISPUTES, dispute.id, &dispute)
    }

    async fn get(&self, dispute_id: DisputeId) -> Result<Option<Dispute>> {
        self.get_json(CF_DISPUTES, dispute_id)
    }

    async fn open_for_order(&self, order_id: OrderId) -> Result<Option<Dispute>> {
        let disputes: Vec<Dispute> = self.scan(CF_DISPUTES)?;
        Ok(disputes
            .into_iter()
            .find(|d| d.order_id == order_id && d.status == DisputeStatus::Open))
    }

    async fn max_id(&self) -> Result<DisputeId> {
        self.last_key(CF_DISPUTES)
    }
}

#[async_trait]
impl FeedbackStore for RocksDbStores {
    async fn store(&self, feedback: Feedback) -> Result<()> {
        self.put_json(CF_FEEDBACK, feedback.id, &feedback)
    }

    async fn by_order_and_reviewer(
        &self,
        order_id: OrderId,
        reviewer_id: UserId,
    ) -> Result<Option<Feedback>> {
        let rows: Vec<Feedback> = self.scan(CF_FEEDBACK)?;
        Ok(rows
            .into_iter()
            .find(|f| f.order_id == order_id && f.reviewer_id == reviewer_id))
    }

    async fn for_reviewee(&self, reviewee_id: UserId) -> Result<Vec<Feedback>> {
        let rows: Vec<Feedback> = self.scan(CF_FEEDBACK)?;
        Ok(rows.into_iter().filter(|f| f.reviewee_id == reviewee_id).collect())
    }

    async fn max_id(&self) -> Result<FeedbackId> {
        self.last_key(CF_FEEDBACK)
    }
}

#[async_trait]
impl WalletStore for RocksDbStores {
    async fn store(&self, wallet: Wallet) -> Result<()> {
        self.put_json(CF_WALLETS, wallet.user_id, &wallet)
    }

    async fn get(&self, user_id: UserId) -> Result<Option<Wallet>> {
        self.get_json(CF_WALLETS, user_id)
    }

    async fn all(&self) -> Result<Vec<Wallet>> {
        self.scan(CF_WALLETS)
    }
}

#[async_trait]
impl EntryStore for RocksDbStores {
    async fn append(&self, entry: LedgerEntry) -> Result<()> {
        self.put_json(CF_ENTRIES, entry.id, &entry)
    }

    async fn get(&self, tx_id: TxId) -> Result<Option<LedgerEntry>> {
        self.get_json(CF_ENTRIES, tx_id)
    }

    async fn for_user(&self, user_id: UserId) -> Result<Vec<LedgerEntry>> {
        // Key order is id order, so the filtered log is already sorted.
        let log: Vec<LedgerEntry> = self.scan(CF_ENTRIES)?;
        Ok(log.into_iter().filter(|e| e.user_id == user_id).collect())
    }

    async fn max_id(&self) -> Result<TxId> {
        self.last_key(CF_ENTRIES)
    }
}
