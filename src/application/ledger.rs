use super::ids::IdSeq;
use super::locks::LockRegistry;
use crate::domain::TxId;
use crate::domain::UserId;
use crate::domain::asset::AssetKind;
use crate::domain::ledger::{EntryKind, LedgerEntry, Wallet, fold_balance};
use crate::domain::money::{Amount, Balance};
use crate::domain::ports::{EntryStoreRef, WalletStoreRef};
use crate::error::{EscrowError, Result};

/// A wallet snapshot with its most recent activity, newest first.
#[derive(Debug, Clone)]
pub struct Statement {
    pub wallet: Wallet,
    pub entries: Vec<LedgerEntry>,
}

/// The custodial ledger: one wallet per user plus an append-only entry log.
///
/// The log is the source of truth. Every mutation appends an entry and then
/// rewrites the wallet balance as the fold of the user's log, so the stored
/// balance can never drift from the entries and an interrupted operation
/// heals on the next one.
///
/// Deposits and holds that carry an external reference are idempotent on it:
/// replaying the same chain txid or webhook event credits or debits once.
pub struct Ledger {
    wallets: WalletStoreRef,
    entries: EntryStoreRef,
    locks: LockRegistry,
    seq: IdSeq,
    currency: AssetKind,
}

impl Ledger {
    pub async fn new(
        wallets: WalletStoreRef,
        entries: EntryStoreRef,
        currency: AssetKind,
    ) -> Result<Self> {
        let last_id = entries.max_id().await?;
        Ok(Self {
            wallets,
            entries,
            locks: LockRegistry::new(),
            seq: IdSeq::starting_after(last_id),
            currency,
        })
    }

    /// Idempotent wallet lookup; first use creates an empty wallet.
    pub async fn get_or_create_wallet(&self, user_id: UserId) -> Result<Wallet> {
        let _guard = self.locks.acquire(user_id).await;
        self.wallet_locked(user_id).await
    }

    /// Credits `amount` to the user's wallet.
    ///
    /// When `external_ref` is given and a deposit with the same reference
    /// already exists, that entry is returned and nothing is credited again.
    pub async fn deposit(
        &self,
        user_id: UserId,
        amount: Amount,
        external_ref: Option<&str>,
    ) -> Result<LedgerEntry> {
        let _guard = self.locks.acquire(user_id).await;

        if let Some(existing) = self.find_by_ref(user_id, EntryKind::Deposit, external_ref).await? {
            tracing::debug!(user_id, external_ref, "duplicate deposit ignored");
            self.rewrite_balance(user_id).await?;
            return Ok(existing);
        }

        let mut entry = LedgerEntry::new(self.seq.next(), user_id, EntryKind::Deposit, amount);
        if let Some(r) = external_ref {
            entry = entry.with_external_ref(r);
        }
        self.entries.append(entry.clone()).await?;
        let balance = self.rewrite_balance(user_id).await?;
        tracing::info!(user_id, amount = %amount, balance = %balance, "deposit credited");
        Ok(entry)
    }

    /// Debits `amount` and records an open hold.
    ///
    /// The balance check and the debit are one critical section: concurrent
    /// holds on the same wallet can never jointly overdraw it. Idempotent on
    /// `external_ref` like `deposit`.
    pub async fn hold(
        &self,
        user_id: UserId,
        amount: Amount,
        external_ref: Option<&str>,
    ) -> Result<LedgerEntry> {
        let _guard = self.locks.acquire(user_id).await;

        if let Some(existing) = self.find_by_ref(user_id, EntryKind::Hold, external_ref).await? {
            tracing::debug!(user_id, external_ref, "duplicate hold ignored");
            self.rewrite_balance(user_id).await?;
            return Ok(existing);
        }

        let log = self.entries.for_user(user_id).await?;
        let balance = fold_balance(&log);
        if balance < amount.into() {
            return Err(EscrowError::InsufficientFunds {
                requested: amount.value(),
                available: balance.value(),
            });
        }

        let mut entry = LedgerEntry::new(self.seq.next(), user_id, EntryKind::Hold, amount);
        if let Some(r) = external_ref {
            entry = entry.with_external_ref(r);
        }
        self.entries.append(entry.clone()).await?;
        let balance = self.rewrite_balance(user_id).await?;
        tracing::info!(user_id, amount = %amount, balance = %balance, "hold placed");
        Ok(entry)
    }

    /// Closes an open hold exactly once.
    ///
    /// With `as_refund` the held amount returns to the wallet; otherwise the
    /// funds leave custody as a payout and the balance is untouched. A second
    /// close attempt fails with `AlreadyClosed`.
    pub async fn release_hold(&self, hold_tx_id: TxId, as_refund: bool) -> Result<LedgerEntry> {
        let hold = self
            .entries
            .get(hold_tx_id)
            .await?
            .filter(|e| e.kind == EntryKind::Hold)
            .ok_or(EscrowError::InvalidHold { tx_id: hold_tx_id })?;

        let _guard = self.locks.acquire(hold.user_id).await;

        let log = self.entries.for_user(hold.user_id).await?;
        if log.iter().any(|e| e.closes == Some(hold_tx_id)) {
            return Err(EscrowError::AlreadyClosed { tx_id: hold_tx_id });
        }

        let kind = if as_refund {
            EntryKind::Refund
        } else {
            EntryKind::Payout
        };
        let entry =
            LedgerEntry::new(self.seq.next(), hold.user_id, kind, hold.amount).with_closes(hold_tx_id);
        self.entries.append(entry.clone()).await?;
        let balance = self.rewrite_balance(hold.user_id).await?;
        tracing::info!(
            user_id = hold.user_id,
            hold_tx_id,
            kind = kind.as_str(),
            balance = %balance,
            "hold closed"
        );
        Ok(entry)
    }

    /// How a hold was closed, if it was. `None` means the hold is still open.
    pub async fn closed_as(&self, hold_tx_id: TxId) -> Result<Option<EntryKind>> {
        let hold = self
            .entries
            .get(hold_tx_id)
            .await?
            .filter(|e| e.kind == EntryKind::Hold)
            .ok_or(EscrowError::InvalidHold { tx_id: hold_tx_id })?;
        let log = self.entries.for_user(hold.user_id).await?;
        Ok(log
            .iter()
            .find(|e| e.closes == Some(hold_tx_id))
            .map(|e| e.kind))
    }

    /// Balance implied by the entry log.
    pub async fn balance_of(&self, user_id: UserId) -> Result<Balance> {
        let log = self.entries.for_user(user_id).await?;
        Ok(fold_balance(&log))
    }

    /// Wallet plus the `limit` most recent entries, newest first.
    pub async fn statement(&self, user_id: UserId, limit: usize) -> Result<Statement> {
        let wallet = self.get_or_create_wallet(user_id).await?;
        let mut entries = self.entries.for_user(user_id).await?;
        entries.reverse();
        entries.truncate(limit);
        Ok(Statement { wallet, entries })
    }

    pub async fn entries_for_user(&self, user_id: UserId) -> Result<Vec<LedgerEntry>> {
        self.entries.for_user(user_id).await
    }

    /// Every wallet the ledger has created, sorted by owner.
    pub async fn all_wallets(&self) -> Result<Vec<Wallet>> {
        let mut wallets = self.wallets.all().await?;
        wallets.sort_by_key(|w| w.user_id);
        Ok(wallets)
    }

    async fn wallet_locked(&self, user_id: UserId) -> Result<Wallet> {
        match self.wallets.get(user_id).await? {
            Some(wallet) => Ok(wallet),
            None => {
                let wallet = Wallet::new(user_id, self.currency);
                self.wallets.store(wallet.clone()).await?;
                Ok(wallet)
            }
        }
    }

    /// Re-materializes the stored balance from the log. Caller holds the
    /// user's lock.
    async fn rewrite_balance(&self, user_id: UserId) -> Result<Balance> {
        let log = self.entries.for_user(user_id).await?;
        let balance = fold_balance(&log);
        let mut wallet = self.wallet_locked(user_id).await?;
        wallet.balance = balance;
        self.wallets.store(wallet).await?;
        Ok(balance)
    }

    async fn find_by_ref(
        &self,
        user_id: UserId,
        kind: EntryKind,
        external_ref: Option<&str>,
    ) -> Result<Option<LedgerEntry>> {
        let Some(external_ref) = external_ref else {
            return Ok(None);
        };
        let log = self.entries.for_user(user_id).await?;
        Ok(log
            .into_iter()
            .find(|e| e.kind == kind && e.external_ref.as_deref() == Some(external_ref)))
    }
}
