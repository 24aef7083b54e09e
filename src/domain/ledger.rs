use super::asset::AssetKind;
use super::money::{Amount, Balance};
use super::{TxId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A user's custodial wallet. Mutated only through the ledger; the stored
/// balance always equals the fold of the user's entry log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub user_id: UserId,
    pub balance: Balance,
    pub currency: AssetKind,
}

impl Wallet {
    pub fn new(user_id: UserId, currency: AssetKind) -> Self {
        Self {
            user_id,
            balance: Balance::ZERO,
            currency,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Deposit,
    Hold,
    Release,
    Refund,
    Payout,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Deposit => "deposit",
            EntryKind::Hold => "hold",
            EntryKind::Release => "release",
            EntryKind::Refund => "refund",
            EntryKind::Payout => "payout",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    #[default]
    Succeeded,
    Failed,
}

/// An immutable row in the append-only transaction log.
///
/// A `hold` entry is closed by exactly one later entry whose `closes` field
/// references it; `refund` closes re-credit the wallet, `payout` closes move
/// the funds out of custody.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: TxId,
    pub user_id: UserId,
    pub kind: EntryKind,
    pub amount: Amount,
    pub status: TxStatus,
    /// Outside-world reference (chain txid, webhook event id).
    pub external_ref: Option<String>,
    /// For closing entries, the hold being closed.
    pub closes: Option<TxId>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(id: TxId, user_id: UserId, kind: EntryKind, amount: Amount) -> Self {
        Self {
            id,
            user_id,
            kind,
            amount,
            status: TxStatus::Succeeded,
            external_ref: None,
            closes: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_external_ref(mut self, external_ref: impl Into<String>) -> Self {
        self.external_ref = Some(external_ref.into());
        self
    }

    pub fn with_closes(mut self, hold_tx: TxId) -> Self {
        self.closes = Some(hold_tx);
        self
    }
}

/// Net effect of one entry on the wallet balance.
///
/// Deposits and refunds credit, holds debit. Payout and release entries are
/// balance-neutral: they close a hold whose debit already happened.
pub fn entry_delta(entry: &LedgerEntry) -> Decimal {
    if entry.status != TxStatus::Succeeded {
        return Decimal::ZERO;
    }
    match entry.kind {
        EntryKind::Deposit | EntryKind::Refund => entry.amount.value(),
        EntryKind::Hold => -entry.amount.value(),
        EntryKind::Release | EntryKind::Payout => Decimal::ZERO,
    }
}

/// Folds an entry log into the balance it implies.
pub fn fold_balance<'a, I>(entries: I) -> Balance
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    Balance::new(entries.into_iter().map(entry_delta).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn amount(v: Decimal) -> Amount {
        Amount::new(v).unwrap()
    }

    #[test]
    fn test_fold_weights() {
        let entries = vec![
            LedgerEntry::new(1, 1, EntryKind::Deposit, amount(dec!(10))),
            LedgerEntry::new(2, 1, EntryKind::Hold, amount(dec!(4))),
            LedgerEntry::new(3, 1, EntryKind::Refund, amount(dec!(4))).with_closes(2),
            LedgerEntry::new(4, 1, EntryKind::Hold, amount(dec!(3))),
            LedgerEntry::new(5, 1, EntryKind::Payout, amount(dec!(3))).with_closes(4),
        ];
        assert_eq!(fold_balance(&entries), Balance::new(dec!(7)));
    }

    #[test]
    fn test_non_succeeded_entries_do_not_count() {
        let mut failed = LedgerEntry::new(1, 1, EntryKind::Deposit, amount(dec!(10)));
        failed.status = TxStatus::Failed;
        let mut pending = LedgerEntry::new(2, 1, EntryKind::Deposit, amount(dec!(5)));
        pending.status = TxStatus::Pending;
        assert_eq!(fold_balance([&failed, &pending]), Balance::ZERO);
    }

    #[test]
    fn test_entry_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&EntryKind::Payout).unwrap(),
            "\"payout\""
        );
    }
}
