use super::asset::AssetKind;
use super::gig::Gig;
use super::money::Amount;
use super::{GigId, OrderId, TxId, UserId};
use crate::error::EscrowError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states of an escrow order.
///
/// ```text
/// AWAIT_DEPOSIT --(confirm_deposit)--> FUNDS_HELD
/// FUNDS_HELD    --(release)----------> RELEASED
/// FUNDS_HELD    --(open_dispute)-----> DISPUTED
/// DISPUTED      --(resolve)----------> REFUNDED | RELEASED
/// RELEASED      --(withdrawal)-------> COMPLETED
/// ```
///
/// `REFUNDED` and `COMPLETED` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    AwaitDeposit,
    FundsHeld,
    Released,
    Disputed,
    Refunded,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::AwaitDeposit => "AWAIT_DEPOSIT",
            OrderStatus::FundsHeld => "FUNDS_HELD",
            OrderStatus::Released => "RELEASED",
            OrderStatus::Disputed => "DISPUTED",
            OrderStatus::Refunded => "REFUNDED",
            OrderStatus::Completed => "COMPLETED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Refunded | OrderStatus::Completed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address a buyer pays into. Derivation is external; some chains need a memo
/// to disambiguate shared addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositAddress {
    pub address: String,
    pub memo: Option<String>,
}

/// An escrow order tying a buyer's payment to a seller's gig.
///
/// While `status` is `FUNDS_HELD`, `hold_tx` references the single open
/// ledger hold backing the escrow. Status transitions go through the
/// `mark_*` methods, which reject every edge not in the lifecycle diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub gig_id: GigId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub status: OrderStatus,
    pub deposit_address: DepositAddress,
    pub expected_amount: Amount,
    pub asset: AssetKind,
    /// Chain reference accepted at deposit confirmation.
    pub txid: Option<String>,
    /// Fee percentage in force when the order was created. Recorded for
    /// settlement reporting; the ledger itself never deducts it.
    pub escrow_fee_pct: Decimal,
    /// The open hold backing the escrow, set on entering FUNDS_HELD.
    pub hold_tx: Option<TxId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(
        id: OrderId,
        gig: &Gig,
        buyer_id: UserId,
        deposit_address: DepositAddress,
        escrow_fee_pct: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            gig_id: gig.id,
            buyer_id,
            seller_id: gig.seller_id,
            status: OrderStatus::AwaitDeposit,
            deposit_address,
            expected_amount: gig.price,
            asset: gig.asset,
            txid: None,
            escrow_fee_pct,
            hold_tx: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Platform cut on this order, at the snapshotted percentage.
    pub fn fee_amount(&self) -> Decimal {
        (self.expected_amount.value() * self.escrow_fee_pct / dec!(100))
            .round_dp(self.asset.scale())
    }

    pub fn mark_funds_held(&mut self, hold_tx: TxId, txid: &str) -> Result<(), EscrowError> {
        self.transition("confirm_deposit", OrderStatus::AwaitDeposit, OrderStatus::FundsHeld)?;
        self.hold_tx = Some(hold_tx);
        self.txid = Some(txid.to_string());
        Ok(())
    }

    pub fn mark_released(&mut self) -> Result<(), EscrowError> {
        self.transition("release", OrderStatus::FundsHeld, OrderStatus::Released)
    }

    pub fn mark_disputed(&mut self) -> Result<(), EscrowError> {
        self.transition("open_dispute", OrderStatus::FundsHeld, OrderStatus::Disputed)
    }

    pub fn mark_refunded(&mut self) -> Result<(), EscrowError> {
        self.transition("resolve_refund", OrderStatus::Disputed, OrderStatus::Refunded)
    }

    pub fn mark_awarded_seller(&mut self) -> Result<(), EscrowError> {
        self.transition("resolve_award", OrderStatus::Disputed, OrderStatus::Released)
    }

    pub fn mark_completed(&mut self) -> Result<(), EscrowError> {
        self.transition(
            "complete_withdrawal",
            OrderStatus::Released,
            OrderStatus::Completed,
        )
    }

    fn transition(
        &mut self,
        op: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<(), EscrowError> {
        if self.status != from {
            return Err(EscrowError::InvalidTransition {
                order_id: self.id,
                from: self.status.as_str().to_string(),
                op: op.to_string(),
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}
