use super::{DisputeId, OrderId, UserId};
use crate::error::EscrowError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeStatus {
    Open,
    ClosedBuyerFavor,
    ClosedSellerFavor,
}

impl DisputeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisputeStatus::Open => "OPEN",
            DisputeStatus::ClosedBuyerFavor => "CLOSED_BUYER_FAVOR",
            DisputeStatus::ClosedSellerFavor => "CLOSED_SELLER_FAVOR",
        }
    }

    pub fn is_closed(&self) -> bool {
        !matches!(self, DisputeStatus::Open)
    }
}

impl fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adjudication outcome. `Buyer` refunds the escrowed funds, `Seller`
/// releases them for payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Buyer,
    Seller,
}

impl Verdict {
    /// The closed status this verdict records on the dispute.
    pub fn closed_status(self) -> DisputeStatus {
        match self {
            Verdict::Buyer => DisputeStatus::ClosedBuyerFavor,
            Verdict::Seller => DisputeStatus::ClosedSellerFavor,
        }
    }
}

/// A frozen-funds adjudication attached to one order.
///
/// Created only while the order holds funds; closes exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispute {
    pub id: DisputeId,
    pub order_id: OrderId,
    pub opened_by: UserId,
    pub reason: String,
    pub status: DisputeStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Dispute {
    pub fn new(id: DisputeId, order_id: OrderId, opened_by: UserId, reason: impl Into<String>) -> Self {
        Self {
            id,
            order_id,
            opened_by,
            reason: reason.into(),
            status: DisputeStatus::Open,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub fn close(&mut self, verdict: Verdict) -> Result<(), EscrowError> {
        if self.status.is_closed() {
            return Err(EscrowError::InvalidTransition {
                order_id: self.order_id,
                from: self.status.as_str().to_string(),
                op: "resolve".to_string(),
            });
        }
        self.status = verdict.closed_status();
        self.resolved_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_records_verdict() {
        let mut dispute = Dispute::new(1, 5, 20, "never delivered");
        dispute.close(Verdict::Buyer).unwrap();
        assert_eq!(dispute.status, DisputeStatus::ClosedBuyerFavor);
        assert!(dispute.resolved_at.is_some());
    }

    #[test]
    fn test_close_is_final() {
        let mut dispute = Dispute::new(1, 5, 20, "never delivered");
        dispute.close(Verdict::Seller).unwrap();
        let err = dispute.close(Verdict::Buyer).unwrap_err();
        assert!(matches!(err, EscrowError::InvalidTransition { .. }));
        assert_eq!(dispute.status, DisputeStatus::ClosedSellerFavor);
    }
}
