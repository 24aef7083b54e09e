use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EscrowError>;

/// Errors surfaced by the escrow core.
///
/// Business rejections (everything up to `BadSignature`) are final verdicts
/// for the attempted operation and are never retried by the core. The
/// `Unavailable` class covers storage and serialization faults; callers may
/// retry the whole operation.
#[derive(Error, Debug)]
pub enum EscrowError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },

    #[error("transaction {tx_id} is not an open hold")]
    InvalidHold { tx_id: u64 },

    #[error("hold {tx_id} was already closed")]
    AlreadyClosed { tx_id: u64 },

    #[error("user {user_id} not found")]
    UserNotFound { user_id: u64 },

    #[error("gig {gig_id} not found or inactive")]
    GigNotFound { gig_id: u64 },

    #[error("order {order_id} not found")]
    OrderNotFound { order_id: u64 },

    #[error("dispute {dispute_id} not found")]
    DisputeNotFound { dispute_id: u64 },

    #[error("cannot buy your own gig {gig_id}")]
    SelfPurchase { gig_id: u64 },

    #[error("order {order_id}: '{op}' is not legal from status {from}")]
    InvalidTransition {
        order_id: u64,
        from: String,
        op: String,
    },

    #[error("user {user_id} is not allowed to {action}")]
    NotAuthorized { user_id: u64, action: String },

    #[error("deposit for order {order_id} rejected (ref {claimed_ref})")]
    DepositRejected { order_id: u64, claimed_ref: String },

    #[error("feedback for order {order_id} by user {reviewer_id} already recorded")]
    DuplicateFeedback { order_id: u64, reviewer_id: u64 },

    #[error("score {0} is out of range (1-5)")]
    InvalidScore(u8),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("webhook signature verification failed")]
    BadSignature,

    #[error("malformed event: {0}")]
    MalformedEvent(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "storage-rocksdb")]
    #[error("database error: {0}")]
    Database(#[from] rocksdb::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(Box<dyn std::error::Error + Send + Sync>),
}

impl EscrowError {
    /// Whether retrying the whole operation can succeed. Business rejections
    /// are final; only infrastructure faults qualify.
    pub fn is_retryable(&self) -> bool {
        #[cfg(feature = "storage-rocksdb")]
        if matches!(self, Self::Database(_)) {
            return true;
        }
        matches!(self, Self::Unavailable(_) | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn insufficient_funds_display() {
        let err = EscrowError::InsufficientFunds {
            requested: dec!(10.00),
            available: dec!(4.00),
        };
        let msg = format!("{err}");
        assert!(msg.contains("10.00"));
        assert!(msg.contains("4.00"));
    }

    #[test]
    fn invalid_transition_display() {
        let err = EscrowError::InvalidTransition {
            order_id: 7,
            from: "RELEASED".to_string(),
            op: "open_dispute".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("order 7"));
        assert!(msg.contains("RELEASED"));
        assert!(msg.contains("open_dispute"));
    }

    #[test]
    fn business_errors_are_not_retryable() {
        assert!(!EscrowError::BadSignature.is_retryable());
        assert!(!EscrowError::AlreadyClosed { tx_id: 1 }.is_retryable());
        assert!(
            EscrowError::Unavailable(Box::new(std::io::Error::other("down"))).is_retryable()
        );
    }
}
