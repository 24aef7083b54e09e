use super::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A marketplace participant.
///
/// Created on first contact from a chat platform, identified there by
/// `external_id`. Users are never deleted; feedback counters only grow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Handle on the platform the user first contacted from.
    pub external_id: String,
    pub display_name: String,
    pub locale: String,
    pub positive_feedback: u32,
    pub negative_feedback: u32,
    /// Where payouts leave custody to, once the user has set one.
    pub payout_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: UserId, external_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id,
            external_id: external_id.into(),
            display_name: display_name.into(),
            locale: "en".to_string(),
            positive_feedback: 0,
            negative_feedback: 0,
            payout_address: None,
            created_at: Utc::now(),
        }
    }
}
