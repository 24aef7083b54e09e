use super::asset::AssetKind;
use super::money::Amount;
use super::{GigId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_TITLE_LEN: usize = 140;

/// A seller's offer.
///
/// Gigs are deactivated rather than deleted so that historical orders keep a
/// valid reference. Price is quantized to the asset's scale at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gig {
    pub id: GigId,
    pub seller_id: UserId,
    pub title: String,
    pub description: String,
    pub price: Amount,
    pub asset: AssetKind,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Gig {
    pub fn new(
        id: GigId,
        seller_id: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
        price: Amount,
        asset: AssetKind,
    ) -> Self {
        Self {
            id,
            seller_id,
            title: title.into(),
            description: description.into(),
            price,
            asset,
            active: true,
            created_at: Utc::now(),
        }
    }
}
