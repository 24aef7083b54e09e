use super::csv::event_reader::{EventOp, MarketEvent};
use crate::application::engine::Engine;
use crate::domain::dispute::Verdict;
use crate::domain::money::Amount;
use crate::error::{EscrowError, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;

/// Applies replayed marketplace events to the engine.
///
/// Each event maps to exactly one engine operation. Missing columns fail with
/// `MalformedEvent` before any state is touched; business rejections come
/// back unchanged from the engine. An admin-only event like `resolve` is
/// authorized here, at the driver boundary, against the configured operator.
pub struct Replay {
    engine: Arc<Engine>,
}

impl Replay {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }

    pub async fn apply(&self, event: MarketEvent) -> Result<()> {
        match event.op {
            EventOp::User => {
                let external_id = required_text(&event.reference, "reference")?;
                let name = event.note.as_deref().unwrap_or_default();
                self.engine.users().get_or_create(external_id, name).await?;
            }
            EventOp::Gig => {
                let seller = required_id(event.actor, "actor")?;
                let title = required_text(&event.reference, "reference")?;
                let price = required_amount(event.amount)?;
                let description = event.note.as_deref().unwrap_or_default();
                self.engine
                    .catalog()
                    .create_gig(seller, title, description, price, self.engine.settings().asset)
                    .await?;
            }
            EventOp::Buy => {
                let buyer = required_id(event.actor, "actor")?;
                let gig = required_id(event.subject, "subject")?;
                self.engine.create_order(gig, buyer).await?;
            }
            EventOp::Fund => {
                let order = required_id(event.subject, "subject")?;
                let claimed_ref = required_text(&event.reference, "reference")?;
                self.engine.confirm_deposit(order, claimed_ref).await?;
            }
            EventOp::Release => {
                let actor = required_id(event.actor, "actor")?;
                let order = required_id(event.subject, "subject")?;
                self.engine.release(order, actor).await?;
            }
            EventOp::Dispute => {
                let actor = required_id(event.actor, "actor")?;
                let order = required_id(event.subject, "subject")?;
                let reason = event.note.as_deref().unwrap_or("unspecified");
                self.engine.open_dispute(order, actor, reason).await?;
            }
            EventOp::Resolve => {
                let actor = required_id(event.actor, "actor")?;
                if actor != self.engine.settings().admin_user_id {
                    return Err(EscrowError::NotAuthorized {
                        user_id: actor,
                        action: "resolve disputes".to_string(),
                    });
                }
                let order = required_id(event.subject, "subject")?;
                let verdict = parse_verdict(required_text(&event.reference, "reference")?)?;
                self.engine.resolve_dispute_by_order(order, verdict).await?;
            }
            EventOp::Deposit => {
                let user = required_id(event.subject, "subject")?;
                let amount = Amount::try_from(required_amount(event.amount)?)?;
                self.engine.users().get(user).await?;
                self.engine
                    .ledger()
                    .deposit(user, amount, event.reference.as_deref())
                    .await?;
            }
            EventOp::Feedback => {
                let reviewer = required_id(event.actor, "actor")?;
                let order = required_id(event.subject, "subject")?;
                let score = required_amount(event.amount)?
                    .to_u8()
                    .ok_or_else(|| EscrowError::MalformedEvent("score is not a small integer".to_string()))?;
                self.engine
                    .record_feedback(order, reviewer, score, event.note.as_deref())
                    .await?;
            }
        }
        Ok(())
    }
}

fn required_id(value: Option<u64>, column: &str) -> Result<u64> {
    value.ok_or_else(|| EscrowError::MalformedEvent(format!("missing '{column}' column")))
}

fn required_amount(value: Option<Decimal>) -> Result<Decimal> {
    value.ok_or_else(|| EscrowError::MalformedEvent("missing 'amount' column".to_string()))
}

fn required_text<'a>(value: &'a Option<String>, column: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| EscrowError::MalformedEvent(format!("missing '{column}' column")))
}

fn parse_verdict(text: &str) -> Result<Verdict> {
    match text.to_ascii_lowercase().as_str() {
        "buyer" => Ok(Verdict::Buyer),
        "seller" => Ok(Verdict::Seller),
        other => Err(EscrowError::MalformedEvent(format!(
            "verdict must be 'buyer' or 'seller', got '{other}'"
        ))),
    }
}
