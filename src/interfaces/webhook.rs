use crate::application::engine::Engine;
use crate::domain::ledger::LedgerEntry;
use crate::domain::money::Amount;
use crate::error::{EscrowError, Result};
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::Sha256;
use std::fmt::Write;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

/// Payment-provider callback body. Only `succeeded` notices credit a wallet;
/// anything else is acknowledged and dropped.
#[derive(Debug, Deserialize)]
pub struct PaymentNotice {
    pub status: String,
    pub amount: Decimal,
    pub user_id: u64,
    pub external_ref: String,
}

/// Inbound deposit webhook.
///
/// The raw body is authenticated with an HMAC-SHA256 signature before it is
/// parsed; an unsigned or tampered payload never reaches the ledger. Credits
/// are idempotent on the provider's reference, so redelivered notices return
/// the original entry.
pub struct DepositWebhook {
    engine: Arc<Engine>,
    secret: String,
}

impl DepositWebhook {
    pub fn new(engine: Arc<Engine>) -> Self {
        let secret = engine.settings().webhook_secret.clone();
        Self { engine, secret }
    }

    /// Verifies and applies one provider notice.
    ///
    /// Returns the credited ledger entry, or `None` for notices with a
    /// non-success status.
    pub async fn handle(&self, body: &[u8], signature: &str) -> Result<Option<LedgerEntry>> {
        self.verify_signature(body, signature)?;

        let notice: PaymentNotice = serde_json::from_slice(body)
            .map_err(|e| EscrowError::MalformedEvent(format!("bad webhook body: {e}")))?;
        if notice.status != "succeeded" {
            tracing::info!(
                user_id = notice.user_id,
                status = notice.status.as_str(),
                "ignoring non-success payment notice"
            );
            return Ok(None);
        }

        let amount = Amount::try_from(notice.amount)?;
        self.engine.users().get(notice.user_id).await?;
        let entry = self
            .engine
            .ledger()
            .deposit(notice.user_id, amount, Some(&notice.external_ref))
            .await?;
        Ok(Some(entry))
    }

    fn verify_signature(&self, body: &[u8], signature: &str) -> Result<()> {
        let claimed = decode_hex(signature).ok_or(EscrowError::BadSignature)?;
        let mut mac = mac_for(&self.secret)?;
        mac.update(body);
        mac.verify_slice(&claimed).map_err(|_| EscrowError::BadSignature)
    }
}

/// Signs a webhook body the way the provider does. Used by tests and by the
/// provider simulator.
pub fn sign(secret: &str, body: &[u8]) -> Result<String> {
    let mut mac = mac_for(secret)?;
    mac.update(body);
    let digest = mac.finalize().into_bytes();

    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    Ok(hex)
}

fn mac_for(secret: &str) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| EscrowError::BadSignature)
}

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(text.get(i..i + 2)?, 16).ok())
        .collect()
}
