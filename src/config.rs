use crate::domain::asset::AssetKind;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;

/// Runtime settings, read once at startup. Everything has a development
/// default so the binary runs without any environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Custody asset wallets are denominated in, and the default for new gigs.
    pub asset: AssetKind,
    /// Percentage snapshot recorded on each order at creation.
    pub escrow_fee_pct: Decimal,
    /// The operator account allowed to resolve disputes.
    pub admin_user_id: u64,
    /// Shared secret webhook signatures are checked against.
    pub webhook_secret: String,
    /// Which deposit verifier to wire in: "mock" accepts everything,
    /// "reject" refuses everything.
    pub payments_provider: String,
    /// Upper bound on live gig-wizard sessions.
    pub session_capacity: usize,
    /// Idle time after which a wizard session is evicted.
    pub session_ttl: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            asset: AssetKind::UsdtTron,
            escrow_fee_pct: dec!(8.00),
            admin_user_id: 0,
            webhook_secret: "dev-secret".to_string(),
            payments_provider: "mock".to_string(),
            session_capacity: 256,
            session_ttl: Duration::from_secs(900),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            asset: env_parse("PRIMARY_ASSET").unwrap_or(defaults.asset),
            escrow_fee_pct: env_parse("ESCROW_FEE_PCT").unwrap_or(defaults.escrow_fee_pct),
            admin_user_id: env_parse("ADMIN_USER_ID").unwrap_or(defaults.admin_user_id),
            webhook_secret: std::env::var("WEBHOOK_SECRET").unwrap_or(defaults.webhook_secret),
            payments_provider: std::env::var("PAYMENTS_PROVIDER")
                .unwrap_or(defaults.payments_provider),
            session_capacity: env_parse("SESSION_CAPACITY").unwrap_or(defaults.session_capacity),
            session_ttl: env_parse("SESSION_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_ttl),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
