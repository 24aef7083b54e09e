use crate::application::engine::Engine;
use crate::error::{EscrowError, Result};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct OrderRow {
    order: u64,
    gig: u64,
    buyer: u64,
    seller: u64,
    status: &'static str,
    amount: Decimal,
    asset: &'static str,
    fee: Decimal,
}

#[derive(Debug, Serialize)]
struct WalletRow {
    user: u64,
    balance: Decimal,
    currency: &'static str,
}

/// Renders every order as CSV, in id order.
pub async fn render_orders(engine: &Engine) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for order in engine.all_orders().await? {
        writer.serialize(OrderRow {
            order: order.id,
            gig: order.gig_id,
            buyer: order.buyer_id,
            seller: order.seller_id,
            status: order.status.as_str(),
            amount: order.expected_amount.value(),
            asset: order.asset.code(),
            fee: order.fee_amount(),
        })?;
    }
    into_string(writer)
}

/// Renders every wallet as CSV, in owner order.
pub async fn render_wallets(engine: &Engine) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for wallet in engine.ledger().all_wallets().await? {
        writer.serialize(WalletRow {
            user: wallet.user_id,
            balance: wallet.balance.value(),
            currency: wallet.currency.code(),
        })?;
    }
    into_string(writer)
}

fn into_string(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| EscrowError::Unavailable(Box::new(e)))?;
    String::from_utf8(bytes).map_err(|e| EscrowError::Unavailable(Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::domain::asset::AssetKind;
    use crate::domain::ports::DepositVerifierRef;
    use crate::infrastructure::address::StaticAddressProvider;
    use crate::infrastructure::in_memory;
    use crate::infrastructure::notify::TracingNotifier;
    use crate::infrastructure::verifier::AcceptAllVerifier;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_reports_cover_orders_and_wallets() {
        let verifier: DepositVerifierRef = Arc::new(AcceptAllVerifier);
        let verifiers = AssetKind::ALL
            .into_iter()
            .map(|asset| (asset, verifier.clone()))
            .collect();
        let (engine, _worker) = Engine::new(
            in_memory::stores(),
            verifiers,
            Arc::new(StaticAddressProvider::new()),
            Arc::new(TracingNotifier),
            Settings::default(),
        )
        .await
        .unwrap();

        let seller = engine.users().get_or_create("tg:1", "alice").await.unwrap();
        let buyer = engine.users().get_or_create("tg:2", "bob").await.unwrap();
        let gig = engine
            .catalog()
            .create_gig(seller.id, "logo", "a logo", dec!(10.00), AssetKind::UsdtTron)
            .await
            .unwrap();
        let order = engine.create_order(gig.id, buyer.id).await.unwrap();
        engine.confirm_deposit(order.id, "tx-1").await.unwrap();

        let orders = render_orders(&engine).await.unwrap();
        assert!(orders.starts_with("order,gig,buyer,seller,status,amount,asset,fee"));
        assert!(orders.contains("FUNDS_HELD"));
        assert!(orders.contains("10.00"));
        assert!(orders.contains("0.80"));

        let wallets = render_wallets(&engine).await.unwrap();
        assert!(wallets.starts_with("user,balance,currency"));
        assert!(wallets.contains("USDT-TRON"));
    }
}
