use gig_escrow::application::engine::Engine;
use gig_escrow::application::payout::PayoutWorker;
use gig_escrow::config::Settings;
use gig_escrow::domain::asset::AssetKind;
use gig_escrow::domain::ports::{DepositVerifierRef, Stores};
use gig_escrow::infrastructure::address::StaticAddressProvider;
use gig_escrow::infrastructure::in_memory;
use gig_escrow::infrastructure::notify::RecordingNotifier;
use gig_escrow::infrastructure::verifier::AcceptAllVerifier;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;

/// Builds an engine over the given stores with the given verifier wired for
/// every asset. The worker is returned unstarted; drop it if the test drives
/// settlement by hand.
pub async fn engine_over(
    stores: Stores,
    verifier: DepositVerifierRef,
    settings: Settings,
) -> (Arc<Engine>, PayoutWorker, RecordingNotifier) {
    let notifier = RecordingNotifier::new();
    let verifiers: HashMap<_, _> = AssetKind::ALL
        .into_iter()
        .map(|asset| (asset, verifier.clone()))
        .collect();
    let (engine, worker) = Engine::new(
        stores,
        verifiers,
        Arc::new(StaticAddressProvider::new()),
        Arc::new(notifier.clone()),
        settings,
    )
    .await
    .expect("engine construction");
    (engine, worker, notifier)
}

/// `engine_over` on fresh in-memory stores.
pub async fn engine_with(
    verifier: DepositVerifierRef,
    settings: Settings,
) -> (Arc<Engine>, PayoutWorker, RecordingNotifier) {
    engine_over(in_memory::stores(), verifier, settings).await
}

pub async fn accepting_engine() -> (Arc<Engine>, PayoutWorker, RecordingNotifier) {
    engine_with(Arc::new(AcceptAllVerifier), Settings::default()).await
}

/// Seeds a seller, a buyer and one 10.00 USDT gig. Returns their ids as
/// `(seller, buyer, gig)`.
pub async fn seed_marketplace(engine: &Engine) -> (u64, u64, u64) {
    let seller = engine
        .users()
        .get_or_create("tg:seller", "alice")
        .await
        .expect("seller");
    let buyer = engine
        .users()
        .get_or_create("tg:buyer", "bob")
        .await
        .expect("buyer");
    let gig = engine
        .catalog()
        .create_gig(
            seller.id,
            "logo design",
            "vector logo with two revisions",
            dec!(10.00),
            AssetKind::UsdtTron,
        )
        .await
        .expect("gig");
    (seller.id, buyer.id, gig.id)
}
