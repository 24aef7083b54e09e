mod common;

use async_trait::async_trait;
use common::{accepting_engine, engine_with, seed_marketplace};
use gig_escrow::config::Settings;
use gig_escrow::domain::ledger::{EntryKind, fold_balance};
use gig_escrow::domain::money::{Amount, Balance};
use gig_escrow::domain::order::{DepositAddress, OrderStatus};
use gig_escrow::domain::ports::DepositVerifier;
use gig_escrow::error::EscrowError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// Approves every claim after a delay, so racing confirmations sit inside
/// the verification window together.
struct SlowVerifier;

#[async_trait]
impl DepositVerifier for SlowVerifier {
    async fn verify(
        &self,
        _address: &DepositAddress,
        _claimed_ref: &str,
        _expected: Amount,
    ) -> bool {
        tokio::time::sleep(Duration::from_millis(50)).await;
        true
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_racing_confirmations_fund_the_order_once() {
    let (engine, _worker, _notifier) = engine_with(Arc::new(SlowVerifier), Settings::default()).await;
    let (_seller, buyer, gig) = seed_marketplace(&engine).await;
    let order = engine.create_order(gig, buyer).await.unwrap();

    let first = {
        let engine = engine.clone();
        let order_id = order.id;
        tokio::spawn(async move { engine.confirm_deposit(order_id, "tx-race").await })
    };
    let second = {
        let engine = engine.clone();
        let order_id = order.id;
        tokio::spawn(async move { engine.confirm_deposit(order_id, "tx-race").await })
    };
    let results = [first.await.unwrap(), second.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = results
        .into_iter()
        .find(|r| r.is_err())
        .unwrap()
        .unwrap_err();
    assert!(matches!(loser, EscrowError::InvalidTransition { .. }));

    let order = engine.order(order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::FundsHeld);
    assert!(order.hold_tx.is_some());

    // One credit, one hold, nothing spendable.
    let log = engine.ledger().entries_for_user(buyer).await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].kind, EntryKind::Deposit);
    assert_eq!(log[1].kind, EntryKind::Hold);
    assert_eq!(
        engine.ledger().balance_of(buyer).await.unwrap(),
        Balance::ZERO
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_release_and_dispute_race_has_one_winner() {
    let (engine, _worker, _notifier) = accepting_engine().await;
    let (seller, buyer, gig) = seed_marketplace(&engine).await;
    let order = engine.create_order(gig, buyer).await.unwrap();
    engine.confirm_deposit(order.id, "tx-1").await.unwrap();

    let release = {
        let engine = engine.clone();
        let order_id = order.id;
        tokio::spawn(async move { engine.release(order_id, buyer).await })
    };
    let dispute = {
        let engine = engine.clone();
        let order_id = order.id;
        tokio::spawn(async move {
            engine
                .open_dispute(order_id, seller, "buyer went quiet")
                .await
        })
    };
    let (release, dispute) = (release.await.unwrap(), dispute.await.unwrap());

    let order = engine.order(order.id).await.unwrap();
    match (release.is_ok(), dispute.is_ok()) {
        (true, false) => assert_eq!(order.status, OrderStatus::Released),
        (false, true) => assert_eq!(order.status, OrderStatus::Disputed),
        _ => panic!("exactly one of the racing calls must win"),
    }

    // The loser bounced off the state machine without touching the ledger.
    let log = engine.ledger().entries_for_user(buyer).await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(
        engine.ledger().balance_of(buyer).await.unwrap(),
        Balance::ZERO
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_interleaved_ledger_traffic_keeps_the_wallet_consistent() {
    let (engine, _worker, _notifier) = accepting_engine().await;
    let user = engine
        .users()
        .get_or_create("tg:storm", "dave")
        .await
        .unwrap()
        .id;

    let mut handles = Vec::new();
    for task in 0..8u64 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            let mut rng = StdRng::seed_from_u64(task);
            for op in 0..12 {
                let amount = Amount::new(Decimal::from(rng.gen_range(1..=5))).unwrap();
                if rng.gen_bool(0.6) {
                    let reference = format!("storm-{task}-{op}");
                    engine
                        .ledger()
                        .deposit(user, amount, Some(&reference))
                        .await
                        .unwrap();
                } else {
                    match engine.ledger().hold(user, amount, None).await {
                        Ok(_) | Err(EscrowError::InsufficientFunds { .. }) => {}
                        Err(e) => panic!("unexpected ledger error: {e}"),
                    }
                }
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // The stored balance must equal the fold of the log, and overdraw
    // attempts must have been turned away rather than driving it negative.
    let log = engine.ledger().entries_for_user(user).await.unwrap();
    assert!(!log.is_empty());
    let wallet = engine.ledger().get_or_create_wallet(user).await.unwrap();
    assert_eq!(wallet.balance, fold_balance(&log));
    assert!(wallet.balance >= Balance::ZERO);
}
