//! Derived views and wallet session against an in-memory chain

mod support;

use alloy_primitives::U256;

use drip::dapp::FaucetReadings;
use drip::domain::error::{TxError, ValidationError};
use drip::infrastructure::ethereum::ChainError;

use support::{Harness, CHAIN_ID, INTERVAL, START};

#[tokio::test]
async fn test_faucet_view_reads() {
    let h = Harness::connected(&support::config()).await;
    h.chain.set_next_claim_at(START + 120);

    let view = h.dapp.refresh_faucet(support::alice()).await.unwrap();

    assert_eq!(view.account, support::alice());
    assert_eq!(view.balance.raw(), U256::from(25_000_000u64));
    assert_eq!(view.balance.decimals(), 6);
    assert_eq!(view.balance.format(), "25");
    assert_eq!(view.claim_amount.format(), "10");
    assert_eq!(view.next_claim_at, START + 120);
    assert_eq!(view.eligibility().remaining(h.dapp.now()), 120);

    let interval = h
        .dapp
        .faucet()
        .unwrap()
        .claim_interval(h.dapp.client().as_ref())
        .await
        .unwrap();
    assert_eq!(interval, INTERVAL);
}

#[tokio::test]
async fn test_refresh_is_idempotent() {
    let h = Harness::connected(&support::config()).await;

    let first = h.dapp.refresh_faucet(support::alice()).await;
    let second = h.dapp.refresh_faucet(support::alice()).await;
    assert_eq!(first, second);

    let first = h.dapp.refresh_counter().await;
    let second = h.dapp.refresh_counter().await;
    assert_eq!(first, second);
    assert_eq!(first, Ok(U256::ZERO));

    assert!(h.chain.sends().is_empty());
}

#[tokio::test]
async fn test_partial_faucet_refresh_keeps_earlier_reads() {
    let h = Harness::connected(&support::config()).await;
    h.chain.fail_read("usdcClaimAmount");

    let err = h.dapp.refresh_faucet(support::alice()).await.unwrap_err();

    assert_eq!(err.read, "usdcClaimAmount");
    assert_eq!(
        err.partial,
        FaucetReadings {
            balance: Some(U256::from(25_000_000u64)),
            decimals: Some(6),
            claim_amount: None,
            next_claim_at: None,
        }
    );
}

#[tokio::test]
async fn test_first_read_failure_has_no_partial_values() {
    let h = Harness::connected(&support::config()).await;
    h.chain.fail_read("balanceOf");

    let (faucet, counter) = h.dapp.refresh_all(support::alice()).await;

    let err = faucet.unwrap_err();
    assert_eq!(err.read, "balanceOf");
    assert_eq!(err.partial, FaucetReadings::default());
    assert_eq!(counter, Ok(U256::ZERO));
}

#[tokio::test]
async fn test_unconfigured_views_report_missing_contract() {
    let mut config = support::config();
    config.contracts.token = None;
    config.contracts.counter = None;
    let h = Harness::connected(&config).await;

    let err = h.dapp.refresh_faucet(support::alice()).await.unwrap_err();
    assert_eq!(err.read, "faucet");
    assert!(err.message.contains("not configured"), "{}", err.message);

    let err = h.dapp.refresh_counter().await.unwrap_err();
    assert_eq!(err.read, "counter");
}

#[tokio::test]
async fn test_connect_selects_configured_account() {
    let mut config = support::config();
    config.wallet.account_index = 1;
    let h = Harness::new(&config);

    let snapshot = h.dapp.connect().await.unwrap();

    assert!(snapshot.connected);
    assert_eq!(snapshot.address, Some(support::bob()));
    assert_eq!(snapshot.chain_id, Some(CHAIN_ID));
    assert_eq!(snapshot.accounts, vec![support::alice(), support::bob()]);
}

#[tokio::test]
async fn test_connect_without_accounts() {
    let h = Harness::new(&support::config());
    h.chain.set_accounts(Vec::new());

    let err = h.dapp.connect().await.unwrap_err();

    assert_eq!(err, ChainError::NoWallet);
    assert!(!h.dapp.session().snapshot().connected);
}

#[tokio::test]
async fn test_sync_session_follows_wallet_changes() {
    let h = Harness::connected(&support::config()).await;
    assert!(!h.dapp.sync_session().await.unwrap());

    // Current account dropped: fall back to the first exposed one
    h.chain.set_accounts(vec![support::bob()]);
    assert!(h.dapp.sync_session().await.unwrap());
    assert_eq!(h.dapp.session().snapshot().address, Some(support::bob()));

    h.chain.set_chain_id(1);
    assert!(h.dapp.sync_session().await.unwrap());
    assert_eq!(h.dapp.session().snapshot().chain_id, Some(1));

    let err = h
        .dapp
        .increment(drip::dapp::CancelToken::never(), &drip::dapp::NoRefresh)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TxError::Validation(ValidationError::WrongNetwork {
            expected: CHAIN_ID,
            actual: 1,
        })
    );
}

#[tokio::test]
async fn test_sync_session_is_a_no_op_when_disconnected() {
    let h = Harness::new(&support::config());

    assert!(!h.dapp.sync_session().await.unwrap());
    assert!(!h.dapp.session().snapshot().connected);
}

#[tokio::test]
async fn test_select_account() {
    let h = Harness::connected(&support::config()).await;

    assert_eq!(h.dapp.session().select_account(1), Some(support::bob()));
    assert_eq!(h.dapp.session().snapshot().address, Some(support::bob()));
    assert_eq!(h.dapp.session().select_account(5), None);
    assert_eq!(h.dapp.session().snapshot().address, Some(support::bob()));
}
