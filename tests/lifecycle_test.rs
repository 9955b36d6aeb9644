//! Write lifecycle against an in-memory chain

mod support;

use alloy_primitives::{Bytes, U256};
use alloy_sol_types::{sol, SolError};

use drip::dapp::{CancelToken, NoRefresh, RefreshTarget, TxReport};
use drip::domain::abi::ContractKind;
use drip::domain::error::{ErrorCategory, RevertKind, TxError, ValidationError};
use drip::domain::lifecycle::{ActionSlot, TxState};
use drip::infrastructure::ethereum::ChainError;

use support::{Harness, ReceiptMode, RecordingSink, CHAIN_ID, INTERVAL, START};

sol! {
    error ClaimTooSoon(uint256 timeRemaining);
    error InsufficientFaucetBalance(uint256 faucetBalance, uint256 requested);
}

#[tokio::test]
async fn test_invalid_amounts_never_reach_the_wallet() {
    let h = Harness::connected(&support::config()).await;

    for input in ["", "  ", "0", "-1", "1.5", "1e3", "0x10", "abc"] {
        let err = h
            .dapp
            .increment_by(CancelToken::never(), input.to_string(), &NoRefresh)
            .await
            .unwrap_err();
        assert!(
            matches!(err, TxError::Validation(ValidationError::InvalidAmount { .. })),
            "incby {:?}: {:?}",
            input,
            err
        );
        assert_eq!(err.category(), ErrorCategory::Validation);

        let err = h
            .dapp
            .fund(CancelToken::never(), input.to_string(), &NoRefresh)
            .await
            .unwrap_err();
        assert!(
            matches!(err, TxError::Validation(ValidationError::InvalidAmount { .. })),
            "fund {:?}: {:?}",
            input,
            err
        );
    }

    assert!(h.chain.sends().is_empty());
    assert!(matches!(
        h.dapp.manager().state(ActionSlot::IncrementBy),
        TxState::Failed { hash: None, .. }
    ));
}

#[tokio::test]
async fn test_increment_by_sends_the_parsed_amount() {
    let h = Harness::connected(&support::config()).await;

    let report = h
        .dapp
        .increment_by(CancelToken::never(), " 5 ".to_string(), &NoRefresh)
        .await
        .unwrap();

    assert!(matches!(report, TxReport::Confirmed { .. }));
    assert_eq!(h.chain.counter_value(), U256::from(5));
    let sends = h.chain.sends();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].method, "incBy");
    assert_eq!(sends[0].to, support::counter());
    assert_eq!(sends[0].from, support::alice());
}

#[tokio::test]
async fn test_second_invocation_while_in_flight_is_rejected() {
    let h = Harness::connected(&support::config()).await;
    h.chain.hold_sends();

    let mut states = h.dapp.manager().subscribe(ActionSlot::Increment);
    let dapp = h.dapp.clone();
    let first = tokio::spawn(async move { dapp.increment(CancelToken::never(), &NoRefresh).await });
    states
        .wait_for(|state| matches!(state, TxState::Submitting))
        .await
        .unwrap();

    let err = h
        .dapp
        .increment(CancelToken::never(), &NoRefresh)
        .await
        .unwrap_err();
    assert_eq!(err, TxError::AlreadyInProgress("increment".to_string()));
    assert_eq!(err.category(), ErrorCategory::AlreadyInProgress);
    assert_eq!(h.dapp.manager().state(ActionSlot::Increment), TxState::Submitting);

    h.chain.release_sends();
    let report = first.await.unwrap().unwrap();
    assert!(matches!(report, TxReport::Confirmed { .. }));
    assert_eq!(h.chain.sends().len(), 1);
    assert_eq!(h.chain.counter_value(), U256::from(1));
}

#[tokio::test]
async fn test_cancel_stops_waiting_and_frees_the_slot() {
    let h = Harness::connected(&support::config()).await;
    h.chain.set_receipts(ReceiptMode::Hold);

    let mut states = h.dapp.manager().subscribe(ActionSlot::Increment);
    let (handle, token) = CancelToken::pair();
    let dapp = h.dapp.clone();
    let first = tokio::spawn(async move { dapp.increment(token, &NoRefresh).await });
    states
        .wait_for(|state| matches!(state, TxState::Pending { .. }))
        .await
        .unwrap();

    handle.cancel();
    let report = first.await.unwrap().unwrap();
    let sent = h.chain.sends();
    assert_eq!(report, TxReport::Abandoned { hash: sent[0].hash });
    assert_eq!(h.dapp.manager().state(ActionSlot::Increment), TxState::Idle);

    h.chain.set_receipts(ReceiptMode::Confirm);
    let report = h
        .dapp
        .increment(CancelToken::never(), &NoRefresh)
        .await
        .unwrap();
    assert!(matches!(report, TxReport::Confirmed { .. }));
    assert_eq!(h.chain.sends().len(), 2);
}

#[tokio::test]
async fn test_disconnect_while_pending() {
    let h = Harness::connected(&support::config()).await;
    h.chain.set_receipts(ReceiptMode::Hold);

    let mut states = h.dapp.manager().subscribe(ActionSlot::Increment);
    let dapp = h.dapp.clone();
    let first = tokio::spawn(async move { dapp.increment(CancelToken::never(), &NoRefresh).await });
    states
        .wait_for(|state| matches!(state, TxState::Pending { .. }))
        .await
        .unwrap();

    h.dapp.disconnect();
    let err = h
        .dapp
        .claim(CancelToken::never(), None, &NoRefresh)
        .await
        .unwrap_err();
    assert_eq!(err, TxError::Validation(ValidationError::NotConnected));
    assert!(matches!(
        h.dapp.manager().state(ActionSlot::Increment),
        TxState::Pending { .. }
    ));

    // The broadcast transaction still resolves
    h.chain.set_receipts(ReceiptMode::Confirm);
    let report = first.await.unwrap().unwrap();
    assert!(matches!(report, TxReport::Confirmed { .. }));
    assert_eq!(h.chain.sends().len(), 1);
}

#[tokio::test]
async fn test_receipt_poll_errors_keep_waiting() {
    let h = Harness::connected(&support::config()).await;
    h.chain.fail_receipt_polls(2);

    let report = h
        .dapp
        .increment(CancelToken::never(), &NoRefresh)
        .await
        .unwrap();

    assert!(matches!(report, TxReport::Confirmed { .. }));
    assert_eq!(h.chain.receipt_polls(), 3);
    assert!(matches!(
        h.dapp.manager().state(ActionSlot::Increment),
        TxState::Confirmed { .. }
    ));
}

#[tokio::test]
async fn test_wrong_network_blocks_writes() {
    let mut config = support::config();
    config.chain_id = Some(1);
    let h = Harness::connected(&config).await;

    let err = h
        .dapp
        .increment(CancelToken::never(), &NoRefresh)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        TxError::Validation(ValidationError::WrongNetwork {
            expected: 1,
            actual: CHAIN_ID,
        })
    );
    assert!(h.chain.sends().is_empty());
}

#[tokio::test]
async fn test_missing_contract_fails_validation() {
    let mut config = support::config();
    config.contracts.counter = None;
    let h = Harness::connected(&config).await;

    let err = h
        .dapp
        .increment(CancelToken::never(), &NoRefresh)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TxError::Validation(ValidationError::MissingContract(ContractKind::Counter))
    );
    assert!(h.chain.sends().is_empty());

    // The faucet is configured independently
    let report = h
        .dapp
        .claim(CancelToken::never(), None, &NoRefresh)
        .await
        .unwrap();
    assert!(matches!(report, TxReport::Confirmed { .. }));
}

#[tokio::test]
async fn test_user_rejection_leaves_slot_reusable() {
    let h = Harness::connected(&support::config()).await;
    h.chain.fail_next_send(ChainError::UserRejected);

    let err = h
        .dapp
        .increment(CancelToken::never(), &NoRefresh)
        .await
        .unwrap_err();
    assert_eq!(err, TxError::UserRejected);
    assert_eq!(err.category(), ErrorCategory::UserRejected);
    assert_eq!(
        h.dapp.manager().state(ActionSlot::Increment),
        TxState::Failed {
            error: TxError::UserRejected,
            hash: None,
        }
    );

    let report = h
        .dapp
        .increment(CancelToken::never(), &NoRefresh)
        .await
        .unwrap();
    assert!(matches!(report, TxReport::Confirmed { .. }));
}

#[tokio::test]
async fn test_reverted_receipt_is_a_contract_revert() {
    let h = Harness::connected(&support::config()).await;
    h.chain.set_receipts(ReceiptMode::Revert);

    let err = h
        .dapp
        .increment(CancelToken::never(), &NoRefresh)
        .await
        .unwrap_err();

    assert!(matches!(err, TxError::ContractRevert(RevertKind::Unknown(_))));
    let hash = h.chain.sends()[0].hash;
    assert!(matches!(
        h.dapp.manager().state(ActionSlot::Increment),
        TxState::Failed { hash: Some(h2), .. } if h2 == hash
    ));
}

#[tokio::test]
async fn test_claim_too_soon_revert_is_decoded() {
    let h = Harness::connected(&support::config()).await;
    let data = ClaimTooSoon {
        timeRemaining: U256::from(3600),
    }
    .abi_encode();
    h.chain.fail_next_send(ChainError::Revert {
        data: Some(Bytes::from(data)),
        message: "execution reverted".to_string(),
    });

    let err = h
        .dapp
        .claim(CancelToken::never(), None, &NoRefresh)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        TxError::ContractRevert(RevertKind::ClaimTooSoon {
            time_remaining: U256::from(3600),
        })
    );
    assert_eq!(err.category(), ErrorCategory::ContractRevert);
    assert!(err.to_string().contains("claim too soon"));
}

#[tokio::test]
async fn test_empty_faucet_revert_is_decoded() {
    let h = Harness::connected(&support::config()).await;
    let data = InsufficientFaucetBalance {
        faucetBalance: U256::from(1),
        requested: U256::from(10_000_000u64),
    }
    .abi_encode();
    h.chain.fail_next_send(ChainError::Revert {
        data: Some(Bytes::from(data)),
        message: "execution reverted".to_string(),
    });

    let err = h
        .dapp
        .claim(CancelToken::never(), None, &NoRefresh)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        TxError::ContractRevert(RevertKind::InsufficientFaucetBalance { .. })
    ));
    assert!(err.user_message().contains("faucet is empty"));
}

#[tokio::test]
async fn test_claim_then_cooldown() {
    let h = Harness::connected(&support::config()).await;
    let sink = RecordingSink::default();

    let view = h.dapp.refresh_faucet(support::alice()).await.unwrap();
    assert!(view.eligibility().is_eligible(h.dapp.now()));

    let refresher = h.dapp.refresher(RefreshTarget::Faucet, &sink);
    let report = h
        .dapp
        .claim(CancelToken::never(), Some(view.next_claim_at), &refresher)
        .await
        .unwrap();
    assert!(matches!(report, TxReport::Confirmed { refresh_error: None, .. }));

    let sent = h.chain.sends();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, "drip");
    assert_eq!(sent[0].to, support::faucet());

    let refreshed = sink.faucet.lock().unwrap().last().cloned().unwrap().unwrap();
    assert_eq!(refreshed.balance.raw(), U256::from(35_000_000u64));
    assert_eq!(refreshed.next_claim_at, START + INTERVAL);

    // Later the same day the cached read rejects the claim locally
    h.clock.set(START + 3600);
    let err = h
        .dapp
        .claim(CancelToken::never(), Some(refreshed.next_claim_at), &refresher)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TxError::Validation(ValidationError::ClaimNotYetAvailable {
            remaining: INTERVAL - 3600,
        })
    );
    assert_eq!(h.chain.sends().len(), 1);

    h.clock.set(START + INTERVAL);
    let report = h
        .dapp
        .claim(CancelToken::never(), Some(refreshed.next_claim_at), &refresher)
        .await
        .unwrap();
    assert!(matches!(report, TxReport::Confirmed { .. }));
}

#[tokio::test]
async fn test_confirmed_write_with_failing_refresh() {
    let h = Harness::connected(&support::config()).await;
    let sink = RecordingSink::default();
    let refresher = h.dapp.refresher(RefreshTarget::Counter, &sink);

    let report = h
        .dapp
        .increment(CancelToken::never(), &refresher)
        .await
        .unwrap();
    assert!(matches!(report, TxReport::Confirmed { refresh_error: None, .. }));
    assert_eq!(sink.counter.lock().unwrap().last().cloned(), Some(Ok(U256::from(1))));

    h.chain.fail_read("x");
    let report = h
        .dapp
        .increment(CancelToken::never(), &refresher)
        .await
        .unwrap();

    let TxReport::Confirmed { refresh_error, .. } = report else {
        panic!("expected confirmation, got {:?}", report);
    };
    let message = refresh_error.expect("refresh failure is reported");
    assert!(message.contains("x"), "{}", message);
    assert!(matches!(
        h.dapp.manager().state(ActionSlot::Increment),
        TxState::Confirmed { refresh_error: Some(_), .. }
    ));
    assert_eq!(h.chain.counter_value(), U256::from(2));
}

#[tokio::test]
async fn test_fund_transfers_to_the_faucet() {
    let h = Harness::connected(&support::config()).await;

    let report = h
        .dapp
        .fund(CancelToken::never(), "5000000".to_string(), &NoRefresh)
        .await
        .unwrap();

    assert!(matches!(report, TxReport::Confirmed { .. }));
    let sent = h.chain.sends();
    assert_eq!(sent[0].method, "transfer");
    assert_eq!(sent[0].to, support::token());
}
