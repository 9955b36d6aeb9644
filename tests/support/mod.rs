//! In-memory chain shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, Bytes, B256, U256};
use tokio::sync::Notify;

use drip::config::{Config, ContractsConfig};
use drip::dapp::{CounterRefreshError, Dapp, FaucetRefreshError, FaucetView, ViewSink};
use drip::domain::abi::{ContractKind, InterfaceRegistry};
use drip::domain::eligibility::Clock;
use drip::infrastructure::ethereum::{ChainClient, ChainError, Receipt, WalletAccounts};

pub const CHAIN_ID: u64 = 31337;
pub const START: u64 = 1_700_000_000;
pub const INTERVAL: u64 = 86_400;

pub fn token() -> Address {
    Address::repeat_byte(0x11)
}

pub fn faucet() -> Address {
    Address::repeat_byte(0x22)
}

pub fn counter() -> Address {
    Address::repeat_byte(0x33)
}

pub fn alice() -> Address {
    Address::repeat_byte(0xa1)
}

pub fn bob() -> Address {
    Address::repeat_byte(0xb0)
}

pub fn config() -> Config {
    Config {
        chain_id: Some(CHAIN_ID),
        contracts: ContractsConfig {
            token: Some(token().to_string()),
            faucet: Some(faucet().to_string()),
            counter: Some(counter().to_string()),
        },
        confirmation_poll_ms: Some(50),
        ..Config::default()
    }
}

/// Settable clock
pub struct FixedClock(AtomicU64);

impl FixedClock {
    pub fn new(now: u64) -> Self {
        Self(AtomicU64::new(now))
    }

    pub fn set(&self, now: u64) {
        self.0.store(now, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptMode {
    Confirm,
    Revert,
    Hold,
}

#[derive(Debug, Clone)]
pub struct SentTx {
    pub from: Address,
    pub to: Address,
    pub method: String,
    pub hash: B256,
}

struct ChainState {
    accounts: Vec<Address>,
    chain_id: u64,
    balance: U256,
    decimals: u8,
    claim_amount: U256,
    next_claim_at: u64,
    counter: U256,
    failing_reads: HashSet<String>,
    next_send_error: Option<ChainError>,
    receipts: ReceiptMode,
    failing_receipt_polls: usize,
    receipt_polls: usize,
    sends: Vec<SentTx>,
}

/// Token, faucet and counter contracts behind a `ChainClient`
///
/// Writes take effect at send time; receipts follow `ReceiptMode`.
pub struct MockChain {
    state: Mutex<ChainState>,
    gate: Mutex<Option<Arc<Notify>>>,
    selectors: HashMap<[u8; 4], String>,
    clock: Arc<FixedClock>,
}

impl MockChain {
    pub fn new(clock: Arc<FixedClock>) -> Self {
        let registry = InterfaceRegistry::builtin();
        let mut selectors = HashMap::new();
        for kind in ContractKind::ALL {
            let Some(abi) = registry.get(kind) else {
                continue;
            };
            for function in abi.functions() {
                selectors.insert(function.selector().0, function.name.clone());
            }
        }

        Self {
            state: Mutex::new(ChainState {
                accounts: vec![alice(), bob()],
                chain_id: CHAIN_ID,
                balance: U256::from(25_000_000u64),
                decimals: 6,
                claim_amount: U256::from(10_000_000u64),
                next_claim_at: 0,
                counter: U256::ZERO,
                failing_reads: HashSet::new(),
                next_send_error: None,
                receipts: ReceiptMode::Confirm,
                failing_receipt_polls: 0,
                receipt_polls: 0,
                sends: Vec::new(),
            }),
            gate: Mutex::new(None),
            selectors,
            clock,
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut ChainState) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn sends(&self) -> Vec<SentTx> {
        self.with_state(|s| s.sends.clone())
    }

    pub fn counter_value(&self) -> U256 {
        self.with_state(|s| s.counter)
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.with_state(|s| s.accounts = accounts);
    }

    pub fn set_chain_id(&self, chain_id: u64) {
        self.with_state(|s| s.chain_id = chain_id);
    }

    pub fn set_next_claim_at(&self, at: u64) {
        self.with_state(|s| s.next_claim_at = at);
    }

    pub fn set_receipts(&self, mode: ReceiptMode) {
        self.with_state(|s| s.receipts = mode);
    }

    /// Make the next `count` receipt polls error out
    pub fn fail_receipt_polls(&self, count: usize) {
        self.with_state(|s| s.failing_receipt_polls = count);
    }

    pub fn receipt_polls(&self) -> usize {
        self.with_state(|s| s.receipt_polls)
    }

    pub fn fail_read(&self, method: &str) {
        self.with_state(|s| s.failing_reads.insert(method.to_string()));
    }

    pub fn fail_next_send(&self, err: ChainError) {
        self.with_state(|s| s.next_send_error = Some(err));
    }

    /// Park sends until `release_sends`
    pub fn hold_sends(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Notify::new()));
    }

    pub fn release_sends(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.notify_one();
        }
    }

    fn method(&self, data: &[u8]) -> Option<String> {
        let selector: [u8; 4] = data.get(..4)?.try_into().ok()?;
        self.selectors.get(&selector).cloned()
    }
}

fn word(value: U256) -> Bytes {
    Bytes::copy_from_slice(&value.to_be_bytes::<32>())
}

fn arg(data: &[u8], index: usize) -> U256 {
    let start = 4 + index * 32;
    data.get(start..start + 32)
        .map(U256::from_be_slice)
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl ChainClient for MockChain {
    async fn connect(&self) -> Result<WalletAccounts, ChainError> {
        self.with_state(|s| {
            if s.accounts.is_empty() {
                return Err(ChainError::NoWallet);
            }
            Ok(WalletAccounts {
                accounts: s.accounts.clone(),
                chain_id: s.chain_id,
            })
        })
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(self.with_state(|s| s.chain_id))
    }

    async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let method = self
            .method(&data)
            .ok_or_else(|| ChainError::Rpc("unknown selector".to_string()))?;
        self.with_state(|s| {
            if s.failing_reads.contains(&method) {
                return Err(ChainError::Rpc(format!("{} unavailable", method)));
            }
            let value = match method.as_str() {
                "balanceOf" => s.balance,
                "decimals" => U256::from(s.decimals),
                "usdcClaimAmount" => s.claim_amount,
                "getNextClaimTime" => U256::from(s.next_claim_at),
                "CLAIM_INTERVAL" => U256::from(INTERVAL),
                "x" => s.counter,
                other => return Err(ChainError::Rpc(format!("unexpected call {}", other))),
            };
            Ok(word(value))
        })
    }

    async fn send(&self, from: Address, to: Address, data: Bytes) -> Result<B256, ChainError> {
        let method = self.method(&data).unwrap_or_default();
        let hash = self.with_state(|s| {
            let hash = B256::with_last_byte(s.sends.len() as u8 + 1);
            s.sends.push(SentTx {
                from,
                to,
                method: method.clone(),
                hash,
            });
            hash
        });

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let now = self.clock.now();
        self.with_state(|s| {
            if let Some(err) = s.next_send_error.take() {
                return Err(err);
            }
            match method.as_str() {
                "inc" => s.counter += U256::from(1),
                "incBy" => s.counter += arg(&data, 0),
                "drip" => {
                    s.balance += s.claim_amount;
                    s.next_claim_at = now + INTERVAL;
                }
                "transfer" => s.balance = s.balance.saturating_sub(arg(&data, 1)),
                _ => {}
            }
            Ok(hash)
        })
    }

    async fn receipt(&self, hash: B256) -> Result<Option<Receipt>, ChainError> {
        let mode = self.with_state(|s| {
            s.receipt_polls += 1;
            if s.failing_receipt_polls > 0 {
                s.failing_receipt_polls -= 1;
                return Err(ChainError::Rpc("connection reset".to_string()));
            }
            Ok(s.receipts)
        })?;
        let receipt = |success| Receipt {
            hash,
            block_number: Some(100),
            success,
            gas_used: 21_000,
        };
        Ok(match mode {
            ReceiptMode::Confirm => Some(receipt(true)),
            ReceiptMode::Revert => Some(receipt(false)),
            ReceiptMode::Hold => None,
        })
    }

    fn endpoint_name(&self) -> String {
        "mock".to_string()
    }
}

/// Collects every refreshed view
#[derive(Default)]
pub struct RecordingSink {
    pub faucet: Mutex<Vec<Result<FaucetView, FaucetRefreshError>>>,
    pub counter: Mutex<Vec<Result<U256, CounterRefreshError>>>,
}

impl ViewSink for RecordingSink {
    fn faucet(&self, result: &Result<FaucetView, FaucetRefreshError>) {
        self.faucet.lock().unwrap().push(result.clone());
    }

    fn counter(&self, result: &Result<U256, CounterRefreshError>) {
        self.counter.lock().unwrap().push(result.clone());
    }
}

pub struct Harness {
    pub chain: Arc<MockChain>,
    pub clock: Arc<FixedClock>,
    pub dapp: Arc<Dapp>,
}

impl Harness {
    pub fn new(config: &Config) -> Self {
        let clock = Arc::new(FixedClock::new(START));
        let chain = Arc::new(MockChain::new(clock.clone()));
        let client: Arc<dyn ChainClient> = chain.clone();
        let dapp = Dapp::new(client, config, &InterfaceRegistry::builtin(), clock.clone())
            .expect("valid config");
        Self {
            chain,
            clock,
            dapp: Arc::new(dapp),
        }
    }

    /// Harness with the wallet connected on alice
    pub async fn connected(config: &Config) -> Self {
        let harness = Self::new(config);
        harness.dapp.connect().await.expect("wallet connects");
        harness
    }
}
