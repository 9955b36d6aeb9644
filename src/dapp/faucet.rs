//! Faucet reads and write construction

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};

use super::lifecycle::WriteCall;
use crate::domain::amount::{parse_positive_integer, Amount};
use crate::domain::eligibility::ClaimEligibility;
use crate::domain::error::{RefreshError, TxError, ValidationError};
use crate::domain::session::SessionSnapshot;
use crate::infrastructure::abi::{BindingError, ContractBinding};
use crate::infrastructure::ethereum::ChainClient;

/// Values read before a refresh failed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaucetReadings {
    pub balance: Option<U256>,
    pub decimals: Option<u8>,
    pub claim_amount: Option<U256>,
    pub next_claim_at: Option<u64>,
}

pub type FaucetRefreshError = RefreshError<FaucetReadings>;

/// Faucet state for one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaucetView {
    pub account: Address,
    pub balance: Amount,
    pub claim_amount: Amount,
    pub next_claim_at: u64,
}

impl FaucetView {
    pub fn eligibility(&self) -> ClaimEligibility {
        ClaimEligibility::new(self.next_claim_at)
    }
}

/// Token and faucet bindings used together
#[derive(Clone)]
pub struct Faucet {
    token: ContractBinding,
    faucet: ContractBinding,
}

impl Faucet {
    pub fn new(token: ContractBinding, faucet: ContractBinding) -> Self {
        Self { token, faucet }
    }

    pub fn address(&self) -> Address {
        self.faucet.address()
    }

    /// Read balance, decimals, claim amount and next claim time, in order
    pub async fn refresh(
        &self,
        client: &dyn ChainClient,
        account: Address,
    ) -> Result<FaucetView, FaucetRefreshError> {
        let mut readings = FaucetReadings::default();
        let holder = [DynSolValue::Address(account)];

        let balance = self
            .token
            .read_uint(client, "balanceOf", &holder)
            .await
            .map_err(|err| failed("balanceOf", err, &readings))?;
        readings.balance = Some(balance);

        let decimals = self
            .token
            .read_uint(client, "decimals", &[])
            .await
            .map_err(|err| failed("decimals", err, &readings))
            .and_then(|value| {
                u8::try_from(value).map_err(|_| {
                    RefreshError::new("decimals", format!("out of range: {}", value), readings.clone())
                })
            })?;
        readings.decimals = Some(decimals);

        let claim_amount = self
            .faucet
            .read_uint(client, "usdcClaimAmount", &[])
            .await
            .map_err(|err| failed("usdcClaimAmount", err, &readings))?;
        readings.claim_amount = Some(claim_amount);

        let next_claim_at = self
            .faucet
            .read_uint(client, "getNextClaimTime", &holder)
            .await
            .map_err(|err| failed("getNextClaimTime", err, &readings))
            .and_then(|value| {
                u64::try_from(value).map_err(|_| {
                    RefreshError::new(
                        "getNextClaimTime",
                        format!("out of range: {}", value),
                        readings.clone(),
                    )
                })
            })?;

        Ok(FaucetView {
            account,
            balance: Amount::new(balance, decimals),
            claim_amount: Amount::new(claim_amount, decimals),
            next_claim_at,
        })
    }

    /// Cooldown between claims, in seconds
    pub async fn claim_interval(&self, client: &dyn ChainClient) -> Result<u64, BindingError> {
        let value = self.faucet.read_uint(client, "CLAIM_INTERVAL", &[]).await?;
        Ok(u64::try_from(value).unwrap_or(u64::MAX))
    }

    /// `drip(account)`, rejected early when a cached read says the cooldown
    /// has not elapsed
    pub fn claim_call(
        &self,
        session: &SessionSnapshot,
        next_claim_at: Option<u64>,
        now: u64,
    ) -> Result<WriteCall, TxError> {
        let account = session.require_connected()?;
        if let Some(next_claim_at) = next_claim_at {
            let eligibility = ClaimEligibility::new(next_claim_at);
            if !eligibility.is_eligible(now) {
                return Err(ValidationError::ClaimNotYetAvailable {
                    remaining: eligibility.remaining(now),
                }
                .into());
            }
        }
        Ok(WriteCall::new(
            self.faucet.clone(),
            "drip",
            vec![DynSolValue::Address(account)],
        ))
    }

    /// `token.transfer(faucet, amount)` with `amount` in smallest units
    pub fn fund_call(&self, amount: &str) -> Result<WriteCall, TxError> {
        let amount = parse_positive_integer(amount)?;
        Ok(WriteCall::new(
            self.token.clone(),
            "transfer",
            vec![
                DynSolValue::Address(self.faucet.address()),
                DynSolValue::Uint(amount, 256),
            ],
        ))
    }
}

fn failed(read: &str, err: BindingError, readings: &FaucetReadings) -> FaucetRefreshError {
    RefreshError::new(read, err.to_string(), readings.clone())
}
