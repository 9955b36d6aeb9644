//! Counter demo contract

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};

use super::lifecycle::WriteCall;
use crate::domain::amount::parse_positive_integer;
use crate::domain::error::{RefreshError, TxError};
use crate::infrastructure::ethereum::ChainClient;
use crate::infrastructure::abi::ContractBinding;

pub type CounterRefreshError = RefreshError<()>;

#[derive(Clone)]
pub struct Counter {
    binding: ContractBinding,
}

impl Counter {
    pub fn new(binding: ContractBinding) -> Self {
        Self { binding }
    }

    pub fn address(&self) -> Address {
        self.binding.address()
    }

    /// Current value of `x()`
    pub async fn refresh(&self, client: &dyn ChainClient) -> Result<U256, CounterRefreshError> {
        self.binding
            .read_uint(client, "x", &[])
            .await
            .map_err(|err| RefreshError::new("x", err.to_string(), ()))
    }

    pub fn increment_call(&self) -> WriteCall {
        WriteCall::new(self.binding.clone(), "inc", Vec::new())
    }

    /// `incBy(by)`; `by` must be a positive integer
    pub fn increment_by_call(&self, by: &str) -> Result<WriteCall, TxError> {
        let by = parse_positive_integer(by)?;
        Ok(WriteCall::new(
            self.binding.clone(),
            "incBy",
            vec![DynSolValue::Uint(by, 256)],
        ))
    }
}
