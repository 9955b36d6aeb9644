//! Contract binding - typed proxy over a JSON ABI
//!
//! View and pure functions route through `ChainClient::call`; state-changing
//! functions are encoded here and sent through `ChainClient::send`.

use std::sync::Arc;

use alloy_dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy_json_abi::{Function, JsonAbi, StateMutability};
use alloy_primitives::{Address, Bytes, B256, U256};
use thiserror::Error;

use super::decoder::{as_u256, AlloyRevertDecoder};
use crate::domain::abi::{ContractKind, RevertDecoder};
use crate::domain::error::RevertKind;
use crate::infrastructure::ethereum::{ChainClient, ChainError};

/// Encoded write, ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCall {
    pub to: Address,
    pub data: Bytes,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("{contract} has no function {method} taking {arity} argument(s)")]
    UnknownMethod {
        contract: ContractKind,
        method: String,
        arity: usize,
    },

    #[error("{0} changes state and cannot be read")]
    NotReadable(String),

    #[error("{0} is a view function and cannot be sent")]
    NotWritable(String),

    #[error("cannot encode {method}: {message}")]
    Encoding { method: String, message: String },

    #[error("cannot decode {method} output: {message}")]
    Decoding { method: String, message: String },

    #[error(transparent)]
    Chain(#[from] ChainError),
}

/// A deployed contract reached through its interface
#[derive(Clone)]
pub struct ContractBinding {
    kind: ContractKind,
    address: Address,
    interface: Arc<JsonAbi>,
}

impl ContractBinding {
    pub fn new(kind: ContractKind, address: Address, interface: Arc<JsonAbi>) -> Self {
        Self {
            kind,
            address,
            interface,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Call a view/pure function and decode its outputs
    pub async fn read(
        &self,
        client: &dyn ChainClient,
        method: &str,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>, BindingError> {
        let function = self.function(method, args.len())?;
        if !is_read_only(function) {
            return Err(BindingError::NotReadable(method.to_string()));
        }
        let data = encode(function, args)?;
        let output = client.call(self.address, data).await?;
        function
            .abi_decode_output(&output)
            .map_err(|err| BindingError::Decoding {
                method: method.to_string(),
                message: err.to_string(),
            })
    }

    /// Read a function whose first output is an unsigned integer
    pub async fn read_uint(
        &self,
        client: &dyn ChainClient,
        method: &str,
        args: &[DynSolValue],
    ) -> Result<U256, BindingError> {
        let values = self.read(client, method, args).await?;
        values
            .first()
            .and_then(as_u256)
            .ok_or_else(|| BindingError::Decoding {
                method: method.to_string(),
                message: "expected an unsigned integer output".to_string(),
            })
    }

    /// Encode a state-changing call without sending it
    pub fn prepare_write(&self, method: &str, args: &[DynSolValue]) -> Result<PreparedCall, BindingError> {
        let function = self.function(method, args.len())?;
        if is_read_only(function) {
            return Err(BindingError::NotWritable(method.to_string()));
        }
        Ok(PreparedCall {
            to: self.address,
            data: encode(function, args)?,
            method: method.to_string(),
        })
    }

    /// Encode and send a state-changing call
    pub async fn write(
        &self,
        client: &dyn ChainClient,
        from: Address,
        method: &str,
        args: &[DynSolValue],
    ) -> Result<B256, BindingError> {
        let call = self.prepare_write(method, args)?;
        Ok(client.send(from, call.to, call.data).await?)
    }

    /// Map revert data to a reason using this interface's declared errors
    pub fn decode_revert(&self, data: &[u8]) -> RevertKind {
        AlloyRevertDecoder::new(self.interface.clone()).decode_revert(data)
    }

    // Overloads are told apart by arity only
    fn function(&self, method: &str, arity: usize) -> Result<&Function, BindingError> {
        self.interface
            .function(method)
            .and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == arity))
            .ok_or_else(|| BindingError::UnknownMethod {
                contract: self.kind,
                method: method.to_string(),
                arity,
            })
    }
}

fn is_read_only(function: &Function) -> bool {
    matches!(
        function.state_mutability,
        StateMutability::View | StateMutability::Pure
    )
}

fn encode(function: &Function, args: &[DynSolValue]) -> Result<Bytes, BindingError> {
    function
        .abi_encode_input(args)
        .map(Bytes::from)
        .map_err(|err| BindingError::Encoding {
            method: function.name.clone(),
            message: err.to_string(),
        })
}
