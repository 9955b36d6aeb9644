//! Revert decoder implementation using alloy-dyn-abi

use std::sync::Arc;

use alloy_dyn_abi::{DynSolValue, JsonAbiExt};
use alloy_json_abi::JsonAbi;
use alloy_primitives::U256;
use alloy_sol_types::{decode_revert_reason, Revert, SolError};

use crate::domain::abi::RevertDecoder;
use crate::domain::error::RevertKind;

/// Matches revert selectors against an interface's declared errors
pub struct AlloyRevertDecoder {
    interface: Arc<JsonAbi>,
}

impl AlloyRevertDecoder {
    pub fn new(interface: Arc<JsonAbi>) -> Self {
        Self { interface }
    }
}

impl RevertDecoder for AlloyRevertDecoder {
    fn decode_revert(&self, data: &[u8]) -> RevertKind {
        if data.is_empty() {
            return RevertKind::Unknown("no revert data".to_string());
        }

        if data.len() >= 4 {
            let selector = &data[..4];
            if let Some(error) = self
                .interface
                .errors()
                .find(|error| error.selector().as_slice() == selector)
            {
                return match error.abi_decode_input(&data[4..]) {
                    Ok(values) => map_custom_error(&error.name, &values),
                    Err(_) => RevertKind::Custom {
                        name: error.name.clone(),
                        args: Vec::new(),
                    },
                };
            }
        }

        if let Ok(revert) = Revert::abi_decode(data) {
            return RevertKind::Reason(revert.reason);
        }
        match decode_revert_reason(data) {
            Some(reason) => RevertKind::Reason(reason),
            None => RevertKind::Unknown(format!("0x{}", hex::encode(data))),
        }
    }
}

fn map_custom_error(name: &str, values: &[DynSolValue]) -> RevertKind {
    let uint = |index: usize| values.get(index).and_then(DynSolValue::as_uint).map(|(v, _)| v);

    match (name, uint(0), uint(1)) {
        ("ClaimTooSoon", Some(time_remaining), _) => RevertKind::ClaimTooSoon { time_remaining },
        ("InsufficientFaucetBalance", Some(faucet_balance), Some(requested)) => {
            RevertKind::InsufficientFaucetBalance {
                faucet_balance,
                requested,
            }
        }
        _ => RevertKind::Custom {
            name: name.to_string(),
            args: values.iter().map(format_dyn_sol_value).collect(),
        },
    }
}

/// Format a DynSolValue for display
pub fn format_dyn_sol_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => {
            let s = u.to_string();
            // For very large numbers, show hex instead
            if s.len() > 20 {
                format!("0x{:x}", u)
            } else {
                s
            }
        }
        DynSolValue::FixedBytes(word, size) => {
            let bytes = &word.as_slice()[..(*size).min(32)];
            format!("0x{}", hex::encode(bytes))
        }
        DynSolValue::Address(addr) => addr.to_checksum(None),
        DynSolValue::Function(func) => format!("0x{}", hex::encode(func.as_slice())),
        DynSolValue::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
        DynSolValue::String(s) => format!("\"{}\"", s),
        DynSolValue::Array(arr) | DynSolValue::FixedArray(arr) => {
            let items: Vec<String> = arr.iter().map(format_dyn_sol_value).collect();
            format!("[{}]", items.join(", "))
        }
        DynSolValue::Tuple(fields) => {
            let items: Vec<String> = fields.iter().map(format_dyn_sol_value).collect();
            format!("({})", items.join(", "))
        }
    }
}

/// Uint output as `U256`, if the value is one
pub fn as_u256(value: &DynSolValue) -> Option<U256> {
    value.as_uint().map(|(v, _)| v)
}
