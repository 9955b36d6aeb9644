//! Interface registry - contract ABIs keyed by role

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use alloy_json_abi::JsonAbi;
use serde::{Deserialize, Serialize};

const TOKEN_ABI: &str = include_str!("../../../abi/Token.json");
const FAUCET_ABI: &str = include_str!("../../../abi/Faucet.json");
const COUNTER_ABI: &str = include_str!("../../../abi/Counter.json");

/// Role a contract plays for the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
    Token,
    Faucet,
    Counter,
}

impl ContractKind {
    pub const ALL: [ContractKind; 3] = [ContractKind::Token, ContractKind::Faucet, ContractKind::Counter];

    /// Contract names accepted when matching compiled artifacts
    pub fn artifact_names(&self) -> &'static [&'static str] {
        match self {
            ContractKind::Token => &["Usdc", "USDC", "Token"],
            ContractKind::Faucet => &["Faucet"],
            ContractKind::Counter => &["Counter"],
        }
    }

    pub fn from_artifact_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.artifact_names().contains(&name))
    }

    fn builtin_source(&self) -> &'static str {
        match self {
            ContractKind::Token => TOKEN_ABI,
            ContractKind::Faucet => FAUCET_ABI,
            ContractKind::Counter => COUNTER_ABI,
        }
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContractKind::Token => "token",
            ContractKind::Faucet => "faucet",
            ContractKind::Counter => "counter",
        };
        f.write_str(name)
    }
}

/// Where an interface came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceSource {
    Builtin,
    Artifact(PathBuf),
}

#[derive(Debug, Clone)]
struct Entry {
    abi: Arc<JsonAbi>,
    source: InterfaceSource,
}

/// Registry of contract interfaces, one per `ContractKind`
#[derive(Debug, Clone, Default)]
pub struct InterfaceRegistry {
    entries: HashMap<ContractKind, Entry>,
    /// Number of artifact files scanned
    pub scanned_files: usize,
    /// Scan errors
    pub errors: Vec<String>,
}

impl InterfaceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the interfaces shipped with the binary
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for kind in ContractKind::ALL {
            match serde_json::from_str::<JsonAbi>(kind.builtin_source()) {
                Ok(abi) => {
                    registry.entries.insert(
                        kind,
                        Entry {
                            abi: Arc::new(abi),
                            source: InterfaceSource::Builtin,
                        },
                    );
                }
                Err(err) => registry.errors.push(format!("builtin {} abi: {}", kind, err)),
            }
        }
        registry
    }

    /// Replace the interface for `kind`
    pub fn insert(&mut self, kind: ContractKind, abi: JsonAbi, source: InterfaceSource) {
        self.entries.insert(
            kind,
            Entry {
                abi: Arc::new(abi),
                source,
            },
        );
    }

    pub fn get(&self, kind: ContractKind) -> Option<Arc<JsonAbi>> {
        self.entries.get(&kind).map(|entry| entry.abi.clone())
    }

    pub fn source(&self, kind: ContractKind) -> Option<&InterfaceSource> {
        self.entries.get(&kind).map(|entry| &entry.source)
    }

    /// Merge another registry into this one
    ///
    /// Interfaces from `other` win; artifact overrides are merged over the
    /// builtin set.
    pub fn merge(&mut self, other: Self) {
        self.scanned_files = self.scanned_files.saturating_add(other.scanned_files);
        self.errors.extend(other.errors);
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
