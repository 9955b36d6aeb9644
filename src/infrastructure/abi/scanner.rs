//! Artifact scanner - finds compiled contract ABIs that override the builtins

use std::fs;
use std::path::{Path, PathBuf};

use alloy_json_abi::JsonAbi;
use walkdir::WalkDir;

use crate::domain::abi::{ContractKind, InterfaceRegistry, InterfaceSource};

/// Scanner for Hardhat `artifacts/` and Foundry `out/` directories
pub struct ArtifactScanner;

impl ArtifactScanner {
    /// Scan a single root directory for artifacts of known contracts
    pub fn scan(root: impl AsRef<Path>) -> InterfaceRegistry {
        let root = root.as_ref();
        let mut registry = InterfaceRegistry::new();
        let mut scanned_files = 0;
        let mut errors = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !Self::is_ignored_dir(e.path()))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    errors.push(err.to_string());
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            if !Self::path_contains_any(path, &["out", "artifacts"]) {
                continue;
            }
            // Hardhat debug files sit next to each artifact
            if path.to_string_lossy().ends_with(".dbg.json") {
                continue;
            }

            scanned_files += 1;

            match Self::load_artifact(path) {
                Ok(Some((kind, abi))) => {
                    tracing::debug!(%kind, path = %path.display(), "artifact interface loaded");
                    registry.insert(kind, abi, InterfaceSource::Artifact(path.to_path_buf()));
                }
                Ok(None) => {}
                Err(err) => errors.push(format!("{}: {}", path.display(), err)),
            }
        }

        registry.scanned_files = scanned_files;
        registry.errors = errors;
        registry
    }

    /// Scan multiple root directories; later roots win
    pub fn scan_roots(roots: &[PathBuf]) -> InterfaceRegistry {
        let mut registry = InterfaceRegistry::new();
        for root in roots {
            registry.merge(Self::scan(root));
        }
        registry
    }

    /// Load an artifact if it belongs to a known contract
    fn load_artifact(path: &Path) -> anyhow::Result<Option<(ContractKind, JsonAbi)>> {
        let content = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&content)?;

        // Hardhat stores the name; Foundry names the file after the contract
        let name = value
            .get("contractName")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
            });
        let Some(kind) = name.as_deref().and_then(ContractKind::from_artifact_name) else {
            return Ok(None);
        };

        let Some(abi_value) = value.get("abi") else {
            return Ok(None);
        };
        let abi: JsonAbi = serde_json::from_value(abi_value.clone())?;
        Ok(Some((kind, abi)))
    }

    /// Check if a path should be ignored
    fn is_ignored_dir(path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(|name| {
                matches!(
                    name,
                    ".git" | "target" | "node_modules" | "cache" | "build-info"
                )
            })
            .unwrap_or(false)
    }

    /// Check if path contains any of the given names
    fn path_contains_any(path: &Path, names: &[&str]) -> bool {
        path.components().any(|component| {
            if let std::path::Component::Normal(value) = component {
                if let Some(value) = value.to_str() {
                    return names.iter().any(|name| *name == value);
                }
            }
            false
        })
    }
}
