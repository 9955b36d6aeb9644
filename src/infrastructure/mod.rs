//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - The Alloy-based chain client
//! - Contract bindings and revert decoding using alloy-dyn-abi
//! - Tokio runtime bridge for async operations

pub mod abi;
pub mod ethereum;
pub mod runtime;

pub use abi::ArtifactScanner;
pub use runtime::{RuntimeBridge, RuntimeCommand, RuntimeEvent};
