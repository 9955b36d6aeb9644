//! Runtime infrastructure - Tokio runtime bridge for async operations

mod bridge;
mod worker;

pub use bridge::{ContractAddresses, RuntimeBridge, RuntimeCommand, RuntimeEvent, WorkerSetup};
pub use worker::run_async_worker;
