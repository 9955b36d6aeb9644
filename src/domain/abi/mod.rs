//! ABI domain models and contracts
//!
//! Contract roles, the interface registry and the revert decoding seam,
//! independent of how calls are encoded or sent.

mod decoder;
mod registry;

pub use decoder::RevertDecoder;
pub use registry::{ContractKind, InterfaceRegistry, InterfaceSource};
