//! ABI infrastructure - contract bindings, revert decoding, artifact scanning

mod binding;
mod decoder;
mod scanner;

pub use binding::{BindingError, ContractBinding, PreparedCall};
pub use decoder::{format_dyn_sol_value, AlloyRevertDecoder};
pub use scanner::ArtifactScanner;
