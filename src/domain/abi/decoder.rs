//! Revert decoder trait

use crate::domain::error::RevertKind;

/// Trait for turning revert data into a structured reason
///
/// Implementations match the 4-byte selector against declared custom errors
/// before falling back to `Error(string)` reasons.
pub trait RevertDecoder: Send + Sync {
    /// Decode raw revert data
    ///
    /// # Arguments
    /// * `data` - Revert payload as returned by the node (selector + args)
    ///
    /// # Returns
    /// The best matching `RevertKind`; unknown payloads map to
    /// `RevertKind::Unknown` rather than an error.
    fn decode_revert(&self, data: &[u8]) -> RevertKind;
}
