//! Transaction lifecycle states and action slots

use std::fmt;

use alloy_primitives::B256;

use super::error::TxError;

/// UI action that owns at most one active lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionSlot {
    Claim,
    Increment,
    IncrementBy,
    Fund,
}

impl ActionSlot {
    pub const ALL: [ActionSlot; 4] = [
        ActionSlot::Claim,
        ActionSlot::Increment,
        ActionSlot::IncrementBy,
        ActionSlot::Fund,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ActionSlot::Claim => "claim",
            ActionSlot::Increment => "increment",
            ActionSlot::IncrementBy => "increment by",
            ActionSlot::Fund => "fund",
        }
    }
}

impl fmt::Display for ActionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Observable state of one write operation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TxState {
    #[default]
    Idle,
    Validating,
    Submitting,
    Pending {
        hash: B256,
    },
    Confirmed {
        hash: B256,
        block_number: Option<u64>,
        /// Post-confirmation refresh failure, non-fatal
        refresh_error: Option<String>,
    },
    Failed {
        error: TxError,
        /// Set when the failure happened after broadcast
        hash: Option<B256>,
    },
}

impl TxState {
    /// In flight; a new action on the slot must wait
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TxState::Validating | TxState::Submitting | TxState::Pending { .. }
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TxState::Confirmed { .. } | TxState::Failed { .. })
    }

    pub fn hash(&self) -> Option<B256> {
        match self {
            TxState::Pending { hash } | TxState::Confirmed { hash, .. } => Some(*hash),
            TxState::Failed { hash, .. } => *hash,
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TxState::Idle => "idle",
            TxState::Validating => "validating",
            TxState::Submitting => "awaiting signature",
            TxState::Pending { .. } => "pending",
            TxState::Confirmed { .. } => "confirmed",
            TxState::Failed { .. } => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ValidationError;

    #[test]
    fn test_active_states() {
        let hash = B256::repeat_byte(1);
        assert!(!TxState::Idle.is_active());
        assert!(TxState::Validating.is_active());
        assert!(TxState::Submitting.is_active());
        assert!(TxState::Pending { hash }.is_active());

        let failed = TxState::Failed {
            error: ValidationError::NotConnected.into(),
            hash: None,
        };
        assert!(failed.is_terminal());
        assert!(!failed.is_active());
        assert_eq!(failed.hash(), None);
    }
}
