//! Domain layer - Business logic and models
//!
//! Pure types with no transport or UI dependencies: amounts, claim
//! eligibility, session state, lifecycle states and the error taxonomy.

pub mod abi;
pub mod amount;
pub mod eligibility;
pub mod error;
pub mod explorer;
pub mod lifecycle;
pub mod session;

pub use amount::{parse_positive_integer, Amount};
pub use eligibility::{format_countdown, ClaimEligibility, Clock, Countdown, SystemClock};
pub use error::{ErrorCategory, RefreshError, RevertKind, TxError, ValidationError};
pub use explorer::Explorer;
pub use lifecycle::{ActionSlot, TxState};
pub use session::{SessionSnapshot, SessionState, WalletNotification};
