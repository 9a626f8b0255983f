//! Domain models and types for Conduit.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`ReportId`], [`ActionId`])
//! - **Pipeline models** ([`Report`], [`Destination`], [`Action`])
//! - **Persisted records** ([`ReportRecord`], [`LineageEdge`], [`ActionRecord`])
//! - **Retry tokens** ([`RetryItems`], [`RetryOutcome`])
//! - **Error types** ([`ConduitError`], [`TransportError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, ConduitError>`]:
//!
//! ```rust
//! use conduit::domain::{ConduitError, Result};
//!
//! fn example() -> Result<()> {
//!     Err(ConduitError::InvariantViolation("report tracked twice".to_string()))
//! }
//!
//! assert!(example().unwrap_err().is_invariant_violation());
//! ```

pub mod action;
pub mod destination;
pub mod errors;
pub mod ids;
pub mod record;
pub mod report;
pub mod result;
pub mod retry;

// Re-export commonly used types for convenience
pub use action::{truncate_to_width, Action, ActionKind, DiagnosticLog, Event};
pub use destination::{Destination, TransportKind};
pub use errors::{ConduitError, TransportError};
pub use ids::{ActionId, ReportId};
pub use record::{ActionRecord, LineageEdge, ReportRecord};
pub use report::{split_items, Report, ReportBuilder, ReportHeader, ReportSource};
pub use result::Result;
pub use retry::{RetryItems, RetryOutcome};
