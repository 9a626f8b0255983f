//! Result type alias for Conduit
//!
//! This module provides a convenient Result type alias that uses
//! [`ConduitError`] as the error type.

use super::errors::ConduitError;

/// Result type alias for Conduit operations
///
/// # Examples
///
/// ```
/// use conduit::domain::result::Result;
/// use conduit::domain::errors::ConduitError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ConduitError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ConduitError>;
