//! Result type alias for Dashport
//!
//! This module provides a convenient Result type alias that uses DashportError
//! as the error type.

use super::errors::DashportError;

/// Result type alias for Dashport operations
///
/// # Examples
///
/// ```
/// use dashport::domain::result::Result;
/// use dashport::domain::errors::DashportError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(DashportError::Ledger("unreadable".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, DashportError>;
