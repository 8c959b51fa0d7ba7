//! Marker Error Types
//!
//! This module defines the [`MarkerError`] enum, which encapsulates the errors that can occur while
//! turning a test launcher's report into a scored result.
//!
//! # Example
//!
//! ```rust
//! use marker::error::MarkerError;
//!
//! fn require_events(recognized: usize) -> Result<(), MarkerError> {
//!     if recognized == 0 {
//!         return Err(MarkerError::TestParseFailure("no test events".to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use std::fmt;

/// Represents all error types that can occur in the marker system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerError {
    /// The launcher report contained no recognisable test events.
    TestParseFailure(String),
}

impl fmt::Display for MarkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerError::TestParseFailure(msg) => write!(f, "Could not parse test report: {msg}"),
        }
    }
}

impl std::error::Error for MarkerError {}
