//! Parser Trait
//!
//! This module defines the [`Parser`] trait, which provides a generic interface for parsing
//! raw tool output into strongly-typed Rust structures. Implementations are responsible for
//! validating the input and converting it into the appropriate domain model, returning
//! detailed errors on failure.
//!
//! # Example
//!
//! ```rust
//! use marker::error::MarkerError;
//! use marker::traits::parser::Parser;
//!
//! struct LineCounter;
//!
//! impl<'a> Parser<&'a str, usize> for LineCounter {
//!     fn parse(&self, raw: &'a str) -> Result<usize, MarkerError> {
//!         Ok(raw.lines().count())
//!     }
//! }
//! ```

use crate::error::MarkerError;

/// A generic trait for parsing data into a strongly-typed Rust structure.
///
/// # Type Parameters
///
/// * `Input` - The input type to be parsed.
/// * `Output` - The output type produced by the parser.
pub trait Parser<Input, Output> {
    /// Parse an input value into the target type.
    ///
    /// # Errors
    ///
    /// Returns a [`MarkerError`] if the input cannot be interpreted at all.
    fn parse(&self, input: Input) -> Result<Output, MarkerError>;
}
