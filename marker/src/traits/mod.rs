//!
//! Traits Module
//!
//! - [`parser`]: Defines the generic trait for parsing raw launcher output into Rust types.
//! - [`feedback`]: Defines the trait for producing notes from a scored result tree.

pub mod feedback;
pub mod parser;
