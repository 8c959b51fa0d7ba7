//! # Parsers
//!
//! Parsers that turn raw launcher output into the marker's domain types.
//!
//! - [`test_feed_parser`]: builds a [`TestAnalysis`](crate::types::TestAnalysis)
//!   tree from a test launcher's line-oriented event feed.

pub mod test_feed_parser;
