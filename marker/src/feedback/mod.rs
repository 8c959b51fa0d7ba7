//! # Feedback Strategies Module
//!
//! Strategies implementing [`Feedback`](crate::traits::feedback::Feedback).
//!
//! - [`notes`]: The pass-off notes shown to students after every run.

pub mod notes;
