//!
//! # Feedback Trait
//!
//! This module defines the [`Feedback`] trait, the seam through which the marker turns a scored
//! result tree into the human-readable notes attached to a rubric result.
//!

use crate::types::TestNode;

/// Everything a notes strategy may look at for one run.
#[derive(Debug, Clone, Copy)]
pub struct FeedbackInput<'a> {
    pub root: &'a TestNode,
    pub score: f64,
    pub passed: bool,
    pub days_late: u32,
}

/// A trait for pluggable notes strategies in the marker system.
///
/// # Arguments
/// - `input`: The result tree, the computed score, whether the run passed and how late it was.
///
/// # Returns
/// The notes string for the run.
pub trait Feedback {
    fn assemble_notes(&self, input: FeedbackInput<'_>) -> String;
}
