//! # Pass-off Notes
//!
//! [`PassoffNotes`] produces the notes attached to a graded run, picking the first rule that applies:
//!
//! 1. An empty tree: `"No tests were run"`.
//! 2. Passed and on time: `"All tests passed"`.
//! 3. Passed but late: the number of days late and a `min(50, days * 10)` percent penalty.
//! 4. A score other than `1.0`: a reminder that every test must pass.
//! 5. Otherwise the full result tree, one node per line.

use crate::late::penalty_percent;
use crate::traits::feedback::{Feedback, FeedbackInput};
use crate::types::TestNode;

pub const NO_TESTS_RUN: &str = "No tests were run";
pub const ALL_TESTS_PASSED: &str = "All tests passed";
pub const SOME_TESTS_FAILED: &str =
    "Some tests failed. You must pass all tests to pass off this phase";

#[derive(Debug, Default, Clone, Copy)]
pub struct PassoffNotes;

impl Feedback for PassoffNotes {
    fn assemble_notes(&self, input: FeedbackInput<'_>) -> String {
        if input.root.is_empty() {
            return NO_TESTS_RUN.to_string();
        }

        if input.passed {
            if input.days_late == 0 {
                return ALL_TESTS_PASSED.to_string();
            }
            let days = input.days_late;
            return format!(
                "{ALL_TESTS_PASSED}, but the submission is {days} day{} late. \
                 A {}% late penalty applies.",
                if days == 1 { "" } else { "s" },
                penalty_percent(days)
            );
        }

        if input.score != 1.0 {
            return SOME_TESTS_FAILED.to_string();
        }

        input.root.to_string()
    }
}

/// Notes for a run using [`PassoffNotes`].
pub fn generate_notes(root: &TestNode, score: f64, passed: bool, days_late: u32) -> String {
    PassoffNotes.assemble_notes(FeedbackInput {
        root,
        score,
        passed,
        days_late,
    })
}
