//! # Marker Library
//!
//! This crate turns a test launcher's textual report into a scored rubric result.
//!
//! ## Key Concepts
//! - **MarkingJob**: Marks the report of a single run and produces a [`RubricResult`].
//! - **Parsers**: Build the [`TestNode`](types::TestNode) tree from launcher output.
//! - **Scorer**: Pass rate over standard tests plus all-or-nothing extra-credit bonuses.
//! - **Feedback**: Notes shown to the student, including any late penalty.

pub mod error;
pub mod feedback;
pub mod late;
pub mod parsers;
pub mod report;
pub mod scorer;
pub mod traits;
pub mod types;

use crate::feedback::notes::PassoffNotes;
use crate::late::penalty_percent;
use crate::parsers::test_feed_parser::analyze;
use crate::report::RubricResult;
use crate::scorer::compute_score;
use crate::traits::feedback::{Feedback, FeedbackInput};
use crate::types::{ExtraCreditPolicy, TestAnalysis};

use serde_json::json;

/// Marks the launcher report of a single run.
///
/// # Fields
/// - `report`: Raw launcher output.
/// - `max_points`: Points the rubric assigns to the phase.
/// - `policy`: Extra-credit categories and their bonus.
/// - `suite_name`: Name given to the root of the result tree.
/// - `days_late`: Whole days the submission is late.
/// - `feedback`: Strategy producing the notes.
pub struct MarkingJob<'a> {
    report: String,
    max_points: f64,
    policy: ExtraCreditPolicy,
    suite_name: String,
    days_late: u32,
    feedback: Box<dyn Feedback + Send + Sync + 'a>,
}

impl<'a> MarkingJob<'a> {
    pub fn new(report: impl Into<String>, max_points: f64) -> Self {
        Self {
            report: report.into(),
            max_points,
            policy: ExtraCreditPolicy::default(),
            suite_name: String::new(),
            days_late: 0,
            feedback: Box::new(PassoffNotes),
        }
    }

    pub fn with_extra_credit(mut self, policy: ExtraCreditPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_suite_name(mut self, name: impl Into<String>) -> Self {
        self.suite_name = name.into();
        self
    }

    pub fn with_days_late(mut self, days: u32) -> Self {
        self.days_late = days;
        self
    }

    /// Set a custom notes strategy for this marking job.
    pub fn with_feedback<F: Feedback + Send + Sync + 'a>(mut self, feedback: F) -> Self {
        self.feedback = Box::new(feedback);
        self
    }

    /// Parses, scores and annotates the report.
    ///
    /// # Steps
    /// 1. Builds the result tree, tagging extra-credit categories.
    /// 2. Scores it against the extra-credit policy.
    /// 3. Generates notes; a report that could not be parsed has its error appended.
    /// 4. Records lateness in `extra` when the submission is late.
    ///
    /// An unparseable report is not an error here: it yields an empty tree, score 0
    /// and the parse error in both the analysis and the notes.
    pub fn mark(self) -> RubricResult {
        let mut analysis: TestAnalysis = analyze(&self.report, self.policy.names());
        if !self.suite_name.is_empty() {
            analysis.root.test_name = self.suite_name.clone();
        }

        let score = compute_score(&analysis, &self.policy);
        let root = &analysis.root;
        let passed = analysis.error.is_none() && root.num_tests_failed == 0 && root.num_tests_passed > 0;

        let mut notes = self.feedback.assemble_notes(FeedbackInput {
            root,
            score,
            passed,
            days_late: self.days_late,
        });
        if let Some(error) = &analysis.error {
            notes = format!("{notes}. {error}");
        }

        tracing::debug!(
            passed = root.num_tests_passed,
            failed = root.num_tests_failed,
            score,
            "marked test report"
        );

        let days_late = self.days_late;
        let result = RubricResult::new(notes, score, self.max_points, analysis);
        if days_late > 0 {
            result.with_extra(json!({
                "daysLate": days_late,
                "penaltyPercent": penalty_percent(days_late),
            }))
        } else {
            result
        }
    }
}
