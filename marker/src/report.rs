//! # Rubric Result Module
//!
//! This module defines the result of grading one submission and the response envelope used when that
//! result is printed or published.
//!
//! ## JSON Output Example
//!
//! ```json
//! {
//!   "success": true,
//!   "message": "Grading complete.",
//!   "data": {
//!     "notes": "All tests passed",
//!     "score": 1.05,
//!     "maxPoints": 125.0,
//!     "testAnalysis": { "root": { "test_name": "Passoff Tests", ... } }
//!   }
//! }
//! ```
//!
//! ## Design Notes
//!
//! - `score` is a fraction and is not clamped; bonuses can push it above `1.0`.
//! - A run that failed before scoring still produces a [`RubricResult`], with score 0 and the reason
//!   in `notes`. [`RubricResultResponse::from`] marks those with `success: false`.

use crate::types::TestAnalysis;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of grading one submission for one phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubricResult {
    pub notes: String,
    /// Fraction of the rubric earned, `>= 1.0` once bonuses apply.
    pub score: f64,
    pub max_points: f64,
    pub test_analysis: TestAnalysis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl RubricResult {
    pub fn new(notes: impl Into<String>, score: f64, max_points: f64, test_analysis: TestAnalysis) -> Self {
        Self {
            notes: notes.into(),
            score,
            max_points,
            test_analysis,
            extra: None,
        }
    }

    /// Score 0 with `notes` explaining why the run stopped.
    pub fn failed(notes: impl Into<String>, max_points: f64) -> Self {
        Self::new(notes, 0.0, max_points, TestAnalysis::default())
    }

    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }

    /// `score * max_points`, unclamped.
    pub fn points_earned(&self) -> f64 {
        self.score * self.max_points
    }

    /// True when the run produced a scoreable tree.
    pub fn was_scored(&self) -> bool {
        self.test_analysis.error.is_none() && !self.test_analysis.root.is_empty()
    }
}

/// The envelope printed or published for a finished run.
#[derive(Debug, Serialize)]
pub struct RubricResultResponse {
    success: bool,
    message: String,
    data: RubricResult,
}

impl From<RubricResult> for RubricResultResponse {
    fn from(result: RubricResult) -> Self {
        let (success, message) = if result.was_scored() {
            (true, "Grading complete.".to_string())
        } else {
            (false, "Grading did not produce a score.".to_string())
        };
        RubricResultResponse {
            success,
            message,
            data: result,
        }
    }
}
