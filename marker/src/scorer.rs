//! # Scorer Module
//!
//! This module turns a [`TestAnalysis`] into a fractional score. The base score is the standard pass
//! rate; extra-credit bonuses are added on top, but only to a perfect base score.

use crate::types::{ExtraCreditPolicy, TestAnalysis};

/// Computes the score for a run.
///
/// # Arguments
///
/// * `analysis` - The parsed result tree. An analysis carrying an error scores 0.
/// * `policy` - Extra-credit categories and the bonus fraction each is worth.
///
/// # Returns
///
/// `passed / (passed + failed)` over standard tests, or `0.0` when no standard test ran (extra credit
/// never rescues a run with no standard tests). When the base score is exactly `1.0`, `policy.bonus`
/// is added once per category whose own extra-credit pass rate is exactly `1.0`. The result is not
/// clamped and may exceed `1.0`.
///
/// # Example
///
/// ```
/// use marker::scorer::compute_score;
/// use marker::types::{ExtraCreditPolicy, TestAnalysis, TestNode};
///
/// let mut root = TestNode::new("Passoff Tests");
/// root.num_tests_passed = 3;
/// root.num_tests_failed = 1;
///
/// let score = compute_score(&TestAnalysis::new(root), &ExtraCreditPolicy::default());
/// assert_eq!(score, 0.75);
/// ```
pub fn compute_score(analysis: &TestAnalysis, policy: &ExtraCreditPolicy) -> f64 {
    if analysis.error.is_some() {
        return 0.0;
    }

    let root = &analysis.root;
    let total = root.total_tests();
    if total == 0 {
        return 0.0;
    }

    let base = root.num_tests_passed as f64 / total as f64;
    if base != 1.0 {
        return base;
    }

    let earned = policy
        .categories
        .iter()
        .filter(|category| category.is_earned(root))
        .count();

    base + earned as f64 * policy.bonus
}
