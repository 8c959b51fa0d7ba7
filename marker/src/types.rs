//! # Types Module
//!
//! The result tree built from a test launcher report, and the extra-credit
//! policy applied to it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

/// A test suite, class or method in the result tree.
///
/// Leaves carry their own outcome counts. Every inner node's counts are the
/// sum of its children's once [`TestNode::count_tests`] has run. Outcomes
/// under a node tagged with an extra-credit category are tracked in the
/// `num_extra_credit_*` counters, never in the standard ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestNode {
    pub test_name: String,
    pub num_tests_passed: u32,
    pub num_tests_failed: u32,
    pub num_extra_credit_passed: u32,
    pub num_extra_credit_failed: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ec_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub children: BTreeMap<String, TestNode>,
}

impl TestNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            test_name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// True when no test outcome was recorded, whatever nodes exist.
    pub fn is_empty(&self) -> bool {
        self.total_tests() == 0 && self.total_extra_credit() == 0
    }

    /// Returns the child called `name`, creating it when absent.
    pub fn child_or_insert(&mut self, name: &str) -> &mut TestNode {
        self.children
            .entry(name.to_string())
            .or_insert_with(|| TestNode::new(name))
    }

    pub fn total_tests(&self) -> u32 {
        self.num_tests_passed + self.num_tests_failed
    }

    pub fn total_extra_credit(&self) -> u32 {
        self.num_extra_credit_passed + self.num_extra_credit_failed
    }

    /// Recomputes every inner node's counters as the sum of its children's,
    /// bottom-up. Standard and extra-credit counters are summed separately.
    pub fn count_tests(&mut self) {
        if self.children.is_empty() {
            return;
        }

        let (mut passed, mut failed, mut ec_passed, mut ec_failed) = (0, 0, 0, 0);
        for child in self.children.values_mut() {
            child.count_tests();
            passed += child.num_tests_passed;
            failed += child.num_tests_failed;
            ec_passed += child.num_extra_credit_passed;
            ec_failed += child.num_extra_credit_failed;
        }

        self.num_tests_passed = passed;
        self.num_tests_failed = failed;
        self.num_extra_credit_passed = ec_passed;
        self.num_extra_credit_failed = ec_failed;
    }

    /// Breadth-first search for the node tagged with `category`.
    ///
    /// Categories do not nest, so the search never descends below a tagged node.
    pub fn find_category(&self, category: &str) -> Option<&TestNode> {
        let mut queue = VecDeque::from([self]);
        while let Some(node) = queue.pop_front() {
            match node.ec_category.as_deref() {
                Some(tag) if tag == category => return Some(node),
                Some(_) => continue,
                None => queue.extend(node.children.values()),
            }
        }
        None
    }

    /// Pass rate of this node's extra-credit tests, `None` when it has none.
    pub fn extra_credit_rate(&self) -> Option<f64> {
        let total = self.total_extra_credit();
        (total > 0).then(|| self.num_extra_credit_passed as f64 / total as f64)
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);

        if self.is_leaf() {
            let status = if self.num_tests_failed + self.num_extra_credit_failed > 0 {
                "FAILED"
            } else if self.num_tests_passed + self.num_extra_credit_passed > 0 {
                "passed"
            } else {
                "not run"
            };
            write!(f, "{indent}{} - {status}", self.test_name)?;
        } else {
            write!(
                f,
                "{indent}{} - {}/{} passed",
                self.test_name,
                self.num_tests_passed,
                self.total_tests()
            )?;
            if self.total_extra_credit() > 0 {
                write!(
                    f,
                    " (extra credit {}/{})",
                    self.num_extra_credit_passed,
                    self.total_extra_credit()
                )?;
            }
        }
        writeln!(f)?;

        if let Some(message) = &self.error_message {
            for line in message.lines() {
                writeln!(f, "{indent}    {line}")?;
            }
        }

        for child in self.children.values() {
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for TestNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

/// Root of the result tree plus a top-level error when the report could not
/// be interpreted at all (in which case the tree is empty).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestAnalysis {
    pub root: TestNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestAnalysis {
    pub fn new(root: TestNode) -> Self {
        Self { root, error: None }
    }

    /// An empty tree carrying `error`.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            root: TestNode::default(),
            error: Some(error.into()),
        }
    }
}

/// A named group of tests worth a bonus only when every one of them passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraCreditCategory {
    pub name: String,
}

impl ExtraCreditCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// True when the category's node exists and all of its tests passed.
    pub fn is_earned(&self, root: &TestNode) -> bool {
        root.find_category(&self.name)
            .and_then(TestNode::extra_credit_rate)
            .is_some_and(|rate| rate == 1.0)
    }
}

/// Extra-credit categories for one run and the bonus fraction each is worth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtraCreditPolicy {
    pub categories: Vec<ExtraCreditCategory>,
    pub bonus: f64,
}

impl ExtraCreditPolicy {
    pub fn new<I, S>(categories: I, bonus: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories
                .into_iter()
                .map(ExtraCreditCategory::new)
                .collect(),
            bonus,
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }
}
