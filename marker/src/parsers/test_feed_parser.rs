//! Test Feed Parser
//!
//! This module provides the [`TestFeedParser`] for turning a test launcher's textual report into a
//! [`TestAnalysis`] tree. Two line formats are recognised; anything else (banners, summaries, blank
//! lines, stray output from the code under test) is skipped.
//!
//! # Event lines
//!
//! ```text
//! <kind>-<status> <dotted.hierarchical.id> [message]
//! ```
//!
//! where `kind` is `test` or `container` and `status` is one of `started`, `finished`, `passed`,
//! `successful`, `failed`, `aborted`, `skipped`. Example: `test-failed chess.PawnTests.edge() bad move`.
//!
//! # JUnit `testfeed` lines
//!
//! ```text
//! JUnit Jupiter > ChessBoardTests > addPiece() :: SUCCESSFUL
//! JUnit Jupiter > ChessMoveTests > pawnMoves() :: FAILED
//!     => org.opentest4j.AssertionFailedError: expected: <4> but was: <3>
//! ```
//!
//! Indented lines directly after a failure are collected into that node's failure message.
//!
//! # Extra credit
//!
//! The first path segment equal to a configured category name tags its node with that category.
//! Every outcome below it is counted in the extra-credit counters instead of the standard ones.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::MarkerError;
use crate::traits::parser::Parser;
use crate::types::{TestAnalysis, TestNode};

/// Failure messages keep at most this many lines; the rest is stack trace.
const MAX_MESSAGE_LINES: usize = 5;

static EVENT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<kind>test|container)-(?P<status>started|finished|passed|successful|failed|aborted|skipped)\s+(?P<id>\S+)(?:\s+(?P<message>.*\S))?\s*$",
    )
    .expect("event line pattern is valid")
});

static TESTFEED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<path>\S.*?) :: (?P<status>STARTED|SUCCESSFUL|FAILED|ABORTED|SKIPPED)\b")
        .expect("testfeed line pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Started,
    Finished,
    Passed,
    Failed,
    Skipped,
}

impl Status {
    fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "started" => Some(Status::Started),
            "finished" => Some(Status::Finished),
            "passed" | "successful" => Some(Status::Passed),
            "failed" | "aborted" => Some(Status::Failed),
            "skipped" => Some(Status::Skipped),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FeedEvent {
    path: Vec<String>,
    container: bool,
    status: Status,
    message: Option<String>,
}

fn segments<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits a dotted id into segments. Dots inside a method's parameter list
/// stay in the last segment, so `a.B.m(x.Y)` is `a`, `B`, `m(x.Y)`.
fn dotted_segments(id: &str) -> Vec<String> {
    let Some(open) = id.find('(') else {
        return segments(id.split('.'));
    };
    let (qualifier, params) = id.split_at(open);
    let (parents, method) = qualifier.rsplit_once('.').unwrap_or(("", qualifier));
    let mut path = segments(parents.split('.'));
    let last = format!("{}{params}", method.trim());
    if !last.trim().is_empty() {
        path.push(last);
    }
    path
}

/// Recognises a single report line, or `None` for noise.
fn recognize(line: &str) -> Option<FeedEvent> {
    if let Some(caps) = EVENT_LINE.captures(line) {
        let path = dotted_segments(&caps["id"]);
        if path.is_empty() {
            return None;
        }
        return Some(FeedEvent {
            path,
            container: &caps["kind"] == "container",
            status: Status::from_word(&caps["status"])?,
            message: caps.name("message").map(|m| m.as_str().to_string()),
        });
    }

    let caps = TESTFEED_LINE.captures(line)?;
    let path = segments(caps["path"].split(" > "));
    if path.is_empty() {
        return None;
    }
    // A lone segment is the engine itself.
    Some(FeedEvent {
        container: path.len() == 1,
        path,
        status: Status::from_word(&caps["status"])?,
        message: None,
    })
}

fn node_at_mut<'a>(root: &'a mut TestNode, path: &[String]) -> Option<&'a mut TestNode> {
    let mut node = root;
    for segment in path {
        node = node.children.get_mut(segment)?;
    }
    Some(node)
}

fn append_message(node: &mut TestNode, line: &str) {
    let line = line.trim();
    let line = line.strip_prefix("=>").map(str::trim_start).unwrap_or(line);
    match &mut node.error_message {
        Some(existing) => {
            existing.push('\n');
            existing.push_str(line);
        }
        None => node.error_message = Some(line.to_string()),
    }
}

/// Parser for test launcher reports. Holds the run's extra-credit category names.
#[derive(Debug, Clone, Default)]
pub struct TestFeedParser {
    categories: Vec<String>,
}

impl TestFeedParser {
    pub fn new(categories: Vec<String>) -> Self {
        Self { categories }
    }

    /// Applies one event, creating nodes along its path. Returns the path
    /// when the event is a failure whose message may continue on later lines.
    fn apply(&self, root: &mut TestNode, event: FeedEvent) -> Option<Vec<String>> {
        let mut node = root;
        let mut in_category = false;
        for segment in &event.path {
            node = node.child_or_insert(segment);
            if !in_category && self.categories.iter().any(|c| c == segment) {
                node.ec_category = Some(segment.clone());
                in_category = true;
            }
        }

        match event.status {
            Status::Passed if event.container => None,
            // Only a childless container's failure counts as a test failure.
            Status::Failed if event.container && !node.is_leaf() => {
                if let Some(message) = &event.message {
                    append_message(node, message);
                }
                Some(event.path)
            }
            Status::Passed => {
                if in_category {
                    node.num_extra_credit_passed += 1;
                } else {
                    node.num_tests_passed += 1;
                }
                None
            }
            Status::Failed => {
                if in_category {
                    node.num_extra_credit_failed += 1;
                } else {
                    node.num_tests_failed += 1;
                }
                if let Some(message) = &event.message {
                    append_message(node, message);
                }
                Some(event.path)
            }
            Status::Started | Status::Finished | Status::Skipped => None,
        }
    }
}

impl<'a> Parser<&'a str, TestAnalysis> for TestFeedParser {
    /// Builds the result tree from `report`.
    ///
    /// # Errors
    ///
    /// Returns [`MarkerError::TestParseFailure`] when the report has content
    /// but not a single recognisable event. A blank report is an empty tree.
    fn parse(&self, report: &'a str) -> Result<TestAnalysis, MarkerError> {
        let mut root = TestNode::default();
        let mut recognized = 0usize;
        // (failed node path, message lines collected so far)
        let mut pending: Option<(Vec<String>, usize)> = None;

        for line in report.lines() {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(event) = recognize(line) {
                recognized += 1;
                let carried = usize::from(event.message.is_some());
                pending = self.apply(&mut root, event).map(|path| (path, carried));
                continue;
            }

            if line.starts_with(char::is_whitespace) {
                if let Some((path, taken)) = pending.as_mut() {
                    if *taken < MAX_MESSAGE_LINES {
                        if let Some(node) = node_at_mut(&mut root, path) {
                            append_message(node, line);
                        }
                        *taken += 1;
                    }
                    continue;
                }
            }

            pending = None;
        }

        if recognized == 0 && !report.trim().is_empty() {
            return Err(MarkerError::TestParseFailure(
                "no test events found in launcher output".to_string(),
            ));
        }

        root.count_tests();
        Ok(TestAnalysis::new(root))
    }
}

/// Parses `report`, folding a parse failure into an empty tree with an error.
pub fn analyze(report: &str, categories: Vec<String>) -> TestAnalysis {
    match TestFeedParser::new(categories).parse(report) {
        Ok(analysis) => analysis,
        Err(e) => {
            tracing::error!(error = %e, "test report could not be parsed");
            TestAnalysis::failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(report: &str, categories: &[&str]) -> TestAnalysis {
        TestFeedParser::new(categories.iter().map(|s| s.to_string()).collect())
            .parse(report)
            .unwrap()
    }

    fn sum_leaves(node: &TestNode) -> (u32, u32) {
        if node.is_leaf() {
            return (node.num_tests_passed, node.num_tests_failed);
        }
        node.children.values().map(sum_leaves).fold((0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
    }

    #[test]
    fn event_lines_build_hierarchy_from_dotted_ids() {
        let report = "\
container-started chess
test-started chess.BoardTests.addPiece()
test-passed chess.BoardTests.addPiece()
test-failed chess.BoardTests.removePiece() expected empty square
container-finished chess
";
        let analysis = parse(report, &[]);
        assert!(analysis.error.is_none());
        let board = &analysis.root.children["chess"].children["BoardTests"];
        assert_eq!(board.num_tests_passed, 1);
        assert_eq!(board.num_tests_failed, 1);
        assert_eq!(
            board.children["removePiece()"].error_message.as_deref(),
            Some("expected empty square")
        );
        assert_eq!(analysis.root.total_tests(), 2);
    }

    #[test]
    fn qualified_parameter_types_stay_in_the_method_segment() {
        let report = "\
test-passed chess.BoardTests.move(chess.ChessPosition)
test-failed chess.BoardTests.swap(chess.ChessPosition, chess.ChessPiece) wrong piece
";
        let analysis = parse(report, &["ChessPosition"]);
        let board = &analysis.root.children["chess"].children["BoardTests"];
        let names: Vec<_> = board.children.keys().cloned().collect();
        assert_eq!(
            names,
            vec![
                "move(chess.ChessPosition)".to_string(),
                "swap(chess.ChessPosition, chess.ChessPiece)".to_string(),
            ]
        );
        assert!(board.children.values().all(TestNode::is_leaf));
        assert_eq!(analysis.root.num_tests_passed, 1);
        assert_eq!(analysis.root.num_tests_failed, 1);
        assert_eq!(analysis.root.total_extra_credit(), 0);
        assert!(analysis.root.find_category("ChessPosition").is_none());
    }

    #[test]
    fn junit_testfeed_lines_and_failure_messages() {
        let report = "\
Thanks for using JUnit! Support its development at https://junit.org/sponsoring

JUnit Jupiter > ChessMoveTests > kingMoves() :: STARTED
JUnit Jupiter > ChessMoveTests > kingMoves() :: SUCCESSFUL
JUnit Jupiter > ChessMoveTests > pawnMoves() :: STARTED
JUnit Jupiter > ChessMoveTests > pawnMoves() :: FAILED
\t=> org.opentest4j.AssertionFailedError: expected: <4> but was: <3>
\t   org.junit.jupiter.api.AssertionUtils.fail(AssertionUtils.java:55)
JUnit Jupiter > ChessMoveTests :: SUCCESSFUL
[         2 tests successful      ]
";
        let analysis = parse(report, &[]);
        let moves = &analysis.root.children["JUnit Jupiter"].children["ChessMoveTests"];
        assert_eq!(moves.num_tests_passed, 1);
        assert_eq!(moves.num_tests_failed, 1);
        assert_eq!(
            moves.children["pawnMoves()"].error_message.as_deref(),
            Some(
                "org.opentest4j.AssertionFailedError: expected: <4> but was: <3>\n\
                 org.junit.jupiter.api.AssertionUtils.fail(AssertionUtils.java:55)"
            )
        );
    }

    #[test]
    fn failure_message_is_capped() {
        let mut report = String::from("test-failed T.m()\n");
        for i in 0..20 {
            report.push_str(&format!("    at frame{i}\n"));
        }
        let analysis = parse(&report, &[]);
        let message = analysis.root.children["T"].children["m()"]
            .error_message
            .clone()
            .unwrap();
        assert_eq!(message.lines().count(), MAX_MESSAGE_LINES);
    }

    #[test]
    fn noise_and_blank_lines_are_skipped() {
        let report = "\
Picked up JAVA_TOOL_OPTIONS: -Xmx512m

some println from student code
test-passed A.b()
   indented noise with no failure pending
test-unknown A.c()
";
        let analysis = parse(report, &[]);
        assert!(analysis.error.is_none());
        assert_eq!(analysis.root.total_tests(), 1);
        assert!(analysis.root.children["A"].children.get("c()").is_none());
    }

    #[test]
    fn category_subtree_counts_as_extra_credit() {
        let report = "\
test-passed Passoff.Standard.one()
test-passed Passoff.Castling.kingSide()
test-failed Passoff.Castling.queenSide()
";
        let analysis = parse(report, &["Castling"]);
        let root = &analysis.root;
        assert_eq!(root.num_tests_passed, 1);
        assert_eq!(root.num_tests_failed, 0);
        assert_eq!(root.num_extra_credit_passed, 1);
        assert_eq!(root.num_extra_credit_failed, 1);

        let castling = root.find_category("Castling").unwrap();
        assert_eq!(castling.test_name, "Castling");
        assert_eq!(castling.total_tests(), 0);
        assert_eq!(castling.total_extra_credit(), 2);
    }

    #[test]
    fn only_first_matching_segment_is_tagged() {
        let analysis = parse("test-passed EnPassant.EnPassant.x()\n", &["EnPassant"]);
        let outer = &analysis.root.children["EnPassant"];
        assert_eq!(outer.ec_category.as_deref(), Some("EnPassant"));
        assert!(outer.children["EnPassant"].ec_category.is_none());
        assert_eq!(outer.num_extra_credit_passed, 1);
    }

    #[test]
    fn root_counts_equal_sum_of_leaf_outcomes() {
        let report = "\
test-passed a.B.c1()
test-passed a.B.c2()
test-failed a.D.e()
test-passed f.G.h()
test-failed f.G.i()
test-skipped f.G.j()
";
        let analysis = parse(report, &[]);
        let (p, f) = sum_leaves(&analysis.root);
        assert_eq!((analysis.root.num_tests_passed, analysis.root.num_tests_failed), (p, f));
        assert_eq!((p, f), (3, 2));
    }

    #[test]
    fn container_outcomes_do_not_count_as_tests() {
        let report = "\
JUnit Jupiter :: STARTED
JUnit Jupiter :: SUCCESSFUL
container-passed suite.Empty
container-failed suite.Broken class initialisation failed
";
        let analysis = parse(report, &[]);
        assert_eq!(analysis.root.num_tests_passed, 0);
        assert_eq!(analysis.root.num_tests_failed, 1);
        assert_eq!(
            analysis.root.children["suite"].children["Broken"].error_message.as_deref(),
            Some("class initialisation failed")
        );
    }

    #[test]
    fn started_only_report_holds_no_tests() {
        let analysis = parse("JUnit Jupiter > ChessMoveTests > kingMoves() :: STARTED\n", &[]);
        assert!(analysis.error.is_none());
        assert!(!analysis.root.children.is_empty());
        assert!(analysis.root.is_empty());
    }

    #[test]
    fn blank_report_is_empty_tree_without_error() {
        let analysis = parse("  \n\n", &[]);
        assert!(analysis.error.is_none());
        assert!(analysis.root.is_empty());
    }

    #[test]
    fn unrecognisable_report_is_parse_failure() {
        let err = TestFeedParser::default()
            .parse("Error: Could not find or load main class\n")
            .unwrap_err();
        assert!(matches!(err, MarkerError::TestParseFailure(_)));
    }

    #[test]
    fn analyze_folds_parse_failure_into_analysis() {
        let analysis = analyze("garbage only\n", vec![]);
        assert!(analysis.error.is_some());
        assert!(analysis.root.is_empty());
    }
}
