//! # Grader
//!
//! Grades one student checkout for one phase: stages and verifies the repo, builds it, compiles and
//! runs the official tests, then scores the launcher's report. Progress is streamed to listeners of
//! the submitter's topic while the run proceeds.
//!
//! - [`context`]: the immutable per-run [`GradingContext`] and [`Phase`].
//! - [`orchestrator`]: the stage pipeline and its failure policy.
//! - [`progress`]: the fire-and-forget [`ProgressSink`] and its delivery task.
//! - [`limiter`]: caps how many runs execute at once.
//! - [`modifier`]: checks applied to the staged repo before building.
//! - [`rubric`]: points and extra-credit settings per phase.

pub mod context;
pub mod error;
pub mod limiter;
pub mod modifier;
pub mod orchestrator;
pub mod progress;
pub mod rubric;

pub use context::{GradingContext, Phase};
pub use error::GradingError;
pub use limiter::{GradingLimiter, QueueStats};
pub use orchestrator::Grader;
pub use progress::{ProgressMessage, ProgressSink};
pub use rubric::{RubricConfig, RubricConfigItem};
