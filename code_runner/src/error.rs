//! Runner Error Types
//!
//! [`RunnerError`] covers everything that can go wrong while running the
//! external tools of a grading run. All variants are fatal to the run that
//! produced them; a failing test run is not an error and never shows up here.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    /// The process could not be started or its output could not be collected.
    #[error("Failed to invoke `{program}`: {source}")]
    ToolInvocation {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process exceeded its time budget and was killed.
    #[error("`{program}` did not finish within {} seconds", .timeout.as_secs())]
    ProcessTimeout { program: String, timeout: Duration },

    /// Packaging exited non-zero. Carries the redacted build diagnostics.
    #[error("Failed to package repo:\n{0}")]
    BuildFailure(String),

    /// The build reported success but the expected artifact is absent.
    #[error("Expected build artifact is missing: {}", .0.display())]
    MissingArtifact(PathBuf),

    /// The official tests did not compile against the submission.
    #[error("Failed to compile tests:\n{0}")]
    TestCompileFailure(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunnerError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RunnerError::ProcessTimeout { .. })
    }
}
