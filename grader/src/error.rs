//! Grading Error Types
//!
//! [`GradingError`] is everything that stops a grading run early. The orchestrator turns any of
//! these into a score-0 [`RubricResult`](marker::report::RubricResult) whose notes carry the
//! error's message, so the `Display` text is what students see.

use code_runner::RunnerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GradingError {
    /// Build, test compilation or test launch failed.
    #[error(transparent)]
    Runner(#[from] RunnerError),

    /// A code modifier rejected or could not adjust the staged repo.
    #[error("{0}")]
    Modifier(String),

    /// The checkout could not be copied into the stage directory.
    #[error("Failed to stage repo: {0}")]
    StageRepo(String),

    /// The rubric has no usable entry for the phase.
    #[error("Rubric configuration error: {0}")]
    RubricConfig(String),

    /// The concurrency limiter was shut down while the run was queued.
    #[error("Grading service is shutting down")]
    Shutdown,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GradingError {
    /// Short label used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GradingError::Runner(RunnerError::ToolInvocation { .. }) => "tool_invocation",
            GradingError::Runner(RunnerError::ProcessTimeout { .. }) => "process_timeout",
            GradingError::Runner(RunnerError::BuildFailure(_)) => "build_failure",
            GradingError::Runner(RunnerError::MissingArtifact(_)) => "missing_artifact",
            GradingError::Runner(RunnerError::TestCompileFailure(_)) => "test_compile_failure",
            GradingError::Runner(RunnerError::Io(_)) | GradingError::Io(_) => "io",
            GradingError::Modifier(_) => "modifier",
            GradingError::StageRepo(_) => "stage_repo",
            GradingError::RubricConfig(_) => "rubric_config",
            GradingError::Shutdown => "shutdown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn runner_errors_keep_their_message() {
        let err: GradingError = RunnerError::MissingArtifact(PathBuf::from("shared/target/x.jar")).into();
        assert_eq!(err.kind(), "missing_artifact");
        assert_eq!(
            err.to_string(),
            "Expected build artifact is missing: shared/target/x.jar"
        );
    }

    #[test]
    fn timeouts_are_labelled() {
        let err: GradingError = RunnerError::ProcessTimeout {
            program: "java".into(),
            timeout: Duration::from_secs(120),
        }
        .into();
        assert_eq!(err.kind(), "process_timeout");
        assert!(err.to_string().contains("120 seconds"));
    }

    #[test]
    fn modifier_message_is_shown_verbatim() {
        let err = GradingError::Modifier("Missing pom.xml".into());
        assert_eq!(err.to_string(), "Missing pom.xml");
    }
}
