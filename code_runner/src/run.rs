//! Test runner: launches the compiled official tests under the JUnit console
//! launcher with the `testfeed` details mode.

use std::path::Path;

use crate::classpath;
use crate::error::RunnerError;
use crate::executor::{CommandSpec, ProcessExecutor};
use crate::toolchain::Toolchain;

/// Raw result of a test launch. The exit code is informational: failing
/// tests make the launcher exit non-zero, which is a normal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRunOutput {
    pub exit_code: Option<i32>,
    pub report: String,
}

/// Runs the compiled tests in `tests_dir` against `artifact`.
///
/// # Errors
/// Only executor failures ([`RunnerError::ProcessTimeout`],
/// [`RunnerError::ToolInvocation`]); never the launcher's exit status.
pub async fn run_tests(
    executor: &dyn ProcessExecutor,
    toolchain: &Toolchain,
    tests_dir: &Path,
    artifact: &Path,
) -> Result<TestRunOutput, RunnerError> {
    let spec = CommandSpec::new(&toolchain.java, tests_dir)
        .arg("-jar")
        .arg(toolchain.junit_standalone_jar.display().to_string())
        .arg("--class-path")
        .arg(classpath(&[artifact, &toolchain.junit_api_jar]))
        .arg("--scan-class-path")
        .arg("--details=testfeed")
        .timeout(toolchain.limits.test_timeout());

    let output = executor.run(&spec).await?;
    if !output.success() {
        tracing::warn!(
            exit_code = ?output.exit_code,
            "test launcher exited non-zero; scoring its report anyway"
        );
    }

    Ok(TestRunOutput {
        exit_code: output.exit_code,
        report: output.stdout,
    })
}
