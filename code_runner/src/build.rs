//! Build stage: packages the staged submission into a jar.

use std::path::{Path, PathBuf};

use util::paths::module_artifact_path;

use crate::error::RunnerError;
use crate::executor::{CommandSpec, ProcessExecutor};
use crate::redact_path;
use crate::toolchain::Toolchain;

/// Marks the end of Maven's useful error output; everything after is boilerplate.
const MAVEN_HELP_MARKER: &str = "[ERROR] -> [Help 1]";
const MAVEN_ERROR_TAG: &str = "[ERROR]";

/// Runs `mvn package -DskipTests` in `stage_repo` and returns the path of the
/// module's test-dependencies jar.
///
/// # Errors
/// - [`RunnerError::BuildFailure`] on a non-zero exit, carrying the Maven
///   `[ERROR]` lines with the stage path removed.
/// - [`RunnerError::MissingArtifact`] when the build succeeded but produced no jar.
/// - [`RunnerError::ProcessTimeout`] / [`RunnerError::ToolInvocation`] from the executor.
pub async fn package_repo(
    executor: &dyn ProcessExecutor,
    toolchain: &Toolchain,
    stage_repo: &Path,
    module: &str,
) -> Result<PathBuf, RunnerError> {
    let spec = CommandSpec::new(&toolchain.maven, stage_repo)
        .args(["package", "-DskipTests"])
        .timeout(toolchain.limits.build_timeout());

    let output = executor.run(&spec).await?;
    if !output.success() {
        tracing::info!(exit_code = ?output.exit_code, module, "package step failed");
        return Err(RunnerError::BuildFailure(maven_errors(
            &output.stdout,
            stage_repo,
        )));
    }

    let artifact = module_artifact_path(stage_repo, module);
    if !artifact.is_file() {
        return Err(RunnerError::MissingArtifact(
            artifact
                .strip_prefix(stage_repo)
                .map(Path::to_path_buf)
                .unwrap_or(artifact),
        ));
    }

    Ok(artifact)
}

/// Extracts the `[ERROR]` lines from Maven's stdout, stopping at the help
/// banner, with every occurrence of `stage_repo` stripped.
pub fn maven_errors(output: &str, stage_repo: &Path) -> String {
    let mut builder = String::new();
    for line in output.lines() {
        if line.contains(MAVEN_HELP_MARKER) {
            break;
        }
        if line.contains(MAVEN_ERROR_TAG) {
            builder.push_str(&redact_path(line, stage_repo));
            builder.push('\n');
        }
    }
    builder
}
