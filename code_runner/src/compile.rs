//! Test compiler: compiles a phase's official tests against the submission jar.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::classpath;
use crate::error::RunnerError;
use crate::executor::{CommandSpec, ProcessExecutor};
use crate::redact_path;
use crate::toolchain::Toolchain;

/// Collects every `.java` file under `root`, relative to `root`, sorted.
///
/// A missing `root` yields an empty list.
pub fn collect_test_sources(root: &Path) -> Result<Vec<PathBuf>, RunnerError> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut sources = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| RunnerError::Io(e.into()))?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "java") {
            let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
            sources.push(relative);
        }
    }
    sources.sort();
    Ok(sources)
}

/// Compiles the official tests in `phase_tests` into `out_dir` with a single
/// `javac` invocation run from inside `phase_tests`.
///
/// Returns the number of compiled source files. When the phase ships no test
/// sources nothing is run and `0` is returned.
///
/// # Errors
/// [`RunnerError::TestCompileFailure`] on a non-zero exit (diagnostics have
/// `stage_root` redacted), plus executor failures.
pub async fn compile_tests(
    executor: &dyn ProcessExecutor,
    toolchain: &Toolchain,
    phase_tests: &Path,
    artifact: &Path,
    out_dir: &Path,
    stage_root: &Path,
) -> Result<usize, RunnerError> {
    let sources = collect_test_sources(phase_tests)?;
    if sources.is_empty() {
        tracing::info!(dir = %phase_tests.display(), "no official test sources; skipping compile");
        return Ok(0);
    }

    std::fs::create_dir_all(out_dir)?;

    let spec = CommandSpec::new(&toolchain.javac, phase_tests)
        .arg("-d")
        .arg(out_dir.display().to_string())
        .arg("-cp")
        .arg(classpath(&[
            artifact,
            &toolchain.junit_standalone_jar,
            &toolchain.junit_api_jar,
        ]))
        .args(sources.iter().map(|p| p.display().to_string()))
        .timeout(toolchain.limits.compile_timeout());

    let output = executor.run(&spec).await?;
    if !output.success() {
        let diagnostics = if output.stderr.trim().is_empty() {
            &output.stdout
        } else {
            &output.stderr
        };
        return Err(RunnerError::TestCompileFailure(redact_path(
            diagnostics,
            stage_root,
        )));
    }

    Ok(sources.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Scripted, ScriptedExecutor};
    use std::fs;
    use tempfile::tempdir;

    fn write(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "class X {}").unwrap();
    }

    #[test]
    fn collects_only_java_files_sorted() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("passoffTests/b/BTests.java"));
        write(&dir.path().join("passoffTests/a/ATests.java"));
        write(&dir.path().join("passoffTests/README.md"));

        let sources = collect_test_sources(dir.path()).unwrap();
        assert_eq!(
            sources,
            vec![
                PathBuf::from("passoffTests/a/ATests.java"),
                PathBuf::from("passoffTests/b/BTests.java"),
            ]
        );
    }

    #[test]
    fn missing_dir_has_no_sources() {
        let dir = tempdir().unwrap();
        assert!(collect_test_sources(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[tokio::test]
    async fn compiles_all_sources_in_one_invocation() {
        let phase = tempdir().unwrap();
        let stage = tempdir().unwrap();
        write(&phase.path().join("passoffTests/ChessBoardTests.java"));
        write(&phase.path().join("passoffTests/ChessMoveTests.java"));

        let exec = ScriptedExecutor::new();
        let out = stage.path().join("tests");
        let jar = stage.path().join("repo/shared/target/shared-test-dependencies.jar");
        let count = compile_tests(
            &exec,
            &Toolchain::default(),
            phase.path(),
            &jar,
            &out,
            stage.path(),
        )
        .await
        .unwrap();

        assert_eq!(count, 2);
        assert!(out.is_dir());
        let call = &exec.calls()[0];
        assert_eq!(call.program, "javac");
        assert_eq!(call.working_dir, phase.path());
        assert_eq!(call.args[0], "-d");
        assert_eq!(call.args[2], "-cp");
        assert!(call.args[3].contains(&jar.display().to_string()));
        assert_eq!(
            &call.args[4..],
            &["passoffTests/ChessBoardTests.java", "passoffTests/ChessMoveTests.java"]
        );
    }

    #[tokio::test]
    async fn no_sources_skips_compiler() {
        let phase = tempdir().unwrap();
        let stage = tempdir().unwrap();
        let exec = ScriptedExecutor::new();
        let count = compile_tests(
            &exec,
            &Toolchain::default(),
            phase.path(),
            &stage.path().join("a.jar"),
            &stage.path().join("tests"),
            stage.path(),
        )
        .await
        .unwrap();
        assert_eq!(count, 0);
        assert!(exec.calls().is_empty());
    }

    #[tokio::test]
    async fn compiler_error_is_fatal_and_redacted() {
        let phase = tempdir().unwrap();
        let stage = tempdir().unwrap();
        write(&phase.path().join("T.java"));
        let exec = ScriptedExecutor::new();
        exec.script(
            "javac",
            Scripted::exit(1, "").with_stderr(format!(
                "{}/repo/x.jar: error: cannot access Board",
                stage.path().display()
            )),
        );

        let err = compile_tests(
            &exec,
            &Toolchain::default(),
            phase.path(),
            &stage.path().join("repo/x.jar"),
            &stage.path().join("tests"),
            stage.path(),
        )
        .await
        .unwrap_err();
        match err {
            RunnerError::TestCompileFailure(msg) => {
                assert_eq!(msg, "/repo/x.jar: error: cannot access Board");
            }
            other => panic!("expected TestCompileFailure, got {other:?}"),
        }
    }
}
