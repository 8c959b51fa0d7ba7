//! # Code Runner
//!
//! Runs the external tools of a grading run: packaging the submission,
//! compiling the official tests against it and launching them.
//!
//! Every process is started from an argument vector, never through a shell,
//! and under an optional time budget. Stages talk to a [`ProcessExecutor`]
//! so callers can swap the real [`SystemExecutor`] for a
//! [`ScriptedExecutor`](mock::ScriptedExecutor).

pub mod build;
pub mod compile;
pub mod error;
pub mod executor;
pub mod mock;
pub mod run;
pub mod toolchain;

pub use error::RunnerError;
pub use executor::{CommandSpec, ProcessExecutor, ProcessOutput, SystemExecutor};
pub use toolchain::Toolchain;

use std::path::Path;

/// Platform class-path separator used when assembling `-cp` arguments.
const CLASSPATH_SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };

/// Joins class-path entries, starting with the working directory (`.`).
pub(crate) fn classpath(entries: &[&Path]) -> String {
    std::iter::once(".".to_string())
        .chain(entries.iter().map(|p| p.display().to_string()))
        .collect::<Vec<_>>()
        .join(CLASSPATH_SEPARATOR)
}

/// Removes every occurrence of `root` (and its canonical form) from `text`.
///
/// Diagnostics shown to students must not leak the grader's filesystem layout.
pub fn redact_path(text: &str, root: &Path) -> String {
    let mut out = text.to_string();
    if let Ok(canonical) = root.canonicalize() {
        out = out.replace(&canonical.display().to_string(), "");
    }
    out.replace(&root.display().to_string(), "")
}
