use crate::config;
use std::{fs, io, path::{Path, PathBuf}};

/// Create a directory (and all parents) if it doesn't exist, and return the path.
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<PathBuf> {
    let p = path.as_ref();
    fs::create_dir_all(p)?;
    Ok(p.to_path_buf())
}

fn absolute(root: String) -> PathBuf {
    let p = PathBuf::from(root);
    if p.is_absolute() {
        p
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(p)
    }
}

/// Global stage root (absolute), from `config::stage_root()`.
/// If relative in env, resolve against current_dir().
pub fn stage_root() -> PathBuf {
    absolute(config::stage_root())
}

/// Root of the official phase test resources (absolute).
pub fn phases_root() -> PathBuf {
    absolute(config::phases_root())
}

// ─── Per-run stage layout ───────────────────────────────────────────

/// Millisecond timestamp identifying a run, e.g. `20260301235900123`.
pub fn new_run_id() -> String {
    chrono::Utc::now().format("%Y%m%d%H%M%S%3f").to_string()
}

// {STAGE_ROOT}/{net_id}-{run_id}
pub fn run_stage_dir(net_id: &str, run_id: &str) -> PathBuf {
    stage_root().join(format!("{net_id}-{run_id}"))
}

// Copy of the submission that gets modified and built: {stage}/repo
pub fn stage_repo_dir(stage: &Path) -> PathBuf {
    stage.join("repo")
}

// Compiled official tests: {stage}/tests
pub fn stage_tests_dir(stage: &Path) -> PathBuf {
    stage.join("tests")
}

// {stage}/repo/{module}/target/{module}-test-dependencies.jar
pub fn module_artifact_path(stage_repo: &Path, module: &str) -> PathBuf {
    stage_repo
        .join(module)
        .join("target")
        .join(format!("{module}-test-dependencies.jar"))
}

// {PHASES_ROOT}/phase{n}
pub fn phase_tests_dir(phase_number: &str) -> PathBuf {
    phases_root().join(format!("phase{phase_number}"))
}
