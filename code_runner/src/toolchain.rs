use std::path::{Path, PathBuf};

use util::config;
use util::execution_config::ExecutionLimits;

/// External tools used by the build/compile/run stages, plus their budgets.
///
/// Jar paths are made absolute up front because each stage runs in a
/// different working directory.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub maven: String,
    pub java: String,
    pub javac: String,
    pub junit_standalone_jar: PathBuf,
    pub junit_api_jar: PathBuf,
    pub limits: ExecutionLimits,
}

impl Toolchain {
    /// Builds the toolchain from the global [`AppConfig`](util::config::AppConfig)
    /// and environment-provided execution limits.
    pub fn from_config() -> Self {
        Self {
            maven: config::maven_bin(),
            java: config::java_bin(),
            javac: config::javac_bin(),
            junit_standalone_jar: absolute(Path::new(&config::junit_standalone_jar())),
            junit_api_jar: absolute(Path::new(&config::junit_api_jar())),
            limits: ExecutionLimits::from_env(),
        }
    }

    pub fn with_limits(mut self, limits: ExecutionLimits) -> Self {
        self.limits = limits;
        self
    }
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            maven: "mvn".into(),
            java: "java".into(),
            javac: "javac".into(),
            junit_standalone_jar: PathBuf::from("/opt/junit/junit-platform-console-standalone.jar"),
            junit_api_jar: PathBuf::from("/opt/junit/junit-jupiter-api.jar"),
            limits: ExecutionLimits::default(),
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_jars_become_absolute() {
        let p = absolute(Path::new("lib/junit.jar"));
        assert!(p.is_absolute());
        assert!(p.ends_with("lib/junit.jar"));
    }

    #[test]
    fn with_limits_replaces_budgets() {
        let limits = ExecutionLimits {
            build_timeout_secs: 1,
            compile_timeout_secs: 2,
            test_timeout_secs: 3,
        };
        let tc = Toolchain::default().with_limits(limits.clone());
        assert_eq!(tc.limits, limits);
    }
}
