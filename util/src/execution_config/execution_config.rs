use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, time::Duration};

/// Time budgets for the external processes of one grading run.
///
/// Every field has a default so a partial JSON document (or none at all)
/// still yields a usable set of limits.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ExecutionLimits {
    #[serde(default = "default_build_timeout_secs")]
    pub build_timeout_secs: u64,

    #[serde(default = "default_compile_timeout_secs")]
    pub compile_timeout_secs: u64,

    #[serde(default = "default_test_timeout_secs")]
    pub test_timeout_secs: u64,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            build_timeout_secs: default_build_timeout_secs(),
            compile_timeout_secs: default_compile_timeout_secs(),
            test_timeout_secs: default_test_timeout_secs(),
        }
    }
}

impl ExecutionLimits {
    /// Defaults, overridden by `BUILD_TIMEOUT_SECS`, `COMPILE_TIMEOUT_SECS`
    /// and `TEST_TIMEOUT_SECS` when those parse as integers.
    pub fn from_env() -> Self {
        let read = |key: &str, fallback: u64| {
            env::var(key)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(fallback)
        };

        Self {
            build_timeout_secs: read("BUILD_TIMEOUT_SECS", default_build_timeout_secs()),
            compile_timeout_secs: read("COMPILE_TIMEOUT_SECS", default_compile_timeout_secs()),
            test_timeout_secs: read("TEST_TIMEOUT_SECS", default_test_timeout_secs()),
        }
    }

    /// Loads limits from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|_| format!("Failed to read limits file at {:?}", path))?;
        serde_json::from_str(&contents).map_err(|_| "Invalid limits JSON format".to_string())
    }

    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs)
    }

    pub fn compile_timeout(&self) -> Duration {
        Duration::from_secs(self.compile_timeout_secs)
    }

    pub fn test_timeout(&self) -> Duration {
        Duration::from_secs(self.test_timeout_secs)
    }
}

//Default Functions

fn default_build_timeout_secs() -> u64 {
    90
}

fn default_compile_timeout_secs() -> u64 {
    60
}

fn default_test_timeout_secs() -> u64 {
    120
}
