//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::sync::{OnceLock, RwLock};

/// Represents the complete grader configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    /// Root under which every run gets its own scratch (stage) directory.
    pub stage_root: String,
    /// Root holding `phase<N>/` official test directories.
    pub phases_root: String,
    pub rubric_config_path: String,
    pub max_concurrent_gradings: usize,
    pub maven_bin: String,
    pub java_bin: String,
    pub javac_bin: String,
    pub junit_standalone_jar: String,
    pub junit_api_jar: String,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Unset or unparsable values fall back to their defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "autograder".into()),
            log_level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "grader=info,code_runner=info,marker=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "grader.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            stage_root: env::var("STAGE_ROOT").unwrap_or_else(|_| "tmp/stage".into()),
            phases_root: env::var("PHASES_ROOT").unwrap_or_else(|_| "phases".into()),
            rubric_config_path: env::var("RUBRIC_CONFIG_PATH")
                .unwrap_or_else(|_| "rubric.json".into()),
            max_concurrent_gradings: env::var("MAX_CONCURRENT_GRADINGS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(4),
            maven_bin: env::var("MAVEN_BIN").unwrap_or_else(|_| "mvn".into()),
            java_bin: env::var("JAVA_BIN").unwrap_or_else(|_| "java".into()),
            javac_bin: env::var("JAVAC_BIN").unwrap_or_else(|_| "javac".into()),
            junit_standalone_jar: env::var("JUNIT_STANDALONE_JAR")
                .unwrap_or_else(|_| "lib/junit-platform-console-standalone.jar".into()),
            junit_api_jar: env::var("JUNIT_API_JAR")
                .unwrap_or_else(|_| "lib/junit-jupiter-api.jar".into()),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock.write().expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_stage_root(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.stage_root = value.into());
    }

    pub fn set_phases_root(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.phases_root = value.into());
    }

    pub fn set_rubric_config_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.rubric_config_path = value.into());
    }

    pub fn set_max_concurrent_gradings(value: usize) {
        AppConfig::set_field(|cfg| cfg.max_concurrent_gradings = value.max(1));
    }
}

// --- Free accessors, mirroring the fields ---

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn stage_root() -> String {
    AppConfig::global().stage_root.clone()
}

pub fn phases_root() -> String {
    AppConfig::global().phases_root.clone()
}

pub fn rubric_config_path() -> String {
    AppConfig::global().rubric_config_path.clone()
}

pub fn max_concurrent_gradings() -> usize {
    AppConfig::global().max_concurrent_gradings
}

pub fn maven_bin() -> String {
    AppConfig::global().maven_bin.clone()
}

pub fn java_bin() -> String {
    AppConfig::global().java_bin.clone()
}

pub fn javac_bin() -> String {
    AppConfig::global().javac_bin.clone()
}

pub fn junit_standalone_jar() -> String {
    AppConfig::global().junit_standalone_jar.clone()
}

pub fn junit_api_jar() -> String {
    AppConfig::global().junit_api_jar.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn setters_override_and_reset_restores() {
        unsafe {
            env::set_var("MAX_CONCURRENT_GRADINGS", "7");
        }
        AppConfig::reset();
        assert_eq!(max_concurrent_gradings(), 7);

        AppConfig::set_max_concurrent_gradings(2);
        assert_eq!(max_concurrent_gradings(), 2);

        AppConfig::reset();
        assert_eq!(max_concurrent_gradings(), 7);

        unsafe {
            env::remove_var("MAX_CONCURRENT_GRADINGS");
        }
        AppConfig::reset();
    }

    #[test]
    #[serial]
    fn zero_concurrency_falls_back_to_default() {
        unsafe {
            env::set_var("MAX_CONCURRENT_GRADINGS", "0");
        }
        assert_eq!(AppConfig::from_env().max_concurrent_gradings, 4);
        unsafe {
            env::remove_var("MAX_CONCURRENT_GRADINGS");
        }
    }

    #[test]
    #[serial]
    fn path_setters_are_visible_through_accessors() {
        AppConfig::set_stage_root("/srv/stage");
        AppConfig::set_rubric_config_path("/etc/grader/rubric.json");
        assert_eq!(stage_root(), "/srv/stage");
        assert_eq!(rubric_config_path(), "/etc/grader/rubric.json");
        AppConfig::reset();
    }
}
