//! Per-run grading context.
//!
//! A [`GradingContext`] is assembled once through [`GradingContextBuilder`] and then only read.
//! Everything a run needs that varies between runs (who, which phase, where the code is, the
//! extra-credit rules, lateness and where progress goes) lives here rather than in globals.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use marker::types::ExtraCreditPolicy;
use serde::{Deserialize, Serialize};

use crate::error::GradingError;
use crate::progress::ProgressSink;

/// Assignment milestones that have official pass-off tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    Phase0,
    Phase1,
    Phase3,
    Phase4,
    Phase5,
    Phase6,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Phase0,
        Phase::Phase1,
        Phase::Phase3,
        Phase::Phase4,
        Phase::Phase5,
        Phase::Phase6,
    ];

    pub fn number(self) -> u8 {
        match self {
            Phase::Phase0 => 0,
            Phase::Phase1 => 1,
            Phase::Phase3 => 3,
            Phase::Phase4 => 4,
            Phase::Phase5 => 5,
            Phase::Phase6 => 6,
        }
    }

    /// Maven module the phase's tests exercise.
    pub fn module(self) -> &'static str {
        match self {
            Phase::Phase0 | Phase::Phase1 => "shared",
            Phase::Phase3 | Phase::Phase4 => "server",
            Phase::Phase5 | Phase::Phase6 => "client",
        }
    }

    /// Directory holding the phase's official test sources.
    pub fn tests_dir(self) -> PathBuf {
        util::paths::phase_tests_dir(&self.number().to_string())
    }

    /// Name of the root of the result tree.
    pub fn suite_name(self) -> &'static str {
        "Passoff Tests"
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Phase {}", self.number())
    }
}

impl FromStr for Phase {
    type Err = GradingError;

    /// Accepts `"3"`, `"phase3"`, `"Phase3"` or `"PHASE 3"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let digits = lowered.trim_start_matches("phase").trim();
        Phase::ALL
            .into_iter()
            .find(|p| digits == p.number().to_string())
            .ok_or_else(|| GradingError::RubricConfig(format!("Unknown phase: {s}")))
    }
}

/// Immutable configuration for a single grading run.
#[derive(Debug, Clone)]
pub struct GradingContext {
    net_id: String,
    phase: Phase,
    module: String,
    repo_path: PathBuf,
    stage_path: PathBuf,
    phase_tests_dir: PathBuf,
    extra_credit: ExtraCreditPolicy,
    days_late: u32,
    progress: ProgressSink,
}

impl GradingContext {
    pub fn builder(net_id: impl Into<String>, phase: Phase) -> GradingContextBuilder {
        GradingContextBuilder::new(net_id, phase)
    }

    pub fn net_id(&self) -> &str {
        &self.net_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    /// The pristine checkout. Never written to.
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn stage_path(&self) -> &Path {
        &self.stage_path
    }

    pub fn stage_repo(&self) -> PathBuf {
        util::paths::stage_repo_dir(&self.stage_path)
    }

    pub fn stage_tests(&self) -> PathBuf {
        util::paths::stage_tests_dir(&self.stage_path)
    }

    pub fn phase_tests_dir(&self) -> &Path {
        &self.phase_tests_dir
    }

    pub fn extra_credit(&self) -> &ExtraCreditPolicy {
        &self.extra_credit
    }

    pub fn days_late(&self) -> u32 {
        self.days_late
    }

    pub fn progress(&self) -> &ProgressSink {
        &self.progress
    }
}

/// Builder for [`GradingContext`]. Unset paths default to the configured
/// stage and phase roots.
#[derive(Debug)]
pub struct GradingContextBuilder {
    net_id: String,
    phase: Phase,
    module: Option<String>,
    repo_path: Option<PathBuf>,
    stage_path: Option<PathBuf>,
    phase_tests_dir: Option<PathBuf>,
    extra_credit: ExtraCreditPolicy,
    days_late: u32,
    progress: Option<ProgressSink>,
}

impl GradingContextBuilder {
    fn new(net_id: impl Into<String>, phase: Phase) -> Self {
        Self {
            net_id: net_id.into(),
            phase,
            module: None,
            repo_path: None,
            stage_path: None,
            phase_tests_dir: None,
            extra_credit: ExtraCreditPolicy::default(),
            days_late: 0,
            progress: None,
        }
    }

    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn repo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.repo_path = Some(path.into());
        self
    }

    pub fn stage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.stage_path = Some(path.into());
        self
    }

    pub fn phase_tests_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.phase_tests_dir = Some(path.into());
        self
    }

    pub fn extra_credit(mut self, policy: ExtraCreditPolicy) -> Self {
        self.extra_credit = policy;
        self
    }

    pub fn days_late(mut self, days: u32) -> Self {
        self.days_late = days;
        self
    }

    pub fn progress(mut self, sink: ProgressSink) -> Self {
        self.progress = Some(sink);
        self
    }

    /// # Errors
    /// [`GradingError::StageRepo`] when no checkout path was given, or the net
    /// id is blank or holds anything besides ASCII letters, digits, `.`, `_`
    /// and `-`. The net id names the stage directory, so separators are refused.
    pub fn build(self) -> Result<GradingContext, GradingError> {
        if self.net_id.trim().is_empty() {
            return Err(GradingError::StageRepo("A net id is required".into()));
        }
        if !is_valid_net_id(&self.net_id) {
            return Err(GradingError::StageRepo(format!(
                "Invalid net id {:?}",
                self.net_id
            )));
        }
        let repo_path = self
            .repo_path
            .ok_or_else(|| GradingError::StageRepo("No repository checkout given".into()))?;

        let stage_path = self
            .stage_path
            .unwrap_or_else(|| util::paths::run_stage_dir(&self.net_id, &util::paths::new_run_id()));

        Ok(GradingContext {
            module: self
                .module
                .unwrap_or_else(|| self.phase.module().to_string()),
            phase_tests_dir: self
                .phase_tests_dir
                .unwrap_or_else(|| self.phase.tests_dir()),
            net_id: self.net_id,
            phase: self.phase,
            repo_path,
            stage_path,
            extra_credit: self.extra_credit,
            days_late: self.days_late,
            progress: self.progress.unwrap_or_else(ProgressSink::detached),
        })
    }
}

fn is_valid_net_id(net_id: &str) -> bool {
    net_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use util::config::AppConfig;

    #[test]
    fn phases_parse_from_common_spellings() {
        assert_eq!("3".parse::<Phase>().unwrap(), Phase::Phase3);
        assert_eq!("phase0".parse::<Phase>().unwrap(), Phase::Phase0);
        assert_eq!("Phase 6".parse::<Phase>().unwrap(), Phase::Phase6);
        assert!("2".parse::<Phase>().is_err());
        assert!("phase".parse::<Phase>().is_err());
    }

    #[test]
    fn phases_map_to_modules() {
        assert_eq!(Phase::Phase1.module(), "shared");
        assert_eq!(Phase::Phase4.module(), "server");
        assert_eq!(Phase::Phase5.module(), "client");
        assert_eq!(Phase::Phase3.to_string(), "Phase 3");
    }

    #[test]
    fn builder_uses_explicit_values() {
        let ctx = GradingContext::builder("cosmo", Phase::Phase3)
            .repo_path("/checkouts/cosmo")
            .stage_path("/stage/cosmo-1")
            .phase_tests_dir("/phases/phase3")
            .extra_credit(ExtraCreditPolicy::new(["Castling"], 0.05))
            .days_late(2)
            .build()
            .unwrap();

        assert_eq!(ctx.net_id(), "cosmo");
        assert_eq!(ctx.module(), "server");
        assert_eq!(ctx.stage_repo(), PathBuf::from("/stage/cosmo-1/repo"));
        assert_eq!(ctx.stage_tests(), PathBuf::from("/stage/cosmo-1/tests"));
        assert_eq!(ctx.phase_tests_dir(), Path::new("/phases/phase3"));
        assert_eq!(ctx.extra_credit().names(), vec!["Castling".to_string()]);
        assert_eq!(ctx.days_late(), 2);
    }

    #[test]
    #[serial]
    fn builder_defaults_come_from_config() {
        AppConfig::reset();
        let stage_root = util::test_helpers::setup_test_stage_root();
        AppConfig::set_phases_root("/srv/phases");

        let ctx = GradingContext::builder("cosmo", Phase::Phase1)
            .repo_path("/checkouts/cosmo")
            .build()
            .unwrap();

        assert!(ctx.stage_path().starts_with(stage_root.path().canonicalize().unwrap()));
        assert!(
            ctx.stage_path()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("cosmo-")
        );
        assert_eq!(ctx.phase_tests_dir(), Path::new("/srv/phases/phase1"));

        AppConfig::reset();
    }

    #[test]
    fn builder_requires_checkout_and_net_id() {
        assert!(GradingContext::builder("cosmo", Phase::Phase0).build().is_err());
        assert!(
            GradingContext::builder(" ", Phase::Phase0)
                .repo_path("/x")
                .build()
                .is_err()
        );
    }

    #[test]
    fn builder_rejects_net_ids_that_leave_the_stage_root() {
        for net_id in ["../../etc", "cosmo/../x", "/abs", "a\\b", "co smo"] {
            let err = GradingContext::builder(net_id, Phase::Phase0)
                .repo_path("/x")
                .build()
                .unwrap_err();
            assert!(matches!(err, GradingError::StageRepo(_)), "{net_id}");
        }
        assert!(
            GradingContext::builder("j.doe-2_b", Phase::Phase0)
                .repo_path("/x")
                .stage_path("/stage/j")
                .build()
                .is_ok()
        );
    }
}
