//! Grading orchestrator.
//!
//! [`Grader::grade`] runs one submission through the fixed stage sequence
//!
//! ```text
//! STAGE_REPO → APPLY_MODIFIERS → BUILD → COMPILE_TESTS → RUN_TESTS → ANALYZE → SCORE → PUBLISH
//! ```
//!
//! Each stage starts only once the previous one has finished. The first fatal error stops the run: the
//! error is pushed to the progress sink and returned as a score-0 result. A test launcher that exits
//! non-zero is not an error; its report is analyzed and scored like any other.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use code_runner::build::package_repo;
use code_runner::compile::compile_tests;
use code_runner::run::run_tests;
use code_runner::{ProcessExecutor, Toolchain};
use marker::MarkingJob;
use marker::report::RubricResult;
use tracing::Instrument;
use walkdir::WalkDir;

use crate::context::GradingContext;
use crate::error::GradingError;
use crate::limiter::GradingLimiter;
use crate::modifier::{CodeModifier, ProjectStructureVerifier};
use crate::rubric::RubricConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingStage {
    StageRepo,
    ApplyModifiers,
    Build,
    CompileTests,
    RunTests,
    Analyze,
    Score,
    Publish,
}

impl fmt::Display for GradingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GradingStage::StageRepo => "STAGE_REPO",
            GradingStage::ApplyModifiers => "APPLY_MODIFIERS",
            GradingStage::Build => "BUILD",
            GradingStage::CompileTests => "COMPILE_TESTS",
            GradingStage::RunTests => "RUN_TESTS",
            GradingStage::Analyze => "ANALYZE",
            GradingStage::Score => "SCORE",
            GradingStage::Publish => "PUBLISH",
        };
        f.write_str(name)
    }
}

/// Runs grading pipelines. Cheap to share; one instance serves many runs.
pub struct Grader {
    executor: Arc<dyn ProcessExecutor>,
    toolchain: Toolchain,
    rubric: RubricConfig,
    limiter: GradingLimiter,
    modifiers: Vec<Box<dyn CodeModifier>>,
    keep_stage: bool,
}

impl Grader {
    /// A grader whose modifier chain starts with [`ProjectStructureVerifier`].
    pub fn new(
        executor: Arc<dyn ProcessExecutor>,
        toolchain: Toolchain,
        rubric: RubricConfig,
        limiter: GradingLimiter,
    ) -> Self {
        Self {
            executor,
            toolchain,
            rubric,
            limiter,
            modifiers: vec![Box::new(ProjectStructureVerifier)],
            keep_stage: false,
        }
    }

    /// Appends a modifier to the chain.
    pub fn with_modifier<M: CodeModifier + 'static>(mut self, modifier: M) -> Self {
        self.modifiers.push(Box::new(modifier));
        self
    }

    /// Leaves the stage directory in place after the run.
    pub fn keep_stage(mut self, keep: bool) -> Self {
        self.keep_stage = keep;
        self
    }

    pub fn limiter(&self) -> &GradingLimiter {
        &self.limiter
    }

    /// Grades one submission. Never fails: fatal errors come back as a
    /// score-0 result with the error in the notes.
    pub async fn grade(&self, ctx: &GradingContext) -> RubricResult {
        let span = tracing::info_span!("grade", net_id = %ctx.net_id(), phase = %ctx.phase());
        self.grade_inner(ctx).instrument(span).await
    }

    async fn grade_inner(&self, ctx: &GradingContext) -> RubricResult {
        let max_points = self
            .rubric
            .item(ctx.phase())
            .map(|item| item.points)
            .unwrap_or(0.0);

        let _permit = match self.limiter.acquire().await {
            Ok(permit) => permit,
            Err(e) => return self.fail(ctx, None, e, max_points),
        };

        let outcome = self.run_stages(ctx).await;

        if !self.keep_stage {
            if let Err(e) = tokio::fs::remove_dir_all(ctx.stage_path()).await {
                tracing::debug!(error = %e, "stage directory not removed");
            }
        }

        match outcome {
            Ok(result) => result,
            Err((stage, e)) => self.fail(ctx, Some(stage), e, max_points),
        }
    }

    fn fail(
        &self,
        ctx: &GradingContext,
        stage: Option<GradingStage>,
        error: GradingError,
        max_points: f64,
    ) -> RubricResult {
        let stage = stage.map(|s| s.to_string()).unwrap_or_default();
        tracing::error!(stage = %stage, kind = error.kind(), error = %error, "grading run failed");
        let message = error.to_string();
        ctx.progress().notify_error(message.clone());
        RubricResult::failed(message, max_points)
    }

    async fn run_stages(
        &self,
        ctx: &GradingContext,
    ) -> Result<RubricResult, (GradingStage, GradingError)> {
        let progress = ctx.progress();
        let executor = self.executor.as_ref();
        let stage_repo = ctx.stage_repo();
        let tests_dir = ctx.stage_tests();
        let suite = ctx.phase().suite_name();

        let at = |stage: GradingStage| move |e: GradingError| (stage, e);

        let item = self
            .rubric
            .item(ctx.phase())
            .map_err(at(GradingStage::StageRepo))?;

        tracing::info!(stage = %GradingStage::StageRepo, "staging repo");
        progress.update("Staging repo...");
        stage_checkout(ctx.repo_path(), &stage_repo).map_err(at(GradingStage::StageRepo))?;
        progress.update("Successfully staged repo");

        tracing::info!(stage = %GradingStage::ApplyModifiers, count = self.modifiers.len(), "applying modifiers");
        for modifier in &self.modifiers {
            tracing::debug!(modifier = modifier.name(), "running modifier");
            modifier
                .modify(&stage_repo, ctx)
                .map_err(at(GradingStage::ApplyModifiers))?;
        }
        progress.update("Verified project structure");

        tracing::info!(stage = %GradingStage::Build, module = ctx.module(), "packaging repo");
        progress.update("Packaging repo...");
        let artifact = package_repo(executor, &self.toolchain, &stage_repo, ctx.module())
            .await
            .map_err(|e| (GradingStage::Build, GradingError::from(e)))?;
        progress.update("Successfully packaged repo");

        tracing::info!(stage = %GradingStage::CompileTests, "compiling tests");
        progress.update(format!("Compiling {suite}..."));
        let compiled = compile_tests(
            executor,
            &self.toolchain,
            ctx.phase_tests_dir(),
            &artifact,
            &tests_dir,
            ctx.stage_path(),
        )
        .await
        .map_err(|e| (GradingStage::CompileTests, GradingError::from(e)))?;

        let report = if compiled == 0 {
            tracing::info!(stage = %GradingStage::RunTests, "no tests compiled; nothing to run");
            String::new()
        } else {
            progress.update(format!("Successfully compiled {suite}"));
            tracing::info!(stage = %GradingStage::RunTests, compiled, "running tests");
            progress.update(format!("Running {suite}..."));
            let output = run_tests(executor, &self.toolchain, &tests_dir, &artifact)
                .await
                .map_err(|e| (GradingStage::RunTests, GradingError::from(e)))?;
            progress.update(format!("Successfully ran {suite}"));
            output.report
        };

        tracing::info!(stage = %GradingStage::Analyze, bytes = report.len(), "analyzing report");
        let result = MarkingJob::new(report, item.points)
            .with_extra_credit(ctx.extra_credit().clone())
            .with_suite_name(suite)
            .with_days_late(ctx.days_late())
            .mark();

        tracing::info!(
            stage = %GradingStage::Score,
            score = result.score,
            max_points = result.max_points,
            "scored"
        );

        tracing::info!(stage = %GradingStage::Publish, "publishing result");
        progress.update(format!("Grading complete: {}", first_line(&result.notes)));
        Ok(result)
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

/// Copies `checkout` into `stage_repo`, replacing anything already there.
/// Symlinks are not followed or copied.
fn stage_checkout(checkout: &Path, stage_repo: &Path) -> Result<(), GradingError> {
    if !checkout.is_dir() {
        return Err(GradingError::StageRepo(format!(
            "Checkout {} is not a directory",
            checkout.display()
        )));
    }
    if stage_repo.exists() {
        std::fs::remove_dir_all(stage_repo)?;
    }
    util::paths::ensure_dir(stage_repo)?;

    let mut files = 0usize;
    for entry in WalkDir::new(checkout).follow_links(false) {
        let entry = entry.map_err(|e| GradingError::StageRepo(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(checkout)
            .map_err(|e| GradingError::StageRepo(e.to_string()))?;
        let target = stage_repo.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if file_type.is_file() {
            std::fs::copy(entry.path(), &target)?;
            files += 1;
        } else {
            tracing::debug!(path = %relative.display(), "skipping non-regular file");
        }
    }

    tracing::debug!(files, to = %stage_repo.display(), "checkout staged");
    Ok(())
}
