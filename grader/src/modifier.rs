//! Code modifiers run against the staged copy of a submission before it is built.

use std::path::Path;

use crate::context::GradingContext;
use crate::error::GradingError;

/// A step that checks or adjusts the staged repo. An error aborts the run.
pub trait CodeModifier: Send + Sync {
    fn name(&self) -> &str;

    fn modify(&self, stage_repo: &Path, ctx: &GradingContext) -> Result<(), GradingError>;
}

/// Fails when the staged repo is not a Maven project containing the module
/// under test.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjectStructureVerifier;

impl CodeModifier for ProjectStructureVerifier {
    fn name(&self) -> &str {
        "project structure"
    }

    fn modify(&self, stage_repo: &Path, ctx: &GradingContext) -> Result<(), GradingError> {
        if !stage_repo.join("pom.xml").is_file() {
            return Err(GradingError::Modifier(
                "Missing pom.xml at the root of the repository".into(),
            ));
        }

        let module = ctx.module();
        let module_dir = stage_repo.join(module);
        if !module_dir.is_dir() {
            return Err(GradingError::Modifier(format!(
                "Missing `{module}` module directory at the root of the repository"
            )));
        }
        if !module_dir.join("pom.xml").is_file() {
            return Err(GradingError::Modifier(format!(
                "Missing pom.xml in the `{module}` module"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Phase;
    use std::fs;
    use tempfile::tempdir;

    fn ctx(repo: &Path) -> GradingContext {
        GradingContext::builder("cosmo", Phase::Phase4)
            .repo_path(repo)
            .stage_path(repo.join("stage"))
            .phase_tests_dir(repo.join("phase4"))
            .build()
            .unwrap()
    }

    #[test]
    fn accepts_maven_project_with_module() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
        fs::create_dir(dir.path().join("server")).unwrap();
        fs::write(dir.path().join("server/pom.xml"), "<project/>").unwrap();

        ProjectStructureVerifier
            .modify(dir.path(), &ctx(dir.path()))
            .unwrap();
    }

    #[test]
    fn rejects_missing_root_pom() {
        let dir = tempdir().unwrap();
        let err = ProjectStructureVerifier
            .modify(dir.path(), &ctx(dir.path()))
            .unwrap_err();
        assert!(err.to_string().contains("pom.xml"));
    }

    #[test]
    fn rejects_missing_module() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
        fs::create_dir(dir.path().join("shared")).unwrap();

        let err = ProjectStructureVerifier
            .modify(dir.path(), &ctx(dir.path()))
            .unwrap_err();
        assert!(err.to_string().contains("`server`"));
    }

    #[test]
    fn rejects_module_without_pom() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
        fs::create_dir(dir.path().join("server")).unwrap();

        let err = ProjectStructureVerifier
            .modify(dir.path(), &ctx(dir.path()))
            .unwrap_err();
        assert!(matches!(err, GradingError::Modifier(_)));
    }
}
