//! Build coordinator.
//!
//! Decides build vs. skip vs. forced rebuild, resolves the input area, and
//! judges the engine's per-stage results. Artifacts become visible to
//! readers only through the engine's own output-directory publication; the
//! coordinator never reads artifacts mid-build and never advertises
//! readiness before every stage result has been inspected.

use tracing::{error, info};
use uuid::Uuid;

use crate::config::Config;
use crate::corpus;
use crate::engine::IndexEngine;
use crate::error::OrchestratorError;
use crate::models::StageResult;
use crate::probe;
use crate::project::Project;

/// What a build invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// A complete artifact set already existed and `force` was off; the
    /// engine was not invoked and the artifacts are untouched.
    Skipped,
    /// The engine ran to completion with no stage errors.
    Built { stages: usize },
}

/// Run one build cycle.
///
/// A failed forced rebuild propagates to the caller like any other build
/// failure; it is never downgraded to a warning. While it runs, readers
/// may keep serving the previous artifact generation.
pub async fn build(
    config: &Config,
    project: &Project,
    engine: &dyn IndexEngine,
    force: bool,
) -> Result<BuildOutcome, OrchestratorError> {
    let run_id = Uuid::new_v4();
    info!(%run_id, force, test_mode = config.build.test_mode, "build requested");

    project
        .ensure_initialized(config)
        .map_err(|e| OrchestratorError::Build(format!("project initialization: {e:#}")))?;

    resolve_input_area(config, project).await?;

    if !force && probe::is_index_ready(&project.output_dir()) {
        info!(%run_id, "index already built, skipping");
        return Ok(BuildOutcome::Skipped);
    }

    info!(%run_id, "invoking index engine");
    let stages = engine.build_index(project).await?;
    inspect_stages(&stages)?;

    info!(%run_id, stages = stages.len(), "index build succeeded");
    Ok(BuildOutcome::Built {
        stages: stages.len(),
    })
}

/// Populate the project's input area with text units.
///
/// In test mode the pre-seeded `test_input/` directory is used as-is and
/// corpus sync is skipped entirely. Either way, an empty input area is a
/// hard failure: an empty index is indistinguishable from a broken one.
async fn resolve_input_area(config: &Config, project: &Project) -> Result<(), OrchestratorError> {
    if config.build.test_mode {
        let test_input = project.test_input_dir();
        info!(dir = %test_input.display(), "test mode enabled, using pre-seeded input");
        if !has_files(&test_input) {
            return Err(OrchestratorError::Ingestion(format!(
                "test mode: no files in {}",
                test_input.display()
            )));
        }
        return Ok(());
    }

    let corpus_config = config.corpus.clone();
    let repo_dir = project.repo_dir();
    let input_dir = project.input_dir();

    // Git subprocesses and conversion I/O both block; keep them off the
    // serving runtime.
    let report = tokio::task::spawn_blocking(move || {
        corpus::sync_repo(&corpus_config, &repo_dir)?;
        corpus::convert_corpus(&corpus_config, &repo_dir, &input_dir)
    })
    .await
    .map_err(|e| OrchestratorError::Ingestion(format!("ingestion task failed: {e}")))??;

    info!(text_units = report.units.len(), "input area resolved");
    Ok(())
}

/// Judge per-stage engine results, in the order the engine returned them.
///
/// Any stage error fails the whole build; partial success is not "ready".
pub fn inspect_stages(stages: &[StageResult]) -> Result<(), OrchestratorError> {
    let mut failed = Vec::new();

    for stage in stages {
        if stage.errors.is_empty() {
            info!(stage = %stage.stage, "stage succeeded");
        } else {
            error!(stage = %stage.stage, errors = ?stage.errors, "stage reported errors");
            failed.push(stage.stage.clone());
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(OrchestratorError::Build(format!(
            "stages reported errors: {}",
            failed.join(", ")
        )))
    }
}

fn has_files(dir: &std::path::Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| {
            entries.any(|e| e.map(|e| e.path().is_file()).unwrap_or(false))
        })
        .unwrap_or(false)
}
