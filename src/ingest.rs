//! Runtime ingestion trigger.
//!
//! Accepts a new document while the service is running, persists it into
//! the input area, and schedules an incremental engine update. The update
//! path never performs a full corpus resync.

use std::path::Path;
use tracing::info;

use crate::coordinator::inspect_stages;
use crate::corpus::flatten_name;
use crate::engine::IndexEngine;
use crate::error::OrchestratorError;
use crate::markdown::markdown_to_text;
use crate::models::StageResult;
use crate::project::Project;

/// Persist `content` as a text unit and run an incremental index update.
///
/// `file_name` may carry directory separators; it is flattened exactly like
/// corpus documents so uploads can't collide with or escape the input
/// area. Markdown uploads are converted; anything else is stored verbatim.
pub async fn ingest_document(
    project: &Project,
    engine: &dyn IndexEngine,
    file_name: &str,
    content: &str,
) -> Result<Vec<StageResult>, OrchestratorError> {
    if content.trim().is_empty() {
        return Err(OrchestratorError::Ingestion(format!(
            "uploaded document '{file_name}' is empty"
        )));
    }

    let unit_name = flatten_name(Path::new(file_name));
    let text = if is_markdown(file_name) {
        markdown_to_text(content)
    } else {
        content.to_string()
    };

    let input_dir = project.input_dir();
    tokio::fs::create_dir_all(&input_dir).await.map_err(|e| {
        OrchestratorError::Ingestion(format!("input area {}: {e}", input_dir.display()))
    })?;

    let out_path = input_dir.join(&unit_name);
    tokio::fs::write(&out_path, text).await.map_err(|e| {
        OrchestratorError::Ingestion(format!("persisting {}: {e}", out_path.display()))
    })?;

    info!(unit = %unit_name, "document persisted, scheduling incremental update");

    let stages = engine.update_index(project).await?;
    inspect_stages(&stages)?;

    Ok(stages)
}

fn is_markdown(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    lower.ends_with(".md") || lower.ends_with(".markdown")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_detection() {
        assert!(is_markdown("notes.md"));
        assert!(is_markdown("GUIDE.MD"));
        assert!(is_markdown("deep/dir/page.markdown"));
        assert!(!is_markdown("data.txt"));
        assert!(!is_markdown("mdfile"));
    }
}
