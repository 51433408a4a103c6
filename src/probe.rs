//! Artifact store probe.
//!
//! The output directory is the sole shared resource between the build
//! coordinator (writer) and the query router (reader). These functions are
//! pure inspections of that directory; a `true` readiness result is
//! eventually consistent and is re-validated at every full set load.

use chrono::{DateTime, Utc};
use std::path::Path;

use crate::error::OrchestratorError;
use crate::models::{Artifact, ArtifactKind, ArtifactSet};

/// Returns true iff all six artifact tables exist in the output area.
///
/// No side effects. Callers must not query before this returns true.
pub fn is_index_ready(output_dir: &Path) -> bool {
    ArtifactKind::ALL
        .iter()
        .all(|kind| output_dir.join(kind.file_name()).is_file())
}

/// Tables currently absent from the output area, in probe order.
pub fn missing_artifacts(output_dir: &Path) -> Vec<ArtifactKind> {
    ArtifactKind::ALL
        .iter()
        .copied()
        .filter(|kind| !output_dir.join(kind.file_name()).is_file())
        .collect()
}

/// Load the full artifact set, capturing each table's modification instant.
///
/// After the first pass the set is re-stat'ed; if any table changed or
/// vanished in between, the load fails rather than handing the caller a
/// mix of two build generations.
pub fn load_artifact_set(output_dir: &Path) -> Result<ArtifactSet, OrchestratorError> {
    let mut tables = Vec::with_capacity(ArtifactKind::ALL.len());

    for kind in ArtifactKind::ALL {
        tables.push(stat_artifact(output_dir, kind)?);
    }

    for artifact in &tables {
        let current = stat_artifact(output_dir, artifact.kind)?;
        if current.modified != artifact.modified {
            return Err(OrchestratorError::ArtifactMissing(
                artifact.kind.table_name().to_string(),
            ));
        }
    }

    Ok(ArtifactSet {
        tables,
        loaded_at: Utc::now(),
    })
}

fn stat_artifact(output_dir: &Path, kind: ArtifactKind) -> Result<Artifact, OrchestratorError> {
    let path = output_dir.join(kind.file_name());
    let metadata = std::fs::metadata(&path)
        .map_err(|_| OrchestratorError::ArtifactMissing(kind.table_name().to_string()))?;

    let modified: DateTime<Utc> = metadata
        .modified()
        .map_err(|_| OrchestratorError::ArtifactMissing(kind.table_name().to_string()))?
        .into();

    Ok(Artifact {
        kind,
        path,
        modified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_all_artifacts(dir: &Path) {
        for kind in ArtifactKind::ALL {
            std::fs::write(dir.join(kind.file_name()), kind.table_name()).unwrap();
        }
    }

    #[test]
    fn test_empty_directory_not_ready() {
        let tmp = TempDir::new().unwrap();
        assert!(!is_index_ready(tmp.path()));
        assert_eq!(missing_artifacts(tmp.path()).len(), 6);
    }

    #[test]
    fn test_complete_set_ready() {
        let tmp = TempDir::new().unwrap();
        write_all_artifacts(tmp.path());
        assert!(is_index_ready(tmp.path()));
        assert!(missing_artifacts(tmp.path()).is_empty());
    }

    #[test]
    fn test_partial_set_not_ready() {
        let tmp = TempDir::new().unwrap();
        write_all_artifacts(tmp.path());
        std::fs::remove_file(tmp.path().join(ArtifactKind::Nodes.file_name())).unwrap();

        assert!(!is_index_ready(tmp.path()));
        assert_eq!(missing_artifacts(tmp.path()), vec![ArtifactKind::Nodes]);
    }

    #[test]
    fn test_load_complete_set() {
        let tmp = TempDir::new().unwrap();
        write_all_artifacts(tmp.path());

        let set = load_artifact_set(tmp.path()).unwrap();
        assert_eq!(set.tables.len(), 6);
        assert!(set.table(ArtifactKind::CommunityReports).is_some());
    }

    #[test]
    fn test_load_names_missing_table() {
        let tmp = TempDir::new().unwrap();
        write_all_artifacts(tmp.path());
        std::fs::remove_file(tmp.path().join(ArtifactKind::Relationships.file_name())).unwrap();

        let err = load_artifact_set(tmp.path()).unwrap_err();
        match err {
            OrchestratorError::ArtifactMissing(table) => assert_eq!(table, "relationships"),
            other => panic!("expected ArtifactMissing, got {other:?}"),
        }
    }
}
