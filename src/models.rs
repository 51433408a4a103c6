//! Core data types shared across the build and query paths.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One of the six derived tables a full index build produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Entities,
    Communities,
    CommunityReports,
    Nodes,
    TextUnits,
    Relationships,
}

impl ArtifactKind {
    /// All six tables, in the order they are probed and loaded.
    pub const ALL: [ArtifactKind; 6] = [
        ArtifactKind::Entities,
        ArtifactKind::Communities,
        ArtifactKind::CommunityReports,
        ArtifactKind::Nodes,
        ArtifactKind::TextUnits,
        ArtifactKind::Relationships,
    ];

    /// File name of this table inside the output area.
    pub fn file_name(self) -> &'static str {
        match self {
            ArtifactKind::Entities => "create_final_entities.parquet",
            ArtifactKind::Communities => "create_final_communities.parquet",
            ArtifactKind::CommunityReports => "create_final_community_reports.parquet",
            ArtifactKind::Nodes => "create_final_nodes.parquet",
            ArtifactKind::TextUnits => "create_final_text_units.parquet",
            ArtifactKind::Relationships => "create_final_relationships.parquet",
        }
    }

    /// Short table name used in error messages and engine requests.
    pub fn table_name(self) -> &'static str {
        match self {
            ArtifactKind::Entities => "entities",
            ArtifactKind::Communities => "communities",
            ArtifactKind::CommunityReports => "community_reports",
            ArtifactKind::Nodes => "nodes",
            ArtifactKind::TextUnits => "text_units",
            ArtifactKind::Relationships => "relationships",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// A single artifact table as observed on disk at load time.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    /// Modification instant captured at load; used to reject a set that
    /// spans two build generations.
    pub modified: DateTime<Utc>,
}

/// A complete, generation-consistent set of the six artifact tables.
///
/// Constructed only by [`crate::probe::load_artifact_set`]; partial sets
/// are unrepresentable.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    pub tables: Vec<Artifact>,
    pub loaded_at: DateTime<Utc>,
}

impl ArtifactSet {
    pub fn table(&self, kind: ArtifactKind) -> Option<&Artifact> {
        self.tables.iter().find(|a| a.kind == kind)
    }
}

/// Per-stage outcome reported by the external indexing engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: String,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Answer plus opaque retrieval evidence, passed through unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub context: serde_json::Value,
}

/// A converted plain-text unit derived from one source document.
#[derive(Debug, Clone)]
pub struct TextUnit {
    /// Path of the source document, relative to the corpus root.
    pub source_path: PathBuf,
    /// Flattened output file name inside the input area.
    pub file_name: String,
}

/// Lifecycle of the index as seen by diagnostics.
///
/// The readiness probe over the output directory, not this flag, is the
/// gate queries coordinate through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    Uninitialized,
    Building,
    Ready,
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildState::Uninitialized => f.write_str("uninitialized"),
            BuildState::Building => f.write_str("building"),
            BuildState::Ready => f.write_str("ready"),
        }
    }
}
