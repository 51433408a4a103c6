//! Query router.
//!
//! Validates a request, selects a retrieval strategy from the mode, and
//! hands the loaded artifact set to the engine. The router adds no
//! transformation beyond mode dispatch and artifact loading.

use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::config::Config;
use crate::engine::{IndexEngine, SearchRequest};
use crate::error::OrchestratorError;
use crate::models::QueryResponse;
use crate::probe;
use crate::project::Project;

/// Retrieval strategy selector. Closed on purpose: adding a mode is a
/// compile-time-visible change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Entity/text-unit/relationship-scoped retrieval for narrow questions.
    Local,
    /// Community-summary retrieval for corpus-wide synthesis questions.
    Global,
}

impl FromStr for SearchMode {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(SearchMode::Local),
            "global" => Ok(SearchMode::Global),
            other => Err(OrchestratorError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchMode::Local => f.write_str("local"),
            SearchMode::Global => f.write_str("global"),
        }
    }
}

/// Route one question to the retrieval strategy selected by `mode`.
///
/// Fails with [`OrchestratorError::NotReady`] before any engine work when
/// the probe reports an incomplete artifact set, and with
/// [`OrchestratorError::ArtifactMissing`] when a table vanishes between
/// probe and load. The engine's `(answer, context)` pair is returned
/// unchanged.
pub async fn run_query(
    config: &Config,
    project: &Project,
    engine: &dyn IndexEngine,
    text: &str,
    mode: SearchMode,
) -> Result<QueryResponse, OrchestratorError> {
    let output_dir = project.output_dir();

    if !probe::is_index_ready(&output_dir) {
        return Err(OrchestratorError::NotReady);
    }

    let artifacts = probe::load_artifact_set(&output_dir)?;
    let settings_path = project.settings_path();

    let request = SearchRequest {
        settings_path: &settings_path,
        artifacts: &artifacts,
        query: text,
        community_level: config.query.community_level,
    };

    info!(%mode, community_level = config.query.community_level, "dispatching query");

    match mode {
        SearchMode::Global => engine.global_search(request).await,
        SearchMode::Local => engine.local_search(request).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_modes() {
        assert_eq!("local".parse::<SearchMode>().unwrap(), SearchMode::Local);
        assert_eq!("global".parse::<SearchMode>().unwrap(), SearchMode::Global);
    }

    #[test]
    fn test_parse_rejects_unknown_mode_naming_it() {
        let err = "fuzzy".parse::<SearchMode>().unwrap_err();
        match err {
            OrchestratorError::InvalidMode(mode) => assert_eq!(mode, "fuzzy"),
            other => panic!("expected InvalidMode, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("Global".parse::<SearchMode>().is_err());
        assert!("LOCAL".parse::<SearchMode>().is_err());
    }
}
