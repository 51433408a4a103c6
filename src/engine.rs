//! Indexing/query engine boundary.
//!
//! Graph construction, community detection, and embedding all live behind
//! the [`IndexEngine`] trait; this crate only decides *when* to build,
//! *which* retrieval strategy to invoke, and *how* results are delivered.
//!
//! Two implementations are provided:
//! - **[`HttpEngine`]**: talks to an engine service over JSON HTTP.
//! - **[`DisabledEngine`]**: returns errors; used when no engine is
//!   configured (e.g. probing and delivery can still be exercised).
//!
//! Use [`create_engine`] to instantiate the right one from configuration.
//!
//! # Error contract
//!
//! Transport failures and non-2xx responses surface as
//! [`OrchestratorError::UpstreamCall`]; per-stage indexing errors ride back
//! inside [`StageResult`] values and are judged by the build coordinator,
//! not here. No retries are performed at this boundary.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::error::OrchestratorError;
use crate::models::{ArtifactKind, ArtifactSet, QueryResponse, StageResult};
use crate::project::Project;

/// Retrieval request shared by both search strategies.
#[derive(Debug)]
pub struct SearchRequest<'a> {
    /// Engine settings file inside the project directory.
    pub settings_path: &'a std::path::Path,
    /// The complete, generation-consistent artifact set.
    pub artifacts: &'a ArtifactSet,
    pub query: &'a str,
    /// Community granularity for community-summary retrieval.
    pub community_level: u32,
}

/// The external indexing and retrieval engine.
#[async_trait]
pub trait IndexEngine: Send + Sync {
    /// Run a full index build over the project's input area.
    ///
    /// Returns per-stage results in execution order; stage errors do not
    /// fail the call itself.
    async fn build_index(&self, project: &Project) -> Result<Vec<StageResult>, OrchestratorError>;

    /// Run an incremental index update (no full corpus resync).
    async fn update_index(&self, project: &Project)
        -> Result<Vec<StageResult>, OrchestratorError>;

    /// Broad community-summary retrieval for corpus-wide questions.
    async fn global_search(
        &self,
        request: SearchRequest<'_>,
    ) -> Result<QueryResponse, OrchestratorError>;

    /// Entity/text-unit/relationship-scoped retrieval for narrow questions.
    async fn local_search(
        &self,
        request: SearchRequest<'_>,
    ) -> Result<QueryResponse, OrchestratorError>;
}

// ============ Disabled engine ============

/// Engine stub used when `engine.provider = "disabled"`.
pub struct DisabledEngine;

#[async_trait]
impl IndexEngine for DisabledEngine {
    async fn build_index(&self, _: &Project) -> Result<Vec<StageResult>, OrchestratorError> {
        Err(disabled())
    }

    async fn update_index(&self, _: &Project) -> Result<Vec<StageResult>, OrchestratorError> {
        Err(disabled())
    }

    async fn global_search(
        &self,
        _: SearchRequest<'_>,
    ) -> Result<QueryResponse, OrchestratorError> {
        Err(disabled())
    }

    async fn local_search(&self, _: SearchRequest<'_>) -> Result<QueryResponse, OrchestratorError> {
        Err(disabled())
    }
}

fn disabled() -> OrchestratorError {
    OrchestratorError::UpstreamCall(
        "index engine is disabled; set [engine] provider in config".to_string(),
    )
}

// ============ HTTP engine ============

/// Engine client speaking JSON over HTTP to an engine service.
///
/// Endpoints, relative to `engine.base_url`:
///
/// | Method | Path | Body |
/// |--------|------|------|
/// | `POST` | `/index/build` | `{project_root, settings_path}` |
/// | `POST` | `/index/update` | `{project_root, settings_path}` |
/// | `POST` | `/search/global` | `{settings_path, tables, query, community_level}` |
/// | `POST` | `/search/local` | `{settings_path, tables, query, community_level}` |
pub struct HttpEngine {
    base_url: String,
    client: reqwest::Client,
}

impl HttpEngine {
    pub fn new(config: &EngineConfig) -> Result<Self, OrchestratorError> {
        let base_url = config
            .base_url
            .clone()
            .ok_or_else(|| {
                OrchestratorError::UpstreamCall("engine.base_url is not configured".to_string())
            })?
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OrchestratorError::UpstreamCall(format!("engine client: {e}")))?;

        Ok(Self { base_url, client })
    }

    async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, OrchestratorError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| OrchestratorError::UpstreamCall(format!("engine {path}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(OrchestratorError::UpstreamCall(format!(
                "engine {path} returned {status}: {}",
                body_text.trim()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| OrchestratorError::UpstreamCall(format!("engine {path}: {e}")))
    }

    async fn run_pipeline(
        &self,
        path: &str,
        project: &Project,
    ) -> Result<Vec<StageResult>, OrchestratorError> {
        let body = json!({
            "project_root": project.root(),
            "settings_path": project.settings_path(),
        });
        let value = self.post(path, body).await?;

        let stages = value
            .get("stages")
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        serde_json::from_value(stages).map_err(|e| {
            OrchestratorError::UpstreamCall(format!("engine {path}: malformed stage results: {e}"))
        })
    }

    async fn run_search(
        &self,
        path: &str,
        tables: &[ArtifactKind],
        request: &SearchRequest<'_>,
    ) -> Result<QueryResponse, OrchestratorError> {
        let table_paths: serde_json::Map<String, serde_json::Value> = tables
            .iter()
            .filter_map(|kind| {
                request.artifacts.table(*kind).map(|artifact| {
                    (
                        kind.table_name().to_string(),
                        json!(artifact.path.display().to_string()),
                    )
                })
            })
            .collect();

        let body = json!({
            "settings_path": request.settings_path,
            "tables": table_paths,
            "query": request.query,
            "community_level": request.community_level,
        });

        let value = self.post(path, body).await?;
        serde_json::from_value(value).map_err(|e| {
            OrchestratorError::UpstreamCall(format!("engine {path}: malformed response: {e}"))
        })
    }
}

#[async_trait]
impl IndexEngine for HttpEngine {
    async fn build_index(&self, project: &Project) -> Result<Vec<StageResult>, OrchestratorError> {
        self.run_pipeline("/index/build", project).await
    }

    async fn update_index(
        &self,
        project: &Project,
    ) -> Result<Vec<StageResult>, OrchestratorError> {
        self.run_pipeline("/index/update", project).await
    }

    async fn global_search(
        &self,
        request: SearchRequest<'_>,
    ) -> Result<QueryResponse, OrchestratorError> {
        self.run_search(
            "/search/global",
            &[
                ArtifactKind::Entities,
                ArtifactKind::Communities,
                ArtifactKind::CommunityReports,
                ArtifactKind::Nodes,
            ],
            &request,
        )
        .await
    }

    async fn local_search(
        &self,
        request: SearchRequest<'_>,
    ) -> Result<QueryResponse, OrchestratorError> {
        self.run_search(
            "/search/local",
            &[
                ArtifactKind::Entities,
                ArtifactKind::CommunityReports,
                ArtifactKind::Nodes,
                ArtifactKind::TextUnits,
                ArtifactKind::Relationships,
            ],
            &request,
        )
        .await
    }
}

/// Instantiate the engine named by `engine.provider`.
pub fn create_engine(config: &EngineConfig) -> Result<Box<dyn IndexEngine>, OrchestratorError> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledEngine)),
        "http" => Ok(Box::new(HttpEngine::new(config)?)),
        other => Err(OrchestratorError::UpstreamCall(format!(
            "unknown engine provider: {other}"
        ))),
    }
}
