use thiserror::Error;

/// Failure taxonomy for the orchestrator core.
///
/// Every fallible operation in the build/query path maps onto one of these
/// variants so callers can distinguish "retry the whole build" from
/// "report and keep serving".
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Corpus sync or document conversion failed, or produced zero text units.
    #[error("ingestion failed: {0}")]
    Ingestion(String),

    /// One or more indexing stages reported errors; the build as a whole failed.
    #[error("index build failed: {0}")]
    Build(String),

    /// A query arrived before a complete artifact set exists.
    #[error("index is not ready; run a build before querying")]
    NotReady,

    /// An artifact table vanished between the readiness probe and the load.
    #[error("artifact table '{0}' is missing from the output area")]
    ArtifactMissing(String),

    /// The query mode is not one of `local` / `global`.
    #[error("unsupported query mode '{0}': expected 'local' or 'global'")]
    InvalidMode(String),

    /// The retrieval engine or chat-completion endpoint failed at transport level.
    #[error("upstream call failed: {0}")]
    UpstreamCall(String),
}
