//! # Graphdex
//!
//! Index freshness and query orchestration for documentation Q&A over a
//! knowledge graph.
//!
//! Graphdex keeps a derived knowledge-graph index in sync with a
//! documentation corpus and routes natural-language questions to one of
//! two retrieval strategies on an external engine. Graph construction,
//! community detection, and embeddings live behind the engine boundary;
//! this crate owns the control logic around them.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌───────────────┐
//! │  Corpus   │──▶│    Build     │──▶│  Output area   │
//! │ git + md  │   │ Coordinator  │   │ (6 artifacts)  │
//! └───────────┘   └──────┬──────┘    └──────┬────────┘
//!                        │ engine           │ probe
//!                        ▼                  ▼
//!                 ┌──────────────┐   ┌──────────────┐
//!                 │ IndexEngine  │◀──│ Query Router │
//!                 └──────────────┘   └──────┬───────┘
//!                                           ▼
//!                                   ┌──────────────┐
//!                                   │   Delivery   │
//!                                   │ (summarize,  │
//!                                   │  chunk)      │
//!                                   └──────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration plus one-shot environment overrides |
//! | [`project`] | Project directory layout and settings initialization |
//! | [`corpus`] | Corpus repository sync and markdown conversion |
//! | [`markdown`] | Markdown to plain-text stripping |
//! | [`probe`] | Artifact store readiness probe |
//! | [`coordinator`] | Build vs. skip vs. forced-rebuild decisions |
//! | [`engine`] | External indexing/query engine boundary |
//! | [`query`] | Mode dispatch between global and local retrieval |
//! | [`chat`] | Chat-completion client |
//! | [`delivery`] | Answer summarization, secret masking, chunking |
//! | [`ingest`] | Runtime document ingestion and incremental updates |
//! | [`server`] | HTTP serving surface |
//! | [`error`] | Failure taxonomy |
//! | [`models`] | Core data types |

pub mod chat;
pub mod config;
pub mod coordinator;
pub mod corpus;
pub mod delivery;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod markdown;
pub mod models;
pub mod probe;
pub mod project;
pub mod query;
pub mod server;
