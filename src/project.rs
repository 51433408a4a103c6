//! Project directory layout and first-run initialization.
//!
//! A project is a long-lived directory holding the engine settings file, an
//! input area of converted text units, an output area of index artifacts,
//! and a reporting area. Initialization is idempotent: it writes a settings
//! template (plus any locally supplied overrides) only when absent.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::Config;

pub const SETTINGS_FILE: &str = "settings.toml";

#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    /// Converted text units consumed by the indexing engine.
    pub fn input_dir(&self) -> PathBuf {
        self.root.join("input")
    }

    /// Index artifacts published by the engine.
    pub fn output_dir(&self) -> PathBuf {
        self.root.join("output")
    }

    /// Engine run reports and logs.
    pub fn reports_dir(&self) -> PathBuf {
        self.root.join("reports")
    }

    /// Pre-seeded input used when test mode is enabled.
    pub fn test_input_dir(&self) -> PathBuf {
        self.root.join("test_input")
    }

    /// Local clone of the corpus repository.
    pub fn repo_dir(&self) -> PathBuf {
        self.root.join("corpus_repo")
    }

    /// Create the directory layout and settings file if absent.
    ///
    /// Returns `true` when the settings file was freshly written. Safe to
    /// call before every build.
    pub fn ensure_initialized(&self, config: &Config) -> Result<bool> {
        for dir in [
            self.root.clone(),
            self.input_dir(),
            self.output_dir(),
            self.reports_dir(),
        ] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create project directory: {}", dir.display()))?;
        }

        let settings = self.settings_path();
        if settings.exists() {
            return Ok(false);
        }

        std::fs::write(&settings, render_settings(config))
            .with_context(|| format!("Failed to write settings file: {}", settings.display()))?;
        info!(path = %settings.display(), "initialized project settings");

        // Locally supplied overrides replace the template wholesale.
        if let Some(overrides) = &config.project.settings_overrides {
            if overrides.exists() {
                std::fs::copy(overrides, &settings).with_context(|| {
                    format!("Failed to copy settings overrides: {}", overrides.display())
                })?;
                info!(from = %overrides.display(), "applied local settings overrides");
            }
        }

        Ok(true)
    }
}

/// Render the engine settings template from the process configuration.
fn render_settings(config: &Config) -> String {
    let chat_model = config.chat.model.as_deref().unwrap_or("gpt-4o-mini");
    let chat_base = config
        .chat
        .base_url
        .as_deref()
        .unwrap_or("https://api.openai.com/v1");
    let chat_key = config.chat.api_key.as_deref().unwrap_or("");
    let embed_model = config
        .engine
        .embedding
        .model
        .as_deref()
        .unwrap_or("text-embedding-3-small");
    let embed_base = config
        .engine
        .embedding
        .base_url
        .as_deref()
        .unwrap_or("https://api.openai.com/v1");
    let embed_key = config.engine.embedding.api_key.as_deref().unwrap_or("");

    format!(
        r#"# Engine settings for this project. Generated on first init; edit freely.

[input]
base_dir = "input"

[output]
base_dir = "output"

[reporting]
base_dir = "reports"

[llm]
model = "{chat_model}"
base_url = "{chat_base}"
api_key = "{chat_key}"

[embeddings]
model = "{embed_model}"
base_url = "{embed_base}"
api_key = "{embed_key}"

[community]
level = {level}
"#,
        level = config.query.community_level,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(work_dir: &Path) -> Config {
        let toml = format!(
            r#"
            [project]
            work_dir = "{}"

            [corpus]
            url = "https://example.com/docs.git"

            [server]
            bind = "127.0.0.1:7400"
            "#,
            work_dir.display()
        );
        toml::from_str(&toml).unwrap()
    }

    #[test]
    fn test_init_creates_layout() {
        let tmp = TempDir::new().unwrap();
        let project = Project::new(tmp.path().join("proj"));
        let config = test_config(project.root());

        let fresh = project.ensure_initialized(&config).unwrap();
        assert!(fresh);
        assert!(project.settings_path().exists());
        assert!(project.input_dir().is_dir());
        assert!(project.output_dir().is_dir());
        assert!(project.reports_dir().is_dir());
    }

    #[test]
    fn test_init_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let project = Project::new(tmp.path().join("proj"));
        let config = test_config(project.root());

        assert!(project.ensure_initialized(&config).unwrap());

        // Second run must not rewrite the settings file.
        std::fs::write(project.settings_path(), "edited = true\n").unwrap();
        assert!(!project.ensure_initialized(&config).unwrap());
        let content = std::fs::read_to_string(project.settings_path()).unwrap();
        assert_eq!(content, "edited = true\n");
    }

    #[test]
    fn test_init_applies_overrides() {
        let tmp = TempDir::new().unwrap();
        let overrides = tmp.path().join("settings.local.toml");
        std::fs::write(&overrides, "custom = 1\n").unwrap();

        let project = Project::new(tmp.path().join("proj"));
        let mut config = test_config(project.root());
        config.project.settings_overrides = Some(overrides);

        project.ensure_initialized(&config).unwrap();
        let content = std::fs::read_to_string(project.settings_path()).unwrap();
        assert_eq!(content, "custom = 1\n");
    }
}
