//! Corpus ingestion adapter.
//!
//! Synchronizes the documentation repository and converts markdown sources
//! into the plain-text units the indexing engine consumes.
//!
//! Workflow:
//! 1. Clone the corpus repository if absent, otherwise fetch and reset.
//! 2. Walk the tree recursively, applying include/exclude globs.
//! 3. Convert each markdown file, flattening its relative directory path
//!    into an underscore-joined output name to avoid collisions.
//! 4. Skip files that fail to convert (logged), but fail the whole
//!    conversion when zero text units result.

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::CorpusConfig;
use crate::error::OrchestratorError;
use crate::markdown::markdown_to_text;
use crate::models::TextUnit;

/// Outcome of one conversion pass over the synced corpus.
#[derive(Debug, Default)]
pub struct ConversionReport {
    pub units: Vec<TextUnit>,
    /// Files that failed to convert, with the reason; the pass continues past them.
    pub failed: Vec<(PathBuf, String)>,
    /// Discovered file counts per extension, for the ingestion log.
    pub by_extension: BTreeMap<String, usize>,
}

/// Clone the corpus repository if it doesn't exist, or pull the latest changes.
///
/// Blocking; callers on the async path wrap this in `spawn_blocking`.
pub fn sync_repo(corpus: &CorpusConfig, repo_dir: &Path) -> Result<(), OrchestratorError> {
    let result = if repo_dir.join(".git").exists() {
        info!(dir = %repo_dir.display(), "corpus repository exists, pulling latest changes");
        git_pull(repo_dir, &corpus.branch)
    } else {
        info!(url = %corpus.url, "cloning corpus repository");
        git_clone(&corpus.url, &corpus.branch, repo_dir)
    };

    result.map_err(|e| OrchestratorError::Ingestion(format!("corpus sync: {e:#}")))
}

fn git_clone(url: &str, branch: &str, dest: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create repo directory: {}", dest.display()))?;

    let output = Command::new("git")
        .args(["clone", "--branch", branch, "--single-branch", "--depth", "1"])
        .arg(url)
        .arg(dest)
        .output()
        .with_context(|| "Failed to execute 'git clone'. Is git installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git clone failed: {}", stderr.trim());
    }

    Ok(())
}

fn git_pull(repo_dir: &Path, branch: &str) -> anyhow::Result<()> {
    let output = Command::new("git")
        .args(["fetch", "origin", branch])
        .current_dir(repo_dir)
        .output()
        .with_context(|| "Failed to execute 'git fetch'")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git fetch failed: {}", stderr.trim());
    }

    let remote_ref = format!("origin/{}", branch);
    let output = Command::new("git")
        .args(["reset", "--hard", &remote_ref])
        .current_dir(repo_dir)
        .output()
        .with_context(|| "Failed to execute 'git reset'")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git reset failed: {}", stderr.trim());
    }

    Ok(())
}

/// Flatten a corpus-relative path into a collision-free text-unit name.
///
/// `guides/setup/install.md` becomes `guides_setup_install.txt`; a
/// top-level `readme.md` stays `readme.txt`.
pub fn flatten_name(relative: &Path) -> String {
    let stem = relative
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let mut parts: Vec<String> = relative
        .parent()
        .into_iter()
        .flat_map(|p| p.components())
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    parts.push(stem);

    format!("{}.txt", parts.join("_"))
}

/// Convert every matching document under `corpus_dir` into a text unit in
/// `input_dir`.
///
/// Unchanged outputs are left untouched so their modification identity is
/// preserved across idempotent builds. Fails with zero successful outputs.
pub fn convert_corpus(
    corpus: &CorpusConfig,
    corpus_dir: &Path,
    input_dir: &Path,
) -> Result<ConversionReport, OrchestratorError> {
    if !corpus_dir.exists() {
        return Err(OrchestratorError::Ingestion(format!(
            "corpus directory does not exist: {}",
            corpus_dir.display()
        )));
    }

    std::fs::create_dir_all(input_dir).map_err(|e| {
        OrchestratorError::Ingestion(format!(
            "failed to create input area {}: {e}",
            input_dir.display()
        ))
    })?;

    let include_set = build_globset(&corpus.include_globs)?;
    let mut default_excludes = vec!["**/.git/**".to_string(), "**/node_modules/**".to_string()];
    default_excludes.extend(corpus.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut report = ConversionReport::default();

    for entry in WalkDir::new(corpus_dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable corpus entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(corpus_dir).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }

        let ext = relative
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "none".to_string());
        *report.by_extension.entry(ext).or_insert(0) += 1;

        if !include_set.is_match(&rel_str) {
            continue;
        }

        match convert_file(path, relative, input_dir) {
            Ok(unit) => {
                debug!(source = %unit.source_path.display(), unit = %unit.file_name, "converted document");
                report.units.push(unit);
            }
            Err(e) => {
                error!(file = %rel_str, error = %e, "failed to convert document");
                report.failed.push((relative.to_path_buf(), e.to_string()));
            }
        }
    }

    report.units.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    for (ext, count) in &report.by_extension {
        info!(extension = %ext, count = *count, "discovered corpus files");
    }
    info!(
        converted = report.units.len(),
        failed = report.failed.len(),
        "corpus conversion finished"
    );

    if report.units.is_empty() {
        return Err(OrchestratorError::Ingestion(format!(
            "no text units produced from {}",
            corpus_dir.display()
        )));
    }

    Ok(report)
}

fn convert_file(path: &Path, relative: &Path, input_dir: &Path) -> anyhow::Result<TextUnit> {
    let markdown = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let text = markdown_to_text(&markdown);

    let file_name = flatten_name(relative);
    let out_path = input_dir.join(&file_name);

    // Leave byte-identical outputs untouched so repeat builds keep their
    // modification identity.
    if !is_unchanged(&out_path, &text) {
        std::fs::write(&out_path, &text)
            .with_context(|| format!("Failed to write {}", out_path.display()))?;
    }

    Ok(TextUnit {
        source_path: relative.to_path_buf(),
        file_name,
    })
}

fn is_unchanged(out_path: &Path, text: &str) -> bool {
    let Ok(existing) = std::fs::read(out_path) else {
        return false;
    };
    Sha256::digest(&existing) == Sha256::digest(text.as_bytes())
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, OrchestratorError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            OrchestratorError::Ingestion(format!("invalid corpus glob '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| OrchestratorError::Ingestion(format!("invalid corpus globs: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn corpus_config() -> CorpusConfig {
        CorpusConfig {
            url: "https://example.com/docs.git".to_string(),
            branch: "main".to_string(),
            include_globs: vec!["**/*.md".to_string()],
            exclude_globs: Vec::new(),
        }
    }

    #[test]
    fn test_flatten_name_top_level() {
        assert_eq!(flatten_name(Path::new("readme.md")), "readme.txt");
    }

    #[test]
    fn test_flatten_name_nested() {
        assert_eq!(
            flatten_name(Path::new("guides/setup/install.md")),
            "guides_setup_install.txt"
        );
    }

    #[test]
    fn test_converts_nested_corpus() {
        let tmp = TempDir::new().unwrap();
        let corpus_dir = tmp.path().join("repo");
        let nested = corpus_dir.join("guides");
        std::fs::create_dir_all(&nested).unwrap();

        std::fs::write(corpus_dir.join("intro.md"), "# Intro\n\nWelcome.").unwrap();
        std::fs::write(corpus_dir.join("faq.md"), "# FAQ\n\nQuestions.").unwrap();
        std::fs::write(nested.join("setup.md"), "# Setup\n\nSteps.").unwrap();

        let input_dir = tmp.path().join("input");
        let report = convert_corpus(&corpus_config(), &corpus_dir, &input_dir).unwrap();

        assert_eq!(report.units.len(), 3);
        assert!(report.failed.is_empty());

        let names: Vec<&str> = report.units.iter().map(|u| u.file_name.as_str()).collect();
        assert_eq!(names, vec!["faq.txt", "guides_setup.txt", "intro.txt"]);
        assert_eq!(
            std::fs::read_to_string(input_dir.join("guides_setup.txt")).unwrap(),
            "Setup Steps."
        );
    }

    #[test]
    fn test_empty_corpus_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let corpus_dir = tmp.path().join("repo");
        std::fs::create_dir_all(&corpus_dir).unwrap();
        std::fs::write(corpus_dir.join("notes.rst"), "not markdown").unwrap();

        let err =
            convert_corpus(&corpus_config(), &corpus_dir, &tmp.path().join("input")).unwrap_err();
        assert!(matches!(err, OrchestratorError::Ingestion(_)));
    }

    #[test]
    fn test_bad_file_is_skipped_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let corpus_dir = tmp.path().join("repo");
        std::fs::create_dir_all(&corpus_dir).unwrap();

        std::fs::write(corpus_dir.join("good.md"), "# Good\n\nFine.").unwrap();
        // Invalid UTF-8 fails read_to_string for this file only.
        std::fs::write(corpus_dir.join("broken.md"), [0xff, 0xfe, 0x00, 0x01]).unwrap();

        let report =
            convert_corpus(&corpus_config(), &corpus_dir, &tmp.path().join("input")).unwrap();
        assert_eq!(report.units.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, Path::new("broken.md"));
    }

    #[test]
    fn test_unchanged_output_not_rewritten() {
        let tmp = TempDir::new().unwrap();
        let corpus_dir = tmp.path().join("repo");
        std::fs::create_dir_all(&corpus_dir).unwrap();
        std::fs::write(corpus_dir.join("doc.md"), "# Doc\n\nBody.").unwrap();

        let input_dir = tmp.path().join("input");
        convert_corpus(&corpus_config(), &corpus_dir, &input_dir).unwrap();
        let first = std::fs::metadata(input_dir.join("doc.txt"))
            .unwrap()
            .modified()
            .unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        convert_corpus(&corpus_config(), &corpus_dir, &input_dir).unwrap();
        let second = std::fs::metadata(input_dir.join("doc.txt"))
            .unwrap()
            .modified()
            .unwrap();

        assert_eq!(first, second);
    }
}
