//! Result Snapshot Storage
//!
//! One JSON document per compound at `{results_dir}/{slug}/verified_patents.json`.
//! Snapshots are written to a temporary file in the same directory and then
//! renamed over the target, so a reader sees either the previous snapshot or
//! the new one, never a truncated file.

use crate::models::SearchResult;
use crate::types::{AppError, AppResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

const RESULTS_FILE: &str = "verified_patents.json";

/// Filesystem-safe directory name for a compound: alphanumerics, spaces,
/// `-` and `_` are kept, the rest dropped, spaces become underscores.
pub fn compound_slug(compound: &str) -> String {
    let kept: String = compound
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let slug = kept.trim().replace(' ', "_");

    if slug.is_empty() {
        "unnamed".to_string()
    } else {
        slug
    }
}

pub struct ResultStore {
    results_dir: PathBuf,
}

impl ResultStore {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    pub fn path_for(&self, compound: &str) -> PathBuf {
        self.results_dir.join(compound_slug(compound)).join(RESULTS_FILE)
    }

    /// Create the compound's directory ahead of the run
    pub fn prepare(&self, compound: &str) -> AppResult<PathBuf> {
        let path = self.path_for(compound);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| {
                AppError::Storage(format!("Failed to create results directory {:?}: {}", dir, e))
            })?;
        }
        Ok(path)
    }

    /// Atomically replace the compound's snapshot with `result`
    pub fn save(&self, result: &SearchResult) -> AppResult<PathBuf> {
        let path = self.prepare(&result.compound)?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        let content = serde_json::to_string_pretty(result)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path)
            .map_err(|e| AppError::Storage(format!("Failed to write {:?}: {}", path, e.error)))?;

        debug!(path = ?path, records = result.verified_patents.len(), "Saved result snapshot");
        Ok(path)
    }

    /// Read back the last snapshot for a compound, if any
    pub fn load(&self, compound: &str) -> AppResult<Option<SearchResult>> {
        let path = self.path_for(compound);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let result = serde_json::from_str(&content)
            .map_err(|e| AppError::Storage(format!("Corrupt snapshot {:?}: {}", path, e)))?;
        Ok(Some(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PatentCandidate, SearchQuery, VerifiedPatent};
    use tempfile::TempDir;

    #[test]
    fn test_compound_slug() {
        assert_eq!(
            compound_slug("3-(trifluoromethyl)pyridine-4-carboxamide"),
            "3-trifluoromethylpyridine-4-carboxamide"
        );
        assert_eq!(compound_slug("acetic acid "), "acetic_acid");
        assert_eq!(compound_slug("N,N-dimethyl formamide"), "NN-dimethyl_formamide");
        assert_eq!(compound_slug("()"), "unnamed");
    }

    #[test]
    fn test_path_for() {
        let store = ResultStore::new("results");
        assert_eq!(
            store.path_for("acetic acid"),
            PathBuf::from("results/acetic_acid/verified_patents.json")
        );
    }

    #[test]
    fn test_save_and_load_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let store = ResultStore::new(temp_dir.path());

        let query = SearchQuery::new("Caffeine", 20, "gpt-4.1");
        let mut result = SearchResult::new(&query, 1);
        result.push(VerifiedPatent::unverified(&PatentCandidate {
            patent_id: "US1".to_string(),
            title: "Foo".to_string(),
            relevancy: "High".to_string(),
        }));

        let path = store.save(&result).unwrap();
        assert!(path.ends_with("Caffeine/verified_patents.json"));

        let loaded = store.load("Caffeine").unwrap().unwrap();
        assert_eq!(loaded, result);
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let store = ResultStore::new(temp_dir.path());

        let query = SearchQuery::new("X", 20, "gpt-4.1");
        let mut result = SearchResult::new(&query, 0);
        store.save(&result).unwrap();
        result.mark_completed();
        store.save(&result).unwrap();

        let loaded = store.load("X").unwrap().unwrap();
        assert!(loaded.completed);

        // only the snapshot remains in the directory, no stray temp files
        let entries = fs::read_dir(temp_dir.path().join("X")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_non_ascii_preserved() {
        let temp_dir = TempDir::new().unwrap();
        let store = ResultStore::new(temp_dir.path());

        let query = SearchQuery::new("X", 20, "gpt-4.1");
        let mut result = SearchResult::new(&query, 1);
        result.push(VerifiedPatent::unverified(&PatentCandidate {
            patent_id: "CN1A".to_string(),
            title: "一种化合物的制备方法".to_string(),
            relevancy: String::new(),
        }));
        let path = store.save(&result).unwrap();

        let raw = fs::read_to_string(path).unwrap();
        assert!(raw.contains("一种化合物的制备方法"));
    }

    #[test]
    fn test_load_missing() {
        let temp_dir = TempDir::new().unwrap();
        let store = ResultStore::new(temp_dir.path());
        assert!(store.load("nothing").unwrap().is_none());
    }
}
