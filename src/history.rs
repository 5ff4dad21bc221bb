//! Persisted download history: a newest-first, capped list mirrored to a
//! JSON file in the platform data directory.

use std::fs;
use std::path::PathBuf;

use chrono::Local;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Upper bound on persisted entries; the oldest fall off the end.
pub const MAX_ENTRIES: usize = 50;

const FILE_NAME: &str = "download_history.json";

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not write history file: {0}")]
    Write(#[from] std::io::Error),
    #[error("could not encode history: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One past download attempt, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub title: String,
    pub quality: String,
    pub timestamp: String,
    pub url: String,
    pub success: bool,
}

impl HistoryEntry {
    /// Stamps the entry with the current local time.
    pub fn new(
        title: impl Into<String>,
        quality: &str,
        url: impl Into<String>,
        success: bool,
    ) -> Self {
        Self {
            title: title.into(),
            quality: quality.to_string(),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            url: url.into(),
            success,
        }
    }
}

/// Newest-first list of download attempts, rewritten to disk after every
/// change.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    /// Opens the store at `path`, starting empty when the file is missing
    /// or unreadable.
    pub fn load(path: PathBuf) -> Self {
        let entries = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self { path, entries }
    }

    /// Default on-disk location.
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("", "", "tubegrab")
            .map(|dirs| dirs.data_dir().join(FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(FILE_NAME))
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Prepends an entry, trims to [`MAX_ENTRIES`], and rewrites the file.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(MAX_ENTRIES);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    fn persist(&self) {
        if let Err(error) = self.save() {
            warn!(%error, path = %self.path.display(), "failed to save download history");
        }
    }

    fn save(&self) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn entry(n: usize) -> HistoryEntry {
        HistoryEntry {
            title: format!("video {n}"),
            quality: "720p".to_string(),
            timestamp: "2026-01-01 12:00:00".to_string(),
            url: format!("https://youtu.be/{n}"),
            success: n % 2 == 0,
        }
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::load(dir.path().join(FILE_NAME));
        assert!(store.is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        fs::write(&path, "{not json").unwrap();
        let store = HistoryStore::load(path);
        assert!(store.is_empty());
    }

    #[test]
    fn push_is_newest_first_and_capped() {
        let dir = tempdir().unwrap();
        let mut store = HistoryStore::load(dir.path().join(FILE_NAME));
        for n in 0..MAX_ENTRIES + 10 {
            store.push(entry(n));
        }
        assert_eq!(store.entries().len(), MAX_ENTRIES);
        // last push is first, the earliest ten fell off
        assert_eq!(store.entries()[0], entry(MAX_ENTRIES + 9));
        assert_eq!(store.entries()[MAX_ENTRIES - 1], entry(10));
    }

    #[test]
    fn round_trips_through_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        let mut store = HistoryStore::load(path.clone());
        for n in 0..5 {
            store.push(entry(n));
        }
        let reloaded = HistoryStore::load(path);
        assert_eq!(reloaded.entries(), store.entries());
    }

    #[test]
    fn clear_empties_the_file_too() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        let mut store = HistoryStore::load(path.clone());
        store.push(entry(1));
        store.clear();
        assert!(store.is_empty());
        assert!(HistoryStore::load(path).is_empty());
    }
}
