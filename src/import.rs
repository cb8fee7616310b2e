//! Staging area for freshly imported songs.
//!
//! Imported files wait here, untagged, until the user assigns tags or
//! discards them; preview playback typically auditions from this list. The
//! list stores song keys only; the catalog stays the single owner of the
//! songs themselves.

use crate::model::{self, SongKey};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Default)]
pub struct ImportList {
    entries: Vec<SongKey>,
}

impl ImportList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in import order.
    pub fn keys(&self) -> &[SongKey] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|entry| entry == key)
    }

    /// Append if absent; returns whether the key was new.
    pub fn add(&mut self, key: SongKey) -> bool {
        if self.contains(&key) {
            return false;
        }
        self.entries.push(key);
        true
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry != key);
        before != self.entries.len()
    }

    pub fn retain(&mut self, keep: impl FnMut(&SongKey) -> bool) {
        self.entries.retain(keep);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Collect every supported audio file under `root`, sorted by path.
pub fn scan_folder(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if entry.file_type().is_file() && model::is_audio_file(path) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    files
}
