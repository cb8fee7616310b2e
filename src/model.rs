use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg", "m4a", "aac", "opus"];

/// Unique identifier of a tag, assigned by the catalog on creation.
pub type TagId = u32;

/// Stable identity of a song: its normalized absolute path as a string.
pub type SongKey = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    /// OR within a tag category, AND across categories.
    Standard,
    /// A song must carry every filter tag.
    And,
    /// A song must carry at least one filter tag.
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Song {
    pub path: PathBuf,
    /// Display name, derived from the file stem.
    pub name: String,
    /// Untagged imports are skipped when the project is persisted.
    pub was_tagged: bool,
    pub tags: BTreeSet<TagId>,
}

impl Song {
    pub fn new(path: PathBuf) -> Self {
        let name = display_name(&path);
        Self {
            path,
            name,
            was_tagged: true,
            tags: BTreeSet::new(),
        }
    }

    pub fn key(&self) -> SongKey {
        song_key(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub category: String,
    /// Back-references to tagged songs, in the order they were tagged.
    pub songs: Vec<SongKey>,
}

impl Tag {
    pub fn new(id: TagId, name: &str, category: &str) -> Self {
        Self {
            id,
            name: name.trim().to_string(),
            category: category.trim().to_string(),
            songs: Vec::new(),
        }
    }
}

/// Canonicalize where possible, fall back to the path as given so that
/// not-yet-existing files still get a stable key.
pub fn normalize_path(path: &Path) -> PathBuf {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    strip_windows_verbatim_prefix(&canonical)
}

pub fn strip_windows_verbatim_prefix(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();

    if let Some(trimmed) = raw.strip_prefix(r"\\?\UNC\") {
        return PathBuf::from(format!(r"\\{trimmed}"));
    }

    if let Some(trimmed) = raw.strip_prefix(r"\\?\") {
        return PathBuf::from(trimmed);
    }

    path.to_path_buf()
}

pub fn song_key(path: &Path) -> SongKey {
    let normalized = normalize_path(path);
    let value = normalized.to_string_lossy();
    if cfg!(windows) {
        value.to_ascii_lowercase()
    } else {
        value.to_string()
    }
}

pub fn display_name(path: &Path) -> String {
    path.file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("unknown")
        .to_string()
}

pub fn is_audio_file(path: &Path) -> bool {
    let ext = path.extension().and_then(OsStr::to_str).unwrap_or_default();
    AUDIO_EXTENSIONS
        .iter()
        .any(|supported| ext.eq_ignore_ascii_case(supported))
}
