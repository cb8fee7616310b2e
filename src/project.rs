//! Engine-side contract for project persistence.
//!
//! The on-disk project format (a `SongTags` section of tag definitions and
//! a `Songs` section whose children reference tags by ID only) is owned by
//! the external reader/writer. These records are what crosses that
//! boundary; rebuilding the bidirectional tag↔song index from the edge
//! lists is [`crate::catalog::Catalog::from_snapshot`]'s job, never the
//! loader's. The JSON helpers here cover local round-trips and tests.

use anyhow::{Context, Result};
use crate::model::TagId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: TagId,
    pub name: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRecord {
    pub path: PathBuf,
    /// Edge references by tag ID only.
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub tags: Vec<TagRecord>,
    pub songs: Vec<SongRecord>,
}

pub fn load(path: &Path) -> Result<ProjectSnapshot> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read project file {}", path.display()))?;
    let snapshot: ProjectSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse project file {}", path.display()))?;
    Ok(snapshot)
}

pub fn save(path: &Path, snapshot: &ProjectSnapshot) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
