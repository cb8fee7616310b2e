//! Owns every [`Song`] and [`Tag`] and the bidirectional relationship
//! between them.
//!
//! Songs live in a `Vec` so catalog order is insertion order; a hash lookup
//! keyed by normalized path resolves song identity. Tags are kept in a
//! `BTreeMap` so tag iteration is deterministic by ID. The relationship
//! invariant maintained by every mutator: `tag.id ∈ song.tags` exactly when
//! `song.key ∈ tag.songs`, both sides updated within one call.

use crate::error::{EngineError, Result};
use crate::model::{self, Song, SongKey, Tag, TagId};
use crate::project::{ProjectSnapshot, SongRecord, TagRecord};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

#[derive(Debug, Default)]
pub struct Catalog {
    songs: Vec<Song>,
    lookup: HashMap<SongKey, usize>,
    tags: BTreeMap<TagId, Tag>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All songs, in insertion order.
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    /// All tags, ordered by ID.
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }

    pub fn tag(&self, id: TagId) -> Option<&Tag> {
        self.tags.get(&id)
    }

    pub fn song(&self, key: &str) -> Option<&Song> {
        self.lookup.get(key).map(|&idx| &self.songs[idx])
    }

    pub fn song_by_path(&self, path: &Path) -> Option<&Song> {
        self.song(&model::song_key(path))
    }

    pub fn song_count(&self) -> usize {
        self.songs.len()
    }

    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty() && self.tags.is_empty()
    }

    fn next_tag_id(&self) -> TagId {
        self.tags.keys().next_back().map_or(0, |id| id + 1)
    }

    pub fn create_tag(&mut self, name: &str, category: &str) -> Result<TagId> {
        validate_tag_fields(name, category)?;
        let id = self.next_tag_id();
        self.tags.insert(id, Tag::new(id, name, category));
        Ok(id)
    }

    /// Overwrite a tag's name and category in place; relationship edges are
    /// unaffected.
    pub fn update_tag(&mut self, id: TagId, name: &str, category: &str) -> Result<()> {
        validate_tag_fields(name, category)?;
        let tag = self.tags.get_mut(&id).ok_or(EngineError::TagNotFound(id))?;
        tag.name = name.trim().to_string();
        tag.category = category.trim().to_string();
        Ok(())
    }

    /// Remove a tag, unlinking it from every referencing song first so no
    /// song is left pointing at a deleted tag.
    pub fn remove_tag(&mut self, id: TagId) -> Result<Tag> {
        let tag = self.tags.remove(&id).ok_or(EngineError::TagNotFound(id))?;
        for key in &tag.songs {
            if let Some(&idx) = self.lookup.get(key) {
                self.songs[idx].tags.remove(&id);
            }
        }
        Ok(tag)
    }

    /// Register a song under its normalized path. Re-adding an existing path
    /// returns the existing key and leaves the song untouched.
    pub fn add_song(&mut self, path: &Path, was_tagged: bool) -> Result<SongKey> {
        if !model::is_audio_file(path) {
            return Err(EngineError::UnsupportedFile(path.to_path_buf()));
        }

        let key = model::song_key(path);
        if self.lookup.contains_key(&key) {
            return Ok(key);
        }

        let mut song = Song::new(model::normalize_path(path));
        song.was_tagged = was_tagged;
        self.lookup.insert(key.clone(), self.songs.len());
        self.songs.push(song);
        Ok(key)
    }

    /// Link one tag to one song, updating both sides of the relationship.
    pub fn add_tag_to_song(&mut self, key: &str, id: TagId) -> Result<()> {
        let tag = self.tags.get_mut(&id).ok_or(EngineError::TagNotFound(id))?;
        let &idx = self
            .lookup
            .get(key)
            .ok_or_else(|| EngineError::SongNotFound(key.into()))?;

        if !tag.songs.iter().any(|entry| entry == key) {
            tag.songs.push(key.to_string());
        }
        self.songs[idx].tags.insert(id);
        Ok(())
    }

    /// Detach a song from every tag it carries, both sides in one step.
    pub fn remove_song_from_all_tags(&mut self, key: &str) -> Result<()> {
        let &idx = self
            .lookup
            .get(key)
            .ok_or_else(|| EngineError::SongNotFound(key.into()))?;

        for id in std::mem::take(&mut self.songs[idx].tags) {
            if let Some(tag) = self.tags.get_mut(&id) {
                tag.songs.retain(|entry| entry != key);
            }
        }
        Ok(())
    }

    /// Attach every tag to every song. With `overwrite`, existing tags are
    /// detached first. Tagged songs are marked for persistence.
    pub fn assign_tags(&mut self, songs: &[SongKey], tags: &[TagId], overwrite: bool) -> Result<()> {
        for id in tags {
            if !self.tags.contains_key(id) {
                return Err(EngineError::TagNotFound(*id));
            }
        }
        for key in songs {
            if !self.lookup.contains_key(key) {
                return Err(EngineError::SongNotFound(key.into()));
            }
        }

        if overwrite {
            for key in songs {
                self.remove_song_from_all_tags(key)?;
            }
        }

        for &id in tags {
            for key in songs {
                self.add_tag_to_song(key, id)?;
            }
        }
        for key in songs {
            let idx = self.lookup[key];
            self.songs[idx].was_tagged = true;
        }
        Ok(())
    }

    /// Remove a song from the catalog and from every tag's back-references.
    /// Playlist and navigator cleanup is the engine facade's half of this
    /// operation.
    pub fn remove_song(&mut self, key: &str) -> Result<Song> {
        self.remove_song_from_all_tags(key)?;
        let idx = self
            .lookup
            .remove(key)
            .ok_or_else(|| EngineError::SongNotFound(key.into()))?;
        let song = self.songs.remove(idx);
        self.rebuild_lookup();
        Ok(song)
    }

    pub fn clear(&mut self) {
        self.songs.clear();
        self.lookup.clear();
        self.tags.clear();
    }

    fn rebuild_lookup(&mut self) {
        self.lookup = self
            .songs
            .iter()
            .enumerate()
            .map(|(idx, song)| (song.key(), idx))
            .collect();
    }

    /// Export tags and tagged songs with their edge lists. Untagged imports
    /// are skipped, matching what the project writer persists.
    pub fn snapshot(&self) -> ProjectSnapshot {
        let tags = self
            .tags
            .values()
            .map(|tag| TagRecord {
                id: tag.id,
                name: tag.name.clone(),
                category: tag.category.clone(),
            })
            .collect();

        let songs = self
            .songs
            .iter()
            .filter(|song| song.was_tagged)
            .map(|song| SongRecord {
                path: song.path.clone(),
                tag_ids: song.tags.iter().copied().collect(),
            })
            .collect();

        ProjectSnapshot { tags, songs }
    }

    /// Rebuild a catalog from a loaded project. The snapshot carries edges
    /// as tag IDs only; the bidirectional index is reconstructed here, not
    /// by the loader. Edges naming unknown tags are dropped.
    pub fn from_snapshot(snapshot: &ProjectSnapshot) -> Self {
        let mut catalog = Self::new();

        for record in &snapshot.tags {
            catalog
                .tags
                .insert(record.id, Tag::new(record.id, &record.name, &record.category));
        }

        for record in &snapshot.songs {
            let key = model::song_key(&record.path);
            if !catalog.lookup.contains_key(&key) {
                catalog.lookup.insert(key.clone(), catalog.songs.len());
                catalog
                    .songs
                    .push(Song::new(model::normalize_path(&record.path)));
            }
            for &id in &record.tag_ids {
                if catalog.tags.contains_key(&id) {
                    // Both sides rebuilt from the edge list.
                    let _ = catalog.add_tag_to_song(&key, id);
                }
            }
        }

        catalog
    }

    /// Check the relationship invariant in both directions.
    #[cfg(test)]
    pub(crate) fn relationship_is_consistent(&self) -> bool {
        let forward = self.songs.iter().all(|song| {
            song.tags.iter().all(|id| {
                self.tags
                    .get(id)
                    .is_some_and(|tag| tag.songs.iter().any(|key| *key == song.key()))
            })
        });
        let backward = self.tags.values().all(|tag| {
            tag.songs.iter().all(|key| {
                self.song(key)
                    .is_some_and(|song| song.tags.contains(&tag.id))
            })
        });
        forward && backward
    }
}

fn validate_tag_fields(name: &str, category: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(EngineError::InvalidTag { field: "name" });
    }
    if category.trim().is_empty() {
        return Err(EngineError::InvalidTag { field: "category" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn catalog_with_songs(names: &[&str]) -> (Catalog, Vec<SongKey>) {
        let mut catalog = Catalog::new();
        let keys = names
            .iter()
            .map(|name| {
                catalog
                    .add_song(&PathBuf::from(format!("{name}.mp3")), true)
                    .expect("add song")
            })
            .collect();
        (catalog, keys)
    }

    #[test]
    fn tag_ids_are_max_plus_one() {
        let mut catalog = Catalog::new();
        assert_eq!(catalog.create_tag("Rock", "Genre").expect("create"), 0);
        assert_eq!(catalog.create_tag("Pop", "Genre").expect("create"), 1);

        catalog.remove_tag(0).expect("remove");
        // Highest surviving ID is 1, so the next one is 2.
        assert_eq!(catalog.create_tag("Jazz", "Genre").expect("create"), 2);
    }

    #[test]
    fn first_tag_id_is_zero() {
        let mut catalog = Catalog::new();
        assert_eq!(catalog.create_tag("Rock", "Genre").expect("create"), 0);
    }

    #[test]
    fn empty_tag_fields_are_rejected_without_mutation() {
        let mut catalog = Catalog::new();
        assert!(matches!(
            catalog.create_tag("", "Genre"),
            Err(EngineError::InvalidTag { field: "name" })
        ));
        assert!(matches!(
            catalog.create_tag("Rock", "  "),
            Err(EngineError::InvalidTag { field: "category" })
        ));
        assert_eq!(catalog.tag_count(), 0);
    }

    #[test]
    fn update_tag_keeps_edges() {
        let (mut catalog, keys) = catalog_with_songs(&["a"]);
        let id = catalog.create_tag("Rok", "Genre").expect("create");
        catalog.add_tag_to_song(&keys[0], id).expect("link");

        catalog.update_tag(id, "Rock", "Genre").expect("update");
        assert_eq!(catalog.tag(id).expect("tag").name, "Rock");
        assert_eq!(catalog.tag(id).expect("tag").songs, keys);
        assert!(catalog.relationship_is_consistent());
    }

    #[test]
    fn update_missing_tag_reports_not_found() {
        let mut catalog = Catalog::new();
        assert!(matches!(
            catalog.update_tag(9, "Rock", "Genre"),
            Err(EngineError::TagNotFound(9))
        ));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let mut catalog = Catalog::new();
        assert!(matches!(
            catalog.add_song(Path::new("notes.txt"), true),
            Err(EngineError::UnsupportedFile(_))
        ));
    }

    #[test]
    fn re_adding_a_song_is_idempotent() {
        let mut catalog = Catalog::new();
        let first = catalog.add_song(Path::new("a.mp3"), false).expect("add");
        let second = catalog.add_song(Path::new("a.mp3"), true).expect("add");
        assert_eq!(first, second);
        assert_eq!(catalog.song_count(), 1);
        // The existing flag survives a duplicate add.
        assert!(!catalog.song(&first).expect("song").was_tagged);
    }

    #[test]
    fn linking_updates_both_sides() {
        let (mut catalog, keys) = catalog_with_songs(&["a", "b"]);
        let rock = catalog.create_tag("Rock", "Genre").expect("create");

        catalog.add_tag_to_song(&keys[0], rock).expect("link");
        catalog.add_tag_to_song(&keys[0], rock).expect("relink");

        let tag = catalog.tag(rock).expect("tag");
        assert_eq!(tag.songs, vec![keys[0].clone()]);
        assert!(catalog.song(&keys[0]).expect("song").tags.contains(&rock));
        assert!(catalog.song(&keys[1]).expect("song").tags.is_empty());
        assert!(catalog.relationship_is_consistent());
    }

    #[test]
    fn removing_a_tag_unlinks_every_song() {
        let (mut catalog, keys) = catalog_with_songs(&["a", "b"]);
        let rock = catalog.create_tag("Rock", "Genre").expect("create");
        catalog
            .assign_tags(&keys, &[rock], false)
            .expect("assign");

        catalog.remove_tag(rock).expect("remove");
        assert!(catalog.songs().iter().all(|song| song.tags.is_empty()));
        assert!(catalog.relationship_is_consistent());
    }

    #[test]
    fn removing_missing_tag_reports_not_found() {
        let mut catalog = Catalog::new();
        assert!(matches!(
            catalog.remove_tag(3),
            Err(EngineError::TagNotFound(3))
        ));
    }

    #[test]
    fn assign_with_overwrite_replaces_old_tags() {
        let (mut catalog, keys) = catalog_with_songs(&["a"]);
        let rock = catalog.create_tag("Rock", "Genre").expect("create");
        let pop = catalog.create_tag("Pop", "Genre").expect("create");
        catalog.assign_tags(&keys, &[rock], false).expect("assign");

        catalog.assign_tags(&keys, &[pop], true).expect("overwrite");
        let song = catalog.song(&keys[0]).expect("song");
        assert!(!song.tags.contains(&rock));
        assert!(song.tags.contains(&pop));
        assert!(catalog.tag(rock).expect("tag").songs.is_empty());
        assert!(catalog.relationship_is_consistent());
    }

    #[test]
    fn assign_marks_songs_as_tagged() {
        let mut catalog = Catalog::new();
        let key = catalog.add_song(Path::new("a.mp3"), false).expect("add");
        let rock = catalog.create_tag("Rock", "Genre").expect("create");

        catalog
            .assign_tags(&[key.clone()], &[rock], false)
            .expect("assign");
        assert!(catalog.song(&key).expect("song").was_tagged);
    }

    #[test]
    fn removing_a_song_clears_back_references() {
        let (mut catalog, keys) = catalog_with_songs(&["a", "b", "c"]);
        let rock = catalog.create_tag("Rock", "Genre").expect("create");
        catalog.assign_tags(&keys, &[rock], false).expect("assign");

        catalog.remove_song(&keys[1]).expect("remove");
        assert_eq!(catalog.song_count(), 2);
        assert!(catalog.song(&keys[1]).is_none());
        assert!(
            catalog
                .tag(rock)
                .expect("tag")
                .songs
                .iter()
                .all(|key| *key != keys[1])
        );
        // Lookup still resolves the shifted songs.
        assert!(catalog.song(&keys[0]).is_some());
        assert!(catalog.song(&keys[2]).is_some());
        assert!(catalog.relationship_is_consistent());
    }

    #[test]
    fn snapshot_skips_untagged_imports() {
        let mut catalog = Catalog::new();
        let tagged = catalog.add_song(Path::new("a.mp3"), true).expect("add");
        catalog.add_song(Path::new("b.mp3"), false).expect("add");
        let rock = catalog.create_tag("Rock", "Genre").expect("create");
        catalog.add_tag_to_song(&tagged, rock).expect("link");

        let snapshot = catalog.snapshot();
        assert_eq!(snapshot.songs.len(), 1);
        assert_eq!(snapshot.songs[0].tag_ids, vec![rock]);
        assert_eq!(snapshot.tags.len(), 1);
    }

    #[test]
    fn restore_rebuilds_bidirectional_index_and_skips_unknown_edges() {
        let snapshot = ProjectSnapshot {
            tags: vec![TagRecord {
                id: 4,
                name: "Rock".into(),
                category: "Genre".into(),
            }],
            songs: vec![SongRecord {
                path: PathBuf::from("a.mp3"),
                tag_ids: vec![4, 99],
            }],
        };

        let catalog = Catalog::from_snapshot(&snapshot);
        assert_eq!(catalog.song_count(), 1);
        let song = &catalog.songs()[0];
        assert_eq!(song.tags.iter().copied().collect::<Vec<_>>(), vec![4]);
        assert_eq!(catalog.tag(4).expect("tag").songs, vec![song.key()]);
        assert!(catalog.relationship_is_consistent());
        // IDs continue after the highest restored one.
        let mut catalog = catalog;
        assert_eq!(catalog.create_tag("Pop", "Genre").expect("create"), 5);
    }
}
