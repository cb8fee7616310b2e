//! The engine facade.
//!
//! One explicitly owned instance wires the catalog, the import list and the
//! navigator together and is the only API the UI layer talks to. Every
//! command leaves playlist, shuffle order and navigator indices mutually
//! consistent before it returns; no caller can observe a half-updated
//! state.

use crate::audio::{MediaPlayback, NullPlayback, RodioPlayback};
use crate::catalog::Catalog;
use crate::error::{EngineError, Result};
use crate::filter;
use crate::import::{self, ImportList};
use crate::model::{self, FilterMode, Song, SongKey, Tag, TagId};
use crate::navigator::Navigator;
use crate::project::ProjectSnapshot;
use crate::shuffle;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct Engine {
    catalog: Catalog,
    import: ImportList,
    navigator: Navigator,
    rng: SmallRng,
}

impl Engine {
    pub fn new(backend: Box<dyn MediaPlayback>) -> Self {
        Self {
            catalog: Catalog::new(),
            import: ImportList::new(),
            navigator: Navigator::new(backend),
            rng: SmallRng::from_os_rng(),
        }
    }

    /// System audio output when available, the logical-clock backend
    /// otherwise.
    pub fn with_default_backend() -> Self {
        let backend: Box<dyn MediaPlayback> = match RodioPlayback::new() {
            Ok(backend) => Box::new(backend),
            Err(_) => Box::new(NullPlayback::new()),
        };
        Self::new(backend)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn import(&self) -> &[SongKey] {
        self.import.keys()
    }

    pub fn playlist(&self) -> &[PathBuf] {
        self.navigator.playlist()
    }

    pub fn current_song(&self) -> Option<&Path> {
        self.navigator.current_song()
    }

    pub fn preview_song(&self) -> Option<&Path> {
        self.navigator.preview_song()
    }

    pub fn sequential_index(&self) -> Option<usize> {
        self.navigator.sequential_index()
    }

    pub fn random_index(&self) -> Option<usize> {
        self.navigator.random_index()
    }

    pub fn is_playing(&self) -> bool {
        self.navigator.is_playing()
    }

    pub fn random(&self) -> bool {
        self.navigator.random()
    }

    pub fn set_random(&mut self, random: bool) {
        self.navigator.set_random(random);
    }

    pub fn repeat(&self) -> bool {
        self.navigator.repeat()
    }

    pub fn set_repeat(&mut self, repeat: bool) {
        self.navigator.set_repeat(repeat);
    }

    pub fn position(&self) -> Option<Duration> {
        self.navigator.position()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.navigator.duration()
    }

    pub fn create_tag(&mut self, name: &str, category: &str) -> Result<TagId> {
        self.catalog.create_tag(name, category)
    }

    pub fn update_tag(&mut self, id: TagId, name: &str, category: &str) -> Result<()> {
        self.catalog.update_tag(id, name, category)
    }

    /// The playlist keeps its songs when a tag disappears; only the next
    /// filter build reflects the change.
    pub fn remove_tag(&mut self, id: TagId) -> Result<Tag> {
        self.catalog.remove_tag(id)
    }

    pub fn add_song(&mut self, path: &Path) -> Result<SongKey> {
        self.catalog.add_song(path, true)
    }

    /// Attach tags to songs. `remove_from_import` drops the songs from the
    /// import list afterwards, `overwrite` replaces their old tags.
    pub fn assign_tags(
        &mut self,
        songs: &[SongKey],
        tags: &[TagId],
        remove_from_import: bool,
        overwrite: bool,
    ) -> Result<()> {
        self.catalog.assign_tags(songs, tags, overwrite)?;
        if remove_from_import {
            self.remove_from_import(songs);
        }
        Ok(())
    }

    /// Remove a song everywhere: tag back-references, import list, playlist
    /// and shuffle order. If it is the active or previewed song, playback
    /// stops as part of the same operation.
    pub fn remove_song(&mut self, path: &Path) -> Result<Song> {
        let key = model::song_key(path);
        let song = self.catalog.remove_song(&key)?;
        self.navigator.remove_song(&song.path);
        self.import.remove(&key);
        Ok(song)
    }

    /// Stage files for tagging. Paths that do not exist or are not
    /// supported audio are skipped; new songs enter the catalog untagged.
    /// Returns how many entries the import list gained.
    pub fn import_paths(&mut self, paths: &[PathBuf]) -> usize {
        let mut added = 0;
        for path in paths {
            let normalized = model::normalize_path(path);
            if !normalized.is_file() {
                continue;
            }
            let Ok(key) = self.catalog.add_song(&normalized, false) else {
                continue;
            };
            if self.import.add(key) {
                added += 1;
            }
        }
        added
    }

    pub fn import_folder(&mut self, root: &Path) -> usize {
        self.import_paths(&import::scan_folder(root))
    }

    /// Drop entries from the import list, stopping playback first when one
    /// of them is being previewed.
    pub fn remove_from_import(&mut self, keys: &[SongKey]) {
        if let Some(preview) = self.navigator.preview_song() {
            let preview_key = model::song_key(preview);
            if keys.contains(&preview_key) {
                self.navigator.stop();
            }
        }
        for key in keys {
            self.import.remove(key);
        }
    }

    /// Drop every import entry that already carries at least one tag.
    pub fn clear_tagged_imports(&mut self) {
        let catalog = &self.catalog;
        self.import
            .retain(|key| catalog.song(key).is_some_and(|song| song.tags.is_empty()));
    }

    /// Filter the catalog into a fresh playlist with a fresh shuffle order.
    /// The previous playlist is discarded and playback stops.
    pub fn build_playlist(
        &mut self,
        filter_tags: &BTreeSet<TagId>,
        mode: FilterMode,
    ) -> Result<&[PathBuf]> {
        for &id in filter_tags {
            if self.catalog.tag(id).is_none() {
                return Err(EngineError::TagNotFound(id));
            }
        }

        let playlist = filter::build(&self.catalog, filter_tags, mode);
        let random_order = shuffle::generate(playlist.len(), &mut self.rng);
        self.navigator.install_playlist(playlist, random_order);
        Ok(self.navigator.playlist())
    }

    pub fn play(&mut self) {
        self.navigator.play();
    }

    pub fn pause(&mut self) {
        self.navigator.pause();
    }

    pub fn stop(&mut self) {
        self.navigator.stop();
    }

    pub fn next(&mut self) {
        self.navigator.next();
    }

    pub fn previous(&mut self) {
        self.navigator.previous();
    }

    pub fn first(&mut self) {
        self.navigator.first();
    }

    pub fn last(&mut self) {
        self.navigator.last();
    }

    pub fn seek_to(&mut self, position: Duration) {
        self.navigator.seek_to(position);
    }

    pub fn jump_to(&mut self, path: &Path) -> Result<()> {
        let song = self
            .catalog
            .song_by_path(path)
            .ok_or_else(|| EngineError::SongNotFound(path.to_path_buf()))?;
        let target = song.path.clone();
        self.navigator.jump_to(&target);
        Ok(())
    }

    pub fn play_preview(&mut self, path: &Path) -> Result<()> {
        let song = self
            .catalog
            .song_by_path(path)
            .ok_or_else(|| EngineError::SongNotFound(path.to_path_buf()))?;
        let target = song.path.clone();
        self.navigator.play_preview(&target);
        Ok(())
    }

    /// Driven by the external timer; advances or unwinds finished tracks.
    pub fn tick(&mut self) {
        self.navigator.tick();
    }

    pub fn snapshot(&self) -> ProjectSnapshot {
        self.catalog.snapshot()
    }

    /// Replace the whole catalog from a loaded project, rebuilding the
    /// tag↔song index from the snapshot's edge lists. Playback state and
    /// the import list do not survive a project switch.
    pub fn restore(&mut self, snapshot: &ProjectSnapshot) {
        self.navigator.install_playlist(Vec::new(), Vec::new());
        self.import.clear();
        self.catalog = Catalog::from_snapshot(snapshot);
    }

    /// Empty everything, as when starting a new project.
    pub fn clear(&mut self) {
        self.navigator.install_playlist(Vec::new(), Vec::new());
        self.import.clear();
        self.catalog.clear();
    }
}
