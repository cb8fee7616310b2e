//! Playback-navigation state machine.
//!
//! Drives sequential or shuffled traversal of the current playlist, plus a
//! preview mode that plays one song outside the queue. The navigator never
//! touches platform playback directly; an injected [`MediaPlayback`]
//! backend does the actual work. Indices are re-derived from
//! `(current, playlist, random_order)` on every transition that changes the
//! current song, so they can never go stale.

use crate::audio::MediaPlayback;
use crate::shuffle;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Below this elapsed position `previous()` changes track; at or above it,
/// it restarts the current one.
const PREVIOUS_RESTART_THRESHOLD: Duration = Duration::from_secs(1);

pub struct Navigator {
    playlist: Vec<PathBuf>,
    random_order: Vec<usize>,
    current: Option<PathBuf>,
    preview: Option<PathBuf>,
    seq_index: Option<usize>,
    rand_index: Option<usize>,
    paused: bool,
    random: bool,
    repeat: bool,
    backend: Box<dyn MediaPlayback>,
}

/// Sequential and shuffled position of `current`, by lookup. `None` when
/// the song is gone or was never part of the playlist.
pub(crate) fn derive_indices(
    current: Option<&Path>,
    playlist: &[PathBuf],
    random_order: &[usize],
) -> (Option<usize>, Option<usize>) {
    let seq = current.and_then(|song| playlist.iter().position(|entry| entry == song));
    let rand = seq.and_then(|seq| random_order.iter().position(|&entry| entry == seq));
    (seq, rand)
}

impl Navigator {
    pub fn new(backend: Box<dyn MediaPlayback>) -> Self {
        Self {
            playlist: Vec::new(),
            random_order: Vec::new(),
            current: None,
            preview: None,
            seq_index: None,
            rand_index: None,
            paused: false,
            random: true,
            repeat: true,
            backend,
        }
    }

    pub fn playlist(&self) -> &[PathBuf] {
        &self.playlist
    }

    pub fn random_order(&self) -> &[usize] {
        &self.random_order
    }

    pub fn current_song(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    pub fn preview_song(&self) -> Option<&Path> {
        self.preview.as_deref()
    }

    pub fn sequential_index(&self) -> Option<usize> {
        self.seq_index
    }

    pub fn random_index(&self) -> Option<usize> {
        self.rand_index
    }

    pub fn is_playing(&self) -> bool {
        self.preview.is_some() || (self.current.is_some() && !self.paused)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn random(&self) -> bool {
        self.random
    }

    pub fn set_random(&mut self, random: bool) {
        self.random = random;
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    pub fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
    }

    pub fn position(&self) -> Option<Duration> {
        self.backend.position()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.backend.duration()
    }

    /// Replace playlist and shuffle order wholesale. Always stops first:
    /// the old indices are meaningless against the new playlist.
    pub fn install_playlist(&mut self, playlist: Vec<PathBuf>, random_order: Vec<usize>) {
        debug_assert_eq!(playlist.len(), random_order.len());
        self.stop();
        self.playlist = playlist;
        self.random_order = random_order;
    }

    pub fn play(&mut self) {
        if self.preview.is_some() {
            self.backend.resume();
            return;
        }
        if self.current.is_some() {
            if self.paused {
                self.backend.resume();
                self.paused = false;
            }
            return;
        }
        if self.playlist.is_empty() {
            return;
        }

        self.paused = false;
        let seq = if self.random {
            self.random_order.first().copied()
        } else {
            Some(0)
        };
        if let Some(seq) = seq {
            self.activate(seq);
        }
    }

    pub fn pause(&mut self) {
        if self.preview.is_none() && self.current.is_some() && !self.paused {
            self.backend.pause();
            self.paused = true;
        }
    }

    pub fn stop(&mut self) {
        self.backend.stop();
        self.current = None;
        self.preview = None;
        self.seq_index = None;
        self.rand_index = None;
        self.paused = false;
    }

    pub fn next(&mut self) {
        if self.preview.is_some() {
            self.restart_track();
            return;
        }
        if self.current.is_none() || self.playlist.is_empty() {
            return;
        }

        if self.is_current_last() {
            if self.repeat {
                self.go_first();
            } else {
                self.stop();
            }
            return;
        }

        // A current song that fell out of the playlist has no indices; it
        // advances to the front of its axis, like `first()`.
        let seq = if self.random {
            let pos = self.rand_index.map_or(0, |idx| idx + 1);
            self.random_order.get(pos).copied()
        } else {
            Some(self.seq_index.map_or(0, |idx| idx + 1))
        };
        if let Some(seq) = seq {
            self.activate(seq);
        }
    }

    pub fn previous(&mut self) {
        if self.preview.is_some() {
            self.restart_track();
            return;
        }
        if self.current.is_none() || self.playlist.is_empty() {
            return;
        }

        if self
            .backend
            .position()
            .is_some_and(|pos| pos >= PREVIOUS_RESTART_THRESHOLD)
        {
            self.restart_track();
            return;
        }

        if self.is_current_first() {
            // Wraps to the last track whether or not repeat is on.
            self.go_last();
            return;
        }

        let seq = if self.random {
            self.rand_index
                .and_then(|idx| idx.checked_sub(1))
                .and_then(|pos| self.random_order.get(pos).copied())
        } else {
            self.seq_index.and_then(|idx| idx.checked_sub(1))
        };
        if let Some(seq) = seq {
            self.activate(seq);
        }
    }

    pub fn first(&mut self) {
        if self.preview.is_some() {
            self.restart_track();
            return;
        }
        if !self.playlist.is_empty() {
            self.go_first();
        }
    }

    pub fn last(&mut self) {
        if self.preview.is_some() {
            self.restart_track();
            return;
        }
        if !self.playlist.is_empty() {
            self.go_last();
        }
    }

    /// Explicit selection; leaves preview mode and enters active playback.
    /// A song outside the current playlist still plays, with no indices.
    pub fn jump_to(&mut self, song: &Path) {
        self.preview = None;
        self.paused = false;
        if let Some(seq) = self.playlist.iter().position(|entry| entry == song) {
            self.activate(seq);
        } else {
            self.start_detached(song);
        }
    }

    /// Audition one song outside the queue. Random/repeat have no effect
    /// here; a missing file makes this a no-op.
    pub fn play_preview(&mut self, song: &Path) {
        if !self.backend.exists(song) {
            log::warn!("cannot preview missing file {}", song.display());
            return;
        }
        match self.backend.play(song) {
            Ok(()) => self.preview = Some(song.to_path_buf()),
            Err(err) => log::warn!("failed to preview {}: {err:#}", song.display()),
        }
    }

    pub fn seek_to(&mut self, position: Duration) {
        if let Err(err) = self.backend.seek_to(position) {
            log::warn!("seek failed: {err:#}");
        }
    }

    /// Called by the external timer. Advances the queue when a track has
    /// played out; a finished preview falls back to the suspended queue,
    /// paused.
    pub fn tick(&mut self) {
        if !self.backend.is_finished() {
            return;
        }

        if self.preview.take().is_some() {
            self.backend.stop();
            if let Some(song) = self.current.clone() {
                self.paused = true;
                if self.backend.exists(&song) && self.backend.play(&song).is_ok() {
                    self.backend.pause();
                }
            }
            return;
        }

        if self.current.is_some() {
            self.next();
        }
    }

    /// The catalog half of song removal calls this to keep playlist, order
    /// and indices consistent within the same operation.
    pub fn remove_song(&mut self, song: &Path) {
        if self.current.as_deref() == Some(song) || self.preview.as_deref() == Some(song) {
            self.stop();
        }
        if let Some(seq) = self.playlist.iter().position(|entry| entry == song) {
            self.playlist.remove(seq);
            shuffle::on_song_removed(&mut self.random_order, seq);
            self.reindex();
        }
    }

    fn reindex(&mut self) {
        (self.seq_index, self.rand_index) =
            derive_indices(self.current.as_deref(), &self.playlist, &self.random_order);
    }

    fn is_current_first(&self) -> bool {
        if self.random {
            self.rand_index.is_none_or(|idx| idx == 0)
        } else {
            self.seq_index.is_none_or(|idx| idx == 0)
        }
    }

    fn is_current_last(&self) -> bool {
        if self.playlist.is_empty() {
            return false;
        }
        if self.random {
            self.rand_index == Some(self.random_order.len() - 1)
        } else {
            self.seq_index == Some(self.playlist.len() - 1)
        }
    }

    fn go_first(&mut self) {
        let seq = if self.random {
            self.random_order.first().copied()
        } else {
            Some(0)
        };
        if let Some(seq) = seq {
            self.activate(seq);
        }
    }

    fn go_last(&mut self) {
        let seq = if self.random {
            self.random_order.last().copied()
        } else {
            Some(self.playlist.len() - 1)
        };
        if let Some(seq) = seq {
            self.activate(seq);
        }
    }

    /// Start the song at sequential index `seq`. A file that is missing or
    /// refuses to start is never surfaced as an error: the navigator logs
    /// and advances forward, bounded by one pass over the playlist, then
    /// gives up and stops.
    fn activate(&mut self, seq: usize) {
        let mut seq = seq;
        let mut attempts = self.playlist.len();
        while attempts > 0 {
            let Some(song) = self.playlist.get(seq).cloned() else {
                break;
            };
            if self.backend.exists(&song) {
                match self.backend.play(&song) {
                    Ok(()) => {
                        if self.paused {
                            self.backend.pause();
                        }
                        self.current = Some(song);
                        self.reindex();
                        return;
                    }
                    Err(err) => log::warn!("failed to start {}: {err:#}", song.display()),
                }
            } else {
                log::warn!("file missing, skipping {}", song.display());
            }
            match self.seq_after(seq) {
                Some(next_seq) => seq = next_seq,
                None => break,
            }
            attempts -= 1;
        }
        self.stop();
    }

    /// Sequential index that follows `seq` along the active axis, honoring
    /// repeat at the trailing boundary.
    fn seq_after(&self, seq: usize) -> Option<usize> {
        if self.random {
            let pos = self.random_order.iter().position(|&entry| entry == seq)?;
            match self.random_order.get(pos + 1) {
                Some(&next_seq) => Some(next_seq),
                None if self.repeat => self.random_order.first().copied(),
                None => None,
            }
        } else if seq + 1 < self.playlist.len() {
            Some(seq + 1)
        } else if self.repeat {
            Some(0)
        } else {
            None
        }
    }

    fn start_detached(&mut self, song: &Path) {
        if self.backend.exists(song) {
            match self.backend.play(song) {
                Ok(()) => {
                    self.current = Some(song.to_path_buf());
                    self.reindex();
                    return;
                }
                Err(err) => log::warn!("failed to start {}: {err:#}", song.display()),
            }
        } else {
            log::warn!("file missing, skipping {}", song.display());
        }

        if self.playlist.is_empty() {
            self.stop();
            return;
        }
        // The unplayable selection auto-advances into the playlist.
        self.current = Some(song.to_path_buf());
        self.reindex();
        self.next();
    }

    fn restart_track(&mut self) {
        if let Err(err) = self.backend.seek_to(Duration::ZERO) {
            log::warn!("failed to restart track: {err:#}");
        }
    }
}
