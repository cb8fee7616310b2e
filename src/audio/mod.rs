//! Playback backends.
//!
//! The navigator only ever talks to [`MediaPlayback`]; platform details
//! stay on this side of the trait. [`RodioPlayback`] drives the system
//! audio output, [`NullPlayback`] is a logical-clock stand-in for headless
//! runs and tests.

use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

pub trait MediaPlayback {
    fn play(&mut self, path: &Path) -> Result<()>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    fn is_paused(&self) -> bool;
    fn current_track(&self) -> Option<&Path>;
    fn position(&self) -> Option<Duration>;
    fn duration(&self) -> Option<Duration>;
    fn seek_to(&mut self, position: Duration) -> Result<()>;
    /// True once the loaded track has played to its end.
    fn is_finished(&self) -> bool;
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

pub struct RodioPlayback {
    stream: OutputStream,
    sink: Sink,
    current: Option<PathBuf>,
    track_duration: Option<Duration>,
}

impl RodioPlayback {
    pub fn new() -> Result<Self> {
        let mut stream = OutputStreamBuilder::from_default_device()
            .context("failed to open default audio output")?
            .with_error_callback(|_| {})
            .open_stream_or_fallback()
            .context("failed to start audio output stream")?;
        stream.log_on_drop(false);
        let sink = Sink::connect_new(stream.mixer());

        Ok(Self {
            stream,
            sink,
            current: None,
            track_duration: None,
        })
    }
}

impl MediaPlayback for RodioPlayback {
    fn play(&mut self, path: &Path) -> Result<()> {
        self.sink.stop();
        self.sink = Sink::connect_new(self.stream.mixer());

        let file =
            File::open(path).with_context(|| format!("failed to open track {}", path.display()))?;
        let source = Decoder::try_from(file)
            .with_context(|| format!("failed to decode {}", path.display()))?;
        self.track_duration = source.total_duration();
        self.sink.append(source);
        self.current = Some(path.to_path_buf());
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn resume(&mut self) {
        self.sink.play();
    }

    fn stop(&mut self) {
        self.sink.stop();
        self.current = None;
        self.track_duration = None;
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    fn current_track(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    fn position(&self) -> Option<Duration> {
        self.current.as_ref()?;
        Some(self.sink.get_pos())
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        if self.current.is_none() {
            return Err(anyhow::anyhow!("no active track"));
        }
        self.sink
            .try_seek(position)
            .map_err(|err| anyhow::anyhow!("failed to seek current track: {err:?}"))?;
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.current.is_some() && !self.sink.is_paused() && self.sink.empty()
    }
}

#[derive(Debug, Default)]
struct NullState {
    missing: BTreeSet<PathBuf>,
    force_finished: bool,
}

/// Logical-clock backend: tracks position with an [`Instant`] instead of
/// decoding anything. Every path "exists" unless marked missing through the
/// paired [`NullControl`].
pub struct NullPlayback {
    state: Rc<RefCell<NullState>>,
    paused: bool,
    current: Option<PathBuf>,
    started_at: Option<Instant>,
    position_offset: Duration,
    track_duration: Option<Duration>,
}

/// Test-side handle for simulating missing files and finished tracks after
/// the backend has been handed to a navigator.
#[derive(Clone)]
pub struct NullControl {
    state: Rc<RefCell<NullState>>,
}

impl NullControl {
    pub fn mark_missing(&self, path: &Path) {
        self.state.borrow_mut().missing.insert(path.to_path_buf());
    }

    pub fn mark_present(&self, path: &Path) {
        self.state.borrow_mut().missing.remove(path);
    }

    /// Make the currently loaded track report as played to its end.
    pub fn finish_track(&self) {
        self.state.borrow_mut().force_finished = true;
    }
}

impl NullPlayback {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(NullState::default())),
            paused: false,
            current: None,
            started_at: None,
            position_offset: Duration::ZERO,
            track_duration: None,
        }
    }

    pub fn with_control() -> (Self, NullControl) {
        let playback = Self::new();
        let control = NullControl {
            state: Rc::clone(&playback.state),
        };
        (playback, control)
    }

    fn estimate_duration(path: &Path) -> Option<Duration> {
        let file = File::open(path).ok()?;
        let source = Decoder::try_from(file).ok()?;
        source
            .total_duration()
            .filter(|duration| !duration.is_zero())
    }

    fn current_position(&self) -> Duration {
        let mut position = self.position_offset;
        if !self.paused
            && self.current.is_some()
            && let Some(started_at) = self.started_at
        {
            position = position.saturating_add(started_at.elapsed());
        }
        if let Some(duration) = self.track_duration {
            return position.min(duration);
        }
        position
    }
}

impl Default for NullPlayback {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaPlayback for NullPlayback {
    fn play(&mut self, path: &Path) -> Result<()> {
        self.state.borrow_mut().force_finished = false;
        self.paused = false;
        self.current = Some(path.to_path_buf());
        self.started_at = Some(Instant::now());
        self.position_offset = Duration::ZERO;
        self.track_duration = Self::estimate_duration(path);
        Ok(())
    }

    fn pause(&mut self) {
        self.position_offset = self.current_position();
        self.started_at = None;
        self.paused = true;
    }

    fn resume(&mut self) {
        if self.current.is_some() {
            self.started_at = Some(Instant::now());
        }
        self.paused = false;
    }

    fn stop(&mut self) {
        self.state.borrow_mut().force_finished = false;
        self.current = None;
        self.paused = false;
        self.started_at = None;
        self.position_offset = Duration::ZERO;
        self.track_duration = None;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn current_track(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    fn position(&self) -> Option<Duration> {
        self.current.as_ref()?;
        Some(self.current_position())
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn seek_to(&mut self, position: Duration) -> Result<()> {
        if self.current.is_none() {
            return Err(anyhow::anyhow!("no active track"));
        }

        self.position_offset = self
            .track_duration
            .map_or(position, |duration| position.min(duration));
        self.started_at = if self.paused {
            None
        } else {
            Some(Instant::now())
        };
        Ok(())
    }

    fn is_finished(&self) -> bool {
        if self.current.is_none() {
            return false;
        }
        if self.state.borrow().force_finished {
            return true;
        }
        let Some(duration) = self.track_duration else {
            return false;
        };
        !self.paused && self.current_position() >= duration
    }

    fn exists(&self, path: &Path) -> bool {
        !self.state.borrow().missing.contains(path)
    }
}
