//! Tag-driven music catalogue with playlist filtering and playback
//! navigation.
//!
//! Songs carry free-form tags grouped by category; playlists are built by
//! filtering the catalog on a tag selection ([`filter`]), traversed
//! sequentially or through a shuffle order ([`shuffle`]), and driven by a
//! playback state machine with a preview mode ([`navigator`]). [`Engine`]
//! is the single facade a UI layer talks to; the audio backend behind it is
//! injected, so everything above [`audio::MediaPlayback`] runs headless.

pub mod audio;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod filter;
pub mod import;
pub mod model;
pub mod navigator;
pub mod project;
pub mod shuffle;

pub use engine::Engine;
pub use error::{EngineError, Result};
pub use model::{FilterMode, Song, SongKey, Tag, TagId};
