//! Playback-state coordinator for the Immortal Raindrops player
//!
//! This crate implements the client-side playback store: a single-threaded
//! state machine that coordinates exactly one active audio/video engine
//! instance over an ordered playlist of archive tiles.
//!
//! # Architecture
//!
//! - [`PlayerStore`] holds the current track, transport state, volume,
//!   seek position and playlist, and owns the active engine instance.
//! - [`AudioEngine`] / [`EngineFactory`] abstract the concrete audio
//!   backend. Every `play_track` call constructs a fresh engine; the
//!   previous instance is stopped and dropped, never reused.
//! - [`EngineEvent`]s (loaded, ended, error) are drained by
//!   [`PlayerStore::tick`], which hosts call once per frame to keep the
//!   seek position in sync while playing.
//!
//! # Example
//!
//! ```rust,ignore
//! use raindrops_playback::{PlayerStore, PlaylistEntry};
//!
//! let mut player = PlayerStore::new(my_engine_factory);
//! player.set_playlist(tiles);
//! player.play_track("tile-4", url, "Rainfall", "Night Swimmer")?;
//!
//! // per animation frame:
//! player.tick();
//! ```

mod engine;
mod error;
mod store;

pub use engine::{AudioEngine, EngineEvent, EngineFactory};
pub use error::{PlaybackError, PlaybackResult};
pub use store::{NowPlaying, PlayerStore, PlaylistEntry, Transport};
