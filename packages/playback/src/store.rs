//! Playback store
//!
//! Single-threaded state machine coordinating one active engine instance.
//! Holds the current track, transport state, volume, seek position, and
//! the ordered playlist; every transport operation derives its target from
//! the playlist position.

use crate::engine::{AudioEngine, EngineEvent, EngineFactory};
use crate::error::{PlaybackError, PlaybackResult};
use serde::{Deserialize, Serialize};

/// Pressing back within this window restarts the current track instead of
/// moving to the previous one
const SKIP_BACK_WINDOW_SECS: f64 = 2.0;

/// One entry in the ordered playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistEntry {
    /// Tile identifier from the archive
    pub id: String,

    /// Media URL the engine loads
    pub url: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,
}

/// Transport state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transport {
    /// No engine instance exists
    Stopped,

    /// An engine exists but has not reported `Loaded` yet
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,
}

/// Metadata for whatever is currently loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowPlaying {
    /// Tile identifier, or a synthetic id for the live stream
    pub id: String,

    /// Display title
    pub title: String,

    /// Display artist
    pub artist: String,
}

/// Playback store coordinating one active engine instance
///
/// The store is single-threaded by construction: every operation takes
/// `&mut self` and applies synchronously. Engines emit lifecycle events
/// that are drained by [`PlayerStore::tick`], which the host calls once
/// per frame while the player is visible.
pub struct PlayerStore<F: EngineFactory> {
    factory: F,
    engine: Option<F::Engine>,
    playlist: Vec<PlaylistEntry>,
    /// Index of the current track within the playlist, when it came from
    /// the playlist (live streams and ad-hoc URLs have no index)
    current_index: Option<usize>,
    now_playing: Option<NowPlaying>,
    transport: Transport,
    buffering: bool,
    duration: Option<f64>,
    position: f64,
    volume: f32,
    live: bool,
}

impl<F: EngineFactory> PlayerStore<F> {
    /// Create a new store with an empty playlist and full volume
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            engine: None,
            playlist: Vec::new(),
            current_index: None,
            now_playing: None,
            transport: Transport::Stopped,
            buffering: false,
            duration: None,
            position: 0.0,
            volume: 1.0,
            live: false,
        }
    }

    // ========== Playlist ==========

    /// Replace the ordered playlist
    ///
    /// The current track keeps playing; its playlist position is
    /// recomputed by id so skip/previous keep working after a reorder.
    pub fn set_playlist(&mut self, entries: Vec<PlaylistEntry>) {
        self.playlist = entries;
        self.current_index = self.now_playing.as_ref().and_then(|now| {
            self.playlist.iter().position(|entry| entry.id == now.id)
        });
    }

    /// The ordered playlist
    pub fn playlist(&self) -> &[PlaylistEntry] {
        &self.playlist
    }

    // ========== Transport operations ==========

    /// Load and play a track
    ///
    /// Stops and drops any existing engine instance (there is no reuse),
    /// resumes a suspended output context, constructs a new engine for
    /// the URL and starts playback. The store stays in `Loading` with the
    /// buffering flag set until the engine reports `Loaded`.
    pub fn play_track(
        &mut self,
        id: &str,
        url: &str,
        title: &str,
        artist: &str,
    ) -> PlaybackResult<()> {
        self.live = false;
        self.current_index = self.playlist.iter().position(|entry| entry.id == id);
        self.start_engine(url)?;
        self.now_playing = Some(NowPlaying {
            id: id.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
        });
        Ok(())
    }

    /// Switch to the live broadcast stream
    ///
    /// While live, seeking and playlist navigation are disabled; the
    /// override ends with [`PlayerStore::stop_live`].
    pub fn play_live(&mut self, url: &str, title: &str) -> PlaybackResult<()> {
        self.current_index = None;
        self.start_engine(url)?;
        self.live = true;
        self.now_playing = Some(NowPlaying {
            id: "live".to_string(),
            title: title.to_string(),
            artist: String::new(),
        });
        Ok(())
    }

    /// End the live override and stop playback
    pub fn stop_live(&mut self) {
        if self.live {
            self.live = false;
            self.stop();
        }
    }

    /// Stop playback and drop the engine
    pub fn stop(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.stop();
        }
        self.engine = None;
        self.transport = Transport::Stopped;
        self.buffering = false;
        self.position = 0.0;
        self.duration = None;
    }

    /// Toggle between playing and paused
    ///
    /// With nothing loaded, starts the current playlist position (or the
    /// first entry).
    pub fn toggle_play(&mut self) -> PlaybackResult<()> {
        match self.transport {
            Transport::Playing => {
                if let Some(engine) = self.engine.as_mut() {
                    engine.pause();
                }
                self.transport = Transport::Paused;
                Ok(())
            }
            Transport::Paused => {
                if let Some(engine) = self.engine.as_mut() {
                    engine.play();
                }
                self.transport = Transport::Playing;
                Ok(())
            }
            Transport::Loading => Ok(()),
            Transport::Stopped => {
                let index = self.current_index.unwrap_or(0);
                self.play_at(index)
            }
        }
    }

    /// Restart the current track from the beginning
    pub fn restart_track(&mut self) -> PlaybackResult<()> {
        let engine = self.engine.as_mut().ok_or(PlaybackError::NoTrack)?;
        engine.seek(0.0);
        engine.play();
        self.position = 0.0;
        if self.transport == Transport::Paused {
            self.transport = Transport::Playing;
        }
        Ok(())
    }

    /// Advance to the next playlist entry, wrapping past the end
    pub fn skip_track(&mut self) -> PlaybackResult<()> {
        self.ensure_not_live()?;
        if self.playlist.is_empty() {
            return Err(PlaybackError::EmptyPlaylist);
        }
        let next = match self.current_index {
            Some(index) => (index + 1) % self.playlist.len(),
            None => 0,
        };
        self.play_at(next)
    }

    /// Move to the previous playlist entry, wrapping before the start
    pub fn previous_track(&mut self) -> PlaybackResult<()> {
        self.ensure_not_live()?;
        if self.playlist.is_empty() {
            return Err(PlaybackError::EmptyPlaylist);
        }
        let previous = match self.current_index {
            Some(0) | None => self.playlist.len() - 1,
            Some(index) => index - 1,
        };
        self.play_at(previous)
    }

    /// Back button: restart within the first two seconds, otherwise move
    /// to the previous track
    pub fn skip_back(&mut self) -> PlaybackResult<()> {
        self.ensure_not_live()?;
        if self.position < SKIP_BACK_WINDOW_SECS {
            self.restart_track()
        } else {
            self.previous_track()
        }
    }

    // ========== Volume & seeking ==========

    /// Set the volume, clamped to [0.0, 1.0]
    pub fn adjust_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(engine) = self.engine.as_mut() {
            engine.set_volume(self.volume);
        }
    }

    /// Seek to an absolute position in seconds
    ///
    /// Ignored while the live override is active.
    pub fn seek_to(&mut self, position: f64) {
        if self.live {
            return;
        }
        let mut target = position.max(0.0);
        if let Some(duration) = self.duration {
            target = target.min(duration);
        }
        if let Some(engine) = self.engine.as_mut() {
            engine.seek(target);
        }
        self.position = target;
    }

    // ========== Frame tick ==========

    /// Per-frame synchronization
    ///
    /// Drains pending engine events (load completion, end-of-track
    /// auto-advance, errors) and, while playing, mirrors the engine
    /// position into the store.
    pub fn tick(&mut self) {
        while let Some(event) = self.engine.as_mut().and_then(|e| e.poll_event()) {
            match event {
                EngineEvent::Loaded { duration } => {
                    self.buffering = false;
                    self.duration = duration;
                    if self.transport == Transport::Loading {
                        self.transport = Transport::Playing;
                    }
                }
                EngineEvent::Ended => {
                    if self.live {
                        tracing::info!("live stream ended");
                        self.stop_live();
                    } else if let Err(e) = self.skip_track() {
                        tracing::debug!(error = %e, "end of playlist");
                        self.stop();
                    }
                }
                EngineEvent::Error(message) => {
                    tracing::error!(error = %message, "engine playback error");
                    self.buffering = false;
                }
            }
        }

        if self.transport == Transport::Playing {
            if let Some(engine) = self.engine.as_ref() {
                self.position = engine.position();
            }
        }
    }

    // ========== Accessors ==========

    /// Metadata for the loaded track or live stream
    pub fn now_playing(&self) -> Option<&NowPlaying> {
        self.now_playing.as_ref()
    }

    /// Current transport state
    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Whether audio is currently playing
    pub fn is_playing(&self) -> bool {
        self.transport == Transport::Playing
    }

    /// Whether the engine is still buffering the current media
    pub fn is_buffering(&self) -> bool {
        self.buffering
    }

    /// Whether the live override is active
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Current position in seconds
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Media duration in seconds, once known
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Current volume in [0.0, 1.0]
    pub fn volume(&self) -> f32 {
        self.volume
    }

    // ========== Internals ==========

    fn ensure_not_live(&self) -> PlaybackResult<()> {
        if self.live {
            Err(PlaybackError::LiveActive)
        } else {
            Ok(())
        }
    }

    fn play_at(&mut self, index: usize) -> PlaybackResult<()> {
        let entry = self
            .playlist
            .get(index)
            .cloned()
            .ok_or(PlaybackError::EmptyPlaylist)?;
        self.play_track(&entry.id, &entry.url, &entry.title, &entry.artist)?;
        self.current_index = Some(index);
        Ok(())
    }

    /// Replace the engine instance with a fresh one for `url`
    fn start_engine(&mut self, url: &str) -> PlaybackResult<()> {
        if let Some(engine) = self.engine.as_mut() {
            engine.stop();
        }
        self.engine = None;

        self.factory.resume_context();

        self.position = 0.0;
        self.duration = None;
        self.buffering = true;

        match self.factory.create(url) {
            Ok(mut engine) => {
                engine.set_volume(self.volume);
                engine.play();
                self.engine = Some(engine);
                self.transport = Transport::Loading;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, url = %url, "failed to start playback engine");
                self.buffering = false;
                self.transport = Transport::Stopped;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Engine double with scriptable events and a shared call log
    struct MockEngine {
        events: Rc<RefCell<VecDeque<EngineEvent>>>,
        position: Rc<RefCell<f64>>,
        volume: Rc<RefCell<f32>>,
        stopped: Rc<RefCell<bool>>,
    }

    impl AudioEngine for MockEngine {
        fn play(&mut self) {}

        fn pause(&mut self) {}

        fn stop(&mut self) {
            *self.stopped.borrow_mut() = true;
        }

        fn seek(&mut self, position: f64) {
            *self.position.borrow_mut() = position;
        }

        fn set_volume(&mut self, volume: f32) {
            *self.volume.borrow_mut() = volume;
        }

        fn position(&self) -> f64 {
            *self.position.borrow()
        }

        fn poll_event(&mut self) -> Option<EngineEvent> {
            self.events.borrow_mut().pop_front()
        }
    }

    /// Handles into the most recently created engine
    #[derive(Clone, Default)]
    struct EngineProbe {
        events: Rc<RefCell<VecDeque<EngineEvent>>>,
        position: Rc<RefCell<f64>>,
        volume: Rc<RefCell<f32>>,
        stopped: Rc<RefCell<bool>>,
    }

    #[derive(Default)]
    struct MockFactory {
        created: Vec<String>,
        context_resumes: usize,
        probe: EngineProbe,
        fail_next: bool,
    }

    impl EngineFactory for MockFactory {
        type Engine = MockEngine;

        fn resume_context(&mut self) {
            self.context_resumes += 1;
        }

        fn create(&mut self, url: &str) -> PlaybackResult<MockEngine> {
            if self.fail_next {
                self.fail_next = false;
                return Err(PlaybackError::Load(format!("unreachable url: {url}")));
            }
            self.created.push(url.to_string());
            self.probe = EngineProbe::default();
            Ok(MockEngine {
                events: self.probe.events.clone(),
                position: self.probe.position.clone(),
                volume: self.probe.volume.clone(),
                stopped: self.probe.stopped.clone(),
            })
        }
    }

    fn entry(n: usize) -> PlaylistEntry {
        PlaylistEntry {
            id: format!("tile-{n}"),
            url: format!("https://cdn.example/tile-{n}/audio.mp3"),
            title: format!("Track {n}"),
            artist: "Night Swimmer".to_string(),
        }
    }

    fn store_with_playlist(n: usize) -> PlayerStore<MockFactory> {
        let mut store = PlayerStore::new(MockFactory::default());
        store.set_playlist((0..n).map(entry).collect());
        store
    }

    fn finish_loading(store: &mut PlayerStore<MockFactory>, duration: f64) {
        store
            .factory
            .probe
            .events
            .borrow_mut()
            .push_back(EngineEvent::Loaded {
                duration: Some(duration),
            });
        store.tick();
    }

    #[test]
    fn play_track_starts_loading() {
        let mut store = store_with_playlist(3);
        let e = entry(0);
        store
            .play_track(&e.id, &e.url, &e.title, &e.artist)
            .unwrap();

        assert_eq!(store.transport(), Transport::Loading);
        assert!(store.is_buffering());
        assert_eq!(store.now_playing().unwrap().id, "tile-0");
        assert_eq!(store.factory.context_resumes, 1);
    }

    #[test]
    fn loaded_event_clears_buffering_and_sets_duration() {
        let mut store = store_with_playlist(1);
        let e = entry(0);
        store
            .play_track(&e.id, &e.url, &e.title, &e.artist)
            .unwrap();
        finish_loading(&mut store, 184.0);

        assert!(!store.is_buffering());
        assert_eq!(store.duration(), Some(184.0));
        assert_eq!(store.transport(), Transport::Playing);
    }

    #[test]
    fn play_track_replaces_engine_instance() {
        let mut store = store_with_playlist(2);
        let a = entry(0);
        let b = entry(1);
        store
            .play_track(&a.id, &a.url, &a.title, &a.artist)
            .unwrap();
        let first_stopped = store.factory.probe.stopped.clone();
        store
            .play_track(&b.id, &b.url, &b.title, &b.artist)
            .unwrap();

        // Old instance was stopped and a second one created, no reuse
        assert!(*first_stopped.borrow());
        assert_eq!(store.factory.created.len(), 2);
        assert_eq!(store.factory.created[1], b.url);
    }

    #[test]
    fn skip_wraps_around_whole_playlist() {
        let mut store = store_with_playlist(4);
        store.play_at(0).unwrap();

        for _ in 0..4 {
            store.skip_track().unwrap();
        }

        // N skips over an N-track playlist return to the start
        assert_eq!(store.now_playing().unwrap().id, "tile-0");
    }

    #[test]
    fn previous_wraps_before_start() {
        let mut store = store_with_playlist(3);
        store.play_at(0).unwrap();
        store.previous_track().unwrap();
        assert_eq!(store.now_playing().unwrap().id, "tile-2");
    }

    #[test]
    fn skip_back_restarts_when_under_two_seconds() {
        let mut store = store_with_playlist(3);
        store.play_at(1).unwrap();
        finish_loading(&mut store, 120.0);

        *store.factory.probe.position.borrow_mut() = 1.4;
        store.tick();
        store.skip_back().unwrap();

        assert_eq!(store.now_playing().unwrap().id, "tile-1");
        assert_eq!(store.position(), 0.0);
    }

    #[test]
    fn skip_back_moves_to_previous_after_two_seconds() {
        let mut store = store_with_playlist(3);
        store.play_at(1).unwrap();
        finish_loading(&mut store, 120.0);

        *store.factory.probe.position.borrow_mut() = 37.2;
        store.tick();
        store.skip_back().unwrap();

        assert_eq!(store.now_playing().unwrap().id, "tile-0");
    }

    #[test]
    fn adjust_volume_clamps_to_unit_range() {
        let mut store = store_with_playlist(1);
        store.play_at(0).unwrap();

        store.adjust_volume(3.5);
        assert_eq!(store.volume(), 1.0);
        assert_eq!(*store.factory.probe.volume.borrow(), 1.0);

        store.adjust_volume(-0.2);
        assert_eq!(store.volume(), 0.0);

        store.adjust_volume(0.55);
        assert_eq!(store.volume(), 0.55);
    }

    #[test]
    fn seek_applies_to_engine_and_state() {
        let mut store = store_with_playlist(1);
        store.play_at(0).unwrap();
        finish_loading(&mut store, 200.0);

        store.seek_to(42.0);
        assert_eq!(store.position(), 42.0);
        assert_eq!(*store.factory.probe.position.borrow(), 42.0);

        // Clamped to the known duration and to zero
        store.seek_to(500.0);
        assert_eq!(store.position(), 200.0);
        store.seek_to(-3.0);
        assert_eq!(store.position(), 0.0);
    }

    #[test]
    fn tick_syncs_position_only_while_playing() {
        let mut store = store_with_playlist(1);
        store.play_at(0).unwrap();
        finish_loading(&mut store, 60.0);

        *store.factory.probe.position.borrow_mut() = 12.5;
        store.tick();
        assert_eq!(store.position(), 12.5);

        store.toggle_play().unwrap();
        *store.factory.probe.position.borrow_mut() = 99.0;
        store.tick();
        assert_eq!(store.position(), 12.5);
    }

    #[test]
    fn ended_event_advances_to_next_track() {
        let mut store = store_with_playlist(2);
        store.play_at(0).unwrap();
        finish_loading(&mut store, 10.0);

        store
            .factory
            .probe
            .events
            .borrow_mut()
            .push_back(EngineEvent::Ended);
        store.tick();

        assert_eq!(store.now_playing().unwrap().id, "tile-1");
    }

    #[test]
    fn error_event_clears_buffering_without_retry() {
        let mut store = store_with_playlist(1);
        store.play_at(0).unwrap();
        assert!(store.is_buffering());

        store
            .factory
            .probe
            .events
            .borrow_mut()
            .push_back(EngineEvent::Error("decode failed".to_string()));
        store.tick();

        assert!(!store.is_buffering());
        // Only the original engine was ever created, no retry
        assert_eq!(store.factory.created.len(), 1);
    }

    #[test]
    fn factory_failure_clears_buffering_and_stops() {
        let mut store = store_with_playlist(1);
        store.factory.fail_next = true;

        let result = store.play_at(0);
        assert_matches!(result, Err(PlaybackError::Load(_)));
        assert!(!store.is_buffering());
        assert_eq!(store.transport(), Transport::Stopped);
    }

    #[test]
    fn live_override_disables_navigation_and_seeking() {
        let mut store = store_with_playlist(3);
        store.play_live("https://live.example/stream", "Friday Broadcast")
            .unwrap();
        finish_loading(&mut store, 0.0);

        assert!(store.is_live());
        assert_matches!(store.skip_track(), Err(PlaybackError::LiveActive));
        assert_matches!(store.previous_track(), Err(PlaybackError::LiveActive));
        assert_matches!(store.skip_back(), Err(PlaybackError::LiveActive));

        let before = store.position();
        store.seek_to(500.0);
        assert_eq!(store.position(), before);

        store.stop_live();
        assert!(!store.is_live());
        assert_eq!(store.transport(), Transport::Stopped);
    }

    #[test]
    fn playing_a_track_clears_live_override() {
        let mut store = store_with_playlist(2);
        store.play_live("https://live.example/stream", "Broadcast").unwrap();
        assert!(store.is_live());

        store.play_at(0).unwrap();
        assert!(!store.is_live());
        assert_eq!(store.now_playing().unwrap().id, "tile-0");
    }

    #[test]
    fn toggle_play_from_stopped_starts_playlist() {
        let mut store = store_with_playlist(2);
        store.toggle_play().unwrap();
        assert_eq!(store.transport(), Transport::Loading);
        assert_eq!(store.now_playing().unwrap().id, "tile-0");
    }

    #[test]
    fn toggle_play_pauses_and_resumes() {
        let mut store = store_with_playlist(1);
        store.play_at(0).unwrap();
        finish_loading(&mut store, 60.0);

        store.toggle_play().unwrap();
        assert_eq!(store.transport(), Transport::Paused);

        store.toggle_play().unwrap();
        assert_eq!(store.transport(), Transport::Playing);
    }

    #[test]
    fn set_playlist_recomputes_current_position() {
        let mut store = store_with_playlist(3);
        store.play_at(2).unwrap();

        // Reorder so the playing track sits first; skipping must continue
        // from its new position
        store.set_playlist(vec![entry(2), entry(0), entry(1)]);
        store.skip_track().unwrap();
        assert_eq!(store.now_playing().unwrap().id, "tile-0");
    }

    #[test]
    fn skip_on_empty_playlist_errors() {
        let mut store = PlayerStore::new(MockFactory::default());
        assert_matches!(store.skip_track(), Err(PlaybackError::EmptyPlaylist));
        assert_matches!(store.previous_track(), Err(PlaybackError::EmptyPlaylist));
    }
}
