//! Audio engine abstraction
//!
//! The store never talks to a concrete audio backend. Each `play_track`
//! call asks an [`EngineFactory`] for a brand-new [`AudioEngine`] pointed
//! at one URL; the previous engine is stopped and dropped. Engines report
//! lifecycle through polled [`EngineEvent`]s, which the store drains on
//! every tick.

use crate::error::PlaybackResult;

/// Lifecycle events emitted by an engine instance
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Media metadata is available and playback can begin
    Loaded {
        /// Total duration in seconds, if the media reports one
        /// (live streams do not)
        duration: Option<f64>,
    },

    /// Playback reached the end of the media
    Ended,

    /// The engine failed to load or decode the media
    Error(String),
}

/// A single playback engine bound to one media URL
///
/// Implementations wrap whatever actually produces sound (an HTML media
/// element, a native output stream, a test double). All methods are
/// infallible; failures surface asynchronously as [`EngineEvent::Error`].
pub trait AudioEngine {
    /// Begin or resume playback
    fn play(&mut self);

    /// Pause playback, keeping the current position
    fn pause(&mut self);

    /// Stop playback and release the underlying output
    fn stop(&mut self);

    /// Seek to an absolute position in seconds
    fn seek(&mut self, position: f64);

    /// Apply a volume in [0.0, 1.0]
    fn set_volume(&mut self, volume: f32);

    /// Current playback position in seconds
    fn position(&self) -> f64;

    /// Drain the next pending lifecycle event, if any
    fn poll_event(&mut self) -> Option<EngineEvent>;
}

/// Constructs engine instances and owns the shared output context
pub trait EngineFactory {
    /// The engine type this factory produces
    type Engine: AudioEngine;

    /// Resume the output context if the platform suspended it
    ///
    /// Browsers suspend audio contexts until a user gesture; native
    /// backends can treat this as a no-op.
    fn resume_context(&mut self);

    /// Create a fresh engine for the given media URL
    fn create(&mut self, url: &str) -> PlaybackResult<Self::Engine>;
}
