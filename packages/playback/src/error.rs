//! Playback error types

use thiserror::Error;

/// Errors surfaced by the playback store
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The engine could not load the media URL
    #[error("failed to load media: {0}")]
    Load(String),

    /// The underlying engine reported a failure
    #[error("engine error: {0}")]
    Engine(String),

    /// An operation required a loaded track but none is active
    #[error("no track loaded")]
    NoTrack,

    /// Playlist navigation was requested on an empty playlist
    #[error("playlist is empty")]
    EmptyPlaylist,

    /// Playlist navigation and seeking are disabled while the live
    /// stream override is active
    #[error("live stream override is active")]
    LiveActive,
}

/// Result type for playback operations
pub type PlaybackResult<T> = Result<T, PlaybackError>;
