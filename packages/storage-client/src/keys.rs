//! Tile key layout
//!
//! Storage keys derive deterministically from a tile's ordering index:
//! audio lives at `tile-<index>/audio.<ext>` and the cover visual at
//! `tile-<index>/visual.<ext>`. Nothing else may write under a tile
//! prefix, which is what makes the orphan sweep's prefix diffing sound.

use crate::error::{StorageError, StorageResult};

/// Prefix shared by every tile's objects
pub const TILE_PREFIX: &str = "tile-";

/// Audio extensions accepted by the upload flow
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "ogg", "opus", "flac", "wav", "mp4", "webm"];

/// Visual extensions accepted by the upload flow
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Key prefix for one tile, e.g. `tile-7/`
pub fn tile_prefix(tile_index: i32) -> String {
    format!("{TILE_PREFIX}{tile_index}/")
}

/// Audio object key for a tile, e.g. `tile-7/audio.mp3`
pub fn audio_key(tile_index: i32, ext: &str) -> String {
    format!("{TILE_PREFIX}{tile_index}/audio.{ext}")
}

/// Visual object key for a tile, e.g. `tile-7/visual.jpg`
pub fn visual_key(tile_index: i32, ext: &str) -> String {
    format!("{TILE_PREFIX}{tile_index}/visual.{ext}")
}

/// Parse the tile index out of a listing prefix like `tile-7/`
///
/// Returns `None` for prefixes that do not follow the tile layout.
pub fn parse_tile_index(prefix: &str) -> Option<i32> {
    prefix
        .strip_prefix(TILE_PREFIX)?
        .trim_end_matches('/')
        .parse()
        .ok()
}

/// Validate an audio extension against the supported set
pub fn validate_audio_ext(ext: &str) -> StorageResult<()> {
    if AUDIO_EXTENSIONS.contains(&ext) {
        Ok(())
    } else {
        Err(StorageError::UnsupportedExtension(ext.to_string()))
    }
}

/// Validate a visual extension against the supported set
pub fn validate_image_ext(ext: &str) -> StorageResult<()> {
    if IMAGE_EXTENSIONS.contains(&ext) {
        Ok(())
    } else {
        Err(StorageError::UnsupportedExtension(ext.to_string()))
    }
}

/// MIME type for a supported extension
pub fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "ogg" => "audio/ogg",
        "opus" => "audio/opus",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
