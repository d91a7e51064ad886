//! Track (tile) model for the archive
//!
//! A track is one tile on the archive grid: audio or video media plus an
//! optional cover visual, both stored under a key prefix derived from the
//! tile's ordering index.

use chrono::{DateTime, NaiveDate, Utc};
use raindrops_storage_client::keys;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Media category enum matching PostgreSQL media_type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "media_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    #[default]
    Song,
    DjSet,
    Video,
    Image,
}

impl MediaType {
    /// Whether the primary media is rendered by a video element
    pub fn is_video(&self) -> bool {
        matches!(self, Self::Video)
    }
}

/// Track record from the tracks table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Track {
    /// Unique track identifier
    pub id: Uuid,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Genre label
    pub genre: Option<String>,

    /// Media category (song, DJ set, video, image)
    pub media_type: MediaType,

    /// Ordering index; storage keys derive from it
    pub tile_index: i32,

    /// Extension of the audio/video object
    pub audio_ext: String,

    /// Extension of the cover visual object, if one was uploaded
    pub image_ext: Option<String>,

    /// Duration in seconds
    pub duration_secs: Option<i32>,

    /// Release date
    pub released_on: Option<NaiveDate>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Track {
    /// Storage key of the audio/video object
    pub fn audio_key(&self) -> String {
        keys::audio_key(self.tile_index, &self.audio_ext)
    }

    /// Storage key of the cover visual, if one exists
    pub fn visual_key(&self) -> Option<String> {
        self.image_ext
            .as_deref()
            .map(|ext| keys::visual_key(self.tile_index, ext))
    }

    /// All storage keys belonging to this tile
    pub fn storage_keys(&self) -> Vec<String> {
        let mut out = vec![self.audio_key()];
        out.extend(self.visual_key());
        out
    }

    /// Returns a formatted duration string (e.g., "3:45")
    pub fn formatted_duration(&self) -> Option<String> {
        self.duration_secs.map(|total| {
            let minutes = total / 60;
            let seconds = total % 60;
            format!("{}:{:02}", minutes, seconds)
        })
    }
}

/// Track creation input (upload finalization)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTrack {
    pub title: String,
    pub artist: String,
    pub genre: Option<String>,
    #[serde(default)]
    pub media_type: MediaType,
    pub tile_index: i32,
    pub audio_ext: String,
    pub image_ext: Option<String>,
    pub duration_secs: Option<i32>,
    pub released_on: Option<NaiveDate>,
}

/// Track edit input (admin metadata updates); absent fields are unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTrack {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
    pub released_on: Option<NaiveDate>,
}
