//! Track catalog service
//!
//! Produces the grid the front page renders: all tracks ordered by tile
//! index with their vote scores attached. When the database errors or
//! holds no rows the service returns a built-in static list instead, so
//! the grid never renders empty.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::models::{MediaType, Track};
use crate::repositories::{TrackRepository, VoteRepository};

/// One grid tile: track metadata plus aggregate vote score
#[derive(Debug, Clone, Serialize)]
pub struct CatalogTile {
    /// Track metadata
    #[serde(flatten)]
    pub track: Track,

    /// Sum of all vote values for this track
    pub score: i64,
}

/// Catalog service assembling the archive grid
#[derive(Clone)]
pub struct CatalogService {
    tracks: TrackRepository,
    votes: VoteRepository,
}

impl CatalogService {
    /// Create a new CatalogService instance
    pub fn new(tracks: TrackRepository, votes: VoteRepository) -> Self {
        Self { tracks, votes }
    }

    /// Fetch the ordered grid, falling back to the static list
    ///
    /// Vote scores are best-effort: a failed aggregate query degrades to
    /// zero scores rather than failing the grid.
    pub async fn grid(&self) -> Vec<CatalogTile> {
        let tracks = match self.tracks.find_all_ordered().await {
            Ok(rows) if rows.is_empty() => {
                tracing::info!("track table is empty, serving static fallback grid");
                return Self::fallback_tiles();
            }
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(error = %e, "track query failed, serving static fallback grid");
                return Self::fallback_tiles();
            }
        };

        let scores = match self.votes.scores().await {
            Ok(pairs) => pairs.into_iter().collect(),
            Err(e) => {
                tracing::warn!(error = %e, "vote aggregation failed, serving grid without scores");
                HashMap::new()
            }
        };

        Self::assemble(tracks, &scores)
    }

    /// Attach scores and enforce ascending tile order
    fn assemble(mut tracks: Vec<Track>, scores: &HashMap<Uuid, i64>) -> Vec<CatalogTile> {
        tracks.sort_by_key(|t| t.tile_index);
        tracks
            .into_iter()
            .map(|track| {
                let score = scores.get(&track.id).copied().unwrap_or(0);
                CatalogTile { track, score }
            })
            .collect()
    }

    /// The built-in grid served when the database is unavailable or empty
    pub fn fallback_tiles() -> Vec<CatalogTile> {
        FALLBACK_TRACKS
            .iter()
            .map(|(index, title, artist, genre, ext)| {
                let now = Utc::now();
                CatalogTile {
                    track: Track {
                        // Stable ids so the client can key tiles across reloads
                        id: Uuid::from_u128(0x5EED_0000_0000_0000_0000 + *index as u128),
                        title: (*title).to_string(),
                        artist: (*artist).to_string(),
                        genre: Some((*genre).to_string()),
                        media_type: MediaType::Song,
                        tile_index: *index,
                        audio_ext: (*ext).to_string(),
                        image_ext: Some("jpg".to_string()),
                        duration_secs: None,
                        released_on: None,
                        created_at: now,
                        updated_at: now,
                    },
                    score: 0,
                }
            })
            .collect()
    }
}

/// (tile_index, title, artist, genre, audio_ext)
const FALLBACK_TRACKS: &[(i32, &str, &str, &str, &str)] = &[
    (1, "First Rain", "Immortal Raindrops", "Ambient", "mp3"),
    (2, "Puddle Jump", "Immortal Raindrops", "House", "mp3"),
    (3, "Stormfront", "Immortal Raindrops", "Drum & Bass", "mp3"),
    (4, "Clear Skies", "Immortal Raindrops", "Downtempo", "mp3"),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn track(index: i32, title: &str) -> Track {
        Track {
            id: Uuid::new_v4(),
            title: title.to_string(),
            artist: "a".to_string(),
            genre: None,
            media_type: MediaType::Song,
            tile_index: index,
            audio_ext: "mp3".to_string(),
            image_ext: None,
            duration_secs: None,
            released_on: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn assemble_sorts_by_tile_index_and_attaches_scores() {
        let a = track(3, "third");
        let b = track(1, "first");
        let mut scores = HashMap::new();
        scores.insert(b.id, 5);

        let tiles = CatalogService::assemble(vec![a, b], &scores);

        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles[0].track.title, "first");
        assert_eq!(tiles[0].score, 5);
        assert_eq!(tiles[1].track.title, "third");
        assert_eq!(tiles[1].score, 0);
    }

    #[test]
    fn fallback_grid_is_nonempty_and_ordered() {
        let tiles = CatalogService::fallback_tiles();
        assert!(!tiles.is_empty());

        let indexes: Vec<i32> = tiles.iter().map(|t| t.track.tile_index).collect();
        let mut sorted = indexes.clone();
        sorted.sort_unstable();
        assert_eq!(indexes, sorted);
        assert!(tiles.iter().all(|t| t.score == 0));
    }

    #[test]
    fn fallback_ids_are_stable() {
        let first = CatalogService::fallback_tiles();
        let second = CatalogService::fallback_tiles();
        assert_eq!(first[0].track.id, second[0].track.id);
    }
}
