//! Track payloads exchanged between the library store and its callers.

use std::path::PathBuf;

use crate::multi_value::MultiValue;

/// Track row as stored in the library.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LibraryTrack {
    pub id: String,
    pub path: PathBuf,
    pub title: String,
    pub artists: MultiValue,
    pub album_artists: MultiValue,
    pub album: String,
    pub genres: MultiValue,
    pub year: Option<i32>,
}

impl LibraryTrack {
    /// One-line summary: `title - artists [genres]`.
    pub fn summary_line(&self) -> String {
        let artists = if self.artists.is_empty() {
            &self.album_artists
        } else {
            &self.artists
        };
        let mut line = format!("{} - {}", self.title, artists);
        if !self.genres.is_empty() {
            line.push_str(&format!(" [{}]", self.genres));
        }
        line
    }
}

/// Metadata for a track that has not been stored yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTrack {
    pub path: PathBuf,
    pub title: String,
    pub artists: MultiValue,
    pub album_artists: MultiValue,
    pub album: String,
    pub genres: MultiValue,
    pub year: Option<i32>,
}

/// Search filter applied by the library store.
///
/// Non-empty artist and genre lists are AND-ed; within a list any value
/// matches. An empty string value matches tracks with no value in that column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackFilter {
    pub artists: Vec<String>,
    pub genres: Vec<String>,
    /// Match whole stored items instead of any substring.
    pub whole_values: bool,
    /// Also look at the album-artist column when matching artists.
    pub include_album_artists: bool,
}

impl Default for TrackFilter {
    fn default() -> Self {
        Self {
            artists: Vec::new(),
            genres: Vec::new(),
            whole_values: true,
            include_album_artists: true,
        }
    }
}

impl TrackFilter {
    pub fn is_empty(&self) -> bool {
        self.artists.is_empty() && self.genres.is_empty()
    }
}
