use std::path::{Path, PathBuf};

use log::debug;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::clause::{self, Clause, ClauseError};
use crate::clause_builder;
use crate::multi_value::{self, MultiValue};
use crate::protocol::{LibraryTrack, NewTrack, TrackFilter};

const TRACK_COLUMNS: &str = "id, path, title, artists, album_artists, album, genres, year";

/// Failure while reading or writing the track library.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("invalid filter: {0}")]
    Clause(#[from] ClauseError),
    #[error("could not find data directory")]
    NoDataDir,
    #[error("could not prepare database location: {0}")]
    Io(#[from] std::io::Error),
}

/// SQLite-backed track library.
///
/// Multi-value columns (`artists`, `album_artists`, `genres`) hold
/// [`MultiValue`] encodings.
pub struct DbManager {
    conn: Connection,
}

impl DbManager {
    /// Opens the library in the platform data directory.
    pub fn new() -> Result<Self, DbError> {
        Self::open(&default_database_path()?)
    }

    pub fn open(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let db_manager = Self { conn };
        db_manager.initialize_schema()?;
        Ok(db_manager)
    }

    pub fn open_in_memory() -> Result<Self, DbError> {
        let db_manager = Self {
            conn: Connection::open_in_memory()?,
        };
        db_manager.initialize_schema()?;
        Ok(db_manager)
    }

    fn initialize_schema(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS tracks (
                id TEXT PRIMARY KEY,
                path TEXT NOT NULL,
                title TEXT NOT NULL,
                artists TEXT,
                album_artists TEXT,
                album TEXT,
                genres TEXT,
                year INTEGER
            )",
            [],
        )?;
        Ok(())
    }

    /// Stores a track and returns its generated id.
    pub fn insert_track(&self, track: &NewTrack) -> Result<String, DbError> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO tracks (id, path, title, artists, album_artists, album, genres, year)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                track.path.to_string_lossy().into_owned(),
                track.title,
                track.artists.encode(),
                track.album_artists.encode(),
                track.album,
                track.genres.encode(),
                track.year
            ],
        )?;
        Ok(id)
    }

    pub fn get_track(&self, id: &str) -> Result<Option<LibraryTrack>, DbError> {
        let track = self
            .conn
            .query_row(
                &format!("SELECT {TRACK_COLUMNS} FROM tracks WHERE id = ?1"),
                params![id],
                track_from_row,
            )
            .optional()?;
        Ok(track)
    }

    /// Loads tracks by id. No ids means no rows, without touching the database.
    pub fn tracks_by_ids(&self, ids: &[String]) -> Result<Vec<LibraryTrack>, DbError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let compiled = clause::compile(&Clause::in_list("id", ids.iter().cloned()))?;
        self.query_tracks(&compiled.sql, &compiled.params, None)
    }

    /// Searches with a parameterized filter.
    pub fn search_tracks(
        &self,
        filter: &TrackFilter,
        limit: Option<u32>,
    ) -> Result<Vec<LibraryTrack>, DbError> {
        let compiled = clause::compile(&filter_clause(filter))?;
        debug!("Track search filter: {}", compiled.inline());
        self.query_tracks(&compiled.sql, &compiled.params, limit)
    }

    /// Searches with inlined, quote-escaped filter text.
    ///
    /// Kept for filters written in the textual form; matches the same rows as
    /// [`DbManager::search_tracks`] for terms without `%` or `_`.
    pub fn search_tracks_legacy(
        &self,
        filter: &TrackFilter,
        limit: Option<u32>,
    ) -> Result<Vec<LibraryTrack>, DbError> {
        let where_clause = legacy_filter_text(filter);
        debug!("Legacy track search filter: {}", where_clause);
        self.query_tracks(&where_clause, &[], limit)
    }

    fn query_tracks(
        &self,
        where_clause: &str,
        params: &[String],
        limit: Option<u32>,
    ) -> Result<Vec<LibraryTrack>, DbError> {
        let mut sql = format!(
            "SELECT {TRACK_COLUMNS} FROM tracks WHERE {where_clause} ORDER BY title ASC, id ASC"
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        let mut stmt = self.conn.prepare(&sql)?;
        let track_iter = stmt.query_map(params_from_iter(params.iter()), track_from_row)?;

        let mut tracks = Vec::new();
        for track in track_iter {
            tracks.push(track?);
        }
        Ok(tracks)
    }
}

/// Default library location under the platform data directory.
pub fn default_database_path() -> Result<PathBuf, DbError> {
    let data_dir = dirs::data_dir().ok_or(DbError::NoDataDir)?;
    Ok(data_dir.join("trackquery").join("library.db"))
}

fn like_delimiter(filter: &TrackFilter) -> &'static str {
    if filter.whole_values {
        multi_value::LIKE_TERM_DELIMITER
    } else {
        ""
    }
}

/// Typed clause for `filter`. An empty filter matches every track.
pub fn filter_clause(filter: &TrackFilter) -> Clause {
    if filter.is_empty() {
        return Clause::And(Vec::new());
    }
    let delimiter = like_delimiter(filter);

    let mut conditions = Vec::new();
    if !filter.artists.is_empty() {
        let mut columns = vec!["artists"];
        if filter.include_album_artists {
            columns.push("album_artists");
        }
        conditions.push(Clause::or_like(
            columns,
            filter.artists.iter().cloned(),
            delimiter,
        ));
    }
    if !filter.genres.is_empty() {
        conditions.push(Clause::or_like(
            ["genres"],
            filter.genres.iter().cloned(),
            delimiter,
        ));
    }

    match conditions.len() {
        1 => conditions.remove(0),
        _ => Clause::And(conditions),
    }
}

/// Textual WHERE body for `filter`, built with [`clause_builder`].
pub fn legacy_filter_text(filter: &TrackFilter) -> String {
    if filter.is_empty() {
        return "1 = 1".to_string();
    }
    let delimiter = like_delimiter(filter);

    let mut conditions = Vec::new();
    if !filter.artists.is_empty() {
        let album_artists = if filter.include_album_artists {
            "album_artists"
        } else {
            ""
        };
        conditions.push(clause_builder::create_or_like_clause(
            "artists",
            album_artists,
            &filter.artists,
            delimiter,
        ));
    }
    if !filter.genres.is_empty() {
        conditions.push(clause_builder::create_or_like_clause(
            "genres",
            "",
            &filter.genres,
            delimiter,
        ));
    }

    conditions.join(" AND ")
}

fn track_from_row(row: &Row<'_>) -> Result<LibraryTrack, rusqlite::Error> {
    let multi_value_column = |index: usize| -> Result<MultiValue, rusqlite::Error> {
        let stored: Option<String> = row.get(index)?;
        Ok(MultiValue::decode(stored.as_deref().unwrap_or_default()))
    };
    Ok(LibraryTrack {
        id: row.get(0)?,
        path: PathBuf::from(row.get::<_, String>(1)?),
        title: row.get(2)?,
        artists: multi_value_column(3)?,
        album_artists: multi_value_column(4)?,
        album: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        genres: multi_value_column(6)?,
        year: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_track(title: &str, artists: &[&str], album_artists: &[&str], genres: &[&str]) -> NewTrack {
        NewTrack {
            path: PathBuf::from(format!("/music/{title}.flac")),
            title: title.to_string(),
            artists: artists.iter().copied().collect(),
            album_artists: album_artists.iter().copied().collect(),
            album: "Album".to_string(),
            genres: genres.iter().copied().collect(),
            year: Some(1991),
        }
    }

    fn seeded_db() -> DbManager {
        let db = DbManager::open_in_memory().expect("in-memory db should open");
        for track in [
            new_track("Enter Sandman", &["Metallica"], &["Metallica"], &["Metal"]),
            new_track("Perfect Day", &["Lou Reed"], &[], &["Rock", "Art Rock"]),
            new_track("Collab", &["Lou Reed", "Metallica"], &["Lou Reed"], &["Rock"]),
            new_track("Danny Boy", &["O'Brien"], &[], &[]),
            new_track("Tribute", &["Metallica Tribute Band"], &[], &["Metal"]),
            new_track("Compilation Cut", &[], &["Metallica"], &["Metal"]),
        ] {
            db.insert_track(&track).expect("track should insert");
        }
        db
    }

    fn titles(tracks: &[LibraryTrack]) -> Vec<&str> {
        tracks.iter().map(|track| track.title.as_str()).collect()
    }

    fn artist_filter(artists: &[&str]) -> TrackFilter {
        TrackFilter {
            artists: artists.iter().map(|artist| artist.to_string()).collect(),
            ..TrackFilter::default()
        }
    }

    #[test]
    fn test_insert_and_get_round_trips_multi_values() {
        let db = DbManager::open_in_memory().expect("in-memory db should open");
        let track = new_track("Collab", &["Lou Reed", "Metallica"], &[], &["Rock"]);
        let id = db.insert_track(&track).expect("track should insert");

        let stored = db
            .get_track(&id)
            .expect("query should succeed")
            .expect("track should exist");
        assert_eq!(stored.artists, track.artists);
        assert!(stored.album_artists.is_empty());
        assert_eq!(stored.genres.values(), ["Rock"]);
        assert_eq!(stored.year, Some(1991));
        assert!(db.get_track("missing").expect("query should succeed").is_none());
    }

    #[test]
    fn test_whole_value_search_skips_partial_matches() {
        let db = seeded_db();
        let tracks = db
            .search_tracks(&artist_filter(&["metallica"]), None)
            .expect("search should succeed");
        assert_eq!(
            titles(&tracks),
            vec!["Collab", "Compilation Cut", "Enter Sandman"]
        );
    }

    #[test]
    fn test_substring_search_includes_partial_matches() {
        let db = seeded_db();
        let filter = TrackFilter {
            whole_values: false,
            include_album_artists: false,
            ..artist_filter(&["metallica"])
        };
        let tracks = db.search_tracks(&filter, None).expect("search should succeed");
        assert_eq!(titles(&tracks), vec!["Collab", "Enter Sandman", "Tribute"]);
    }

    #[test]
    fn test_legacy_search_matches_parameterized_search() {
        let db = seeded_db();
        let filters = [
            artist_filter(&["Metallica"]),
            artist_filter(&["o'brien", "lou reed"]),
            artist_filter(&[""]),
            TrackFilter {
                genres: vec!["rock".to_string()],
                whole_values: false,
                ..TrackFilter::default()
            },
            TrackFilter {
                artists: vec!["Lou Reed".to_string()],
                genres: vec!["Rock".to_string()],
                ..TrackFilter::default()
            },
            TrackFilter::default(),
        ];
        for filter in &filters {
            let typed = db.search_tracks(filter, None).expect("search should succeed");
            let legacy = db
                .search_tracks_legacy(filter, None)
                .expect("legacy search should succeed");
            assert_eq!(titles(&typed), titles(&legacy), "filter: {filter:?}");
        }
    }

    #[test]
    fn test_quote_in_term_is_matched_not_injected() {
        let db = seeded_db();
        let tracks = db
            .search_tracks_legacy(&artist_filter(&["O'Brien"]), None)
            .expect("legacy search should succeed");
        assert_eq!(titles(&tracks), vec!["Danny Boy"]);

        let tracks = db
            .search_tracks(&artist_filter(&["x') OR 1=1 --"]), None)
            .expect("search should succeed");
        assert!(tracks.is_empty());
    }

    #[test]
    fn test_empty_term_matches_tracks_without_values() {
        let db = seeded_db();
        let filter = TrackFilter {
            genres: vec![String::new()],
            ..TrackFilter::default()
        };
        let tracks = db.search_tracks(&filter, None).expect("search should succeed");
        assert_eq!(titles(&tracks), vec!["Danny Boy"]);
    }

    #[test]
    fn test_artist_and_genre_filters_are_combined() {
        let db = seeded_db();
        let filter = TrackFilter {
            artists: vec!["Lou Reed".to_string()],
            genres: vec!["Art Rock".to_string()],
            ..TrackFilter::default()
        };
        let tracks = db.search_tracks(&filter, None).expect("search should succeed");
        assert_eq!(titles(&tracks), vec!["Perfect Day"]);
    }

    #[test]
    fn test_empty_filter_returns_all_with_limit() {
        let db = seeded_db();
        let all = db
            .search_tracks(&TrackFilter::default(), None)
            .expect("search should succeed");
        assert_eq!(all.len(), 6);
        let limited = db
            .search_tracks(&TrackFilter::default(), Some(2))
            .expect("search should succeed");
        assert_eq!(titles(&limited), vec!["Collab", "Compilation Cut"]);
    }

    #[test]
    fn test_tracks_by_ids() {
        let db = DbManager::open_in_memory().expect("in-memory db should open");
        let first = db
            .insert_track(&new_track("A", &["X"], &[], &[]))
            .expect("track should insert");
        db.insert_track(&new_track("B", &["Y"], &[], &[]))
            .expect("track should insert");

        let tracks = db
            .tracks_by_ids(&[first.clone(), "missing".to_string()])
            .expect("lookup should succeed");
        assert_eq!(titles(&tracks), vec!["A"]);
        assert!(db.tracks_by_ids(&[]).expect("lookup should succeed").is_empty());
    }

    #[test]
    fn test_empty_filter_matches_everything_in_both_forms() {
        let filter = TrackFilter::default();
        assert!(filter.is_empty());
        assert_eq!(legacy_filter_text(&filter), "1 = 1");
        assert_eq!(filter_clause(&filter), Clause::And(Vec::new()));
        assert_eq!(
            clause::compile(&filter_clause(&filter))
                .expect("compiles")
                .sql,
            "1 = 1"
        );
    }

    #[test]
    fn test_whole_value_filters_wrap_terms_in_trim_delimiter() {
        let filter = artist_filter(&["ABBA"]);
        assert!(legacy_filter_text(&filter).contains("'%¤abba¤%'"));
        let compiled = clause::compile(&filter_clause(&filter)).expect("compiles");
        assert!(compiled.params.iter().all(|param| param == "%¤abba¤%"));

        let substring = TrackFilter {
            whole_values: false,
            ..filter
        };
        assert!(legacy_filter_text(&substring).contains("'%abba%'"));
    }

    #[test]
    fn test_errors_describe_and_chain_their_cause() {
        use std::error::Error;

        let err = DbError::from(ClauseError::NoColumns);
        assert_eq!(err.to_string(), "invalid filter: clause references no columns");
        assert!(err.source().is_some());

        let err = DbManager::open_in_memory()
            .expect("in-memory db should open")
            .conn
            .execute("SELECT * FROM missing_table", [])
            .map_err(DbError::from)
            .expect_err("query on a missing table should fail");
        assert!(matches!(err, DbError::Sql(_)));
        assert!(err.to_string().starts_with("database error: "));
        assert!(DbError::NoDataDir.source().is_none());
    }
}
