//! Persistent configuration model and defaults.

use std::path::PathBuf;

const MAX_RESULTS_LIMIT: u32 = 10_000;

/// Root configuration persisted to `trackquery.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    /// Library database location.
    #[serde(default)]
    pub library: LibraryConfig,
    /// Search matching preferences.
    #[serde(default)]
    pub search: SearchConfig,
}

/// Library database location.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LibraryConfig {
    /// Empty means the platform data directory default.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

/// Search matching preferences.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct SearchConfig {
    /// Match whole stored values rather than any substring.
    #[serde(default = "default_true")]
    pub whole_values: bool,
    /// Also match artist terms against album artists.
    #[serde(default = "default_true")]
    pub include_album_artists: bool,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            whole_values: true,
            include_album_artists: true,
            max_results: default_max_results(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_results() -> u32 {
    500
}

/// Clamps values loaded from disk into supported ranges.
pub fn sanitize_config(config: Config) -> Config {
    Config {
        search: SearchConfig {
            max_results: config.search.max_results.clamp(1, MAX_RESULTS_LIMIT),
            ..config.search
        },
        ..config
    }
}
