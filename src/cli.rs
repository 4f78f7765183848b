use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::protocol::TrackFilter;

#[derive(Parser, Debug)]
#[command(name = "trackquery")]
#[command(version, about = "Search a music library by multi-value tags", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Path to the library database (overrides config)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a track to the library
    Add {
        #[arg(long)]
        path: PathBuf,
        #[arg(long)]
        title: String,
        /// Track artist, repeat for several
        #[arg(long = "artist")]
        artists: Vec<String>,
        #[arg(long = "album-artist")]
        album_artists: Vec<String>,
        #[arg(long, default_value = "")]
        album: String,
        /// Genre, repeat for several
        #[arg(long = "genre")]
        genres: Vec<String>,
        #[arg(long)]
        year: Option<i32>,
    },
    /// Search tracks by artist and genre
    Search {
        #[command(flatten)]
        filter: FilterArgs,
        /// Use the inlined text filter instead of bound parameters
        #[arg(long)]
        legacy: bool,
    },
    /// Print the SQL generated for a filter
    ShowSql {
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Artist to match, repeat for several
    #[arg(long = "artist")]
    pub artists: Vec<String>,
    /// Genre to match, repeat for several
    #[arg(long = "genre")]
    pub genres: Vec<String>,
    /// Match any substring instead of whole values
    #[arg(long)]
    pub substring: bool,
    /// Do not match artists against album artists
    #[arg(long)]
    pub no_album_artists: bool,
}

impl FilterArgs {
    /// Builds a filter, using configured defaults for flags left unset.
    pub fn to_filter(&self, whole_values: bool, include_album_artists: bool) -> TrackFilter {
        TrackFilter {
            artists: self.artists.clone(),
            genres: self.genres.clone(),
            whole_values: whole_values && !self.substring,
            include_album_artists: include_album_artists && !self.no_album_artists,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_with_repeated_artists() {
        let cli = Cli::try_parse_from([
            "trackquery",
            "search",
            "--artist",
            "Metallica",
            "--artist",
            "Lou Reed",
            "--substring",
            "-v",
        ])
        .expect("arguments should parse");
        assert!(cli.verbose);
        let Commands::Search { filter, legacy } = cli.command else {
            panic!("expected search command");
        };
        assert!(!legacy);
        let filter = filter.to_filter(true, true);
        assert_eq!(filter.artists, vec!["Metallica", "Lou Reed"]);
        assert!(!filter.whole_values);
        assert!(filter.include_album_artists);
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from([
            "trackquery",
            "--db",
            "/tmp/lib.db",
            "add",
            "--path",
            "/music/a.flac",
            "--title",
            "A",
            "--genre",
            "Rock",
            "--year",
            "1972",
        ])
        .expect("arguments should parse");
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/lib.db")));
        let Commands::Add {
            genres,
            year,
            artists,
            ..
        } = cli.command
        else {
            panic!("expected add command");
        };
        assert_eq!(genres, vec!["Rock"]);
        assert!(artists.is_empty());
        assert_eq!(year, Some(1972));
    }
}
