use std::path::PathBuf;

use clap::Parser;
use log::{debug, info};

use trackquery::cli::{Cli, Commands};
use trackquery::clause;
use trackquery::config::Config;
use trackquery::config_persistence::{default_config_path, load_config_file, persist_config_file};
use trackquery::db_manager::{self, DbManager};
use trackquery::protocol::NewTrack;

fn resolve_database_path(cli: &Cli, config: &Config) -> Result<PathBuf, db_manager::DbError> {
    if let Some(path) = cli.db.clone() {
        return Ok(path);
    }
    if let Some(path) = config.library.database_path.clone() {
        return Ok(path);
    }
    db_manager::default_database_path()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut clog = colog::default_builder();
    clog.filter(
        None,
        if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        },
    );
    clog.init();

    let config_file = cli.config.clone().or_else(default_config_path);
    let config = match &config_file {
        Some(path) if path.exists() => load_config_file(path),
        Some(path) => {
            let default_config = Config::default();
            persist_config_file(&default_config, path);
            info!("Wrote default config to {}", path.display());
            default_config
        }
        None => Config::default(),
    };
    debug!("Loaded config: {:?}", config);

    match &cli.command {
        Commands::ShowSql { filter } => {
            let filter =
                filter.to_filter(config.search.whole_values, config.search.include_album_artists);
            let compiled = clause::compile(&db_manager::filter_clause(&filter))?;
            println!("legacy:\n{}", db_manager::legacy_filter_text(&filter).trim_end());
            println!("parameterized:\n{}", compiled.sql);
            for (index, param) in compiled.params.iter().enumerate() {
                println!("  ?{} = {:?}", index + 1, param);
            }
        }
        Commands::Add {
            path,
            title,
            artists,
            album_artists,
            album,
            genres,
            year,
        } => {
            let db = DbManager::open(&resolve_database_path(&cli, &config)?)?;
            let id = db.insert_track(&NewTrack {
                path: path.clone(),
                title: title.clone(),
                artists: artists.iter().cloned().collect(),
                album_artists: album_artists.iter().cloned().collect(),
                album: album.clone(),
                genres: genres.iter().cloned().collect(),
                year: *year,
            })?;
            info!("Added track {} as {}", title, id);
        }
        Commands::Search { filter, legacy } => {
            let db = DbManager::open(&resolve_database_path(&cli, &config)?)?;
            let filter =
                filter.to_filter(config.search.whole_values, config.search.include_album_artists);
            let limit = Some(config.search.max_results);
            let tracks = if *legacy {
                db.search_tracks_legacy(&filter, limit)?
            } else {
                db.search_tracks(&filter, limit)?
            };
            for track in &tracks {
                println!("{}", track.summary_line());
            }
            info!("{} track(s) matched", tracks.len());
        }
    }

    Ok(())
}
