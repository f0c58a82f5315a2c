mod config;
mod logging;
mod ports;
mod services;
mod spotify_rs;

#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::{
    Result,
    eyre::{WrapErr, eyre},
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    logging::setup_logging,
    services::{
        highlights::{
            PublishTarget, build_playlist,
            orchestrator::{BatchError, Orchestrator},
            types::BatchReport,
        },
        records_file::JsonRecordSource,
        spotify::client::SpotifyHttpAdapter,
    },
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "HIGHLIGHTS_PLAYLIST_CONFIG")]
    config: Option<PathBuf>,

    /// Console log level (default: info)
    #[arg(long, default_value = "info", global = true, env = "LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// File log level (default: debug)
    #[arg(long, default_value = "debug", global = true)]
    log_file_level: log::LevelFilter,

    /// Path to log file
    #[arg(long, env = "HIGHLIGHTS_PLAYLIST_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve this week's highlighted tracks and publish them to the playlist
    Build {
        /// The playlist to replace
        #[arg(short, long, env = "PLAYLIST_ID")]
        playlist_id: Option<String>,

        /// JSON file with this week's records
        #[arg(short, long, env = "HIGHLIGHTS_RECORDS_FILE")]
        records: Option<PathBuf>,

        /// Spotify access token
        #[arg(long, env = "SPOTIFY_ACCESS_TOKEN", hide_env_values = true)]
        access_token: Option<String>,

        /// Deadline for a single catalog search, e.g. "10s"
        #[arg(long, value_parser = humantime::parse_duration)]
        search_timeout: Option<Duration>,

        /// Resolve tracks but leave the playlist untouched
        #[arg(long)]
        dry_run: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

struct BuildArgs {
    playlist_id: Option<String>,
    records: Option<PathBuf>,
    access_token: Option<String>,
    search_timeout: Option<Duration>,
    dry_run: bool,
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_logging(args.log_level, args.log_file.clone(), args.log_file_level)?;

    log::debug!("Highlights playlist starting");
    log::debug!("Loading configuration");

    let config = {
        if let Some(config) = args.config {
            Config::from_file(&config)
        } else {
            Config::load()
        }
    }
    .wrap_err("Failed to load highlights-playlist config")?;

    match args.command {
        Commands::Build {
            playlist_id,
            records,
            access_token,
            search_timeout,
            dry_run,
            json,
        } => {
            run_build(
                &config,
                BuildArgs {
                    playlist_id,
                    records,
                    access_token,
                    search_timeout,
                    dry_run,
                    json,
                },
            )
            .await?;
        }
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                log::debug!("Creating default config");
                let path = Config::create_default()?;
                log::info!("Default config created at {}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
    }

    Ok(())
}

async fn run_build(config: &Config, args: BuildArgs) -> Result<()> {
    let mut batch_config = config.batch_config();
    if let Some(search_timeout) = args.search_timeout {
        batch_config.resolver.search_timeout = search_timeout;
    }

    let records_path = args
        .records
        .or_else(|| config.records_file_path())
        .ok_or_else(|| eyre!(
            "No records file given. Use --records, HIGHLIGHTS_RECORDS_FILE or records_file in the config"
        ))?;
    let access_token = args
        .access_token
        .or_else(|| config.spotify_access_token())
        .ok_or_else(|| eyre!(
            "No Spotify access token given. Use --access-token or SPOTIFY_ACCESS_TOKEN"
        ))?;
    let playlist_id = args.playlist_id.or(batch_config.playlist_id.clone());
    if playlist_id.is_none() && !args.dry_run {
        return Err(eyre!(
            "No playlist id given. Use --playlist-id, PLAYLIST_ID or --dry-run"
        ));
    }

    let spotify = Arc::new(SpotifyHttpAdapter::new(&config.spotify, access_token)?);
    let source = JsonRecordSource::new(records_path);
    log::debug!("Reading records from {}", source.path().display());
    let orchestrator = Orchestrator::new(spotify.clone(), batch_config);

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling outstanding searches");
            ctrl_c_token.cancel();
        }
    });

    let target = match (&playlist_id, args.dry_run) {
        (Some(playlist_id), false) => Some(PublishTarget {
            writer: spotify.as_ref(),
            playlist_id,
        }),
        _ => None,
    };

    match build_playlist(&source, &orchestrator, target, &cancel).await {
        Ok(report) => {
            print_report(&report, args.json)?;
            Ok(())
        }
        Err(error) => {
            if let Some(batch_error) = error.downcast_ref::<BatchError>() {
                print_report(batch_error.partial_report(), args.json)?;
            }
            Err(error)
        }
    }
}

fn print_report(report: &BatchReport, json: bool) -> Result<()> {
    if json {
        let output =
            serde_json::to_string_pretty(report).wrap_err("Failed to serialize report")?;
        println!("{}", output);
        return Ok(());
    }

    for record in &report.records {
        println!("{} - {} ({})", record.band, record.album_name, record.score);
        for track in &record.tracks {
            match &track.resolved_link {
                Some(link) => println!("  {} {}", track.track_name, link),
                None => println!("  {} (not found)", track.track_name),
            }
        }
    }
    println!(
        "{} of {} tracks found, {} in playlist",
        report.found,
        report.total,
        report.track_ids.len()
    );
    Ok(())
}
