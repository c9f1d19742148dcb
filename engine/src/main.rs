//! Playlog CLI - query a streaming account data export
//!
//! # History Commands
//!
//! ```bash
//! playlog --history-dir ~/export top --by artist -n 10
//! playlog distribution --by hour --metric ms_played --timezone America/Chicago
//! playlog heatmap
//! playlog skips --threshold-ms 30000
//! playlog summary
//! ```
//!
//! # Account Data Commands
//!
//! ```bash
//! playlog --playlist-file Playlist1.json playlists list
//! playlog playlists export "road trip" road_trip.csv
//! playlog --library-file YourLibrary.json library browse --artist bonobo
//! playlog library liked -n 20          # needs --history-dir too
//! ```
//!
//! Every result is printed as pretty JSON on stdout (or written to
//! `--output`); progress goes to stderr.

use clap::{Args, Parser, Subcommand};
use playlog::{
    browse, correlate, export_playlist, library_stats, list_playlists, load_history, load_library,
    load_playlists, playlist_stats, resolve, AggregationEngine, AggregationKey, AnalysisConfig,
    LibraryCollection, MergeReport, Metric, Playlist, LOG_BROADCASTER,
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "playlog")]
#[command(
    about = "Rankings and listening patterns from a streaming account data export",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for `PLAYLOG_*` settings
#[derive(Args)]
struct GlobalArgs {
    /// Directory with streaming history JSON files
    #[arg(long, global = true)]
    history_dir: Option<PathBuf>,

    /// Playlist export file
    #[arg(long, global = true)]
    playlist_file: Option<PathBuf>,

    /// Library export file
    #[arg(long, global = true)]
    library_file: Option<PathBuf>,

    /// IANA timezone for hour/day bucketing (default: UTC)
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Regex selecting history files by name
    #[arg(long, global = true)]
    file_pattern: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Do not print progress on stderr
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank tracks, artists or time buckets
    Top {
        /// track, artist, hour, weekday, month, year, date, day_type
        #[arg(long, default_value = "track")]
        by: AggregationKey,

        /// plays or ms_played
        #[arg(short, long, default_value = "plays")]
        metric: Metric,

        /// Number of groups (default: PLAYLOG_TOP_N)
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Return every group
        #[arg(long, conflicts_with = "limit")]
        all: bool,
    },

    /// Every bucket of a key in natural order
    Distribution {
        #[arg(long, default_value = "hour")]
        by: AggregationKey,

        #[arg(short, long, default_value = "plays")]
        metric: Metric,
    },

    /// Day-of-week by hour-of-day grid
    Heatmap {
        #[arg(short, long, default_value = "plays")]
        metric: Metric,
    },

    /// Busiest listening days
    Daily {
        #[arg(short, long, default_value = "plays")]
        metric: Metric,

        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Skip rate and most skipped tracks
    Skips {
        /// Plays shorter than this are skips (default: PLAYLOG_SKIP_THRESHOLD_MS)
        #[arg(long)]
        threshold_ms: Option<u64>,

        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Running total over time
    Cumulative {
        #[arg(short, long, default_value = "ms_played")]
        metric: Metric,
    },

    /// Weekdays against weekends
    WeekSplit {
        #[arg(short, long, default_value = "plays")]
        metric: Metric,
    },

    /// Headline numbers for the whole history
    Summary,

    /// Distinct names against total named plays
    Unique {
        #[arg(long, default_value = "artist")]
        by: AggregationKey,
    },

    /// Top artists with their distinct track counts
    ArtistDepth {
        #[arg(short, long, default_value = "plays")]
        metric: Metric,

        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Playlist export commands
    Playlists {
        #[command(subcommand)]
        action: PlaylistAction,
    },

    /// Library export commands
    Library {
        #[command(subcommand)]
        action: LibraryAction,
    },
}

#[derive(Subcommand)]
enum PlaylistAction {
    /// Numbered list of playlists
    List,

    /// One playlist with all items
    Show {
        /// Number, name or unique part of a name
        identifier: String,
    },

    /// Write one playlist as CSV
    Export {
        /// Number, name or unique part of a name
        identifier: String,

        /// CSV file to write
        csv: PathBuf,
    },

    /// Totals and longest playlists
    Stats,
}

#[derive(Subcommand)]
enum LibraryAction {
    /// Counts and most-liked artists
    Stats,

    /// Liked tracks, optionally filtered by artist
    Browse {
        /// Case-insensitive part of the artist name
        #[arg(long)]
        artist: Option<String>,
    },

    /// Liked tracks against streaming history
    Liked {
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.global.quiet {
        LOG_BROADCASTER.set_quiet(true);
    }

    let result = match build_config(&cli.global) {
        Ok(config) => run(cli.command, &config, cli.global.output.as_deref()).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn build_config(args: &GlobalArgs) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let mut config = AnalysisConfig::from_env()?;

    if let Some(dir) = &args.history_dir {
        config.history_dir = Some(dir.clone());
    }
    if let Some(file) = &args.playlist_file {
        config.playlist_file = Some(file.clone());
    }
    if let Some(file) = &args.library_file {
        config.library_file = Some(file.clone());
    }
    if let Some(tz) = &args.timezone {
        config.timezone = tz.clone();
    }
    if let Some(pattern) = &args.file_pattern {
        config.history_file_pattern = pattern.clone();
    }

    config.validate()?;
    Ok(config)
}

async fn run(command: Commands, config: &AnalysisConfig, output: Option<&Path>) -> CliResult {
    let top_n = |limit: Option<usize>| limit.unwrap_or(config.top_n);

    match command {
        Commands::Top { by, metric, limit, all } => {
            let (engine, report) = history(config).await?;
            let limit = if all { usize::MAX } else { top_n(limit) };
            write_output(&engine.group_and_rank(&report.dataset, by, metric, limit), output)
        }

        Commands::Distribution { by, metric } => {
            let (engine, report) = history(config).await?;
            write_output(&engine.distribution(&report.dataset, by, metric), output)
        }

        Commands::Heatmap { metric } => {
            let (engine, report) = history(config).await?;
            write_output(&engine.heatmap(&report.dataset, metric), output)
        }

        Commands::Daily { metric, limit } => {
            let (engine, report) = history(config).await?;
            write_output(&engine.daily_totals(&report.dataset, metric, top_n(limit)), output)
        }

        Commands::Skips { threshold_ms, limit } => {
            let (engine, report) = history(config).await?;
            let threshold = threshold_ms.unwrap_or(config.skip_threshold_ms);
            write_output(
                &SkipsOutput {
                    summary: engine.skip_classify(&report.dataset, threshold),
                    most_skipped: engine.most_skipped(&report.dataset, threshold, top_n(limit)),
                },
                output,
            )
        }

        Commands::Cumulative { metric } => {
            let (engine, report) = history(config).await?;
            write_output(&engine.cumulative(&report.dataset, metric), output)
        }

        Commands::WeekSplit { metric } => {
            let (engine, report) = history(config).await?;
            write_output(&engine.weekday_vs_weekend(&report.dataset, metric), output)
        }

        Commands::Summary => {
            let (engine, report) = history(config).await?;
            write_output(
                &SummaryOutput {
                    timezone: &config.timezone,
                    summary: engine.listening_summary(&report.dataset),
                    load: &report,
                },
                output,
            )
        }

        Commands::Unique { by } => {
            let (engine, report) = history(config).await?;
            write_output(&engine.unique_ratio(&report.dataset, by)?, output)
        }

        Commands::ArtistDepth { metric, limit } => {
            let (engine, report) = history(config).await?;
            write_output(
                &engine.unique_tracks_per_top_artist(&report.dataset, metric, top_n(limit)),
                output,
            )
        }

        Commands::Playlists { action } => cmd_playlists(action, config, output),

        Commands::Library { action } => cmd_library(action, config, output).await,
    }
}

#[derive(Serialize)]
struct SkipsOutput {
    summary: playlog::SkipSummary,
    most_skipped: Vec<playlog::RankedGroup>,
}

#[derive(Serialize)]
struct SummaryOutput<'a> {
    timezone: &'a str,
    summary: playlog::ListeningSummary,
    load: &'a MergeReport,
}

async fn history(
    config: &AnalysisConfig,
) -> Result<(AggregationEngine, MergeReport), Box<dyn std::error::Error>> {
    let engine = AggregationEngine::from_config(config)?;
    let report = load_history(config).await?;
    Ok((engine, report))
}

fn playlists(config: &AnalysisConfig) -> Result<Vec<Playlist>, Box<dyn std::error::Error>> {
    let path = config
        .playlist_file
        .as_deref()
        .ok_or("No playlist file configured (use --playlist-file or PLAYLOG_PLAYLIST_FILE)")?;
    Ok(load_playlists(path)?)
}

fn library(config: &AnalysisConfig) -> Result<LibraryCollection, Box<dyn std::error::Error>> {
    let path = config
        .library_file
        .as_deref()
        .ok_or("No library file configured (use --library-file or PLAYLOG_LIBRARY_FILE)")?;
    Ok(load_library(path)?)
}

fn cmd_playlists(
    action: PlaylistAction,
    config: &AnalysisConfig,
    output: Option<&Path>,
) -> CliResult {
    let playlists = playlists(config)?;

    match action {
        PlaylistAction::List => write_output(&list_playlists(&playlists), output),

        PlaylistAction::Show { identifier } => {
            write_output(resolve(&playlists, &identifier)?, output)
        }

        PlaylistAction::Export { identifier, csv } => {
            let playlist = resolve(&playlists, &identifier)?;
            export_playlist(playlist, &csv)?;
            Ok(())
        }

        PlaylistAction::Stats => write_output(&playlist_stats(&playlists), output),
    }
}

async fn cmd_library(
    action: LibraryAction,
    config: &AnalysisConfig,
    output: Option<&Path>,
) -> CliResult {
    let library = library(config)?;

    match action {
        LibraryAction::Stats => write_output(&library_stats(&library), output),

        LibraryAction::Browse { artist } => {
            write_output(&browse(&library, artist.as_deref()), output)
        }

        LibraryAction::Liked { limit } => {
            let (engine, report) = history(config).await?;
            let limit = limit.unwrap_or(config.top_n);
            write_output(&correlate(&engine, &library, &report.dataset, limit), output)
        }
    }
}

fn write_output<T: Serialize + ?Sized>(value: &T, path: Option<&Path>) -> CliResult {
    let content = serde_json::to_string_pretty(value)?;
    match path {
        Some(p) => {
            fs::write(p, &content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
