//! Analysis settings.
//!
//! Values come from struct defaults, then `PLAYLOG_*` environment variables
//! (a `.env` file is honoured through `dotenvy`), then CLI flags.
//!
//! | Variable                       | Default        |
//! |--------------------------------|----------------|
//! | `PLAYLOG_HISTORY_DIR`          | (none)         |
//! | `PLAYLOG_PLAYLIST_FILE`        | (none)         |
//! | `PLAYLOG_LIBRARY_FILE`         | (none)         |
//! | `PLAYLOG_TIMEZONE`             | `UTC`          |
//! | `PLAYLOG_SKIP_THRESHOLD_MS`    | `30000`        |
//! | `PLAYLOG_TOP_N`                | `20`           |
//! | `PLAYLOG_HISTORY_FILE_PATTERN` | `(?i)\.json$`  |

use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

const ENV_PREFIX: &str = "PLAYLOG_";

/// Default skip threshold: anything under 30 seconds counts as skipped.
pub const DEFAULT_SKIP_THRESHOLD_MS: u64 = 30_000;

/// Default length of ranked lists.
pub const DEFAULT_TOP_N: usize = 20;

/// Default history file filter.
pub const DEFAULT_HISTORY_FILE_PATTERN: &str = r"(?i)\.json$";

/// Settings for one analytical session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Directory with streaming history JSON files
    pub history_dir: Option<PathBuf>,

    /// Playlist export (`Playlist1.json`)
    pub playlist_file: Option<PathBuf>,

    /// Liked items export (`YourLibrary.json`)
    pub library_file: Option<PathBuf>,

    /// IANA zone used for time-of-day and day-of-week bucketing
    pub timezone: String,

    /// Plays shorter than this are skips
    pub skip_threshold_ms: u64,

    /// Default length of ranked lists
    pub top_n: usize,

    /// Regex over file names selecting history files in `history_dir`
    pub history_file_pattern: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            history_dir: None,
            playlist_file: None,
            library_file: None,
            timezone: "UTC".to_string(),
            skip_threshold_ms: DEFAULT_SKIP_THRESHOLD_MS,
            top_n: DEFAULT_TOP_N,
            history_file_pattern: DEFAULT_HISTORY_FILE_PATTERN.to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Defaults overlaid with `.env` and `PLAYLOG_*` variables.
    pub fn from_env() -> ConfigResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, name)).filter(|v| !v.trim().is_empty())
        };

        let mut config = Self::default();

        if let Some(dir) = var("HISTORY_DIR") {
            config.history_dir = Some(expand_home(&dir));
        }
        if let Some(file) = var("PLAYLIST_FILE") {
            config.playlist_file = Some(expand_home(&file));
        }
        if let Some(file) = var("LIBRARY_FILE") {
            config.library_file = Some(expand_home(&file));
        }
        if let Some(tz) = var("TIMEZONE") {
            config.timezone = tz.trim().to_string();
        }
        if let Some(ms) = var("SKIP_THRESHOLD_MS") {
            config.skip_threshold_ms = parse_number("PLAYLOG_SKIP_THRESHOLD_MS", &ms)?;
        }
        if let Some(n) = var("TOP_N") {
            config.top_n = parse_number("PLAYLOG_TOP_N", &n)?;
        }
        if let Some(pattern) = var("HISTORY_FILE_PATTERN") {
            config.history_file_pattern = pattern;
        }

        Ok(config)
    }

    /// Resolve the presentation zone.
    pub fn zone(&self) -> ConfigResult<Tz> {
        parse_timezone(&self.timezone)
    }

    /// Compile the history file filter.
    pub fn file_filter(&self) -> ConfigResult<Regex> {
        Ok(Regex::new(&self.history_file_pattern)?)
    }

    /// Check every derived value once, up front.
    pub fn validate(&self) -> ConfigResult<()> {
        self.zone()?;
        self.file_filter()?;
        Ok(())
    }
}

/// Parse an IANA zone name such as `America/Chicago`.
pub fn parse_timezone(name: &str) -> ConfigResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| ConfigError::InvalidTimezone {
            name: name.to_string(),
            message: e.to_string(),
        })
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Expand a leading `~/` against `$HOME`.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return Path::new(&home).join(rest);
        }
    }
    PathBuf::from(path)
}
