//! Load streaming history from disk into a [`NormalizedDataset`].
//!
//! Files are decoded and normalized on blocking tasks, then put back in
//! lexical file-name order before merging, so the dataset order is the same
//! on every run regardless of which task finished first.
//!
//! # Example
//!
//! ```rust,ignore
//! use playlog::{load_history, AnalysisConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnalysisConfig::from_env()?;
//!     let report = load_history(&config).await?;
//!     println!("Loaded {} streaming events", report.record_count());
//!     Ok(())
//! }
//! ```
//!
//! [`NormalizedDataset`]: crate::models::NormalizedDataset

use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;

use super::merger::{merge, FileOutcome, MergeReport};
use super::normalizer::normalize_records;
use crate::config::AnalysisConfig;
use crate::error::{LoadError, LoadResult, PipelineError, PipelineResult};
use crate::logs::{
    log_error, log_info, log_info_indent, log_success, log_warning, log_warning_indent,
};
use crate::parser::{display_name, parse_file_auto};

/// Skipped-record reasons echoed per file; the rest are only counted.
const MAX_LOGGED_RECORD_SKIPS: usize = 3;

/// Load the configured history directory.
pub async fn load_history(config: &AnalysisConfig) -> PipelineResult<MergeReport> {
    let dir = config
        .history_dir
        .as_deref()
        .ok_or(PipelineError::MissingInput("history directory"))?;
    let filter = config.file_filter()?;
    Ok(load_history_dir(dir, &filter).await?)
}

/// Load every file in `dir` whose name matches `filter`.
pub async fn load_history_dir(dir: &Path, filter: &Regex) -> LoadResult<MergeReport> {
    let paths = list_history_files(dir, filter).await?;
    Ok(load_history_files(paths).await)
}

/// Files in `dir` matching `filter`, sorted by file name.
///
/// Directories are left out. Symlinks count as the file they point to.
pub async fn list_history_files(dir: &Path, filter: &Regex) -> LoadResult<Vec<PathBuf>> {
    let dir_error = |source| LoadError::Directory {
        dir: dir.display().to_string(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(dir_error)?;
    let mut paths = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(dir_error)? {
        if !filter.is_match(&entry.file_name().to_string_lossy()) {
            continue;
        }
        // Follows symlinks. An unreadable entry is kept so loading reports it as skipped.
        match tokio::fs::metadata(entry.path()).await {
            Ok(meta) if !meta.is_file() => {}
            _ => paths.push(entry.path()),
        }
    }

    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

/// Load the given files concurrently and merge them in the order given.
pub async fn load_history_files(paths: Vec<PathBuf>) -> MergeReport {
    log_info(format!("📂 Loading {} streaming history file(s)...", paths.len()));

    let mut tasks = JoinSet::new();
    for (index, path) in paths.iter().cloned().enumerate() {
        tasks.spawn_blocking(move || (index, load_history_file(&path)));
    }

    let mut slots: Vec<Option<FileOutcome>> = paths.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        if let Ok((index, outcome)) = joined {
            slots[index] = Some(outcome);
        }
    }

    let outcomes: Vec<FileOutcome> = slots
        .into_iter()
        .zip(&paths)
        .map(|(slot, path)| {
            slot.unwrap_or_else(|| {
                let file = display_name(path);
                FileOutcome::new(
                    file.clone(),
                    Err(LoadError::Task {
                        file,
                        message: "task panicked or was cancelled".to_string(),
                    }),
                )
            })
        })
        .collect();

    for outcome in &outcomes {
        log_outcome(outcome);
    }

    let report = merge(outcomes);
    log_summary(&report);
    report
}

/// Decode and normalize one file.
pub fn load_history_file(path: &Path) -> FileOutcome {
    let file = display_name(path);
    let result = parse_file_auto(path)
        .map_err(|source| LoadError::Decode {
            file: file.clone(),
            source,
        })
        .and_then(|doc| Ok(normalize_records(&file, &doc.value)?));
    FileOutcome::new(file, result)
}

fn log_outcome(outcome: &FileOutcome) {
    match &outcome.result {
        Ok(batch) => {
            log_success(format!(
                "Loaded: {}  ({} records, {} format)",
                outcome.file,
                batch.events.len(),
                batch.variant
            ));
            if !batch.skipped.is_empty() {
                log_warning_indent(
                    format!("{} record(s) could not be mapped", batch.skipped.len()),
                    1,
                );
                for skip in batch.skipped.iter().take(MAX_LOGGED_RECORD_SKIPS) {
                    log_info_indent(format!("• record {}: {}", skip.index, skip.reason), 1);
                }
            }
        }
        Err(err) => log_error(format!("Skipped: {}  ({})", outcome.file, err)),
    }
}

fn log_summary(report: &MergeReport) {
    if report.dataset.is_empty() {
        log_warning("No streaming events loaded; queries will return empty results");
    } else {
        log_success(format!(
            "{} streaming events from {} file(s), {} file(s) skipped",
            report.record_count(),
            report.loaded.len(),
            report.skipped.len()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_HISTORY_FILE_PATTERN;
    use crate::logs::LOG_BROADCASTER;
    use std::fs;

    fn filter() -> Regex {
        Regex::new(DEFAULT_HISTORY_FILE_PATTERN).unwrap()
    }

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[tokio::test]
    async fn test_load_mixed_directory() {
        LOG_BROADCASTER.set_quiet(true);
        let dir = tempfile::tempdir().unwrap();

        write(
            dir.path(),
            "StreamingHistory1.json",
            r#"[{"endTime": "2023-06-02 09:00", "artistName": "B", "trackName": "b2",
                 "msPlayed": 2000}]"#,
        );
        write(
            dir.path(),
            "StreamingHistory0.json",
            r#"[{"endTime": "2023-06-01 09:00", "artistName": "A", "trackName": "a1",
                 "msPlayed": 1000},
                {"endTime": "2023-06-01 09:05", "artistName": "A", "trackName": "a2",
                 "msPlayed": 1500}]"#,
        );
        write(dir.path(), "Userdata.json", r#"{"username": "me"}"#);
        write(dir.path(), "broken.json", "[{");
        write(dir.path(), "notes.txt", "not json");

        let report = load_history_dir(dir.path(), &filter()).await.unwrap();

        let tracks: Vec<&str> = report.dataset.iter().map(|e| e.track_name()).collect();
        assert_eq!(tracks, vec!["a1", "a2", "b2"]);

        let loaded: Vec<&str> = report.loaded.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(loaded, vec!["StreamingHistory0.json", "StreamingHistory1.json"]);

        let skipped: Vec<&str> = report.skipped.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(skipped, vec!["Userdata.json", "broken.json"]);
    }

    #[tokio::test]
    async fn test_order_is_lexical_not_completion() {
        LOG_BROADCASTER.set_quiet(true);
        let dir = tempfile::tempdir().unwrap();

        // A large first file finishes after the small ones
        let big: Vec<String> = (0..5000)
            .map(|i| {
                serde_json::json!({
                    "ts": "2022-01-01T00:00:00Z",
                    "ms_played": i,
                    "master_metadata_track_name": "a"
                })
                .to_string()
            })
            .collect();
        write(dir.path(), "endsong_0.json", &format!("[{}]", big.join(",")));
        write(
            dir.path(),
            "endsong_1.json",
            r#"[{"ts": "2022-01-01T00:00:00Z", "ms_played": 1,
                 "master_metadata_track_name": "b"}]"#,
        );

        let report = load_history_dir(dir.path(), &filter()).await.unwrap();
        assert_eq!(report.record_count(), 5001);
        assert_eq!(report.dataset.events()[0].track_name(), "a");
        assert_eq!(report.dataset.events()[5000].track_name(), "b");
    }

    #[tokio::test]
    async fn test_empty_directory_gives_empty_dataset() {
        LOG_BROADCASTER.set_quiet(true);
        let dir = tempfile::tempdir().unwrap();
        let report = load_history_dir(dir.path(), &filter()).await.unwrap();
        assert!(report.dataset.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinked_history_file_is_loaded() {
        use std::os::unix::fs::symlink;

        LOG_BROADCASTER.set_quiet(true);
        let store = tempfile::tempdir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        write(
            store.path(),
            "data.bin",
            r#"[{"ts": "2022-03-01T12:00:00Z", "ms_played": 9000,
                 "master_metadata_track_name": "linked"}]"#,
        );
        symlink(store.path().join("data.bin"), dir.path().join("endsong_0.json")).unwrap();
        fs::create_dir(dir.path().join("endsong_9.json")).unwrap();

        let paths = list_history_files(dir.path(), &filter()).await.unwrap();
        assert_eq!(paths, vec![dir.path().join("endsong_0.json")]);

        let report = load_history_files(paths).await;
        assert_eq!(report.record_count(), 1);
        assert_eq!(report.dataset.events()[0].track_name(), "linked");
        assert!(report.skipped.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dangling_symlink_is_reported_as_skipped() {
        use std::os::unix::fs::symlink;

        LOG_BROADCASTER.set_quiet(true);
        let dir = tempfile::tempdir().unwrap();
        symlink(dir.path().join("gone.json"), dir.path().join("endsong_1.json")).unwrap();
        write(
            dir.path(),
            "endsong_0.json",
            r#"[{"ts": "2022-03-01T12:00:00Z", "ms_played": 1,
                 "master_metadata_track_name": "a"}]"#,
        );

        let report = load_history_dir(dir.path(), &filter()).await.unwrap();
        assert_eq!(report.record_count(), 1);
        let skipped: Vec<&str> = report.skipped.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(skipped, vec!["endsong_1.json"]);
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let err = load_history_dir(Path::new("/definitely/not/here"), &filter())
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Directory { .. }));
    }

    #[tokio::test]
    async fn test_missing_history_dir_config() {
        let err = load_history(&AnalysisConfig::default()).await.unwrap_err();
        assert!(matches!(err, PipelineError::MissingInput(_)));
    }
}
