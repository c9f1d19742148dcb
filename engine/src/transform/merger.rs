//! Merge per-file normalization outcomes into one dataset.
//!
//! ```text
//! endsong_0.json ─► Ok(batch) ──┐
//! endsong_1.json ─► Ok(batch) ──┼──► NormalizedDataset (file order)
//! Userdata.json  ─► Err(...)  ──┘    + loaded / skipped file report
//! ```

use serde::Serialize;

use super::normalizer::{NormalizedBatch, SchemaVariant};
use crate::error::LoadError;
use crate::models::NormalizedDataset;

/// Outcome of loading one history file, in encounter order
#[derive(Debug)]
pub struct FileOutcome {
    pub file: String,
    pub result: Result<NormalizedBatch, LoadError>,
}

impl FileOutcome {
    pub fn new(file: impl Into<String>, result: Result<NormalizedBatch, LoadError>) -> Self {
        Self { file: file.into(), result }
    }
}

/// A file that contributed records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedFile {
    pub file: String,
    pub variant: SchemaVariant,
    pub records: usize,
    pub skipped_records: usize,
}

/// A file left out of the dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

/// Merged dataset plus per-file bookkeeping
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    #[serde(skip)]
    pub dataset: NormalizedDataset,
    pub loaded: Vec<LoadedFile>,
    pub skipped: Vec<SkippedFile>,
}

impl MergeReport {
    pub fn record_count(&self) -> usize {
        self.dataset.len()
    }

    /// Records dropped inside otherwise loaded files.
    pub fn skipped_record_count(&self) -> usize {
        self.loaded.iter().map(|f| f.skipped_records).sum()
    }
}

/// Concatenate successful batches in the order given.
///
/// Failed outcomes are reported, never fatal. No outcomes, or only failures,
/// yield an empty dataset.
pub fn merge(outcomes: Vec<FileOutcome>) -> MergeReport {
    let mut events = Vec::new();
    let mut loaded = Vec::new();
    let mut skipped = Vec::new();

    for outcome in outcomes {
        match outcome.result {
            Ok(batch) => {
                loaded.push(LoadedFile {
                    file: outcome.file,
                    variant: batch.variant,
                    records: batch.events.len(),
                    skipped_records: batch.skipped.len(),
                });
                events.extend(batch.events);
            }
            Err(err) => skipped.push(SkippedFile {
                file: outcome.file,
                reason: err.to_string(),
            }),
        }
    }

    MergeReport {
        dataset: NormalizedDataset::new(events),
        loaded,
        skipped,
    }
}
