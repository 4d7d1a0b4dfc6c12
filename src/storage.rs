//! Read-only access to the pipeline's records and operations log.
//!
//! Both stores are JSON-lines files appended to by the extraction pipeline.
//! The dashboard never writes to them.

use crate::error::DashboardError;
use crate::model::{ExtractedRecord, OperationLogEntry, Timestamped};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::io::{BufRead, BufReader};
use std::marker::PhantomData;
use std::path::PathBuf;
use time::OffsetDateTime;

pub const STATS_FILE: &str = "stats.json";
pub const RECORDS_FILE: &str = "records.jsonl";
pub const OPERATIONS_FILE: &str = "operations.jsonl";
pub const LOG_FILE: &str = "dashboard.log";

/// Recency query over extracted records, most recent first.
pub trait RecordsStore: Send + Sync {
    fn get_recent(&self, limit: usize) -> Result<Vec<ExtractedRecord>, DashboardError>;
}

/// Recency query over operations-log entries, most recent first.
pub trait LogStore: Send + Sync {
    fn get_recent(&self, limit: usize) -> Result<Vec<OperationLogEntry>, DashboardError>;
}

/// Default data directory shared with the pipeline.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .context("could not resolve a data directory; pass --data-dir")?;
    Ok(base.join("extraction-dashboard"))
}

/// A JSON-lines file holding one row per line.
#[derive(Debug, Clone)]
pub struct JsonlStore<T> {
    path: PathBuf,
    label: &'static str,
    _rows: PhantomData<fn() -> T>,
}

pub type RecordsFile = JsonlStore<ExtractedRecord>;
pub type OperationsFile = JsonlStore<OperationLogEntry>;

impl RecordsFile {
    pub fn records(path: impl Into<PathBuf>) -> Self {
        Self::new(path, "records store")
    }
}

impl OperationsFile {
    pub fn operations(path: impl Into<PathBuf>) -> Self {
        Self::new(path, "operations log")
    }
}

impl<T> JsonlStore<T> {
    pub fn new(path: impl Into<PathBuf>, label: &'static str) -> Self {
        Self {
            path: path.into(),
            label,
            _rows: PhantomData,
        }
    }
}

impl<T: DeserializeOwned + Timestamped> JsonlStore<T> {
    /// Load at most `limit` rows, newest first.
    ///
    /// Rows are ordered by their RFC 3339 timestamp; ties fall back to reverse
    /// file order, and rows without a parseable timestamp come after all dated
    /// rows. Only the best `limit` rows are held while the file is scanned.
    pub fn load_recent(&self, limit: usize) -> Result<Vec<T>, DashboardError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let file = match std::fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(store = self.label, path = %self.path.display(), "store file not found, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let mut reader = BufReader::new(file);
        let mut newest: BinaryHeap<Reverse<Ranked<T>>> = BinaryHeap::with_capacity(limit + 1);
        let mut line = Vec::new();
        for idx in 0.. {
            line.clear();
            if reader
                .read_until(b'\n', &mut line)
                .map_err(|e| self.io_error(e))?
                == 0
            {
                break;
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            // Invalid UTF-8 surfaces here as a parse error, same as bad JSON.
            let row = match serde_json::from_slice::<T>(&line) {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!(store = self.label, line = idx + 1, error = %e, "skipping malformed row");
                    continue;
                }
            };
            newest.push(Reverse(Ranked {
                key: (row.parsed_timestamp(), idx),
                row,
            }));
            if newest.len() > limit {
                newest.pop();
            }
        }

        // Ascending order of `Reverse` is descending recency.
        Ok(newest
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(ranked)| ranked.row)
            .collect())
    }

    fn io_error(&self, e: std::io::Error) -> DashboardError {
        DashboardError::unavailable(self.label, format!("{}: {e}", self.path.display()))
    }
}

/// A row tagged with its recency key: timestamp, then position in the file.
struct Ranked<T> {
    key: (Option<OffsetDateTime>, usize),
    row: T,
}

impl<T> PartialEq for Ranked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for Ranked<T> {}

impl<T> PartialOrd for Ranked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Ranked<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl RecordsStore for RecordsFile {
    fn get_recent(&self, limit: usize) -> Result<Vec<ExtractedRecord>, DashboardError> {
        self.load_recent(limit)
    }
}

impl LogStore for OperationsFile {
    fn get_recent(&self, limit: usize) -> Result<Vec<OperationLogEntry>, DashboardError> {
        self.load_recent(limit)
    }
}
