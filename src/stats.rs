//! Extraction run counters.
//!
//! The pipeline owns the writes; the dashboard only ever takes snapshots.

use crate::error::DashboardError;
use crate::model::StatsSnapshot;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// Anything the dashboard can read a counter snapshot from.
pub trait StatsSource: Send + Sync {
    fn snapshot(&self) -> Result<StatsSnapshot, DashboardError>;
}

/// Live, lock-free accumulator shared between the pipeline (writer) and
/// dashboard requests (readers).
#[derive(Debug, Default)]
pub struct RunStatistics {
    processed: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    companies_found: AtomicU64,
    products_found: AtomicU64,
    emails_extracted: AtomicU64,
    phones_extracted: AtomicU64,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an accumulator from a previously persisted snapshot.
    pub fn from_snapshot(snap: StatsSnapshot) -> Self {
        Self {
            processed: AtomicU64::new(snap.processed),
            succeeded: AtomicU64::new(snap.succeeded),
            failed: AtomicU64::new(snap.failed),
            companies_found: AtomicU64::new(snap.companies_found),
            products_found: AtomicU64::new(snap.products_found),
            emails_extracted: AtomicU64::new(snap.emails_extracted),
            phones_extracted: AtomicU64::new(snap.phones_extracted),
        }
    }

    /// Pipeline write: an extraction attempt started.
    pub fn record_attempt(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Pipeline write: a started attempt finished successfully.
    pub fn record_success(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    /// Pipeline write: a started attempt failed.
    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Pipeline write: a company page was extracted along with its contacts.
    pub fn record_company(&self, emails: u64, phones: u64) {
        self.companies_found.fetch_add(1, Ordering::Relaxed);
        self.emails_extracted.fetch_add(emails, Ordering::Relaxed);
        self.phones_extracted.fetch_add(phones, Ordering::Relaxed);
    }

    pub fn record_product(&self) {
        self.products_found.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counters. Each counter is loaded independently, so a
    /// snapshot taken during a write may be off by one across counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            companies_found: self.companies_found.load(Ordering::Relaxed),
            products_found: self.products_found.load(Ordering::Relaxed),
            emails_extracted: self.emails_extracted.load(Ordering::Relaxed),
            phones_extracted: self.phones_extracted.load(Ordering::Relaxed),
        }
    }
}

impl StatsSource for RunStatistics {
    fn snapshot(&self) -> Result<StatsSnapshot, DashboardError> {
        Ok(RunStatistics::snapshot(self))
    }
}

/// Counters persisted by an out-of-process pipeline as `stats.json`.
#[derive(Debug, Clone)]
pub struct StatsFile {
    path: PathBuf,
}

impl StatsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StatsSource for StatsFile {
    fn snapshot(&self) -> Result<StatsSnapshot, DashboardError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            // No file yet means the pipeline has not run.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StatsSnapshot::default())
            }
            Err(e) => {
                return Err(DashboardError::unavailable(
                    "statistics file",
                    format!("{}: {e}", self.path.display()),
                ))
            }
        };
        if raw.trim().is_empty() {
            return Ok(StatsSnapshot::default());
        }
        serde_json::from_str(&raw).map_err(|e| {
            DashboardError::unavailable(
                "statistics file",
                format!("{}: {e}", self.path.display()),
            )
        })
    }
}
