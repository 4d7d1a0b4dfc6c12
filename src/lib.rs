//! Operator dashboard over the extraction pipeline's results.
//!
//! The pipeline links [`stats::RunStatistics`] to count its work and appends
//! rows to the JSON-lines stores in [`storage`]; the dashboard binary reads
//! them back through [`dashboard::DashboardQueryFacade`].

pub mod cli;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod model;
#[cfg(feature = "tui")]
mod orchestrator;
pub mod stats;
pub mod storage;
pub mod taxonomy;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;
