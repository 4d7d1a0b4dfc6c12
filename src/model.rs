use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Point-in-time copy of the pipeline counters.
///
/// This is also the on-disk shape of `stats.json`; every counter defaults to
/// zero so a partially written file from an older pipeline still loads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    #[serde(default)]
    pub processed: u64,
    #[serde(default)]
    pub succeeded: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub companies_found: u64,
    #[serde(default)]
    pub products_found: u64,
    #[serde(default)]
    pub emails_extracted: u64,
    #[serde(default)]
    pub phones_extracted: u64,
}

impl StatsSnapshot {
    /// Check `succeeded + failed <= processed`.
    pub fn validate(&self) -> Result<(), crate::error::DashboardError> {
        if self.succeeded.saturating_add(self.failed) > self.processed {
            return Err(crate::error::DashboardError::MalformedStatistics {
                processed: self.processed,
                succeeded: self.succeeded,
                failed: self.failed,
            });
        }
        Ok(())
    }
}

/// Figures shown to the operator, derived from a [`StatsSnapshot`] per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    #[serde(rename = "total_extractions")]
    pub processed: u64,
    #[serde(rename = "successful_extractions")]
    pub succeeded: u64,
    #[serde(rename = "failed_extractions")]
    pub failed: u64,
    #[serde(rename = "success_rate")]
    pub success_rate_percent: f64,
    pub companies_found: u64,
    pub products_found: u64,
    pub emails_extracted: u64,
    pub phones_extracted: u64,
}

/// A company/product row produced by the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub company_name: String,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub extracted_at: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

/// One entry of the pipeline's operations log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationLogEntry {
    pub operation: String,
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: String,
}

/// Rows that carry a recency timestamp.
pub trait Timestamped {
    fn timestamp(&self) -> &str;

    fn parsed_timestamp(&self) -> Option<OffsetDateTime> {
        parse_timestamp(self.timestamp())
    }
}

impl Timestamped for ExtractedRecord {
    fn timestamp(&self) -> &str {
        &self.extracted_at
    }
}

impl Timestamped for OperationLogEntry {
    fn timestamp(&self) -> &str {
        &self.created_at
    }
}

pub fn parse_timestamp(s: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(s.trim(), &Rfc3339).ok()
}

/// Everything a fully loaded dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardData {
    #[serde(rename = "stats")]
    pub summary: DashboardSummary,
    #[serde(rename = "recent_extractions")]
    pub recent_records: Vec<ExtractedRecord>,
    pub recent_logs: Vec<OperationLogEntry>,
}

/// Outcome of one dashboard request. Presentation layers match on this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DashboardView {
    Ready(DashboardData),
    Degraded { error: String },
}

impl DashboardView {
    pub fn error(&self) -> Option<&str> {
        match self {
            DashboardView::Ready(_) => None,
            DashboardView::Degraded { error } => Some(error),
        }
    }

    pub fn data(&self) -> Option<&DashboardData> {
        match self {
            DashboardView::Ready(data) => Some(data),
            DashboardView::Degraded { .. } => None,
        }
    }
}
