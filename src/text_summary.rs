//! Text summary builder for CLI output.
//!
//! Formats a [`DashboardView`] as human-readable lines for text mode.

use crate::model::{DashboardView, ExtractedRecord, OperationLogEntry, Timestamped};
use time::macros::format_description;

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from an assembled dashboard view.
pub(crate) fn build_text_summary(view: &DashboardView) -> TextSummary {
    let mut lines = Vec::new();

    let data = match view {
        DashboardView::Ready(data) => data,
        DashboardView::Degraded { error } => {
            lines.push(error.clone());
            return TextSummary { lines };
        }
    };

    let s = &data.summary;
    lines.push(format!(
        "Extractions: {} total, {} succeeded, {} failed ({:.1}% success)",
        s.processed, s.succeeded, s.failed, s.success_rate_percent
    ));
    lines.push(format!(
        "Found: {} companies, {} products",
        s.companies_found, s.products_found
    ));
    lines.push(format!(
        "Extracted: {} emails, {} phones",
        s.emails_extracted, s.phones_extracted
    ));

    lines.push(String::new());
    lines.push(format!("Recent extractions ({}):", data.recent_records.len()));
    if data.recent_records.is_empty() {
        lines.push("  (none yet)".into());
    }
    for r in &data.recent_records {
        lines.push(format!("  {}", record_line(r)));
    }

    lines.push(String::new());
    lines.push(format!("Recent operations ({}):", data.recent_logs.len()));
    if data.recent_logs.is_empty() {
        lines.push("  (none yet)".into());
    }
    for e in &data.recent_logs {
        lines.push(format!("  {}", log_line(e)));
    }

    TextSummary { lines }
}

/// Short display form of an RFC 3339 timestamp (`2024-05-01 10:00`), or the raw
/// string when it does not parse.
pub(crate) fn short_timestamp(row: &impl Timestamped) -> String {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]");
    row.parsed_timestamp()
        .and_then(|ts| ts.format(&fmt).ok())
        .unwrap_or_else(|| {
            let raw = row.timestamp().trim();
            if raw.is_empty() {
                "-".to_string()
            } else {
                raw.to_string()
            }
        })
}

pub(crate) fn record_line(r: &ExtractedRecord) -> String {
    let mut line = format!("{} {}", short_timestamp(r), r.company_name);
    if let Some(product) = r.product_name.as_deref() {
        line.push_str(&format!(" / {product}"));
    }
    match (r.category.as_deref(), r.subcategory.as_deref()) {
        (Some(c), Some(sc)) => line.push_str(&format!(" [{c} > {sc}]")),
        (Some(c), None) => line.push_str(&format!(" [{c}]")),
        _ => {}
    }
    if !r.emails.is_empty() {
        line.push_str(&format!(" email: {}", r.emails.join(", ")));
    }
    if !r.phones.is_empty() {
        line.push_str(&format!(" phone: {}", r.phones.join(", ")));
    }
    line
}

pub(crate) fn log_line(e: &OperationLogEntry) -> String {
    let mut line = format!(
        "{} {:<7} {}",
        short_timestamp(e),
        e.level.as_str(),
        e.operation
    );
    if !e.message.trim().is_empty() {
        line.push_str(&format!(": {}", e.message));
    }
    line
}
