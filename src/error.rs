use thiserror::Error;

/// Failures raised by the statistics source and the recency stores.
///
/// Everything here is recoverable: the dashboard assembly step turns any of
/// these into a degraded view instead of failing the request.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("{store} is unavailable: {reason}")]
    StoreUnavailable { store: &'static str, reason: String },
    #[error(
        "malformed statistics: succeeded ({succeeded}) + failed ({failed}) exceeds processed ({processed})"
    )]
    MalformedStatistics {
        processed: u64,
        succeeded: u64,
        failed: u64,
    },
}

impl DashboardError {
    pub fn unavailable(store: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::StoreUnavailable {
            store,
            reason: reason.to_string(),
        }
    }
}
