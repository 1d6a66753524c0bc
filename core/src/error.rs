use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecallErr>;

/// Failures that can cross the crate boundary. Everything else in the
/// pipeline degrades locally: transient lookup failures leave a field
/// unset, stale enrichment is discarded, unknown raw events are ignored.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecallErr {
    /// The history data source could not serve a query. The collection is
    /// left at its previous state.
    #[error("history source unavailable: {0}")]
    HistorySource(anyhow::Error),

    /// The session's queue pair has been dropped; no further submissions or
    /// events are possible.
    #[error("feed session terminated")]
    SessionTerminated,
}
