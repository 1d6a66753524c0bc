use serde::Deserialize;
use serde::Serialize;

/// A date-window query over the history store. Only one query is live at a
/// time; a new query supersedes and discards the previous result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Window start, epoch milliseconds, inclusive.
    pub date_start: i64,
    /// Window end, epoch milliseconds, inclusive.
    pub date_end: i64,
    /// Free-text filter. Trimmed before dispatch; empty means "everything
    /// in the window".
    #[serde(default)]
    pub text: String,
}

impl Query {
    pub fn contains(&self, time: i64) -> bool {
        (self.date_start..=self.date_end).contains(&time)
    }
}

/// A row from the history data source, before enrichment. Host and scheme
/// are derived from the URL on ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseRecord {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Most recent visit time, epoch milliseconds.
    pub time: i64,
}
