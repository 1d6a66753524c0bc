//! Abstract contracts for the external stores the pipeline depends on.
//!
//! Each component receives the collaborators it needs at construction;
//! there are no ambient singletons. Live raw events and asynchronously
//! discovered metadata reach the session as submissions (transport between
//! processes is out of scope here).

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use recall_protocol::BaseRecord;
use recall_protocol::MetadataFragment;

/// The authoritative history store: serves date-window queries and accepts
/// deletions forwarded from the feed.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Records whose most recent visit falls inside `[date_start,
    /// date_end]` (epoch ms, inclusive), matching the trimmed free-text
    /// filter. Expected in reverse-chronological order.
    async fn query_history(
        &self,
        date_start: i64,
        date_end: i64,
        text: &str,
    ) -> Result<Vec<BaseRecord>>;

    async fn delete_url(&self, url: &str) -> Result<()>;

    async fn delete_by_domain(&self, host: &str) -> Result<()>;
}

#[async_trait]
pub trait BookmarkSource: Send + Sync {
    async fn has_bookmark(&self, url: &str) -> Result<bool>;
}

#[async_trait]
pub trait FaviconSource: Send + Sync {
    /// Favicon URL for a page, or `None` when the store has none.
    async fn get_favicon(&self, url: &str) -> Result<Option<String>>;
}

#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Zero or more metadata fragments known for a URL. Fragments merge
    /// independently, later ones winning field by field.
    async fn find_metadata(&self, url: &str) -> Result<Vec<MetadataFragment>>;
}

/// The collaborator bundle a feed session is spawned with.
#[derive(Clone)]
pub struct FeedServices {
    pub history: Arc<dyn HistorySource>,
    pub bookmarks: Arc<dyn BookmarkSource>,
    pub favicons: Arc<dyn FaviconSource>,
    pub metadata: Arc<dyn MetadataSource>,
}
