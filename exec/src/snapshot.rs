//! A file-backed rendition of the four collaborator stores, for driving a
//! feed session without a live browser profile.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use anyhow::Context;
use anyhow::Result;
use async_trait::async_trait;
use recall_core::BookmarkSource;
use recall_core::FaviconSource;
use recall_core::FeedServices;
use recall_core::HistorySource;
use recall_core::MetadataSource;
use recall_protocol::BaseRecord;
use recall_protocol::MetadataFragment;
use serde::Deserialize;

/// On-disk shape: `{history, bookmarks, favicons, metadata}`, all optional.
#[derive(Debug, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub history: Vec<BaseRecord>,
    #[serde(default)]
    pub bookmarks: Vec<String>,
    #[serde(default)]
    pub favicons: HashMap<String, String>,
    #[serde(default)]
    pub metadata: HashMap<String, Vec<MetadataFragment>>,
}

impl Snapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse snapshot {}", path.display()))
    }
}

/// Serves all four collaborator contracts from one snapshot. Deletions
/// mutate the in-memory copy so a forwarded delete is visible to later
/// queries in the same run.
pub struct SnapshotSource {
    history: Mutex<Vec<BaseRecord>>,
    bookmarks: Vec<String>,
    favicons: HashMap<String, String>,
    metadata: HashMap<String, Vec<MetadataFragment>>,
}

impl SnapshotSource {
    pub fn new(snapshot: Snapshot) -> Arc<Self> {
        Arc::new(Self {
            history: Mutex::new(snapshot.history),
            bookmarks: snapshot.bookmarks,
            favicons: snapshot.favicons,
            metadata: snapshot.metadata,
        })
    }

    pub fn services(self: &Arc<Self>) -> FeedServices {
        FeedServices {
            history: Arc::clone(self) as Arc<dyn HistorySource>,
            bookmarks: Arc::clone(self) as Arc<dyn BookmarkSource>,
            favicons: Arc::clone(self) as Arc<dyn FaviconSource>,
            metadata: Arc::clone(self) as Arc<dyn MetadataSource>,
        }
    }

    fn matches(record: &BaseRecord, text: &str) -> bool {
        if text.is_empty() {
            return true;
        }
        let needle = text.to_lowercase();
        record.url.to_lowercase().contains(&needle)
            || record
                .title
                .as_deref()
                .is_some_and(|title| title.to_lowercase().contains(&needle))
    }

    fn host_of(url: &str) -> Option<String> {
        url::Url::parse(url)
            .ok()
            .and_then(|parsed| parsed.host_str().map(str::to_string))
    }
}

#[async_trait]
impl HistorySource for SnapshotSource {
    async fn query_history(
        &self,
        date_start: i64,
        date_end: i64,
        text: &str,
    ) -> Result<Vec<BaseRecord>> {
        let mut rows: Vec<BaseRecord> = self
            .history
            .lock()
            .map_err(|_| anyhow::anyhow!("snapshot history poisoned"))?
            .iter()
            .filter(|record| (date_start..=date_end).contains(&record.time))
            .filter(|record| Self::matches(record, text))
            .cloned()
            .collect();
        rows.sort_by_key(|record| std::cmp::Reverse(record.time));
        Ok(rows)
    }

    async fn delete_url(&self, url: &str) -> Result<()> {
        self.history
            .lock()
            .map_err(|_| anyhow::anyhow!("snapshot history poisoned"))?
            .retain(|record| record.url != url);
        Ok(())
    }

    async fn delete_by_domain(&self, host: &str) -> Result<()> {
        self.history
            .lock()
            .map_err(|_| anyhow::anyhow!("snapshot history poisoned"))?
            .retain(|record| Self::host_of(&record.url).as_deref() != Some(host));
        Ok(())
    }
}

#[async_trait]
impl BookmarkSource for SnapshotSource {
    async fn has_bookmark(&self, url: &str) -> Result<bool> {
        Ok(self.bookmarks.iter().any(|bookmarked| bookmarked == url))
    }
}

#[async_trait]
impl FaviconSource for SnapshotSource {
    async fn get_favicon(&self, url: &str) -> Result<Option<String>> {
        Ok(self.favicons.get(url).cloned())
    }
}

#[async_trait]
impl MetadataSource for SnapshotSource {
    async fn find_metadata(&self, url: &str) -> Result<Vec<MetadataFragment>> {
        Ok(self.metadata.get(url).cloned().unwrap_or_default())
    }
}
