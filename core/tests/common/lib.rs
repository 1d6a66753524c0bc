//! Scripted collaborators and event-draining helpers for the integration
//! suite.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Result;
use anyhow::anyhow;
use async_trait::async_trait;
use recall_core::BookmarkSource;
use recall_core::FaviconSource;
use recall_core::Feed;
use recall_core::FeedServices;
use recall_core::HistorySource;
use recall_core::MetadataSource;
use recall_protocol::BaseRecord;
use recall_protocol::MetadataFragment;
use recall_protocol::protocol::Event;
use recall_protocol::protocol::EventMsg;
use tokio::sync::Semaphore;

/// How long `wait_for_event` is willing to wait before failing the test.
const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// A history source that replays a scripted result set and records every
/// call made against it.
#[derive(Default)]
pub struct ScriptedHistory {
    results: Mutex<Vec<BaseRecord>>,
    unavailable: AtomicBool,
    pub queries: Mutex<Vec<(i64, i64, String)>>,
    pub deleted_urls: Mutex<Vec<String>>,
    pub deleted_domains: Mutex<Vec<String>>,
}

impl ScriptedHistory {
    pub fn with_results(results: Vec<BaseRecord>) -> Arc<Self> {
        let history = Self::default();
        *history.results.lock().unwrap() = results;
        Arc::new(history)
    }

    pub fn set_results(&self, results: Vec<BaseRecord>) {
        *self.results.lock().unwrap() = results;
    }

    /// Make subsequent queries fail, as if the backing store went away.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl HistorySource for ScriptedHistory {
    async fn query_history(
        &self,
        date_start: i64,
        date_end: i64,
        text: &str,
    ) -> Result<Vec<BaseRecord>> {
        self.queries
            .lock()
            .unwrap()
            .push((date_start, date_end, text.to_string()));
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(anyhow!("places store offline"));
        }
        Ok(self.results.lock().unwrap().clone())
    }

    async fn delete_url(&self, url: &str) -> Result<()> {
        self.deleted_urls.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn delete_by_domain(&self, host: &str) -> Result<()> {
        self.deleted_domains.lock().unwrap().push(host.to_string());
        Ok(())
    }
}

pub struct ScriptedBookmarks {
    bookmarked: HashSet<String>,
}

impl ScriptedBookmarks {
    pub fn new<I: IntoIterator<Item = String>>(urls: I) -> Arc<Self> {
        Arc::new(Self {
            bookmarked: urls.into_iter().collect(),
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::new([])
    }
}

#[async_trait]
impl BookmarkSource for ScriptedBookmarks {
    async fn has_bookmark(&self, url: &str) -> Result<bool> {
        Ok(self.bookmarked.contains(url))
    }
}

/// A favicon source with an optional gate: while the gate holds no permits,
/// lookups park, which lets tests stage late-arriving enrichment.
pub struct ScriptedFavicons {
    icons: Mutex<HashMap<String, String>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedFavicons {
    pub fn new(icons: HashMap<String, String>) -> Arc<Self> {
        Arc::new(Self {
            icons: Mutex::new(icons),
            gate: None,
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::new(HashMap::new())
    }

    pub fn gated(icons: HashMap<String, String>) -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let favicons = Arc::new(Self {
            icons: Mutex::new(icons),
            gate: Some(Arc::clone(&gate)),
        });
        (favicons, gate)
    }
}

#[async_trait]
impl FaviconSource for ScriptedFavicons {
    async fn get_favicon(&self, url: &str) -> Result<Option<String>> {
        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.map_err(|_| anyhow!("gate closed"))?;
            permit.forget();
        }
        Ok(self.icons.lock().unwrap().get(url).cloned())
    }
}

pub struct ScriptedMetadata {
    fragments: HashMap<String, Vec<MetadataFragment>>,
}

impl ScriptedMetadata {
    pub fn new(fragments: HashMap<String, Vec<MetadataFragment>>) -> Arc<Self> {
        Arc::new(Self { fragments })
    }

    pub fn empty() -> Arc<Self> {
        Self::new(HashMap::new())
    }
}

#[async_trait]
impl MetadataSource for ScriptedMetadata {
    async fn find_metadata(&self, url: &str) -> Result<Vec<MetadataFragment>> {
        Ok(self.fragments.get(url).cloned().unwrap_or_default())
    }
}

pub fn services(
    history: Arc<ScriptedHistory>,
    bookmarks: Arc<ScriptedBookmarks>,
    favicons: Arc<ScriptedFavicons>,
    metadata: Arc<ScriptedMetadata>,
) -> FeedServices {
    FeedServices {
        history,
        bookmarks,
        favicons,
        metadata,
    }
}

/// Collaborators that return nothing for every lookup.
pub fn null_services(history: Arc<ScriptedHistory>) -> FeedServices {
    services(
        history,
        ScriptedBookmarks::empty(),
        ScriptedFavicons::empty(),
        ScriptedMetadata::empty(),
    )
}

pub fn base_record(url: &str, title: Option<&str>, time: i64) -> BaseRecord {
    BaseRecord {
        url: url.to_string(),
        title: title.map(str::to_string),
        time,
    }
}

/// Receive events until `pred` matches, returning everything seen up to and
/// including the match. Panics when the match does not arrive in time.
pub async fn wait_for_event<F>(feed: &Feed, pred: F) -> Vec<Event>
where
    F: Fn(&EventMsg) -> bool,
{
    let mut seen = Vec::new();
    loop {
        let event = tokio::time::timeout(WAIT_TIMEOUT, feed.next_event())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for event; saw {seen:?}"))
            .expect("feed session terminated");
        let matched = pred(&event.msg);
        seen.push(event);
        if matched {
            return seen;
        }
    }
}

/// Receive events until the feed goes quiet for `idle`.
pub async fn drain_until_idle(feed: &Feed, idle: Duration) -> Vec<Event> {
    let mut seen = Vec::new();
    while let Ok(Ok(event)) = tokio::time::timeout(idle, feed.next_event()).await {
        seen.push(event);
    }
    seen
}
