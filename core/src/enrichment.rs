//! Per-URL enrichment lookups: favicon, page metadata, and bookmark state,
//! fetched from three independent, independently-latent sources.
//!
//! Each lookup is its own future and its results are delivered the moment
//! it resolves; nothing waits for the other two. A failed or empty lookup
//! simply delivers nothing: the corresponding fields stay unset.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use recall_protocol::RecordPatch;
use tracing::debug;

use crate::sources::BookmarkSource;
use crate::sources::FaviconSource;
use crate::sources::MetadataSource;

/// A resolved lookup: patches to merge, each addressed to a URL.
pub(crate) type Deliveries = Vec<(String, RecordPatch)>;

#[derive(Clone)]
pub(crate) struct EnrichmentFetcher {
    favicons: Arc<dyn FaviconSource>,
    metadata: Arc<dyn MetadataSource>,
    bookmarks: Arc<dyn BookmarkSource>,
}

impl EnrichmentFetcher {
    pub(crate) fn new(
        favicons: Arc<dyn FaviconSource>,
        metadata: Arc<dyn MetadataSource>,
        bookmarks: Arc<dyn BookmarkSource>,
    ) -> Self {
        Self {
            favicons,
            metadata,
            bookmarks,
        }
    }

    /// The three independent lookups for one URL. The caller drives them
    /// (typically through a `FuturesUnordered`) and routes each delivery
    /// into the store as it arrives.
    pub(crate) fn fetch(&self, url: String) -> [BoxFuture<'static, Deliveries>; 3] {
        [
            self.favicon_lookup(url.clone()),
            self.metadata_lookup(url.clone()),
            self.bookmark_lookup(url),
        ]
    }

    fn favicon_lookup(&self, url: String) -> BoxFuture<'static, Deliveries> {
        let favicons = Arc::clone(&self.favicons);
        async move {
            match favicons.get_favicon(&url).await {
                Ok(Some(icon)) => vec![(
                    url,
                    RecordPatch {
                        icon: Some(icon),
                        ..Default::default()
                    },
                )],
                Ok(None) => Vec::new(),
                Err(err) => {
                    debug!("favicon lookup failed for {url}: {err:#}");
                    Vec::new()
                }
            }
        }
        .boxed()
    }

    fn metadata_lookup(&self, url: String) -> BoxFuture<'static, Deliveries> {
        let metadata = Arc::clone(&self.metadata);
        async move {
            match metadata.find_metadata(&url).await {
                Ok(fragments) => fragments
                    .into_iter()
                    .map(|fragment| (fragment.url.clone(), RecordPatch::from(fragment)))
                    .collect(),
                Err(err) => {
                    debug!("metadata lookup failed for {url}: {err:#}");
                    Vec::new()
                }
            }
        }
        .boxed()
    }

    /// Bookmark state is only delivered when positive; records start out
    /// unbookmarked and live `bookmark-item-removed` events handle the
    /// transition back.
    fn bookmark_lookup(&self, url: String) -> BoxFuture<'static, Deliveries> {
        let bookmarks = Arc::clone(&self.bookmarks);
        async move {
            match bookmarks.has_bookmark(&url).await {
                Ok(true) => vec![(
                    url,
                    RecordPatch {
                        bookmarked: Some(true),
                        ..Default::default()
                    },
                )],
                Ok(false) => Vec::new(),
                Err(err) => {
                    debug!("bookmark lookup failed for {url}: {err:#}");
                    Vec::new()
                }
            }
        }
        .boxed()
    }
}
