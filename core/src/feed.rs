//! The feed session: a queue pair where the display layer sends
//! submissions and receives change notifications, with all collection
//! mutation funneled through one serialized entry point.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use async_channel::Receiver;
use async_channel::Sender;
use recall_protocol::DomainEvent;
use recall_protocol::FeedId;
use recall_protocol::MetadataFragment;
use recall_protocol::RecordPatch;
use recall_protocol::protocol::ErrorEvent;
use recall_protocol::protocol::Event;
use recall_protocol::protocol::EventMsg;
use recall_protocol::protocol::FeedConfiguredEvent;
use recall_protocol::protocol::Op;
use recall_protocol::protocol::RecordsResponseEvent;
use recall_protocol::protocol::Submission;
use tokio::sync::Mutex;
use tokio_util::task::AbortOnDropHandle;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::coordinator;
use crate::enrichment::EnrichmentFetcher;
use crate::error::RecallErr;
use crate::error::Result;
use crate::normalizer;
use crate::sources::FeedServices;
use crate::store::HistoryStore;

/// The high-level interface to the feed engine.
/// It operates as a queue pair where you send submissions and receive events.
pub struct Feed {
    next_id: AtomicU64,
    tx_sub: Sender<Submission>,
    rx_event: Receiver<Event>,
}

/// Wrapper returned by [`Feed::spawn`] containing the spawned [`Feed`] and
/// the unique session id.
pub struct FeedSpawnOk {
    pub feed: Feed,
    pub feed_id: FeedId,
}

pub(crate) const INITIAL_SUBMIT_ID: &str = "";
pub(crate) const SUBMISSION_CHANNEL_CAPACITY: usize = 64;

impl Feed {
    /// Spawn a new [`Feed`] session over the given collaborators. The first
    /// event on the queue is `FeedConfigured`.
    pub fn spawn(services: FeedServices) -> FeedSpawnOk {
        let (tx_sub, rx_sub) = async_channel::bounded(SUBMISSION_CHANNEL_CAPACITY);
        let (tx_event, rx_event) = async_channel::unbounded();

        let feed_id = FeedId::new();
        let session = Arc::new(Session::new(feed_id, services, tx_event));

        // This task runs until Op::Shutdown is received or the submission
        // side is dropped.
        tokio::spawn(async move {
            session
                .send_event(
                    INITIAL_SUBMIT_ID,
                    EventMsg::FeedConfigured(FeedConfiguredEvent { feed_id }),
                )
                .await;
            submission_loop(session, rx_sub).await;
        });

        let feed = Feed {
            next_id: AtomicU64::new(0),
            tx_sub,
            rx_event,
        };
        FeedSpawnOk { feed, feed_id }
    }

    /// Submit the `op` wrapped in a `Submission` with a unique ID.
    pub async fn submit(&self, op: Op) -> Result<String> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let sub = Submission { id: id.clone(), op };
        self.submit_with_id(sub).await?;
        Ok(id)
    }

    /// Use sparingly: prefer `submit()` so the feed is responsible for
    /// generating unique IDs for each submission.
    pub async fn submit_with_id(&self, sub: Submission) -> Result<()> {
        self.tx_sub
            .send(sub)
            .await
            .map_err(|_| RecallErr::SessionTerminated)
    }

    pub async fn next_event(&self) -> Result<Event> {
        self.rx_event
            .recv()
            .await
            .map_err(|_| RecallErr::SessionTerminated)
    }
}

/// Context for a running feed session.
///
/// A session has at most one live query at a time; a new query supersedes
/// the previous one and invalidates its in-flight enrichment.
pub(crate) struct Session {
    pub(crate) feed_id: FeedId,
    tx_event: Sender<Event>,
    pub(crate) state: Mutex<SessionState>,
    /// Handle for the live query's enrichment fan-out; dropping it aborts
    /// the task. Staleness is still enforced by generation tag: a result
    /// that outruns the abort is rejected in `deliver_enrichment`.
    pub(crate) active_query: Mutex<Option<AbortOnDropHandle<()>>>,
    pub(crate) services: FeedServices,
    pub(crate) fetcher: EnrichmentFetcher,
}

pub(crate) struct SessionState {
    pub(crate) store: HistoryStore,
    /// Monotonically increasing id tagging a query and its spawned
    /// enrichment fetches.
    pub(crate) generation: u64,
}

impl Session {
    fn new(feed_id: FeedId, services: FeedServices, tx_event: Sender<Event>) -> Self {
        let fetcher = EnrichmentFetcher::new(
            Arc::clone(&services.favicons),
            Arc::clone(&services.metadata),
            Arc::clone(&services.bookmarks),
        );
        Self {
            feed_id,
            tx_event,
            state: Mutex::new(SessionState {
                store: HistoryStore::new(),
                generation: 0,
            }),
            active_query: Mutex::new(None),
            services,
            fetcher,
        }
    }

    pub(crate) async fn send_event(&self, sub_id: &str, msg: EventMsg) {
        let event = Event {
            id: sub_id.to_string(),
            msg,
        };
        if let Err(err) = self.tx_event.send(event).await {
            debug!("event receiver dropped: {err}");
        }
    }

    pub(crate) async fn send_events(&self, sub_id: &str, msgs: Vec<EventMsg>) {
        for msg in msgs {
            self.send_event(sub_id, msg).await;
        }
    }

    pub(crate) async fn apply_domain_event(&self, sub_id: &str, event: DomainEvent) {
        let msgs = self.state.lock().await.store.apply(event);
        self.send_events(sub_id, msgs).await;
    }

    pub(crate) async fn merge_fragment(&self, sub_id: &str, fragment: MetadataFragment) {
        let url = fragment.url.clone();
        let patch = RecordPatch::from(fragment);
        let msg = self.state.lock().await.store.merge(&url, &patch);
        if let Some(msg) = msg {
            self.send_event(sub_id, msg).await;
        }
    }

    /// Route one resolved enrichment lookup into the store. Results tagged
    /// with a superseded generation are discarded unconditionally, even if
    /// the URL coincidentally exists under the live query.
    pub(crate) async fn deliver_enrichment(
        &self,
        sub_id: &str,
        generation: u64,
        url: &str,
        patch: &RecordPatch,
    ) {
        let msg = {
            let mut state = self.state.lock().await;
            if generation != state.generation {
                trace!(
                    generation,
                    current = state.generation,
                    "dropping stale enrichment for {url}"
                );
                return;
            }
            state.store.merge(url, patch)
        };
        if let Some(msg) = msg {
            self.send_event(sub_id, msg).await;
        }
    }

    /// Optimistic local removal, then forward to the history source.
    async fn delete_url(self: &Arc<Self>, sub_id: &str, url: String) {
        self.apply_domain_event(sub_id, DomainEvent::Delete { url: url.clone() })
            .await;
        let history = Arc::clone(&self.services.history);
        tokio::spawn(async move {
            if let Err(err) = history.delete_url(&url).await {
                warn!("failed to forward url deletion to the history source: {err:#}");
            }
        });
    }

    async fn delete_domain(self: &Arc<Self>, sub_id: &str, host: String) {
        self.apply_domain_event(sub_id, DomainEvent::DeleteDomain { host: host.clone() })
            .await;
        let history = Arc::clone(&self.services.history);
        tokio::spawn(async move {
            if let Err(err) = history.delete_by_domain(&host).await {
                warn!("failed to forward domain deletion to the history source: {err:#}");
            }
        });
    }
}

async fn submission_loop(sess: Arc<Session>, rx_sub: Receiver<Submission>) {
    // To break out of this loop, send Op::Shutdown.
    while let Ok(sub) = rx_sub.recv().await {
        debug!(?sub, "submission");
        match sub.op {
            Op::RunQuery { query } => {
                if let Err(err) = coordinator::run_query(&sess, &sub.id, query).await {
                    warn!("query rejected: {err}");
                    sess.send_event(
                        &sub.id,
                        EventMsg::Error(ErrorEvent {
                            message: err.to_string(),
                        }),
                    )
                    .await;
                }
            }
            Op::DeleteUrl { url } => {
                sess.delete_url(&sub.id, url).await;
            }
            Op::DeleteDomain { host } => {
                sess.delete_domain(&sub.id, host).await;
            }
            Op::PlacesEvent { event } => {
                if let Some(domain) = normalizer::normalize(event) {
                    sess.apply_domain_event(&sub.id, domain).await;
                }
            }
            Op::MetadataAdded { fragment } => {
                sess.merge_fragment(&sub.id, fragment).await;
            }
            Op::GetRecords => {
                let records = sess.state.lock().await.store.snapshot();
                sess.send_event(
                    &sub.id,
                    EventMsg::RecordsResponse(RecordsResponseEvent { records }),
                )
                .await;
            }
            Op::Shutdown => {
                sess.send_event(&sub.id, EventMsg::ShutdownComplete).await;
                break;
            }
            _ => {
                // Ignore unknown ops; enum is non_exhaustive to allow extensions.
            }
        }
    }
    debug!(feed_id = %sess.feed_id, "feed session loop exited");
}
