//! The authoritative in-memory collection of enriched history records for
//! the current query window.
//!
//! All mutation funnels through the command API (`reset` / `apply` /
//! `merge`); each call returns the notifications to emit, so the store
//! stays free of channel plumbing and the session stays the single place
//! events leave from. The collection holds at most one record per URL and
//! is exposed most-recently-visited-first.

use indexmap::IndexMap;
use recall_protocol::DomainEvent;
use recall_protocol::HistoryRecord;
use recall_protocol::Query;
use recall_protocol::RecordPatch;
use recall_protocol::protocol::AddEvent;
use recall_protocol::protocol::ChangeEvent;
use recall_protocol::protocol::EventMsg;
use recall_protocol::protocol::RemoveEvent;
use recall_protocol::protocol::ResetEvent;
use tracing::trace;

#[derive(Default)]
pub struct HistoryStore {
    records: IndexMap<String, HistoryRecord>,
    /// The live query; visits outside its date window are ignored. `None`
    /// until the first reset, which also means no window to admit visits.
    active_query: Option<Query>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, url: &str) -> Option<&HistoryRecord> {
        self.records.get(url)
    }

    /// Ordered read-only view of the collection.
    pub fn records(&self) -> impl Iterator<Item = &HistoryRecord> {
        self.records.values()
    }

    pub fn snapshot(&self) -> Vec<HistoryRecord> {
        self.records.values().cloned().collect()
    }

    /// Replace the collection with a new query's base results. Incoming
    /// order is kept (the source returns reverse-chronological); duplicate
    /// URLs keep their first, most recent occurrence.
    pub fn reset(&mut self, records: Vec<HistoryRecord>, query: Query) -> EventMsg {
        self.records.clear();
        for mut record in records {
            record.sanitize_handles();
            self.records.entry(record.url.clone()).or_insert(record);
        }
        self.active_query = Some(query);
        EventMsg::Reset(ResetEvent {
            records: self.snapshot(),
        })
    }

    /// Apply a normalized store event.
    pub fn apply(&mut self, event: DomainEvent) -> Vec<EventMsg> {
        match event {
            DomainEvent::Visit {
                url,
                host,
                scheme,
                time,
            } => self.apply_visit(url, host, scheme, time),
            DomainEvent::TitleChanged { url, title, .. } => {
                let patch = RecordPatch {
                    title: Some(title),
                    ..Default::default()
                };
                self.merge(&url, &patch).into_iter().collect()
            }
            DomainEvent::Delete { url } => self
                .records
                .shift_remove(&url)
                .map(|record| EventMsg::Remove(RemoveEvent { record }))
                .into_iter()
                .collect(),
            DomainEvent::DeleteDomain { host } => {
                let urls: Vec<String> = self
                    .records
                    .values()
                    .filter(|record| record.host == host)
                    .map(|record| record.url.clone())
                    .collect();
                urls.into_iter()
                    .filter_map(|url| self.records.shift_remove(&url))
                    .map(|record| EventMsg::Remove(RemoveEvent { record }))
                    .collect()
            }
            DomainEvent::Clear => {
                self.records.clear();
                vec![EventMsg::Reset(ResetEvent {
                    records: Vec::new(),
                })]
            }
            DomainEvent::BookmarkAdded { url } => self.set_bookmarked(&url, true),
            DomainEvent::BookmarkRemoved { url } => self.set_bookmarked(&url, false),
        }
    }

    /// Merge a partial update into an existing record, field by field. A
    /// URL that is no longer (or not yet) in the collection is a no-op:
    /// late enrichment must not resurrect removed records.
    pub fn merge(&mut self, url: &str, patch: &RecordPatch) -> Option<EventMsg> {
        let Some(record) = self.records.get_mut(url) else {
            trace!("dropping merge for absent url {url}");
            return None;
        };
        record
            .apply_patch(patch)
            .then(|| EventMsg::Change(ChangeEvent {
                record: record.clone(),
            }))
    }

    fn apply_visit(
        &mut self,
        url: String,
        host: String,
        scheme: String,
        time: i64,
    ) -> Vec<EventMsg> {
        // Visits outside the active window belong to a day the feed is not
        // showing; without a window there is nothing to validate against.
        let in_window = self
            .active_query
            .as_ref()
            .is_some_and(|query| query.contains(time));
        if !in_window {
            trace!("ignoring out-of-window visit for {url}");
            return Vec::new();
        }

        if self.records.contains_key(&url) {
            let patch = RecordPatch {
                time: Some(time),
                host: Some(host),
                scheme: Some(scheme),
                ..Default::default()
            };
            return self.merge(&url, &patch).into_iter().collect();
        }

        let record = HistoryRecord::new(url.clone(), host, scheme, time);
        self.records.shift_insert(0, url, record.clone());
        vec![EventMsg::Add(AddEvent { record })]
    }

    fn set_bookmarked(&mut self, url: &str, bookmarked: bool) -> Vec<EventMsg> {
        let patch = RecordPatch {
            bookmarked: Some(bookmarked),
            ..Default::default()
        };
        self.merge(url, &patch).into_iter().collect()
    }
}
