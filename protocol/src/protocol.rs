//! Defines the protocol for a feed session between a client and the engine.
//!
//! Uses a SQ (Submission Queue) / EQ (Event Queue) pattern to asynchronously
//! communicate between the display layer and the enrichment pipeline.

use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;

use crate::events::RawPlacesEvent;
use crate::feed_id::FeedId;
use crate::query::Query;
use crate::record::HistoryRecord;
use crate::record::MetadataFragment;

/// Submission Queue Entry - requests from the display layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Unique id for this Submission to correlate with Events.
    pub id: String,
    /// Payload.
    pub op: Op,
}

/// Submission operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum Op {
    /// Run a query against the history source, superseding the live one.
    /// Enrichment still in flight for the previous query is discarded.
    RunQuery { query: Query },

    /// Remove one URL: optimistically from the local collection, then
    /// forwarded to the history source.
    DeleteUrl { url: String },

    /// Remove every record for a host, locally and at the source.
    DeleteDomain { host: String },

    /// A raw event from the places/bookmark stores. Normalized before it
    /// reaches the collection; unrecognized events are dropped.
    PlacesEvent { event: RawPlacesEvent },

    /// A metadata fragment that became available asynchronously (e.g. after
    /// a page load completed elsewhere). Merged if the URL is present.
    MetadataAdded { fragment: MetadataFragment },

    /// Request the current ordered collection; answered with a
    /// `RecordsResponse` event.
    GetRecords,

    /// End the session; the loop replies with `ShutdownComplete` and exits.
    Shutdown,
}

/// Event Queue Entry - notifications from the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Submission `id` that this event is correlated with.
    pub id: String,
    /// Payload.
    pub msg: EventMsg,
}

/// The change-notification stream consumed by the rendering layer.
#[derive(Debug, Clone, PartialEq, Display, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventMsg {
    /// Ack that the session is up, carrying its id.
    FeedConfigured(FeedConfiguredEvent),

    /// The collection was replaced wholesale (new query, or a store clear).
    Reset(ResetEvent),

    /// A record was inserted at the front of the ordered view.
    Add(AddEvent),

    /// An existing record gained or changed fields.
    Change(ChangeEvent),

    /// A record left the collection.
    Remove(RemoveEvent),

    /// The current ordered collection, in response to `GetRecords`.
    RecordsResponse(RecordsResponseEvent),

    /// A query was rejected; the collection keeps its previous state.
    Error(ErrorEvent),

    ShutdownComplete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfiguredEvent {
    pub feed_id: FeedId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetEvent {
    pub records: Vec<HistoryRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddEvent {
    pub record: HistoryRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub record: HistoryRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveEvent {
    pub record: HistoryRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordsResponseEvent {
    pub records: Vec<HistoryRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub message: String,
}
