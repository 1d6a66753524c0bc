//! Wire-level types shared between the feed engine and its clients.
//!
//! Everything in this crate is plain data: the submission/event queue types,
//! the history record model, and the raw/normalized store events. Behavior
//! lives in `recall-core`.

mod events;
mod feed_id;
pub mod protocol;
mod query;
mod record;

pub use events::DomainEvent;
pub use events::RawPlacesEvent;
pub use events::transition;
pub use feed_id::FeedId;
pub use query::BaseRecord;
pub use query::Query;
pub use record::HistoryRecord;
pub use record::MetadataFragment;
pub use record::RecordPatch;
