use serde::Deserialize;
use serde::Serialize;

/// Visit transition codes as reported by the places store
/// (`nsINavHistoryService` numbering).
pub mod transition {
    pub const LINK: u32 = 1;
    pub const TYPED: u32 = 2;
    pub const BOOKMARK: u32 = 3;
    pub const EMBED: u32 = 4;
    pub const REDIRECT_PERMANENT: u32 = 5;
    pub const REDIRECT_TEMPORARY: u32 = 6;
    pub const DOWNLOAD: u32 = 7;
    pub const FRAMED_LINK: u32 = 8;
    pub const RELOAD: u32 = 9;
}

/// Raw events as emitted by the history and bookmark stores, before
/// normalization. Visit times are in store precision (microseconds).
///
/// Unrecognized event types deserialize to [`RawPlacesEvent::Unknown`] and
/// normalize to nothing; they are not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RawPlacesEvent {
    HistoryVisit {
        url: String,
        /// Visit time in microseconds.
        time: i64,
        #[serde(default)]
        transition_type: u32,
    },
    HistoryTitleChanged {
        url: String,
        title: String,
    },
    HistoryDeleteUrl {
        url: String,
    },
    HistoryStartClear,
    BookmarkItemAdded {
        url: String,
    },
    BookmarkItemRemoved {
        url: String,
    },
    #[serde(other)]
    Unknown,
}

/// The closed set of normalized events the history store accepts.
/// Times are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    Visit {
        url: String,
        host: String,
        scheme: String,
        time: i64,
    },
    TitleChanged {
        url: String,
        host: String,
        scheme: String,
        title: String,
    },
    Delete {
        url: String,
    },
    DeleteDomain {
        host: String,
    },
    Clear,
    BookmarkAdded {
        url: String,
    },
    BookmarkRemoved {
        url: String,
    },
}
