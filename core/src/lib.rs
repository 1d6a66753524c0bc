//! Root of the `recall-core` library: the enrichment/merge pipeline behind
//! the browsing-history feed.

// Prevent accidental direct writes to stdout/stderr in library code. All
// user-visible output must go through the appropriate abstraction (the
// display layer or the tracing stack).
#![deny(clippy::print_stdout, clippy::print_stderr)]

mod coordinator;
mod enrichment;
pub mod error;
mod feed;
pub mod normalizer;
pub mod sources;
pub mod store;

pub use feed::Feed;
pub use feed::FeedSpawnOk;
pub use sources::BookmarkSource;
pub use sources::FaviconSource;
pub use sources::FeedServices;
pub use sources::HistorySource;
pub use sources::MetadataSource;
