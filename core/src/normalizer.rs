//! Translates raw store-level events into the closed set of domain events
//! the history store accepts. Pure mapping: one input, at most one output,
//! no side effects.

use recall_protocol::DomainEvent;
use recall_protocol::RawPlacesEvent;
use recall_protocol::transition;
use tracing::warn;
use url::Url;

/// Normalize a raw places/bookmark event.
///
/// Redirect visits are suppressed entirely: they must not surface as
/// history entries. Visit times are converted from the store's microsecond
/// precision to milliseconds. Unrecognized events yield `None`.
pub fn normalize(event: RawPlacesEvent) -> Option<DomainEvent> {
    match event {
        RawPlacesEvent::HistoryVisit {
            url,
            time,
            transition_type,
        } => {
            if matches!(
                transition_type,
                transition::REDIRECT_PERMANENT | transition::REDIRECT_TEMPORARY
            ) {
                return None;
            }
            let (host, scheme) = split_url(&url)?;
            Some(DomainEvent::Visit {
                url,
                host,
                scheme,
                time: time.div_euclid(1000),
            })
        }
        RawPlacesEvent::HistoryTitleChanged { url, title } => {
            let (host, scheme) = split_url(&url)?;
            Some(DomainEvent::TitleChanged {
                url,
                host,
                scheme,
                title,
            })
        }
        RawPlacesEvent::HistoryDeleteUrl { url } => Some(DomainEvent::Delete { url }),
        RawPlacesEvent::HistoryStartClear => Some(DomainEvent::Clear),
        RawPlacesEvent::BookmarkItemAdded { url } => Some(DomainEvent::BookmarkAdded { url }),
        RawPlacesEvent::BookmarkItemRemoved { url } => Some(DomainEvent::BookmarkRemoved { url }),
        RawPlacesEvent::Unknown => None,
    }
}

fn split_url(url: &str) -> Option<(String, String)> {
    match Url::parse(url) {
        Ok(parsed) => Some((
            parsed.host_str().unwrap_or_default().to_string(),
            parsed.scheme().to_string(),
        )),
        Err(err) => {
            warn!("dropping event for unparseable url {url}: {err}");
            None
        }
    }
}
