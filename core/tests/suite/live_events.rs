use std::time::Duration;

use assert_matches::assert_matches;
use core_test_support::ScriptedHistory;
use core_test_support::base_record;
use core_test_support::drain_until_idle;
use core_test_support::null_services;
use core_test_support::wait_for_event;
use pretty_assertions::assert_eq;
use recall_core::Feed;
use recall_core::FeedSpawnOk;
use recall_protocol::MetadataFragment;
use recall_protocol::Query;
use recall_protocol::RawPlacesEvent;
use recall_protocol::protocol::EventMsg;
use recall_protocol::protocol::Op;
use recall_protocol::transition;

const DAY_START: i64 = 1_620_000_000_000;
const DAY_END: i64 = 1_620_086_399_999;

/// Spawn a feed with no enrichment and a single base record for
/// `https://a.com/`, and swallow the configured + reset events.
async fn feed_with_one_record() -> FeedSpawnOk {
    let history = ScriptedHistory::with_results(vec![base_record(
        "https://a.com/",
        Some("A"),
        DAY_START + 300,
    )]);
    let spawned = Feed::spawn(null_services(history));
    spawned
        .feed
        .submit(Op::RunQuery {
            query: Query {
                date_start: DAY_START,
                date_end: DAY_END,
                text: String::new(),
            },
        })
        .await
        .expect("submit");
    wait_for_event(&spawned.feed, |msg| matches!(msg, EventMsg::Reset(_))).await;
    spawned
}

fn visit(url: &str, time_us: i64, transition_type: u32) -> Op {
    Op::PlacesEvent {
        event: RawPlacesEvent::HistoryVisit {
            url: url.to_string(),
            time: time_us,
            transition_type,
        },
    }
}

#[tokio::test]
async fn redirect_visits_never_reach_the_collection() {
    let spawned = feed_with_one_record().await;

    spawned
        .feed
        .submit(visit(
            "https://redirect.example/",
            (DAY_START + 400) * 1000,
            transition::REDIRECT_PERMANENT,
        ))
        .await
        .expect("submit");
    spawned
        .feed
        .submit(visit(
            "https://redirect.example/",
            (DAY_START + 400) * 1000,
            transition::REDIRECT_TEMPORARY,
        ))
        .await
        .expect("submit");
    // A regular visit right after: the only thing that may surface.
    spawned
        .feed
        .submit(visit(
            "https://b.org/",
            (DAY_START + 500) * 1000 + 123,
            transition::LINK,
        ))
        .await
        .expect("submit");

    let events = drain_until_idle(&spawned.feed, Duration::from_millis(250)).await;
    let adds: Vec<_> = events
        .iter()
        .filter_map(|event| match &event.msg {
            EventMsg::Add(add) => Some(&add.record),
            _ => None,
        })
        .collect();
    assert_eq!(adds.len(), 1);
    assert_eq!(adds[0].url, "https://b.org/");
    // Store precision (microseconds) is floored to milliseconds.
    assert_eq!(adds[0].time, DAY_START + 500);
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn visits_update_known_urls_and_ignore_other_windows() {
    let spawned = feed_with_one_record().await;

    // Known URL: update in place.
    spawned
        .feed
        .submit(visit(
            "https://a.com/",
            (DAY_START + 900) * 1000,
            transition::TYPED,
        ))
        .await
        .expect("submit");
    let events = wait_for_event(&spawned.feed, |msg| matches!(msg, EventMsg::Change(_))).await;
    let Some(EventMsg::Change(change)) = events.last().map(|e| &e.msg) else {
        unreachable!();
    };
    assert_eq!(change.record.time, DAY_START + 900);
    assert_eq!(change.record.title.as_deref(), Some("A"));

    // Unknown URL, outside the window: ignored entirely.
    spawned
        .feed
        .submit(visit(
            "https://tomorrow.example/",
            (DAY_END + 10_000) * 1000,
            transition::TYPED,
        ))
        .await
        .expect("submit");
    let events = drain_until_idle(&spawned.feed, Duration::from_millis(250)).await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn title_changes_merge_only_into_known_urls() {
    let spawned = feed_with_one_record().await;

    spawned
        .feed
        .submit(Op::PlacesEvent {
            event: RawPlacesEvent::HistoryTitleChanged {
                url: "https://a.com/".to_string(),
                title: "A (updated)".to_string(),
            },
        })
        .await
        .expect("submit");
    let events = wait_for_event(&spawned.feed, |msg| matches!(msg, EventMsg::Change(_))).await;
    assert_matches!(
        events.last().map(|e| &e.msg),
        Some(EventMsg::Change(change)) if change.record.title.as_deref() == Some("A (updated)")
    );

    spawned
        .feed
        .submit(Op::PlacesEvent {
            event: RawPlacesEvent::HistoryTitleChanged {
                url: "https://unknown.example/".to_string(),
                title: "ghost".to_string(),
            },
        })
        .await
        .expect("submit");
    let events = drain_until_idle(&spawned.feed, Duration::from_millis(250)).await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn live_metadata_fragments_merge_into_known_urls() {
    let spawned = feed_with_one_record().await;

    spawned
        .feed
        .submit(Op::MetadataAdded {
            fragment: MetadataFragment {
                url: "https://a.com/".to_string(),
                og_description: Some("About A".to_string()),
                ..Default::default()
            },
        })
        .await
        .expect("submit");
    let events = wait_for_event(&spawned.feed, |msg| matches!(msg, EventMsg::Change(_))).await;
    assert_matches!(
        events.last().map(|e| &e.msg),
        Some(EventMsg::Change(change))
            if change.record.description() == Some("About A")
    );

    // Fragments for URLs that already left the collection are dropped.
    spawned
        .feed
        .submit(Op::MetadataAdded {
            fragment: MetadataFragment {
                url: "https://unknown.example/".to_string(),
                og_description: Some("late".to_string()),
                ..Default::default()
            },
        })
        .await
        .expect("submit");
    let events = drain_until_idle(&spawned.feed, Duration::from_millis(250)).await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn bookmark_events_flip_the_flag() {
    let spawned = feed_with_one_record().await;

    spawned
        .feed
        .submit(Op::PlacesEvent {
            event: RawPlacesEvent::BookmarkItemAdded {
                url: "https://a.com/".to_string(),
            },
        })
        .await
        .expect("submit");
    let events = wait_for_event(&spawned.feed, |msg| matches!(msg, EventMsg::Change(_))).await;
    assert_matches!(
        events.last().map(|e| &e.msg),
        Some(EventMsg::Change(change)) if change.record.bookmarked
    );

    spawned
        .feed
        .submit(Op::PlacesEvent {
            event: RawPlacesEvent::BookmarkItemRemoved {
                url: "https://a.com/".to_string(),
            },
        })
        .await
        .expect("submit");
    let events = wait_for_event(&spawned.feed, |msg| matches!(msg, EventMsg::Change(_))).await;
    assert_matches!(
        events.last().map(|e| &e.msg),
        Some(EventMsg::Change(change)) if !change.record.bookmarked
    );
}

#[tokio::test]
async fn store_clear_resets_to_an_empty_collection() {
    let spawned = feed_with_one_record().await;

    spawned
        .feed
        .submit(Op::PlacesEvent {
            event: RawPlacesEvent::HistoryStartClear,
        })
        .await
        .expect("submit");
    let events = wait_for_event(&spawned.feed, |msg| matches!(msg, EventMsg::Reset(_))).await;
    assert_matches!(
        events.last().map(|e| &e.msg),
        Some(EventMsg::Reset(reset)) if reset.records.is_empty()
    );
}

#[tokio::test]
async fn delete_events_from_the_store_remove_records() {
    let spawned = feed_with_one_record().await;

    spawned
        .feed
        .submit(Op::PlacesEvent {
            event: RawPlacesEvent::HistoryDeleteUrl {
                url: "https://a.com/".to_string(),
            },
        })
        .await
        .expect("submit");
    let events = wait_for_event(&spawned.feed, |msg| matches!(msg, EventMsg::Remove(_))).await;
    assert_matches!(
        events.last().map(|e| &e.msg),
        Some(EventMsg::Remove(remove)) if remove.record.url == "https://a.com/"
    );

    // Late metadata for the removed URL must not resurrect it.
    spawned
        .feed
        .submit(Op::MetadataAdded {
            fragment: MetadataFragment {
                url: "https://a.com/".to_string(),
                og_title: Some("back from the dead".to_string()),
                ..Default::default()
            },
        })
        .await
        .expect("submit");
    let events = drain_until_idle(&spawned.feed, Duration::from_millis(250)).await;
    assert!(events.is_empty());
}
