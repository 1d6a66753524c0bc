//! Drives one query end to end: supersede the previous query, fetch the
//! base records, reset the store, then fan out enrichment and stream each
//! result into the collection as it resolves.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use recall_protocol::HistoryRecord;
use recall_protocol::Query;
use tokio_util::task::AbortOnDropHandle;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::error::RecallErr;
use crate::error::Result;
use crate::feed::Session;

/// Run a query against the history source and make it the live one.
///
/// A failure fetching the base records is the one propagated error: the
/// collection is left at its previous state (though the previous query's
/// enrichment, already invalidated, stays invalidated).
pub(crate) async fn run_query(sess: &Arc<Session>, sub_id: &str, query: Query) -> Result<()> {
    // Supersede the previous query before anything else: drop its fan-out
    // handle and bump the generation so results already racing toward the
    // store are discarded.
    sess.active_query.lock().await.take();
    let generation = {
        let mut state = sess.state.lock().await;
        state.generation += 1;
        state.generation
    };

    let text = query.text.trim().to_string();
    let base = sess
        .services
        .history
        .query_history(query.date_start, query.date_end, &text)
        .await
        .map_err(RecallErr::HistorySource)?;

    let mut records = Vec::with_capacity(base.len());
    for row in &base {
        match HistoryRecord::from_base(row) {
            Some(record) => records.push(record),
            None => warn!("skipping base record with unparseable url {}", row.url),
        }
    }
    let urls: Vec<String> = records.iter().map(|record| record.url.clone()).collect();

    let reset = {
        let mut state = sess.state.lock().await;
        state.store.reset(records, Query { text, ..query })
    };
    sess.send_event(sub_id, reset).await;
    debug!(generation, count = urls.len(), "query reset applied");

    let handle = tokio::spawn(enrich(
        Arc::clone(sess),
        sub_id.to_string(),
        generation,
        urls,
    ));
    *sess.active_query.lock().await = Some(AbortOnDropHandle::new(handle));
    Ok(())
}

/// Drive every lookup of the live query through one set of unordered
/// futures, delivering each result the moment it resolves. Lookups have no
/// ordering guarantee relative to each other or to live events; the
/// store's merge rules make the outcome deterministic anyway.
async fn enrich(sess: Arc<Session>, sub_id: String, generation: u64, urls: Vec<String>) {
    let mut lookups: FuturesUnordered<_> = urls
        .into_iter()
        .flat_map(|url| sess.fetcher.fetch(url))
        .collect();
    while let Some(deliveries) = lookups.next().await {
        for (url, patch) in deliveries {
            sess.deliver_enrichment(&sub_id, generation, &url, &patch)
                .await;
        }
    }
    trace!(generation, "enrichment fan-out drained");
}
