//! Pagination
//!
//! QuantumLeap caps every response, so a logical query is split into a
//! sequence of page requests that share all filter parameters and differ
//! only in `offset`.
//!
//! - **Sequencer**: decides the next page and when the sequence ends
//! - **Fetcher**: seam performing one page request
//! - [`fetch_pages`]: drives a sequencer against a fetcher
//!
//! Pages are fetched strictly one after another; whether to continue
//! depends on the previous outcome.

mod fetcher;
mod sequencer;

#[cfg(test)]
pub(crate) mod testing;

pub use fetcher::{FetchError, PageCall, PageFetcher};
pub(crate) use fetcher::not_found_description;
pub use sequencer::{PageRequest, PageSequencer, PageStep, StopReason, DEFAULT_PAGE_SIZE};

use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{QueryError, QueryResult};

/// Fetch every page of a query, in order
///
/// `params` are sent unchanged with each page; `limit` and `offset` are
/// appended per page. A "not found" answer after the first page ends the
/// sequence and the pages collected so far are returned.
pub async fn fetch_pages<F>(
    fetcher: &F,
    path: &str,
    params: &[(String, String)],
    mut sequencer: PageSequencer,
) -> QueryResult<Vec<Value>>
where
    F: PageFetcher + ?Sized,
{
    let correlator = Uuid::new_v4().to_string();
    let span = tracing::debug_span!("paged_query", endpoint = %path, correlator = %correlator);

    async move {
        while let Some(page) = sequencer.next_page() {
            let mut page_params = params.to_vec();
            page_params.push(("limit".to_string(), page.limit.to_string()));
            page_params.push(("offset".to_string(), page.offset.to_string()));

            tracing::debug!(offset = page.offset, limit = page.limit, "Fetching page");

            let outcome = fetcher
                .fetch_page(PageCall {
                    path,
                    params: &page_params,
                    correlator: &correlator,
                })
                .await;

            match sequencer.record(outcome) {
                Ok(PageStep::Continue) => {}
                Ok(PageStep::Stop(StopReason::EndOfData)) => {
                    tracing::debug!(offset = page.offset, "No more data, stopping");
                }
                Ok(PageStep::Stop(_)) | Ok(PageStep::Rejected(_)) => {}
                Err(source) => {
                    tracing::error!(offset = page.offset, error = %source, "Could not load entity data");
                    return Err(QueryError::Fetch {
                        endpoint: path.to_string(),
                        offset: page.offset,
                        source,
                    });
                }
            }
        }

        tracing::info!(
            pages = sequencer.pages_collected(),
            stop = ?sequencer.stop_reason(),
            "Retrieved entity data"
        );
        Ok(sequencer.into_pages())
    }
    .instrument(span)
    .await
}
