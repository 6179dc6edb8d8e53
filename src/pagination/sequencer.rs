//! Page sequencer
//!
//! Splits a logical query into page requests. The sequencer is stepped by
//! the caller: ask for [`PageSequencer::next_page`], perform the fetch, then
//! hand the outcome to [`PageSequencer::record`], which decides whether the
//! sequence continues.
//!
//! Termination is checked after each fetch:
//!
//! 1. the next offset reaches `limit`,
//! 2. the fetch returned the "not found" sentinel after at least one page
//!    succeeded (end of data, not an error),
//! 3. any other failure, or the sentinel on the first page, is fatal.

use serde_json::Value;

use crate::pagination::FetchError;

/// Maximum number of records requested per page
pub const DEFAULT_PAGE_SIZE: u64 = 5;

/// Parameters that vary from page to page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: u64,
    pub limit: u64,
}

/// Why a sequence stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Offset reached the caller's limit
    LimitReached,
    /// Service reported no more data past the collected pages
    EndOfData,
    /// A fetch failed fatally
    Failed,
}

/// Decision after recording a page outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageStep {
    Continue,
    Stop(StopReason),
    /// The sequence had already stopped; the body is handed back uncollected
    Rejected(Value),
}

/// State of one paged query
#[derive(Debug)]
pub struct PageSequencer {
    offset: u64,
    limit: Option<u64>,
    page_size: u64,
    collected: Vec<Value>,
    stopped: Option<StopReason>,
}

impl PageSequencer {
    /// Create a sequencer with the default page size
    ///
    /// A missing `limit` means unbounded: the sequence runs until the
    /// service reports the end of data.
    pub fn new(limit: Option<u64>, offset: Option<u64>) -> Self {
        Self::with_page_size(limit, offset, DEFAULT_PAGE_SIZE)
    }

    /// Create a sequencer with an explicit page size (at least 1)
    pub fn with_page_size(limit: Option<u64>, offset: Option<u64>, page_size: u64) -> Self {
        Self {
            offset: offset.unwrap_or(0),
            limit,
            page_size: page_size.max(1),
            collected: Vec::new(),
            stopped: None,
        }
    }

    /// The next page to fetch, or `None` once the sequence has stopped
    pub fn next_page(&self) -> Option<PageRequest> {
        if self.stopped.is_some() {
            return None;
        }
        Some(PageRequest {
            offset: self.offset,
            limit: self.page_limit(),
        })
    }

    /// Per-page `limit` parameter; constant for the whole sequence
    fn page_limit(&self) -> u64 {
        self.limit
            .map_or(self.page_size, |limit| limit.min(self.page_size))
    }

    /// Record the outcome of fetching the current page
    ///
    /// Returns the fatal error unchanged when the sequence cannot continue
    /// and nothing can be salvaged. Outcomes recorded after the sequence
    /// stopped leave it untouched: bodies come back as
    /// [`PageStep::Rejected`], errors are returned as is.
    pub fn record(&mut self, outcome: Result<Value, FetchError>) -> Result<PageStep, FetchError> {
        if self.stopped.is_some() {
            return outcome.map(PageStep::Rejected);
        }

        match outcome {
            Ok(body) => {
                self.collected.push(body);

                // An offset past u64::MAX cannot be requested
                let Some(next) = self.offset.checked_add(self.page_size) else {
                    return Ok(self.stop(StopReason::LimitReached));
                };
                self.offset = next;

                if self.limit.is_some_and(|limit| self.offset >= limit) {
                    Ok(self.stop(StopReason::LimitReached))
                } else {
                    Ok(PageStep::Continue)
                }
            }
            Err(err) if err.is_not_found() && !self.collected.is_empty() => {
                Ok(self.stop(StopReason::EndOfData))
            }
            Err(err) => {
                self.stopped = Some(StopReason::Failed);
                Err(err)
            }
        }
    }

    fn stop(&mut self, reason: StopReason) -> PageStep {
        self.stopped = Some(reason);
        PageStep::Stop(reason)
    }

    /// Offset of the page that will be fetched next
    pub fn current_offset(&self) -> u64 {
        self.offset
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn pages_collected(&self) -> usize {
        self.collected.len()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stopped
    }

    /// Consume the sequencer, yielding page bodies in fetch order
    pub fn into_pages(self) -> Vec<Value> {
        self.collected
    }
}
