//! Exhaustive pagination over catalog endpoints.
//!
//! Pages are requested at offsets 0, 20, 40, ... until the catalog answers
//! with its "no documents" sentinel. An empty page is data, not the end.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::QueryParams;
use crate::services::catalog::{Catalog, Fetched};

/// Records per catalog page. The server pages in fixed steps of 20.
pub const PAGE_SIZE: usize = 20;

/// Observer for fetch-all progress.
pub trait FetchProgress: Send {
    /// A page at `offset` produced `records`; `total` have been collected so far.
    fn page_fetched(&mut self, _offset: usize, _records: usize, _total: usize) {}

    /// The end-of-results sentinel was reached.
    fn finished(&mut self, _total: usize) {}
}

/// Progress observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl FetchProgress for NoProgress {}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub enum Page<T> {
    Records(Vec<T>),
    /// Pagination is exhausted
    End,
}

/// Drives paged requests until the catalog runs out of results.
pub struct PaginatedFetcher {
    catalog: Arc<Catalog>,
    max_pages: Option<usize>,
}

impl PaginatedFetcher {
    /// A fetcher that pages until the end-of-results sentinel.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            max_pages: None,
        }
    }

    /// Fail instead of paging past `max_pages` pages. Unlimited when `None`.
    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages.map(|pages| pages.max(1));
        self
    }

    /// Fetch a single page starting at `offset`.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        filter: &QueryParams,
        offset: usize,
    ) -> Result<Page<T>> {
        let mut params = filter.clone();
        params.insert("offset".to_string(), offset.to_string());

        match self.catalog.fetch::<Vec<T>>(endpoint, &params).await? {
            Fetched::Documents(records) => Ok(Page::Records(records)),
            Fetched::NoDocuments => Ok(Page::End),
        }
    }

    /// Fetch every record matching `filter`, in server order.
    ///
    /// Any failed page aborts the whole call; nothing partial is returned.
    pub async fn fetch_all<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        filter: &QueryParams,
        progress: &mut dyn FetchProgress,
    ) -> Result<Vec<T>> {
        let mut records = Vec::new();
        let mut offset = 0;
        let mut pages = 0;

        loop {
            if let Some(max_pages) = self.max_pages.filter(|max| pages >= *max) {
                return Err(AppError::transport(
                    endpoint,
                    format!(
                        "no end-of-results after {} pages ({} records)",
                        max_pages,
                        records.len()
                    ),
                ));
            }

            match self.fetch_page::<T>(endpoint, filter, offset).await? {
                Page::End => {
                    log::debug!("{} exhausted at offset {}", endpoint, offset);
                    progress.finished(records.len());
                    return Ok(records);
                }
                Page::Records(page) => {
                    let count = page.len();
                    records.extend(page);
                    progress.page_fetched(offset, count, records.len());
                    offset += PAGE_SIZE;
                    pages += 1;
                }
            }
        }
    }
}
