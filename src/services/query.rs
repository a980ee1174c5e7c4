//! Query facade used by the shell.

use std::sync::Arc;
use std::time::Duration;

use crate::client::CatalogClient;
use crate::error::Result;
use crate::models::{ApiConfig, Course, FilterSpec, Section};
use crate::services::cache::ResponseCache;
use crate::services::catalog::Catalog;
use crate::services::fetcher::{FetchProgress, PaginatedFetcher};
use crate::services::resolver::{EntityResolver, Lookup};
use crate::services::schedule::ScheduleComposer;

/// Endpoint serving course sections.
pub const SECTION_ENDPOINT: &str = "section";

/// The record set produced by the last successful query.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub filter: FilterSpec,
    /// Set when the query was narrowed to one course
    pub course: Option<Course>,
    pub sections: Vec<Section>,
}

impl QueryResult {
    /// File stem for exports of this result.
    pub fn file_stem(&self) -> String {
        match &self.course {
            Some(course) => {
                let code = course.code().replace(' ', "-");
                if self.filter.is_empty() {
                    code
                } else {
                    format!("{}_{}", code, self.filter.file_stem())
                }
            }
            None => self.filter.file_stem(),
        }
    }
}

/// Runs section queries and keeps the latest result for later commands.
pub struct QueryEngine {
    catalog: Arc<Catalog>,
    fetcher: PaginatedFetcher,
    resolver: EntityResolver,
    current: Option<QueryResult>,
}

impl QueryEngine {
    /// Create an engine over a catalog client and a session cache.
    pub fn new(
        client: Arc<dyn CatalogClient>,
        cache: Arc<ResponseCache>,
        config: &ApiConfig,
    ) -> Self {
        let catalog = Arc::new(
            Catalog::new(client, cache)
                .with_request_delay(Duration::from_millis(config.request_delay_ms)),
        );
        let fetcher = PaginatedFetcher::new(Arc::clone(&catalog))
            .with_max_pages(config.max_pages);
        let resolver = EntityResolver::new(Arc::clone(&catalog));

        Self {
            catalog,
            fetcher,
            resolver,
            current: None,
        }
    }

    /// Fetch every section matching `filter` and make it the current result.
    ///
    /// On failure the previous result is kept.
    pub async fn run_query(
        &mut self,
        filter: FilterSpec,
        progress: &mut dyn FetchProgress,
    ) -> Result<&QueryResult> {
        log::info!("Running query: {}", filter);
        let sections: Vec<Section> = self
            .fetcher
            .fetch_all(SECTION_ENDPOINT, &filter.to_params(), progress)
            .await?;

        Ok(self.current.insert(QueryResult {
            filter,
            course: None,
            sections,
        }))
    }

    /// Parse `key=value` arguments and run the query.
    ///
    /// Unknown keys and tokens without `=` fail before any request is made.
    pub async fn run_query_args<S: AsRef<str>>(
        &mut self,
        args: &[S],
        progress: &mut dyn FetchProgress,
    ) -> Result<&QueryResult> {
        let filter = FilterSpec::from_args(args)?;
        self.run_query(filter, progress).await
    }

    /// Fetch all sections of one course in a session, e.g. `CS 1337` in `23F`.
    pub async fn sections_of_course(
        &mut self,
        prefix: &str,
        number: &str,
        year: &str,
        semester: &str,
        progress: &mut dyn FetchProgress,
    ) -> Result<&QueryResult> {
        let filter = FilterSpec::from_args(&[format!("session={year}{semester}")])?;

        let (course, sections) = match self.resolver.find_course(prefix, number, year).await? {
            Lookup::Found(course) => {
                let mut params = filter.to_params();
                params.insert("course_reference".to_string(), course.id.clone());
                let sections = self
                    .fetcher
                    .fetch_all(SECTION_ENDPOINT, &params, progress)
                    .await?;
                (Some(course), sections)
            }
            Lookup::NotFound => {
                log::warn!("No course {} {} in catalog year {}", prefix, number, year);
                (None, Vec::new())
            }
        };

        Ok(self.current.insert(QueryResult {
            filter,
            course,
            sections,
        }))
    }

    /// The last successful result, if any.
    pub fn current(&self) -> Option<&QueryResult> {
        self.current.as_ref()
    }

    pub fn resolver(&self) -> &EntityResolver {
        &self.resolver
    }

    pub fn composer(&self) -> ScheduleComposer<'_> {
        ScheduleComposer::new(&self.resolver)
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        self.catalog.cache()
    }

    /// Requests that went to the network this session.
    pub fn network_requests(&self) -> usize {
        self.catalog.network_requests()
    }
}
