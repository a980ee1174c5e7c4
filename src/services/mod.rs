//! Service layer for the query shell.
//!
//! This module contains the business logic for:
//! - Response caching (`ResponseCache`) and cached catalog access (`Catalog`)
//! - Exhaustive pagination (`PaginatedFetcher`)
//! - Course resolution (`EntityResolver`)
//! - Weekly agendas (`ScheduleComposer`)
//! - The query facade (`QueryEngine`)
//! - Room drawings (`draw_building`)

pub mod cache;
pub mod catalog;
pub mod fetcher;
#[cfg(feature = "map")]
pub mod map;
pub mod query;
pub mod resolver;
pub mod schedule;

pub use cache::{CacheKey, CacheSnapshot, CachedResponse, ResponseCache};
pub use catalog::{Catalog, Fetched};
pub use fetcher::{FetchProgress, NoProgress, PAGE_SIZE, Page, PaginatedFetcher};
#[cfg(feature = "map")]
pub use map::{DrawTarget, Drawing, draw_building, render_kml};
pub use query::{QueryEngine, QueryResult, SECTION_ENDPOINT};
pub use resolver::{EntityResolver, Lookup};
pub use schedule::{Agenda, AgendaEntry, DayGroup, ScheduleComposer, UNKNOWN_COURSE};
