//! Course lookups for sections.

use std::sync::Arc;

use crate::error::Result;
use crate::models::{Course, QueryParams};
use crate::services::catalog::{Catalog, Fetched};

/// Result of a point lookup. Absence is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }
}

/// Resolves course references through the cached catalog.
pub struct EntityResolver {
    catalog: Arc<Catalog>,
}

impl EntityResolver {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Resolve a section's course reference.
    ///
    /// The catalog's "no documents" answer becomes [`Lookup::NotFound`];
    /// only transport and decode failures are errors.
    pub async fn resolve(&self, course_ref: &str) -> Result<Lookup<Course>> {
        let course_ref = course_ref.trim();
        if course_ref.is_empty() {
            return Ok(Lookup::NotFound);
        }

        let path = format!("course/{course_ref}");
        match self.catalog.fetch::<Course>(&path, &QueryParams::new()).await? {
            Fetched::Documents(course) => Ok(Lookup::Found(course)),
            Fetched::NoDocuments => {
                log::warn!("No course found for reference {}", course_ref);
                Ok(Lookup::NotFound)
            }
        }
    }

    /// Find a course by subject prefix, number and catalog year.
    pub async fn find_course(
        &self,
        prefix: &str,
        number: &str,
        year: &str,
    ) -> Result<Lookup<Course>> {
        let params: QueryParams = [
            ("subject_prefix", prefix),
            ("course_number", number),
            ("catalog_year", year),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        match self.catalog.fetch::<Vec<Course>>("course", &params).await? {
            Fetched::Documents(courses) => Ok(courses
                .into_iter()
                .next()
                .map_or(Lookup::NotFound, Lookup::Found)),
            Fetched::NoDocuments => Ok(Lookup::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::client::testing::FakeCatalog;
    use crate::services::cache::ResponseCache;

    fn resolver(fake: FakeCatalog) -> (Arc<FakeCatalog>, EntityResolver) {
        let fake = Arc::new(fake);
        let catalog = Arc::new(Catalog::new(fake.clone(), Arc::new(ResponseCache::new())));
        (fake, EntityResolver::new(catalog))
    }

    #[tokio::test]
    async fn test_resolve_found() {
        let mut fake = FakeCatalog::default();
        fake.courses.insert(
            "c1".into(),
            json!({"_id": "c1", "subject_prefix": "CS", "course_number": "1337", "catalog_year": "23"}),
        );
        let (_, resolver) = resolver(fake);

        let course = resolver.resolve("c1").await.unwrap().found().unwrap();
        assert_eq!(course.code(), "CS 1337");
    }

    #[tokio::test]
    async fn test_resolve_missing_is_not_found() {
        let (fake, resolver) = resolver(FakeCatalog::default());

        assert_eq!(resolver.resolve("ghost").await.unwrap(), Lookup::NotFound);
        assert_eq!(resolver.resolve("ghost").await.unwrap(), Lookup::NotFound);
        assert_eq!(fake.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_reference_skips_request() {
        let (fake, resolver) = resolver(FakeCatalog::default());
        assert_eq!(resolver.resolve("  ").await.unwrap(), Lookup::NotFound);
        assert_eq!(fake.call_count(), 0);
    }
}
