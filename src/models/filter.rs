//! Section filters and their canonical forms.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Filter keys understood by the section endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FilterKey {
    #[serde(rename = "session")]
    Session,
    #[serde(rename = "building")]
    Building,
    #[serde(rename = "room")]
    Room,
    #[serde(rename = "meetingDays")]
    MeetingDays,
}

impl FilterKey {
    pub const ALL: [FilterKey; 4] = [
        FilterKey::Session,
        FilterKey::Building,
        FilterKey::Room,
        FilterKey::MeetingDays,
    ];

    /// Name used in the shell (`query session=23F`).
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKey::Session => "session",
            FilterKey::Building => "building",
            FilterKey::Room => "room",
            FilterKey::MeetingDays => "meetingDays",
        }
    }

    /// Query parameter name on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            FilterKey::Session => "academic_session.name",
            FilterKey::Building => "meetings.location.building",
            FilterKey::Room => "meetings.location.room",
            FilterKey::MeetingDays => "meetings.meeting_days",
        }
    }
}

impl FromStr for FilterKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        FilterKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<_> = FilterKey::ALL.iter().map(|k| k.as_str()).collect();
                AppError::invalid_filter(
                    s,
                    format!("unrecognized filter key (expected one of {})", known.join(", ")),
                )
            })
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filter value: a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Single(String),
    List(Vec<String>),
}

impl FilterValue {
    /// Parse a shell value; commas split it into a list.
    pub fn parse(raw: &str) -> Self {
        if raw.contains(',') {
            FilterValue::List(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            )
        } else {
            FilterValue::Single(raw.to_string())
        }
    }

    /// Single string form sent on the wire.
    pub fn to_wire(&self) -> String {
        match self {
            FilterValue::Single(value) => value.clone(),
            FilterValue::List(values) => values.join(","),
        }
    }

    /// Individual values, in order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            FilterValue::Single(value) => vec![value.as_str()],
            FilterValue::List(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Single(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Single(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        FilterValue::List(values)
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// Query parameters in canonical (sorted) order.
pub type QueryParams = BTreeMap<String, String>;

/// An immutable set of section filters.
///
/// Entries are kept sorted by key, so two specs built from the same pairs in
/// any order are equal and share one canonical key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSpec {
    filters: BTreeMap<FilterKey, FilterValue>,
}

impl FilterSpec {
    /// An unfiltered spec matching every section.
    pub fn all() -> Self {
        Self::default()
    }

    /// Start building a spec.
    pub fn builder() -> FilterSpecBuilder {
        FilterSpecBuilder::default()
    }

    /// Parse shell tokens of the form `key=value`.
    ///
    /// The whole set is rejected if any token lacks `=` or names an unknown key.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let mut builder = Self::builder();
        for arg in args {
            let arg = arg.as_ref();
            let (key, value) = arg
                .split_once('=')
                .ok_or_else(|| AppError::malformed(format!("malformed query: '{arg}'")))?;
            if value.is_empty() {
                return Err(AppError::invalid_filter(key, "empty value"));
            }
            builder = builder.with(key.parse()?, FilterValue::parse(value));
        }
        Ok(builder.build())
    }

    pub fn get(&self, key: FilterKey) -> Option<&FilterValue> {
        self.filters.get(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FilterKey, &FilterValue)> {
        self.filters.iter().map(|(key, value)| (*key, value))
    }

    /// Wire query parameters for this filter set.
    pub fn to_params(&self) -> QueryParams {
        self.filters
            .iter()
            .map(|(key, value)| (key.wire_name().to_string(), value.to_wire()))
            .collect()
    }

    /// Stable, order-independent key for this filter set.
    pub fn canonical_key(&self) -> String {
        canonical_params(&self.to_params())
    }

    /// File stem derived from the filter values, `All` when unfiltered.
    pub fn file_stem(&self) -> String {
        if self.is_empty() {
            return "All".to_string();
        }
        self.filters
            .values()
            .map(FilterValue::to_wire)
            .collect::<Vec<_>>()
            .join("_")
            .replace('.', "-")
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("(all sections)");
        }
        let parts: Vec<String> = self
            .filters
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        f.write_str(&parts.join(" "))
    }
}

/// Render sorted params as `k=v&k=v`.
pub fn canonical_params(params: &QueryParams) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Builder for [`FilterSpec`].
#[derive(Debug, Default)]
pub struct FilterSpecBuilder {
    filters: BTreeMap<FilterKey, FilterValue>,
}

impl FilterSpecBuilder {
    /// Set a filter; a repeated key replaces the earlier value.
    pub fn with(mut self, key: FilterKey, value: impl Into<FilterValue>) -> Self {
        self.filters.insert(key, value.into());
        self
    }

    pub fn build(self) -> FilterSpec {
        FilterSpec {
            filters: self.filters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_key_is_order_independent() {
        let a = FilterSpec::builder()
            .with(FilterKey::Session, "23F")
            .with(FilterKey::Building, "JO")
            .with(FilterKey::Room, "1.102")
            .build();
        let b = FilterSpec::builder()
            .with(FilterKey::Room, "1.102")
            .with(FilterKey::Session, "23F")
            .with(FilterKey::Building, "JO")
            .build();

        assert_eq!(a, b);
        assert_eq!(a.canonical_key(), b.canonical_key());
    }

    #[test]
    fn test_different_values_differ() {
        let a = FilterSpec::builder().with(FilterKey::Session, "23F").build();
        let b = FilterSpec::builder().with(FilterKey::Session, "24S").build();
        assert_ne!(a.canonical_key(), b.canonical_key());
    }

    #[test]
    fn test_wire_params() {
        let spec = FilterSpec::from_args(&["session=23F", "meetingDays=Monday,Wednesday"]).unwrap();
        let params = spec.to_params();
        assert_eq!(params["academic_session.name"], "23F");
        assert_eq!(params["meetings.meeting_days"], "Monday,Wednesday");
    }

    #[test]
    fn test_from_args_rejects_unknown_key() {
        let err = FilterSpec::from_args(&["session=23F", "foo=bar"]).unwrap_err();
        assert!(matches!(err, AppError::InvalidFilter { ref key, .. } if key == "foo"));
    }

    #[test]
    fn test_from_args_rejects_missing_equals() {
        let err = FilterSpec::from_args(&["session=23F", "JO"]).unwrap_err();
        assert!(matches!(err, AppError::MalformedCommand(_)));
        assert!(err.to_string().contains("malformed query"));
    }

    #[test]
    fn test_key_names_are_case_sensitive() {
        assert!("meetingDays".parse::<FilterKey>().is_ok());
        assert!("meetingdays".parse::<FilterKey>().is_err());
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(FilterSpec::all().file_stem(), "All");
        let spec = FilterSpec::from_args(&["room=1.102", "building=JO", "session=23F"]).unwrap();
        assert_eq!(spec.file_stem(), "23F_JO_1-102");
    }
}
