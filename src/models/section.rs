//! Section, Meeting and Course records.
//!
//! Only the fields the shell inspects are typed; everything else the catalog
//! sends is kept in `extra` so exports carry the full record.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::time::optional_clock;

/// Canonical weekday names, in calendar order.
pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// One scheduled offering of a course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Section {
    /// Catalog identifier
    #[serde(rename = "_id")]
    pub id: String,

    /// Section number within the course, e.g. `001`
    #[serde(default)]
    pub section_number: String,

    /// Identifier of the owning course
    #[serde(default)]
    pub course_reference: String,

    /// Weekly meeting patterns, in catalog order
    #[serde(default)]
    pub meetings: Vec<Meeting>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A recurring weekly time/place slot of a section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meeting {
    #[serde(default)]
    pub meeting_days: Vec<String>,

    #[serde(default, with = "optional_clock")]
    pub start_time: Option<NaiveTime>,

    #[serde(default, with = "optional_clock")]
    pub end_time: Option<NaiveTime>,

    #[serde(default)]
    pub location: Location,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Meeting {
    /// Whether this meeting recurs on the given weekday name.
    pub fn meets_on(&self, day: &str) -> bool {
        self.meeting_days.iter().any(|d| d == day)
    }
}

/// Room a meeting takes place in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Location {
    #[serde(default)]
    pub building: String,

    #[serde(default)]
    pub room: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Location {
    /// `BUILDING ROOM`, or an empty string for unplaced meetings.
    pub fn label(&self) -> String {
        format!("{} {}", self.building, self.room).trim().to_string()
    }
}

/// A catalog course entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(default)]
    pub subject_prefix: String,

    #[serde(default)]
    pub course_number: String,

    #[serde(default)]
    pub catalog_year: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Course {
    /// `PREFIX NUMBER`, e.g. `CS 1337`.
    pub fn code(&self) -> String {
        format!("{} {}", self.subject_prefix, self.course_number)
    }
}
