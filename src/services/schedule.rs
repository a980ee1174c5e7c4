//! Weekly agenda composition.
//!
//! Meetings are grouped by weekday in the order the caller asks for and
//! stable-sorted by start time, so meetings that start together keep the
//! order they were fetched in.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveTime;
use serde::Serialize;

use crate::models::time::display_clock;
use crate::models::{Meeting, Section, WEEKDAYS};
use crate::services::resolver::{EntityResolver, Lookup};

/// Label prefix used when a section's course cannot be resolved.
pub const UNKNOWN_COURSE: &str = "???";

/// One line of the agenda.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgendaEntry {
    pub day: String,
    pub start: NaiveTime,
    pub end: Option<NaiveTime>,
    /// `PREFIX NUMBER.SECTION`, or `???.SECTION`
    pub label: String,
    pub location: String,
}

/// All entries for one weekday.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayGroup {
    pub day: String,
    pub entries: Vec<AgendaEntry>,
}

/// A composed weekly agenda.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Agenda {
    pub groups: Vec<DayGroup>,
    /// Course references whose lookup errored and were labelled `???`.
    pub failed_lookups: usize,
}

impl Agenda {
    /// Entries flattened in agenda order.
    pub fn entries(&self) -> impl Iterator<Item = &AgendaEntry> {
        self.groups.iter().flat_map(|group| group.entries.iter())
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|group| group.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Agenda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in &self.groups {
            writeln!(f, "{}", group.day)?;
            if group.entries.is_empty() {
                writeln!(f, "    (no meetings)")?;
                continue;
            }
            for entry in &group.entries {
                let end = entry.end.map(display_clock).unwrap_or_else(|| "?".into());
                writeln!(
                    f,
                    "    {} - {}  {:<14} {}",
                    display_clock(entry.start),
                    end,
                    entry.label,
                    entry.location
                )?;
            }
        }
        Ok(())
    }
}

/// Builds agendas, resolving course labels lazily.
pub struct ScheduleComposer<'a> {
    resolver: &'a EntityResolver,
}

impl<'a> ScheduleComposer<'a> {
    pub fn new(resolver: &'a EntityResolver) -> Self {
        Self { resolver }
    }

    /// Compose the agenda for `selected_days`, or the whole week when empty.
    ///
    /// Day names must match the canonical spelling (`Monday`); unknown names
    /// yield empty groups.
    pub async fn compose<S: AsRef<str>>(
        &self,
        sections: &[Section],
        selected_days: &[S],
    ) -> Agenda {
        let days: Vec<String> = if selected_days.is_empty() {
            WEEKDAYS.iter().map(|d| d.to_string()).collect()
        } else {
            selected_days.iter().map(|d| d.as_ref().to_string()).collect()
        };

        let mut labels: HashMap<String, String> = HashMap::new();
        let mut failed_lookups = 0;
        let mut groups = Vec::with_capacity(days.len());

        for day in days {
            let mut slots: Vec<(NaiveTime, &Section, &Meeting)> = Vec::new();
            for section in sections {
                for meeting in section.meetings.iter().filter(|m| m.meets_on(&day)) {
                    match meeting.start_time {
                        Some(start) => slots.push((start, section, meeting)),
                        None => log::debug!("Skipping untimed meeting of section {}", section.id),
                    }
                }
            }
            slots.sort_by_key(|(start, _, _)| *start);

            let mut entries = Vec::with_capacity(slots.len());
            for (start, section, meeting) in slots {
                let label = self.label(section, &mut labels, &mut failed_lookups).await;
                entries.push(AgendaEntry {
                    day: day.clone(),
                    start,
                    end: meeting.end_time,
                    label,
                    location: meeting.location.label(),
                });
            }
            groups.push(DayGroup { day, entries });
        }

        Agenda {
            groups,
            failed_lookups,
        }
    }

    /// Label for a section, memoized per course reference. Lookup errors
    /// bump `failed` once per reference.
    async fn label(
        &self,
        section: &Section,
        memo: &mut HashMap<String, String>,
        failed: &mut usize,
    ) -> String {
        let course_ref = &section.course_reference;
        let code = match memo.get(course_ref) {
            Some(code) => code.clone(),
            None => {
                let code = match self.resolver.resolve(course_ref).await {
                    Ok(Lookup::Found(course)) => course.code(),
                    Ok(Lookup::NotFound) => UNKNOWN_COURSE.to_string(),
                    Err(e) => {
                        log::warn!("Course lookup failed for section {}: {}", section.id, e);
                        *failed += 1;
                        UNKNOWN_COURSE.to_string()
                    }
                };
                memo.insert(course_ref.clone(), code.clone());
                code
            }
        };
        format!("{}.{}", code, section.section_number)
    }
}
