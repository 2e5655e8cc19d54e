use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Serialize, Serializer};

use crate::decode::{self, DecodeError};
use crate::table;

/// Style pairings handed out to titles in first-seen order, cycling once all
/// eight are taken.
pub const PALETTE: [EventColor; 8] = [
    EventColor { background: "#dbeafe", foreground: "#1e40af" },
    EventColor { background: "#dcfce7", foreground: "#166534" },
    EventColor { background: "#fef9c3", foreground: "#854d0e" },
    EventColor { background: "#fee2e2", foreground: "#991b1b" },
    EventColor { background: "#f3e8ff", foreground: "#6b21a8" },
    EventColor { background: "#ffedd5", foreground: "#9a3412" },
    EventColor { background: "#cffafe", foreground: "#155e75" },
    EventColor { background: "#fce7f3", foreground: "#9d174d" },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EventColor {
    pub background: &'static str,
    pub foreground: &'static str,
}

#[cfg(feature = "serde")]
fn serialize_date_time<S: Serializer>(
    date_time: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&decode::format_date_time(*date_time))
}

/// One bookable time block. Start and end are local wall-clock values with no
/// timezone attached. Layout output never lives here, see
/// [`crate::EventPlacement`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Event {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_date_time"))]
    pub start: NaiveDateTime,
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_date_time"))]
    pub end: NaiveDateTime,
    pub title: String,
    pub description: String,
    pub capacity: u32,
    pub total: u32,
    pub waiting: u32,
    pub price: f64,
    pub color: EventColor,
}

/// Title to color assignment shared between a batch decode and later
/// single-event edits. Owned by the caller, never by the decoder.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    slots: HashMap<String, EventColor>,
}

impl ColorMap {
    pub fn new() -> ColorMap {
        ColorMap::default()
    }

    /// Rebuild from the live collection so an incremental insert assigns the
    /// same colors a full reparse would have.
    pub fn seeded_from(events: &[Event]) -> ColorMap {
        let mut map = ColorMap::new();
        for event in events {
            map.slots.entry(event.title.clone()).or_insert(event.color);
        }
        map
    }

    /// Titles are compared verbatim, whitespace and case included. A new
    /// title takes the palette slot at (distinct titles seen so far) mod 8.
    pub fn color_for(&mut self, title: &str) -> EventColor {
        if let Some(color) = self.slots.get(title) {
            return *color;
        }

        let color = PALETTE[self.slots.len() % PALETTE.len()];
        self.slots.insert(title.to_string(), color);
        color
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title must not be empty.")]
    EmptyTitle,
    #[error("End must be after start.")]
    EndNotAfterStart,
    #[error("No event with the given id.")]
    UnknownEvent,
}

/// Input for a manual create or edit. The id is never supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub title: String,
    pub description: String,
    pub capacity: u32,
    pub total: u32,
    pub waiting: u32,
    pub price: f64,
}

impl EventDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        if self.end <= self.start {
            return Err(ValidationError::EndNotAfterStart);
        }

        Ok(())
    }
}

/// The in-memory event collection. Lives for one session, no persistence.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Schedule {
    pub events: Vec<Event>,
}

impl Schedule {
    /// Parse and decode pasted or uploaded schedule text in one go. A decode
    /// failure yields no schedule at all, never a partially filled one.
    pub fn from_text<S: AsRef<str>>(text: S) -> Result<Schedule, DecodeError> {
        let rows = table::parse_rows(text.as_ref());
        let data_rows = rows.get(1..).unwrap_or_default();

        let mut colors = ColorMap::new();
        let events = decode::decode_events(data_rows, &mut colors)?;

        Ok(Schedule { events })
    }

    /// Monday of the earliest event's week, if any events exist.
    pub fn week_start(&self) -> Option<NaiveDate> {
        decode::week_start(&self.events)
    }

    /// Creation-timestamp id, suffixed when two inserts land on the same
    /// millisecond.
    fn fresh_id(&self) -> String {
        let base = Utc::now().timestamp_millis().to_string();
        let mut id = base.clone();
        let mut n = 2;
        while self.events.iter().any(|event| event.id == id) {
            id = format!("{base}-{n}");
            n += 1;
        }
        id
    }

    /// Validated manual creation. Returns the id of the new event.
    pub fn insert(&mut self, draft: EventDraft) -> Result<String, ValidationError> {
        draft.validate()?;

        let mut colors = ColorMap::seeded_from(&self.events);
        let color = colors.color_for(&draft.title);
        let id = self.fresh_id();

        self.events.push(Event {
            id: id.clone(),
            start: draft.start,
            end: draft.end,
            title: draft.title,
            description: draft.description,
            capacity: draft.capacity,
            total: draft.total,
            waiting: draft.waiting,
            price: draft.price,
            color,
        });

        Ok(id)
    }

    /// Validated manual edit. Nothing is mutated when validation fails.
    pub fn update(&mut self, id: &str, draft: EventDraft) -> Result<(), ValidationError> {
        draft.validate()?;

        let mut colors = ColorMap::seeded_from(&self.events);
        let color = colors.color_for(&draft.title);

        let Some(event) = self.events.iter_mut().find(|event| event.id == id) else {
            return Err(ValidationError::UnknownEvent);
        };

        event.start = draft.start;
        event.end = draft.end;
        event.title = draft.title;
        event.description = draft.description;
        event.capacity = draft.capacity;
        event.total = draft.total;
        event.waiting = draft.waiting;
        event.price = draft.price;
        event.color = color;

        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.events.len();
        self.events.retain(|event| event.id != id);
        self.events.len() != before
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn draft(title: &str, start_hour: u32, end_hour: u32) -> EventDraft {
        let day = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        EventDraft {
            start: day.and_hms_opt(start_hour, 0, 0).unwrap(),
            end: day.and_hms_opt(end_hour, 0, 0).unwrap(),
            title: title.to_string(),
            description: String::new(),
            capacity: 10,
            total: 0,
            waiting: 0,
            price: 5.0,
        }
    }

    #[test]
    fn insert_rejects_empty_title() {
        let mut schedule = Schedule::default();
        let result = schedule.insert(draft("   ", 9, 10));
        assert_eq!(result, Err(ValidationError::EmptyTitle));
        assert!(schedule.events.is_empty());
    }

    #[test]
    fn insert_rejects_inverted_range() {
        let mut schedule = Schedule::default();
        let result = schedule.insert(draft("Yoga", 10, 9));
        assert_eq!(result, Err(ValidationError::EndNotAfterStart));

        let zero = schedule.insert(draft("Yoga", 9, 9));
        assert_eq!(zero, Err(ValidationError::EndNotAfterStart));
    }

    #[test]
    fn insert_reuses_color_of_known_title() {
        let mut schedule = Schedule::default();
        schedule.insert(draft("Yoga", 9, 10)).unwrap();
        schedule.insert(draft("Pilates", 10, 11)).unwrap();
        schedule.insert(draft("Yoga", 17, 18)).unwrap();

        assert_eq!(schedule.events[0].color, PALETTE[0]);
        assert_eq!(schedule.events[1].color, PALETTE[1]);
        assert_eq!(schedule.events[2].color, PALETTE[0]);
    }

    #[test]
    fn update_unknown_id_leaves_collection_alone() {
        let mut schedule = Schedule::default();
        schedule.insert(draft("Yoga", 9, 10)).unwrap();
        let snapshot = schedule.clone();

        let result = schedule.update("nope", draft("Pilates", 10, 11));
        assert_eq!(result, Err(ValidationError::UnknownEvent));
        assert_eq!(schedule, snapshot);
    }

    #[test]
    fn remove_reports_whether_anything_went_away() {
        let mut schedule = Schedule::default();
        let id = schedule.insert(draft("Yoga", 9, 10)).unwrap();

        assert!(schedule.remove(&id));
        assert!(!schedule.remove(&id));
        assert!(schedule.events.is_empty());
    }
}
