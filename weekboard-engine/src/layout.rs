//! Weekly layout: day bucketing, greedy column packing of overlapping
//! events, and a vertically compressed timeline that collapses long idle
//! stretches while keeping every used stretch at true minute scale.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::structs::Event;

/// Vertical scale of uncompressed time.
pub const PX_PER_HOUR: f32 = 60.0;
/// Every collapsed gap renders at this height, regardless of duration.
pub const GAP_HEIGHT: f32 = 18.0;
/// Idle stretches shorter than this stay at true scale.
pub const MIN_COLLAPSIBLE_GAP: u32 = 60;
/// Shortest rendered event box, so zero-length events stay clickable.
pub const MIN_EVENT_HEIGHT: f32 = 14.0;

/// 06:00 to 23:00, used when the week has no events at all.
const DEFAULT_WINDOW: (u32, u32) = (6 * 60, 23 * 60);
const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "lowercase"))]
pub enum SegmentKind {
    Visible,
    Gap,
}

/// One stretch of the compressed vertical axis, in minutes of day.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "camelCase"))]
pub struct Segment {
    pub kind: SegmentKind,
    pub start_minute: u32,
    pub end_minute: u32,
    pub height: f32,
}

impl Segment {
    fn visible(start_minute: u32, end_minute: u32) -> Segment {
        Segment {
            kind: SegmentKind::Visible,
            start_minute,
            end_minute,
            height: (end_minute - start_minute) as f32 / 60.0 * PX_PER_HOUR,
        }
    }

    fn gap(start_minute: u32, end_minute: u32) -> Segment {
        Segment {
            kind: SegmentKind::Gap,
            start_minute,
            end_minute,
            height: GAP_HEIGHT,
        }
    }
}

/// The compressed vertical axis shared by all seven day columns.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Timeline {
    pub segments: Vec<Segment>,
}

impl Timeline {
    /// Build from the merged busy intervals of the displayed week. `busy`
    /// must be sorted, non-overlapping and contained in `window`.
    fn build(busy: &[(u32, u32)], window: (u32, u32)) -> Timeline {
        let (window_start, window_end) = window;
        let mut segments = Vec::new();

        if busy.is_empty() {
            if window_start < window_end {
                segments.push(Segment::visible(window_start, window_end));
            }
            return Timeline { segments };
        }

        let mut cursor = window_start;
        for &(start, end) in busy {
            if start > cursor {
                // Leading headroom is under an hour by construction, only
                // idle stretches between busy intervals can collapse.
                if start - cursor >= MIN_COLLAPSIBLE_GAP {
                    segments.push(Segment::gap(cursor, start));
                } else {
                    segments.push(Segment::visible(cursor, start));
                }
            }
            segments.push(Segment::visible(start, end));
            cursor = end;
        }

        if cursor < window_end {
            segments.push(Segment::visible(cursor, window_end));
        }

        Timeline { segments }
    }

    pub fn total_height(&self) -> f32 {
        self.segments.iter().map(|segment| segment.height).sum()
    }

    /// Monotonic map from minute of day to vertical offset. Linear inside a
    /// visible segment; the interior of a gap maps to the gap's top edge;
    /// minutes outside the window clamp to its edges.
    pub fn y_of_minute(&self, minute: u32) -> f32 {
        let mut y = 0.0;

        for segment in &self.segments {
            if minute < segment.start_minute {
                return y;
            }

            if minute < segment.end_minute {
                return match segment.kind {
                    SegmentKind::Gap => y,
                    SegmentKind::Visible => {
                        let span = (segment.end_minute - segment.start_minute) as f32;
                        let elapsed = (minute - segment.start_minute) as f32;
                        y + segment.height * elapsed / span
                    }
                };
            }

            y += segment.height;
        }

        y
    }
}

/// Where one event lands in the grid. Kept apart from [`Event`] so laying
/// the same collection out against two week windows never leaves stale
/// fields behind.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "camelCase"))]
pub struct EventPlacement {
    /// 0 = Monday through 6 = Sunday.
    pub day_index: usize,
    pub top: f32,
    pub height: f32,
    pub col_index: usize,
    pub total_cols: usize,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "camelCase"))]
pub struct WeekLayout {
    pub week_start: NaiveDate,
    pub timeline: Timeline,
    /// Keyed by event id. Events outside the week window have no entry.
    pub placements: HashMap<String, EventPlacement>,
}

/// Lay out the events that fall inside `[week_start, week_start + 7 days)`.
/// `week_start` is expected to be a Monday, see [`crate::monday_of`].
pub fn layout_week(events: &[Event], week_start: NaiveDate) -> WeekLayout {
    let window_start = week_start.and_time(NaiveTime::MIN);
    let window_end = window_start + Duration::days(7);

    // Original position doubles as the packing tie-break for equal starts.
    let in_week: Vec<(usize, &Event)> = events
        .iter()
        .enumerate()
        .filter(|(_, event)| event.start >= window_start && event.start < window_end)
        .collect();

    let spans: Vec<(u32, u32)> = in_week
        .iter()
        .map(|(_, event)| minute_span(event))
        .collect();

    let window = visible_window(&spans);
    let busy = merge_intervals(clip_spans(&spans, window));
    let timeline = Timeline::build(&busy, window);

    let mut days: [Vec<(usize, &Event)>; 7] = Default::default();
    for &(index, event) in &in_week {
        let day_index = event.start.weekday().num_days_from_monday() as usize;
        days[day_index].push((index, event));
    }

    let mut placements = HashMap::with_capacity(in_week.len());

    for (day_index, day_events) in days.iter_mut().enumerate() {
        day_events.sort_by_key(|&(index, event)| (event.start, index));

        // Greedy first-fit: each slot records the last end time placed in
        // that column.
        let mut column_ends: Vec<NaiveDateTime> = Vec::new();
        let mut placed: Vec<(&Event, usize)> = Vec::with_capacity(day_events.len());

        for &(_, event) in day_events.iter() {
            let col_index = column_ends
                .iter()
                .position(|end| *end <= event.start)
                .unwrap_or_else(|| {
                    column_ends.push(event.start);
                    column_ends.len() - 1
                });

            column_ends[col_index] = event.end;
            placed.push((event, col_index));
        }

        let total_cols = column_ends.len();

        for (event, col_index) in placed {
            let (start_minute, end_minute) = minute_span(event);
            let top = timeline.y_of_minute(start_minute.clamp(window.0, window.1));
            let bottom = timeline.y_of_minute(end_minute.clamp(window.0, window.1));

            placements.insert(
                event.id.clone(),
                EventPlacement {
                    day_index,
                    top,
                    height: (bottom - top).max(MIN_EVENT_HEIGHT),
                    col_index,
                    total_cols,
                },
            );
        }
    }

    WeekLayout {
        week_start,
        timeline,
        placements,
    }
}

/// Project an event onto minutes of its start day. An end on a later
/// calendar day clips to midnight.
fn minute_span(event: &Event) -> (u32, u32) {
    let start = minutes_of_day(event.start.time());
    let end = if event.end.date() > event.start.date() {
        MINUTES_PER_DAY
    } else {
        minutes_of_day(event.end.time())
    };

    (start, end)
}

fn minutes_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Floor-to-hour of the earliest start and ceiling-to-hour of the latest
/// end, or the 06:00-23:00 default when nothing is displayed.
fn visible_window(spans: &[(u32, u32)]) -> (u32, u32) {
    let Some(earliest) = spans.iter().map(|span| span.0).min() else {
        return DEFAULT_WINDOW;
    };
    let latest = spans.iter().map(|span| span.1).max().unwrap_or(earliest);

    let start = earliest / 60 * 60;
    let end = ((latest + 59) / 60 * 60).min(MINUTES_PER_DAY);

    (start, end.max(start))
}

fn clip_spans(spans: &[(u32, u32)], window: (u32, u32)) -> Vec<(u32, u32)> {
    spans
        .iter()
        .map(|&(start, end)| (start.max(window.0), end.min(window.1)))
        .filter(|(start, end)| start < end)
        .collect()
}

/// Standard interval union: sort by start, merge while the next start is at
/// or before the running end.
fn merge_intervals(mut intervals: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
    intervals.sort_unstable();

    let mut merged: Vec<(u32, u32)> = Vec::new();
    for (start, end) in intervals {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }

    merged
}
