mod decode;
mod layout;
mod structs;
mod table;

#[cfg(feature = "ics")]
mod ics;

pub use decode::{
    decode_events, format_date_time, monday_of, parse_date_time, week_start, DecodeError,
};
pub use layout::{
    layout_week, EventPlacement, Segment, SegmentKind, Timeline, WeekLayout, GAP_HEIGHT,
    MIN_COLLAPSIBLE_GAP, MIN_EVENT_HEIGHT, PX_PER_HOUR,
};
pub use structs::{
    ColorMap, Event, EventColor, EventDraft, Schedule, ValidationError, PALETTE,
};
pub use table::{parse_rows, Dialect};
