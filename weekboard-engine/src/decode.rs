use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use thiserror::Error;

use crate::structs::{ColorMap, Event};

/// A format error aborts the whole submitted batch; the messages are shown
/// to the user as-is, row numbers count from the header (data row + 2).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Row {row}: Not enough columns. Expected 8, found {found}.")]
    NotEnoughColumns { row: usize, found: usize },
    #[error("Row {row}: Invalid date/time format in \"{start}\" or \"{end}\".")]
    InvalidDateTime { row: usize, start: String, end: String },
    #[error("Row {row}: End must be after start.")]
    EndNotAfterStart { row: usize },
}

/// Decode header-stripped data rows into events. Capacity, total, waiting
/// and price fall back to zero when unparseable instead of failing the row.
pub fn decode_events(
    rows: &[Vec<String>],
    colors: &mut ColorMap,
) -> Result<Vec<Event>, DecodeError> {
    let mut events = Vec::with_capacity(rows.len());

    for (index, fields) in rows.iter().enumerate() {
        events.push(decode_row(fields, index, colors)?);
    }

    Ok(events)
}

fn decode_row(
    fields: &[String],
    index: usize,
    colors: &mut ColorMap,
) -> Result<Event, DecodeError> {
    // 1-based position in the submitted text, header included.
    let row = index + 2;

    if fields.len() < 8 {
        return Err(DecodeError::NotEnoughColumns {
            row,
            found: fields.len(),
        });
    }

    let (Some(start), Some(end)) = (parse_date_time(&fields[0]), parse_date_time(&fields[1]))
    else {
        return Err(DecodeError::InvalidDateTime {
            row,
            start: fields[0].clone(),
            end: fields[1].clone(),
        });
    };

    if end <= start {
        return Err(DecodeError::EndNotAfterStart { row });
    }

    let title = fields[2].clone();
    let color = colors.color_for(&title);

    Ok(Event {
        id: format!(
            "{}_{}_{}",
            start.format("%Y%m%dT%H%M"),
            title.replace(' ', "-"),
            index
        ),
        start,
        end,
        title,
        description: fields[3].clone(),
        capacity: int_or_zero(&fields[4]),
        total: int_or_zero(&fields[5]),
        waiting: int_or_zero(&fields[6]),
        price: fields[7].trim().parse().unwrap_or(0.0),
        color,
    })
}

fn int_or_zero(field: &str) -> u32 {
    field.trim().parse().unwrap_or(0)
}

/// Parse the `D/M/YYYY H:mm` shape of the upload format: day-first date and
/// 24-hour time separated by whitespace, no leading zeros required.
pub fn parse_date_time(input: &str) -> Option<NaiveDateTime> {
    let (date_raw, time_raw) = input.trim().split_once(char::is_whitespace)?;

    let mut date_split = date_raw.split('/');
    let day = date_split.next()?.parse().ok()?;
    let month = date_split.next()?.parse().ok()?;
    let year = date_split.next()?.parse().ok()?;
    if date_split.next().is_some() {
        return None;
    }

    let (hour_raw, minute_raw) = time_raw.trim_start().split_once(':')?;
    let hour = hour_raw.parse().ok()?;
    let minute = minute_raw.parse().ok()?;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;

    Some(NaiveDateTime::new(date, time))
}

/// Inverse of [`parse_date_time`] for canonical inputs: no zero padding on
/// day, month or hour, two digits of minutes.
pub fn format_date_time(date_time: NaiveDateTime) -> String {
    format!(
        "{}/{}/{} {}:{:02}",
        date_time.day(),
        date_time.month(),
        date_time.year(),
        date_time.hour(),
        date_time.minute()
    )
}

/// Monday of the given date's week.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Monday of the earliest event's week, the reference point for layout.
pub fn week_start(events: &[Event]) -> Option<NaiveDate> {
    let earliest = events.iter().map(|event| event.start).min()?;
    Some(monday_of(earliest.date()))
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use crate::structs::PALETTE;
    use crate::table;

    use super::*;

    fn fields(row: &[&str]) -> Vec<String> {
        row.iter().map(|field| field.to_string()).collect()
    }

    fn yoga_row() -> Vec<String> {
        fields(&["1/9/2025 9:00", "1/9/2025 10:00", "Yoga", "mat class", "10", "3", "1", "7.5"])
    }

    #[test]
    fn decodes_a_full_row() {
        let mut colors = ColorMap::new();
        let events = decode_events(&[yoga_row()], &mut colors).unwrap();

        let event = &events[0];
        assert_eq!(event.title, "Yoga");
        assert_eq!(event.description, "mat class");
        assert_eq!(event.capacity, 10);
        assert_eq!(event.total, 3);
        assert_eq!(event.waiting, 1);
        assert_eq!(event.price, 7.5);
        assert_eq!(event.color, PALETTE[0]);
        assert_eq!(format_date_time(event.start), "1/9/2025 9:00");
        assert_eq!(format_date_time(event.end), "1/9/2025 10:00");
    }

    #[test]
    fn short_row_fails_with_row_numbered_message() {
        let mut colors = ColorMap::new();
        let rows = vec![
            yoga_row(),
            fields(&["1/9/2025 9:00", "1/9/2025 10:00", "Yoga", "", "10", "1"]),
        ];

        let err = decode_events(&rows, &mut colors).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Row 3: Not enough columns. Expected 8, found 6."
        );
    }

    #[test]
    fn bad_date_fails_the_whole_batch() {
        let mut colors = ColorMap::new();
        let mut bad = yoga_row();
        bad[0] = "2025-09-01 9:00".to_string();

        let err = decode_events(&[bad], &mut colors).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Row 2: Invalid date/time format in \"2025-09-01 9:00\" or \"1/9/2025 10:00\"."
        );
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut colors = ColorMap::new();
        let mut bad = yoga_row();
        bad.swap(0, 1);

        let err = decode_events(&[bad], &mut colors).unwrap_err();
        assert_eq!(err.to_string(), "Row 2: End must be after start.");
    }

    #[test]
    fn unparseable_numbers_coerce_to_zero() {
        let mut colors = ColorMap::new();
        let mut row = yoga_row();
        row[4] = "abc".to_string();
        row[7] = "free".to_string();

        let events = decode_events(&[row], &mut colors).unwrap();
        assert_eq!(events[0].capacity, 0);
        assert_eq!(events[0].price, 0.0);
    }

    #[test]
    fn dates_are_day_first() {
        let parsed = parse_date_time("3/4/2025 7:05").unwrap();
        assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2025, 4, 3).unwrap());
        assert_eq!(format_date_time(parsed), "3/4/2025 7:05");
    }

    #[test]
    fn rejects_malformed_date_times() {
        assert_eq!(parse_date_time("1/9/2025"), None);
        assert_eq!(parse_date_time("1/9 9:00"), None);
        assert_eq!(parse_date_time("1/x/2025 9:00"), None);
        assert_eq!(parse_date_time("32/9/2025 9:00"), None);
        assert_eq!(parse_date_time("1/9/2025 25:00"), None);
        assert_eq!(parse_date_time("1/9/2025 9:xx"), None);
        assert_eq!(parse_date_time("1/9/20/25 9:00"), None);
    }

    #[test]
    fn color_slots_cycle_after_eight_titles() {
        let mut colors = ColorMap::new();
        let rows: Vec<Vec<String>> = (0..9)
            .map(|n| {
                fields(&[
                    "1/9/2025 9:00",
                    "1/9/2025 10:00",
                    &format!("Class {n}"),
                    "",
                    "10",
                    "0",
                    "0",
                    "5",
                ])
            })
            .collect();

        let events = decode_events(&rows, &mut colors).unwrap();
        assert_eq!(events[0].color, PALETTE[0]);
        assert_eq!(events[7].color, PALETTE[7]);
        assert_eq!(events[8].color, PALETTE[0]);
    }

    #[test]
    fn ids_are_unique_per_row() {
        let mut colors = ColorMap::new();
        let events = decode_events(&[yoga_row(), yoga_row()], &mut colors).unwrap();
        assert_ne!(events[0].id, events[1].id);
    }

    #[test]
    fn week_start_is_the_monday_of_the_earliest_event() {
        let mut colors = ColorMap::new();
        let rows = vec![
            fields(&["4/9/2025 9:00", "4/9/2025 10:00", "Yoga", "", "10", "0", "0", "5"]),
            fields(&["3/9/2025 9:00", "3/9/2025 10:00", "Spin", "", "10", "0", "0", "5"]),
        ];

        let events = decode_events(&rows, &mut colors).unwrap();
        let monday = week_start(&events).unwrap();
        assert_eq!(monday, NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
        assert_eq!(monday.weekday(), Weekday::Mon);
    }

    #[test]
    fn row_numbers_survive_the_table_parser() {
        // End to end through the parser so the header offset is exercised.
        let text = "start\tend\ttitle\tdescription\tcapacity\ttotal\twaiting\tprice\n\
                    1/9/2025 9:00\t1/9/2025 10:00\tYoga\t\t10\t1\t0\t5\n\
                    1/9/2025 9:00\t1/9/2025 10:00\n";
        let rows = table::parse_rows(text);
        let mut colors = ColorMap::new();

        let err = decode_events(&rows[1..], &mut colors).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Row 3: Not enough columns. Expected 8, found 2."
        );
    }
}
