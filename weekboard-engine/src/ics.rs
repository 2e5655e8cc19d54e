use ics::properties::{Description, DtEnd, DtStart, Summary};
use ics::ICalendar;

use crate::structs::{Event, Schedule};

impl Schedule {
    /// Export the whole collection. Events carry no timezone, so they are
    /// written as floating local times without a VTIMEZONE block.
    #[must_use]
    pub fn to_ics(&self) -> ICalendar<'_> {
        let mut icalendar = ICalendar::new("2.0", "-//weekboard//weekboard-engine//EN");

        for event in &self.events {
            icalendar.add_event(event.to_ics());
        }

        icalendar
    }
}

impl Event {
    #[must_use]
    pub fn to_ics(&self) -> ics::Event<'_> {
        let start = self.start.format("%Y%m%dT%H%M00").to_string();
        let end = self.end.format("%Y%m%dT%H%M00").to_string();

        let uid = format!("{}_{}", self.id, self.title.replace(' ', "-"));

        let mut ics_event = ics::Event::new(uid, start.clone());
        ics_event.push(DtStart::new(start));
        ics_event.push(DtEnd::new(end));
        ics_event.push(Summary::new(&self.title));

        let booking = format!(
            "{} booked of {}, {} waiting, price {:.2}",
            self.total, self.capacity, self.waiting, self.price
        );
        let description = if self.description.is_empty() {
            booking
        } else {
            format!("{}\\n{booking}", self.description)
        };
        ics_event.push(Description::new(description));

        ics_event
    }
}
