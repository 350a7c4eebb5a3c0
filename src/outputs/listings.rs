//! The three event listings and which events go in each.

use crate::models::Event;
use chrono::NaiveDate;
use itertools::Itertools;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    /// Events yet to happen, soonest first.
    Upcoming,
    /// Events that have happened, most recent first.
    Past,
    /// Every event, latest first.
    All,
}

impl Listing {
    pub const ALL: [Listing; 3] = [Listing::Upcoming, Listing::Past, Listing::All];

    /// Output file, relative to the site root.
    pub fn file_name(self) -> &'static str {
        match self {
            Listing::Upcoming => "index.html",
            Listing::Past => "past.html",
            Listing::All => "all.html",
        }
    }

    /// The canonical link: the file name without `index` or `.html`.
    pub fn link(self) -> String {
        let file = self.file_name();
        let stem = file.strip_suffix(".html").unwrap_or(file);
        let stem = stem.strip_suffix("index").unwrap_or(stem);
        format!("/{stem}")
    }

    pub fn heading(self) -> &'static str {
        match self {
            Listing::Upcoming => "Upcoming events",
            Listing::Past => "Past events",
            Listing::All => "All events",
        }
    }

    /// The events belonging in this listing, in display order.
    pub fn select<'a>(self, events: &'a [Event], today: NaiveDate) -> Vec<&'a Event> {
        let by_date = |a: &&Event, b: &&Event| a.date.cmp(&b.date);
        match self {
            Listing::Upcoming => events
                .iter()
                .filter(|e| e.is_upcoming(today))
                .sorted_by(by_date)
                .collect(),
            Listing::Past => events
                .iter()
                .filter(|e| e.is_past(today))
                .sorted_by(|a, b| by_date(b, a))
                .collect(),
            Listing::All => events.iter().sorted_by(|a, b| by_date(b, a)).collect(),
        }
    }
}
