//! Data models for events and their cached form.
//!
//! - [`EventEntry`]: one line of `events.yml`, the input to a fetch
//! - [`Event`]: a fully fetched event, ready for rendering
//! - [`CacheRecord`]: an [`Event`] as persisted in `<link>/cache.yml`

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Days after which an event's participant counts are assumed final.
pub const LONG_PAST_DAYS: i64 = 3;

/// An event listed in the site configuration, not yet fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEntry {
    /// The URI component this event is published under, e.g. `zugspitze`.
    pub link: String,
    /// The event id on the Hiking Buddies website.
    pub id: u64,
    /// A description used for the social media preview.
    pub desc: String,
}

/// A scraped event with everything derived from its title.
///
/// An `Event` only exists once every field has been filled in, either from
/// the website or from the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub link: String,
    #[serde(default)]
    pub desc: String,

    /// The title exactly as shown on the website.
    pub raw_title: String,
    pub date: NaiveDateTime,
    pub capacity: i64,
    pub registered: i64,
    pub waiting: i64,
    pub image_url: String,
    pub image_width: u32,
    pub image_height: u32,

    pub grade: Option<String>,
    pub title: String,
    pub tags: Vec<String>,
    /// Name of the event's category.
    pub category: String,
    pub distance: Option<String>,
    pub ascent: Option<String>,

    /// Number of consecutive builds this event was served from the cache.
    #[serde(default)]
    pub age: u32,
}

impl Event {
    /// Places still free, ignoring car seat restrictions.
    pub fn available(&self) -> i64 {
        self.capacity - self.registered
    }

    /// Has this event happened? False on the day of the event and true from
    /// the following day, even for multi-day events.
    pub fn is_past(&self, today: NaiveDate) -> bool {
        self.date.date() < today
    }

    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        !self.is_past(today)
    }

    /// Long enough ago that the participant list will not change any more.
    pub fn is_long_past(&self, now: NaiveDateTime) -> bool {
        self.date + Duration::days(LONG_PAST_DAYS) < now
    }
}

/// The persisted snapshot of an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Layout version; records from another version are ignored.
    pub version: u32,
    #[serde(default)]
    pub long_past: bool,
    #[serde(flatten)]
    pub event: Event,
}


#[cfg(test)]
mod tests {
    use super::fixtures::{date, event};
    use super::*;

    #[test]
    fn test_available() {
        let e = event("peak", 1, "2024-03-01 08:00");
        assert_eq!(e.available(), 7);
    }

    #[test]
    fn test_past_from_next_day() {
        let e = event("peak", 1, "2024-03-01 08:00");
        assert!(!e.is_past(date("2024-03-01 23:00").date()));
        assert!(e.is_upcoming(date("2024-03-01 23:00").date()));
        assert!(e.is_past(date("2024-03-02 00:00").date()));
    }

    #[test]
    fn test_long_past_after_three_days() {
        let e = event("peak", 1, "2024-03-01 08:00");
        assert!(!e.is_long_past(date("2024-03-04 08:00")));
        assert!(e.is_long_past(date("2024-03-04 08:01")));
    }

    #[test]
    fn test_cache_record_yaml_round_trip() {
        let record = CacheRecord {
            version: 7,
            long_past: true,
            event: Event {
                grade: None,
                distance: None,
                age: 4,
                ..event("peak", 42, "2023-12-01 09:30")
            },
        };
        let yaml = serde_yaml::to_string(&record).unwrap();
        assert!(yaml.contains("long_past: true"));
        let back: CacheRecord = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, record);
    }
}
