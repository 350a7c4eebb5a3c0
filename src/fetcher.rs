//! Turning configured events into fully populated [`Event`]s.
//!
//! For each event the cache is consulted first:
//!
//! 1. **Cache hit**: the cached event is reused and its age goes up by one.
//!    Unless it is long past, the participant counts are refreshed since they
//!    still change close to the event.
//! 2. **Stale hit**: a cached upcoming event older than [`MAX_CACHE_AGE`]
//!    builds is fetched again in full.
//! 3. **Miss or forced rebuild**: everything is fetched from the website and
//!    the age starts again at zero.
//!
//! The result is written back to the cache on every path.

use crate::cache::{CACHE_VERSION, EventCache};
use crate::category::Categories;
use crate::models::{CacheRecord, Event, EventEntry};
use crate::scrapers::hiking_buddies::EventSource;
use crate::title::parse_title;
use chrono::NaiveDateTime;
use std::error::Error;
use tracing::{info, instrument};

/// Builds a cached upcoming event may be reused before a full fetch.
pub const MAX_CACHE_AGE: u32 = 20;

pub struct EventFetcher<'a, S> {
    source: S,
    cache: &'a EventCache,
    categories: &'a Categories,
    now: NaiveDateTime,
}

impl<'a, S: EventSource> EventFetcher<'a, S> {
    pub fn new(
        source: S,
        cache: &'a EventCache,
        categories: &'a Categories,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            source,
            cache,
            categories,
            now,
        }
    }

    /// Fetch one event, from the cache where possible.
    ///
    /// Any failure talking to the website is returned as an error; there is
    /// no partial event.
    #[instrument(level = "info", skip_all, fields(link = %entry.link, id = entry.id))]
    pub async fn fetch(&self, entry: &EventEntry) -> Result<Event, Box<dyn Error>> {
        let cached = if self.cache.should_force_rebuild(&entry.link) {
            info!("Forced rebuild, ignoring cache");
            None
        } else {
            match self.cache.load(&entry.link).await {
                Some(record) if EventCache::is_usable(&record, entry.id) => Some(record),
                Some(record) => {
                    info!(
                        cached_id = record.event.id,
                        cached_version = record.version,
                        "Cache record does not match, ignoring it"
                    );
                    None
                }
                None => None,
            }
        };

        let event = match cached {
            Some(record) => self.refresh(entry, record).await?,
            None => self.fetch_fresh(entry).await?,
        };

        let record = CacheRecord {
            version: CACHE_VERSION,
            long_past: event.is_long_past(self.now),
            event,
        };
        self.cache.save(&record).await?;
        Ok(record.event)
    }

    async fn refresh(&self, entry: &EventEntry, record: CacheRecord) -> Result<Event, Box<dyn Error>> {
        let mut event = record.event;
        event.age += 1;
        event.desc = entry.desc.clone();

        if event.age > MAX_CACHE_AGE && !event.is_past(self.now.date()) {
            info!(age = event.age, "Cache record too old, fetching again");
            return self.fetch_fresh(entry).await;
        }

        if record.long_past {
            info!(age = event.age, "Using cached event");
        } else {
            let participants = self.source.fetch_participants(entry.id).await?;
            event.registered = participants.registered;
            event.waiting = participants.waiting;
            info!(age = event.age, registered = event.registered, "Using cached event with fresh participants");
        }
        Ok(event)
    }

    async fn fetch_fresh(&self, entry: &EventEntry) -> Result<Event, Box<dyn Error>> {
        let page = self.source.fetch_page(entry.id).await?;
        let (image_width, image_height) = self.source.fetch_image_size(&page.image_url).await?;
        let participants = self.source.fetch_participants(entry.id).await?;

        let parsed = parse_title(&page.raw_title);
        let (tags, category) = self.categories.classify(parsed.tags);

        info!(title = %parsed.title, category = category.name(), "Fetched event from the website");
        Ok(Event {
            id: entry.id,
            link: entry.link.clone(),
            desc: entry.desc.clone(),
            raw_title: page.raw_title,
            date: page.date,
            capacity: page.capacity,
            registered: participants.registered,
            waiting: participants.waiting,
            image_url: page.image_url,
            image_width,
            image_height,
            grade: parsed.grade,
            title: parsed.title,
            tags,
            category: category.name().to_string(),
            distance: parsed.distance,
            ascent: parsed.ascent,
            age: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheSource, EnvRebuildPolicy};
    use crate::category::DefaultCategory;
    use crate::models::fixtures::date;
    use crate::scrapers::hiking_buddies::{EventPage, Participants};
    use reqwest::Client;
    use std::cell::{Cell, RefCell};
    use std::path::PathBuf;

    /// An [`EventSource`] that serves one canned event and counts requests.
    struct FakeSite {
        page: EventPage,
        participants: Cell<Participants>,
        page_fetches: Cell<u32>,
        participant_fetches: Cell<u32>,
        fail: RefCell<Option<String>>,
    }

    impl FakeSite {
        fn new(when: &str) -> Self {
            Self {
                page: EventPage {
                    raw_title: "T3 - [Alps, Hiking] Peak Name [12 km, 800m gain]".to_string(),
                    image_url: "https://www.hiking-buddies.com/media/peak.jpg".to_string(),
                    date: date(when),
                    capacity: 10,
                },
                participants: Cell::new(Participants {
                    registered: 4,
                    waiting: 1,
                }),
                page_fetches: Cell::new(0),
                participant_fetches: Cell::new(0),
                fail: RefCell::new(None),
            }
        }
    }

    impl EventSource for &FakeSite {
        async fn fetch_page(&self, _id: u64) -> Result<EventPage, Box<dyn Error>> {
            if let Some(msg) = self.fail.borrow().clone() {
                return Err(msg.into());
            }
            self.page_fetches.set(self.page_fetches.get() + 1);
            Ok(self.page.clone())
        }

        async fn fetch_participants(&self, _id: u64) -> Result<Participants, Box<dyn Error>> {
            self.participant_fetches.set(self.participant_fetches.get() + 1);
            Ok(self.participants.get())
        }

        async fn fetch_image_size(&self, _url: &str) -> Result<(u32, u32), Box<dyn Error>> {
            Ok((1200, 630))
        }
    }

    fn tmp_dir(name: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!("hb_events_fetcher_{name}"));
        let _ = std::fs::remove_dir_all(&p);
        std::fs::create_dir_all(&p).unwrap();
        p
    }

    fn cache(root: &PathBuf, policy: EnvRebuildPolicy) -> EventCache {
        EventCache::new(root, CacheSource::Local, Client::new(), Box::new(policy))
    }

    fn entry() -> EventEntry {
        EventEntry {
            link: "peak".to_string(),
            id: 42,
            desc: "Up we go".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fresh_fetch_populates_event() {
        let root = tmp_dir("fresh");
        let cache = cache(&root, EnvRebuildPolicy::default());
        let categories = Categories::standard(DefaultCategory::Last).unwrap();
        let site = FakeSite::new("2024-03-01 08:00");
        let fetcher = EventFetcher::new(&site, &cache, &categories, date("2024-02-01 12:00"));

        let event = fetcher.fetch(&entry()).await.unwrap();
        assert_eq!(event.age, 0);
        assert_eq!(event.grade.as_deref(), Some("T3"));
        assert_eq!(event.title, "Peak Name");
        assert_eq!(event.tags, vec!["Alps"]);
        assert_eq!(event.category, "hiking");
        assert_eq!(event.distance.as_deref(), Some("12 km"));
        assert_eq!(event.ascent.as_deref(), Some("800m gain"));
        assert_eq!((event.image_width, event.image_height), (1200, 630));
        assert_eq!(event.available(), 6);
        assert_eq!(event.desc, "Up we go");

        let saved = cache.load("peak").await.unwrap();
        assert_eq!(saved.event, event);
        assert_eq!(saved.version, CACHE_VERSION);
        assert!(!saved.long_past);
    }

    #[tokio::test]
    async fn test_cache_hit_ages_and_refreshes_participants() {
        let root = tmp_dir("hit");
        let cache = cache(&root, EnvRebuildPolicy::default());
        let categories = Categories::standard(DefaultCategory::Last).unwrap();
        let site = FakeSite::new("2024-03-01 08:00");
        let fetcher = EventFetcher::new(&site, &cache, &categories, date("2024-02-01 12:00"));

        fetcher.fetch(&entry()).await.unwrap();
        site.participants.set(Participants {
            registered: 9,
            waiting: 3,
        });
        let first = fetcher.fetch(&entry()).await.unwrap();
        let second = fetcher.fetch(&entry()).await.unwrap();

        assert_eq!(site.page_fetches.get(), 1);
        assert_eq!(site.participant_fetches.get(), 3);
        assert_eq!(first.age, 1);
        assert_eq!(second.age, 2);
        assert_eq!(second.registered, 9);
        assert_eq!(second.waiting, 3);
        assert_eq!(cache.load("peak").await.unwrap().event.age, 2);
    }

    #[tokio::test]
    async fn test_stale_upcoming_event_is_fetched_again() {
        let root = tmp_dir("stale");
        let cache = cache(&root, EnvRebuildPolicy::default());
        let categories = Categories::standard(DefaultCategory::Last).unwrap();
        let site = FakeSite::new("2024-03-01 08:00");
        let fetcher = EventFetcher::new(&site, &cache, &categories, date("2024-02-01 12:00"));

        for expected_age in 0..=MAX_CACHE_AGE {
            assert_eq!(fetcher.fetch(&entry()).await.unwrap().age, expected_age);
        }
        assert_eq!(site.page_fetches.get(), 1);

        let event = fetcher.fetch(&entry()).await.unwrap();
        assert_eq!(event.age, 0);
        assert_eq!(site.page_fetches.get(), 2);
    }

    #[tokio::test]
    async fn test_old_past_event_keeps_its_cache() {
        let root = tmp_dir("past_age");
        let cache = cache(&root, EnvRebuildPolicy::default());
        let categories = Categories::standard(DefaultCategory::Last).unwrap();
        let site = FakeSite::new("2024-01-30 08:00");
        let now = date("2024-02-01 12:00");
        let fetcher = EventFetcher::new(&site, &cache, &categories, now);

        let mut event = fetcher.fetch(&entry()).await.unwrap();
        event.age = MAX_CACHE_AGE + 5;
        cache
            .save(&CacheRecord {
                version: CACHE_VERSION,
                long_past: false,
                event,
            })
            .await
            .unwrap();

        let event = fetcher.fetch(&entry()).await.unwrap();
        assert_eq!(event.age, MAX_CACHE_AGE + 6);
        assert_eq!(site.page_fetches.get(), 1);
    }

    #[tokio::test]
    async fn test_long_past_event_skips_participants() {
        let root = tmp_dir("long_past");
        let cache = cache(&root, EnvRebuildPolicy::default());
        let categories = Categories::standard(DefaultCategory::Last).unwrap();
        let site = FakeSite::new("2024-01-01 08:00");
        let fetcher = EventFetcher::new(&site, &cache, &categories, date("2024-02-01 12:00"));

        fetcher.fetch(&entry()).await.unwrap();
        assert!(cache.load("peak").await.unwrap().long_past);
        assert_eq!(site.participant_fetches.get(), 1);

        let event = fetcher.fetch(&entry()).await.unwrap();
        assert_eq!(event.age, 1);
        assert_eq!(site.participant_fetches.get(), 1);
    }

    #[tokio::test]
    async fn test_forced_rebuild_ignores_cache() {
        let root = tmp_dir("forced");
        let categories = Categories::standard(DefaultCategory::Last).unwrap();
        let site = FakeSite::new("2024-03-01 08:00");
        let now = date("2024-02-01 12:00");

        let plain = cache(&root, EnvRebuildPolicy::default());
        EventFetcher::new(&site, &plain, &categories, now)
            .fetch(&entry())
            .await
            .unwrap();

        let forced = cache(
            &root,
            EnvRebuildPolicy {
                force_all: false,
                force_links: vec!["peak".to_string()],
                push_trigger: true,
            },
        );
        let event = EventFetcher::new(&site, &forced, &categories, now)
            .fetch(&entry())
            .await
            .unwrap();
        assert_eq!(event.age, 0);
        assert_eq!(site.page_fetches.get(), 2);
    }

    #[tokio::test]
    async fn test_cache_for_other_id_is_ignored() {
        let root = tmp_dir("other_id");
        let cache = cache(&root, EnvRebuildPolicy::default());
        let categories = Categories::standard(DefaultCategory::Last).unwrap();
        let site = FakeSite::new("2024-03-01 08:00");
        let fetcher = EventFetcher::new(&site, &cache, &categories, date("2024-02-01 12:00"));

        fetcher.fetch(&entry()).await.unwrap();
        let moved = EventEntry { id: 43, ..entry() };
        let event = fetcher.fetch(&moved).await.unwrap();
        assert_eq!(event.id, 43);
        assert_eq!(event.age, 0);
        assert_eq!(site.page_fetches.get(), 2);
    }

    #[tokio::test]
    async fn test_site_failure_is_fatal_and_writes_nothing() {
        let root = tmp_dir("failure");
        let cache = cache(&root, EnvRebuildPolicy::default());
        let categories = Categories::standard(DefaultCategory::Last).unwrap();
        let site = FakeSite::new("2024-03-01 08:00");
        *site.fail.borrow_mut() = Some("connection reset".to_string());
        let fetcher = EventFetcher::new(&site, &cache, &categories, date("2024-02-01 12:00"));

        let err = fetcher.fetch(&entry()).await.unwrap_err();
        assert_eq!(err.to_string(), "connection reset");
        assert_eq!(cache.load("peak").await, None);
    }
}
