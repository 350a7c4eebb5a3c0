//! Scrapers for the remote site the events are published on.
//!
//! | Site | Module | Method |
//! |------|--------|--------|
//! | Hiking Buddies | [`hiking_buddies`] | HTML scraping + JSON endpoint |
//!
//! A scraper exposes an [`hiking_buddies::EventSource`] so that the fetcher
//! can be driven by something other than the live site.

pub mod hiking_buddies;
