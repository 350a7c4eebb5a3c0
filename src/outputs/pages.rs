//! Rendering events to pages and writing them into the site.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── index.html          # upcoming events
//! ├── past.html
//! ├── all.html
//! └── zugspitze/
//!     ├── index.html      # redirect + preview metadata
//!     └── cache.yml       # written by the cache
//! ```

use super::listings::Listing;
use super::templates::{EventTemplate, ListingTemplate};
use super::views::{EventView, ListingView};
use crate::config::SiteConfig;
use crate::models::Event;
use chrono::NaiveDateTime;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

pub struct EventRenderer<'a, T> {
    site: &'a SiteConfig,
    templates: T,
    now: NaiveDateTime,
}

impl<'a, T: EventTemplate + ListingTemplate> EventRenderer<'a, T> {
    pub fn new(site: &'a SiteConfig, templates: T, now: NaiveDateTime) -> Self {
        Self {
            site,
            templates,
            now,
        }
    }

    pub fn render_event(&self, event: &Event) -> String {
        self.templates
            .render_event(&EventView::new(event, self.site, &self.now))
    }

    pub fn render_listing(&self, listing: Listing, events: &[Event]) -> String {
        let selected = listing.select(events, self.now.date());
        let view = ListingView {
            link: listing.link(),
            heading: listing.heading().to_string(),
            site_name: self.site.site_name.clone(),
            categories: ListingView::categories_for(&self.site.categories, &selected),
            events: selected
                .iter()
                .map(|e| EventView::new(e, self.site, &self.now))
                .collect(),
        };
        self.templates.render_listing(&view)
    }

    /// Write the event's page to `<output_dir>/<link>/index.html`.
    #[instrument(level = "info", skip_all, fields(link = %event.link))]
    pub async fn write_event(&self, output_dir: &Path, event: &Event) -> Result<PathBuf, Box<dyn Error>> {
        let dir = output_dir.join(&event.link);
        fs::create_dir_all(&dir).await?;
        let path = dir.join("index.html");
        fs::write(&path, self.render_event(event)).await?;
        info!("Saving '{}' to /{}/", event.title, event.link);
        Ok(path)
    }

    /// Write the upcoming, past and all-events listings.
    #[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), events = events.len()))]
    pub async fn write_listings(&self, output_dir: &Path, events: &[Event]) -> Result<Vec<PathBuf>, Box<dyn Error>> {
        let mut written = Vec::new();
        for listing in Listing::ALL {
            let path = output_dir.join(listing.file_name());
            fs::write(&path, self.render_listing(listing, events)).await?;
            info!(path = %path.display(), "Wrote listing");
            written.push(path);
        }
        Ok(written)
    }
}
