//! Site configuration: the list of events to publish and the fixed site
//! settings shared by the fetcher and renderer.

use crate::category::{Categories, DefaultCategory};
use crate::models::EventEntry;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};
use url::Url;

/// Home of the events on the remote site.
pub const DEFAULT_SITE_URL: &str = "https://www.hiking-buddies.com/";
pub const DEFAULT_SITE_NAME: &str = "Hiking Buddies Munich";

/// One value in `events.yml`, keyed by the event's link.
#[derive(Debug, Deserialize)]
struct EventConfig {
    id: u64,
    #[serde(default)]
    desc: String,
}

/// Settings built once at start-up and passed to everything that needs them.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Appended to every page title.
    pub site_name: String,
    /// Base URL of the site the events are scraped from.
    pub remote_base: Url,
    pub categories: Categories,
}

impl SiteConfig {
    pub fn new(
        site_name: &str,
        remote_base: &str,
        default_category: DefaultCategory,
    ) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            site_name: site_name.to_string(),
            remote_base: Url::parse(remote_base)?,
            categories: Categories::standard(default_category)?,
        })
    }

    /// The event's page on the remote site.
    pub fn event_url(&self, id: u64) -> Result<Url, url::ParseError> {
        self.remote_base.join(&format!("/routes/events/{id}/"))
    }

    /// The JSON endpoint listing an event's participants.
    pub fn participants_url(&self, id: u64) -> Result<Url, url::ParseError> {
        self.remote_base
            .join(&format!("/routes/get_event_details/?event_id={id}"))
    }
}

#[cfg(test)]
impl Default for SiteConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SITE_NAME, DEFAULT_SITE_URL, DefaultCategory::Last).unwrap()
    }
}

/// Parse the `events.yml` mapping of link to `{id, desc}`.
pub fn parse_events(yaml: &str) -> Result<Vec<EventEntry>, Box<dyn Error>> {
    let events: BTreeMap<String, EventConfig> = serde_yaml::from_str(yaml)?;
    Ok(events
        .into_iter()
        .map(|(link, event)| EventEntry {
            link,
            id: event.id,
            desc: event.desc,
        })
        .collect())
}

#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_events(path: &Path) -> Result<Vec<EventEntry>, Box<dyn Error>> {
    let yaml = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("could not read {}: {e}", path.display()))?;
    let events = parse_events(&yaml)?;
    info!(count = events.len(), "Loaded event list");
    Ok(events)
}
