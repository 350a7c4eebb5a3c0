//! Per-event cache of fetched data.
//!
//! Each event's last fetch is kept in `<link>/cache.yml` next to its page.
//! The cache can also be read from a copy of a previously deployed site
//! (`CACHE_BASE_URL`), so a fresh checkout does not need to scrape every
//! event again.
//!
//! This layer only reads, writes and validates records. Whether a record is
//! fresh enough is decided by the fetcher.

use crate::models::CacheRecord;
use reqwest::Client;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Bump when the cached fields change meaning; older records are ignored.
pub const CACHE_VERSION: u32 = 3;

pub const CACHE_FILE: &str = "cache.yml";

/// Decides whether an event must be fetched again regardless of its cache.
pub trait RebuildPolicy {
    fn should_force_rebuild(&self, link: &str) -> bool;
}

/// Rebuild policy driven by the build environment.
///
/// A rebuild is forced only for push-triggered builds, and then either for
/// every event or for the events named in `force_links`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvRebuildPolicy {
    /// `FORCE_REBUILD`: rebuild every event.
    pub force_all: bool,
    /// `REBUILD_LINKS`: rebuild just these events.
    pub force_links: Vec<String>,
    /// The build was triggered by a push.
    pub push_trigger: bool,
}

impl RebuildPolicy for EnvRebuildPolicy {
    fn should_force_rebuild(&self, link: &str) -> bool {
        self.push_trigger && (self.force_all || self.force_links.iter().any(|l| l == link))
    }
}

/// Where cache records are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheSource {
    /// The output directory of this build.
    Local,
    /// A deployed copy of the site.
    Remote(Url),
}

pub struct EventCache {
    root: PathBuf,
    source: CacheSource,
    client: Client,
    policy: Box<dyn RebuildPolicy>,
}

impl EventCache {
    pub fn new(
        root: impl Into<PathBuf>,
        source: CacheSource,
        client: Client,
        policy: Box<dyn RebuildPolicy>,
    ) -> Self {
        Self {
            root: root.into(),
            source,
            client,
            policy,
        }
    }

    pub fn should_force_rebuild(&self, link: &str) -> bool {
        self.policy.should_force_rebuild(link)
    }

    /// Local path of the cache file for `link`.
    pub fn path_for(&self, link: &str) -> PathBuf {
        self.root.join(link).join(CACHE_FILE)
    }

    /// Read the cache record for `link`.
    ///
    /// Any failure, including a missing or unparsable file, is logged and
    /// reported as no cache.
    #[instrument(level = "debug", skip(self))]
    pub async fn load(&self, link: &str) -> Option<CacheRecord> {
        let loaded = match &self.source {
            CacheSource::Local => read_local(&self.path_for(link)).await,
            CacheSource::Remote(base) => self.read_remote(base, link).await,
        };
        match loaded {
            Ok(Some(yaml)) => match serde_yaml::from_str::<CacheRecord>(&yaml) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(%link, error = %e, "Ignoring unparsable cache record");
                    None
                }
            },
            Ok(None) => {
                debug!(%link, "No cache record");
                None
            }
            Err(e) => {
                warn!(%link, error = %e, "Could not read cache record");
                None
            }
        }
    }

    async fn read_remote(&self, base: &Url, link: &str) -> Result<Option<String>, Box<dyn Error>> {
        let url = base.join(&format!("{link}/{CACHE_FILE}"))?;
        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(response.error_for_status()?.text().await?))
    }

    /// Can `record` stand in for the event with this `id`?
    pub fn is_usable(record: &CacheRecord, id: u64) -> bool {
        record.event.id == id && record.version == CACHE_VERSION
    }

    /// Write `record` to its event's cache file, creating the directory.
    #[instrument(level = "debug", skip_all, fields(link = %record.event.link))]
    pub async fn save(&self, record: &CacheRecord) -> Result<(), Box<dyn Error>> {
        let path = self.path_for(&record.event.link);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }
        let yaml = serde_yaml::to_string(record)?;
        fs::write(&path, yaml).await?;
        info!(path = %path.display(), age = record.event.age, "Wrote cache record");
        Ok(())
    }
}

async fn read_local(path: &Path) -> Result<Option<String>, Box<dyn Error>> {
    match fs::read_to_string(path).await {
        Ok(yaml) => Ok(Some(yaml)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
