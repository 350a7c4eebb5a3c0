//! # hb_events
//!
//! Builds the static event listing site of the Hiking Buddies Munich group.
//! Each configured event is scraped from the Hiking Buddies website, its
//! title is broken down into grade, tags, category and stats, and a preview
//! page plus the upcoming, past and all-events listings are written out.
//!
//! ## Usage
//!
//! ```sh
//! hb_events build -e events.yml -o site
//! hb_events previews -r site
//! hb_events stylesheets
//! ```
//!
//! ## Architecture
//!
//! The build is a strictly sequential pipeline:
//! 1. **Configuration**: read `events.yml`
//! 2. **Fetching**: for each event, reuse the cache or scrape the website,
//!    then write the cache back
//! 3. **Output**: write each event page, then the three listings

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};
use url::Url;

mod cache;
mod category;
mod cli;
mod config;
mod fetcher;
mod models;
mod outputs;
mod previews;
mod scrapers;
mod stylesheets;
mod title;
mod utils;

use cache::{CacheSource, EventCache};
use cli::{BuildArgs, Cli, Command, PreviewArgs, StylesheetArgs};
use config::SiteConfig;
use fetcher::EventFetcher;
use outputs::pages::EventRenderer;
use outputs::templates::HtmlTemplates;
use scrapers::hiking_buddies::{self, HikingBuddies};
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(?args.command, "Parsed CLI arguments");

    let result = match args.command {
        Command::Build(args) => build(args).await,
        Command::Previews(args) => refresh_previews(args).await,
        Command::Stylesheets(args) => compile_stylesheets(args),
    };
    if let Err(e) = &result {
        error!(error = %e, "Aborting");
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), millis = elapsed.subsec_millis(), "Execution complete");
    result
}

#[instrument(level = "info", skip_all)]
async fn build(args: BuildArgs) -> Result<(), Box<dyn Error>> {
    let site = SiteConfig::new(&args.site_name, &args.site_url, args.default_category)?;
    let entries = config::load_events(&args.events).await?;

    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(path = %args.output_dir.display(), error = %e, "Output directory is not writable");
        return Err(e);
    }

    let source = match args.cache_url.as_deref() {
        Some(base) => {
            let base = if base.ends_with('/') {
                base.to_string()
            } else {
                format!("{base}/")
            };
            info!(%base, "Reading caches from deployed site");
            CacheSource::Remote(Url::parse(&base)?)
        }
        None => CacheSource::Local,
    };
    let policy = args.rebuild_policy();
    info!(force_all = policy.force_all, force_links = ?policy.force_links, push = policy.push_trigger, "Rebuild policy");

    let client = hiking_buddies::client()?;
    let cache = EventCache::new(&args.output_dir, source, client.clone(), Box::new(policy));
    let now = Local::now().naive_local();
    let fetcher = EventFetcher::new(HikingBuddies::new(client, &site), &cache, &site.categories, now);
    let renderer = EventRenderer::new(&site, HtmlTemplates, now);

    let mut events = Vec::with_capacity(entries.len());
    for entry in &entries {
        let event = fetcher.fetch(entry).await?;
        renderer.write_event(&args.output_dir, &event).await?;
        events.push(event);
    }

    renderer.write_listings(&args.output_dir, &events).await?;
    info!(count = events.len(), "Site built");
    Ok(())
}

#[instrument(level = "info", skip_all)]
async fn refresh_previews(args: PreviewArgs) -> Result<(), Box<dyn Error>> {
    let cname = previews::read_cname(&args.cname).await?;
    let client = reqwest::Client::new();
    previews::rebuild_previews(&client, previews::GRAPH_URL, &args.root, &cname, &args.token).await?;
    Ok(())
}

fn compile_stylesheets(args: StylesheetArgs) -> Result<(), Box<dyn Error>> {
    let compiled = stylesheets::compile_all(&args.root, &args.files)?;
    info!(count = compiled, "Stylesheets processed");
    Ok(())
}
