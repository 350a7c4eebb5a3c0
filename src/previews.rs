//! Refreshing Facebook's link previews of the built site.
//!
//! Facebook caches the Open Graph metadata of every page it has seen. After
//! a build, each page is submitted to the Graph API with `scrape=true` so
//! that shared links show the updated title and availability.

use crate::utils::truncate_for_log;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument, warn};
use urlencoding::encode;
use walkdir::WalkDir;

pub const GRAPH_URL: &str = "https://graph.facebook.com/";

/// Every `.html` file below `root`, relative to it, in a stable order.
pub fn html_pages(root: &Path) -> Vec<PathBuf> {
    let mut pages: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable path");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "html"))
        .filter_map(|entry| entry.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect();
    pages.sort();
    pages
}

/// The public URL of a page: `past.html` is served at `/past` and
/// `zugspitze/index.html` at `/zugspitze/`.
pub fn page_url(cname: &str, page: &Path) -> String {
    let path = page
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    let path = path.strip_suffix(".html").unwrap_or(&path);
    let path = path.strip_suffix("index").unwrap_or(path);
    format!("https://{}/{}", cname.trim(), path)
}

/// The form body asking the Graph API to scrape `url` again.
pub fn scrape_request_body(url: &str, token: &str) -> String {
    format!(
        "id={}&scrape=true&access_token={}",
        encode(url),
        encode(token)
    )
}

/// Ask Facebook to re-scrape every page of the site.
///
/// Failures are logged and do not stop the remaining pages. Returns the
/// number of pages Facebook accepted.
#[instrument(level = "info", skip_all, fields(root = %root.display(), cname = %cname))]
pub async fn rebuild_previews(
    client: &Client,
    graph_url: &str,
    root: &Path,
    cname: &str,
    token: &str,
) -> Result<usize, Box<dyn Error>> {
    let pages = html_pages(root);
    info!(count = pages.len(), "Refreshing link previews");

    let results: Vec<bool> = stream::iter(pages)
        .then(|page| async move {
            let url = page_url(cname, &page);
            match request_scrape(client, graph_url, &url, token).await {
                Ok(()) => {
                    info!(%url, "Preview refreshed");
                    true
                }
                Err(e) => {
                    error!(%url, error = %e, "Preview refresh failed");
                    false
                }
            }
        })
        .collect()
        .await;

    let refreshed = results.into_iter().filter(|ok| *ok).count();
    info!(refreshed, "Finished refreshing link previews");
    Ok(refreshed)
}

async fn request_scrape(client: &Client, graph_url: &str, url: &str, token: &str) -> Result<(), Box<dyn Error>> {
    let response = client
        .post(graph_url)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(scrape_request_body(url, token))
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(%url, %status, body = %truncate_for_log(&body, 500), "Graph API refused the scrape");
        return Err(format!("Graph API responded {status}").into());
    }
    Ok(())
}

/// Read the site's domain from its `CNAME` file.
pub async fn read_cname(path: &Path) -> Result<String, Box<dyn Error>> {
    let cname = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("could not read {}: {e}", path.display()))?;
    let cname = cname.trim().to_string();
    if cname.is_empty() {
        return Err(format!("{} is empty", path.display()).into());
    }
    Ok(cname)
}
