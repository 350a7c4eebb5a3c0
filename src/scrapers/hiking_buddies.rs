//! Hiking Buddies event scraper.
//!
//! Everything about an event is read from two places on the remote site:
//!
//! - the event page (`/routes/events/<id>/`): title, header image, start
//!   date and capacity, read out of the HTML
//! - the event details endpoint (`/routes/get_event_details/?event_id=<id>`):
//!   the participant and waiting lists, as JSON
//!
//! The header image itself is downloaded only to read its dimensions.

use crate::config::SiteConfig;
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use scraper::{Html, Selector};
use serde::Deserialize;
use std::error::Error;
use std::io::Cursor;
use tracing::{debug, info, instrument};
use url::Url;

/// Format of the `start` input on the event page.
const START_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

static STYLE_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"url\((.+)\)").unwrap());

/// What the event page tells us about an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPage {
    pub raw_title: String,
    /// Absolute URL of the header image.
    pub image_url: String,
    pub date: NaiveDateTime,
    pub capacity: i64,
}

/// Registration counts for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participants {
    pub registered: i64,
    pub waiting: i64,
}

/// The remote source of event data.
pub trait EventSource {
    /// Fetch and parse the event page.
    async fn fetch_page(&self, id: u64) -> Result<EventPage, Box<dyn Error>>;

    /// Fetch the current participant counts.
    async fn fetch_participants(&self, id: u64) -> Result<Participants, Box<dyn Error>>;

    /// Width and height of the image at `url`, in pixels.
    async fn fetch_image_size(&self, url: &str) -> Result<(u32, u32), Box<dyn Error>>;
}

/// Build the HTTP client used for every request.
///
/// The site crashes on requests without an `Accept-Language` header, so one
/// is always sent.
pub fn client() -> Result<Client, Box<dyn Error>> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en"));
    Ok(Client::builder().default_headers(headers).build()?)
}

/// [`EventSource`] backed by the live website.
pub struct HikingBuddies<'a> {
    client: Client,
    site: &'a SiteConfig,
}

impl<'a> HikingBuddies<'a> {
    pub fn new(client: Client, site: &'a SiteConfig) -> Self {
        Self { client, site }
    }

    async fn source(&self, url: &str) -> Result<reqwest::Response, Box<dyn Error>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response)
    }
}

impl EventSource for HikingBuddies<'_> {
    #[instrument(level = "info", skip(self))]
    async fn fetch_page(&self, id: u64) -> Result<EventPage, Box<dyn Error>> {
        let url = self.site.event_url(id)?;
        let html = self.source(url.as_str()).await?.text().await?;
        let page = parse_event_page(&html, &url)?;
        info!(raw_title = %page.raw_title, date = %page.date, "Parsed event page");
        Ok(page)
    }

    #[instrument(level = "info", skip(self))]
    async fn fetch_participants(&self, id: u64) -> Result<Participants, Box<dyn Error>> {
        let url = self.site.participants_url(id)?;
        let json = self.source(url.as_str()).await?.text().await?;
        let participants = parse_participants(&json)?;
        debug!(?participants, "Fetched participants");
        Ok(participants)
    }

    #[instrument(level = "info", skip(self))]
    async fn fetch_image_size(&self, url: &str) -> Result<(u32, u32), Box<dyn Error>> {
        let bytes = self.source(url).await?.bytes().await?;
        image_dimensions(&bytes)
    }
}

fn select_first<'a>(
    document: &'a Html,
    selector: &str,
) -> Result<scraper::ElementRef<'a>, Box<dyn Error>> {
    let parsed =
        Selector::parse(selector).map_err(|e| format!("invalid selector `{selector}`: {e:?}"))?;
    document
        .select(&parsed)
        .next()
        .ok_or_else(|| format!("event page has no element matching `{selector}`").into())
}

fn attr<'a>(
    element: scraper::ElementRef<'a>,
    selector: &str,
    name: &str,
) -> Result<&'a str, Box<dyn Error>> {
    element
        .value()
        .attr(name)
        .ok_or_else(|| format!("`{selector}` has no `{name}` attribute").into())
}

/// Extract the event details from the HTML of its page at `page_url`.
pub fn parse_event_page(html: &str, page_url: &Url) -> Result<EventPage, Box<dyn Error>> {
    let document = Html::parse_document(html);

    let raw_title = select_first(&document, ".event-name")?
        .text()
        .collect::<String>()
        .trim()
        .to_string();

    let style = attr(select_first(&document, ".cover_container")?, ".cover_container", "style")?;
    let rel_image = STYLE_URL_RE
        .captures(style)
        .map(|caps| caps[1].trim_matches(|c| c == '\'' || c == '"').to_string())
        .ok_or("`.cover_container` style has no background image url")?;
    let image_url = page_url.join(&rel_image)?.to_string();

    let start = attr(select_first(&document, "input[name=start]")?, "input[name=start]", "value")?;
    let date = NaiveDateTime::parse_from_str(start.trim(), START_FORMAT)
        .map_err(|e| format!("unparsable event start `{start}`: {e}"))?;

    let max = attr(
        select_first(&document, "input[name=max_participants]")?,
        "input[name=max_participants]",
        "value",
    )?;
    let capacity: i64 = max
        .trim()
        .parse()
        .map_err(|e| format!("unparsable capacity `{max}`: {e}"))?;

    Ok(EventPage {
        raw_title,
        image_url,
        date,
        capacity,
    })
}

#[derive(Debug, Deserialize)]
struct EventDetails {
    participants: serde_json::Value,
    participants_waiting: serde_json::Value,
}

/// Count the entries of a participant list, which the endpoint sends as a
/// JSON array encoded into a string.
fn count_list(value: &serde_json::Value) -> Result<i64, Box<dyn Error>> {
    let list = match value {
        serde_json::Value::String(encoded) => serde_json::from_str(encoded)?,
        other => other.clone(),
    };
    match list {
        serde_json::Value::Array(items) => Ok(items.len() as i64),
        other => Err(format!("expected a participant list, got {other}").into()),
    }
}

/// Parse the body of the event details endpoint.
pub fn parse_participants(json: &str) -> Result<Participants, Box<dyn Error>> {
    let details: EventDetails = serde_json::from_str(json)?;
    Ok(Participants {
        registered: count_list(&details.participants)?,
        waiting: count_list(&details.participants_waiting)?,
    })
}

/// Read the pixel dimensions from an image's header without decoding it.
pub fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32), Box<dyn Error>> {
    let reader = image::ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    Ok(reader.into_dimensions()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <div class="cover_container" style="background-image: url(/media/covers/peak.jpg)"></div>
        <h1 class="event-name">
            T3 - [Alps, Hiking] Peak Name [12 km, 800m gain]
        </h1>
        <form>
            <input name="start" value="06/04/2024 07:30:00">
            <input name="max_participants" value="15">
        </form>
    </body></html>"#;

    fn page_url() -> Url {
        Url::parse("https://www.hiking-buddies.com/routes/events/42/").unwrap()
    }

    #[test]
    fn test_parse_event_page() {
        let page = parse_event_page(PAGE, &page_url()).unwrap();
        assert_eq!(page.raw_title, "T3 - [Alps, Hiking] Peak Name [12 km, 800m gain]");
        assert_eq!(page.image_url, "https://www.hiking-buddies.com/media/covers/peak.jpg");
        assert_eq!(page.date.to_string(), "2024-06-04 07:30:00");
        assert_eq!(page.capacity, 15);
    }

    #[test]
    fn test_parse_event_page_quoted_image_url() {
        let html = PAGE.replace("url(/media/covers/peak.jpg)", "url('cover.png')");
        let page = parse_event_page(&html, &page_url()).unwrap();
        assert_eq!(
            page.image_url,
            "https://www.hiking-buddies.com/routes/events/42/cover.png"
        );
    }

    #[test]
    fn test_parse_event_page_missing_title() {
        let html = PAGE.replace("event-name", "something-else");
        let err = parse_event_page(&html, &page_url()).unwrap_err();
        assert!(err.to_string().contains(".event-name"));
    }

    #[test]
    fn test_parse_event_page_bad_date() {
        let html = PAGE.replace("06/04/2024 07:30:00", "next tuesday");
        assert!(parse_event_page(&html, &page_url()).is_err());
    }

    #[test]
    fn test_parse_participants_encoded_lists() {
        let json = r#"{
            "participants": "[{\"id\": 1}, {\"id\": 2}, {\"id\": 3}]",
            "participants_waiting": "[]",
            "other": 5
        }"#;
        assert_eq!(
            parse_participants(json).unwrap(),
            Participants {
                registered: 3,
                waiting: 0
            }
        );
    }

    #[test]
    fn test_parse_participants_plain_lists() {
        let json = r#"{"participants": [1, 2], "participants_waiting": [3]}"#;
        assert_eq!(
            parse_participants(json).unwrap(),
            Participants {
                registered: 2,
                waiting: 1
            }
        );
    }

    #[test]
    fn test_parse_participants_rejects_non_list() {
        let json = r#"{"participants": "7", "participants_waiting": "[]"}"#;
        assert!(parse_participants(json).is_err());
    }

    #[test]
    fn test_image_dimensions_png() {
        let img = image::RgbImage::new(3, 2);
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        assert_eq!(image_dimensions(bytes.get_ref()).unwrap(), (3, 2));
    }

    #[test]
    fn test_image_dimensions_garbage() {
        assert!(image_dimensions(b"definitely not an image").is_err());
    }
}
