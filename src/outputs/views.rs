//! View records handed to the page templates.
//!
//! Every value a template shows is computed here, so templates only lay
//! out strings and never reach back into an [`Event`].

use crate::category::{Categories, Category, Tag};
use crate::config::SiteConfig;
use crate::models::Event;
use crate::title::ascent_height;
use chrono::{Datelike, NaiveDateTime};

/// `4 Jun`
pub fn date_string(date: &NaiveDateTime) -> String {
    date.format("%-d %b").to_string()
}

/// `Mon 4 Jun`
pub fn day_date_string(date: &NaiveDateTime) -> String {
    date.format("%a %-d %b").to_string()
}

/// `09:30`
pub fn time_string(date: &NaiveDateTime) -> String {
    date.format("%H:%M").to_string()
}

/// The day and date, with the year only when it is not the current one, and
/// the time unless the event is from an earlier year and already past.
pub fn day_date_time_string(event: &Event, now: &NaiveDateTime) -> String {
    let format = if event.date.year() == now.year() {
        "%a %-d %b, %H:%M"
    } else if event.is_past(now.date()) {
        "%a %-d %b %Y"
    } else {
        "%a %-d %b %Y, %H:%M"
    };
    event.date.format(format).to_string()
}

/// The `[12 km, 800m asc.]` suffix, or nothing without stats.
pub fn stats_string(event: &Event) -> Option<String> {
    let stats: Vec<String> = event
        .distance
        .iter()
        .cloned()
        .chain(event.ascent.iter().map(|a| format!("{} asc.", ascent_height(a))))
        .collect();
    if stats.is_empty() {
        None
    } else {
        Some(format!("[{}]", stats.join(", ")))
    }
}

/// The page title, used as the social media preview headline:
/// `4 Jun: 🥾 🇦🇹 Peak Name [12 km, 800m asc.] - Hiking Buddies Munich`.
pub fn page_title(event: &Event, category: &Category, site_name: &str) -> String {
    let mut parts = Vec::new();
    if let Some(emoji) = category.emoji() {
        parts.push(emoji.to_string());
    }
    parts.extend(event.tags.iter().map(|t| Tag::from_raw(t).short));
    parts.push(event.title.clone());
    if let Some(stats) = stats_string(event) {
        parts.push(stats);
    }
    format!("{}: {} - {}", date_string(&event.date), parts.join(" "), site_name)
}

/// Everything the event page template shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventView {
    pub page_title: String,
    pub title: String,
    pub desc: String,
    /// The event on the remote site.
    pub url: String,
    /// The event's page on this site, e.g. `/zugspitze/`.
    pub local_link: String,
    pub grade: Option<String>,
    pub long_tags: Vec<String>,
    pub category: String,
    pub category_icon: String,
    pub day_date: String,
    pub time: String,
    pub day_date_time: String,
    pub stats: Option<String>,
    pub image_url: String,
    pub image_width: u32,
    pub image_height: u32,
    pub capacity: i64,
    pub registered: i64,
    pub waiting: i64,
    pub available: i64,
    pub past: bool,
}

impl EventView {
    pub fn new(event: &Event, site: &SiteConfig, now: &NaiveDateTime) -> Self {
        let category = site.categories.get_or_default(&event.category);
        let tags: Vec<Tag> = event.tags.iter().map(|t| Tag::from_raw(t)).collect();
        let url = site
            .event_url(event.id)
            .map(|u| u.to_string())
            .unwrap_or_default();
        Self {
            page_title: page_title(event, category, &site.site_name),
            title: event.title.clone(),
            desc: event.desc.clone(),
            url,
            local_link: format!("/{}/", event.link),
            grade: event.grade.clone(),
            long_tags: tags.into_iter().map(|t| t.long).collect(),
            category: category.name().to_string(),
            category_icon: category.icon_html(),
            day_date: day_date_string(&event.date),
            time: time_string(&event.date),
            day_date_time: day_date_time_string(event, now),
            stats: stats_string(event),
            image_url: event.image_url.clone(),
            image_width: event.image_width,
            image_height: event.image_height,
            capacity: event.capacity,
            registered: event.registered,
            waiting: event.waiting,
            available: event.available(),
            past: event.is_past(now.date()),
        }
    }
}

/// A category shown in the listing's category selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryView {
    pub name: String,
    pub icon: String,
}

/// Everything the listing template shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingView {
    /// Canonical path of the listing, e.g. `/past`.
    pub link: String,
    pub heading: String,
    pub site_name: String,
    /// Categories of the listed events, in table order.
    pub categories: Vec<CategoryView>,
    pub events: Vec<EventView>,
}

impl ListingView {
    pub fn categories_for(categories: &Categories, events: &[&Event]) -> Vec<CategoryView> {
        categories
            .used(events.iter().map(|e| e.category.as_str()))
            .into_iter()
            .map(|c| CategoryView {
                name: c.name().to_string(),
                icon: c.icon_html(),
            })
            .collect()
    }
}
