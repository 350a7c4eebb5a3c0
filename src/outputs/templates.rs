//! HTML templates for the event and listing pages.
//!
//! A template turns a view record into a complete HTML document. The
//! [`HtmlTemplates`] set is what the site uses; anything implementing
//! [`EventTemplate`] and [`ListingTemplate`] can be swapped in.

use super::views::{EventView, ListingView};
use crate::utils::html_escape;
use std::fmt::Write;

pub trait EventTemplate {
    fn render_event(&self, view: &EventView) -> String;
}

pub trait ListingTemplate {
    fn render_listing(&self, view: &ListingView) -> String;
}

/// The listings linked from the navigation, as (path, label).
const NAV: [(&str, &str); 3] = [("/", "Upcoming"), ("/past", "Past"), ("/all", "All")];

/// The site's own templates.
#[derive(Debug, Clone, Default)]
pub struct HtmlTemplates;

impl EventTemplate for HtmlTemplates {
    /// A redirect to the event on the remote site, carrying the Open Graph
    /// metadata used for link previews.
    fn render_event(&self, view: &EventView) -> String {
        let title = html_escape(&view.page_title);
        let url = html_escape(&view.url);
        let description = html_escape(&preview_description(view));
        let mut html = String::new();

        writeln!(html, "<!DOCTYPE html>").unwrap();
        writeln!(html, r#"<html lang="en">"#).unwrap();
        writeln!(html, "<head>").unwrap();
        writeln!(html, r#"  <meta charset="utf-8">"#).unwrap();
        writeln!(html, "  <title>{title}</title>").unwrap();
        writeln!(html, r#"  <meta http-equiv="refresh" content="0; url={url}">"#).unwrap();
        writeln!(html, r#"  <link rel="canonical" href="{url}">"#).unwrap();
        writeln!(html, r#"  <meta property="og:type" content="website">"#).unwrap();
        writeln!(html, r#"  <meta property="og:title" content="{title}">"#).unwrap();
        writeln!(html, r#"  <meta property="og:description" content="{description}">"#).unwrap();
        writeln!(html, r#"  <meta property="og:url" content="{url}">"#).unwrap();
        writeln!(
            html,
            r#"  <meta property="og:image" content="{}">"#,
            html_escape(&view.image_url)
        )
        .unwrap();
        writeln!(html, r#"  <meta property="og:image:width" content="{}">"#, view.image_width).unwrap();
        writeln!(html, r#"  <meta property="og:image:height" content="{}">"#, view.image_height).unwrap();
        writeln!(html, "</head>").unwrap();
        writeln!(html, "<body>").unwrap();
        writeln!(
            html,
            r#"  <p>{}, {}: redirecting to <a href="{url}">{title}</a>…</p>"#,
            html_escape(&view.day_date),
            html_escape(&view.time)
        )
        .unwrap();
        writeln!(html, "</body>").unwrap();
        writeln!(html, "</html>").unwrap();
        html
    }
}

/// `desc` followed by the event details and how many places are left.
fn preview_description(view: &EventView) -> String {
    let mut lines = Vec::new();
    if !view.desc.is_empty() {
        lines.push(view.desc.clone());
    }
    let mut details = vec![view.day_date_time.clone()];
    if let Some(grade) = &view.grade {
        details.push(grade.clone());
    }
    details.extend(view.long_tags.iter().cloned());
    lines.push(details.join(" · "));
    lines.push(availability(view));
    lines.join("\n")
}

fn availability(view: &EventView) -> String {
    if view.available > 0 {
        format!(
            "{} of {} places available, {} going",
            view.available, view.capacity, view.registered
        )
    } else if view.waiting > 0 {
        format!("Full, {} on the waiting list", view.waiting)
    } else {
        "Full".to_string()
    }
}

impl ListingTemplate for HtmlTemplates {
    fn render_listing(&self, view: &ListingView) -> String {
        let mut html = String::new();

        writeln!(html, "<!DOCTYPE html>").unwrap();
        writeln!(html, r#"<html lang="en">"#).unwrap();
        writeln!(html, "<head>").unwrap();
        writeln!(html, r#"  <meta charset="utf-8">"#).unwrap();
        writeln!(html, r#"  <meta name="viewport" content="width=device-width, initial-scale=1">"#).unwrap();
        writeln!(
            html,
            "  <title>{} - {}</title>",
            html_escape(&view.heading),
            html_escape(&view.site_name)
        )
        .unwrap();
        writeln!(html, r#"  <link rel="canonical" href="{}">"#, html_escape(&view.link)).unwrap();
        writeln!(html, r#"  <link rel="stylesheet" href="/style.css">"#).unwrap();
        writeln!(html, r#"  <style id="category-style-sheet"></style>"#).unwrap();
        writeln!(html, "</head>").unwrap();
        writeln!(html, "<body>").unwrap();
        writeln!(html, "  <h1>{}</h1>", html_escape(&view.site_name)).unwrap();

        writeln!(html, "  <nav>").unwrap();
        for (path, label) in NAV {
            let current = if path == view.link { r#" class="current""# } else { "" };
            writeln!(html, r#"    <a href="{path}"{current}>{label}</a>"#).unwrap();
        }
        writeln!(html, "  </nav>").unwrap();

        writeln!(html, r#"  <ul class="category-selector">"#).unwrap();
        for category in &view.categories {
            let name = html_escape(&category.name);
            writeln!(
                html,
                "    <li><a href=\"#category-{name}\" class=\"{name}\" data-category=\"{name}\">{} {name}</a></li>",
                category.icon
            )
            .unwrap();
        }
        writeln!(html, "  </ul>").unwrap();

        writeln!(html, "  <h2>{}</h2>", html_escape(&view.heading)).unwrap();
        if view.events.is_empty() {
            writeln!(html, r#"  <p class="empty">No events.</p>"#).unwrap();
        }
        for event in &view.events {
            write_card(&mut html, event);
        }

        writeln!(html, r#"  <script src="/listing.js"></script>"#).unwrap();
        writeln!(html, "</body>").unwrap();
        writeln!(html, "</html>").unwrap();
        html
    }
}

/// One event in a listing, linking to the event on the remote site.
fn write_card(html: &mut String, event: &EventView) {
    let past = if event.past { " past" } else { "" };
    writeln!(
        html,
        r#"  <a class="card {}{past}" href="{}">"#,
        html_escape(&event.category),
        html_escape(&event.url)
    )
    .unwrap();
    writeln!(
        html,
        r#"    <img src="{}" width="{}" height="{}" alt="">"#,
        html_escape(&event.image_url),
        event.image_width,
        event.image_height
    )
    .unwrap();
    writeln!(html, r#"    <div class="card-body">"#).unwrap();
    write!(html, r#"      <h3><span class="category">{}</span> "#, event.category_icon).unwrap();
    if let Some(grade) = &event.grade {
        write!(html, r#"<span class="grade">{}</span> "#, html_escape(grade)).unwrap();
    }
    writeln!(html, "{}</h3>", html_escape(&event.title)).unwrap();
    if !event.long_tags.is_empty() {
        writeln!(html, r#"      <ul class="tags">"#).unwrap();
        for tag in &event.long_tags {
            writeln!(html, "        <li>{}</li>", html_escape(tag)).unwrap();
        }
        writeln!(html, "      </ul>").unwrap();
    }
    writeln!(html, r#"      <p class="date">{}</p>"#, html_escape(&event.day_date_time)).unwrap();
    if let Some(stats) = &event.stats {
        writeln!(html, r#"      <p class="stats">{}</p>"#, html_escape(stats)).unwrap();
    }
    writeln!(html, r#"      <p class="availability">{}</p>"#, html_escape(&availability(event))).unwrap();
    writeln!(
        html,
        r#"      <span class="permalink"><span class="linkText">{link}</span><input type="text" readonly value="{link}"></span>"#,
        link = html_escape(&event.local_link)
    )
    .unwrap();
    writeln!(html, "    </div>").unwrap();
    writeln!(html, "  </a>").unwrap();
}
