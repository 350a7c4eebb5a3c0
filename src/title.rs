//! Parsing of the free-text event titles used on the Hiking Buddies site.
//!
//! Organisers pack a surprising amount of structure into a title:
//!
//! ```text
//! T3 - [Alps, Hiking] Peak Name [12 km, 800m gain]
//! ^^   ^^^^^^^^^^^^^^ ^^^^^^^^^ ^^^^^^^^^^^^^^^^^^
//! grade     tags        title         stats
//! ```
//!
//! Each part is optional. The parts are peeled off in order, each step
//! working on whatever the previous step left behind.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static GRADE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(T\d)\s*-\s*(.+)$").unwrap());
static LEADING_TAGS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[(.+?)\]\s*(.+)$").unwrap());
static TRAILING_STATS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*\S)\s*\[(.+?)\]$").unwrap());
static DISTANCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(.+[^a-z] km)$").unwrap());
static ASCENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^((.+[^a-z])m)\s+(asc(ent|\.)?|gain)$").unwrap());

/// The structured pieces of a raw event title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTitle {
    /// Difficulty grade such as `T3`.
    pub grade: Option<String>,
    /// The title with grade, tags and stats removed.
    pub title: String,
    /// Raw tag tokens, in order of appearance.
    pub tags: Vec<String>,
    /// Distance, lower-cased, e.g. `12 km`.
    pub distance: Option<String>,
    /// Ascent stat, lower-cased, e.g. `800m gain`.
    pub ascent: Option<String>,
}

/// Split a raw title into grade, tags, title and stats.
///
/// A title without any of the optional parts comes back unchanged as
/// [`ParsedTitle::title`].
pub fn parse_title(raw_title: &str) -> ParsedTitle {
    let mut parsed = ParsedTitle::default();

    let mut working = match GRADE_RE.captures(raw_title) {
        Some(caps) => {
            parsed.grade = Some(caps[1].to_string());
            caps[2].to_string()
        }
        None => raw_title.to_string(),
    };

    while let Some(caps) = LEADING_TAGS_RE.captures(&working) {
        parsed.tags.extend(split_list(&caps[1]));
        working = caps[2].to_string();
    }

    if let Some(caps) = TRAILING_STATS_RE.captures(&working) {
        parse_stats(&caps[2], &mut parsed);
        working = caps[1].to_string();
    }

    parsed.title = working;
    parsed
}

/// Fill in distance and ascent from the contents of a stats block such as
/// `1.2 Km, 345 m gain`. Later stats of the same kind replace earlier ones.
fn parse_stats(stats: &str, parsed: &mut ParsedTitle) {
    for stat in split_list(stats) {
        if DISTANCE_RE.is_match(&stat) {
            parsed.distance = Some(stat.trim().to_lowercase());
        } else if ASCENT_RE.is_match(&stat) {
            parsed.ascent = Some(stat.trim().to_lowercase());
        } else {
            warn!(%stat, %stats, "Unrecognised stat in title");
        }
    }
}

/// The height part of an ascent stat, e.g. `800m` for `800m gain`.
pub fn ascent_height(ascent: &str) -> &str {
    ASCENT_RE
        .captures(ascent)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(ascent)
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}
