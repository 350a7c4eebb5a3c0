//! Event categories and tag classification.
//!
//! A category (hiking, cycling, ...) is chosen from the tags in an event
//! title. The category table is built once at start-up and never changes.

use crate::utils::titleize;
use std::collections::BTreeSet;
use std::error::Error;

/// A kind of event, e.g. hiking or cycling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    name: String,
    icon: Option<String>,
    emoji: Option<String>,
    terms: BTreeSet<String>,
}

impl Category {
    /// Create a category matching its own name and any extra `terms`.
    pub fn new(name: &str, terms: &[&str]) -> Self {
        let terms = std::iter::once(name)
            .chain(terms.iter().copied())
            .map(str::to_lowercase)
            .collect();
        Self {
            name: name.to_string(),
            icon: None,
            emoji: None,
            terms,
        }
    }

    /// Set the FontAwesome icon class, e.g. `fa-hiking`.
    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn with_emoji(mut self, emoji: &str) -> Self {
        self.emoji = Some(emoji.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn emoji(&self) -> Option<&str> {
        self.emoji.as_deref()
    }

    /// Does `tag` name this category? Matching ignores case.
    pub fn matches(&self, tag: &str) -> bool {
        self.terms.contains(&tag.to_lowercase())
    }

    /// The category as an HTML snippet: the icon if there is one, otherwise
    /// the emoji.
    pub fn icon_html(&self) -> String {
        match (&self.icon, &self.emoji) {
            (Some(icon), _) => format!(r#"<i class="fas {icon}"></i>"#),
            (None, Some(emoji)) => emoji.clone(),
            (None, None) => String::new(),
        }
    }
}

/// Which end of the table is used when no tag names a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DefaultCategory {
    First,
    Last,
}

/// The ordered, immutable table of categories.
#[derive(Debug, Clone)]
pub struct Categories {
    categories: Vec<Category>,
    default: DefaultCategory,
}

impl Categories {
    pub fn new(categories: Vec<Category>, default: DefaultCategory) -> Result<Self, Box<dyn Error>> {
        if categories.is_empty() {
            return Err("at least one category is required".into());
        }
        Ok(Self {
            categories,
            default,
        })
    }

    /// The categories used on the site: cycling, then hiking.
    pub fn standard(default: DefaultCategory) -> Result<Self, Box<dyn Error>> {
        Self::new(
            vec![
                Category::new("cycling", &["cycle", "bike", "biking"])
                    .with_icon("fa-biking")
                    .with_emoji("🚴"),
                Category::new("hiking", &["hike"])
                    .with_icon("fa-hiking")
                    .with_emoji("🥾"),
            ],
            default,
        )
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Look up a category by name, falling back to the default.
    pub fn get_or_default(&self, name: &str) -> &Category {
        self.get(name).unwrap_or_else(|| self.default_category())
    }

    pub fn default_category(&self) -> &Category {
        match self.default {
            DefaultCategory::First => &self.categories[0],
            DefaultCategory::Last => &self.categories[self.categories.len() - 1],
        }
    }

    /// Pull the category out of a list of title tags.
    ///
    /// The first tag naming a category selects it and is removed. Tags after
    /// it are kept as they are, even if they name another category. Without a
    /// match every tag is kept and the default category is returned.
    pub fn classify(&self, tags: Vec<String>) -> (Vec<String>, &Category) {
        let mut found: Option<&Category> = None;
        let remaining = tags
            .into_iter()
            .filter(|tag| {
                if found.is_some() {
                    return true;
                }
                found = self.categories.iter().find(|c| c.matches(tag));
                found.is_none()
            })
            .collect();
        (remaining, found.unwrap_or_else(|| self.default_category()))
    }

    /// The categories, in table order, that appear in `names`.
    pub fn used<'a, I>(&self, names: I) -> Vec<&Category>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let names: BTreeSet<&str> = names.into_iter().collect();
        self.categories
            .iter()
            .filter(|c| names.contains(c.name.as_str()))
            .collect()
    }
}

/// The two display forms of a title tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Safe to prefix to a title.
    pub short: String,
    /// Shown on its own, e.g. in the event preview.
    pub long: String,
}

impl Tag {
    pub fn from_raw(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "austria" => Self {
                short: "🇦🇹".to_string(),
                long: "🇦🇹 Austria".to_string(),
            },
            "italy" => Self {
                short: "🇮🇹".to_string(),
                long: "🇮🇹 Italy".to_string(),
            },
            _ => {
                let long = titleize(raw);
                Self {
                    short: format!("[{long}]"),
                    long,
                }
            }
        }
    }
}
