//! Command-line interface definitions.
//!
//! Every option can also be set through the environment, which is how the
//! CI build passes the rebuild toggles.

use crate::cache::EnvRebuildPolicy;
use crate::category::DefaultCategory;
use crate::config::{DEFAULT_SITE_NAME, DEFAULT_SITE_URL};
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Build and maintain the event listing site.
///
/// # Examples
///
/// ```sh
/// # Build the site into the current directory
/// hb_events build
///
/// # Force every event to be scraped again
/// FORCE_REBUILD=true GITHUB_EVENT_NAME=push hb_events build
///
/// # Refresh Facebook's previews after deploying
/// FB_TOKEN=... hb_events previews
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch every event and write the event pages and listings
    Build(BuildArgs),
    /// Ask Facebook to refresh its link previews of every page
    Previews(PreviewArgs),
    /// Compile stylesheet sources (`*.css.scss`, `*.css.sass`)
    Stylesheets(StylesheetArgs),
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// The list of events to publish
    #[arg(short, long, default_value = "events.yml")]
    pub events: PathBuf,

    /// Root directory of the generated site
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Site the events are scraped from
    #[arg(long, env = "SITE_URL", default_value = DEFAULT_SITE_URL)]
    pub site_url: String,

    /// Name appended to every page title
    #[arg(long, default_value = DEFAULT_SITE_NAME)]
    pub site_name: String,

    /// Category used for events whose title names none
    #[arg(long, value_enum, env = "DEFAULT_CATEGORY", default_value_t = DefaultCategory::Last)]
    pub default_category: DefaultCategory,

    /// Fetch every event again instead of using the cache (push builds only).
    /// `0`, `false`, `no`, `off` and the empty string leave it off.
    #[arg(long, env = "FORCE_REBUILD", action = ArgAction::SetTrue, value_parser = FalseyValueParser::new())]
    pub force_rebuild: bool,

    /// Links of events to fetch again (push builds only)
    #[arg(long, env = "REBUILD_LINKS", value_delimiter = ',')]
    pub rebuild_links: Vec<String>,

    /// What triggered the build; `push` allows forced rebuilds
    #[arg(long, env = "GITHUB_EVENT_NAME")]
    pub trigger: Option<String>,

    /// Read caches from this deployed copy of the site instead of the output directory
    #[arg(long, env = "CACHE_BASE_URL")]
    pub cache_url: Option<String>,
}

impl BuildArgs {
    pub fn is_push(&self) -> bool {
        self.trigger.as_deref() == Some("push")
    }

    pub fn rebuild_policy(&self) -> EnvRebuildPolicy {
        EnvRebuildPolicy {
            force_all: self.force_rebuild,
            force_links: self
                .rebuild_links
                .iter()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect(),
            push_trigger: self.is_push(),
        }
    }
}

#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Root directory of the built site
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// File holding the site's domain
    #[arg(long, default_value = "CNAME")]
    pub cname: PathBuf,

    /// Facebook Graph API access token
    #[arg(long, env = "FB_TOKEN", hide_env_values = true)]
    pub token: String,
}

#[derive(Args, Debug)]
pub struct StylesheetArgs {
    /// Directory searched when no files are given
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    /// Stylesheet sources to compile
    pub files: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_args(args: &[&str]) -> BuildArgs {
        let cli = Cli::parse_from(std::iter::once("hb_events").chain(std::iter::once("build")).chain(args.iter().copied()));
        match cli.command {
            Command::Build(args) => args,
            other => panic!("expected build, got {other:?}"),
        }
    }

    #[test]
    fn test_build_defaults() {
        let args = build_args(&["--site-url", DEFAULT_SITE_URL]);
        assert_eq!(args.events, PathBuf::from("events.yml"));
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert_eq!(args.site_name, DEFAULT_SITE_NAME);
    }

    #[test]
    fn test_build_rebuild_policy() {
        let args = build_args(&[
            "--force-rebuild",
            "--rebuild-links",
            "peak, lake",
            "--trigger",
            "push",
            "--cache-url",
            "https://hikes.example.org/",
        ]);
        assert_eq!(
            args.rebuild_policy(),
            EnvRebuildPolicy {
                force_all: true,
                force_links: vec!["peak".to_string(), "lake".to_string()],
                push_trigger: true,
            }
        );
        assert_eq!(args.cache_url.as_deref(), Some("https://hikes.example.org/"));
    }

    #[test]
    fn test_force_rebuild_from_env() {
        let cases = [("1", true), ("yes", true), ("true", true), ("0", false), ("false", false), ("", false)];
        for (value, expected) in cases {
            // SAFETY: no other test depends on FORCE_REBUILD.
            unsafe { std::env::set_var("FORCE_REBUILD", value) };
            let parsed = Cli::try_parse_from(["hb_events", "build"]);
            unsafe { std::env::remove_var("FORCE_REBUILD") };
            match parsed.map(|cli| cli.command) {
                Ok(Command::Build(args)) => {
                    assert_eq!(args.force_rebuild, expected, "FORCE_REBUILD={value:?}")
                }
                other => panic!("FORCE_REBUILD={value:?} gave {other:?}"),
            }
        }
    }

    #[test]
    fn test_default_category_option() {
        assert_eq!(build_args(&[]).default_category, DefaultCategory::Last);
        let args = build_args(&["--default-category", "first"]);
        assert_eq!(args.default_category, DefaultCategory::First);
    }

    #[test]
    fn test_scheduled_build_is_not_push() {
        let args = build_args(&["--trigger", "schedule"]);
        assert!(!args.is_push());
    }

    #[test]
    fn test_stylesheet_files() {
        let cli = Cli::parse_from(["hb_events", "stylesheets", "a.css.scss", "b.css.sass"]);
        match cli.command {
            Command::Stylesheets(args) => {
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.root, PathBuf::from("."));
            }
            other => panic!("expected stylesheets, got {other:?}"),
        }
    }

    #[test]
    fn test_previews_token() {
        let cli = Cli::parse_from(["hb_events", "previews", "--token", "secret"]);
        match cli.command {
            Command::Previews(args) => {
                assert_eq!(args.token, "secret");
                assert_eq!(args.cname, PathBuf::from("CNAME"));
            }
            other => panic!("expected previews, got {other:?}"),
        }
    }
}
