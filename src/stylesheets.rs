//! Compiling the site's stylesheet sources.
//!
//! Sources are named after the file they produce plus the source language,
//! e.g. `style.css.scss` compiles to `style.css`. Sass sources are handed to
//! the `sass` executable; the compiled output is then looked at again in
//! case it needs further processing.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, instrument, warn};
use walkdir::WalkDir;

static SOURCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.css\.(.*)$").unwrap());
static EXTENSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+)\.([^.]*)$").unwrap());

/// Is this path a stylesheet source such as `style.css.scss`?
pub fn is_source(path: &Path) -> bool {
    SOURCE_RE.is_match(&path.to_string_lossy())
}

/// Split `style.css.scss` into `style.css` and `scss`.
pub fn split_extension(path: &Path) -> Option<(PathBuf, String)> {
    let path = path.to_string_lossy();
    let caps = EXTENSION_RE.captures(&path)?;
    Some((PathBuf::from(&caps[1]), caps[2].to_string()))
}

/// Every stylesheet source below `root`, in a stable order.
pub fn find_sources(root: &Path) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && is_source(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    sources.sort();
    sources
}

/// Pick the files to compile: everything below `root` when `paths` is
/// empty, otherwise the given paths that look like stylesheet sources.
pub fn select_sources(root: &Path, paths: &[PathBuf]) -> Vec<PathBuf> {
    if paths.is_empty() {
        return find_sources(root);
    }
    paths
        .iter()
        .filter(|path| {
            let ok = is_source(path);
            if !ok {
                warn!(path = %path.display(), "Not a CSS file");
            }
            ok
        })
        .cloned()
        .collect()
}

/// Compile one file, following the chain of outputs until plain CSS.
#[instrument(level = "info", skip_all, fields(input = %input.display()))]
pub fn compile(input: &Path) -> Result<(), Box<dyn Error>> {
    let mut current = input.to_path_buf();
    loop {
        let Some((output, extension)) = split_extension(&current) else {
            warn!(path = %current.display(), "Unable to compile: no extension");
            return Ok(());
        };
        match extension.as_str() {
            "scss" | "sass" => {
                run_sass(&current, &output)?;
                current = output;
            }
            "css" | "map" => return Ok(()),
            _ => {
                warn!(path = %current.display(), %extension, "Unable to compile: unrecognised extension");
                return Ok(());
            }
        }
    }
}

fn run_sass(input: &Path, output: &Path) -> Result<(), Box<dyn Error>> {
    let status = Command::new("sass")
        .arg(input)
        .arg(output)
        .status()
        .map_err(|e| format!("could not run sass: {e}"))?;
    if !status.success() {
        return Err(format!("sass failed on {} ({status})", input.display()).into());
    }
    if !output.is_file() {
        return Err(format!("sass produced no CSS for {}", input.display()).into());
    }
    info!(output = %output.display(), "Built CSS");
    Ok(())
}

/// Compile every selected stylesheet source; stops at the first failure.
pub fn compile_all(root: &Path, paths: &[PathBuf]) -> Result<usize, Box<dyn Error>> {
    let sources = select_sources(root, paths);
    for source in &sources {
        compile(source)?;
    }
    Ok(sources.len())
}
