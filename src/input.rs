//! Scan target input.
//!
//! Reads a single-column CSV of full URLs and/or route paths, composes routes
//! against a base URL, and deduplicates while keeping first occurrences.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::config::BASE_URL_PLACEHOLDER;

/// Entries read from the input CSV, split by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Targets {
    /// Entries with an http(s) scheme, used as-is
    pub full_urls: Vec<String>,
    /// Paths such as `/about` that still need a base URL
    pub routes: Vec<String>,
}

impl Targets {
    pub fn len(&self) -> usize {
        self.full_urls.len() + self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Whether the entry carries an http(s) scheme. Well-formedness is the
/// validator's concern, not the reader's.
fn is_full_url(entry: &str) -> bool {
    entry.split_once(':').is_some_and(|(scheme, _)| {
        scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
    })
}

/// Reads scan targets from a CSV file.
///
/// The first row is a header and is skipped. Only the first column is read;
/// blank rows are ignored.
///
/// # Errors
///
/// Returns an error if the file is missing or unreadable, is not valid CSV,
/// or contains no entries.
pub fn read_targets(path: &Path) -> Result<Targets> {
    if !path.exists() {
        bail!(
            "CSV file not found: '{}'. Create it with one URL or route per line.",
            path.display()
        );
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open '{}'", path.display()))?;

    let mut targets = Targets::default();
    for (index, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("Failed to parse '{}'", path.display()))?;
        // header is line 1
        let line = index + 2;

        let Some(entry) = row.get(0).map(str::trim).filter(|e| !e.is_empty()) else {
            continue;
        };

        if is_full_url(entry) {
            targets.full_urls.push(entry.to_string());
        } else if entry.starts_with('/') {
            targets.routes.push(entry.to_string());
        } else {
            log::warn!(
                "Row {} route '{}' does not start with '/'; prepending '/'",
                line,
                entry
            );
            targets.routes.push(format!("/{entry}"));
        }
    }

    if targets.is_empty() {
        bail!("No valid entries found in '{}'", path.display());
    }

    if !targets.full_urls.is_empty() {
        log::info!(
            "Loaded {} full URL(s) from '{}'",
            targets.full_urls.len(),
            path.display()
        );
    }
    if !targets.routes.is_empty() {
        log::info!(
            "Loaded {} route path(s) from '{}' (base URL will be prepended)",
            targets.routes.len(),
            path.display()
        );
    }

    Ok(targets)
}

/// Joins each route to `base_url`, avoiding a double slash.
pub fn build_full_urls(base_url: &str, routes: &[String]) -> Vec<String> {
    let base = base_url.trim_end_matches('/');
    routes.iter().map(|route| format!("{base}{route}")).collect()
}

/// Removes repeated entries, keeping the first occurrence of each.
pub fn dedup_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(urls.len());
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Produces the final, deduplicated URL list: full URLs first, then routes
/// composed against `base_url`.
///
/// # Errors
///
/// Returns an error if there are routes but no usable base URL.
pub fn resolve_targets(targets: &Targets, base_url: Option<&str>) -> Result<Vec<String>> {
    let mut urls = targets.full_urls.clone();

    if !targets.routes.is_empty() {
        let base = base_url
            .map(str::trim)
            .filter(|b| !b.is_empty() && b.trim_end_matches('/') != BASE_URL_PLACEHOLDER);
        let Some(base) = base else {
            bail!(
                "{} route path(s) need a base URL; set BASE_URL in .env or pass --base-url",
                targets.routes.len()
            );
        };
        log::info!("Using base URL: {}", base);
        urls.extend(build_full_urls(base, &targets.routes));
    }

    let total = urls.len();
    let urls = dedup_preserving_order(urls);
    if urls.len() < total {
        log::info!("Removed {} duplicate URL(s)", total - urls.len());
    }
    Ok(urls)
}
