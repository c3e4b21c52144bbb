//! Improvement summary: weak categories, targeted suggestions, worst routes.

use std::collections::HashSet;

use colored::Colorize;

use super::{AverageScores, StrategyAverages};
use crate::config::CATEGORIES;
use crate::models::ResultRecord;

/// Averages below this are listed as priority areas.
const GOOD_SCORE: f64 = 90.0;
/// Routes below this performance score are called out individually.
const POOR_SCORE: f64 = 50.0;
/// Lab audit scores below this trigger a metric-specific hint.
const POOR_LAB_SCORE: u8 = 50;
/// Desktop-minus-mobile performance gap that warrants a mobile-first note.
const MOBILE_GAP_THRESHOLD: f64 = 15.0;
const MAX_WORST_ROUTES: usize = 5;

const PERFORMANCE_SUGGESTIONS: &[&str] = &[
    "Optimise and compress images (use WebP/AVIF formats).",
    "Minify CSS, JavaScript, and HTML.",
    "Enable text compression (Gzip/Brotli) on the server.",
    "Implement lazy loading for below-the-fold images and iframes.",
    "Reduce server response time (TTFB), consider a CDN.",
    "Defer or async non-critical JavaScript.",
    "Preconnect to required origins and preload key resources.",
];

const ACCESSIBILITY_SUGGESTIONS: &[&str] = &[
    "Add alt text to all images.",
    "Ensure sufficient colour contrast ratios (WCAG AA).",
    "Use semantic HTML elements (<nav>, <main>, <header>, etc.).",
    "Ensure all interactive elements are keyboard accessible.",
    "Add ARIA labels to icon-only buttons and links.",
    "Ensure form inputs have associated <label> elements.",
];

const BEST_PRACTICES_SUGGESTIONS: &[&str] = &[
    "Serve all assets over HTTPS (no mixed content).",
    "Use HTTP/2 or HTTP/3 for asset delivery.",
    "Avoid deprecated APIs and browser features.",
    "Ensure correct image aspect ratios to prevent layout shifts.",
    "Add a Content Security Policy (CSP) header.",
    "Keep JavaScript libraries up to date to patch vulnerabilities.",
];

const SEO_SUGGESTIONS: &[&str] = &[
    "Ensure every page has a unique <title> and <meta description>.",
    "Use a mobile-friendly responsive design.",
    "Ensure all pages return valid HTTP status codes.",
    "Add structured data (Schema.org JSON-LD) where applicable.",
    "Create and submit an XML sitemap.",
    "Ensure links have descriptive anchor text.",
];

const CRITICAL_PERFORMANCE: &str = "Critical: performance is in the red zone. Focus on reducing \
     JavaScript bundle size and eliminating render-blocking resources.";

/// (lab label, hint) pairs checked against the lab audit scores.
const LAB_HINTS: &[(&str, &str)] = &[
    (
        "LCP",
        "LCP is poor: optimise the largest element (hero image, heading font, or large text block).",
    ),
    (
        "CLS",
        "CLS is poor: set explicit width/height on images and embeds, avoid injecting content above the fold.",
    ),
    (
        "TBT",
        "TBT is poor: break up long JavaScript tasks, use code splitting, and defer heavy computations.",
    ),
];

/// `best-practices` -> `Best Practices`.
pub fn category_name(category: &str) -> String {
    category
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Categories averaging below 90 overall, weakest first.
pub fn weak_areas(all: &AverageScores) -> Vec<(&'static str, f64)> {
    let mut weak: Vec<(&'static str, f64)> = CATEGORIES
        .iter()
        .filter_map(|category| Some((*category, all.get(category)?)))
        .filter(|(_, average)| *average < GOOD_SCORE)
        .collect();
    weak.sort_by(|a, b| a.1.total_cmp(&b.1));
    weak
}

/// Metric-specific hints from the first record that carries lab data.
pub fn lab_suggestions(records: &[ResultRecord]) -> Vec<&'static str> {
    let Some(lab) = records.iter().find_map(|r| r.lab_metrics.as_ref()) else {
        return Vec::new();
    };
    LAB_HINTS
        .iter()
        .filter(|(label, _)| {
            lab.get(*label)
                .and_then(|m| m.score)
                .is_some_and(|score| score < POOR_LAB_SCORE)
        })
        .map(|(_, hint)| *hint)
        .collect()
}

/// Suggestions for one weak category.
pub fn category_suggestions(
    category: &str,
    average: f64,
    records: &[ResultRecord],
) -> Vec<&'static str> {
    match category {
        "performance" => {
            let mut suggestions = Vec::new();
            if average < POOR_SCORE {
                suggestions.push(CRITICAL_PERFORMANCE);
            }
            suggestions.extend_from_slice(PERFORMANCE_SUGGESTIONS);
            suggestions.extend(lab_suggestions(records));
            suggestions
        }
        "accessibility" => ACCESSIBILITY_SUGGESTIONS.to_vec(),
        "best-practices" => BEST_PRACTICES_SUGGESTIONS.to_vec(),
        "seo" => SEO_SUGGESTIONS.to_vec(),
        _ => Vec::new(),
    }
}

/// Lowest performance scores, listed only when the worst is below 50.
pub fn worst_routes(records: &[ResultRecord], limit: usize) -> Vec<&ResultRecord> {
    let mut scored: Vec<(&ResultRecord, u8)> = records
        .iter()
        .filter_map(|r| Some((r, r.scores.as_ref()?.performance?)))
        .collect();
    scored.sort_by_key(|(_, performance)| *performance);
    match scored.first() {
        Some((_, worst)) if f64::from(*worst) < POOR_SCORE => {
            scored.into_iter().take(limit).map(|(r, _)| r).collect()
        }
        _ => Vec::new(),
    }
}

/// Desktop minus mobile average performance, when the gap exceeds 15 points.
pub fn mobile_desktop_gap(averages: &StrategyAverages) -> Option<f64> {
    let gap = averages.desktop.performance? - averages.mobile.performance?;
    (gap > MOBILE_GAP_THRESHOLD).then_some(gap)
}

pub fn log_improvement_summary(records: &[ResultRecord], averages: &StrategyAverages) {
    let routes: HashSet<&str> = records.iter().map(|r| r.url.as_str()).collect();
    log::info!(
        "Improvement summary ({}): {} route(s), {} test(s)",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        routes.len(),
        records.len()
    );

    let weak = weak_areas(&averages.all);
    if weak.is_empty() {
        log::info!("   {}", "All categories score 90+.".green());
    }
    for (category, average) in weak {
        log::info!("   {} (avg {:.1}):", category_name(category).bold(), average);
        for suggestion in category_suggestions(category, average, records) {
            log::info!("      -> {}", suggestion);
        }
    }

    let worst = worst_routes(records, MAX_WORST_ROUTES);
    if !worst.is_empty() {
        log::info!("   Worst performing routes:");
        for record in worst {
            let performance = record
                .scores
                .as_ref()
                .and_then(|s| s.performance)
                .unwrap_or_default();
            log::info!(
                "      {} ({}): performance {}",
                record.url,
                record.strategy,
                performance.to_string().red()
            );
        }
    }

    if let Some(gap) = mobile_desktop_gap(averages) {
        log::info!(
            "   Desktop performance is {:.0} points higher than mobile; prioritise mobile: \
             reduce JS payload, size images for small screens, test on throttled connections.",
            gap
        );
    }
}
