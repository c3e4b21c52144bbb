//! Scan result reporting.
//!
//! Aggregates records into per-strategy averages, logs a human-readable
//! report and exports everything as CSV. The logged report has, in order:
//! scan counts, category averages, lab metrics per route, CrUX field data,
//! ranked opportunities and diagnostics, and an improvement summary.

mod csv;
mod recommendations;
mod suggestions;
mod tables;

use colored::Colorize;
use serde::Serialize;

use crate::config::CATEGORIES;
use crate::models::{ResultRecord, Strategy};
use crate::orchestrator::SkippedUrl;

pub use self::csv::export_csv;
pub use recommendations::{
    log_recommendations, rank_diagnostics, rank_opportunities, RankedOpportunity,
    MAX_RANKED_DIAGNOSTICS, MAX_RANKED_OPPORTUNITIES,
};
pub use suggestions::{
    category_name, category_suggestions, lab_suggestions, log_improvement_summary,
    mobile_desktop_gap, weak_areas, worst_routes,
};
pub use tables::{field_cells, has_field_data, lab_cells, log_field_data, log_lab_metrics};

/// Mean category scores, one decimal place; `None` when no record had the score.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AverageScores {
    pub performance: Option<f64>,
    pub accessibility: Option<f64>,
    pub best_practices: Option<f64>,
    pub seo: Option<f64>,
}

impl AverageScores {
    fn from_records<'a>(records: impl Iterator<Item = &'a ResultRecord> + Clone) -> Self {
        let mean = |category: &str| {
            let values: Vec<f64> = records
                .clone()
                .filter_map(|r| r.scores.as_ref()?.get(category))
                .map(f64::from)
                .collect();
            if values.is_empty() {
                return None;
            }
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            Some((mean * 10.0).round() / 10.0)
        };
        Self {
            performance: mean(CATEGORIES[0]),
            accessibility: mean(CATEGORIES[1]),
            best_practices: mean(CATEGORIES[2]),
            seo: mean(CATEGORIES[3]),
        }
    }

    /// Looks up an average by Lighthouse category id.
    pub fn get(&self, category: &str) -> Option<f64> {
        match category {
            "performance" => self.performance,
            "accessibility" => self.accessibility,
            "best-practices" => self.best_practices,
            "seo" => self.seo,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StrategyAverages {
    pub mobile: AverageScores,
    pub desktop: AverageScores,
    /// Mobile and desktop combined
    pub all: AverageScores,
}

pub fn compute_averages(records: &[ResultRecord]) -> StrategyAverages {
    let by_strategy = |strategy: Strategy| records.iter().filter(move |r| r.strategy == strategy);
    StrategyAverages {
        mobile: AverageScores::from_records(by_strategy(Strategy::Mobile)),
        desktop: AverageScores::from_records(by_strategy(Strategy::Desktop)),
        all: AverageScores::from_records(records.iter()),
    }
}

pub fn success_count(records: &[ResultRecord]) -> usize {
    records.iter().filter(|r| r.is_success()).count()
}

/// Lighthouse rating for a 0-100 score.
pub fn rating(score: f64) -> &'static str {
    if score >= 90.0 {
        "Good"
    } else if score >= 50.0 {
        "Needs Improvement"
    } else {
        "Poor"
    }
}

fn colored_rating(score: f64) -> String {
    let label = rating(score);
    if score >= 90.0 {
        label.green().to_string()
    } else if score >= 50.0 {
        label.yellow().to_string()
    } else {
        label.red().to_string()
    }
}

fn log_averages(label: &str, count: usize, averages: &AverageScores) {
    log::info!("{} averages ({} result(s)):", label, count);
    for category in CATEGORIES {
        match averages.get(category) {
            Some(score) => log::info!(
                "   {:<16} {:>5.1}  {}",
                category,
                score,
                colored_rating(score)
            ),
            None => log::info!("   {:<16} {:>5}", category, "N/A"),
        }
    }
}

/// Logs the end-of-scan summary.
pub fn log_summary(records: &[ResultRecord], averages: &StrategyAverages, skipped: &[SkippedUrl]) {
    let successful = success_count(records);
    log::info!(
        "Scan finished: {} result(s), {} successful, {} failed, {} skipped",
        records.len(),
        successful,
        records.len() - successful,
        skipped.len()
    );

    for strategy in [Strategy::Mobile, Strategy::Desktop] {
        let count = records.iter().filter(|r| r.strategy == strategy).count();
        if count == 0 {
            continue;
        }
        let averages = match strategy {
            Strategy::Mobile => &averages.mobile,
            Strategy::Desktop => &averages.desktop,
        };
        log_averages(&strategy.as_str().to_uppercase(), count, averages);
    }
    log_averages("OVERALL", records.len(), &averages.all);

    log_lab_metrics(records);
    log_field_data(records);
    log_recommendations(records);
    log_improvement_summary(records, averages);

    for record in records.iter().filter(|r| !r.is_success()) {
        log::warn!(
            "   {} ({}): {}",
            record.url,
            record.strategy,
            record.error.as_deref().unwrap_or_default()
        );
    }
    for skip in skipped {
        log::warn!("   skipped {}: {}", skip.url, skip.reason);
    }
}
