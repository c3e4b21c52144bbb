//! Response extraction.
//!
//! Turns a successful PageSpeed Insights payload into a [`ResultRecord`].
//! Extraction never fails: any missing or malformed section becomes an absent
//! field on the record.

mod audits;
mod metrics;
mod payload;

use serde_json::Value;

use crate::config::CATEGORIES;
use crate::models::{CategoryScores, ResultRecord, Strategy};

pub use audits::{extract_diagnostics, extract_opportunities};
pub use metrics::{extract_field_data, extract_lab_metrics, format_ms, FIELD_METRICS, LAB_METRICS};
pub use payload::PageSpeedPayload;

/// Converts a 0.0-1.0 Lighthouse score to 0-100.
pub(crate) fn to_percent(score: f64) -> u8 {
    (score * 100.0).round().clamp(0.0, 100.0) as u8
}

pub fn extract_scores(payload: &PageSpeedPayload) -> Option<CategoryScores> {
    let score = |id: &str| {
        payload
            .categories
            .get(id)
            .and_then(|c| c.score)
            .map(to_percent)
    };
    let scores = CategoryScores {
        performance: score(CATEGORIES[0]),
        accessibility: score(CATEGORIES[1]),
        best_practices: score(CATEGORIES[2]),
        seo: score(CATEGORIES[3]),
    };
    (!scores.is_empty()).then_some(scores)
}

/// Builds the record for one successful job.
pub fn extract_result(url: &str, strategy: Strategy, raw: &Value) -> ResultRecord {
    let payload = PageSpeedPayload::from_value(raw);
    ResultRecord {
        url: url.to_string(),
        strategy,
        scores: extract_scores(&payload),
        lab_metrics: extract_lab_metrics(&payload),
        field_data: extract_field_data(&payload),
        opportunities: extract_opportunities(&payload),
        diagnostics: extract_diagnostics(&payload),
        error: None,
    }
}
