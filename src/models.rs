//! Scan data model.
//!
//! A [`Job`] is one (URL, strategy) pair; every job yields exactly one
//! [`ResultRecord`], successful or not. Optional fields mean "not available",
//! never a sentinel number.

use std::collections::BTreeMap;
use std::fmt;

use clap::ValueEnum;
use serde::Serialize;
use strum_macros::EnumIter;

/// Device profile used by PageSpeed Insights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ValueEnum, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Emulated mid-range mobile device on a throttled connection
    Mobile,
    /// Desktop device on a wired connection
    Desktop,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Mobile => "mobile",
            Strategy::Desktop => "desktop",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of work for the orchestrator.
///
/// `sequence_index` is the job's slot in the output; it has no other meaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub url: String,
    pub strategy: Strategy,
    pub sequence_index: usize,
}

/// Lighthouse category scores on a 0-100 scale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryScores {
    pub performance: Option<u8>,
    pub accessibility: Option<u8>,
    pub best_practices: Option<u8>,
    pub seo: Option<u8>,
}

impl CategoryScores {
    /// Looks up a score by its Lighthouse category id (`best-practices`, ...).
    pub fn get(&self, category: &str) -> Option<u8> {
        match category {
            "performance" => self.performance,
            "accessibility" => self.accessibility,
            "best-practices" => self.best_practices,
            "seo" => self.seo,
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.performance.is_none()
            && self.accessibility.is_none()
            && self.best_practices.is_none()
            && self.seo.is_none()
    }
}

/// A single lab (Lighthouse) measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabMetric {
    pub display_value: Option<String>,
    pub raw_value: Option<f64>,
    /// Audit score on a 0-100 scale
    pub score: Option<u8>,
}

/// Lab metrics keyed by short label (`FCP`, `LCP`, `CLS`, `TBT`, `Speed Index`, `TTI`).
pub type LabMetrics = BTreeMap<String, LabMetric>;

/// A single field (CrUX) measurement at the 75th percentile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMetric {
    pub display_value: Option<String>,
    pub percentile: Option<f64>,
    /// CrUX bucket: `FAST`, `AVERAGE` or `SLOW`
    pub category: Option<String>,
}

/// Real-user data for a URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldData {
    pub overall_category: Option<String>,
    pub metrics: BTreeMap<String, FieldMetric>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    pub title: String,
    pub estimated_savings_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub title: String,
    pub display_value: Option<String>,
}

/// Outcome of one job, handed to the reporter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub url: String,
    pub strategy: Strategy,
    pub scores: Option<CategoryScores>,
    pub lab_metrics: Option<LabMetrics>,
    pub field_data: Option<FieldData>,
    pub opportunities: Vec<Opportunity>,
    pub diagnostics: Vec<Diagnostic>,
    pub error: Option<String>,
}

impl ResultRecord {
    /// Creates a record with no data and the given error message.
    pub fn failed(url: impl Into<String>, strategy: Strategy, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            strategy,
            scores: None,
            lab_metrics: None,
            field_data: None,
            opportunities: Vec::new(),
            diagnostics: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
