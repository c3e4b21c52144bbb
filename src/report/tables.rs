//! Per-route lab metric and field data sections of the scan report.

use colored::{ColoredString, Colorize};

use crate::extract::{FIELD_METRICS, LAB_METRICS};
use crate::models::ResultRecord;

const NOT_AVAILABLE: &str = "N/A";

/// Colors a 0-100 audit score the way Lighthouse does.
fn by_score(text: &str, score: Option<u8>) -> ColoredString {
    match score {
        Some(s) if s >= 90 => text.green(),
        Some(s) if s >= 50 => text.yellow(),
        Some(_) => text.red(),
        None => text.dimmed(),
    }
}

/// Colors a CrUX bucket (`FAST`, `AVERAGE`, `SLOW`).
fn by_field_category(text: &str, category: Option<&str>) -> ColoredString {
    match category {
        Some("FAST") => text.green(),
        Some("AVERAGE") => text.yellow(),
        Some(_) => text.red(),
        None => text.dimmed(),
    }
}

/// Lab metric cells in `LAB_METRICS` order, with the audit score of each.
pub fn lab_cells(record: &ResultRecord) -> Vec<(String, Option<u8>)> {
    LAB_METRICS
        .iter()
        .map(|(_, label)| {
            let metric = record.lab_metrics.as_ref().and_then(|lab| lab.get(*label));
            match metric.and_then(|m| m.display_value.clone()) {
                Some(display) => (display, metric.and_then(|m| m.score)),
                None => (NOT_AVAILABLE.to_string(), None),
            }
        })
        .collect()
}

/// Field metric cells in `FIELD_METRICS` order, as `"<value> (<CATEGORY>)"`.
///
/// A metric needs both a percentile and a category to be shown.
pub fn field_cells(record: &ResultRecord) -> Vec<(String, Option<String>)> {
    FIELD_METRICS
        .iter()
        .map(|(_, label)| {
            let metric = record
                .field_data
                .as_ref()
                .and_then(|field| field.metrics.get(*label))
                .filter(|m| m.percentile.is_some());
            match metric.and_then(|m| Some((m.display_value.as_deref()?, m.category.as_deref()?))) {
                Some((display, category)) => {
                    (format!("{display} ({category})"), Some(category.to_string()))
                }
                None => (NOT_AVAILABLE.to_string(), None),
            }
        })
        .collect()
}

/// Whether any record carries an overall CrUX category.
pub fn has_field_data(records: &[ResultRecord]) -> bool {
    records.iter().any(|r| {
        r.field_data
            .as_ref()
            .is_some_and(|f| f.overall_category.is_some())
    })
}

fn header(labels: impl Iterator<Item = &'static str>) -> String {
    labels.collect::<Vec<_>>().join(" | ")
}

pub fn log_lab_metrics(records: &[ResultRecord]) {
    log::info!("Core Web Vitals (lab data):");
    log::info!(
        "   url | strategy | {}",
        header(LAB_METRICS.iter().map(|(_, label)| *label))
    );
    for record in records {
        let cells: Vec<String> = lab_cells(record)
            .iter()
            .map(|(text, score)| by_score(text, *score).to_string())
            .collect();
        log::info!(
            "   {} | {} | {}",
            record.url.cyan(),
            record.strategy,
            cells.join(" | ")
        );
    }
}

pub fn log_field_data(records: &[ResultRecord]) {
    log::info!("Field data (Chrome User Experience Report):");
    if !has_field_data(records) {
        log::info!(
            "   No field data available for the scanned URLs; it needs enough real-user Chrome traffic."
        );
        return;
    }

    log::info!(
        "   url | strategy | overall | {}",
        header(FIELD_METRICS.iter().map(|(_, label)| *label))
    );
    for record in records {
        let overall = record
            .field_data
            .as_ref()
            .and_then(|f| f.overall_category.as_deref());
        let cells: Vec<String> = field_cells(record)
            .iter()
            .map(|(text, category)| by_field_category(text, category.as_deref()).to_string())
            .collect();
        log::info!(
            "   {} | {} | {} | {}",
            record.url.cyan(),
            record.strategy,
            by_field_category(overall.unwrap_or(NOT_AVAILABLE), overall),
            cells.join(" | ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldData, FieldMetric, LabMetric, LabMetrics, Strategy};
    use std::collections::BTreeMap;

    fn record() -> ResultRecord {
        ResultRecord::failed("https://a.test/", Strategy::Mobile, "x")
    }

    #[test]
    fn test_lab_cells_follow_label_order() {
        let mut lab = LabMetrics::new();
        lab.insert(
            "LCP".to_string(),
            LabMetric {
                display_value: Some("4.1 s".to_string()),
                raw_value: Some(4100.0),
                score: Some(21),
            },
        );
        lab.insert(
            "CLS".to_string(),
            LabMetric {
                display_value: None,
                raw_value: Some(0.01),
                score: Some(100),
            },
        );
        let mut record = record();
        record.lab_metrics = Some(lab);

        let cells = lab_cells(&record);
        assert_eq!(cells.len(), LAB_METRICS.len());
        assert_eq!(cells[0], ("N/A".to_string(), None));
        assert_eq!(cells[1], ("4.1 s".to_string(), Some(21)));
        // no display value, nothing to show
        assert_eq!(cells[2], ("N/A".to_string(), None));
    }

    #[test]
    fn test_field_cells_need_percentile_and_category() {
        let mut metrics = BTreeMap::new();
        metrics.insert(
            "LCP".to_string(),
            FieldMetric {
                display_value: Some("2.6 s".to_string()),
                percentile: Some(2600.0),
                category: Some("AVERAGE".to_string()),
            },
        );
        metrics.insert(
            "INP".to_string(),
            FieldMetric {
                display_value: Some("180 ms".to_string()),
                percentile: Some(180.0),
                category: None,
            },
        );
        let mut record = record();
        record.field_data = Some(FieldData {
            overall_category: Some("AVERAGE".to_string()),
            metrics,
        });

        let cells = field_cells(&record);
        assert_eq!(
            cells[1],
            ("2.6 s (AVERAGE)".to_string(), Some("AVERAGE".to_string()))
        );
        assert_eq!(cells[3], ("N/A".to_string(), None));
        assert!(has_field_data(std::slice::from_ref(&record)));
    }

    #[test]
    fn test_has_field_data_requires_overall_category() {
        let mut record = record();
        assert!(!has_field_data(std::slice::from_ref(&record)));
        record.field_data = Some(FieldData::default());
        assert!(!has_field_data(&[record]));
    }
}
