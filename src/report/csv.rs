//! CSV export.
//!
//! One row per record, flattened: scores, lab metrics, field data, the first
//! few opportunity titles and the error. Three average rows close the file.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use csv::Writer;

use super::{AverageScores, StrategyAverages};
use crate::config::CATEGORIES;
use crate::extract::{FIELD_METRICS, LAB_METRICS};
use crate::models::ResultRecord;

/// Opportunity titles included in the `top_opportunities` column.
const EXPORTED_OPPORTUNITIES: usize = 5;

fn header() -> Vec<String> {
    let mut columns = vec!["url".to_string(), "strategy".to_string()];
    columns.extend(CATEGORIES.iter().map(|c| c.to_string()));
    for (_, label) in LAB_METRICS {
        columns.push(format!("lab_{label}"));
        columns.push(format!("lab_{label}_score"));
    }
    columns.push("field_overall".to_string());
    for (_, label) in FIELD_METRICS {
        columns.push(format!("field_{label}_category"));
        columns.push(format!("field_{label}_percentile"));
    }
    columns.push("top_opportunities".to_string());
    columns.push("error".to_string());
    columns
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn record_row(record: &ResultRecord) -> Vec<String> {
    let mut row = vec![record.url.clone(), record.strategy.to_string()];

    row.extend(
        CATEGORIES
            .iter()
            .map(|c| opt(record.scores.as_ref().and_then(|s| s.get(c)))),
    );

    for (_, label) in LAB_METRICS {
        let metric = record.lab_metrics.as_ref().and_then(|m| m.get(*label));
        row.push(opt(metric.and_then(|m| m.display_value.clone())));
        row.push(opt(metric.and_then(|m| m.score)));
    }

    let field = record.field_data.as_ref();
    row.push(opt(field.and_then(|f| f.overall_category.clone())));
    for (_, label) in FIELD_METRICS {
        let metric = field.and_then(|f| f.metrics.get(*label));
        row.push(opt(metric.and_then(|m| m.category.clone())));
        row.push(opt(metric.and_then(|m| m.percentile)));
    }

    row.push(
        record
            .opportunities
            .iter()
            .take(EXPORTED_OPPORTUNITIES)
            .map(|o| o.title.as_str())
            .collect::<Vec<_>>()
            .join("; "),
    );
    row.push(record.error.clone().unwrap_or_default());
    row
}

fn average_row(label: &str, strategy: &str, averages: &AverageScores, width: usize) -> Vec<String> {
    let mut row = vec![label.to_string(), strategy.to_string()];
    row.extend(CATEGORIES.iter().map(|c| opt(averages.get(c))));
    row.resize(width, String::new());
    row
}

/// Writes records and average rows to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn export_csv(
    records: &[ResultRecord],
    averages: &StrategyAverages,
    path: &Path,
) -> Result<usize> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    let mut writer = Writer::from_writer(file);

    let header = header();
    let width = header.len();
    writer.write_record(&header)?;

    for record in records {
        writer.write_record(record_row(record))?;
    }

    writer.write_record(average_row("AVERAGE_MOBILE", "mobile", &averages.mobile, width))?;
    writer.write_record(average_row("AVERAGE_DESKTOP", "desktop", &averages.desktop, width))?;
    writer.write_record(average_row("AVERAGE_OVERALL", "all", &averages.all, width))?;

    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;

    log::info!("Exported {} result(s) to {}", records.len(), path.display());
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CategoryScores, FieldData, FieldMetric, LabMetric, Opportunity, Strategy,
    };
    use crate::report::compute_averages;
    use std::collections::BTreeMap;

    fn full_record() -> ResultRecord {
        let mut lab = BTreeMap::new();
        lab.insert(
            "LCP".to_string(),
            LabMetric {
                display_value: Some("3.1 s".to_string()),
                raw_value: Some(3100.0),
                score: Some(40),
            },
        );
        let mut field_metrics = BTreeMap::new();
        field_metrics.insert(
            "CLS".to_string(),
            FieldMetric {
                display_value: Some("0.05".to_string()),
                percentile: Some(0.05),
                category: Some("FAST".to_string()),
            },
        );
        ResultRecord {
            url: "https://a.test/".to_string(),
            strategy: Strategy::Mobile,
            scores: Some(CategoryScores {
                performance: Some(47),
                accessibility: Some(92),
                best_practices: Some(100),
                seo: None,
            }),
            lab_metrics: Some(lab),
            field_data: Some(FieldData {
                overall_category: Some("AVERAGE".to_string()),
                metrics: field_metrics,
            }),
            opportunities: (0..7)
                .map(|i| Opportunity {
                    title: format!("Opp {i}"),
                    estimated_savings_ms: None,
                })
                .collect(),
            diagnostics: Vec::new(),
            error: None,
        }
    }

    #[test]
    fn test_header_layout() {
        let header = header();
        assert_eq!(
            &header[..6],
            &["url", "strategy", "performance", "accessibility", "best-practices", "seo"]
        );
        assert!(header.contains(&"lab_Speed Index_score".to_string()));
        assert!(header.contains(&"field_INP_percentile".to_string()));
        assert_eq!(header.last().map(String::as_str), Some("error"));
        // 2 + 4 + 6*2 + 1 + 6*2 + 2
        assert_eq!(header.len(), 33);
    }

    #[test]
    fn test_export_rows_and_averages() {
        let records = vec![
            full_record(),
            ResultRecord::failed("https://b.test/", Strategy::Desktop, "HTTP 404: Not Found"),
        ];
        let averages = compute_averages(&records);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");

        let written = export_csv(&records, &averages, &path).unwrap();
        assert_eq!(written, 2);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 5);

        let column = |name: &str| headers.iter().position(|h| h == name).unwrap();
        let first = &rows[0];
        assert_eq!(&first[column("performance")], "47");
        assert_eq!(&first[column("seo")], "");
        assert_eq!(&first[column("lab_LCP")], "3.1 s");
        assert_eq!(&first[column("lab_LCP_score")], "40");
        assert_eq!(&first[column("lab_FCP")], "");
        assert_eq!(&first[column("field_overall")], "AVERAGE");
        assert_eq!(&first[column("field_CLS_category")], "FAST");
        assert_eq!(&first[column("field_CLS_percentile")], "0.05");
        assert_eq!(
            &first[column("top_opportunities")],
            "Opp 0; Opp 1; Opp 2; Opp 3; Opp 4"
        );

        assert_eq!(&rows[1][column("error")], "HTTP 404: Not Found");
        assert_eq!(&rows[1][column("performance")], "");

        assert_eq!(&rows[2][0], "AVERAGE_MOBILE");
        assert_eq!(&rows[2][column("performance")], "47");
        assert_eq!(&rows[3][0], "AVERAGE_DESKTOP");
        assert_eq!(&rows[3][column("performance")], "");
        assert_eq!(&rows[4][0], "AVERAGE_OVERALL");
        assert_eq!(&rows[4][column("accessibility")], "92");
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("results.csv");
        let result = export_csv(&[], &StrategyAverages::default(), &path);
        assert!(result.is_err());
    }
}
