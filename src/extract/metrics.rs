//! Lab (Lighthouse) and field (CrUX) metric extraction.

use std::collections::BTreeMap;

use super::payload::PageSpeedPayload;
use super::to_percent;
use crate::models::{FieldData, FieldMetric, LabMetric, LabMetrics};

/// Lighthouse audit id -> report label.
pub const LAB_METRICS: &[(&str, &str)] = &[
    ("first-contentful-paint", "FCP"),
    ("largest-contentful-paint", "LCP"),
    ("cumulative-layout-shift", "CLS"),
    ("total-blocking-time", "TBT"),
    ("speed-index", "Speed Index"),
    ("interactive", "TTI"),
];

/// CrUX metric key -> report label.
pub const FIELD_METRICS: &[(&str, &str)] = &[
    ("FIRST_CONTENTFUL_PAINT_MS", "FCP"),
    ("LARGEST_CONTENTFUL_PAINT_MS", "LCP"),
    ("CUMULATIVE_LAYOUT_SHIFT_SCORE", "CLS"),
    ("INTERACTION_TO_NEXT_PAINT", "INP"),
    ("EXPERIMENTAL_TIME_TO_FIRST_BYTE", "TTFB"),
    ("FIRST_INPUT_DELAY_MS", "FID"),
];

/// Formats milliseconds the way Lighthouse does: "850 ms", "1.2 s".
pub fn format_ms(value: f64) -> String {
    if value >= 1000.0 {
        format!("{:.1} s", value / 1000.0)
    } else {
        format!("{:.0} ms", value)
    }
}

pub fn extract_lab_metrics(payload: &PageSpeedPayload) -> Option<LabMetrics> {
    let metrics: LabMetrics = LAB_METRICS
        .iter()
        .filter_map(|(audit_id, label)| {
            let audit = payload.audits.get(*audit_id)?;
            let metric = LabMetric {
                display_value: audit.display_value.clone(),
                raw_value: audit.numeric_value,
                score: audit.score.map(to_percent),
            };
            if metric.display_value.is_none() && metric.raw_value.is_none() && metric.score.is_none()
            {
                return None;
            }
            Some((label.to_string(), metric))
        })
        .collect();

    (!metrics.is_empty()).then_some(metrics)
}

pub fn extract_field_data(payload: &PageSpeedPayload) -> Option<FieldData> {
    let experience = payload.loading_experience.as_ref()?;

    let metrics: BTreeMap<String, FieldMetric> = FIELD_METRICS
        .iter()
        .filter_map(|(key, label)| {
            let crux = experience.metrics.get(*key)?;
            // CrUX reports CLS multiplied by 100
            let percentile = if *label == "CLS" {
                crux.percentile.map(|p| p / 100.0)
            } else {
                crux.percentile
            };
            let display_value = percentile.map(|p| {
                if *label == "CLS" {
                    format!("{:.2}", p)
                } else {
                    format_ms(p)
                }
            });
            Some((
                label.to_string(),
                FieldMetric {
                    display_value,
                    percentile,
                    category: crux.category.clone(),
                },
            ))
        })
        .collect();

    if experience.overall_category.is_none() && metrics.is_empty() {
        return None;
    }

    Some(FieldData {
        overall_category: experience.overall_category.clone(),
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_ms() {
        assert_eq!(format_ms(850.0), "850 ms");
        assert_eq!(format_ms(1200.0), "1.2 s");
        assert_eq!(format_ms(0.0), "0 ms");
    }

    #[test]
    fn test_missing_audits_are_absent_keys() {
        let payload = PageSpeedPayload::from_value(&json!({
            "lighthouseResult": { "audits": {
                "speed-index": { "displayValue": "3.0 s", "numericValue": 3000, "score": 0.8 }
            } }
        }));
        let lab = extract_lab_metrics(&payload).unwrap();
        assert_eq!(lab.len(), 1);
        assert_eq!(
            lab["Speed Index"],
            LabMetric {
                display_value: Some("3.0 s".to_string()),
                raw_value: Some(3000.0),
                score: Some(80),
            }
        );
        assert!(!lab.contains_key("TTI"));
    }

    #[test]
    fn test_no_lab_audits_is_none() {
        let payload = PageSpeedPayload::from_value(&json!({ "lighthouseResult": {} }));
        assert!(extract_lab_metrics(&payload).is_none());
    }

    #[test]
    fn test_field_cls_is_rescaled() {
        let payload = PageSpeedPayload::from_value(&json!({
            "loadingExperience": { "metrics": {
                "CUMULATIVE_LAYOUT_SHIFT_SCORE": { "percentile": 12, "category": "AVERAGE" },
                "FIRST_CONTENTFUL_PAINT_MS": { "percentile": 900, "category": "FAST" }
            } }
        }));
        let field = extract_field_data(&payload).unwrap();
        assert_eq!(field.overall_category, None);
        let cls = &field.metrics["CLS"];
        assert_eq!(cls.percentile, Some(0.12));
        assert_eq!(cls.display_value.as_deref(), Some("0.12"));
        assert_eq!(field.metrics["FCP"].display_value.as_deref(), Some("900 ms"));
    }

    #[test]
    fn test_empty_loading_experience_is_none() {
        let payload = PageSpeedPayload::from_value(&json!({
            "loadingExperience": { "id": "https://a.test/", "initial_url": "https://a.test/" }
        }));
        assert!(extract_field_data(&payload).is_none());
    }
}
