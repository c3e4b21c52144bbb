//! Typed view over the PageSpeed Insights response.
//!
//! Each section is deserialized on its own from the raw JSON, so one malformed
//! audit or category only drops that entry instead of the whole payload.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Category {
    /// 0.0 - 1.0
    pub score: Option<f64>,
    pub audit_refs: Vec<AuditRef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuditRef {
    pub id: String,
    pub group: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Audit {
    pub title: Option<String>,
    pub score: Option<f64>,
    pub display_value: Option<String>,
    pub numeric_value: Option<f64>,
    pub details: Option<AuditDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuditDetails {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub overall_savings_ms: Option<f64>,
}

/// One CrUX metric at the 75th percentile.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CruxMetric {
    pub percentile: Option<f64>,
    pub category: Option<String>,
}

#[derive(Debug, Default)]
pub struct LoadingExperience {
    pub overall_category: Option<String>,
    pub metrics: BTreeMap<String, CruxMetric>,
}

/// The parts of a PageSpeed Insights response the extractor reads.
#[derive(Debug, Default)]
pub struct PageSpeedPayload {
    pub categories: BTreeMap<String, Category>,
    pub audits: BTreeMap<String, Audit>,
    pub loading_experience: Option<LoadingExperience>,
}

/// Deserializes every entry of a JSON object, skipping entries that don't fit `T`.
fn typed_entries<T>(object: Option<&Value>) -> BTreeMap<String, T>
where
    T: for<'de> Deserialize<'de>,
{
    object
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(key, value)| {
                    T::deserialize(value)
                        .map_err(|e| log::debug!("Ignoring malformed entry '{}': {}", key, e))
                        .ok()
                        .map(|typed| (key.clone(), typed))
                })
                .collect()
        })
        .unwrap_or_default()
}

impl PageSpeedPayload {
    pub fn from_value(value: &Value) -> Self {
        let lighthouse = value.get("lighthouseResult");
        let categories = typed_entries(lighthouse.and_then(|l| l.get("categories")));
        let audits = typed_entries(lighthouse.and_then(|l| l.get("audits")));

        let loading_experience = value
            .get("loadingExperience")
            .filter(|v| v.is_object())
            .map(|le| LoadingExperience {
                overall_category: le
                    .get("overall_category")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                metrics: typed_entries(le.get("metrics")),
            });

        Self {
            categories,
            audits,
            loading_experience,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_value_gives_empty_payload() {
        let payload = PageSpeedPayload::from_value(&Value::Null);
        assert!(payload.categories.is_empty());
        assert!(payload.audits.is_empty());
        assert!(payload.loading_experience.is_none());
    }

    #[test]
    fn test_malformed_audit_is_dropped_alone() {
        let value = json!({
            "lighthouseResult": {
                "audits": {
                    "good": { "title": "Good", "score": 0.5 },
                    "bad": { "title": 42, "score": "high" }
                }
            }
        });
        let payload = PageSpeedPayload::from_value(&value);
        assert_eq!(payload.audits.len(), 1);
        assert_eq!(payload.audits["good"].title.as_deref(), Some("Good"));
    }

    #[test]
    fn test_null_scores_are_absent() {
        let value = json!({
            "lighthouseResult": { "categories": { "seo": { "score": null } } }
        });
        let payload = PageSpeedPayload::from_value(&value);
        assert_eq!(payload.categories["seo"].score, None);
    }

    #[test]
    fn test_loading_experience_fields() {
        let value = json!({
            "loadingExperience": {
                "overall_category": "FAST",
                "metrics": { "FIRST_CONTENTFUL_PAINT_MS": { "percentile": 900, "category": "FAST" } }
            }
        });
        let payload = PageSpeedPayload::from_value(&value);
        let le = payload.loading_experience.unwrap();
        assert_eq!(le.overall_category.as_deref(), Some("FAST"));
        assert_eq!(le.metrics["FIRST_CONTENTFUL_PAINT_MS"].percentile, Some(900.0));
    }
}
