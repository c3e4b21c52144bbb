//! Opportunity and diagnostic extraction.

use std::cmp::Ordering;

use super::payload::{Audit, PageSpeedPayload};
use crate::config::{AUDIT_PASS_THRESHOLD, MAX_DIAGNOSTICS, MAX_OPPORTUNITIES};
use crate::models::{Diagnostic, Opportunity};

fn is_failing(audit: &Audit) -> bool {
    audit.score.is_some_and(|score| score < AUDIT_PASS_THRESHOLD)
}

fn title_of(id: &str, audit: &Audit) -> String {
    audit.title.clone().unwrap_or_else(|| id.to_string())
}

/// Descending by savings; audits without a savings estimate rank last.
fn by_savings_desc(a: &Opportunity, b: &Opportunity) -> Ordering {
    match (a.estimated_savings_ms, b.estimated_savings_ms) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Failing opportunity audits, largest estimated savings first, top 10.
pub fn extract_opportunities(payload: &PageSpeedPayload) -> Vec<Opportunity> {
    // audits iterate in id order, and the sort is stable, so ties stay by id
    let mut opportunities: Vec<Opportunity> = payload
        .audits
        .iter()
        .filter(|(_, audit)| {
            audit
                .details
                .as_ref()
                .and_then(|d| d.kind.as_deref())
                == Some("opportunity")
                && is_failing(audit)
        })
        .map(|(id, audit)| Opportunity {
            title: title_of(id, audit),
            estimated_savings_ms: audit.details.as_ref().and_then(|d| d.overall_savings_ms),
        })
        .collect();

    opportunities.sort_by(by_savings_desc);
    opportunities.truncate(MAX_OPPORTUNITIES);
    opportunities
}

/// Failing diagnostics in the order the performance category lists them, first 5.
pub fn extract_diagnostics(payload: &PageSpeedPayload) -> Vec<Diagnostic> {
    let Some(performance) = payload.categories.get("performance") else {
        return Vec::new();
    };

    performance
        .audit_refs
        .iter()
        .filter(|r| r.group.as_deref() == Some("diagnostics"))
        .filter_map(|r| {
            let audit = payload.audits.get(&r.id)?;
            is_failing(audit).then(|| Diagnostic {
                title: title_of(&r.id, audit),
                display_value: audit.display_value.clone(),
            })
        })
        .take(MAX_DIAGNOSTICS)
        .collect()
}
