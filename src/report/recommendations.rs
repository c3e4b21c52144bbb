//! Opportunities and diagnostics aggregated across every scanned route.

use colored::Colorize;

use crate::extract::format_ms;
use crate::models::ResultRecord;

/// Opportunities listed in the report.
pub const MAX_RANKED_OPPORTUNITIES: usize = 15;
/// Diagnostics listed in the report.
pub const MAX_RANKED_DIAGNOSTICS: usize = 10;

/// One opportunity title aggregated over all records.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedOpportunity {
    pub title: String,
    /// Number of (URL, strategy) results that reported it
    pub affected: usize,
    /// Mean estimated savings; occurrences without an estimate count as zero.
    /// `None` when that mean is not positive.
    pub average_savings_ms: Option<f64>,
}

/// Counts titles, keeping first-seen order so ties rank by first appearance.
fn count_titles<'a>(titles: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for title in titles {
        match counts.iter_mut().find(|(seen, _)| *seen == title) {
            Some((_, count)) => *count += 1,
            None => counts.push((title, 1)),
        }
    }
    // stable: equal counts keep first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Opportunities ranked by how many results reported them, most common first.
pub fn rank_opportunities(records: &[ResultRecord], limit: usize) -> Vec<RankedOpportunity> {
    let opportunities: Vec<_> = records.iter().flat_map(|r| &r.opportunities).collect();
    count_titles(opportunities.iter().map(|o| o.title.as_str()))
        .into_iter()
        .take(limit)
        .map(|(title, affected)| {
            let total: f64 = opportunities
                .iter()
                .filter(|o| o.title == title)
                .map(|o| o.estimated_savings_ms.unwrap_or(0.0))
                .sum();
            let average = total / affected as f64;
            RankedOpportunity {
                title: title.to_string(),
                affected,
                average_savings_ms: (average > 0.0).then_some(average),
            }
        })
        .collect()
}

/// Diagnostic titles ranked by how many results reported them.
pub fn rank_diagnostics(records: &[ResultRecord], limit: usize) -> Vec<(String, usize)> {
    count_titles(
        records
            .iter()
            .flat_map(|r| &r.diagnostics)
            .map(|d| d.title.as_str()),
    )
    .into_iter()
    .take(limit)
    .map(|(title, count)| (title.to_string(), count))
    .collect()
}

pub fn log_recommendations(records: &[ResultRecord]) {
    let opportunities = rank_opportunities(records, MAX_RANKED_OPPORTUNITIES);
    if opportunities.is_empty() {
        log::info!("{}", "No failing opportunities.".green());
    } else {
        log::info!("Top opportunities (affected routes, average savings):");
        for (rank, opportunity) in opportunities.iter().enumerate() {
            let savings = opportunity
                .average_savings_ms
                .map(format_ms)
                .unwrap_or_else(|| "-".to_string());
            log::info!(
                "   {:>2}. {} ({}, {})",
                rank + 1,
                opportunity.title,
                opportunity.affected,
                savings.yellow()
            );
        }
    }

    let diagnostics = rank_diagnostics(records, MAX_RANKED_DIAGNOSTICS);
    if !diagnostics.is_empty() {
        log::info!("Diagnostics (affected routes):");
        for (rank, (title, count)) in diagnostics.iter().enumerate() {
            log::info!("   {:>2}. {} ({})", rank + 1, title, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Diagnostic, Opportunity, Strategy};

    fn record(opportunities: &[(&str, Option<f64>)], diagnostics: &[&str]) -> ResultRecord {
        let mut record = ResultRecord::failed("https://a.test/", Strategy::Mobile, "");
        record.error = None;
        record.opportunities = opportunities
            .iter()
            .map(|(title, savings)| Opportunity {
                title: title.to_string(),
                estimated_savings_ms: *savings,
            })
            .collect();
        record.diagnostics = diagnostics
            .iter()
            .map(|title| Diagnostic {
                title: title.to_string(),
                display_value: None,
            })
            .collect();
        record
    }

    #[test]
    fn test_rank_opportunities_counts_and_averages() {
        let records = vec![
            record(
                &[("Reduce unused CSS", Some(300.0)), ("Minify JavaScript", None)],
                &[],
            ),
            record(&[("Reduce unused CSS", None)], &[]),
            record(&[("Reduce unused CSS", Some(150.0))], &[]),
        ];
        let ranked = rank_opportunities(&records, 15);
        assert_eq!(
            ranked,
            vec![
                RankedOpportunity {
                    title: "Reduce unused CSS".to_string(),
                    affected: 3,
                    average_savings_ms: Some(150.0),
                },
                RankedOpportunity {
                    title: "Minify JavaScript".to_string(),
                    affected: 1,
                    average_savings_ms: None,
                },
            ]
        );
    }

    #[test]
    fn test_ties_keep_first_seen_order_and_limit_applies() {
        let records = vec![
            record(&[("B", Some(1.0)), ("A", Some(1.0)), ("C", Some(1.0))], &[]),
        ];
        let titles: Vec<String> = rank_opportunities(&records, 2)
            .into_iter()
            .map(|o| o.title)
            .collect();
        assert_eq!(titles, vec!["B", "A"]);
    }

    #[test]
    fn test_rank_diagnostics_by_affected_routes() {
        let records = vec![
            record(&[], &["Avoid an excessive DOM size", "Minimize main-thread work"]),
            record(&[], &["Minimize main-thread work"]),
        ];
        assert_eq!(
            rank_diagnostics(&records, 10),
            vec![
                ("Minimize main-thread work".to_string(), 2),
                ("Avoid an excessive DOM size".to_string(), 1),
            ]
        );
        assert!(rank_diagnostics(&records, 0).is_empty());
    }
}
