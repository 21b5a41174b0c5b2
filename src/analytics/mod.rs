use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use crate::lesson::report::{sort_newest_first, Report};

/// Headline numbers for the instructor dashboard
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsPayload {
    pub total: usize,
    pub avg_score: f64,
    /// Mean star rating
    pub avg_satisfaction: f64,
    /// How many reports tested each material
    pub material_counts: BTreeMap<String, usize>,
}

pub fn compute_analytics(reports: &[Report]) -> AnalyticsPayload {
    let total = reports.len();
    let mut material_counts: BTreeMap<String, usize> = BTreeMap::new();
    for report in reports {
        for material in &report.materials_tested {
            *material_counts.entry(material.clone()).or_insert(0) += 1;
        }
    }

    if total == 0 {
        return AnalyticsPayload {
            total,
            avg_score: 0.0,
            avg_satisfaction: 0.0,
            material_counts,
        };
    }

    let score_sum: f64 = reports.iter().map(|r| r.score as f64).sum();
    let rating_sum: f64 = reports.iter().map(|r| r.star_rating as f64).sum();

    AnalyticsPayload {
        total,
        avg_score: score_sum / total as f64,
        avg_satisfaction: rating_sum / total as f64,
        material_counts,
    }
}

/// Name matches ignore case; student ids match as typed
pub fn matches_search(report: &Report, term: &str) -> bool {
    report.user_name.to_lowercase().contains(&term.to_lowercase()) || report.student_id.contains(term)
}

/// Reports matching the search term, newest first. An empty term keeps everything.
pub fn filter_reports(reports: &[Report], term: &str) -> Vec<Report> {
    let mut matching: Vec<Report> = reports
        .iter()
        .filter(|r| matches_search(r, term))
        .cloned()
        .collect();
    sort_newest_first(&mut matching);
    matching
}
