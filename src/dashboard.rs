use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::pipeline::PredictionResult;
use crate::risk::RiskTier;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardStats {
    pub total_students: usize,
    pub new_this_month: usize,
    pub on_track: usize,
    pub at_risk: usize,
    pub needs_intervention: usize,
    pub on_track_percentage: f64,
    pub at_risk_percentage: f64,
    pub intervention_percentage: f64,
    pub recent_assessments: Vec<RecentAssessment>,
    pub monthly_trends: Vec<MonthlyTrend>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecentAssessment {
    pub student_name: Option<String>,
    pub grade_level: Option<String>,
    pub math_score: i64,
    pub reading_score: i64,
    pub risk_tier: RiskTier,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthlyTrend {
    /// `YYYY-MM`
    pub month: String,
    pub avg_math_score: f64,
    pub avg_reading_score: f64,
    pub assessments: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProbabilityPoint {
    pub timestamp: DateTime<Utc>,
    pub probability: f64,
    pub risk_tier: RiskTier,
}

fn percentage(count: usize, total: usize) -> f64 {
    if total > 0 {
        count as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

pub fn compute(records: &[PredictionResult], now: DateTime<Utc>) -> DashboardStats {
    let total_students = records.len();
    let month_ago = now - Duration::days(30);
    let new_this_month = records.iter().filter(|r| r.timestamp >= month_ago).count();

    let count = |tier: RiskTier| records.iter().filter(|r| r.risk_tier() == tier).count();
    let on_track = count(RiskTier::Low);
    let at_risk = count(RiskTier::Medium);
    let needs_intervention = count(RiskTier::High);

    let mut recent: Vec<&PredictionResult> = records.iter().collect();
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    let recent_assessments = recent
        .into_iter()
        .take(5)
        .map(|r| RecentAssessment {
            student_name: r.student_name.clone(),
            grade_level: r.grade_level.clone(),
            math_score: r.input.math_score,
            reading_score: r.input.reading_score,
            risk_tier: r.risk_tier(),
            timestamp: r.timestamp,
        })
        .collect();

    DashboardStats {
        total_students,
        new_this_month,
        on_track,
        at_risk,
        needs_intervention,
        on_track_percentage: percentage(on_track, total_students),
        at_risk_percentage: percentage(at_risk, total_students),
        intervention_percentage: percentage(needs_intervention, total_students),
        recent_assessments,
        monthly_trends: monthly_trends(records),
    }
}

fn monthly_trends(records: &[PredictionResult]) -> Vec<MonthlyTrend> {
    let mut months: BTreeMap<String, (f64, f64, usize)> = BTreeMap::new();
    for r in records {
        let entry = months
            .entry(r.timestamp.format("%Y-%m").to_string())
            .or_insert((0.0, 0.0, 0));
        entry.0 += r.input.math_score as f64;
        entry.1 += r.input.reading_score as f64;
        entry.2 += 1;
    }

    months
        .into_iter()
        .map(|(month, (math, reading, n))| MonthlyTrend {
            month,
            avg_math_score: math / n as f64,
            avg_reading_score: reading / n as f64,
            assessments: n,
        })
        .collect()
}

/// Saved probabilities for one student, oldest first.
pub fn student_history(records: &[PredictionResult], student_name: &str) -> Vec<ProbabilityPoint> {
    let mut points: Vec<ProbabilityPoint> = records
        .iter()
        .filter(|r| r.student_name.as_deref() == Some(student_name))
        .map(|r| ProbabilityPoint {
            timestamp: r.timestamp,
            probability: r.probability,
            risk_tier: r.risk_tier(),
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::StudentAssessmentInput;
    use chrono::TimeZone;

    fn record(name: &str, probability: f64, timestamp: DateTime<Utc>, math: i64) -> PredictionResult {
        PredictionResult {
            timestamp,
            student_name: Some(name.to_string()),
            grade_level: Some("Grade 4".to_string()),
            notes: None,
            prediction: u8::from(probability >= 0.5),
            probability,
            input: StudentAssessmentInput {
                math_score: math,
                reading_score: 70,
                writing_score: 70,
                attendance: 90.0,
                behavior: 3,
                literacy: 5,
            },
        }
    }

    #[test]
    fn empty_history_has_zero_percentages() {
        let stats = compute(&[], Utc::now());
        assert_eq!(stats.total_students, 0);
        assert_eq!(stats.on_track_percentage, 0.0);
        assert!(stats.recent_assessments.is_empty());
    }

    #[test]
    fn counts_tiers_from_probability() {
        let now = Utc.with_ymd_and_hms(2026, 3, 31, 12, 0, 0).unwrap();
        let old = Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap();
        let records = vec![
            record("Ayaan", 0.1, old, 80),
            record("Hodan", 0.5, now, 60),
            record("Ilhan", 0.9, now, 40),
            record("Ayaan", 0.2, now, 90),
        ];
        let stats = compute(&records, now);
        assert_eq!(stats.total_students, 4);
        assert_eq!(stats.new_this_month, 3);
        assert_eq!((stats.on_track, stats.at_risk, stats.needs_intervention), (2, 1, 1));
        assert!((stats.on_track_percentage - 50.0).abs() < 1e-9);
        assert_eq!(stats.recent_assessments.len(), 4);
        assert_eq!(stats.recent_assessments[3].timestamp, old);

        let months: Vec<&str> = stats.monthly_trends.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(months, vec!["2026-01", "2026-03"]);
        assert!((stats.monthly_trends[1].avg_math_score - 190.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn student_history_is_chronological() {
        let early = Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let records = vec![
            record("Ayaan", 0.8, late, 50),
            record("Hodan", 0.4, early, 60),
            record("Ayaan", 0.6, early, 55),
        ];
        let history = student_history(&records, "Ayaan");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].timestamp, early);
        assert_eq!(history[1].risk_tier, RiskTier::High);
    }
}
