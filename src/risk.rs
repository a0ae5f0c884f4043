use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::i18n::{text, Language, TextKey};

pub const MEDIUM_RISK_THRESHOLD: f64 = 0.30;
pub const HIGH_RISK_THRESHOLD: f64 = 0.70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [RiskTier::Low, RiskTier::Medium, RiskTier::High];

    /// Label used in exported files, independent of UI language.
    pub fn label(self) -> &'static str {
        self.localized(Language::English)
    }

    pub fn localized(self, language: Language) -> &'static str {
        let key = match self {
            RiskTier::Low => TextKey::LowRisk,
            RiskTier::Medium => TextKey::MediumRisk,
            RiskTier::High => TextKey::HighRisk,
        };
        text(key, language)
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown risk tier '{0}' (expected low, medium or high)")]
pub struct UnknownTier(pub String);

impl FromStr for RiskTier {
    type Err = UnknownTier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let name = normalized
            .strip_suffix(" risk")
            .or_else(|| normalized.strip_suffix("_risk"))
            .unwrap_or(normalized.as_str());
        match name {
            "low" => Ok(RiskTier::Low),
            "medium" => Ok(RiskTier::Medium),
            "high" => Ok(RiskTier::High),
            _ => Err(UnknownTier(s.to_string())),
        }
    }
}

/// Buckets a positive-class probability. Intervals are half-open, so the
/// thresholds themselves belong to the upper tier.
pub fn classify(probability: f64) -> RiskTier {
    if probability < MEDIUM_RISK_THRESHOLD {
        RiskTier::Low
    } else if probability < HIGH_RISK_THRESHOLD {
        RiskTier::Medium
    } else {
        RiskTier::High
    }
}

const LOW_RISK_ACTIONS: &[&str] = &[
    "Maintain current learning pace and methods",
    "Continue regular progress monitoring",
    "Encourage continued engagement in all subjects",
    "Consider enrichment activities to challenge the student",
];

const MEDIUM_RISK_ACTIONS: &[&str] = &[
    "Implement targeted interventions in lower-performing areas",
    "Increase frequency of progress monitoring",
    "Consider additional support in specific subjects",
    "Engage parents in home-based learning activities",
    "Explore different teaching methods and materials",
];

const HIGH_RISK_ACTIONS: &[&str] = &[
    "Initiate comprehensive assessment by learning specialists",
    "Implement intensive intervention strategies",
    "Consider individualized education plan (IEP)",
    "Increase collaboration between teachers and parents",
    "Explore assistive technologies and adaptive methods",
    "Regular monitoring and adjustment of intervention strategies",
];

pub fn recommend(tier: RiskTier) -> &'static [&'static str] {
    match tier {
        RiskTier::Low => LOW_RISK_ACTIONS,
        RiskTier::Medium => MEDIUM_RISK_ACTIONS,
        RiskTier::High => HIGH_RISK_ACTIONS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_belong_to_upper_tier() {
        assert_eq!(classify(0.30), RiskTier::Medium);
        assert_eq!(classify(0.70), RiskTier::High);
        assert_eq!(classify(0.299_999), RiskTier::Low);
        assert_eq!(classify(0.699_999), RiskTier::Medium);
    }

    #[test]
    fn classification_matches_interval_definition() {
        for i in 0..=1000 {
            let p = i as f64 / 1000.0;
            let tier = classify(p);
            assert_eq!(tier == RiskTier::Low, p < 0.30, "p = {p}");
            assert_eq!(tier == RiskTier::High, p >= 0.70, "p = {p}");
        }
    }

    #[test]
    fn extremes() {
        assert_eq!(classify(0.0), RiskTier::Low);
        assert_eq!(classify(1.0), RiskTier::High);
    }

    #[test]
    fn recommendations_are_stable() {
        for tier in RiskTier::ALL {
            assert_eq!(recommend(tier), recommend(tier));
        }
        assert_eq!(recommend(RiskTier::Low).len(), 4);
        assert_eq!(recommend(RiskTier::Medium).len(), 5);
        assert_eq!(recommend(RiskTier::High).len(), 6);
    }

    #[test]
    fn parses_tier_names() {
        assert_eq!("low".parse::<RiskTier>(), Ok(RiskTier::Low));
        assert_eq!("Medium Risk".parse::<RiskTier>(), Ok(RiskTier::Medium));
        assert_eq!("HIGH".parse::<RiskTier>(), Ok(RiskTier::High));
        assert!("severe".parse::<RiskTier>().is_err());
    }

    #[test]
    fn unknown_tier_is_a_std_error() {
        let err: Box<dyn std::error::Error> = Box::new("severe".parse::<RiskTier>().unwrap_err());
        assert_eq!(
            err.to_string(),
            "unknown risk tier 'severe' (expected low, medium or high)"
        );
    }

    #[test]
    fn labels() {
        assert_eq!(RiskTier::Low.to_string(), "Low Risk");
        assert_eq!(RiskTier::High.localized(Language::Somali), "Khatar Sare");
    }
}
