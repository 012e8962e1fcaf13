//! Hazard severity classification.

use serde::{Deserialize, Serialize};

use super::Priority;

/// Checked first; any hit is High regardless of Medium keywords.
pub const HIGH_KEYWORDS: &[&str] = &[
    "tornado",
    "hurricane",
    "typhoon",
    "tsunami",
    "earthquake",
    "extreme",
    "severe",
];

pub const MEDIUM_KEYWORDS: &[&str] = &["warning", "storm", "flood", "fire", "heat", "cold", "wind"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    High,
    Medium,
    Low,
}

impl SeverityTier {
    /// Sort rank: lower is more severe
    pub fn rank(&self) -> u8 {
        match self {
            SeverityTier::High => 0,
            SeverityTier::Medium => 1,
            SeverityTier::Low => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityTier::High => "high",
            SeverityTier::Medium => "medium",
            SeverityTier::Low => "low",
        }
    }

    pub fn priority(&self) -> Priority {
        match self {
            SeverityTier::High | SeverityTier::Medium => Priority::High,
            SeverityTier::Low => Priority::Normal,
        }
    }
}

/// Classify an event label by case-insensitive keyword match.
pub fn classify(event_label: &str) -> SeverityTier {
    let label = event_label.to_lowercase();

    if HIGH_KEYWORDS.iter().any(|k| label.contains(k)) {
        SeverityTier::High
    } else if MEDIUM_KEYWORDS.iter().any(|k| label.contains(k)) {
        SeverityTier::Medium
    } else {
        SeverityTier::Low
    }
}
