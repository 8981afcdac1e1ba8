use serde::{Deserialize, Serialize};
use std::fmt;

use super::domain::{MAX_SCORE, MIN_SCORE};
use super::error::ScoringError;

/// Ordered risk band derived from a score. Always recomputed, never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    Elevated,
    High,
    Severe,
}

impl RiskLevel {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Low,
            Self::Moderate,
            Self::Elevated,
            Self::High,
            Self::Severe,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::Elevated => "Elevated",
            Self::High => "High",
            Self::Severe => "Severe",
        }
    }

    /// 1 (Low) through 5 (Severe).
    pub const fn severity_rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Moderate => 2,
            Self::Elevated => 3,
            Self::High => 4,
            Self::Severe => 5,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bands are `[1,3) [3,5) [5,7) [7,9) [9,10]`, compared on the raw score.
pub fn classify(score: f64) -> Result<RiskLevel, ScoringError> {
    if !score.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(ScoringError::OutOfRange(score));
    }

    let level = if score < 3.0 {
        RiskLevel::Low
    } else if score < 5.0 {
        RiskLevel::Moderate
    } else if score < 7.0 {
        RiskLevel::Elevated
    } else if score < 9.0 {
        RiskLevel::High
    } else {
        RiskLevel::Severe
    };

    Ok(level)
}
