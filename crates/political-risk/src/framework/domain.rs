use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use super::error::ScoringError;

pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 10.0;

/// One of the ten fixed risk dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CategoryId {
    Elections,
    RuleOfLaw,
    NationalSecurity,
    RegulatoryStability,
    TradePolicy,
    GovernmentContracts,
    FiscalPolicy,
    MediaFreedom,
    CivilDiscourse,
    InstitutionalIntegrity,
}

impl CategoryId {
    pub const ALL: [Self; 10] = [
        Self::Elections,
        Self::RuleOfLaw,
        Self::NationalSecurity,
        Self::RegulatoryStability,
        Self::TradePolicy,
        Self::GovernmentContracts,
        Self::FiscalPolicy,
        Self::MediaFreedom,
        Self::CivilDiscourse,
        Self::InstitutionalIntegrity,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Elections => "elections",
            Self::RuleOfLaw => "rule-of-law",
            Self::NationalSecurity => "national-security",
            Self::RegulatoryStability => "regulatory-stability",
            Self::TradePolicy => "trade-policy",
            Self::GovernmentContracts => "government-contracts",
            Self::FiscalPolicy => "fiscal-policy",
            Self::MediaFreedom => "media-freedom",
            Self::CivilDiscourse => "civil-discourse",
            Self::InstitutionalIntegrity => "institutional-integrity",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Elections => "Elections",
            Self::RuleOfLaw => "Rule of Law",
            Self::NationalSecurity => "National Security",
            Self::RegulatoryStability => "Regulatory Stability",
            Self::TradePolicy => "Trade Policy",
            Self::GovernmentContracts => "Government Contracts",
            Self::FiscalPolicy => "Fiscal Policy",
            Self::MediaFreedom => "Media Freedom",
            Self::CivilDiscourse => "Civil Discourse",
            Self::InstitutionalIntegrity => "Institutional Integrity",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Elections => "Electoral process integrity, voter access, constitutional compliance",
            Self::RuleOfLaw => {
                "Judicial independence, constitutional adherence, equal application of law"
            }
            Self::NationalSecurity => {
                "Independence and professionalism of security/intelligence institutions"
            }
            Self::RegulatoryStability => {
                "Predictability of regulatory environment, policy consistency"
            }
            Self::TradePolicy => "Trade agreements, tariff stability, economic nationalism",
            Self::GovernmentContracts => {
                "Fair contracting, political favoritism, procurement integrity"
            }
            Self::FiscalPolicy => {
                "Federal Reserve independence, debt sustainability, fiscal responsibility"
            }
            Self::MediaFreedom => "Press freedom, journalist safety, information environment",
            Self::CivilDiscourse => {
                "Public discourse quality, social trust, political violence levels"
            }
            Self::InstitutionalIntegrity => {
                "Civil service independence, inspector general function, oversight"
            }
        }
    }

    pub const fn domain(self) -> DomainId {
        match self {
            Self::Elections | Self::RuleOfLaw | Self::NationalSecurity => DomainId::RuleOfLaw,
            Self::RegulatoryStability
            | Self::TradePolicy
            | Self::GovernmentContracts
            | Self::FiscalPolicy => DomainId::OperatingEconomic,
            Self::MediaFreedom | Self::CivilDiscourse | Self::InstitutionalIntegrity => {
                DomainId::SocietalInstitutional
            }
        }
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryId {
    type Err = ScoringError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == trimmed)
            .ok_or_else(|| ScoringError::UnknownCategory(raw.to_string()))
    }
}

/// Mid-level grouping of categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DomainId {
    RuleOfLaw,
    OperatingEconomic,
    SocietalInstitutional,
}

impl DomainId {
    pub const ALL: [Self; 3] = [
        Self::RuleOfLaw,
        Self::OperatingEconomic,
        Self::SocietalInstitutional,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RuleOfLaw => "rule-of-law",
            Self::OperatingEconomic => "operating-economic",
            Self::SocietalInstitutional => "societal-institutional",
        }
    }

    /// Owned categories; the three sets partition [`CategoryId::ALL`].
    pub const fn categories(self) -> &'static [CategoryId] {
        match self {
            Self::RuleOfLaw => &[
                CategoryId::Elections,
                CategoryId::RuleOfLaw,
                CategoryId::NationalSecurity,
            ],
            Self::OperatingEconomic => &[
                CategoryId::RegulatoryStability,
                CategoryId::TradePolicy,
                CategoryId::GovernmentContracts,
                CategoryId::FiscalPolicy,
            ],
            Self::SocietalInstitutional => &[
                CategoryId::MediaFreedom,
                CategoryId::CivilDiscourse,
                CategoryId::InstitutionalIntegrity,
            ],
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::RuleOfLaw => "Rule of Law & National Security",
            Self::OperatingEconomic => "Operating & Economic Environment",
            Self::SocietalInstitutional => "Societal & Institutional Integrity",
        }
    }

    pub const fn short_label(self) -> &'static str {
        match self {
            Self::RuleOfLaw => "Rule of Law & Security",
            Self::OperatingEconomic => "Operating & Economic",
            Self::SocietalInstitutional => "Societal & Institutional",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::RuleOfLaw => {
                "Assesses the integrity of democratic institutions, electoral processes, and security apparatus."
            }
            Self::OperatingEconomic => {
                "Evaluates the business climate, regulatory stability, and economic policy predictability."
            }
            Self::SocietalInstitutional => {
                "Measures media freedom, civil discourse quality, and institutional independence."
            }
        }
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DomainId {
    type Err = ScoringError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        Self::ALL
            .into_iter()
            .find(|domain| domain.as_str() == trimmed)
            .ok_or_else(|| ScoringError::UnknownDomain(raw.to_string()))
    }
}

/// A risk score inside the closed interval [1, 10].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Score(f64);

impl Score {
    pub fn new(value: f64) -> Result<Self, ScoringError> {
        if value.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ScoringError::OutOfRange(value))
        }
    }

    /// Clamp into [1, 10]. Non-finite input collapses to the floor.
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Self(MIN_SCORE);
        }
        Self(value.clamp(MIN_SCORE, MAX_SCORE))
    }

    pub const fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Score {
    type Error = ScoringError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for f64 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Increasing,
    Stable,
    Decreasing,
}

impl Trend {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Increasing => "↑",
            Self::Stable => "→",
            Self::Decreasing => "↓",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Increasing => "Increasing",
            Self::Stable => "Stable",
            Self::Decreasing => "Decreasing",
        }
    }
}

/// Rubric bucket used to pick the descriptive text for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RubricTier {
    #[serde(rename = "1-2")]
    OneToTwo,
    #[serde(rename = "3-4")]
    ThreeToFour,
    #[serde(rename = "5-6")]
    FiveToSix,
    #[serde(rename = "7-8")]
    SevenToEight,
    #[serde(rename = "9-10")]
    NineToTen,
}

impl RubricTier {
    pub fn for_score(score: f64) -> Self {
        if score <= 2.0 {
            Self::OneToTwo
        } else if score <= 4.0 {
            Self::ThreeToFour
        } else if score <= 6.0 {
            Self::FiveToSix
        } else if score <= 8.0 {
            Self::SevenToEight
        } else {
            Self::NineToTen
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::OneToTwo => "1-2",
            Self::ThreeToFour => "3-4",
            Self::FiveToSix => "5-6",
            Self::SevenToEight => "7-8",
            Self::NineToTen => "9-10",
        }
    }
}

/// Category → score mapping. Values are always inside [1, 10].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryScores(BTreeMap<CategoryId, Score>);

impl CategoryScores {
    pub fn new(scores: BTreeMap<CategoryId, Score>) -> Self {
        Self(scores)
    }

    /// Build from untyped identifiers, rejecting unknown ids and out-of-range values.
    pub fn from_raw<'a, I>(entries: I) -> Result<Self, ScoringError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut scores = BTreeMap::new();
        for (raw_id, value) in entries {
            let category: CategoryId = raw_id.parse()?;
            scores.insert(category, Score::new(value)?);
        }
        Ok(Self(scores))
    }

    pub fn get(&self, category: CategoryId) -> Option<Score> {
        self.0.get(&category).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CategoryId, Score)> + '_ {
        self.0.iter().map(|(category, score)| (*category, *score))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First category of the fixed vocabulary with no entry, if any.
    pub fn first_missing(&self) -> Option<CategoryId> {
        CategoryId::ALL
            .into_iter()
            .find(|category| !self.0.contains_key(category))
    }

    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }

    pub fn as_map(&self) -> &BTreeMap<CategoryId, Score> {
        &self.0
    }
}

impl FromIterator<(CategoryId, Score)> for CategoryScores {
    fn from_iter<T: IntoIterator<Item = (CategoryId, Score)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for CategoryScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CategoryScores {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<String, f64>::deserialize(deserializer)?;
        Self::from_raw(raw.iter().map(|(id, value)| (id.as_str(), *value)))
            .map_err(serde::de::Error::custom)
    }
}
