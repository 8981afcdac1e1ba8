use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use super::classifier::{classify, RiskLevel};
use super::domain::{CategoryId, CategoryScores, Score};
use super::error::ScoringError;
use super::scoring::{all_domain_scores, overall_score, score_change, DomainScores, ScoreChange};

#[derive(Debug, thiserror::Error)]
pub enum HistoryImportError {
    #[error("failed to read history export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid history CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("history CSV has no `date` column")]
    MissingDateColumn,
    #[error("row {row}: invalid date '{value}'")]
    InvalidDate { row: usize, value: String },
    #[error("row {row}: invalid score '{value}' for {category}")]
    InvalidScore {
        row: usize,
        category: CategoryId,
        value: String,
    },
    #[error("row {row}: {source}")]
    Scoring {
        row: usize,
        #[source]
        source: ScoringError,
    },
}

/// Full score set captured at one assessment date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalSnapshot {
    pub date: NaiveDate,
    pub scores: CategoryScores,
    pub domain_scores: DomainScores,
    pub overall_score: Score,
    pub risk_level: RiskLevel,
}

impl HistoricalSnapshot {
    pub fn from_scores(date: NaiveDate, scores: CategoryScores) -> Result<Self, ScoringError> {
        let domain_scores = all_domain_scores(&scores)?;
        let overall = overall_score(&scores)?;
        Ok(Self {
            date,
            scores,
            domain_scores,
            overall_score: overall,
            risk_level: classify(overall.value())?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalDataPoint {
    pub date: NaiveDate,
    pub score: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryMovement {
    pub category: CategoryId,
    pub from: f64,
    pub to: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodChange {
    pub date: NaiveDate,
    pub overall_score: f64,
    /// `None` for the earliest snapshot.
    pub overall_change: Option<ScoreChange>,
    pub category_changes: Vec<CategoryMovement>,
}

/// Date-ordered snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryTimeline {
    snapshots: Vec<HistoricalSnapshot>,
}

impl HistoryTimeline {
    pub fn new(mut snapshots: Vec<HistoricalSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.date);
        Self { snapshots }
    }

    pub fn snapshots(&self) -> &[HistoricalSnapshot] {
        &self.snapshots
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn latest(&self) -> Option<&HistoricalSnapshot> {
        self.snapshots.last()
    }

    pub fn category_series(&self, category: CategoryId) -> Vec<HistoricalDataPoint> {
        self.snapshots
            .iter()
            .filter_map(|snapshot| {
                let score = snapshot.scores.get(category)?;
                Some(HistoricalDataPoint {
                    date: snapshot.date,
                    score: score.value(),
                    risk_level: classify(score.value()).ok()?,
                })
            })
            .collect()
    }

    pub fn period_changes(&self) -> Vec<PeriodChange> {
        let mut previous: Option<&HistoricalSnapshot> = None;
        let mut changes = Vec::with_capacity(self.snapshots.len());

        for snapshot in &self.snapshots {
            let (overall_change, category_changes) = match previous {
                Some(prior) => (
                    Some(score_change(
                        snapshot.overall_score.value(),
                        prior.overall_score.value(),
                    )),
                    movements(&prior.scores, &snapshot.scores),
                ),
                None => (None, Vec::new()),
            };

            changes.push(PeriodChange {
                date: snapshot.date,
                overall_score: snapshot.overall_score.value(),
                overall_change,
                category_changes,
            });
            previous = Some(snapshot);
        }

        changes
    }
}

fn movements(before: &CategoryScores, after: &CategoryScores) -> Vec<CategoryMovement> {
    after
        .iter()
        .filter_map(|(category, score)| {
            let from = before.get(category)?.value();
            let to = score.value();
            (from != to).then_some(CategoryMovement { category, from, to })
        })
        .collect()
}

/// Reads history exports shaped as `date,<category-id>,...` with one row per assessment.
pub struct HistoryImporter;

impl HistoryImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<HistoryTimeline, HistoryImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<HistoryTimeline, HistoryImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let date_index = headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case("date"))
            .ok_or(HistoryImportError::MissingDateColumn)?;

        let mut columns: BTreeMap<usize, CategoryId> = BTreeMap::new();
        for (index, header) in headers.iter().enumerate() {
            if index == date_index {
                continue;
            }
            let category: CategoryId = header
                .parse()
                .map_err(|source| HistoryImportError::Scoring { row: 0, source })?;
            columns.insert(index, category);
        }

        let mut snapshots = Vec::new();
        for (offset, record) in csv_reader.records().enumerate() {
            let record = record?;
            let row = offset + 1;

            let raw_date = record.get(date_index).unwrap_or_default();
            let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
                HistoryImportError::InvalidDate {
                    row,
                    value: raw_date.to_string(),
                }
            })?;

            let mut scores = BTreeMap::new();
            for (index, category) in &columns {
                let raw = record.get(*index).unwrap_or_default();
                let value: f64 = raw.parse().map_err(|_| HistoryImportError::InvalidScore {
                    row,
                    category: *category,
                    value: raw.to_string(),
                })?;
                let score = Score::new(value)
                    .map_err(|source| HistoryImportError::Scoring { row, source })?;
                scores.insert(*category, score);
            }

            let snapshot = HistoricalSnapshot::from_scores(date, CategoryScores::new(scores))
                .map_err(|source| HistoryImportError::Scoring { row, source })?;
            snapshots.push(snapshot);
        }

        Ok(HistoryTimeline::new(snapshots))
    }
}
