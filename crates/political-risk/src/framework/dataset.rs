use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use super::actions::ActionsTracker;
use super::assessment::CurrentAssessment;
use super::domain::{CategoryId, CategoryScores, DomainId};
use super::economic::EconomicIndicatorSet;
use super::error::ScoringError;
use super::history::{HistoryImportError, HistoryImporter, HistoryTimeline};
use super::scenario::{ImpactEvent, Likelihood};

pub const CURRENT_FILE: &str = "current.json";
pub const SCENARIOS_FILE: &str = "scenarios.json";
pub const ECONOMIC_FILE: &str = "economic-indicators.json";
pub const ACTIONS_FILE: &str = "actions.json";
pub const HISTORY_FILE: &str = "history.csv";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("history import failed: {0}")]
    History(#[from] HistoryImportError),
    #[error("current assessment has no score for {0}")]
    Incomplete(CategoryId),
    #[error("scenario event id `{0}` is defined more than once")]
    DuplicateEvent(String),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

/// Predefined events offered for scenario projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioLibrary {
    #[serde(default)]
    pub events: Vec<ImpactEvent>,
    #[serde(default)]
    pub likelihood_descriptions: BTreeMap<Likelihood, String>,
}

impl ScenarioLibrary {
    pub fn find(&self, event_id: &str) -> Option<&ImpactEvent> {
        self.events.iter().find(|event| event.id == event_id)
    }

    pub fn by_domain(&self, domain: DomainId) -> impl Iterator<Item = &ImpactEvent> + '_ {
        self.events
            .iter()
            .filter(move |event| event.domain == Some(domain))
    }

    fn ensure_unique(&self) -> Result<(), DatasetError> {
        let mut seen = HashSet::new();
        for event in &self.events {
            if !seen.insert(event.id.as_str()) {
                return Err(DatasetError::DuplicateEvent(event.id.clone()));
            }
        }
        Ok(())
    }
}

/// Every static input the engine serves, loaded once at startup.
#[derive(Debug, Clone)]
pub struct FrameworkDataset {
    pub assessment: CurrentAssessment,
    pub baseline: CategoryScores,
    pub scenarios: ScenarioLibrary,
    pub economic: EconomicIndicatorSet,
    pub actions: ActionsTracker,
    pub history: HistoryTimeline,
}

impl FrameworkDataset {
    pub fn new(assessment: CurrentAssessment) -> Result<Self, DatasetError> {
        let baseline = assessment.baseline();
        if let Some(missing) = baseline.first_missing() {
            return Err(DatasetError::Incomplete(missing));
        }

        Ok(Self {
            assessment,
            baseline,
            scenarios: ScenarioLibrary::default(),
            economic: EconomicIndicatorSet::default(),
            actions: ActionsTracker::default(),
            history: HistoryTimeline::default(),
        })
    }

    pub fn with_scenarios(mut self, scenarios: ScenarioLibrary) -> Result<Self, DatasetError> {
        scenarios.ensure_unique()?;
        self.scenarios = scenarios;
        Ok(self)
    }

    /// `current.json` is required; the remaining files are optional and default to empty.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, DatasetError> {
        let dir = dir.as_ref();
        let assessment: CurrentAssessment = read_json(&dir.join(CURRENT_FILE))?;

        let mut dataset = Self::new(assessment)?;
        if let Some(scenarios) = read_optional_json(&dir.join(SCENARIOS_FILE))? {
            dataset = dataset.with_scenarios(scenarios)?;
        }
        if let Some(economic) = read_optional_json(&dir.join(ECONOMIC_FILE))? {
            dataset.economic = economic;
        }
        if let Some(actions) = read_optional_json(&dir.join(ACTIONS_FILE))? {
            dataset.actions = actions;
        }

        let history_path = dir.join(HISTORY_FILE);
        if history_path.exists() {
            dataset.history = HistoryImporter::from_path(&history_path)?;
        }

        info!(
            dir = %dir.display(),
            events = dataset.scenarios.events.len(),
            indicators = dataset.economic.indicators.len(),
            actions = dataset.actions.actions.len(),
            snapshots = dataset.history.snapshots().len(),
            "framework dataset loaded"
        );
        Ok(dataset)
    }

    /// Resolve predefined events by id, preserving request order.
    pub fn resolve_events(&self, ids: &[String]) -> Result<Vec<ImpactEvent>, String> {
        ids.iter()
            .map(|id| {
                self.scenarios
                    .find(id)
                    .cloned()
                    .ok_or_else(|| id.clone())
            })
            .collect()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DatasetError> {
    let contents = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| DatasetError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn read_optional_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, DatasetError> {
    if !path.exists() {
        debug!(path = %path.display(), "optional dataset file absent");
        return Ok(None);
    }
    read_json(path).map(Some)
}
