pub mod actions;
pub mod assessment;
pub mod category;
mod classifier;
pub mod dataset;
pub mod domain;
pub mod economic;
mod error;
pub mod evaluation;
pub mod history;
pub mod scenario;
mod scoring;

pub use category::{action_categories_for, CategoryContext};
pub use classifier::{classify, RiskLevel};
pub use dataset::{DatasetError, FrameworkDataset, ScenarioLibrary};
pub use domain::{CategoryId, CategoryScores, DomainId, RubricTier, Score, Trend};
pub use error::ScoringError;
pub use scenario::{
    project, project_selection, Impact, ImpactEvent, ProjectionResult, ScenarioSelection,
};
pub use scoring::{
    all_domain_scores, domain_score, domain_score_by_id, overall_score, score_change,
    ChangeDirection, DomainScores, ScoreChange,
};
