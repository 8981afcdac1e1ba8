use super::domain::CategoryId;

/// Invariant violations raised by aggregation, classification, and projection.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("unknown domain '{0}'")]
    UnknownDomain(String),
    #[error("score map has no entry for category '{0}'")]
    MissingCategory(CategoryId),
    #[error("score {0} is outside the 1-10 range")]
    OutOfRange(f64),
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
}
