//! Typed errors for caller contract violations.
//!
//! Data-quality problems (a bad monetary string, an unparseable date, a
//! category never seen during training) are not errors: they turn into
//! missing cells or dropped columns inside the pipeline. The variants here
//! cover the cases where the caller handed over something the pipeline
//! cannot honour without producing a wrong-shaped result.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("required column '{column}' is absent from every input record")]
    MissingRequiredColumn { column: String },
    #[error("training column set is empty")]
    EmptyTrainingColumns,
    #[error("training column '{column}' appears more than once")]
    DuplicateTrainingColumn { column: String },
}

impl PipelineError {
    /// Stable name reported in the `type` field of error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::MissingRequiredColumn { .. } => "MissingRequiredColumn",
            PipelineError::EmptyTrainingColumns => "EmptyTrainingColumns",
            PipelineError::DuplicateTrainingColumn { .. } => "DuplicateTrainingColumn",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("model expects {expected} feature(s) but the processed record has {actual}")]
    FeatureWidthMismatch { expected: usize, actual: usize },
    #[error("no rows available to {0}")]
    NoRows(&'static str),
}

impl ModelError {
    pub fn kind(&self) -> &'static str {
        match self {
            ModelError::FeatureWidthMismatch { .. } => "FeatureWidthMismatch",
            ModelError::NoRows(_) => "NoRows",
        }
    }
}
