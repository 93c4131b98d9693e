//! Linear regressor over the feature frame and its persisted artifact.
//!
//! The artifact is a JSON document holding everything inference needs: the
//! [`TrainingColumns`] the coefficients line up with, the fill policy the
//! pipeline ran with and the per-column fill values it derived, and the
//! holdout metrics from training.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, anyhow, ensure};
use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::{
    columns::TrainingColumns,
    error::ModelError,
    frame::Frame,
    pipeline::{FillPolicy, FillValues, Pipeline, TARGET_COLUMN},
};

pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    pub fn fit(features: &Array2<f64>, targets: &Array1<f64>) -> Result<Self> {
        if features.nrows() == 0 {
            return Err(ModelError::NoRows("fit").into());
        }
        let dataset = Dataset::new(features.clone(), targets.clone());
        let fitted = LinearRegression::default()
            .fit(&dataset)
            .map_err(|e| anyhow!("Linear regression training failed: {e}"))?;
        Ok(Self {
            intercept: fitted.intercept(),
            coefficients: fitted.params().to_vec(),
        })
    }

    pub fn width(&self) -> usize {
        self.coefficients.len()
    }

    pub fn predict_row(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.width() {
            return Err(ModelError::FeatureWidthMismatch {
                expected: self.width(),
                actual: features.len(),
            });
        }
        let dot = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(weight, value)| weight * value)
            .sum::<f64>();
        Ok(self.intercept + dot)
    }

    pub fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        if features.ncols() != self.width() {
            return Err(ModelError::FeatureWidthMismatch {
                expected: self.width(),
                actual: features.ncols(),
            });
        }
        let weights = Array1::from(self.coefficients.clone());
        Ok(features.dot(&weights) + self.intercept)
    }
}

/// Holdout evaluation recorded at training time. Metrics that cannot be
/// computed (for example R² over a constant target) are stored as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub train_rows: usize,
    pub eval_rows: usize,
    pub r2: Option<f64>,
    pub rmse: Option<f64>,
}

impl TrainingMetrics {
    pub fn evaluate(
        model: &LinearModel,
        features: &Array2<f64>,
        targets: &Array1<f64>,
        train_rows: usize,
    ) -> Result<Self> {
        let predicted = model.predict(features)?;
        let dataset = Dataset::new(features.clone(), targets.clone());
        let r2 = predicted.r2(&dataset).ok().filter(|v| v.is_finite());
        let rmse = predicted
            .mean_squared_error(&dataset)
            .ok()
            .map(f64::sqrt)
            .filter(|v| v.is_finite());
        Ok(Self {
            train_rows,
            eval_rows: features.nrows(),
            r2,
            rmse,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    pub target: String,
    pub training_columns: TrainingColumns,
    pub fill_policy: FillPolicy,
    #[serde(default)]
    pub fill_values: FillValues,
    pub model: LinearModel,
    pub metrics: TrainingMetrics,
}

impl ModelArtifact {
    pub fn new(
        training_columns: TrainingColumns,
        fill_policy: FillPolicy,
        fill_values: FillValues,
        model: LinearModel,
        metrics: TrainingMetrics,
    ) -> Self {
        Self {
            version: ARTIFACT_VERSION,
            target: TARGET_COLUMN.to_string(),
            training_columns,
            fill_policy,
            fill_values,
            model,
            metrics,
        }
    }

    /// The pipeline configured the way it was during training, filling
    /// missing numbers with the values derived from the training batch.
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new()
            .with_fill(self.fill_policy)
            .with_fill_values(self.fill_values.clone())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating model file {path:?}"))?;
        serde_json::to_writer_pretty(file, self).context("Writing model JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening model file {path:?}"))?;
        let reader = BufReader::new(file);
        let artifact: ModelArtifact =
            serde_json::from_reader(reader).context("Parsing model JSON")?;
        artifact.validate()?;
        Ok(artifact)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.version == ARTIFACT_VERSION,
            "Unsupported model artifact version {} (expected {ARTIFACT_VERSION})",
            self.version
        );
        ensure!(
            self.model.width() == self.training_columns.len(),
            "Model has {} coefficient(s) for {} training column(s)",
            self.model.width(),
            self.training_columns.len()
        );
        ensure!(
            !self.training_columns.contains(&self.target),
            "Target column '{}' is listed as a training column",
            self.target
        );
        Ok(())
    }
}

/// Dense matrix of the frame's cells in column order. Booleans become 0/1 and
/// missing cells 0.
pub fn feature_matrix(frame: &Frame) -> Array2<f64> {
    let mut matrix = Array2::zeros((frame.height(), frame.width()));
    for (col_idx, column) in frame.columns().iter().enumerate() {
        for (row_idx, cell) in column.cells.iter().enumerate() {
            matrix[[row_idx, col_idx]] = cell.as_f64().unwrap_or(0.0);
        }
    }
    matrix
}
