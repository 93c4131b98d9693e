//! Training entry point: raw dataset → discovered feature layout → fitted model.

use anyhow::{Context, Result};
use itertools::Itertools;
use log::{info, warn};
use ndarray::{Array1, Axis};

use crate::{
    cli::TrainArgs,
    columns::TrainingColumns,
    data::RawRecord,
    error::ModelError,
    frame::{Cell, Frame},
    io_utils,
    model::{LinearModel, ModelArtifact, TrainingMetrics, feature_matrix},
    pipeline::{FillPolicy, Pipeline, TARGET_COLUMN},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainOptions {
    pub fill: FillPolicy,
    /// Every n-th row (1-based) is held out for evaluation; 0 disables the holdout.
    pub holdout_every: usize,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            fill: FillPolicy::default(),
            holdout_every: 5,
        }
    }
}

pub fn execute(args: &TrainArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!("Training on '{}'", args.input.display());

    let records = io_utils::load_raw_records(&args.input, delimiter, encoding)?;
    let options = TrainOptions {
        fill: args.fill,
        holdout_every: args.holdout_every,
    };
    let artifact = train(&records, &options)
        .with_context(|| format!("Training model from {:?}", args.input))?;

    artifact
        .save(&args.model)
        .with_context(|| format!("Writing model to {:?}", args.model))?;
    if let Some(path) = &args.columns_out {
        artifact
            .training_columns
            .save(path)
            .with_context(|| format!("Writing training columns to {path:?}"))?;
        info!("Training columns written to {path:?}");
    }

    let metrics = &artifact.metrics;
    info!(
        "Model over {} feature column(s) written to {:?} (train rows {}, eval rows {}, R² {}, RMSE {})",
        artifact.training_columns.len(),
        args.model,
        metrics.train_rows,
        metrics.eval_rows,
        format_metric(metrics.r2),
        format_metric(metrics.rmse)
    );
    Ok(())
}

fn format_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

/// Splits row indices into (training, evaluation) sets.
///
/// When the holdout is disabled or would leave the evaluation set empty, the
/// training rows double as evaluation rows.
pub fn split_rows(rows: usize, holdout_every: usize) -> (Vec<usize>, Vec<usize>) {
    let all = (0..rows).collect::<Vec<_>>();
    if holdout_every == 0 {
        return (all.clone(), all);
    }
    let (eval, train): (Vec<usize>, Vec<usize>) = all
        .into_iter()
        .partition(|idx| (idx + 1).is_multiple_of(holdout_every));
    if eval.is_empty() {
        return (train.clone(), train);
    }
    (train, eval)
}

/// Names of the columns whose value never changes across `rows`.
///
/// Such a column carries no signal and, alongside the intercept, leaves the
/// least-squares system singular. An all-missing count filled with one value
/// and a sole category indicator both end up here.
pub fn constant_columns(features: &Frame, rows: &[usize]) -> Vec<String> {
    features
        .columns()
        .iter()
        .filter(|column| {
            rows.iter()
                .map(|&row| column.cells.get(row).and_then(Cell::as_f64).unwrap_or(0.0))
                .tuple_windows()
                .all(|(a, b)| a == b)
        })
        .map(|column| column.name.clone())
        .collect()
}

/// Runs the pipeline in discovery mode over `records`, fits the regressor and
/// bundles everything inference needs.
pub fn train(records: &[RawRecord], options: &TrainOptions) -> Result<ModelArtifact> {
    if records.is_empty() {
        return Err(ModelError::NoRows("train").into());
    }
    let pipeline = Pipeline::new()
        .with_fill(options.fill)
        .require(TARGET_COLUMN);
    let transformed = pipeline.transform(records, None)?;
    let mut features = transformed.features;
    let mut fill_values = transformed.fill_values;
    fill_values.remove(TARGET_COLUMN);
    let target = features
        .remove(TARGET_COLUMN)
        .context("Target column missing after cleaning")?;

    let (train_idx, eval_idx) = split_rows(records.len(), options.holdout_every);
    if train_idx.is_empty() {
        return Err(ModelError::NoRows("train after holdout").into());
    }

    let constant = constant_columns(&features, &train_idx);
    if !constant.is_empty() {
        warn!(
            "Dropping {} constant feature column(s): {}",
            constant.len(),
            constant.join(", ")
        );
        for name in &constant {
            features.remove(name);
            fill_values.remove(name);
        }
    }

    let names = features
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let training_columns = TrainingColumns::new(names)
        .context("No feature column varies across the training rows")?;

    let x = feature_matrix(&features);
    let y = target
        .cells
        .iter()
        .map(|cell| cell.as_f64().unwrap_or(0.0))
        .collect::<Array1<f64>>();

    if train_idx.len() <= training_columns.len() {
        warn!(
            "Only {} training row(s) for {} feature column(s); the fit may be unstable",
            train_idx.len(),
            training_columns.len()
        );
    }
    let model = LinearModel::fit(&x.select(Axis(0), &train_idx), &y.select(Axis(0), &train_idx))?;
    let metrics = TrainingMetrics::evaluate(
        &model,
        &x.select(Axis(0), &eval_idx),
        &y.select(Axis(0), &eval_idx),
        train_idx.len(),
    )?;

    Ok(ModelArtifact::new(
        training_columns,
        options.fill,
        fill_values,
        model,
        metrics,
    ))
}
