//! Feature pipeline: raw campaign records to a model-ready feature frame.
//!
//! Stages run in a fixed order because each one relies on the normalization
//! done by the previous ones:
//!
//! 1. column-name normalization
//! 2. monetary/count cleaning
//! 3. `ad_date` decomposition into `day_of_week`, `month`, `day_of_month`
//! 4. categorical lowercasing and typo correction
//! 5. `conversion_rate` removal and missing-value fill
//! 6. `ad_id` removal
//! 7. one-hot encoding of the categorical columns
//! 8. alignment to a [`TrainingColumns`] set, when one is supplied
//!
//! Without a training column set the pipeline runs in discovery mode and the
//! feature layout follows whatever categories the batch contains. With one,
//! the output has exactly those columns in that order.

use std::collections::{BTreeMap, HashMap};

use chrono::Datelike;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    columns::TrainingColumns,
    corrections,
    data::{RawRecord, normalize_column_name, parse_ad_date, parse_amount},
    error::PipelineError,
    frame::{Cell, Column, Frame},
};

pub const TARGET_COLUMN: &str = "sale_amount";
pub const DATE_COLUMN: &str = "ad_date";

pub const NUMERIC_COLUMNS: &[&str] = &[
    "clicks",
    "impressions",
    "cost",
    "leads",
    "conversions",
    TARGET_COLUMN,
];

pub const DATE_FEATURES: [&str; 3] = ["day_of_week", "month", "day_of_month"];

pub const CATEGORICAL_COLUMNS: &[&str] = &["campaign_name", "location", "device", "keyword"];

const SPARSE_COLUMN: &str = "conversion_rate";
const IDENTIFIER_COLUMN: &str = "ad_id";

/// How missing numeric cells are filled in stage 5.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FillPolicy {
    /// Median of the present values in the batch (0 when none are present).
    #[default]
    Median,
    /// The constant 0.
    Zero,
}

/// Value used for each numeric column's missing cells, keyed by column name.
pub type FillValues = BTreeMap<String, f64>;

/// Output of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    /// The batch after stage 6: numeric columns filled, categories still as
    /// normalized text.
    pub cleaned: Frame,
    /// The encoded (and, in enforcement mode, aligned) feature frame.
    pub features: Frame,
    /// Fill value applied to every numeric column present in the batch.
    pub fill_values: FillValues,
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    fill: FillPolicy,
    fill_values: FillValues,
    required: Vec<String>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fill(mut self, fill: FillPolicy) -> Self {
        self.fill = fill;
        self
    }

    /// Declares a column that must be present in at least one record.
    pub fn require(mut self, column: &str) -> Self {
        self.required.push(normalize_column_name(column));
        self
    }

    /// Fixes the fill value of the named columns instead of deriving it from
    /// the batch. Inference passes the values recorded at training time.
    pub fn with_fill_values(mut self, values: FillValues) -> Self {
        self.fill_values = values;
        self
    }

    pub fn fill_policy(&self) -> FillPolicy {
        self.fill
    }

    /// Runs every stage over `records`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MissingRequiredColumn`] when a column declared
    /// with [`Pipeline::require`] is absent from the whole batch. Malformed
    /// cell values never produce an error.
    pub fn transform(
        &self,
        records: &[RawRecord],
        training_columns: Option<&TrainingColumns>,
    ) -> Result<Transformed, PipelineError> {
        let mut frame = normalize_records(records);
        for column in &self.required {
            if !frame.contains(column) {
                return Err(PipelineError::MissingRequiredColumn {
                    column: column.clone(),
                });
            }
        }

        clean_numeric_columns(&mut frame);
        decompose_ad_date(&mut frame);
        normalize_categories(&mut frame);
        frame.remove(SPARSE_COLUMN);
        let fill_values = fill_missing(&mut frame, self.fill, &self.fill_values);
        frame.remove(IDENTIFIER_COLUMN);

        let cleaned = frame.clone();
        let mut features = one_hot_encode(frame);
        if let Some(columns) = training_columns {
            features = align_to(features, columns);
        }
        debug!(
            "Transformed {} row(s) into {} feature column(s)",
            features.height(),
            features.width()
        );
        Ok(Transformed {
            cleaned,
            features,
            fill_values,
        })
    }
}

/// Runs the pipeline with the default fill policy and no required columns.
pub fn transform(
    records: &[RawRecord],
    training_columns: Option<&TrainingColumns>,
) -> Result<Transformed, PipelineError> {
    Pipeline::default().transform(records, training_columns)
}

fn normalize_records(records: &[RawRecord]) -> Frame {
    let height = records.len();
    let mut frame = Frame::with_height(height);
    for (row, record) in records.iter().enumerate() {
        for (raw_name, value) in record.fields() {
            let name = normalize_column_name(raw_name);
            if !frame.contains(&name) {
                frame.upsert(Column::filled(name.clone(), Cell::Missing, height));
            }
            if let Some(column) = frame.column_mut(&name) {
                column.cells[row] = Cell::from(value);
            }
        }
    }
    frame
}

fn numeric_value(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Float(f) if f.is_finite() => Some(*f),
        Cell::Integer(i) => Some(*i as f64),
        Cell::Text(text) => parse_amount(text),
        _ => None,
    }
}

pub(crate) fn clean_numeric_columns(frame: &mut Frame) {
    for name in NUMERIC_COLUMNS {
        let Some(column) = frame.column_mut(name) else {
            continue;
        };
        let mut unparsed = 0usize;
        for cell in &mut column.cells {
            let was_present = !cell.is_missing();
            *cell = match numeric_value(cell) {
                Some(value) => Cell::Float(value),
                None => {
                    if was_present {
                        unparsed += 1;
                    }
                    Cell::Missing
                }
            };
        }
        if unparsed > 0 {
            debug!("{unparsed} value(s) in '{name}' could not be parsed and are now missing");
        }
    }
}

pub(crate) fn decompose_ad_date(frame: &mut Frame) {
    // date parts only ever come from ad_date
    for name in DATE_FEATURES {
        if frame.remove(name).is_some() {
            debug!("Ignoring raw field '{name}': derived from '{DATE_COLUMN}' only");
        }
    }
    let Some(column) = frame.remove(DATE_COLUMN) else {
        return;
    };
    let height = column.cells.len();
    let mut day_of_week = Vec::with_capacity(height);
    let mut month = Vec::with_capacity(height);
    let mut day_of_month = Vec::with_capacity(height);
    for cell in &column.cells {
        match cell.as_text().and_then(parse_ad_date) {
            Some(date) => {
                day_of_week.push(Cell::Integer(i64::from(date.weekday().num_days_from_monday())));
                month.push(Cell::Integer(i64::from(date.month())));
                day_of_month.push(Cell::Integer(i64::from(date.day())));
            }
            None => {
                day_of_week.push(Cell::Missing);
                month.push(Cell::Missing);
                day_of_month.push(Cell::Missing);
            }
        }
    }
    let [dow_name, month_name, dom_name] = DATE_FEATURES;
    frame.upsert(Column::new(dow_name, day_of_week));
    frame.upsert(Column::new(month_name, month));
    frame.upsert(Column::new(dom_name, day_of_month));
}

fn normalize_category(column: &str, cell: &Cell) -> Cell {
    let lowered = match cell {
        Cell::Missing => return Cell::Missing,
        Cell::Text(text) => text.trim().to_lowercase(),
        other => other.as_display().trim().to_lowercase(),
    };
    if lowered.is_empty() {
        return Cell::Missing;
    }
    Cell::Text(corrections::correct(column, &lowered).to_string())
}

pub(crate) fn normalize_categories(frame: &mut Frame) {
    for name in CATEGORICAL_COLUMNS {
        if let Some(column) = frame.column_mut(name) {
            for cell in &mut column.cells {
                *cell = normalize_category(name, cell);
            }
        }
    }
}

/// Median of the numeric cells, ignoring missing ones.
pub fn median(cells: &[Cell]) -> Option<f64> {
    let mut values = cells.iter().filter_map(Cell::as_f64).collect::<Vec<_>>();
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len().is_multiple_of(2) {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Fills the missing numeric cells and returns the value used per column.
///
/// A column listed in `fixed` uses that value; otherwise `policy` derives one
/// from the batch.
pub(crate) fn fill_missing(frame: &mut Frame, policy: FillPolicy, fixed: &FillValues) -> FillValues {
    let mut used = FillValues::new();
    for name in NUMERIC_COLUMNS {
        let Some(column) = frame.column_mut(name) else {
            continue;
        };
        let fill = match (fixed.get(*name), policy) {
            (Some(value), _) => *value,
            (None, FillPolicy::Zero) => 0.0,
            (None, FillPolicy::Median) => median(&column.cells).unwrap_or(0.0),
        };
        used.insert(name.to_string(), fill);
        let mut filled = 0usize;
        for cell in column.cells.iter_mut().filter(|cell| cell.is_missing()) {
            *cell = Cell::Float(fill);
            filled += 1;
        }
        if filled > 0 {
            debug!("Filled {filled} missing value(s) in '{name}' with {fill}");
        }
    }
    used
}

/// Boolean indicator columns for one categorical column.
///
/// Categories are ordered lexicographically. The first one is the reference
/// level and gets no column, unless it is the only category in the batch.
fn indicator_columns(column: &Column) -> Vec<Column> {
    let categories = column
        .cells
        .iter()
        .filter_map(Cell::as_text)
        .sorted()
        .dedup()
        .collect::<Vec<_>>();
    let skip = usize::from(categories.len() > 1);
    categories
        .iter()
        .skip(skip)
        .map(|category| {
            let cells = column
                .cells
                .iter()
                .map(|cell| Cell::Boolean(cell.as_text() == Some(*category)))
                .collect();
            Column::new(format!("{}_{category}", column.name), cells)
        })
        .collect()
}

fn is_feature_column(name: &str) -> bool {
    NUMERIC_COLUMNS.contains(&name) || DATE_FEATURES.contains(&name)
}

pub(crate) fn one_hot_encode(mut frame: Frame) -> Frame {
    let mut encoded = Vec::new();
    for name in CATEGORICAL_COLUMNS {
        if let Some(column) = frame.remove(name) {
            encoded.extend(indicator_columns(&column));
        }
    }
    let unknown = frame
        .column_names()
        .into_iter()
        .filter(|name| !is_feature_column(name))
        .map(str::to_string)
        .collect::<Vec<_>>();
    for name in unknown {
        debug!("Ignoring column '{name}': not a recognised feature");
        frame.remove(&name);
    }
    for column in encoded {
        frame.upsert(column);
    }
    frame
}

/// Forces `features` onto the layout of `columns`: absent columns are added
/// as `false`, extra columns are dropped, order follows `columns`.
pub fn align_to(features: Frame, columns: &TrainingColumns) -> Frame {
    let height = features.height();
    let mut by_name = features
        .into_columns()
        .into_iter()
        .map(|column| (column.name.clone(), column))
        .collect::<HashMap<_, _>>();
    let mut aligned = Frame::with_height(height);
    for name in columns.iter() {
        let column = by_name
            .remove(name)
            .unwrap_or_else(|| Column::filled(name, Cell::Boolean(false), height));
        aligned.upsert(column);
    }
    if !by_name.is_empty() {
        let dropped = by_name.keys().sorted().join(", ");
        debug!("Dropped column(s) unknown to the training set: {dropped}");
    }
    aligned
}
