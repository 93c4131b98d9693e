//! Prediction boundary: a JSON body in, a JSON payload out.
//!
//! Every failure is turned into `{"error": ..., "type": ...}`; nothing here
//! panics on bad input.

use std::{fs, io::Read, slice};

use anyhow::{Context, Result, bail};
use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

use crate::{
    cli::PredictArgs,
    data::RawRecord,
    error::{ModelError, PipelineError},
    model::ModelArtifact,
};

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("request body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("request body must be a JSON object")]
    NotAnObject,
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl PredictError {
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::InvalidJson(_) | PredictError::NotAnObject => "MalformedRequest",
            PredictError::Pipeline(err) => err.kind(),
            PredictError::Model(err) => err.kind(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Prediction {
        sale_amount_prediction: f64,
    },
    Failure {
        error: String,
        #[serde(rename = "type")]
        kind: String,
    },
}

impl Response {
    pub fn is_failure(&self) -> bool {
        matches!(self, Response::Failure { .. })
    }
}

pub fn parse_body(body: &str) -> Result<RawRecord, PredictError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let object = value.as_object().ok_or(PredictError::NotAnObject)?;
    Ok(RawRecord::from_json_object(object))
}

/// Scores one record against the artifact's frozen feature layout.
pub fn predict_record(artifact: &ModelArtifact, record: &RawRecord) -> Result<f64, PredictError> {
    let transformed = artifact
        .pipeline()
        .transform(slice::from_ref(record), Some(&artifact.training_columns))?;
    let row = transformed
        .features
        .row(0)
        .into_iter()
        .map(|(_, cell)| cell.as_f64().unwrap_or(0.0))
        .collect::<Vec<_>>();
    Ok(artifact.model.predict_row(&row)?)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn respond(artifact: &ModelArtifact, body: &str) -> Response {
    match parse_body(body).and_then(|record| predict_record(artifact, &record)) {
        Ok(prediction) => Response::Prediction {
            sale_amount_prediction: round_cents(prediction),
        },
        Err(err) => {
            debug!("Prediction failed: {err}");
            Response::Failure {
                error: err.to_string(),
                kind: err.kind().to_string(),
            }
        }
    }
}

pub fn execute(args: &PredictArgs) -> Result<()> {
    let artifact = ModelArtifact::load(&args.model)
        .with_context(|| format!("Loading model from {:?}", args.model))?;
    info!(
        "Loaded model with {} training column(s) from {:?}",
        artifact.training_columns.len(),
        args.model
    );

    let body = match (&args.record, &args.input) {
        (Some(record), _) => record.clone(),
        (None, Some(path)) => {
            fs::read_to_string(path).with_context(|| format!("Reading request body {path:?}"))?
        }
        (None, None) => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Reading request body from stdin")?;
            buffer
        }
    };

    let response = respond(&artifact, &body);
    println!(
        "{}",
        serde_json::to_string(&response).context("Serializing response")?
    );
    if let Response::Failure { error, kind } = &response {
        bail!("Prediction failed ({kind}): {error}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        columns::TrainingColumns,
        model::{LinearModel, TrainingMetrics},
        pipeline::{FillPolicy, FillValues},
    };

    fn artifact() -> ModelArtifact {
        ModelArtifact::new(
            TrainingColumns::new(vec![
                "cost".to_string(),
                "clicks".to_string(),
                "device_mobile".to_string(),
            ])
            .unwrap(),
            FillPolicy::Median,
            FillValues::from([("clicks".to_string(), 4.0)]),
            LinearModel {
                intercept: 10.0,
                coefficients: vec![2.0, 0.5, 100.0],
            },
            TrainingMetrics::default(),
        )
    }

    #[test]
    fn respond_scores_cleaned_record() {
        let response = respond(
            &artifact(),
            r#"{"Cost": "$1,000.25", "Clicks": 3, "Device": "Mobile"}"#,
        );
        // 10 + 2 * 1000.25 + 0.5 * 3 + 100
        assert_eq!(
            response,
            Response::Prediction {
                sale_amount_prediction: 2112.0
            }
        );
    }

    #[test]
    fn unseen_categories_are_ignored() {
        let response = respond(&artifact(), r#"{"cost": 1, "clicks": 0, "device": "watch"}"#);
        assert_eq!(
            response,
            Response::Prediction {
                sale_amount_prediction: 12.0
            }
        );
    }

    #[test]
    fn unparseable_counts_use_the_training_fill_value() {
        let response = respond(&artifact(), r#"{"cost": 1, "clicks": "lots"}"#);
        // 10 + 2 * 1 + 0.5 * 4
        assert_eq!(
            response,
            Response::Prediction {
                sale_amount_prediction: 14.0
            }
        );
    }

    #[test]
    fn malformed_bodies_become_error_payloads() {
        let response = respond(&artifact(), "[1, 2]");
        assert!(response.is_failure());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], "MalformedRequest");
        assert_eq!(json["error"], "request body must be a JSON object");

        let response = respond(&artifact(), "{not json");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], "MalformedRequest");
    }

    #[test]
    fn prediction_payload_shape() {
        let json = serde_json::to_string(&Response::Prediction {
            sale_amount_prediction: 1.5,
        })
        .unwrap();
        assert_eq!(json, r#"{"sale_amount_prediction":1.5}"#);
    }
}
