//! The frozen, ordered feature layout recorded at training time.
//!
//! A [`TrainingColumns`] value is always non-empty and free of duplicates;
//! both the constructor and deserialization enforce it. The file form is a
//! YAML document with a single `columns:` list.

use std::{collections::HashSet, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct TrainingColumns {
    names: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ColumnsDocument {
    columns: TrainingColumns,
}

impl TrainingColumns {
    pub fn new(names: Vec<String>) -> Result<Self, PipelineError> {
        if names.is_empty() {
            return Err(PipelineError::EmptyTrainingColumns);
        }
        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(PipelineError::DuplicateTrainingColumn {
                    column: name.clone(),
                });
            }
        }
        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let document = ColumnsDocument {
            columns: self.clone(),
        };
        let file =
            File::create(path).with_context(|| format!("Creating columns file {path:?}"))?;
        serde_yaml::to_writer(file, &document).context("Writing training columns YAML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening columns file {path:?}"))?;
        let reader = BufReader::new(file);
        let document: ColumnsDocument =
            serde_yaml::from_reader(reader).context("Parsing training columns YAML")?;
        Ok(document.columns)
    }
}

impl TryFrom<Vec<String>> for TrainingColumns {
    type Error = PipelineError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<TrainingColumns> for Vec<String> {
    fn from(columns: TrainingColumns) -> Self {
        columns.names
    }
}
