use std::fmt;

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime};

/// A scalar as it arrives from a client body or a CSV cell.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Empty CSV fields carry no value.
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            RawValue::Null
        } else {
            RawValue::Text(field.to_string())
        }
    }

    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Null,
            serde_json::Value::Bool(b) => RawValue::Bool(*b),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => RawValue::Number(f),
                None => RawValue::Text(n.to_string()),
            },
            serde_json::Value::String(s) => RawValue::Text(s.clone()),
            other => RawValue::Text(other.to_string()),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => Ok(()),
            RawValue::Bool(b) => write!(f, "{b}"),
            RawValue::Number(n) => write!(f, "{n}"),
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

/// One un-normalized tabular row. Field order is preserved as received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: Vec<(String, RawValue)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: RawValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(name, RawValue::Text(value.into()))
    }

    pub fn with_number(self, name: impl Into<String>, value: f64) -> Self {
        self.with(name, RawValue::Number(value))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: RawValue) {
        self.fields.push((name.into(), value));
    }

    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        let fields = object
            .iter()
            .map(|(name, value)| (name.clone(), RawValue::from_json(value)))
            .collect();
        Self { fields }
    }

    pub fn from_csv_row(headers: &[String], row: &[String]) -> Self {
        let fields = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let value = row.get(idx).map(|s| s.as_str()).unwrap_or("");
                (name.clone(), RawValue::from_field(value))
            })
            .collect();
        Self { fields }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Trims, lowercases and turns spaces into underscores.
///
/// `"Campaign_Name "`, `"campaign_name"` and `"CAMPAIGN NAME"` all map to
/// `campaign_name`. Applying it twice gives the same result as applying it once.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Parses a monetary or count string after removing currency symbols,
/// thousands separators and whitespace. Returns `None` when nothing numeric is left.
pub fn parse_amount(value: &str) -> Option<f64> {
    let cleaned = value
        .chars()
        .filter(|c| !matches!(c, '$' | '₹' | ',') && !c.is_whitespace())
        .collect::<String>();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|parsed| parsed.is_finite())
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as date"))
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

/// Accepts any supported date or datetime layout; the time part is discarded.
pub fn parse_ad_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    parse_naive_date(trimmed)
        .or_else(|_| parse_naive_datetime(trimmed).map(|dt| dt.date()))
        .ok()
}
