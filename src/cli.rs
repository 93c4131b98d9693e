use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};

use crate::pipeline::FillPolicy;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Clean ad campaign data, train a sale-amount model and serve predictions",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the feature pipeline over a raw CSV and write the feature frame
    Clean(CleanArgs),
    /// Fit a sale-amount regressor and persist it with its training columns
    Train(TrainArgs),
    /// Predict the sale amount for one JSON record using a trained model
    Predict(PredictArgs),
    /// List the training columns stored in a model or columns file
    Columns(ColumnsArgs),
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Raw CSV file to clean ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Training columns YAML file; aligns the output to that layout
    #[arg(long = "columns")]
    pub columns: Option<PathBuf>,
    /// How missing numeric values are filled
    #[arg(long, value_enum, default_value_t = FillPolicy::Median)]
    pub fill: FillPolicy,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct TrainArgs {
    /// Raw CSV dataset including the sale_amount column
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination model file (.json)
    #[arg(short, long)]
    pub model: PathBuf,
    /// Also write the training columns to this YAML file
    #[arg(long = "columns-out")]
    pub columns_out: Option<PathBuf>,
    /// How missing numeric values are filled
    #[arg(long, value_enum, default_value_t = FillPolicy::Median)]
    pub fill: FillPolicy,
    /// Send every n-th row to the evaluation set (0 evaluates on the training rows)
    #[arg(long = "holdout-every", default_value_t = 5)]
    pub holdout_every: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("body").args(["record", "input"]).multiple(false)))]
pub struct PredictArgs {
    /// Trained model file (.json)
    #[arg(short, long)]
    pub model: PathBuf,
    /// JSON object to score, given inline
    #[arg(short, long)]
    pub record: Option<String>,
    /// File holding the JSON object to score (stdin if neither is given)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("source").args(["model", "columns"]).required(true)))]
pub struct ColumnsArgs {
    /// Trained model file (.json)
    #[arg(short, long)]
    pub model: Option<PathBuf>,
    /// Training columns YAML file
    #[arg(long)]
    pub columns: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
