pub mod clean;
pub mod cli;
pub mod columns;
pub mod corrections;
pub mod data;
pub mod error;
pub mod frame;
pub mod io_utils;
pub mod model;
pub mod pipeline;
pub mod predict;
pub mod train;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, ColumnsArgs, Commands},
    columns::TrainingColumns,
    model::ModelArtifact,
};

pub use crate::pipeline::{FillPolicy, FillValues, Pipeline, Transformed, transform};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("ad_sales", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Clean(args) => clean::execute(&args),
        Commands::Train(args) => train::execute(&args),
        Commands::Predict(args) => predict::execute(&args),
        Commands::Columns(args) => handle_columns(&args),
    }
}

fn handle_columns(args: &ColumnsArgs) -> Result<()> {
    let (columns, source) = match (&args.model, &args.columns) {
        (Some(path), _) => {
            let artifact = ModelArtifact::load(path)
                .with_context(|| format!("Loading model from {path:?}"))?;
            (artifact.training_columns, path)
        }
        (None, Some(path)) => (
            TrainingColumns::load(path)
                .with_context(|| format!("Loading training columns from {path:?}"))?,
            path,
        ),
        (None, None) => anyhow::bail!("Provide --model or --columns"),
    };
    for (idx, name) in columns.iter().enumerate() {
        println!("{:>3}  {name}", idx + 1);
    }
    info!("Listed {} training column(s) from {:?}", columns.len(), source);
    Ok(())
}
