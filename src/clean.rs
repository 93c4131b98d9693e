use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::CleanArgs,
    columns::TrainingColumns,
    io_utils,
    pipeline::Pipeline,
};

pub fn execute(args: &CleanArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let training_columns = match &args.columns {
        Some(path) => Some(
            TrainingColumns::load(path)
                .with_context(|| format!("Loading training columns from {path:?}"))?,
        ),
        None => None,
    };

    let records = io_utils::load_raw_records(&args.input, delimiter, encoding)?;
    let transformed = Pipeline::new()
        .with_fill(args.fill)
        .transform(&records, training_columns.as_ref())?;

    let mut writer = io_utils::open_csv_writer(args.output.as_deref(), delimiter)?;
    io_utils::write_frame(&mut writer, &transformed.features)?;

    let destination = args
        .output
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "stdout".to_string());
    info!(
        "Cleaned {} row(s) into {} feature column(s) -> {}{}",
        transformed.features.height(),
        transformed.features.width(),
        destination,
        if training_columns.is_some() {
            " (aligned to training columns)"
        } else {
            ""
        }
    );
    Ok(())
}
