//! Reading raw ad exports and writing feature frames as CSV.
//!
//! The delimiter comes from `--delimiter` or the file extension (`.tsv` reads
//! tab-separated). Input bytes are decoded with `encoding_rs`, UTF-8 unless
//! told otherwise, since exports carrying `₹` are not always UTF-8. A path of
//! `-` means stdin or stdout.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

use crate::{data::RawRecord, frame::Frame};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    Ok(open_csv_reader(reader, delimiter))
}

pub fn open_csv_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let writer: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    Ok(builder.from_writer(writer))
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Reads every row of a headed CSV source into raw records.
pub fn read_raw_records<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<RawRecord>>
where
    R: Read,
{
    let headers = reader.byte_headers()?.clone();
    let headers = decode_record(&headers, encoding).context("Decoding header row")?;
    let mut records = Vec::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", idx + 2))?;
        let decoded =
            decode_record(&record, encoding).with_context(|| format!("Decoding row {}", idx + 2))?;
        records.push(RawRecord::from_csv_row(&headers, &decoded));
    }
    Ok(records)
}

pub fn load_raw_records(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<Vec<RawRecord>> {
    let mut reader = open_csv_reader_from_path(path, delimiter)?;
    read_raw_records(&mut reader, encoding).with_context(|| format!("Reading dataset {path:?}"))
}

pub fn write_frame<W>(writer: &mut csv::Writer<W>, frame: &Frame) -> Result<()>
where
    W: Write,
{
    writer
        .write_record(frame.column_names())
        .context("Writing output headers")?;
    for row in 0..frame.height() {
        let values = frame
            .row(row)
            .into_iter()
            .map(|(_, cell)| cell.as_display())
            .collect::<Vec<_>>();
        writer
            .write_record(&values)
            .with_context(|| format!("Writing output row {}", row + 2))?;
    }
    writer.flush().context("Flushing output writer")
}
