//! Literal spelling fixes for the categorical columns.
//!
//! The tables are a closed set of exact replacements applied after
//! lowercasing and trimming. They are built once and never mutated.

use std::{collections::HashMap, sync::LazyLock};

const CAMPAIGN_NAME: &[(&str, &str)] = &[
    ("data anlytics corse", "data analytics course"),
    ("data analytcis course", "data analytics course"),
    ("data analytics corse", "data analytics course"),
    ("dataanalyticscourse", "data analytics course"),
];

const LOCATION: &[(&str, &str)] = &[("hyderbad", "hyderabad"), ("hydrebad", "hyderabad")];

const KEYWORD: &[(&str, &str)] = &[
    ("data analitics online", "data analytics online"),
    ("data anaytics training", "data analytics training"),
    ("online data analytic", "online data analytics"),
];

type Table = HashMap<&'static str, &'static str>;

static TABLES: LazyLock<HashMap<&'static str, Table>> = LazyLock::new(|| {
    [
        ("campaign_name", CAMPAIGN_NAME),
        ("location", LOCATION),
        ("keyword", KEYWORD),
    ]
    .into_iter()
    .map(|(column, entries)| (column, entries.iter().copied().collect()))
    .collect()
});

/// The correction table for `column`, if that column has one.
pub fn table_for(column: &str) -> Option<&'static Table> {
    TABLES.get(column)
}

/// Returns the canonical spelling of `value` for `column`, or `value` itself
/// when no correction applies.
pub fn correct<'a>(column: &str, value: &'a str) -> &'a str {
    table_for(column)
        .and_then(|table| table.get(value).copied())
        .unwrap_or(value)
}
