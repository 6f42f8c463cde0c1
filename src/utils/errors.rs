use crate::config::ConfigError;
use itertools::Itertools;
use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning one log's text into sample tables.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("{metric}: '{value}' is not a valid reading")]
    InvalidNumber { metric: &'static str, value: String },
    #[error("{table} columns have unequal lengths ({})", format_counts(.counts))]
    ColumnMismatch {
        table: &'static str,
        counts: Vec<(&'static str, usize)>,
    },
    #[error("sample {sample}: power readings overflow the residual")]
    Overflow { sample: u32 },
    #[error(
        "table lengths are not equal (power {power}, frequency {frequency}, utilization {utilization})"
    )]
    TableMismatch {
        power: usize,
        frequency: usize,
        utilization: usize,
    },
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse '{}': {source}", .path.display())]
    Extract {
        path: PathBuf,
        #[source]
        source: ExtractError,
    },
    #[error("DataFrame error: {0}")]
    Frame(#[from] PolarsError),
    #[error("invalid metric pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn format_counts(counts: &[(&'static str, usize)]) -> String {
    counts
        .iter()
        .map(|(name, count)| format!("{name} {count}"))
        .join(", ")
}
