use crate::sample_tables::{
    FREQUENCY_METRICS, LABEL, POWER_METRICS, SampleTables, UTILIZATION_METRICS,
};
use crate::utils::errors::AnalysisError;
use polars::prelude::*;

/// Per-label mean of every metric column, one row per label in first-seen order.
pub fn label_averages(frame: &DataFrame, metrics: &[&str]) -> Result<DataFrame, AnalysisError> {
    let aggs: Vec<Expr> = metrics
        .iter()
        .map(|name| col(*name).cast(DataType::Float64).mean())
        .collect();

    let averages = frame
        .clone()
        .lazy()
        .group_by_stable([col(LABEL)])
        .agg(aggs)
        .collect()?;
    Ok(averages)
}

/// Averages of the three sample tables.
#[derive(Debug, Clone)]
pub struct SessionAverages {
    pub power: DataFrame,
    pub frequency: DataFrame,
    pub utilization: DataFrame,
}

impl SessionAverages {
    pub fn from_tables(tables: &SampleTables) -> Result<Self, AnalysisError> {
        Ok(Self {
            power: label_averages(tables.power(), &POWER_METRICS)?,
            frequency: label_averages(tables.frequency(), &FREQUENCY_METRICS)?,
            utilization: label_averages(tables.utilization(), &UTILIZATION_METRICS)?,
        })
    }
}
