use crate::extractor::RunSamples;
use crate::utils::errors::AnalysisError;
use polars::prelude::*;
use std::collections::HashMap;

pub const SAMPLE: &str = "sample";
pub const LABEL: &str = "label";

pub const POWER_METRICS: [&str; 7] = [
    "efficiency_cluster",
    "performance_cluster",
    "dram",
    "cluster",
    "package",
    "gpu",
    "other",
];
pub const FREQUENCY_METRICS: [&str; 3] = ["efficiency_cluster", "performance_cluster", "gpu"];
pub const UTILIZATION_METRICS: [&str; 3] = ["efficiency_cluster", "performance_cluster", "gpu"];

/// The three sample tables accumulated over a benchmark session.
#[derive(Debug, Clone)]
pub struct SampleTables {
    /// DataFrame: efficiency_cluster | performance_cluster | dram | cluster | package | gpu | other | sample | label
    power: DataFrame,
    /// DataFrame: efficiency_cluster | performance_cluster | gpu | sample | label
    frequency: DataFrame,
    /// DataFrame: efficiency_cluster | performance_cluster | gpu | sample | label
    utilization: DataFrame,
}

impl SampleTables {
    /// Create empty tables with the full schema.
    pub fn new() -> Result<Self, AnalysisError> {
        Self::from_run(&RunSamples::default())
    }

    /// Build tables holding the samples of a single run.
    pub fn from_run(run: &RunSamples) -> Result<Self, AnalysisError> {
        let power = df![
            "efficiency_cluster" => run.power.iter().map(|r| r.efficiency_cluster).collect::<Vec<_>>(),
            "performance_cluster" => run.power.iter().map(|r| r.performance_cluster).collect::<Vec<_>>(),
            "dram" => run.power.iter().map(|r| r.dram).collect::<Vec<_>>(),
            "cluster" => run.power.iter().map(|r| r.cluster).collect::<Vec<_>>(),
            "package" => run.power.iter().map(|r| r.package).collect::<Vec<_>>(),
            "gpu" => run.power.iter().map(|r| r.gpu).collect::<Vec<_>>(),
            "other" => run.power.iter().map(|r| r.other).collect::<Vec<_>>(),
            SAMPLE => run.power.iter().map(|r| r.sample).collect::<Vec<_>>(),
            LABEL => run.power.iter().map(|r| r.label.clone()).collect::<Vec<_>>(),
        ]?;

        let frequency = df![
            "efficiency_cluster" => run.frequency.iter().map(|r| r.efficiency_cluster).collect::<Vec<_>>(),
            "performance_cluster" => run.frequency.iter().map(|r| r.performance_cluster).collect::<Vec<_>>(),
            "gpu" => run.frequency.iter().map(|r| r.gpu).collect::<Vec<_>>(),
            SAMPLE => run.frequency.iter().map(|r| r.sample).collect::<Vec<_>>(),
            LABEL => run.frequency.iter().map(|r| r.label.clone()).collect::<Vec<_>>(),
        ]?;

        let utilization = df![
            "efficiency_cluster" => run.utilization.iter().map(|r| r.efficiency_cluster).collect::<Vec<_>>(),
            "performance_cluster" => run.utilization.iter().map(|r| r.performance_cluster).collect::<Vec<_>>(),
            "gpu" => run.utilization.iter().map(|r| r.gpu).collect::<Vec<_>>(),
            SAMPLE => run.utilization.iter().map(|r| r.sample).collect::<Vec<_>>(),
            LABEL => run.utilization.iter().map(|r| r.label.clone()).collect::<Vec<_>>(),
        ]?;

        Ok(Self {
            power,
            frequency,
            utilization,
        })
    }

    pub fn power(&self) -> &DataFrame {
        &self.power
    }

    pub fn frequency(&self) -> &DataFrame {
        &self.frequency
    }

    pub fn utilization(&self) -> &DataFrame {
        &self.utilization
    }

    pub fn height(&self) -> usize {
        self.power.height()
    }

    /// Append the samples of one run below the existing rows.
    pub fn append_run(&mut self, run: &RunSamples) -> Result<(), AnalysisError> {
        if run.is_empty() {
            return Ok(());
        }

        let data = Self::from_run(run)?;
        self.power = self.power.vstack(&data.power)?;
        self.frequency = self.frequency.vstack(&data.frequency)?;
        self.utilization = self.utilization.vstack(&data.utilization)?;
        Ok(())
    }

    /// Replace every label found in `renames`; other labels are left as they are.
    pub fn rename_labels(&mut self, renames: &HashMap<String, String>) -> Result<(), AnalysisError> {
        if renames.is_empty() {
            return Ok(());
        }

        for frame in [&mut self.power, &mut self.frequency, &mut self.utilization] {
            let renamed: Vec<Option<String>> = frame
                .column(LABEL)?
                .str()?
                .into_iter()
                .map(|label| label.map(|l| renames.get(l).map_or(l, String::as_str).to_string()))
                .collect();
            frame.with_column(Column::new(LABEL.into(), renamed))?;
        }
        Ok(())
    }

    /// Mutable access to all three tables, in power, frequency, utilization order.
    pub fn frames_mut(&mut self) -> [(&'static str, &mut DataFrame); 3] {
        [
            ("power", &mut self.power),
            ("frequency", &mut self.frequency),
            ("utilization", &mut self.utilization),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::LogExtractor;
    use crate::extractor::tests::{Reading, sample_log};

    fn run(label: &str, samples: i64) -> RunSamples {
        let readings: Vec<Reading> = (0..samples)
            .map(|i| Reading::new(10 + i, 20, 3, 40, 5, 60 + i))
            .collect();
        LogExtractor::new().unwrap().extract(&sample_log(&readings), label).unwrap()
    }

    fn labels(frame: &DataFrame) -> Vec<String> {
        frame
            .column(LABEL)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|l| l.unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_new_tables_are_empty_with_schema() {
        let tables = SampleTables::new().unwrap();
        assert_eq!(tables.height(), 0);
        assert_eq!(tables.power().width(), POWER_METRICS.len() + 2);
        assert_eq!(tables.frequency().width(), FREQUENCY_METRICS.len() + 2);
        assert_eq!(tables.utilization().width(), UTILIZATION_METRICS.len() + 2);
    }

    #[test]
    fn test_append_keeps_rows_in_run_order() {
        let mut tables = SampleTables::new().unwrap();
        tables.append_run(&run("4K-AV1", 3)).unwrap();
        tables.append_run(&run("FHD-VP9", 2)).unwrap();

        assert_eq!(tables.height(), 5);
        assert_eq!(tables.frequency().height(), 5);
        assert_eq!(tables.utilization().height(), 5);
        assert_eq!(
            labels(tables.power()),
            vec!["4K-AV1", "4K-AV1", "4K-AV1", "FHD-VP9", "FHD-VP9"]
        );

        let samples: Vec<u32> = tables
            .power()
            .column(SAMPLE)
            .unwrap()
            .u32()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(samples, vec![1, 2, 3, 1, 2]);

        let other: Vec<i64> = tables
            .power()
            .column("other")
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(other, vec![12, 13, 14, 12, 13]);
    }

    #[test]
    fn test_append_empty_run_is_noop() {
        let mut tables = SampleTables::new().unwrap();
        tables.append_run(&RunSamples::default()).unwrap();
        assert_eq!(tables.height(), 0);
    }

    #[test]
    fn test_rename_labels_in_all_tables() {
        let mut tables = SampleTables::new().unwrap();
        tables.append_run(&run("4K-VP9", 1)).unwrap();
        tables.append_run(&run("Chrome-SW", 1)).unwrap();

        let renames = HashMap::from([("4K-VP9".to_string(), "VLC-SW".to_string())]);
        tables.rename_labels(&renames).unwrap();

        assert_eq!(labels(tables.power()), vec!["VLC-SW", "Chrome-SW"]);
        assert_eq!(labels(tables.frequency()), vec!["VLC-SW", "Chrome-SW"]);
        assert_eq!(labels(tables.utilization()), vec!["VLC-SW", "Chrome-SW"]);
    }
}
