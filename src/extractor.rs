use crate::utils::errors::ExtractError;
use itertools::{Itertools, izip};
use regex::Regex;
use std::str::FromStr;

/// One power reading per sampling interval, all values in mW.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerSample {
    pub efficiency_cluster: i64,
    pub performance_cluster: i64,
    pub dram: i64,
    pub cluster: i64,
    pub package: i64,
    pub gpu: i64,
    /// Package power not attributed to clusters, DRAM or GPU. Can be negative.
    pub other: i64,
    pub sample: u32,
    pub label: String,
}

/// Active frequencies in MHz.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencySample {
    pub efficiency_cluster: i64,
    pub performance_cluster: i64,
    pub gpu: i64,
    pub sample: u32,
    pub label: String,
}

/// Active residency percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct UtilizationSample {
    pub efficiency_cluster: f64,
    pub performance_cluster: f64,
    pub gpu: f64,
    pub sample: u32,
    pub label: String,
}

/// Row-aligned samples of a single powermetrics run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunSamples {
    pub power: Vec<PowerSample>,
    pub frequency: Vec<FrequencySample>,
    pub utilization: Vec<UtilizationSample>,
}

impl RunSamples {
    pub fn len(&self) -> usize {
        self.power.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }
}

struct MetricPattern {
    name: &'static str,
    regex: Regex,
}

impl MetricPattern {
    fn new(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            regex: Regex::new(pattern)?,
        })
    }

    /// All readings in document order.
    fn capture_all<T: FromStr>(&self, content: &str) -> Result<Vec<T>, ExtractError> {
        self.regex
            .captures_iter(content)
            .map(|caps| {
                let value = &caps[1];
                value.parse::<T>().map_err(|_| ExtractError::InvalidNumber {
                    metric: self.name,
                    value: value.to_string(),
                })
            })
            .collect()
    }
}

/// Extracts power, frequency and utilization samples from powermetrics text reports.
///
/// Each metric is matched independently over the whole text. Rows are formed
/// by position, so every metric must occur exactly once per sample; any
/// disagreement in counts is returned as an error instead of being aligned.
pub struct LogExtractor {
    e_cluster_power: MetricPattern,
    p_cluster_power: MetricPattern,
    dram_power: MetricPattern,
    clusters_total_power: MetricPattern,
    package_power: MetricPattern,
    gpu_power: MetricPattern,
    e_cluster_frequency: MetricPattern,
    p_cluster_frequency: MetricPattern,
    gpu_frequency: MetricPattern,
    e_cluster_residency: MetricPattern,
    p_cluster_residency: MetricPattern,
    gpu_residency: MetricPattern,
}

impl LogExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            e_cluster_power: MetricPattern::new(
                "E-Cluster Power",
                r"E-Cluster Power:\s*([\d.]+)\s*mW",
            )?,
            p_cluster_power: MetricPattern::new(
                "P-Cluster Power",
                r"P-Cluster Power:\s*([\d.]+)\s*mW",
            )?,
            dram_power: MetricPattern::new("DRAM Power", r"DRAM Power:\s*([\d.]+)\s*mW")?,
            clusters_total_power: MetricPattern::new(
                "Clusters Total Power",
                r"Clusters Total Power:\s*([\d.]+)\s*mW",
            )?,
            package_power: MetricPattern::new(
                "Package Power",
                r"Package Power:\s*([\d.]+)\s*mW",
            )?,
            // The GPU section repeats "GPU Power:"; only the summary line right
            // before "Package Power" belongs to the sample.
            gpu_power: MetricPattern::new(
                "GPU Power",
                r"GPU Power:\s*([\d.]+)\s*mW\r?\nPackage Power",
            )?,
            e_cluster_frequency: MetricPattern::new(
                "E-Cluster HW active frequency",
                r"E-Cluster HW active frequency:\s*([\d.]+)\s*MHz",
            )?,
            p_cluster_frequency: MetricPattern::new(
                "P-Cluster HW active frequency",
                r"P-Cluster HW active frequency:\s*([\d.]+)\s*MHz",
            )?,
            gpu_frequency: MetricPattern::new(
                "GPU active frequency",
                r"GPU active frequency:\s*([\d.]+)\s*MHz",
            )?,
            e_cluster_residency: MetricPattern::new(
                "E-Cluster HW active residency",
                r"E-Cluster HW active residency:\s*([\d.]+)\s*%",
            )?,
            p_cluster_residency: MetricPattern::new(
                "P-Cluster HW active residency",
                r"P-Cluster HW active residency:\s*([\d.]+)\s*%",
            )?,
            gpu_residency: MetricPattern::new(
                "GPU active residency",
                r"GPU active residency:\s*([\d.]+)\s*%",
            )?,
        })
    }

    /// Parse one log's text into row-aligned samples tagged with `label`.
    pub fn extract(&self, content: &str, label: &str) -> Result<RunSamples, ExtractError> {
        let e_power: Vec<i64> = self.e_cluster_power.capture_all(content)?;
        let p_power: Vec<i64> = self.p_cluster_power.capture_all(content)?;
        let dram: Vec<i64> = self.dram_power.capture_all(content)?;
        let cluster: Vec<i64> = self.clusters_total_power.capture_all(content)?;
        let package: Vec<i64> = self.package_power.capture_all(content)?;
        let gpu: Vec<i64> = self.gpu_power.capture_all(content)?;
        ensure_aligned(
            "power",
            &[
                ("efficiency_cluster", e_power.len()),
                ("performance_cluster", p_power.len()),
                ("dram", dram.len()),
                ("cluster", cluster.len()),
                ("package", package.len()),
                ("gpu", gpu.len()),
            ],
        )?;

        let e_freq: Vec<i64> = self.e_cluster_frequency.capture_all(content)?;
        let p_freq: Vec<i64> = self.p_cluster_frequency.capture_all(content)?;
        let gpu_freq: Vec<i64> = self.gpu_frequency.capture_all(content)?;
        ensure_aligned(
            "frequency",
            &[
                ("efficiency_cluster", e_freq.len()),
                ("performance_cluster", p_freq.len()),
                ("gpu", gpu_freq.len()),
            ],
        )?;

        let e_res: Vec<f64> = self.e_cluster_residency.capture_all(content)?;
        let p_res: Vec<f64> = self.p_cluster_residency.capture_all(content)?;
        let gpu_res: Vec<f64> = self.gpu_residency.capture_all(content)?;
        ensure_aligned(
            "utilization",
            &[
                ("efficiency_cluster", e_res.len()),
                ("performance_cluster", p_res.len()),
                ("gpu", gpu_res.len()),
            ],
        )?;

        if package.len() != e_freq.len() || package.len() != e_res.len() {
            return Err(ExtractError::TableMismatch {
                power: package.len(),
                frequency: e_freq.len(),
                utilization: e_res.len(),
            });
        }

        let power = izip!(e_power, p_power, dram, cluster, package, gpu)
            .zip(1u32..)
            .map(|((e, p, dram, cluster, package, gpu), sample)| {
                let other = cluster
                    .checked_add(dram)
                    .and_then(|sum| sum.checked_add(gpu))
                    .and_then(|sum| package.checked_sub(sum))
                    .ok_or(ExtractError::Overflow { sample })?;
                Ok(PowerSample {
                    efficiency_cluster: e,
                    performance_cluster: p,
                    dram,
                    cluster,
                    package,
                    gpu,
                    other,
                    sample,
                    label: label.to_string(),
                })
            })
            .collect::<Result<Vec<_>, ExtractError>>()?;

        let frequency = izip!(e_freq, p_freq, gpu_freq)
            .zip(1u32..)
            .map(|((e, p, gpu), sample)| FrequencySample {
                efficiency_cluster: e,
                performance_cluster: p,
                gpu,
                sample,
                label: label.to_string(),
            })
            .collect();

        let utilization = izip!(e_res, p_res, gpu_res)
            .zip(1u32..)
            .map(|((e, p, gpu), sample)| UtilizationSample {
                efficiency_cluster: e,
                performance_cluster: p,
                gpu,
                sample,
                label: label.to_string(),
            })
            .collect();

        Ok(RunSamples {
            power,
            frequency,
            utilization,
        })
    }
}

fn ensure_aligned(table: &'static str, counts: &[(&'static str, usize)]) -> Result<(), ExtractError> {
    if counts.iter().map(|(_, count)| count).all_equal() {
        Ok(())
    } else {
        Err(ExtractError::ColumnMismatch {
            table,
            counts: counts.to_vec(),
        })
    }
}

/// Decode raw log bytes, dropping invalid UTF-8 sequences.
pub fn decode_lossy(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}
