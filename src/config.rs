use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// What to do with a log file that cannot be read or parsed.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the file and reason, leave it out of the tables and continue.
    #[default]
    Skip,
    /// Stop the run at the first bad file.
    Abort,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    #[serde(default = "defaults::log_dir")]
    pub log_dir: PathBuf,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    #[serde(default)]
    pub on_error: FailurePolicy,
    /// Presentation names for run labels.
    #[serde(default = "defaults::labels")]
    pub labels: HashMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

mod defaults {
    use std::collections::HashMap;
    use std::path::PathBuf;

    pub fn log_dir() -> PathBuf {
        PathBuf::from("powermetric-logs")
    }

    pub fn log_level() -> String {
        "info".into()
    }

    pub fn labels() -> HashMap<String, String> {
        [
            ("4K-VP9", "VLC-SW"),
            ("Chrome-HW-YT-4K", "Chrome-HW"),
            ("Safari-HW-YT-4K", "Safari-HW"),
            ("Safari-Netflix-1080p", "Safari (H.265 1080p)"),
            ("Chrome-Netflix-720p", "Chrome (VP9 720p)"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            log_dir: defaults::log_dir(),
            output_dir: None,
            log_level: defaults::log_level(),
            on_error: FailurePolicy::default(),
            labels: defaults::labels(),
        }
    }
}

impl AnalyzerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
