mod utils {
    pub mod errors;
    pub mod labels;
    pub mod logger;
}

pub mod config;
pub mod export;
pub mod extractor;
pub mod sample_tables;
pub mod session;
pub mod summary;

use chrono::Local;
use clap::Parser;
use config::{AnalyzerConfig, FailurePolicy};
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;
use summary::SessionAverages;
use utils::errors::AnalysisError;

#[derive(Parser, Debug)]
#[command(author, version, about = "Turn powermetrics logs into power, frequency and utilization tables")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory containing one powermetrics log per run
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Directory for CSV exports
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// What to do with a log that cannot be parsed
    #[arg(long, value_enum)]
    on_error: Option<FailurePolicy>,
    /// Default log level when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<AnalyzerConfig, AnalysisError> {
        let mut config = match &self.config {
            Some(path) => AnalyzerConfig::load(path)?,
            None => AnalyzerConfig::default(),
        };
        if let Some(log_dir) = self.log_dir {
            config.log_dir = log_dir;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = Some(output_dir);
        }
        if let Some(on_error) = self.on_error {
            config.on_error = on_error;
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level;
        }
        Ok(config)
    }
}

fn run(config: &AnalyzerConfig) -> Result<(), AnalysisError> {
    let mut session = session::collect_session(&config.log_dir, config.on_error)?;
    if !session.skipped.is_empty() {
        warn!(
            "{} of {} logs were skipped",
            session.skipped.len(),
            session.skipped.len() + session.parsed.len()
        );
    }

    session.tables.rename_labels(&config.labels)?;

    let averages = SessionAverages::from_tables(&session.tables)?;
    info!("Average power (mW):\n{}", averages.power);
    info!("Average frequency (MHz):\n{}", averages.frequency);
    info!("Average active residency (%):\n{}", averages.utilization);

    if let Some(dir) = &config.output_dir {
        export::write_csv(&mut session.tables, dir)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = match args.into_config() {
        Ok(config) => config,
        Err(err) => {
            // the logger is configured from this config, so report directly
            println!("{err}");
            return ExitCode::FAILURE;
        }
    };
    utils::logger::setup_logger(&config.log_level);

    let started = Local::now();
    info!("Starting at {}", started.format("%a %b %e %H:%M:%S %Y"));

    let result = run(&config);

    let ended = Local::now();
    info!("Ending at {}", ended.format("%a %b %e %H:%M:%S %Y"));
    info!(
        "It took {:.2} s to compute",
        (ended - started).num_milliseconds() as f64 / 1000.0
    );

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pmt.toml");
        std::fs::write(
            &path,
            "log_dir = \"from-file\"\nlog_level = \"debug\"\non_error = \"abort\"\n",
        )
        .unwrap();

        let args = Args::try_parse_from([
            "pmt",
            "--config",
            path.to_str().unwrap(),
            "--log-dir",
            "from-cli",
            "--on-error",
            "skip",
            "--output-dir",
            "outputs",
        ])
        .unwrap();
        let config = args.into_config().unwrap();

        assert_eq!(config.log_dir, PathBuf::from("from-cli"));
        assert_eq!(config.on_error, FailurePolicy::Skip);
        assert_eq!(config.output_dir, Some(PathBuf::from("outputs")));
        // not given on the command line, so the file value stays
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_no_config_flag_uses_defaults() {
        let config = Args::try_parse_from(["pmt", "--log-level", "warn"])
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(config.log_dir, PathBuf::from("powermetric-logs"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.on_error, FailurePolicy::Skip);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args = Args::try_parse_from(["pmt", "--config", "/nonexistent/pmt.toml"]).unwrap();
        assert!(matches!(args.into_config(), Err(AnalysisError::Config(_))));
    }
}
