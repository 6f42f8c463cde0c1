use crate::sample_tables::SampleTables;
use crate::utils::errors::AnalysisError;
use log::info;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Write `power.csv`, `frequency.csv` and `utilization.csv` into `dir`.
pub fn write_csv(tables: &mut SampleTables, dir: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
    fs::create_dir_all(dir).map_err(|source| AnalysisError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    for (name, frame) in tables.frames_mut() {
        let path = dir.join(format!("{name}.csv"));
        let mut file = File::create(&path).map_err(|source| AnalysisError::Io {
            path: path.clone(),
            source,
        })?;
        CsvWriter::new(&mut file).include_header(true).finish(frame)?;
        info!("Exported {} rows to {}", frame.height(), path.display());
        written.push(path);
    }
    Ok(written)
}
