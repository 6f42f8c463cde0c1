use crate::config::FailurePolicy;
use crate::extractor::{LogExtractor, RunSamples, decode_lossy};
use crate::sample_tables::SampleTables;
use crate::utils::errors::AnalysisError;
use crate::utils::labels::run_label_for_path;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// A log left out of the session tables.
#[derive(Debug)]
pub struct SkippedLog {
    pub path: PathBuf,
    pub reason: AnalysisError,
}

/// Samples from every parsed log of one directory.
#[derive(Debug)]
pub struct Session {
    pub tables: SampleTables,
    pub parsed: Vec<PathBuf>,
    pub skipped: Vec<SkippedLog>,
}

impl Session {
    fn empty() -> Result<Self, AnalysisError> {
        Ok(Self {
            tables: SampleTables::new()?,
            parsed: Vec::new(),
            skipped: Vec::new(),
        })
    }
}

/// Regular, non-hidden files of `dir`, sorted by name.
pub fn list_logs(dir: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
    let io_err = |source| AnalysisError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut logs = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let hidden = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with('.'));
        if hidden {
            debug!("Ignoring hidden file {}", path.display());
        } else if path.is_file() {
            logs.push(path);
        } else {
            warn!("{} is not a regular file, skipping", path.display());
        }
    }
    logs.sort();
    Ok(logs)
}

/// Read, label and extract a single log file.
pub fn parse_log(extractor: &LogExtractor, path: &Path) -> Result<RunSamples, AnalysisError> {
    let bytes = fs::read(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let content = decode_lossy(&bytes);
    let label = run_label_for_path(path);

    extractor
        .extract(&content, &label)
        .map_err(|source| AnalysisError::Extract {
            path: path.to_path_buf(),
            source,
        })
}

/// Parse every log in `dir` in name order and append the results.
///
/// Files are processed one at a time. A bad file either ends the run or is
/// recorded in [`Session::skipped`], depending on `policy`.
pub fn collect_session(dir: &Path, policy: FailurePolicy) -> Result<Session, AnalysisError> {
    let extractor = LogExtractor::new()?;
    let logs = list_logs(dir)?;
    info!("Found {} log files in {}", logs.len(), dir.display());

    logs.into_iter().try_fold(Session::empty()?, |mut session, path| {
        match parse_log(&extractor, &path) {
            Ok(run) => {
                info!("Parsed {} samples from {}", run.len(), path.display());
                session.tables.append_run(&run)?;
                session.parsed.push(path);
            }
            Err(err) if policy == FailurePolicy::Abort => return Err(err),
            Err(err) => {
                warn!("Skipping log: {}", err);
                session.skipped.push(SkippedLog { path, reason: err });
            }
        }
        Ok(session)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::tests::{Reading, sample_log};
    use crate::sample_tables::LABEL;
    use crate::utils::errors::ExtractError;
    use tempfile::TempDir;

    fn write_log(dir: &TempDir, name: &str, samples: i64) {
        let readings: Vec<Reading> = (0..samples).map(|i| Reading::new(i, i, 1, 2 * i, 1, 10 * i)).collect();
        fs::write(dir.path().join(name), sample_log(&readings)).unwrap();
    }

    fn log_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        write_log(&dir, "Safari-VP9-HW.txt", 2);
        write_log(&dir, "4K-AV1.mp4.txt", 3);
        fs::write(dir.path().join(".DS_Store"), [0u8, 1, 2]).unwrap();
        fs::create_dir(dir.path().join("archive")).unwrap();
        dir
    }

    fn labels(session: &Session) -> Vec<String> {
        session
            .tables
            .power()
            .column(LABEL)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_list_logs_skips_hidden_and_directories() {
        let dir = log_dir();
        let logs = list_logs(dir.path()).unwrap();
        let names: Vec<_> = logs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["4K-AV1.mp4.txt", "Safari-VP9-HW.txt"]);
    }

    #[test]
    fn test_collect_session_appends_in_name_order() {
        let dir = log_dir();
        let session = collect_session(dir.path(), FailurePolicy::Skip).unwrap();

        assert_eq!(session.parsed.len(), 2);
        assert!(session.skipped.is_empty());
        assert_eq!(session.tables.height(), 5);
        assert_eq!(session.tables.frequency().height(), 5);
        assert_eq!(session.tables.utilization().height(), 5);
        assert_eq!(
            labels(&session),
            vec!["4K-AV1", "4K-AV1", "4K-AV1", "Safari-VP9-HW", "Safari-VP9-HW"]
        );
    }

    #[test]
    fn test_misaligned_log_is_skipped() {
        let dir = log_dir();
        let broken = sample_log(&[Reading::new(1, 1, 1, 2, 1, 10), Reading::new(1, 1, 1, 2, 1, 10)])
            .replacen("E-Cluster Power: 1 mW", "", 1);
        fs::write(dir.path().join("FHD-H264.mp4.txt"), broken).unwrap();

        let session = collect_session(dir.path(), FailurePolicy::Skip).unwrap();
        assert_eq!(session.parsed.len(), 2);
        assert_eq!(session.skipped.len(), 1);
        assert!(session.skipped[0].path.ends_with("FHD-H264.mp4.txt"));
        assert!(matches!(
            session.skipped[0].reason,
            AnalysisError::Extract {
                source: ExtractError::ColumnMismatch { table: "power", .. },
                ..
            }
        ));
        assert!(!labels(&session).iter().any(|l| l == "FHD-H264"));
    }

    #[test]
    fn test_abort_policy_stops_at_bad_log() {
        let dir = log_dir();
        fs::write(dir.path().join("Chrome-SW.txt"), "GPU active residency: 1.0%\n").unwrap();

        let err = collect_session(dir.path(), FailurePolicy::Abort).unwrap_err();
        match err {
            AnalysisError::Extract { path, .. } => assert!(path.ends_with("Chrome-SW.txt")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let dir = TempDir::new().unwrap();
        let mut bytes = vec![0xc3, 0x28];
        bytes.extend_from_slice(sample_log(&[Reading::new(12, 5, 3, 17, 4, 28)]).as_bytes());
        fs::write(dir.path().join("4K-VP9.webm.txt"), bytes).unwrap();

        let session = collect_session(dir.path(), FailurePolicy::Abort).unwrap();
        assert_eq!(session.tables.height(), 1);
        assert_eq!(labels(&session), vec!["4K-VP9"]);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let err = collect_session(Path::new("/nonexistent/powermetric-logs"), FailurePolicy::Skip)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Io { .. }));
    }

    #[test]
    fn test_empty_directory_gives_empty_tables() {
        let dir = TempDir::new().unwrap();
        let session = collect_session(dir.path(), FailurePolicy::Abort).unwrap();
        assert_eq!(session.tables.height(), 0);
        assert!(session.parsed.is_empty());
    }
}
