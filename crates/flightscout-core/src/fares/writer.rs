use super::types::RunArchive;
use crate::Result;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub struct ArchiveWriter;

impl ArchiveWriter {
    /// Write an archive to a file
    pub fn to_file(archive: &RunArchive, path: &Path) -> Result<()> {
        tracing::debug!("Writing run archive to: {}", path.display());

        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, archive)?;

        tracing::info!(
            "Wrote run {} with {} results to {}",
            archive.run_id,
            archive.results.len(),
            path.display()
        );

        Ok(())
    }

    /// Store an archive under `dir/runs/`, returning the written path
    pub fn store(archive: &RunArchive, dir: &Path) -> Result<PathBuf> {
        let runs = dir.join("runs");
        fs::create_dir_all(&runs)?;
        let path = runs.join(archive.file_name());
        Self::to_file(archive, &path)?;
        Ok(path)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fares::{ArchiveReader, Artifact, FailureRecord, Fare, RawResult};
    use chrono::{DateTime, NaiveDate, Utc};

    fn sample_archive() -> RunArchive {
        let started = DateTime::parse_from_rfc3339("2026-10-19T06:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let dec = |d| NaiveDate::from_ymd_opt(2026, 12, d).unwrap();

        let ok = RawResult::success(
            "united SFO-PHL",
            "united SFO-PHL 2026-12-21",
            "united",
            vec![Fare::new(250, dec(21)), Fare::new(231, dec(22))],
        )
        .with_artifacts(vec![Artifact {
            name: "postsubmit".to_string(),
            path: "screenshots/run/united postsubmit.png".into(),
        }]);
        let failed = RawResult::failed(
            "delta SFO-PHL",
            "delta SFO-PHL 2026-12-21",
            "delta",
            FailureRecord {
                attempts: 3,
                error: "timed out waiting for .lowest .fares".to_string(),
                history: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            },
        );

        RunArchive::new(started, vec![ok, failed]).finished(started)
    }

    #[test]
    fn test_archive_survives_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = sample_archive();

        let path = ArchiveWriter::store(&archive, dir.path()).unwrap();
        assert!(path.ends_with("runs/20261019T063000Z.json"));

        let loaded = ArchiveReader::from_file(&path).unwrap();
        assert_eq!(loaded, archive);
    }

    #[test]
    fn test_archive_file_is_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = ArchiveWriter::store(&sample_archive(), dir.path()).unwrap();

        let json = std::fs::read_to_string(path).unwrap();
        assert!(json.contains("\"version\": \"1\""));
        assert!(json.contains("\"attempts\": 3"));
    }
}
