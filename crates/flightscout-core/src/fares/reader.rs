use super::types::{ARCHIVE_VERSION, RunArchive};
use crate::{Error, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub struct ArchiveReader;

impl ArchiveReader {
    /// Read, parse and validate a run archive from the given path
    pub fn from_file(path: &Path) -> Result<RunArchive> {
        tracing::debug!("Reading run archive from: {}", path.display());

        let file = File::open(path)?;
        let archive: RunArchive = serde_json::from_reader(BufReader::new(file))?;
        Self::validate(&archive)?;

        tracing::info!(
            "Loaded run {} with {} results",
            archive.run_id,
            archive.results.len()
        );

        Ok(archive)
    }

    /// Parse and validate a run archive from a JSON string
    pub fn from_str(content: &str) -> Result<RunArchive> {
        let archive: RunArchive = serde_json::from_str(content)?;
        Self::validate(&archive)?;
        Ok(archive)
    }

    /// Labels must be unique and non-empty, since the aggregator counts
    /// groups and tags observations by them
    fn validate(archive: &RunArchive) -> Result<()> {
        if archive.version != ARCHIVE_VERSION {
            return Err(Error::InvalidArchive(format!(
                "Unsupported archive version '{}'",
                archive.version
            )));
        }

        let mut labels = HashSet::new();
        for (idx, result) in archive.results.iter().enumerate() {
            if result.label.is_empty() {
                return Err(Error::InvalidArchive(format!(
                    "Result {} has an empty label",
                    idx
                )));
            }
            if result.group.is_empty() {
                return Err(Error::InvalidArchive(format!(
                    "Result '{}' has an empty group",
                    result.label
                )));
            }
            if !labels.insert(result.label.as_str()) {
                return Err(Error::InvalidArchive(format!(
                    "Duplicate result label '{}'",
                    result.label
                )));
            }
            if result.is_failed() && !result.observations.is_empty() {
                tracing::warn!(
                    "Result '{}' is marked failed but carries {} observations",
                    result.label,
                    result.observations.len()
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_archive() {
        let json = r#"{
            "version": "1",
            "run_id": "20261019T063000Z",
            "started_at": "2026-10-19T06:30:00Z",
            "results": [
                {
                    "group": "bing SFO-PHL",
                    "label": "bing SFO-PHL 2026-12-21",
                    "source": "bing",
                    "observations": [{"price": 250, "date": "2026-12-21"}]
                }
            ]
        }"#;

        let archive = ArchiveReader::from_str(json).unwrap();
        assert_eq!(archive.results.len(), 1);
        assert_eq!(archive.results[0].observations[0].price, 250);
        assert!(archive.finished_at.is_none());
    }

    #[test]
    fn test_rejects_duplicate_labels() {
        let json = r#"{
            "version": "1",
            "run_id": "r",
            "started_at": "2026-10-19T06:30:00Z",
            "results": [
                {"group": "g", "label": "same", "source": "aa"},
                {"group": "g", "label": "same", "source": "aa"}
            ]
        }"#;

        let err = ArchiveReader::from_str(json).unwrap_err();
        assert!(matches!(err, Error::InvalidArchive(_)));
        assert!(err.to_string().contains("Duplicate result label 'same'"));
    }

    #[test]
    fn test_rejects_empty_group() {
        let json = r#"{"version": "1", "run_id": "r", "started_at": "2026-10-19T06:30:00Z",
            "results": [{"group": "", "label": "aa SFO-PHL 2026-12-21", "source": "aa"}]}"#;
        let err = ArchiveReader::from_str(json).unwrap_err();
        assert!(err.to_string().contains("empty group"));
    }

    #[test]
    fn test_from_file_rejects_unknown_version() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"version": "0", "run_id": "r", "started_at": "2026-10-19T06:30:00Z", "results": []}}"#
        )
        .unwrap();

        let err = ArchiveReader::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported archive version '0'"));
    }
}
