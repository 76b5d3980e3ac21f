//! Fare history across persisted runs.
//!
//! Each archived run contributes one point per group: the lowest price any
//! of the group's results observed in that run.

use crate::fares::{ArchiveReader, RunArchive};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use glob::Pattern;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryPoint {
    pub run_started_at: DateTime<Utc>,
    pub group: String,
    pub best_price: u32,
}

/// Load every archive under `dir/runs/`, oldest first
pub fn load_archives(dir: &Path) -> Result<Vec<RunArchive>> {
    let pattern = dir.join("runs").join("*.json");
    let pattern = pattern.to_string_lossy();
    let paths = glob::glob(&pattern)
        .map_err(|e| Error::InvalidPattern(format!("Invalid archive pattern '{}': {}", pattern, e)))?;

    let mut archives = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| Error::Io(e.into_error()))?;
        match ArchiveReader::from_file(&path) {
            Ok(archive) => archives.push(archive),
            Err(e) => tracing::warn!("Skipping unreadable archive {}: {}", path.display(), e),
        }
    }

    archives.sort_by_key(|a| a.started_at);
    tracing::info!("Loaded {} archived runs from {}", archives.len(), dir.display());
    Ok(archives)
}

/// Best price per group per run; groups matching `filter` only, when given
pub fn collect(archives: &[RunArchive], filter: Option<&str>) -> Result<Vec<HistoryPoint>> {
    let filter = filter
        .map(|f| {
            Pattern::new(f)
                .map_err(|e| Error::InvalidPattern(format!("Invalid group pattern '{}': {}", f, e)))
        })
        .transpose()?;

    let mut points = Vec::new();
    for archive in archives {
        let mut best: BTreeMap<&str, u32> = BTreeMap::new();
        for result in &archive.results {
            if filter.as_ref().is_some_and(|p| !p.matches(&result.group)) {
                continue;
            }
            if let Some(price) = result.best_price() {
                best.entry(result.group.as_str())
                    .and_modify(|b| *b = (*b).min(price))
                    .or_insert(price);
            }
        }

        points.extend(best.into_iter().map(|(group, best_price)| HistoryPoint {
            run_started_at: archive.started_at,
            group: group.to_string(),
            best_price,
        }));
    }

    Ok(points)
}

/// Write points as CSV with a header row
pub fn write_csv<W: Write>(points: &[HistoryPoint], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    for point in points {
        csv.serialize(point)?;
    }
    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fares::{ArchiveWriter, Fare, RawResult};
    use chrono::NaiveDate;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    fn run(started: &str, fares: &[(&str, u32)]) -> RunArchive {
        let date = NaiveDate::from_ymd_opt(2026, 12, 21).unwrap();
        let results = fares
            .iter()
            .enumerate()
            .map(|(i, (group, price))| {
                RawResult::success(*group, format!("{} #{}", group, i), "aa", vec![Fare::new(*price, date)])
            })
            .collect();
        RunArchive::new(at(started), results)
    }

    #[test]
    fn test_collect_takes_minimum_per_group() {
        let archives = vec![
            run("2026-10-01T08:00:00Z", &[("aa SFO-PHL", 300), ("aa SFO-PHL", 280), ("bing SFO-PHL", 310)]),
            run("2026-10-02T08:00:00Z", &[("aa SFO-PHL", 260)]),
        ];

        let points = collect(&archives, None).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].group, "aa SFO-PHL");
        assert_eq!(points[0].best_price, 280);
        assert_eq!(points[2].best_price, 260);
    }

    #[test]
    fn test_collect_filters_groups_by_pattern() {
        let archives = vec![run("2026-10-01T08:00:00Z", &[("aa SFO-PHL", 300), ("bing SFO-PHL", 310)])];

        let points = collect(&archives, Some("bing *")).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].group, "bing SFO-PHL");
    }

    #[test]
    fn test_load_archives_sorts_by_start_time() {
        let dir = tempfile::tempdir().unwrap();
        ArchiveWriter::store(&run("2026-10-02T08:00:00Z", &[("aa SFO-PHL", 1)]), dir.path()).unwrap();
        ArchiveWriter::store(&run("2026-10-01T08:00:00Z", &[("aa SFO-PHL", 2)]), dir.path()).unwrap();
        std::fs::write(dir.path().join("runs").join("garbage.json"), "not json").unwrap();

        let archives = load_archives(dir.path()).unwrap();
        assert_eq!(archives.len(), 2);
        assert!(archives[0].started_at < archives[1].started_at);
    }

    #[test]
    fn test_load_archives_skips_invalid_runs() {
        let dir = tempfile::tempdir().unwrap();
        ArchiveWriter::store(&run("2026-10-01T08:00:00Z", &[("aa SFO-PHL", 300)]), dir.path()).unwrap();

        let mut stale = run("2026-10-02T08:00:00Z", &[("aa SFO-PHL", 260)]);
        stale.version = "0".to_string();
        ArchiveWriter::store(&stale, dir.path()).unwrap();

        let archives = load_archives(dir.path()).unwrap();
        assert_eq!(archives.len(), 1);
        assert_eq!(archives[0].started_at, at("2026-10-01T08:00:00Z"));
    }

    #[test]
    fn test_write_csv() {
        let points = vec![HistoryPoint {
            run_started_at: at("2026-10-01T08:00:00Z"),
            group: "aa SFO-PHL".to_string(),
            best_price: 280,
        }];

        let mut buf = Vec::new();
        write_csv(&points, &mut buf).unwrap();
        let csv = String::from_utf8(buf).unwrap();
        assert_eq!(
            csv,
            "run_started_at,group,best_price\n2026-10-01T08:00:00Z,aa SFO-PHL,280\n"
        );
    }
}
