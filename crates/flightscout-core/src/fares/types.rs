use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Archive format version written by this crate
pub const ARCHIVE_VERSION: &str = "1";

/// A single price a source reported for a single date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fare {
    pub price: u32,
    pub date: NaiveDate,
}

impl Fare {
    pub fn new(price: u32, date: NaiveDate) -> Self {
        Self { price, date }
    }
}

/// A fare tagged with the search that produced it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Observation {
    pub price: u32,
    pub date: NaiveDate,
    pub source_label: String,
    pub source_group: String,
}

/// Why a source produced no usable result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Number of workflow attempts made before giving up
    pub attempts: u32,
    /// Error of the final attempt
    pub error: String,
    /// Errors of every attempt, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<String>,
}

/// A file captured while scraping, e.g. a screenshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub path: PathBuf,
}

/// Outcome of one work item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResult {
    /// Logical search (source x route) this result contributes to
    pub group: String,
    /// Unique label of the work item
    pub label: String,
    /// Registered source identifier
    pub source: String,
    #[serde(default)]
    pub observations: Vec<Fare>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
}

/// Coarse status of a raw result, for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    Fares,
    Empty,
    Failed,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultStatus::Fares => "ok",
            ResultStatus::Empty => "no fares",
            ResultStatus::Failed => "failed",
        }
    }
}

impl RawResult {
    pub fn success(
        group: impl Into<String>,
        label: impl Into<String>,
        source: impl Into<String>,
        observations: Vec<Fare>,
    ) -> Self {
        Self {
            group: group.into(),
            label: label.into(),
            source: source.into(),
            observations,
            failure: None,
            artifacts: Vec::new(),
        }
    }

    pub fn failed(
        group: impl Into<String>,
        label: impl Into<String>,
        source: impl Into<String>,
        failure: FailureRecord,
    ) -> Self {
        Self {
            group: group.into(),
            label: label.into(),
            source: source.into(),
            observations: Vec::new(),
            failure: Some(failure),
            artifacts: Vec::new(),
        }
    }

    pub fn with_artifacts(mut self, artifacts: Vec<Artifact>) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn status(&self) -> ResultStatus {
        if self.is_failed() {
            ResultStatus::Failed
        } else if self.observations.is_empty() {
            ResultStatus::Empty
        } else {
            ResultStatus::Fares
        }
    }

    /// Observations of this result, tagged with its group and label
    pub fn tagged(&self) -> impl Iterator<Item = Observation> + '_ {
        self.observations.iter().map(|fare| Observation {
            price: fare.price,
            date: fare.date,
            source_label: self.label.clone(),
            source_group: self.group.clone(),
        })
    }

    /// Lowest price among this result's observations
    pub fn best_price(&self) -> Option<u32> {
        self.observations.iter().map(|f| f.price).min()
    }
}

/// Everything one run produced, as persisted for later comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunArchive {
    pub version: String,
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub results: Vec<RawResult>,
}

impl RunArchive {
    pub fn new(started_at: DateTime<Utc>, results: Vec<RawResult>) -> Self {
        Self {
            version: ARCHIVE_VERSION.to_string(),
            run_id: started_at.format("%Y%m%dT%H%M%SZ").to_string(),
            started_at,
            finished_at: None,
            results,
        }
    }

    pub fn finished(mut self, at: DateTime<Utc>) -> Self {
        self.finished_at = Some(at);
        self
    }

    /// File name the archive is stored under inside a runs directory
    pub fn file_name(&self) -> String {
        format!("{}.json", self.run_id)
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_failed()).count()
    }
}
