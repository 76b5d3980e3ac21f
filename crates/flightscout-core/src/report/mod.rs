//! Calendar reports over a run's date index.
//!
//! Rendering is a pure function of its inputs: the same index and raw
//! results always produce byte-identical output.

mod calendar;
mod html;
mod text;

pub use calendar::{CalendarMonth, Week, weekday_order};

use crate::Result;
use crate::aggregate::{Completeness, DateIndex};
use crate::fares::RawResult;
use chrono::Weekday;
use std::fs;
use std::path::{Path, PathBuf};

pub const HTML_FILE: &str = "report.html";
pub const TEXT_FILE: &str = "summary.txt";

/// Options controlling how a report is laid out
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub title: String,
    /// Months to draw; when empty, every month with observations is drawn
    pub months: Vec<CalendarMonth>,
    pub week_start: Weekday,
    /// Artifact links in the HTML report are made relative to this directory
    pub artifact_root: Option<PathBuf>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            title: "Flight fares".to_string(),
            months: Vec::new(),
            week_start: Weekday::Sun,
            artifact_root: None,
        }
    }
}

/// Rendered report artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Monospace summary suitable for a plaintext email body
    pub text: String,
    /// Standalone HTML page with calendar grids and the detail table
    pub html: String,
}

/// Paths a report was written to
#[derive(Debug, Clone)]
pub struct ReportFiles {
    pub html: PathBuf,
    pub text: PathBuf,
}

impl Report {
    /// Write `report.html` and `summary.txt` into `dir`
    pub fn write_to(&self, dir: &Path) -> Result<ReportFiles> {
        fs::create_dir_all(dir)?;
        let files = ReportFiles {
            html: dir.join(HTML_FILE),
            text: dir.join(TEXT_FILE),
        };
        fs::write(&files.html, &self.html)?;
        fs::write(&files.text, &self.text)?;
        tracing::info!("Wrote report to {}", files.html.display());
        Ok(files)
    }
}

pub struct ReportRenderer {
    options: RenderOptions,
}

impl ReportRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn render(&self, index: &DateIndex, results: &[RawResult]) -> Result<Report> {
        let months = self.months(index);
        tracing::debug!(
            "Rendering {} month(s) for {} results",
            months.len(),
            results.len()
        );

        let mut summary = String::new();
        text::render(&mut summary, index, results, &months, &self.options)?;

        Ok(Report {
            text: summary,
            html: html::render(index, results, &months, &self.options)?,
        })
    }

    fn months(&self, index: &DateIndex) -> Vec<CalendarMonth> {
        if !self.options.months.is_empty() {
            return self.options.months.clone();
        }
        let mut months: Vec<_> = index.dates().map(CalendarMonth::containing).collect();
        months.dedup();
        months
    }
}

/// Short cell text for a date: `$250` when complete, `(250)` when partial
pub(crate) fn cell_value(completeness: Completeness) -> String {
    match completeness {
        Completeness::NoData => String::new(),
        Completeness::Partial { best, .. } => format!("({})", best),
        Completeness::Complete { best } => format!("${}", best),
    }
}

pub(crate) fn legend(index: &DateIndex) -> String {
    format!(
        "$N = lowest fare with all {} searches reporting; (N) = lowest so far, some searches missing",
        index.total_expected_groups()
    )
}
