use anyhow::Result;
use chrono::Weekday;
use flightscout_core::aggregate::aggregate;
use flightscout_core::fares::{ArchiveReader, RawResult};
use flightscout_core::report::{CalendarMonth, RenderOptions, Report, ReportFiles, ReportRenderer};
use std::path::Path;

/// Layout choices shared by `run` and `report`
#[derive(Debug, Clone)]
pub struct Layout {
    pub title: String,
    pub months: Vec<CalendarMonth>,
    pub week_start: Weekday,
}

/// Aggregate `results` and write `report.html` and `summary.txt` to `dir`
pub fn render(results: &[RawResult], layout: &Layout, dir: &Path) -> Result<(Report, ReportFiles)> {
    let index = aggregate(results);
    let renderer = ReportRenderer::new(RenderOptions {
        title: layout.title.clone(),
        months: layout.months.clone(),
        week_start: layout.week_start,
        artifact_root: Some(dir.to_path_buf()),
    });

    let report = renderer.render(&index, results)?;
    let files = report.write_to(dir)?;
    Ok((report, files))
}

/// Re-render the report of an archived run
pub fn execute(archive: &Path, output_dir: &Path, layout: &Layout, print: bool) -> Result<()> {
    println!("📂 Reading {}", archive.display());
    let archive = ArchiveReader::from_file(archive)?;
    println!(
        "📊 Run {}: {} results, {} failed",
        archive.run_id,
        archive.results.len(),
        archive.failed_count()
    );

    let (report, files) = render(&archive.results, layout, output_dir)?;
    println!("✅ Report written to: {}", files.html.display());
    println!("✅ Summary written to: {}", files.text.display());

    if print {
        println!();
        print!("{}", report.text);
    }

    Ok(())
}
