use anyhow::{Context, Result};
use flightscout_core::history;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Write the best price per search per archived run as CSV
pub fn execute(output_dir: &Path, group: Option<&str>, out: Option<PathBuf>) -> Result<()> {
    let archives = history::load_archives(output_dir)?;
    let points = history::collect(&archives, group)?;

    if points.is_empty() {
        eprintln!(
            "No fare history found in {}",
            output_dir.join("runs").display()
        );
        return Ok(());
    }

    match out {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("Cannot create {}", path.display()))?;
            history::write_csv(&points, file)?;
            println!("✅ Wrote {} history points to {}", points.len(), path.display());
        }
        None => history::write_csv(&points, io::stdout().lock())?,
    }

    Ok(())
}
