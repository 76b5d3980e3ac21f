use anyhow::Result;
use flightscout_sources::SourceRegistry;

/// List registered sources with the dates they report and their options
pub fn execute() -> Result<()> {
    let registry = SourceRegistry::builtin();

    println!("Available sources:");
    println!();
    for scraper in registry.iter() {
        let options = scraper.options();
        let options = if options.is_empty() {
            "-".to_string()
        } else {
            options.join(", ")
        };
        println!(
            "  {:<14} {:<14} options: {}",
            scraper.id(),
            scraper.scope().to_string(),
            options
        );
    }

    Ok(())
}
