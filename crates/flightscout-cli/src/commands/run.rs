//! The `run` command: scrape every work item, archive the results, render
//! the fare calendar and optionally mail the summary.

use crate::commands::report::{self, Layout};
use crate::OUTPUT_DIR_ENV;
use crate::notify::{self, FAILURE_SUBJECT, Mail};
use anyhow::{Result, anyhow, bail};
use chrono::{Local, NaiveDate, Utc, Weekday};
use clap::Args;
use flightscout_browser::{BrowserSession, LocateOptions, ProfileManager, RetryPolicy, SessionOptions};
use flightscout_core::fares::{ArchiveWriter, RawResult, RunArchive};
use flightscout_core::report::CalendarMonth;
use flightscout_sources::{Orchestrator, Search, SourceOptions, SourceRegistry, WorkItem, WorkPlan};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// JSON plan file listing the searches to run
    #[arg(long, value_name = "FILE", conflicts_with_all = ["sources", "date"])]
    pub plan: Option<PathBuf>,

    /// Source to search (repeatable, see `flightscout sources`)
    #[arg(short, long = "source", value_name = "ID")]
    pub sources: Vec<String>,

    /// Origin airport code (repeatable)
    #[arg(long = "origin", value_name = "CODE")]
    pub origins: Vec<String>,

    /// Destination airport code (repeatable)
    #[arg(long = "destination", value_name = "CODE")]
    pub destinations: Vec<String>,

    /// Travel date (YYYY-MM-DD)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Also search this many days either side of --date
    #[arg(long, default_value_t = 0)]
    pub window: u32,

    /// Source option as name=value, or source:name=value for one source only
    #[arg(long = "option", value_name = "NAME=VALUE")]
    pub options: Vec<String>,

    /// Directory for archives, screenshots and reports [default: ~/.flightscout]
    #[arg(short, long, env = OUTPUT_DIR_ENV)]
    pub output_dir: Option<PathBuf>,

    /// Path to the Chrome binary
    #[arg(long, env = "FLIGHTSCOUT_CHROME")]
    pub chrome: Option<PathBuf>,

    /// Persistent Chrome profile name (temporary profile if omitted)
    #[arg(long)]
    pub profile: Option<String>,

    /// Chrome remote debugging port
    #[arg(long, default_value_t = 9222)]
    pub port: u16,

    /// Visible browser, no retries on errors, browser kept open after failures
    #[arg(short, long)]
    pub debug: bool,

    /// Skip pre- and post-submit screenshots
    #[arg(long)]
    pub no_screenshots: bool,

    /// Comma-separated addresses to mail the summary to; printed otherwise
    #[arg(short = 'T', long, env = "FLIGHTSCOUT_MAILTO")]
    pub mailto: Option<String>,

    /// Sender address [default: <user>@<hostname>]
    #[arg(short = 'F', long, env = "FLIGHTSCOUT_MAILFROM")]
    pub mailfrom: Option<String>,

    /// Seconds to wait for an element before giving up on an attempt
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,

    /// Attempts per work item
    #[arg(long, default_value_t = 3)]
    pub attempts: u32,

    /// Upper bound on one attempt, in seconds (0 for none)
    #[arg(long, default_value_t = 300)]
    pub attempt_budget: u64,

    /// First day of the calendar week
    #[arg(long, default_value = "sunday")]
    pub week_start: Weekday,

    /// Report title
    #[arg(long, default_value = "Flight fares")]
    pub title: String,
}

impl RunArgs {
    /// Work items from `--plan`, or from the search flags
    pub fn work_items(&self) -> Result<Vec<WorkItem>> {
        if let Some(plan) = &self.plan {
            return Ok(WorkPlan::from_file(plan)?.expand()?);
        }
        if self.sources.is_empty() {
            bail!("Nothing to search: give --plan, or --source with --origin, --destination and --date");
        }
        let date = self
            .date
            .ok_or_else(|| anyhow!("--date is required unless --plan is given"))?;

        let (shared, per_source) = self.parse_options()?;
        let searches = self
            .sources
            .iter()
            .map(|source| -> Result<Search> {
                let mut options = shared.clone();
                for pair in per_source.get(source.as_str()).into_iter().flatten() {
                    options.insert_pair(pair)?;
                }
                Ok(Search {
                    source: source.clone(),
                    origins: self.origins.clone(),
                    destinations: self.destinations.clone(),
                    dates: Vec::new(),
                    date: Some(date),
                    window: self.window,
                    options,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(WorkPlan { searches }.expand()?)
    }

    /// Split `--option` values into those for every source and those
    /// prefixed with a source id
    fn parse_options(&self) -> Result<(SourceOptions, BTreeMap<&str, Vec<&str>>)> {
        let mut shared = SourceOptions::new();
        let mut per_source: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for raw in &self.options {
            match raw.split_once(':') {
                Some((source, pair)) if !source.contains('=') => {
                    per_source.entry(source).or_default().push(pair);
                }
                _ => shared.insert_pair(raw)?,
            }
        }
        Ok((shared, per_source))
    }

    fn retry_policy(&self) -> RetryPolicy {
        let budget = (self.attempt_budget > 0).then(|| Duration::from_secs(self.attempt_budget));
        RetryPolicy::default()
            .with_max_attempts(self.attempts)
            .with_attempt_budget(budget)
            .with_debug(self.debug)
    }

    /// Months of every requested date, so failed searches still get a grid
    fn months(items: &[WorkItem]) -> Vec<CalendarMonth> {
        let mut months: Vec<CalendarMonth> = items
            .iter()
            .map(|item| CalendarMonth::containing(item.date))
            .collect();
        months.sort();
        months.dedup();
        months
    }
}

pub fn execute(args: RunArgs) -> Result<()> {
    let items = args.work_items()?;
    let output_dir = crate::output_dir(args.output_dir.clone());
    let mailfrom = args.mailfrom.clone().unwrap_or_else(notify::default_sender);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(scrape_and_report(&args, &items, &output_dir));

    match result {
        Ok(summary) => match &args.mailto {
            Some(to) => {
                let subject = notify::subject_for(&Local::now());
                Mail::new(&mailfrom, to, subject, summary).send()?;
                println!("📧 Summary mailed to {}", to);
                Ok(())
            }
            None => {
                println!();
                print!("{}", summary);
                Ok(())
            }
        },
        Err(e) => {
            if let Some(to) = &args.mailto {
                let body = format!("flightscout run failed:\n\n{:?}\n", e);
                if let Err(mail_err) = Mail::new(&mailfrom, to, FAILURE_SUBJECT, body).send() {
                    tracing::error!("Could not send failure mail: {:#}", mail_err);
                }
            }
            Err(e)
        }
    }
}

/// Scrape, archive and render; returns the plaintext summary
async fn scrape_and_report(args: &RunArgs, items: &[WorkItem], output_dir: &Path) -> Result<String> {
    let started_at = Utc::now();
    let registry = SourceRegistry::builtin();
    for source in items.iter().map(|i| i.source.as_str()) {
        if !registry.contains(source) {
            println!("⚠️  Unknown source '{}' will be reported as failed", source);
        }
    }

    println!("🔍 Locating Chrome...");
    let profile = args
        .profile
        .as_deref()
        .map(|name| ProfileManager::named(name).map(|p| p.path().to_path_buf()))
        .transpose()?;
    let session = BrowserSession::launch(SessionOptions {
        chrome_path: args.chrome.clone(),
        profile,
        headless: !args.debug,
        debugging_port: args.port,
        ..SessionOptions::default()
    })
    .await?;
    println!("✅ Browser ready");

    let run_id = RunArchive::new(started_at, Vec::new()).run_id;
    let mut orchestrator = Orchestrator::new(session.driver(), &registry)
        .with_retry(args.retry_policy())
        .with_locate_options(LocateOptions::default().with_timeout(Duration::from_secs(args.timeout)));
    if !args.no_screenshots {
        orchestrator = orchestrator.with_screenshots(output_dir.join("screenshots").join(&run_id));
    }

    let progress = ProgressBar::new(items.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}")?.progress_chars("=> "),
    );
    progress.enable_steady_tick(Duration::from_millis(200));

    let outcome = tokio::select! {
        results = orchestrator.run_observed(items, |item, result| {
            progress.println(status_line(item, result));
            progress.inc(1);
        }) => Some(results),
        _ = tokio::signal::ctrl_c() => None,
    };
    progress.finish_and_clear();

    let Some(results) = outcome else {
        println!("\n🛑 Interrupted, closing browser...");
        session.shutdown().await;
        bail!("Run interrupted");
    };

    let archive = RunArchive::new(started_at, results).finished(Utc::now());
    let failed = archive.failed_count();

    if args.debug && failed > 0 {
        println!("🐞 {} search(es) failed; browser left open. Press any key to close it.", failed);
        tokio::task::spawn_blocking(|| console::Term::stdout().read_key()).await??;
    }
    session.shutdown().await;

    let archive_path = ArchiveWriter::store(&archive, output_dir)?;
    println!("💾 Results archived to: {}", archive_path.display());

    let layout = Layout {
        title: args.title.clone(),
        months: RunArgs::months(items),
        week_start: args.week_start,
    };
    let (report, files) = report::render(&archive.results, &layout, output_dir)?;
    println!("✅ Report written to: {}", files.html.display());
    if failed > 0 {
        println!("⚠️  {} of {} searches failed", failed, archive.results.len());
    }

    Ok(report.text)
}

fn status_line(item: &WorkItem, result: &RawResult) -> String {
    match (&result.failure, result.best_price()) {
        (Some(failure), _) => format!("❌ {}: failed after {} attempt(s)", item.label(), failure.attempts),
        (None, Some(best)) => format!(
            "✅ {}: {} fare(s), best ${}",
            item.label(),
            result.observations.len(),
            best
        ),
        (None, None) => format!("➖ {}: no fares found", item.label()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        run: RunArgs,
    }

    fn parse(args: &[&str]) -> RunArgs {
        Harness::parse_from(std::iter::once("flightscout").chain(args.iter().copied())).run
    }

    #[test]
    fn test_items_from_flags() {
        let args = parse(&[
            "--source", "bing", "--source", "delta",
            "--origin", "sfo", "--destination", "phl",
            "--date", "2026-12-21", "--window", "1",
            "--option", "delta:nearby=true",
        ]);

        let items = args.work_items().unwrap();
        assert_eq!(items.len(), 6);
        assert_eq!(items[0].label(), "bing SFO-PHL 2026-12-20");
        assert_eq!(items[5].label(), "delta SFO-PHL 2026-12-22");
        assert!(items[0].options.is_empty());
        assert!(items[5].options.flag("delta", "nearby").unwrap());
    }

    #[test]
    fn test_items_need_a_search() {
        assert!(parse(&[]).work_items().is_err());
        assert!(parse(&["--source", "bing", "--origin", "sfo", "--destination", "phl"])
            .work_items()
            .is_err());
    }

    #[test]
    fn test_retry_policy_from_flags() {
        let policy = parse(&["--debug", "--attempts", "5", "--attempt-budget", "0"]).retry_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.attempt_budget, None);
        assert!(policy.debug);
    }

    #[test]
    fn test_months_cover_requested_dates() {
        let items = vec![
            WorkItem::new("bing", "sfo", "phl", NaiveDate::from_ymd_opt(2027, 1, 2).unwrap()),
            WorkItem::new("bing", "sfo", "phl", NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()),
            WorkItem::new("aa", "sfo", "phl", NaiveDate::from_ymd_opt(2026, 12, 30).unwrap()),
        ];
        let months = RunArgs::months(&items);
        assert_eq!(
            months,
            vec![CalendarMonth::new(2026, 12).unwrap(), CalendarMonth::new(2027, 1).unwrap()]
        );
    }
}
