use crate::plan::WorkItem;
use crate::{Error, ScrapeContext, SourceRegistry, SourceScraper};
use flightscout_browser::{DEFAULT_POLL_INTERVAL, Driver, LocateOptions, Locator, RetryPolicy};
use flightscout_core::fares::{FailureRecord, RawResult};
use std::path::PathBuf;
use std::time::Duration;

/// Runs work items one after another against a single browser page
pub struct Orchestrator<'a> {
    driver: &'a dyn Driver,
    registry: &'a SourceRegistry,
    retry: RetryPolicy,
    locate: LocateOptions,
    poll_interval: Duration,
    screenshot_dir: Option<PathBuf>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(driver: &'a dyn Driver, registry: &'a SourceRegistry) -> Self {
        Self {
            driver,
            registry,
            retry: RetryPolicy::default(),
            locate: LocateOptions::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            screenshot_dir: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Defaults for every element lookup the scrapers make
    pub fn with_locate_options(mut self, locate: LocateOptions) -> Self {
        self.locate = locate;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Save pre- and post-submit screenshots under `dir`
    pub fn with_screenshots(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = Some(dir.into());
        self
    }

    /// One `RawResult` per item, in item order
    pub async fn run(&self, items: &[WorkItem]) -> Vec<RawResult> {
        self.run_observed(items, |_, _| {}).await
    }

    /// Like [`run`](Self::run), calling `on_result` as each item finishes
    pub async fn run_observed<F>(&self, items: &[WorkItem], mut on_result: F) -> Vec<RawResult>
    where
        F: FnMut(&WorkItem, &RawResult),
    {
        if let Some(dir) = &self.screenshot_dir
            && let Err(e) = std::fs::create_dir_all(dir)
        {
            tracing::warn!("Cannot create screenshot directory {}: {}", dir.display(), e);
        }

        let mut results = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            tracing::info!("[{}/{}] {}", i + 1, items.len(), item.label());
            let result = self.run_item(item).await;
            on_result(item, &result);
            results.push(result);
        }

        let failed = results.iter().filter(|r| r.is_failed()).count();
        tracing::info!(
            "Scraped {} item(s), {} failed",
            results.len(),
            failed
        );
        results
    }

    async fn run_item(&self, item: &WorkItem) -> RawResult {
        let group = item.group();
        let label = item.label();

        let scraper = match self
            .registry
            .get(&item.source)
            .and_then(|s| s.validate(&item.options).map(|_| s))
        {
            Ok(scraper) => scraper,
            Err(e) => {
                tracing::error!("{}: {}", label, e);
                return RawResult::failed(group, label, &item.source, rejected(&e));
            }
        };

        let locator = Locator::new(self.driver)
            .with_poll_interval(self.poll_interval)
            .with_defaults(self.locate);
        let ctx = ScrapeContext::new(locator, label.clone())
            .with_screenshots(self.screenshot_dir.as_deref());
        let request = item.request();

        let ctx_ref = &ctx;
        let request_ref = &request;
        let outcome = self
            .retry
            .run(&label, move |_| async move {
                scraper.scrape(ctx_ref, request_ref).await
            })
            .await;

        ctx.capture("postsubmit").await;
        let artifacts = ctx.take_artifacts();

        match outcome {
            Ok(fares) => {
                let (kept, stray): (Vec<_>, Vec<_>) = fares
                    .into_iter()
                    .partition(|fare| scraper.scope().covers(item.date, fare.date));
                for fare in &stray {
                    tracing::warn!(
                        "{}: dropping ${} on {}, outside {}",
                        label,
                        fare.price,
                        fare.date,
                        scraper.scope()
                    );
                }
                if kept.is_empty() {
                    tracing::info!("{}: no fares found", label);
                } else {
                    tracing::info!("{}: {} fare(s)", label, kept.len());
                }
                RawResult::success(group, label, &item.source, kept).with_artifacts(artifacts)
            }
            Err(failure) => {
                RawResult::failed(group, label, &item.source, failure.into_record())
                    .with_artifacts(artifacts)
            }
        }
    }
}

/// Failure for an item that was never attempted
fn rejected(err: &Error) -> FailureRecord {
    FailureRecord {
        attempts: 0,
        error: err.to_string(),
        history: vec![err.to_string()],
    }
}
