use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use flightscout_browser::{Driver, Locator};
use flightscout_core::fares::{Artifact, Fare};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Which dates a source reports fares for, relative to the requested date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FareScope {
    /// Only the requested date
    Day,
    /// Every date within this many days either side of the requested date
    Window(u32),
    /// Every date of the requested date's month
    Month,
}

impl FareScope {
    pub fn covers(&self, requested: NaiveDate, date: NaiveDate) -> bool {
        match self {
            FareScope::Day => date == requested,
            FareScope::Window(days) => (date - requested).num_days().unsigned_abs() <= *days as u64,
            FareScope::Month => date.year() == requested.year() && date.month() == requested.month(),
        }
    }
}

impl fmt::Display for FareScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FareScope::Day => write!(f, "requested day"),
            FareScope::Window(days) => write!(f, "±{} days", days),
            FareScope::Month => write!(f, "whole month"),
        }
    }
}

/// Per-source search options, e.g. `{"nearby": true}` or `{"dist_org": 60}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceOptions(BTreeMap<String, Value>);

impl SourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Parse `name=value` as given on the command line; the value is read
    /// as JSON when it parses, otherwise kept as a string
    pub fn insert_pair(&mut self, pair: &str) -> Result<()> {
        let (name, raw) = pair
            .split_once('=')
            .ok_or_else(|| Error::Plan(format!("option {:?} is not name=value", pair)))?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        self.0.insert(name.trim().to_string(), value);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Boolean option; absent means false
    pub fn flag(&self, scraper: &str, name: &str) -> Result<bool> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => match s.to_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(true),
                "false" | "no" | "0" => Ok(false),
                _ => Err(Error::invalid_option(
                    scraper,
                    format!("{} must be true or false, got {:?}", name, s),
                )),
            },
            Some(Value::Number(n)) if n.as_u64() == Some(0) => Ok(false),
            Some(Value::Number(n)) if n.as_u64() == Some(1) => Ok(true),
            Some(other) => Err(Error::invalid_option(
                scraper,
                format!("{} must be true or false, got {}", name, other),
            )),
        }
    }

    /// Unsigned number option; absent means `default`
    pub fn number(&self, scraper: &str, name: &str, default: u32) -> Result<u32> {
        let invalid = |v: &dyn fmt::Display| {
            Error::invalid_option(scraper, format!("{} must be a whole number, got {}", name, v))
        };
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Number(n)) => n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| invalid(n)),
            Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid(s)),
            Some(other) => Err(invalid(other)),
        }
    }

    /// Reject option names the scraper does not understand
    pub fn ensure_known(&self, scraper: &str, known: &[&str]) -> Result<()> {
        match self.names().find(|name| !known.contains(name)) {
            Some(name) if known.is_empty() => Err(Error::invalid_option(
                scraper,
                format!("{} takes no options, got {}", scraper, name),
            )),
            Some(name) => Err(Error::invalid_option(
                scraper,
                format!("unknown option {} (accepted: {})", name, known.join(", ")),
            )),
            None => Ok(()),
        }
    }
}

impl fmt::Display for SourceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self.0.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{}", pairs.join(" "))
    }
}

/// One search handed to a scraper
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeRequest {
    /// Three-letter airport code, upper case
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
    pub options: SourceOptions,
}

/// What a scraper sees of the run: the located page and a screenshot hook
pub struct ScrapeContext<'a> {
    locator: Locator<'a>,
    label: String,
    screenshot_dir: Option<PathBuf>,
    artifacts: Mutex<Vec<Artifact>>,
}

impl<'a> ScrapeContext<'a> {
    pub fn new(locator: Locator<'a>, label: impl Into<String>) -> Self {
        Self {
            locator,
            label: label.into(),
            screenshot_dir: None,
            artifacts: Mutex::new(Vec::new()),
        }
    }

    /// Save checkpoint screenshots into `dir`
    pub fn with_screenshots(mut self, dir: Option<&Path>) -> Self {
        self.screenshot_dir = dir.map(Path::to_path_buf);
        self
    }

    pub fn locator(&self) -> &Locator<'a> {
        &self.locator
    }

    pub fn driver(&self) -> &'a dyn Driver {
        self.locator.driver()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub async fn navigate(&self, url: &str) -> Result<()> {
        tracing::debug!("{}: opening {}", self.label, url);
        self.driver().navigate(url).await?;
        Ok(())
    }

    /// Called once the search form is filled, right before submitting it
    pub async fn checkpoint(&self) {
        self.capture("presubmit").await;
    }

    /// Screenshot the page as `<label> <stage>.png`. A failed capture is
    /// logged and otherwise ignored.
    pub async fn capture(&self, stage: &str) {
        let Some(dir) = &self.screenshot_dir else {
            return;
        };
        let name = format!("{} {}", self.label, stage);
        let path = dir.join(format!("{}.png", name));

        match self.driver().screenshot(&path).await {
            Ok(()) => {
                let mut artifacts = self.artifacts.lock().unwrap_or_else(|e| e.into_inner());
                if !artifacts.iter().any(|a| a.path == path) {
                    artifacts.push(Artifact { name, path });
                }
            }
            Err(e) => tracing::warn!("{}: {} screenshot failed: {}", self.label, stage, e),
        }
    }

    pub fn take_artifacts(&self) -> Vec<Artifact> {
        std::mem::take(&mut *self.artifacts.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

/// One airline integration
#[async_trait]
pub trait SourceScraper: Send + Sync {
    /// Registry key, also the first word of every group and label
    fn id(&self) -> &'static str;

    fn scope(&self) -> FareScope;

    /// Option names `scrape` understands
    fn options(&self) -> &'static [&'static str] {
        &[]
    }

    /// Checked once before any navigation; a rejected item is never retried
    fn validate(&self, options: &SourceOptions) -> Result<()> {
        options.ensure_known(self.id(), self.options())
    }

    /// Fill the airline's search form and read back the fares it shows.
    ///
    /// Every returned fare carries the date the page reports for it.
    async fn scrape(&self, ctx: &ScrapeContext<'_>, request: &ScrapeRequest) -> Result<Vec<Fare>>;
}
