use crate::{Error, Result, ScrapeRequest, SourceOptions};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One (source, origin, destination, date) unit of scraping
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    pub source: String,
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
    pub options: SourceOptions,
}

impl WorkItem {
    pub fn new(
        source: impl Into<String>,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> Self {
        Self {
            source: source.into(),
            origin: origin.to_uppercase(),
            destination: destination.to_uppercase(),
            date,
            options: SourceOptions::new(),
        }
    }

    pub fn with_options(mut self, options: SourceOptions) -> Self {
        self.options = options;
        self
    }

    /// The search this item contributes to, e.g. `bing SFO-PHL`
    pub fn group(&self) -> String {
        format!("{} {}-{}", self.source, self.origin, self.destination)
    }

    /// Unique name of the item, e.g. `bing SFO-PHL 2026-12-21`
    pub fn label(&self) -> String {
        format!("{} {}", self.group(), self.date)
    }

    pub fn request(&self) -> ScrapeRequest {
        ScrapeRequest {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            date: self.date,
            options: self.options.clone(),
        }
    }
}

/// Searches to run, as read from a plan file:
///
/// ```json
/// { "searches": [
///     { "source": "bing", "origins": ["sfo"], "destinations": ["phl"],
///       "date": "2026-12-21", "window": 3,
///       "options": { "near_org": true } }
/// ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkPlan {
    pub searches: Vec<Search>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Search {
    pub source: String,
    pub origins: Vec<String>,
    pub destinations: Vec<String>,
    /// Explicit dates; used instead of `date`/`window` when non-empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dates: Vec<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Days either side of `date` to search as well
    #[serde(default)]
    pub window: u32,
    #[serde(default, skip_serializing_if = "SourceOptions::is_empty")]
    pub options: SourceOptions,
}

impl Search {
    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        if !self.dates.is_empty() {
            return Ok(self.dates.clone());
        }
        let center = self
            .date
            .ok_or_else(|| Error::Plan(format!("search for {} has no dates", self.source)))?;
        window_dates(center, self.window)
    }
}

/// `center` and `window` days either side of it, in order
pub fn window_dates(center: NaiveDate, window: u32) -> Result<Vec<NaiveDate>> {
    let days = Days::new(window as u64);
    let first = center.checked_sub_days(days).ok_or_else(|| {
        Error::Plan(format!("window of {} days around {} is out of range", window, center))
    })?;
    Ok(first.iter_days().take(2 * window as usize + 1).collect())
}

impl WorkPlan {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| Error::Plan(format!("{}: {}", path.display(), e)))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Plan(e.to_string()))
    }

    /// Every work item, in plan order: per search, each origin, each
    /// destination, each date. Labels key the run archive, so a plan that
    /// names the same item twice is rejected.
    pub fn expand(&self) -> Result<Vec<WorkItem>> {
        if self.searches.is_empty() {
            return Err(Error::Plan("no searches".to_string()));
        }

        let mut items = Vec::new();
        let mut labels = HashSet::new();
        for search in &self.searches {
            if search.origins.is_empty() || search.destinations.is_empty() {
                return Err(Error::Plan(format!(
                    "search for {} needs at least one origin and destination",
                    search.source
                )));
            }
            let dates = search.dates()?;
            for origin in &search.origins {
                let origin = airport_code(origin)?;
                for destination in &search.destinations {
                    let destination = airport_code(destination)?;
                    if origin == destination {
                        return Err(Error::Plan(format!("{} to itself", origin)));
                    }
                    for date in &dates {
                        let item = WorkItem::new(&search.source, &origin, &destination, *date)
                            .with_options(search.options.clone());
                        if !labels.insert(item.label()) {
                            return Err(Error::Plan(format!("{} is searched twice", item.label())));
                        }
                        items.push(item);
                    }
                }
            }
        }
        Ok(items)
    }
}

/// Normalise a three-letter airport code to upper case
pub fn airport_code(code: &str) -> Result<String> {
    let code = code.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(Error::Plan(format!("{:?} is not a three-letter airport code", code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_group_and_label() {
        let item = WorkItem::new("bing", "sfo", "phl", ymd(2026, 12, 21));
        assert_eq!(item.group(), "bing SFO-PHL");
        assert_eq!(item.label(), "bing SFO-PHL 2026-12-21");
        assert_eq!(item.request().origin, "SFO");
    }

    #[test]
    fn test_expand_plan() {
        let plan = WorkPlan::from_str(
            r#"{ "searches": [
                { "source": "southwest", "origins": ["sfo", "sjc", "oak"],
                  "destinations": ["phl"], "dates": ["2026-12-21"] },
                { "source": "bing", "origins": ["sfo"], "destinations": ["phl"],
                  "date": "2026-12-21", "window": 1,
                  "options": { "near_org": true, "near_dst": true } }
            ] }"#,
        )
        .unwrap();

        let items = plan.expand().unwrap();
        let labels: Vec<String> = items.iter().map(WorkItem::label).collect();
        assert_eq!(
            labels,
            vec![
                "southwest SFO-PHL 2026-12-21",
                "southwest SJC-PHL 2026-12-21",
                "southwest OAK-PHL 2026-12-21",
                "bing SFO-PHL 2026-12-20",
                "bing SFO-PHL 2026-12-21",
                "bing SFO-PHL 2026-12-22",
            ]
        );
        assert!(items[3].options.flag("bing", "near_dst").unwrap());
        assert!(items[0].options.is_empty());
    }

    #[test]
    fn test_plan_errors() {
        let no_dates = r#"{ "searches": [ { "source": "aa", "origins": ["sfo"], "destinations": ["phl"] } ] }"#;
        assert!(matches!(WorkPlan::from_str(no_dates).unwrap().expand(), Err(Error::Plan(_))));

        let bad_code = r#"{ "searches": [ { "source": "aa", "origins": ["sf0"], "destinations": ["phl"], "date": "2026-12-21" } ] }"#;
        let err = WorkPlan::from_str(bad_code).unwrap().expand().unwrap_err();
        assert!(err.to_string().contains("three-letter airport code"));

        assert!(WorkPlan::from_str("{ not json").is_err());
        assert!(WorkPlan::default().expand().is_err());
    }

    #[test]
    fn test_repeated_search_is_rejected() {
        let plan = WorkPlan::from_str(
            r#"{ "searches": [
                { "source": "aa", "origins": ["sfo"], "destinations": ["phl"], "date": "2026-12-21", "window": 1 },
                { "source": "aa", "origins": ["SFO"], "destinations": ["phl"], "dates": ["2026-12-22"] }
            ] }"#,
        )
        .unwrap();

        let err = plan.expand().unwrap_err();
        assert_eq!(err.to_string(), "Invalid plan: aa SFO-PHL 2026-12-22 is searched twice");
    }

    #[test]
    fn test_window_dates() {
        assert_eq!(window_dates(ymd(2026, 12, 31), 0).unwrap(), vec![ymd(2026, 12, 31)]);
        assert_eq!(
            window_dates(ymd(2026, 12, 31), 1).unwrap(),
            vec![ymd(2026, 12, 30), ymd(2026, 12, 31), ymd(2027, 1, 1)]
        );
    }
}
