use crate::driver::{Driver, NativeElement, Query};
use crate::element::ElementHandle;
use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How patiently to look for an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocateOptions {
    /// Keep polling until found or `timeout` elapses; when off, look up once
    /// and hand back an absent handle on a miss
    pub wait: bool,
    pub timeout: Duration,
    /// Hand back an absent handle instead of a timeout once `timeout` elapses
    pub allow_missing: bool,
    /// For multi-element lookups, accept zero matches as an answer
    pub permit_empty: bool,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            wait: true,
            timeout: DEFAULT_TIMEOUT,
            allow_missing: false,
            permit_empty: false,
        }
    }
}

impl LocateOptions {
    /// Single lookup, absent handle when nothing matches
    pub fn optional() -> Self {
        Self {
            wait: false,
            allow_missing: true,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn allowing_missing(mut self) -> Self {
        self.allow_missing = true;
        self
    }

    pub fn permitting_empty(mut self) -> Self {
        self.permit_empty = true;
        self
    }
}

enum Poll<T> {
    Found(T),
    Missing,
}

/// Looks up elements, retrying "not found" until a deadline.
///
/// Pages render asynchronously, so a miss usually means "not yet". The
/// locator polls at a fixed interval and only escalates to
/// `Error::WorkflowTimeout` once the timeout has fully elapsed.
pub struct Locator<'a> {
    driver: &'a dyn Driver,
    poll_interval: Duration,
    defaults: LocateOptions,
}

impl<'a> Locator<'a> {
    pub fn new(driver: &'a dyn Driver) -> Self {
        Self {
            driver,
            poll_interval: DEFAULT_POLL_INTERVAL,
            defaults: LocateOptions::default(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_defaults(mut self, defaults: LocateOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn driver(&self) -> &'a dyn Driver {
        self.driver
    }

    pub fn defaults(&self) -> LocateOptions {
        self.defaults
    }

    pub async fn locate(&self, query: Query, options: LocateOptions) -> Result<ElementHandle> {
        let found = self
            .poll(&query, &options, || self.try_one(&query))
            .await?;

        match found {
            Poll::Found(element) => Ok(ElementHandle::present(
                element,
                query,
                self.poll_interval,
            )),
            // only reached with `wait` off or absence tolerated
            Poll::Missing => {
                tracing::debug!("{} not present, continuing without it", query);
                Ok(ElementHandle::absent(query))
            }
        }
    }

    pub async fn locate_all(
        &self,
        query: Query,
        options: LocateOptions,
    ) -> Result<Vec<ElementHandle>> {
        let found = self
            .poll(&query, &options, || {
                self.try_all(&query, options.permit_empty)
            })
            .await?;

        match found {
            Poll::Found(elements) => Ok(elements
                .into_iter()
                .map(|el| ElementHandle::present(el, query.clone(), self.poll_interval))
                .collect()),
            Poll::Missing => Ok(Vec::new()),
        }
    }

    pub async fn by_id(&self, id: &str) -> Result<ElementHandle> {
        self.locate(Query::id(id), self.defaults).await
    }

    pub async fn by_name(&self, name: &str) -> Result<ElementHandle> {
        self.locate(Query::name(name), self.defaults).await
    }

    pub async fn by_xpath(&self, xpath: &str) -> Result<ElementHandle> {
        self.locate(Query::xpath(xpath), self.defaults).await
    }

    pub async fn by_css(&self, selector: &str) -> Result<ElementHandle> {
        self.locate(Query::css(selector), self.defaults).await
    }

    /// Look up once; absent handle if the element is not there
    pub async fn optional(&self, query: Query) -> Result<ElementHandle> {
        self.locate(query, LocateOptions::optional()).await
    }

    pub async fn all_by_xpath(&self, xpath: &str) -> Result<Vec<ElementHandle>> {
        self.locate_all(Query::xpath(xpath), self.defaults).await
    }

    pub async fn all_by_css(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        self.locate_all(Query::css(selector), self.defaults).await
    }

    async fn try_one(&self, query: &Query) -> Result<Option<Box<dyn NativeElement>>> {
        match self.driver.find(query).await {
            Ok(element) => Ok(Some(element)),
            Err(Error::ElementNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn try_all(
        &self,
        query: &Query,
        permit_empty: bool,
    ) -> Result<Option<Vec<Box<dyn NativeElement>>>> {
        let elements = match self.driver.find_all(query).await {
            Ok(elements) => elements,
            Err(Error::ElementNotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        if elements.is_empty() && !permit_empty {
            Ok(None)
        } else {
            Ok(Some(elements))
        }
    }

    async fn poll<T, F, Fut>(
        &self,
        query: &Query,
        options: &LocateOptions,
        mut attempt: F,
    ) -> Result<Poll<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let started = Instant::now();
        let mut polls = 0u32;

        loop {
            polls += 1;
            if let Some(found) = attempt().await? {
                if polls > 1 {
                    tracing::debug!("Found {} after {} polls", query, polls);
                }
                return Ok(Poll::Found(found));
            }
            if !options.wait {
                return Ok(Poll::Missing);
            }

            let waited = started.elapsed();
            if waited >= options.timeout {
                if options.allow_missing {
                    return Ok(Poll::Missing);
                }
                tracing::debug!("Gave up on {} after {} polls", query, polls);
                return Err(Error::timeout(query.to_string(), waited));
            }

            tracing::debug!("{} not found yet (poll {})", query, polls);
            sleep(self.poll_interval.min(options.timeout - waited)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeDriver, FakeElement};

    #[tokio::test(start_paused = true)]
    async fn test_locate_resolves_on_third_poll() {
        let query = Query::id("flightSearchForm.originAirport");
        let driver = FakeDriver::new()
            .with_element(query.clone(), FakeElement::new())
            .appears_after(query.clone(), 2);
        let locator = Locator::new(&driver);
        let started = Instant::now();

        let handle = locator
            .locate(query.clone(), LocateOptions::default().with_timeout(Duration::from_secs(10)))
            .await
            .unwrap();

        assert!(handle.is_present());
        assert_eq!(driver.finds(&query), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_locate_times_out_never_early() {
        let driver = FakeDriver::new();
        let locator = Locator::new(&driver);
        let started = Instant::now();

        let err = locator
            .locate(
                Query::css(".cloudAmt"),
                LocateOptions::default().with_timeout(Duration::from_millis(4500)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::WorkflowTimeout { .. }));
        assert!(started.elapsed() >= Duration::from_millis(4500));
        assert!(started.elapsed() < Duration::from_secs(6));
    }

    #[tokio::test]
    async fn test_optional_returns_absent_handle_without_waiting() {
        let query = Query::id("idclose");
        let driver = FakeDriver::new();
        let locator = Locator::new(&driver);

        let handle = locator.optional(query.clone()).await.unwrap();
        assert!(!handle.is_present());
        assert_eq!(driver.finds(&query), 1);
    }

    #[tokio::test]
    async fn test_no_wait_gives_absent_handle_after_one_lookup() {
        let query = Query::id("idclose");
        let driver = FakeDriver::new();
        let locator = Locator::new(&driver);
        let options = LocateOptions {
            wait: false,
            ..LocateOptions::default()
        };

        let handle = locator.locate(query.clone(), options).await.unwrap();
        assert!(!handle.is_present());
        assert_eq!(driver.finds(&query), 1);

        let handles = locator.locate_all(Query::css(".on"), options).await.unwrap();
        assert!(handles.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_driver_failure_stops_polling() {
        let query = Query::id("leave1");
        let driver = FakeDriver::new().failing_lookups("websocket closed");
        let locator = Locator::new(&driver);
        let started = Instant::now();

        let err = locator
            .locate(query.clone(), LocateOptions::default().allowing_missing())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cdp(_)));
        assert_eq!(driver.finds(&query), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);

        let err = locator.all_by_css(".on").await.unwrap_err();
        assert!(matches!(err, Error::Cdp(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_waiting_with_tolerance_gives_absent_after_timeout() {
        let driver = FakeDriver::new();
        let locator = Locator::new(&driver);
        let options = LocateOptions::default()
            .with_timeout(Duration::from_secs(3))
            .allowing_missing();

        let handle = locator.locate(Query::id("no1"), options).await.unwrap();
        assert!(!handle.is_present());
    }

    #[tokio::test(start_paused = true)]
    async fn test_locate_all_waits_for_first_match() {
        let query = Query::css(".fareAvailableDay");
        let driver = FakeDriver::new()
            .with_elements(query.clone(), vec![FakeElement::new(), FakeElement::new()])
            .appears_after(query.clone(), 1);
        let locator = Locator::new(&driver);

        let handles = locator.all_by_css(".fareAvailableDay").await.unwrap();
        assert_eq!(handles.len(), 2);
        assert_eq!(driver.finds(&query), 2);
    }

    #[tokio::test]
    async fn test_locate_all_permits_empty_when_asked() {
        let driver = FakeDriver::new();
        let locator = Locator::new(&driver);

        let handles = locator
            .locate_all(Query::css(".on"), LocateOptions::default().permitting_empty())
            .await
            .unwrap();
        assert!(handles.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_locate_all_times_out_on_empty() {
        let driver = FakeDriver::new();
        let locator = Locator::new(&driver);

        let err = locator
            .locate_all(
                Query::css(".on"),
                LocateOptions::default().with_timeout(Duration::from_secs(2)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::WorkflowTimeout { .. }));
    }
}
