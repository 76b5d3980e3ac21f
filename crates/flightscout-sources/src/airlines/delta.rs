use crate::parse::parse_price;
use crate::{FareScope, Result, ScrapeContext, ScrapeRequest, SourceScraper};
use async_trait::async_trait;
use flightscout_core::fares::Fare;

use super::us_date;

const SEARCH_URL: &str = "https://www.delta.com/booking/searchFlights.do";
const ONE_WAY: &str = "oneway_link";
const ORIGIN: &str = "departureCity_0";
const DESTINATION: &str = "destinationCity_0";
const NEARBY: &str = "flexAirports";
const DEPARTURE_DATE: &str = "departureDate_0";
const SUBMIT: &str = "Go";
const LOWEST_FARE: &str = ".lowest .fares";

/// delta.com one-way search: the lowest fare on the requested day
pub struct Delta;

#[async_trait]
impl SourceScraper for Delta {
    fn id(&self) -> &'static str {
        "delta"
    }

    fn scope(&self) -> FareScope {
        FareScope::Day
    }

    fn options(&self) -> &'static [&'static str] {
        &["nearby"]
    }

    async fn scrape(&self, ctx: &ScrapeContext<'_>, request: &ScrapeRequest) -> Result<Vec<Fare>> {
        let nearby = request.options.flag(self.id(), "nearby")?;
        let locator = ctx.locator();

        ctx.navigate(SEARCH_URL).await?;
        locator.by_id(ONE_WAY).await?.click().await?;
        locator.by_id(ORIGIN).await?.clear().await?.type_text(&request.origin).await?;
        locator
            .by_id(DESTINATION)
            .await?
            .clear()
            .await?
            .type_text(&request.destination)
            .await?;
        if nearby {
            locator.by_id(NEARBY).await?.toggle_to(true).await?;
        }
        locator
            .by_id(DEPARTURE_DATE)
            .await?
            .clear()
            .await?
            .type_text(&us_date(request.date))
            .await?;
        ctx.checkpoint().await;
        locator.by_id(SUBMIT).await?.click().await?;

        let text = locator.by_css(LOWEST_FARE).await?.read_text().await?;
        Ok(vec![Fare::new(parse_price(&text)?, request.date)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceOptions;
    use chrono::NaiveDate;
    use flightscout_browser::fake::{FakeDriver, FakeElement};
    use flightscout_browser::{Locator, Query};

    #[tokio::test(start_paused = true)]
    async fn test_scrape_fills_form_and_reads_lowest_fare() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 21).unwrap();
        let origin = FakeElement::new().with_value("previous search");
        let nearby = FakeElement::new().checkbox(true);
        let departure = FakeElement::new();
        let dir = tempfile::tempdir().unwrap();
        let driver = FakeDriver::new()
            .with_element(Query::id(ONE_WAY), FakeElement::new())
            .with_element(Query::id(ORIGIN), origin.clone())
            .with_element(Query::id(DESTINATION), FakeElement::new())
            .with_element(Query::id(NEARBY), nearby.clone())
            .with_element(Query::id(DEPARTURE_DATE), departure.clone())
            .with_element(Query::id(SUBMIT), FakeElement::new())
            .with_element(Query::css(LOWEST_FARE), FakeElement::new().with_text("USD $287"));
        let ctx = ScrapeContext::new(Locator::new(&driver), "delta SFO-PHL 2026-12-21")
            .with_screenshots(Some(dir.path()));
        let request = ScrapeRequest {
            origin: "SFO".into(),
            destination: "PHL".into(),
            date,
            options: SourceOptions::new().with("nearby", true),
        };

        let fares = Delta.scrape(&ctx, &request).await.unwrap();

        assert_eq!(fares, vec![Fare::new(287, date)]);
        assert_eq!(origin.value_now(), "SFO");
        assert_eq!(departure.value_now(), "12/21/2026");
        // already checked, so left alone
        assert_eq!(nearby.clicks(), 0);
        assert_eq!(
            driver.screenshots(),
            vec![dir.path().join("delta SFO-PHL 2026-12-21 presubmit.png")]
        );
    }
}
