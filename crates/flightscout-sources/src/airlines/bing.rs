use crate::parse::parse_price;
use crate::{FareScope, Result, ScrapeContext, ScrapeRequest, SourceScraper};
use async_trait::async_trait;
use flightscout_browser::Query;
use flightscout_core::fares::Fare;

use super::us_date;

const SEARCH_URL: &str = "https://www.bing.com/travel/flights";
const ONE_WAY: &str = "oneWayLabel";
const ORIGIN: &str = "orig1Text";
const DESTINATION: &str = "dest1Text";
const NEAR_ORIGIN: &str = "no1";
const NEAR_DESTINATION: &str = "ne1";
const DEPARTURE_DATE: &str = "leave1";
const PRICE_PREDICTOR: &str = "PRI-HP";
const SUBMIT: &str = ".sbmtBtn";
const SEARCHING: &str = "searching";
const PRICE: &str = r#"//span[@class="price"]"#;

/// Bing Travel one-way search: the lowest fare on the requested day
pub struct BingTravel;

#[async_trait]
impl SourceScraper for BingTravel {
    fn id(&self) -> &'static str {
        "bing"
    }

    fn scope(&self) -> FareScope {
        FareScope::Day
    }

    fn options(&self) -> &'static [&'static str] {
        &["near_org", "near_dst"]
    }

    async fn scrape(&self, ctx: &ScrapeContext<'_>, request: &ScrapeRequest) -> Result<Vec<Fare>> {
        let near_org = request.options.flag(self.id(), "near_org")?;
        let near_dst = request.options.flag(self.id(), "near_dst")?;
        let locator = ctx.locator();
        let timeout = locator.defaults().timeout;

        ctx.navigate(SEARCH_URL).await?;
        locator.by_id(ONE_WAY).await?.click().await?;
        locator
            .by_id(ORIGIN)
            .await?
            .click()
            .await?
            .clear()
            .await?
            .type_text(&request.origin)
            .await?
            .press_tab()
            .await?;
        locator
            .by_id(DESTINATION)
            .await?
            .click()
            .await?
            .clear()
            .await?
            .type_text(&request.destination)
            .await?
            .press_tab()
            .await?;
        // the nearby checkboxes only render once an airport is recognised
        if near_org {
            locator
                .by_id(NEAR_ORIGIN)
                .await?
                .wait_until_visible(timeout)
                .await?
                .toggle_to(true)
                .await?;
        }
        if near_dst {
            locator
                .by_id(NEAR_DESTINATION)
                .await?
                .wait_until_visible(timeout)
                .await?
                .toggle_to(true)
                .await?;
        }
        locator
            .by_id(DEPARTURE_DATE)
            .await?
            .clear()
            .await?
            .type_text(&us_date(request.date))
            .await?;
        locator.by_id(PRICE_PREDICTOR).await?.toggle_to(false).await?;
        ctx.checkpoint().await;
        locator.by_css(SUBMIT).await?.click().await?;

        locator
            .optional(Query::id(SEARCHING))
            .await?
            .wait_until_hidden(timeout)
            .await?;

        let price = parse_price(&locator.by_xpath(PRICE).await?.read_text().await?)?;
        Ok(vec![Fare::new(price, request.date)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceOptions;
    use chrono::NaiveDate;
    use flightscout_browser::fake::{FakeDriver, FakeElement};
    use flightscout_browser::Locator;

    #[tokio::test(start_paused = true)]
    async fn test_scrape_waits_for_results() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 22).unwrap();
        let near_origin = FakeElement::new().checkbox(false).visible_after(2);
        let predictor = FakeElement::new().checkbox(true);
        let searching = FakeElement::new().hidden();
        let driver = FakeDriver::new()
            .with_element(Query::id(ONE_WAY), FakeElement::new())
            .with_element(Query::id(ORIGIN), FakeElement::new())
            .with_element(Query::id(DESTINATION), FakeElement::new())
            .with_element(Query::id(NEAR_ORIGIN), near_origin.clone())
            .with_element(Query::id(DEPARTURE_DATE), FakeElement::new())
            .with_element(Query::id(PRICE_PREDICTOR), predictor.clone())
            .with_element(Query::css(SUBMIT), FakeElement::new())
            .with_element(Query::id(SEARCHING), searching)
            .with_element(Query::xpath(PRICE), FakeElement::new().with_text("$312"))
            .appears_after(Query::xpath(PRICE), 2);
        let ctx = ScrapeContext::new(Locator::new(&driver), "bing SFO-PHL 2026-12-22");
        let request = ScrapeRequest {
            origin: "SFO".into(),
            destination: "PHL".into(),
            date,
            options: SourceOptions::new().with("near_org", true),
        };

        let fares = BingTravel.scrape(&ctx, &request).await.unwrap();

        assert_eq!(fares, vec![Fare::new(312, date)]);
        assert!(near_origin.selected_now());
        assert!(!predictor.selected_now());
        assert_eq!(driver.finds(&Query::xpath(PRICE)), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_price_times_out() {
        let driver = FakeDriver::new()
            .with_element(Query::id(ONE_WAY), FakeElement::new())
            .with_element(Query::id(ORIGIN), FakeElement::new())
            .with_element(Query::id(DESTINATION), FakeElement::new())
            .with_element(Query::id(DEPARTURE_DATE), FakeElement::new())
            .with_element(Query::id(PRICE_PREDICTOR), FakeElement::new().checkbox(false))
            .with_element(Query::css(SUBMIT), FakeElement::new());
        let ctx = ScrapeContext::new(Locator::new(&driver), "bing SFO-PHL 2026-12-22");
        let request = ScrapeRequest {
            origin: "SFO".into(),
            destination: "PHL".into(),
            date: NaiveDate::from_ymd_opt(2026, 12, 22).unwrap(),
            options: SourceOptions::new(),
        };

        let err = BingTravel.scrape(&ctx, &request).await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Browser(flightscout_browser::Error::WorkflowTimeout { .. })
        ));
    }
}
