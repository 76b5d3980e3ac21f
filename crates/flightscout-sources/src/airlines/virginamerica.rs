use crate::parse::{parse_date, parse_price};
use crate::{Error, FareScope, Result, ScrapeContext, ScrapeRequest, SourceScraper};
use async_trait::async_trait;
use flightscout_core::fares::Fare;

use super::us_date;

const SEARCH_URL: &str = "https://www.virginamerica.com/";
const ONE_WAY: &str = "owRadio";
const DEPARTURE_DATE: &str = "flightSearch.depDate.MMDDYYYY";
const SEARCH: &str = "SearchFlightBt";
const COSTS: &str = r#"//*[@class="fsCarouselCost"]"#;
const DATES: &str = r#"//*[@class="fsCarouselDate"]"#;

/// virginamerica.com date carousel, three days either side of the request.
/// Only serves a handful of airports.
pub struct VirginAmerica;

#[async_trait]
impl SourceScraper for VirginAmerica {
    fn id(&self) -> &'static str {
        "virginamerica"
    }

    fn scope(&self) -> FareScope {
        FareScope::Window(3)
    }

    async fn scrape(&self, ctx: &ScrapeContext<'_>, request: &ScrapeRequest) -> Result<Vec<Fare>> {
        let locator = ctx.locator();

        ctx.navigate(SEARCH_URL).await?;
        locator.by_id(ONE_WAY).await?.click().await?;
        locator
            .by_xpath(&airport_option("flightSearch.origin", &request.origin))
            .await?
            .click()
            .await?;
        locator
            .by_xpath(&airport_option("flightSearch.destination", &request.destination))
            .await?
            .click()
            .await?;
        locator
            .by_name(DEPARTURE_DATE)
            .await?
            .clear()
            .await?
            .type_text(&us_date(request.date))
            .await?
            .press_tab()
            .await?;
        ctx.checkpoint().await;
        locator.by_id(SEARCH).await?.click().await?;

        let costs = locator.all_by_xpath(COSTS).await?;
        let dates = locator.all_by_xpath(DATES).await?;
        if costs.len() != dates.len() {
            return Err(Error::parse(
                "carousel",
                format!("{} prices for {} dates", costs.len(), dates.len()),
            ));
        }

        let mut fares = Vec::with_capacity(costs.len());
        for (cost, date) in costs.iter().zip(&dates) {
            let price = parse_price(&cost.read_text().await?)?;
            let date = parse_date(&date.read_text().await?, request.date)?;
            fares.push(Fare::new(price, date));
        }
        Ok(fares)
    }
}

fn airport_option(select: &str, code: &str) -> String {
    format!(
        r#"//select[@name="{}"]/option[@value="{}"]"#,
        select,
        code.to_uppercase()
    )
}
