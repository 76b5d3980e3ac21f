use crate::parse::{parse_month_heading, parse_price};
use crate::{Error, FareScope, Result, ScrapeContext, ScrapeRequest, SourceScraper};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use flightscout_core::fares::Fare;

use super::us_date;

const SEARCH_URL: &str = "https://www.southwest.com/cgi-bin/lowFareFinderEntry";
const ONE_WAY: &str = "oneWay";
const ORIGIN: &str = "originAirport_displayed";
const DESTINATION: &str = "destinationAirport_displayed";
const MONTH: &str = "outboundDate";
const SUBMIT: &str = "submitButton";
const MONTH_HEADING: &str = ".carouselTodaySodaIneligible .carouselBody";
const FARE_DAYS: &str = ".fareAvailableDay";

/// southwest.com low fare calendar: every day of the requested month that
/// has a fare
pub struct Southwest;

#[async_trait]
impl SourceScraper for Southwest {
    fn id(&self) -> &'static str {
        "southwest"
    }

    fn scope(&self) -> FareScope {
        FareScope::Month
    }

    async fn scrape(&self, ctx: &ScrapeContext<'_>, request: &ScrapeRequest) -> Result<Vec<Fare>> {
        let locator = ctx.locator();
        let first = request.date.with_day(1).unwrap_or(request.date);

        ctx.navigate(SEARCH_URL).await?;
        locator.by_id(ONE_WAY).await?.click().await?;
        locator
            .by_id(ORIGIN)
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
            .clear()
            .await?
            .type_text(&request.destination)
            .await?
            .press_tab()
            .await?;
        locator.by_id(MONTH).await?.select_option(&us_date(first)).await?;
        ctx.checkpoint().await;
        locator.by_id(SUBMIT).await?.click().await?;

        let heading = locator.by_css(MONTH_HEADING).await?.read_text().await?;
        let month = parse_month_heading(&heading, request.date)?;

        let mut fares = Vec::new();
        for day in locator.all_by_css(FARE_DAYS).await? {
            fares.push(fare_from_day(&day.read_text().await?, month)?);
        }
        Ok(fares)
    }
}

/// Calendar days read `21` on the first line and the fare below it
fn fare_from_day(text: &str, month: NaiveDate) -> Result<Fare> {
    let (day, price) = text
        .trim()
        .split_once('\n')
        .ok_or_else(|| Error::parse("calendar day", text))?;
    let day: u32 = day
        .trim()
        .parse()
        .map_err(|_| Error::parse("calendar day", text))?;
    let date = month
        .with_day(day)
        .ok_or_else(|| Error::parse("calendar day", text))?;
    Ok(Fare::new(parse_price(price)?, date))
}
