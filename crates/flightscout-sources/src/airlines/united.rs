use crate::parse::{parse_date, parse_price};
use crate::{FareScope, Result, ScrapeContext, ScrapeRequest, SourceScraper};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use flightscout_core::fares::Fare;

use super::short_date;

const SEARCH_URL: &str = "https://www.united.com/web/en-US/default.aspx";
const ONE_WAY: &str = "ctl00_ContentInfo_Booking1_rdoSearchType2";
const ORIGIN: &str = "ctl00_ContentInfo_Booking1_Origin_txtOrigin";
const DESTINATION: &str = "ctl00_ContentInfo_Booking1_Destination_txtDestination";
const NEARBY: &str = "ctl00_ContentInfo_Booking1_Nearbyair_chkFltOpt";
const ALT_DATES: &str = "ctl00_ContentInfo_Booking1_AltDate_chkFltOpt";
const FLEXIBLE: &str = "ctl00_ContentInfo_Booking1_DepDateTime_rdoDateFlex";
const MONTH: &str = "ctl00_ContentInfo_Booking1_DepDateTime_MonthList1_cboMonth";
const SEARCH: &str = "ctl00_ContentInfo_Booking1_btnSearchFlight";
const FARE_CELLS: &str = ".on";

/// united.com flexible-month search: the lowest fare for each day of the month
pub struct United;

#[async_trait]
impl SourceScraper for United {
    fn id(&self) -> &'static str {
        "united"
    }

    fn scope(&self) -> FareScope {
        FareScope::Month
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
        locator.by_id(ALT_DATES).await?.toggle_to(true).await?;
        locator.by_id(FLEXIBLE).await?.click().await?;
        locator
            .by_id(MONTH)
            .await?
            .select_option(&short_date(first_of_month(request.date)))
            .await?;
        ctx.checkpoint().await;
        locator.by_id(SEARCH).await?.click().await?;

        let mut fares = Vec::new();
        for cell in locator.all_by_css(FARE_CELLS).await? {
            if let Some(fare) = fare_from_cell(&cell.read_text().await?, request.date)? {
                fares.push(fare);
            }
        }
        Ok(fares)
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// A calendar cell reads `date` on its first line and the fare on its last;
/// days without a fare show no digits there
fn fare_from_cell(text: &str, requested: NaiveDate) -> Result<Option<Fare>> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let (Some(first), Some(last)) = (lines.first(), lines.last()) else {
        return Ok(None);
    };
    if lines.len() < 2 {
        return Ok(None);
    }

    let date = parse_date(first, requested)?;
    Ok(parse_price(last).ok().map(|price| Fare::new(price, date)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceOptions;
    use flightscout_browser::fake::{FakeDriver, FakeElement};
    use flightscout_browser::{Locator, Query};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_fare_from_cell() {
        let requested = ymd(2026, 12, 21);
        assert_eq!(
            fare_from_cell("Mon Dec 21\nfrom\n$250", requested).unwrap(),
            Some(Fare::new(250, requested))
        );
        assert_eq!(fare_from_cell("Tue Dec 22\n--", requested).unwrap(), None);
        assert_eq!(fare_from_cell("", requested).unwrap(), None);
        assert!(fare_from_cell("Someday\n$250", requested).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scrape_reads_month_calendar() {
        let nearby = FakeElement::new().checkbox(false);
        let alt_dates = FakeElement::new().checkbox(true);
        let month = FakeElement::new();
        let driver = FakeDriver::new()
            .with_element(Query::id(ONE_WAY), FakeElement::new())
            .with_element(Query::id(ORIGIN), FakeElement::new())
            .with_element(Query::id(DESTINATION), FakeElement::new())
            .with_element(Query::id(NEARBY), nearby.clone())
            .with_element(Query::id(ALT_DATES), alt_dates.clone())
            .with_element(Query::id(FLEXIBLE), FakeElement::new())
            .with_element(Query::id(MONTH), month.clone())
            .with_element(Query::id(SEARCH), FakeElement::new())
            .with_elements(
                Query::css(FARE_CELLS),
                vec![
                    FakeElement::new().with_text("Sun Dec 20\n\n$275"),
                    FakeElement::new().with_text("Mon Dec 21\n\n$250"),
                    FakeElement::new().with_text("Tue Dec 22\n\n--"),
                ],
            );
        let ctx = ScrapeContext::new(Locator::new(&driver), "united SFO-PHL 2026-12-21");
        let request = ScrapeRequest {
            origin: "SFO".into(),
            destination: "PHL".into(),
            date: ymd(2026, 12, 21),
            options: SourceOptions::new().with("nearby", true),
        };

        let fares = United.scrape(&ctx, &request).await.unwrap();

        assert_eq!(
            fares,
            vec![Fare::new(275, ymd(2026, 12, 20)), Fare::new(250, ymd(2026, 12, 21))]
        );
        assert!(nearby.selected_now());
        assert_eq!(alt_dates.clicks(), 0);
        assert_eq!(month.selected_option().as_deref(), Some("12/1/2026"));
        assert_eq!(driver.visits(), vec![SEARCH_URL.to_string()]);
    }
}
