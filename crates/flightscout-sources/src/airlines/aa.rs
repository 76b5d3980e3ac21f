use crate::parse::{parse_date, parse_price};
use crate::{Error, FareScope, Result, ScrapeContext, ScrapeRequest, SourceOptions, SourceScraper};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use flightscout_core::fares::Fare;

const SEARCH_URL: &str = "https://www.aa.com/reservation/oneWaySearchAccess.do";
const ORIGIN: &str = "flightSearchForm.originAirport";
const DESTINATION: &str = "flightSearchForm.destinationAirport";
const ORIGIN_DISTANCE: &str = "flightSearchForm.originAlternateAirportDistance";
const DESTINATION_DISTANCE: &str = "flightSearchForm.destinationAlternateAirportDistance";
const MATRIX: &str = "flightSearchForm.searchType.matrix";
const MONTH: &str = "flightSearchForm.flightParams.flightDateParams.travelMonth";
const DAY: &str = "flightSearchForm.flightParams.flightDateParams.travelDay";
const TIME: &str = "flightSearchForm.flightParams.flightDateParams.searchTime";
const ANY_TIME: &str = "120001";
const ALL_CARRIERS: &str = "flightSearchForm.carrierAll";
const FORM: &str = "flightSearchForm";
const DATE_TABS: &str = ".tabNotActive, .highlightSubHeader";

/// Alternate-airport radii the search form offers, in miles
const DISTANCES: [u32; 4] = [0, 30, 60, 90];

/// aa.com fare matrix: the lowest fare for each day within three days of the
/// requested one. Options `dist_org`/`dist_dst` widen the search to airports
/// within that many miles.
pub struct AmericanAirlines;

impl AmericanAirlines {
    fn distances(&self, options: &SourceOptions) -> Result<(u32, u32)> {
        let mut pair = [0; 2];
        for (slot, name) in pair.iter_mut().zip(["dist_org", "dist_dst"]) {
            let miles = options.number(self.id(), name, 0)?;
            if !DISTANCES.contains(&miles) {
                return Err(Error::invalid_option(
                    self.id(),
                    format!("{} must be one of 0, 30, 60, 90, got {}", name, miles),
                ));
            }
            *slot = miles;
        }
        Ok((pair[0], pair[1]))
    }
}

#[async_trait]
impl SourceScraper for AmericanAirlines {
    fn id(&self) -> &'static str {
        "aa"
    }

    fn scope(&self) -> FareScope {
        FareScope::Window(3)
    }

    fn options(&self) -> &'static [&'static str] {
        &["dist_org", "dist_dst"]
    }

    fn validate(&self, options: &SourceOptions) -> Result<()> {
        options.ensure_known(self.id(), self.options())?;
        self.distances(options).map(|_| ())
    }

    async fn scrape(&self, ctx: &ScrapeContext<'_>, request: &ScrapeRequest) -> Result<Vec<Fare>> {
        let (dist_org, dist_dst) = self.distances(&request.options)?;
        let locator = ctx.locator();

        ctx.navigate(SEARCH_URL).await?;
        locator.by_id(ORIGIN).await?.clear().await?.type_text(&request.origin).await?;
        locator
            .by_id(DESTINATION)
            .await?
            .clear()
            .await?
            .type_text(&request.destination)
            .await?;
        locator
            .by_id(ORIGIN_DISTANCE)
            .await?
            .select_option(&dist_org.to_string())
            .await?;
        locator
            .by_id(DESTINATION_DISTANCE)
            .await?
            .select_option(&dist_dst.to_string())
            .await?;
        locator.by_id(MATRIX).await?.click().await?;
        locator
            .by_id(MONTH)
            .await?
            .select_option(&request.date.month().to_string())
            .await?;
        locator
            .by_id(DAY)
            .await?
            .select_option(&request.date.day().to_string())
            .await?;
        locator.by_id(TIME).await?.select_option(ANY_TIME).await?;
        locator.by_id(ALL_CARRIERS).await?.click().await?;
        ctx.checkpoint().await;
        locator.by_id(FORM).await?.submit().await?;

        let mut fares = Vec::new();
        for tab in locator.all_by_css(DATE_TABS).await? {
            fares.push(fare_from_tab(&tab.read_text().await?, request.date)?);
        }
        Ok(fares)
    }
}

/// Matrix tabs read like `Fri, Dec 18 from $250`
fn fare_from_tab(text: &str, requested: NaiveDate) -> Result<Fare> {
    let (date, price) = text
        .split_once("from")
        .ok_or_else(|| Error::parse("fare tab", text))?;
    Ok(Fare::new(parse_price(price)?, parse_date(date, requested)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_options() {
        let aa = AmericanAirlines;
        let options = SourceOptions::new().with("dist_org", 60).with("dist_dst", 30);
        assert_eq!(aa.distances(&options).unwrap(), (60, 30));
        assert_eq!(aa.distances(&SourceOptions::new()).unwrap(), (0, 0));

        let err = aa
            .validate(&SourceOptions::new().with("dist_org", 45))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOption { .. }));
        assert!(err.to_string().contains("dist_org must be one of 0, 30, 60, 90"));
    }

    #[test]
    fn test_fare_from_tab() {
        let requested = NaiveDate::from_ymd_opt(2026, 12, 21).unwrap();
        assert_eq!(
            fare_from_tab("Fri, Dec 18 from $1,250", requested).unwrap(),
            Fare::new(1250, NaiveDate::from_ymd_opt(2026, 12, 18).unwrap())
        );
        assert!(fare_from_tab("Fri, Dec 18", requested).is_err());
    }
}
