//! Built-in airline integrations.
//!
//! Selectors belong to each site's booking form and break whenever the
//! site changes; everything else lives outside this module.

mod aa;
mod bing;
mod delta;
mod southwest;
mod united;
mod virginamerica;

pub use aa::AmericanAirlines;
pub use bing::BingTravel;
pub use delta::Delta;
pub use southwest::Southwest;
pub use united::United;
pub use virginamerica::VirginAmerica;

use crate::SourceScraper;
use chrono::NaiveDate;

/// Every built-in scraper, in the order `sources` lists them
pub fn builtin() -> Vec<Box<dyn SourceScraper>> {
    vec![
        Box::new(United),
        Box::new(AmericanAirlines),
        Box::new(VirginAmerica),
        Box::new(BingTravel),
        Box::new(Southwest),
        Box::new(Delta),
    ]
}

/// `12/21/2026`, the form most booking pages expect typed in
pub(crate) fn us_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

/// `12/1/2026`, used as option values in month pickers
pub(crate) fn short_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}
