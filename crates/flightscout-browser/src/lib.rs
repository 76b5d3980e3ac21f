//! Browser side of flightscout: a narrow driver capability set, a Chromium
//! implementation of it, and the resilience layer scrapers are written
//! against (polling locator, fluent element handles, whole-workflow retry).

mod chrome_finder;
mod chromium;
mod driver;
mod element;
mod error;
mod launcher;
mod locator;
mod profile;
mod retry;
mod session;

#[cfg(any(test, feature = "testing"))]
pub mod fake;

pub use chrome_finder::ChromeFinder;
pub use chromium::{ChromiumDriver, ChromiumElement};
pub use driver::{Driver, Key, NativeElement, Query};
pub use element::ElementHandle;
pub use error::{Error, Result};
pub use launcher::ChromeLauncher;
pub use locator::{DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT, LocateOptions, Locator};
pub use profile::ProfileManager;
pub use retry::{RetryClass, RetryPolicy, WorkflowFailure};
pub use session::{BrowserSession, SessionOptions};
