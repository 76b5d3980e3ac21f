//! Airline integrations and the orchestrator that runs them.
//!
//! Each airline is a [`SourceScraper`] registered by id in a
//! [`SourceRegistry`]. A [`WorkPlan`] expands into [`WorkItem`]s, and the
//! [`Orchestrator`] runs them one at a time against a single browser page.

pub mod airlines;
pub mod error;
pub mod orchestrator;
pub mod parse;
pub mod plan;
pub mod registry;
pub mod scraper;

pub use error::{Error, Result};
pub use orchestrator::Orchestrator;
pub use plan::{Search, WorkItem, WorkPlan};
pub use registry::SourceRegistry;
pub use scraper::{FareScope, ScrapeContext, ScrapeRequest, SourceOptions, SourceScraper};
