pub mod aggregate;
pub mod error;
pub mod fares;
pub mod history;
pub mod report;

pub use error::{Error, Result};
