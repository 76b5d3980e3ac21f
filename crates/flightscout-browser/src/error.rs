use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("CDP error: {0}")]
    Cdp(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timed out after {waited:?} waiting for {what}")]
    WorkflowTimeout { what: String, waited: Duration },

    #[error("Script error: {0}")]
    Script(String),
}

impl Error {
    pub fn timeout(what: impl Into<String>, waited: Duration) -> Self {
        Error::WorkflowTimeout {
            what: what.into(),
            waited,
        }
    }
}

impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Error::Cdp(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Script(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
