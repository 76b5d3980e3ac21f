use flightscout_browser::RetryClass;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Browser(#[from] flightscout_browser::Error),

    #[error("Could not parse {what} from {text:?}")]
    Parse { what: &'static str, text: String },

    #[error("Invalid option for {scraper}: {message}")]
    InvalidOption { scraper: String, message: String },

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Invalid plan: {0}")]
    Plan(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn parse(what: &'static str, text: impl Into<String>) -> Self {
        Error::Parse {
            what,
            text: text.into(),
        }
    }

    pub fn invalid_option(scraper: &str, message: impl Into<String>) -> Self {
        Error::InvalidOption {
            scraper: scraper.to_string(),
            message: message.into(),
        }
    }
}

impl RetryClass for Error {
    fn is_workflow_timeout(&self) -> bool {
        match self {
            Error::Browser(e) => e.is_workflow_timeout(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
