use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read archive: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse archive: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Failed to render report: {0}")]
    Render(#[from] askama::Error),

    #[error("Failed to write summary: {0}")]
    Format(#[from] std::fmt::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
