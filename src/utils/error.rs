use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP status {status} from {url}")]
    HttpStatusError { status: u16, url: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Page parse error: {message}")]
    ParseError { message: String },

    #[error("Schema mismatch in {path}: expected [{expected}], found [{found}]")]
    SchemaError {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

impl ScrapeError {
    /// Transient failures are worth retrying; everything else is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            ScrapeError::HttpError(e) => e.is_timeout() || e.is_connect(),
            ScrapeError::HttpStatusError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
