use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Required sheet is missing: {0}")]
    MissingDependency(String),

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Resource busy - another run holds {0}")]
    Busy(String),

    #[error("Workbook I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt sheet {sheet}: {source}")]
    Corrupt {
        sheet: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Maximum length for cell excerpts quoted in error messages
const MAX_EXCERPT_LENGTH: usize = 40;

impl Error {
    /// Build an `InvalidInput` error quoting the offending value, truncated
    /// so a pasted spreadsheet row cannot flood the log.
    pub fn invalid(what: &str, value: &str) -> Self {
        let excerpt = if value.chars().count() <= MAX_EXCERPT_LENGTH {
            value.to_string()
        } else {
            let head: String = value.chars().take(MAX_EXCERPT_LENGTH).collect();
            format!("{}... (truncated)", head)
        };
        Error::InvalidInput(format!("{}: {:?}", what, excerpt))
    }

    /// True when the error means a run could not start because a required
    /// sheet was absent.
    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, Error::MissingDependency(_))
    }
}
