use std::fmt;
use std::path::PathBuf;

/// Failure of a single remote call or of resolving a single job's text.
///
/// These never abort a batch or a credit aggregation; they are recorded
/// against the job, chunk or key they happened on.
#[derive(thiserror::Error, Debug)]
pub enum SpeechError {
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("cannot access {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("text is empty after trimming")]
    EmptyText,
    #[error("text has {chars} characters, above the limit of {limit}")]
    TextTooLarge { chars: usize, limit: usize },
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl SpeechError {
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SpeechError::FileAccess {
            path: path.into(),
            source,
        }
    }

    /// Coarse classification used in reports.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SpeechError::Authentication(_) => ErrorKind::Authentication,
            SpeechError::RateLimited(_) => ErrorKind::RateLimit,
            SpeechError::Network(_) => ErrorKind::Network,
            SpeechError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            SpeechError::Server { .. } | SpeechError::InvalidResponse(_) => ErrorKind::Server,
            SpeechError::FileAccess { .. } => ErrorKind::FileAccess,
            SpeechError::EmptyText | SpeechError::TextTooLarge { .. } => ErrorKind::TextTooLarge,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Authentication,
    RateLimit,
    Network,
    InvalidParameter,
    FileAccess,
    Server,
    TextTooLarge,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Authentication => "AuthenticationError",
            ErrorKind::RateLimit => "RateLimitError",
            ErrorKind::Network => "NetworkError",
            ErrorKind::InvalidParameter => "InvalidParameterError",
            ErrorKind::FileAccess => "FileAccessError",
            ErrorKind::Server => "ServerError",
            ErrorKind::TextTooLarge => "TextTooLargeError",
        };
        f.write_str(name)
    }
}

/// Configuration-level failure that stops a whole run before any job starts.
#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    #[error("no API key available")]
    NoApiKeys,
    #[error("output directory {} is not usable: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid conversion parameters: {0}")]
    InvalidParameter(String),
}

/// Settings file failures.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid settings file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Could not determine a configuration directory")]
    NoConfigDir,
}
