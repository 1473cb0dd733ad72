use ::scraper::error::SelectorErrorKind;

/// All errors that can occur while scraping a trophy profile.
///
/// Parse problems inside a page never show up here: the extractors fall back
/// to sentinel values or drop the offending row instead.
#[derive(thiserror::Error, Debug)]
pub enum TrophyError {
    /// HTTP request failed (network, DNS, TLS, timeout, etc.).
    #[error("http request failed for {url}: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },

    /// Server returned a non-success HTTP status code.
    #[error("unexpected status {status} for {url}")]
    UnexpectedStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// Failed to read the response body as text.
    #[error("failed to read response body from {url}: {source}")]
    ResponseBody {
        url: String,
        source: reqwest::Error,
    },

    /// A CSS selector string could not be parsed.
    #[error("invalid CSS selector: {0}")]
    Selector(String),

    /// The profile page had no trophy totals, so it is missing or private.
    #[error("profile not found or private: {username}")]
    ProfileNotFound { username: String },

    /// The underlying HTTP client could not be built.
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
}

impl TrophyError {
    /// Whether this error came from the transport layer.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            TrophyError::Http { .. }
                | TrophyError::UnexpectedStatus { .. }
                | TrophyError::ResponseBody { .. }
        )
    }
}

impl<'a> From<SelectorErrorKind<'a>> for TrophyError {
    fn from(err: SelectorErrorKind<'a>) -> Self {
        TrophyError::Selector(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrophyError>;
