use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by the LinguaLeo API layer.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The API answered 200 but carried a non-zero application error code.
    #[error("api authentication error: {message} (code {code})")]
    Authentication { code: i64, message: String },

    #[error("too many redirects")]
    RedirectLimitExceeded,

    /// A single attempt ran past its deadline.
    #[error("api request timeout")]
    Timeout,

    #[error("unexpected response status code: {status}\nbody:\n{body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The API understood the request but could not translate the word.
    #[error("cannot translate word '{word}': {message}")]
    Translation { word: String, message: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Every attempt failed with a retryable error.
    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<ApiError>,
    },

    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Transport failures, timeouts, 5xx and 429 are worth another attempt.
    /// Everything else is terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Transport(_) => true,
            Self::UnexpectedStatus { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Authentication { .. }
            | Self::RedirectLimitExceeded
            | Self::Translation { .. }
            | Self::Decode(_)
            | Self::RetriesExhausted { .. }
            | Self::Cancelled => false,
        }
    }

    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_redirect() {
            Self::RedirectLimitExceeded
        } else {
            Self::Transport(err)
        }
    }
}
