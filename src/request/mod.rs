//! JSON-over-HTTP requests with classification and bounded retry.

mod error;
mod retry;

pub use error::ApiError;
pub use retry::{
    DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_INITIAL_WAIT, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_WAIT,
    Retrier, RetryPolicy,
};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Redirect hops followed before a request fails.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

#[derive(Debug, Default, Deserialize)]
struct ApplicationStatus {
    #[serde(default)]
    error_code: i64,
    #[serde(default)]
    error_msg: Option<String>,
}

/// Maps a non-zero `error_code` in a successful reply to
/// [`ApiError::Authentication`]. An empty body passes; a non-empty body that
/// is not a JSON object is [`ApiError::Decode`].
pub fn check_application_error(body: &str) -> Result<(), ApiError> {
    if body.trim().is_empty() {
        return Ok(());
    }
    let status: ApplicationStatus = serde_json::from_str(body)?;
    if status.error_code != 0 {
        return Err(ApiError::Authentication {
            code: status.error_code,
            message: status.error_msg.unwrap_or_default(),
        });
    }
    Ok(())
}

/// Posts JSON bodies through a shared client, retrying per [`Retrier`].
#[derive(Debug, Clone)]
pub struct Requester {
    http: Client,
    retrier: Retrier,
}

impl Requester {
    pub const fn new(http: Client, retrier: Retrier) -> Self {
        Self { http, retrier }
    }

    /// POSTs `payload` to `url` and returns the raw reply body.
    ///
    /// Only 200 counts as success. Any other status becomes
    /// [`ApiError::UnexpectedStatus`] with the body attached, and is retried
    /// only when [`ApiError::is_retryable`] says so.
    pub async fn post_json<B>(&self, url: &str, payload: &B) -> Result<String, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.retrier
            .run(url, move || self.attempt(url, payload))
            .await
    }

    async fn attempt<B>(&self, url: &str, payload: &B) -> Result<String, ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let response = self.http.post(url).json(payload).send().await?;
        let status = response.status();
        let body = response.text().await?;
        trace!(url, status = status.as_u16(), body = %body, "api response");

        if status != reqwest::StatusCode::OK {
            return Err(ApiError::UnexpectedStatus { status, body });
        }
        check_application_error(&body)?;
        Ok(body)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_check_application_error_accepts_zero_code() {
        assert!(check_application_error(r#"{"error_code":0,"error_msg":""}"#).is_ok());
        assert!(check_application_error(r#"{"translate":[]}"#).is_ok());
        assert!(check_application_error("").is_ok());
    }

    #[test]
    fn test_check_application_error_rejects_non_json() {
        for body in ["not json", "<html>login page</html>", "[1, 2]"] {
            let err = check_application_error(body).unwrap_err();
            assert!(matches!(err, ApiError::Decode(_)), "{body:?} gave {err:?}");
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn test_check_application_error_rejects_non_zero_code() {
        let err = check_application_error(r#"{"error_code":401,"error_msg":"Bad password"}"#)
            .unwrap_err();
        match err {
            ApiError::Authentication { code, message } => {
                assert_eq!(code, 401);
                assert_eq!(message, "Bad password");
            }
            other => panic!("expected Authentication, got {other:?}"),
        }
    }
}
