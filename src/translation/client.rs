use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, redirect};
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::TranslationClient;
use super::model::WordTranslation;
use crate::request::{
    ApiError, DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_MAX_REDIRECTS, Requester, Retrier, RetryPolicy,
};

pub const AUTH_URL: &str = "https://lingualeo.com/api/auth";
pub const TRANSLATE_URL: &str = "https://api.lingualeo.com/getTranslates";
pub const ADD_WORD_URL: &str = "https://api.lingualeo.com/addWord";

const API_VERSION: &str = "1.0.1";
const ADD_WORD_PORT: &str = "1001";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/34.0.1847.116 Safari/537.36";

/// Where the client sends each kind of request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub auth: String,
    pub translate: String,
    pub add_word: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            auth: AUTH_URL.to_string(),
            translate: TRANSLATE_URL.to_string(),
            add_word: ADD_WORD_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// All three endpoints under one base URL, as `{base}/auth`,
    /// `{base}/getTranslates` and `{base}/addWord`.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth: format!("{base}/auth"),
            translate: format!("{base}/getTranslates"),
            add_word: format!("{base}/addWord"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub email: String,
    pub password: String,
    pub endpoints: Endpoints,
    pub retry: RetryPolicy,
    /// Deadline for a single attempt. Zero means the default.
    pub request_timeout: Duration,
    /// Redirect hops allowed per request. Zero means the default.
    pub max_redirects: usize,
}

impl ClientConfig {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            endpoints: Endpoints::default(),
            retry: RetryPolicy::default(),
            request_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranslateRequest<'a> {
    text: &'a str,
    api_version: &'static str,
    ctx: RequestContext,
}

#[derive(Serialize)]
struct RequestContext {
    config: RequestFlags,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestFlags {
    is_check_data: bool,
    is_logging: bool,
}

#[derive(Serialize)]
struct AddWordRequest<'a> {
    word: &'a str,
    tword: &'a str,
    port: &'static str,
}

/// HTTP client for the LinguaLeo API.
///
/// Keeps the session cookie obtained at [`connect`](Self::connect) for all
/// later calls.
#[derive(Debug, Clone)]
pub struct LeoClient {
    requester: Requester,
    endpoints: Endpoints,
}

impl LeoClient {
    /// Builds the HTTP client and authenticates with the configured
    /// credentials.
    pub async fn connect(config: ClientConfig, cancel: CancellationToken) -> Result<Self, ApiError> {
        let http = build_http_client(config.max_redirects)?;
        let retrier = Retrier::new(config.retry, config.request_timeout, cancel);
        let client = Self {
            requester: Requester::new(http, retrier),
            endpoints: config.endpoints,
        };

        client.authenticate(&config.email, &config.password).await?;
        debug!(email = %config.email, "authenticated");

        Ok(client)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<(), ApiError> {
        let credentials = Credentials { email, password };
        self.requester
            .post_json(&self.endpoints.auth, &credentials)
            .await
            .map(drop)
    }
}

#[async_trait]
impl TranslationClient for LeoClient {
    async fn translate(&self, word: &str) -> Result<WordTranslation, ApiError> {
        let request = TranslateRequest {
            text: word,
            api_version: API_VERSION,
            ctx: RequestContext {
                config: RequestFlags {
                    is_check_data: true,
                    is_logging: true,
                },
            },
        };
        let body = self
            .requester
            .post_json(&self.endpoints.translate, &request)
            .await?;
        WordTranslation::from_response(word, &body)
    }

    async fn add_word(&self, word: &str, translation: &str) -> Result<WordTranslation, ApiError> {
        let request = AddWordRequest {
            word,
            tword: translation,
            port: ADD_WORD_PORT,
        };
        let body = self
            .requester
            .post_json(&self.endpoints.add_word, &request)
            .await?;
        WordTranslation::from_response(word, &body)
    }
}

fn build_http_client(max_redirects: usize) -> Result<Client, ApiError> {
    let max_redirects = if max_redirects == 0 {
        DEFAULT_MAX_REDIRECTS
    } else {
        max_redirects
    };

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let client = Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::limited(max_redirects))
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()?;
    Ok(client)
}
