use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, StatusCode, Url};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempPath;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::AudioDownloader;

const FILE_PREFIX: &str = "leo";
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("invalid download URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("cannot read URL {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("bad status: {0}")]
    BadStatus(StatusCode),

    #[error("audio file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Accepts only absolute http(s) URLs with a host.
pub fn validate_url(raw: &str) -> Result<Url, DownloadError> {
    let invalid = |reason: &str| DownloadError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    if raw.is_empty() {
        return Err(invalid("empty URL"));
    }
    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(&format!("unsupported scheme {}", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("empty host"));
    }
    Ok(url)
}

/// Streams audio over HTTP into `leo*` temp files.
#[derive(Debug, Clone)]
pub struct FileDownloader {
    http: Client,
    dir: Option<PathBuf>,
}

impl FileDownloader {
    pub fn new() -> Result<Self, DownloadError> {
        let http = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|source| DownloadError::Request {
                url: String::new(),
                source,
            })?;
        Ok(Self { http, dir: None })
    }

    /// Creates files in `dir` instead of the system temp directory.
    #[must_use]
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    fn create_file(&self) -> std::io::Result<tempfile::NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(FILE_PREFIX);
        match &self.dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
    }
}

#[async_trait]
impl AudioDownloader for FileDownloader {
    async fn download(&self, url: &str) -> Result<TempPath, DownloadError> {
        let parsed = validate_url(url)?;
        let request_error = |source| DownloadError::Request {
            url: url.to_string(),
            source,
        };

        let response = self.http.get(parsed).send().await.map_err(request_error)?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(DownloadError::BadStatus(status));
        }

        let (file, path) = self.create_file()?.into_parts();
        let mut file = tokio::fs::File::from_std(file);
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(request_error)?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        debug!(url, path = %path.display(), "downloaded audio");
        Ok(path)
    }

    async fn remove(&self, path: TempPath) -> Result<(), DownloadError> {
        path.close()?;
        Ok(())
    }
}
