//! Pronunciation: fetching audio files and handing them to a player.

mod download;
mod player;

pub use download::{DownloadError, FileDownloader, validate_url};
pub use player::{CommandPlayer, DEFAULT_SHUTDOWN_TIMEOUT, PlayerError};

use async_trait::async_trait;
use tempfile::TempPath;

/// Fetches remote audio into local files.
///
/// Downloads are returned as [`TempPath`]s, so a file that is never handed
/// to [`remove`](Self::remove) is still deleted once dropped.
#[async_trait]
pub trait AudioDownloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<TempPath, DownloadError>;

    async fn remove(&self, path: TempPath) -> Result<(), DownloadError>;
}

/// Plays a local file or a URL.
#[async_trait]
pub trait Pronouncer: Send + Sync {
    async fn play(&self, target: &str) -> Result<(), PlayerError>;
}

/// Stands in for a player when sound is off. Every call succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

#[async_trait]
impl Pronouncer for Silent {
    async fn play(&self, _target: &str) -> Result<(), PlayerError> {
        Ok(())
    }
}
