use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::Pipeline;
use crate::channel::{recv_with_cancel, send_with_cancel};
use crate::reorder::ordered;
use crate::translation::WordTranslation;

impl Pipeline {
    /// Plays every URL from `urls`.
    ///
    /// With downloading enabled, files are fetched concurrently but played
    /// in the order their URLs arrived, and each file is removed after
    /// playback. Otherwise URLs go straight to the player one by one.
    pub async fn pronounce(
        &self,
        urls: mpsc::Receiver<String>,
        expected: usize,
        cancel: &CancellationToken,
    ) {
        if self.options.download {
            self.download_and_play(urls, expected, cancel).await;
        } else {
            self.play_urls(urls, cancel).await;
        }
    }

    async fn play_urls(&self, mut urls: mpsc::Receiver<String>, cancel: &CancellationToken) {
        while let Some(url) = recv_with_cancel(cancel, &mut urls).await {
            if let Err(err) = self.pronouncer.play(&url).await {
                error!(url = %url, error = %err, "cannot play url");
            }
        }
    }

    async fn download_and_play(
        &self,
        urls: mpsc::Receiver<String>,
        expected: usize,
        cancel: &CancellationToken,
    ) {
        let downloader = Arc::clone(&self.downloader);
        let downloads = self.dispatcher(expected, cancel).run(urls, move |url: String| {
            let downloader = Arc::clone(&downloader);
            async move {
                let result = downloader.download(&url).await;
                (url, result)
            }
        });

        let mut files = ordered(cancel.clone(), downloads);
        while let Some(entry) = recv_with_cancel(cancel, &mut files).await {
            let (url, result) = entry.into_value();
            let file = match result {
                Ok(file) => file,
                Err(err) => {
                    error!(url = %url, error = %err, "cannot download");
                    continue;
                }
            };

            let target = file.to_string_lossy().into_owned();
            if let Err(err) = self.pronouncer.play(&target).await {
                error!(filename = %target, error = %err, "cannot play file");
            }
            if let Err(err) = self.downloader.remove(file).await {
                error!(filename = %target, error = %err, "cannot remove file");
            }
        }
    }

    /// Adds the custom translations of every queued word to the dictionary,
    /// one call per translation, and reports each success.
    pub async fn add_to_dictionary(
        &self,
        mut queue: mpsc::Receiver<WordTranslation>,
        cancel: &CancellationToken,
    ) {
        let (pairs_tx, pairs) = mpsc::channel::<(String, String)>(1);
        let feeder_cancel = cancel.clone();
        tokio::spawn(async move {
            while let Some(translation) = recv_with_cancel(&feeder_cancel, &mut queue).await {
                for value in translation.to_add {
                    let pair = (translation.word.clone(), value);
                    if !send_with_cancel(&feeder_cancel, &pairs_tx, pair).await {
                        return;
                    }
                }
            }
        });

        let client = Arc::clone(&self.client);
        let mut added = self
            .dispatcher(0, cancel)
            .run(pairs, move |(word, value): (String, String)| {
                let client = Arc::clone(&client);
                async move {
                    let result = client.add_word(&word, &value).await;
                    (word, value, result)
                }
            });

        while let Some(entry) = recv_with_cancel(cancel, &mut added).await {
            let (word, value, result) = entry.into_value();
            match result {
                Ok(mut translation) => {
                    translation.to_add = vec![value];
                    if let Err(err) = self.outputer.report_added(&translation) {
                        error!(word = %word, error = %err, "cannot print added translation");
                    }
                }
                Err(err) if err.is_cancelled() => debug!(word = %word, "add cancelled"),
                Err(err) => error!(
                    word = %word,
                    translation = %value,
                    error = %err,
                    "cannot add word to dictionary"
                ),
            }
        }
    }
}
