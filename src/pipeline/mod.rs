//! Translate, then fan out to pronunciation and dictionary branches.
//!
//! ```text
//! words ─▶ dispatch(translate) ─▶ process ─┬─▶ results ─▶ caller
//!                                          ├─▶ sound ─▶ pronounce
//!                                          └─▶ add ─▶ add_to_dictionary
//! ```
//!
//! Every stage observes the same [`CancellationToken`]. The results channel
//! returned by [`Pipeline::translate`] closes only after the producer and
//! every active branch have finished.

mod branches;

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error};

use crate::audio::{AudioDownloader, Pronouncer};
use crate::channel::{recv_with_cancel, send_with_cancel, to_channel};
use crate::dispatch::{Dispatcher, worker_count_for_items};
use crate::output::Outputer;
use crate::request::ApiError;
use crate::translation::{TranslationClient, WordTranslation, is_english_word, unique};

/// Per-run switches.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Pronounce every translated word.
    pub sound: bool,
    /// Download audio before playing it instead of passing the URL.
    pub download: bool,
    /// Add custom translations to the dictionary.
    pub add: bool,
    pub custom_translations: Vec<String>,
    /// Worker limit per stage. Non-positive means the default.
    pub workers: i64,
    /// Translate English variants of the results in a second pass.
    pub reverse_translate: bool,
}

/// Output set of [`Pipeline::process`].
pub struct PipelineChannels {
    pub sound: mpsc::Receiver<String>,
    pub add: mpsc::Receiver<WordTranslation>,
    pub results: mpsc::Receiver<WordTranslation>,
}

/// The word-processing pipeline and its collaborators.
#[derive(Clone)]
pub struct Pipeline {
    client: Arc<dyn TranslationClient>,
    downloader: Arc<dyn AudioDownloader>,
    pronouncer: Arc<dyn Pronouncer>,
    outputer: Arc<dyn Outputer>,
    options: Arc<PipelineOptions>,
}

impl Pipeline {
    pub fn new(
        client: Arc<dyn TranslationClient>,
        downloader: Arc<dyn AudioDownloader>,
        pronouncer: Arc<dyn Pronouncer>,
        outputer: Arc<dyn Outputer>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            client,
            downloader,
            pronouncer,
            outputer,
            options: Arc::new(options),
        }
    }

    fn with_options(&self, options: PipelineOptions) -> Self {
        Self {
            options: Arc::new(options),
            ..self.clone()
        }
    }

    fn dispatcher(&self, items: usize, cancel: &CancellationToken) -> Dispatcher {
        Dispatcher::new(
            worker_count_for_items(self.options.workers, items),
            cancel.clone(),
        )
    }

    /// Translates `words` (deduplicated, first occurrence kept) with bounded
    /// concurrency.
    ///
    /// Failed lookups are logged and dropped. Words without translations
    /// are reported through the outputer and dropped. Results arrive in
    /// completion order.
    pub fn translate_words(
        &self,
        words: Vec<String>,
        cancel: &CancellationToken,
    ) -> mpsc::Receiver<WordTranslation> {
        let words = unique(words);
        let (tx, rx) = mpsc::channel(words.len().max(1));
        let dispatcher = self.dispatcher(words.len(), cancel);
        let input = to_channel(cancel.clone(), words);

        let client = Arc::clone(&self.client);
        let mut translated = dispatcher.run(input, move |word: String| {
            let client = Arc::clone(&client);
            async move {
                let result = client.translate(&word).await;
                (word, result)
            }
        });

        let outputer = Arc::clone(&self.outputer);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            while let Some(entry) = recv_with_cancel(&cancel, &mut translated).await {
                let (word, result) = entry.into_value();
                let translation = match result {
                    Ok(translation) => translation,
                    Err(err) => {
                        log_translate_error(&word, &err);
                        continue;
                    }
                };

                if !translation.has_variants() {
                    if let Err(err) = outputer.report_missing(&translation.word) {
                        error!(word = %translation.word, error = %err, "cannot show message");
                    }
                    continue;
                }

                if !send_with_cancel(&cancel, &tx, translation).await {
                    return;
                }
            }
        });

        rx
    }

    /// Starts translating `words` and routes each result to the branch
    /// queues enabled in the options.
    ///
    /// The routing task is registered with `tracker`. All three channels
    /// close when it finishes.
    pub fn process(
        &self,
        words: Vec<String>,
        cancel: &CancellationToken,
        tracker: &TaskTracker,
    ) -> PipelineChannels {
        let capacity = words.len().max(1);
        let (sound_tx, sound) = mpsc::channel(capacity);
        let (add_tx, add) = mpsc::channel(capacity);
        let (results_tx, results) = mpsc::channel(capacity);

        let mut translated = self.translate_words(words, cancel);
        let options = Arc::clone(&self.options);
        let cancel = cancel.clone();

        tracker.spawn(async move {
            while let Some(mut translation) = recv_with_cancel(&cancel, &mut translated).await {
                if options.sound
                    && !translation.sound_url.is_empty()
                    && !send_with_cancel(&cancel, &sound_tx, translation.sound_url.clone()).await
                {
                    return;
                }

                if options.add && !options.custom_translations.is_empty() {
                    translation.set_custom_translations(&options.custom_translations);
                    if !send_with_cancel(&cancel, &add_tx, translation.clone()).await {
                        return;
                    }
                }

                if !send_with_cancel(&cancel, &results_tx, translation).await {
                    return;
                }
            }
        });

        PipelineChannels {
            sound,
            add,
            results,
        }
    }

    /// Runs one full pass over `words` and returns the translated results.
    ///
    /// The returned channel closes once the producer and all enabled
    /// branches are done.
    pub fn translate(
        &self,
        words: Vec<String>,
        cancel: &CancellationToken,
    ) -> mpsc::Receiver<WordTranslation> {
        let tracker = TaskTracker::new();
        let expected = words.len();
        let channels = self.process(words, cancel, &tracker);

        if self.options.sound {
            let pipeline = self.clone();
            let cancel = cancel.clone();
            let sound = channels.sound;
            tracker.spawn(async move { pipeline.pronounce(sound, expected, &cancel).await });
        }
        if self.options.add {
            let pipeline = self.clone();
            let cancel = cancel.clone();
            let add = channels.add;
            tracker.spawn(async move { pipeline.add_to_dictionary(add, &cancel).await });
        }
        tracker.close();

        let (tx, rx) = mpsc::channel(expected.max(1));
        let mut results = channels.results;
        let cancel = cancel.clone();
        tokio::spawn(async move {
            while let Some(translation) = recv_with_cancel(&cancel, &mut results).await {
                if !send_with_cancel(&cancel, &tx, translation).await {
                    break;
                }
            }
            drop(results);
            tracker.wait().await;
            debug!("pipeline pass finished");
        });

        rx
    }

    /// Translates and prints `words`, then optionally runs the reverse pass.
    pub async fn run(&self, words: Vec<String>, cancel: &CancellationToken) {
        let english = self.print_results(self.translate(words, cancel), cancel).await;
        if !self.options.reverse_translate || cancel.is_cancelled() || english.is_empty() {
            return;
        }

        debug!(words = english.len(), "translating english variants");
        let reverse = self.with_options(PipelineOptions {
            add: false,
            custom_translations: Vec::new(),
            reverse_translate: false,
            ..(*self.options).clone()
        });
        reverse
            .print_results(reverse.translate(english, cancel), cancel)
            .await;
    }

    /// Prints every result; returns the English variants seen, deduplicated.
    async fn print_results(
        &self,
        mut results: mpsc::Receiver<WordTranslation>,
        cancel: &CancellationToken,
    ) -> Vec<String> {
        let mut english = Vec::new();
        while let Some(translation) = recv_with_cancel(cancel, &mut results).await {
            if let Err(err) = self.outputer.output(&translation) {
                error!(word = %translation.word, error = %err, "cannot print translation");
            }
            if self.options.reverse_translate {
                english.extend(
                    translation
                        .variants
                        .iter()
                        .filter(|v| !v.value.is_empty() && is_english_word(&v.value))
                        .map(|v| v.value.clone()),
                );
            }
        }
        unique(english)
    }
}

fn log_translate_error(word: &str, err: &ApiError) {
    if err.is_cancelled() {
        debug!(word, "translation cancelled");
    } else {
        error!(word, error = %err, "cannot translate word");
    }
}
