//! Bounded fan-out/fan-in.
//!
//! [`Dispatcher::run`] pulls items off a channel, runs an async operation per
//! item with at most `workers` invocations active at once, and merges the
//! results onto a single output channel. Results come out in completion
//! order, each tagged with the index its item was dispatched at; use
//! [`crate::reorder::ordered`] downstream when order matters.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::channel::send_with_cancel;
use crate::sequenced::Sequenced;

/// Worker limit used when none (or a non-positive one) is configured.
pub const DEFAULT_WORKERS: usize = 4;

/// Maps a configured worker count to an effective one.
pub fn worker_count(requested: i64) -> usize {
    usize::try_from(requested)
        .ok()
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_WORKERS)
}

/// Like [`worker_count`], but never more workers than there are items.
pub fn worker_count_for_items(requested: i64, items: usize) -> usize {
    let workers = worker_count(requested);
    if items == 0 { workers } else { workers.min(items) }
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    workers: usize,
    cancel: CancellationToken,
}

impl Dispatcher {
    /// A zero worker count falls back to [`DEFAULT_WORKERS`].
    pub fn new(workers: usize, cancel: CancellationToken) -> Self {
        let workers = if workers == 0 { DEFAULT_WORKERS } else { workers };
        Self { workers, cancel }
    }

    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `op` once per item of `input`.
    ///
    /// A worker slot is taken before the next item is read and released as
    /// soon as that item's operation returns, so a full worker set holds
    /// back further reads from `input`. The output closes once `input` is
    /// exhausted and every started operation has delivered (or abandoned)
    /// its result.
    ///
    /// On cancellation no further items are read. Operations already
    /// running are left to finish; their results are dropped if nobody is
    /// receiving.
    ///
    /// Failures are part of `O` (typically a `Result`) and never affect
    /// other items.
    pub fn run<I, O, F, Fut>(&self, mut input: mpsc::Receiver<I>, op: F) -> mpsc::Receiver<Sequenced<O>>
    where
        I: Send + 'static,
        O: Send + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(self.workers);
        let slots = Arc::new(Semaphore::new(self.workers));
        let cancel = self.cancel.clone();
        let op = Arc::new(op);

        tokio::spawn(async move {
            let mut in_flight = JoinSet::new();
            let mut next_index = 0usize;

            loop {
                let permit = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    permit = Arc::clone(&slots).acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    },
                };

                let item = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    item = input.recv() => item,
                };
                let Some(item) = item else {
                    break;
                };

                let index = next_index;
                next_index += 1;

                let op = Arc::clone(&op);
                let tx = tx.clone();
                let cancel = cancel.clone();
                in_flight.spawn(async move {
                    let value = op(item).await;
                    drop(permit);
                    send_with_cancel(&cancel, &tx, Sequenced::new(index, value)).await;
                });

                while let Some(joined) = in_flight.try_join_next() {
                    report_join(joined);
                }
            }

            drop(tx);
            while let Some(joined) = in_flight.join_next().await {
                report_join(joined);
            }
            debug!(dispatched = next_index, "dispatcher finished");
        });

        rx
    }
}

fn report_join(joined: Result<(), tokio::task::JoinError>) {
    match joined {
        Err(err) if err.is_panic() => error!(error = %err, "dispatched operation panicked"),
        _ => {}
    }
}
