//! Cancellation-aware channel helpers.
//!
//! Every send in the pipeline goes through [`send_with_cancel`] and every
//! receive through [`recv_with_cancel`], so a stage that is blocked on a full
//! or unconsumed channel gives up as soon as the run is cancelled.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Sends `value` unless `cancel` fires first.
///
/// Returns `true` only when the channel accepted the value. An already
/// cancelled token, a cancellation while waiting for capacity, or a dropped
/// receiver all return `false`, and the value is dropped.
pub async fn send_with_cancel<T>(
    cancel: &CancellationToken,
    tx: &mpsc::Sender<T>,
    value: T,
) -> bool {
    if cancel.is_cancelled() {
        return false;
    }

    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        sent = tx.send(value) => sent.is_ok(),
    }
}

/// Receives the next value, or `None` once the channel is closed or the
/// token is cancelled. Cancellation wins over a value that is ready.
pub async fn recv_with_cancel<T>(
    cancel: &CancellationToken,
    rx: &mut mpsc::Receiver<T>,
) -> Option<T> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        value = rx.recv() => value,
    }
}

/// Emits `items` in order on a new channel.
///
/// The channel closes after the last item, or as soon as cancellation is
/// observed while waiting for the receiver, in which case the remaining
/// items are never sent.
pub fn to_channel<I>(cancel: CancellationToken, items: I) -> mpsc::Receiver<I::Item>
where
    I: IntoIterator + Send + 'static,
    I::IntoIter: Send,
    I::Item: Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);

    tokio::spawn(async move {
        for item in items {
            if !send_with_cancel(&cancel, &tx, item).await {
                break;
            }
        }
    });

    rx
}

/// Forwards everything from `input` until it closes or `cancel` fires.
pub fn relay<T: Send + 'static>(
    cancel: CancellationToken,
    mut input: mpsc::Receiver<T>,
) -> mpsc::Receiver<T> {
    let (tx, rx) = mpsc::channel(1);

    tokio::spawn(async move {
        while let Some(value) = recv_with_cancel(&cancel, &mut input).await {
            if !send_with_cancel(&cancel, &tx, value).await {
                break;
            }
        }
    });

    rx
}
