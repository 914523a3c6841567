//! Restores submission order to a stream of out-of-order results.

mod heap;

pub use heap::ReorderHeap;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::channel::{recv_with_cancel, send_with_cancel};
use crate::sequenced::Sequenced;

/// Re-emits `input` in ascending index order, starting at index 0.
///
/// An entry is held back until every lower index has been emitted. When
/// `input` closes, whatever is still buffered is flushed in ascending order
/// even across gaps. An entry whose index was already emitted is passed
/// through immediately with a warning instead of stalling the stream.
/// Emission stops at the first observed cancellation.
pub fn ordered<T: Send + 'static>(
    cancel: CancellationToken,
    mut input: mpsc::Receiver<Sequenced<T>>,
) -> mpsc::Receiver<Sequenced<T>> {
    let (tx, rx) = mpsc::channel(1);

    tokio::spawn(async move {
        let heap = ReorderHeap::new();
        let mut cursor = 0;

        while let Some(entry) = recv_with_cancel(&cancel, &mut input).await {
            heap.insert(entry);

            loop {
                let next = if let Some(entry) = heap.pop_if_next(cursor) {
                    cursor += 1;
                    entry
                } else if let Some(entry) = heap.pop_stale(cursor) {
                    warn!(index = entry.index, cursor, "duplicate sequence index");
                    entry
                } else {
                    break;
                };

                if !send_with_cancel(&cancel, &tx, next).await {
                    return;
                }
            }
        }

        while let Some(entry) = heap.drain() {
            if !send_with_cancel(&cancel, &tx, entry).await {
                return;
            }
        }
    });

    rx
}
