use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::sequenced::Sequenced;

/// Heap slot ordered so that the smallest index sits on top.
struct Slot<T>(Sequenced<T>);

impl<T> PartialEq for Slot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.index == other.0.index
    }
}

impl<T> Eq for Slot<T> {}

impl<T> PartialOrd for Slot<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Slot<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap.
        other.0.index.cmp(&self.0.index)
    }
}

/// Min-heap of [`Sequenced`] entries keyed by index.
///
/// Entries may be inserted in any order from any task; they come back out in
/// ascending index order. All operations take one exclusive lock, so
/// concurrent [`insert`](Self::insert) and [`pop_if_next`](Self::pop_if_next)
/// calls are safe. Entries sharing an index are all kept; which of them pops
/// first is unspecified.
pub struct ReorderHeap<T> {
    slots: Mutex<BinaryHeap<Slot<T>>>,
}

impl<T> Default for ReorderHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReorderHeap<T> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(BinaryHeap::new()),
        }
    }

    pub fn insert(&self, entry: Sequenced<T>) {
        self.slots.lock().push(Slot(entry));
    }

    /// Pops the minimum only if its index is exactly `expected`.
    ///
    /// Callers advance their cursor only when this returns `Some`.
    pub fn pop_if_next(&self, expected: usize) -> Option<Sequenced<T>> {
        let mut slots = self.slots.lock();
        if slots.peek()?.0.index != expected {
            return None;
        }
        slots.pop().map(|slot| slot.0)
    }

    /// Pops the minimum if its index is below `cursor`, i.e. its slot has
    /// already been emitted once.
    pub fn pop_stale(&self, cursor: usize) -> Option<Sequenced<T>> {
        let mut slots = self.slots.lock();
        if slots.peek()?.0.index >= cursor {
            return None;
        }
        slots.pop().map(|slot| slot.0)
    }

    /// Unconditionally pops the minimum, ignoring gaps.
    pub fn drain(&self) -> Option<Sequenced<T>> {
        self.slots.lock().pop().map(|slot| slot.0)
    }

    /// Index of the current minimum.
    pub fn peek_index(&self) -> Option<usize> {
        self.slots.lock().peek().map(|slot| slot.0.index)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}
