/// A value tagged with the position it was submitted at.
///
/// The dispatcher wraps every input item and every result in one of these.
/// Indices start at zero, are assigned once when an item is dispatched and
/// are never reused within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequenced<T> {
    pub index: usize,
    pub value: T,
}

impl<T> Sequenced<T> {
    pub const fn new(index: usize, value: T) -> Self {
        Self { index, value }
    }

    pub fn into_value(self) -> T {
        self.value
    }
}
