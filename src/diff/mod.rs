pub mod document;
pub mod locate;
pub mod position;
pub mod word_diff;

pub use document::DiffDocument;

/// Half-open `[start, end)` byte interval into a text buffer.
///
/// Regions are only meaningful for the render cycle that produced them; the
/// exception is verbatim hunk text captured for history and fuzzy relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start: usize,
    pub end: usize,
}

impl Region {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, pt: usize) -> bool {
        self.start <= pt && pt < self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
