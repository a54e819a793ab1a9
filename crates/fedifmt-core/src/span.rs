use thiserror::Error;

/// Half-open byte-offset range `[start, end)` into a specific text buffer.
///
/// Offsets always fall on `char` boundaries of the buffer the span was
/// computed against.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Result<Self, SpanError> {
        if start <= end {
            Ok(Self { start, end })
        } else {
            Err(SpanError::Inverted { start, end })
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Half-open ranges conflict only when both occupy at least one
    /// position; an empty span overlaps nothing.
    pub fn overlaps(&self, other: Span) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.start < other.end
            && other.start < self.end
    }

    /// Slices the buffer this span was computed against.
    ///
    /// Panics if the span is out of bounds or off a char boundary, which
    /// would mean the span belongs to a different buffer.
    pub fn slice<'a>(&self, buffer: &'a str) -> &'a str {
        &buffer[self.start..self.end]
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum SpanError {
    #[error("inverted span: start {start} > end {end}")]
    Inverted { start: usize, end: usize },
}
