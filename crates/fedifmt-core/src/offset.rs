use thiserror::Error;

use crate::span::Span;

/// Placeholder substituted for a collapsed HTML tag before pattern matching.
pub const TAG_PLACEHOLDER: char = '\u{200B}';

/// Maps offsets computed on a transformed buffer back to offsets in the
/// original buffer.
///
/// The transformation is restricted to two segment shapes: verbatim runs
/// (copied byte for byte) and placeholder runs (an original tag of arbitrary
/// length collapsed to a single [`TAG_PLACEHOLDER`]). Segment starts form a
/// monotonic breakpoint table searched by binary search.
#[derive(Clone, Debug)]
pub struct OffsetMap {
    segments: Vec<Segment>,
    transformed_len: usize,
    original_len: usize,
}

#[derive(Clone, Copy, Debug)]
struct Segment {
    transformed: usize,
    original: usize,
    verbatim: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum OffsetError {
    #[error("offset {offset} past end of transformed buffer (len {len})")]
    OutOfRange { offset: usize, len: usize },
}

impl OffsetMap {
    /// The identity map for a buffer that needed no transformation.
    pub fn identity(len: usize) -> Self {
        Self {
            segments: vec![Segment {
                transformed: 0,
                original: 0,
                verbatim: true,
            }],
            transformed_len: len,
            original_len: len,
        }
    }

    /// Maps a transformed-buffer offset to the original buffer. Total over
    /// `0..=transformed_len`; anything past that is an extractor bug and
    /// surfaces as an error rather than a truncated result.
    pub fn map_back(&self, transformed: usize) -> Result<usize, OffsetError> {
        if transformed > self.transformed_len {
            return Err(OffsetError::OutOfRange {
                offset: transformed,
                len: self.transformed_len,
            });
        }
        if transformed == self.transformed_len {
            return Ok(self.original_len);
        }
        let index = match self
            .segments
            .binary_search_by_key(&transformed, |segment| segment.transformed)
        {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1),
        };
        let segment = self.segments[index];
        if segment.verbatim {
            Ok(segment.original + (transformed - segment.transformed))
        } else {
            // Offsets inside a collapsed tag resolve to the tag start.
            Ok(segment.original)
        }
    }

    pub fn map_span_back(&self, span: Span) -> Result<Span, OffsetError> {
        Ok(Span {
            start: self.map_back(span.start)?,
            end: self.map_back(span.end)?,
        })
    }
}

/// Accumulates segments while the extractor collapses tags.
#[derive(Debug, Default)]
pub(crate) struct OffsetMapBuilder {
    segments: Vec<Segment>,
    transformed_len: usize,
    original_len: usize,
}

impl OffsetMapBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_verbatim(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.segments.push(Segment {
            transformed: self.transformed_len,
            original: self.original_len,
            verbatim: true,
        });
        self.transformed_len += len;
        self.original_len += len;
    }

    pub(crate) fn push_placeholder(&mut self, original_len: usize) {
        self.segments.push(Segment {
            transformed: self.transformed_len,
            original: self.original_len,
            verbatim: false,
        });
        self.transformed_len += TAG_PLACEHOLDER.len_utf8();
        self.original_len += original_len;
    }

    pub(crate) fn finish(mut self) -> OffsetMap {
        if self.segments.is_empty() {
            self.segments.push(Segment {
                transformed: 0,
                original: 0,
                verbatim: true,
            });
        }
        OffsetMap {
            segments: self.segments,
            transformed_len: self.transformed_len,
            original_len: self.original_len,
        }
    }
}
