//! Substring locator: finds where each highlight's literal text first occurs
//!
//! Lookups are independent: every span is matched against the pristine essay,
//! so two spans naming the same text land on the same occurrence.

use std::ops::Range;
use crate::types::{HighlightSpan, ReasonCode};

/// Result of locating one span
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    /// Byte range of the first occurrence
    Found(Range<usize>),
    /// Span can't be placed
    Missing(ReasonCode),
}

/// A span paired with its input index and located position
#[derive(Debug, Clone)]
pub struct LocatedSpan<'a> {
    pub index: usize,
    pub span: &'a HighlightSpan,
    pub located: Located,
}

impl LocatedSpan<'_> {
    /// Ordering key: start of the first occurrence
    pub fn start(&self) -> Option<usize> {
        match &self.located {
            Located::Found(range) => Some(range.start),
            Located::Missing(_) => None,
        }
    }
}

/// Locate the first occurrence of `needle` in `haystack`
///
/// Empty needles are never located: a zero-width highlight paints nothing.
pub fn locate(haystack: &str, needle: &str) -> Located {
    if needle.is_empty() {
        return Located::Missing(ReasonCode::A001_SPAN_EMPTY);
    }
    match haystack.find(needle) {
        Some(start) => Located::Found(start..start + needle.len()),
        None => Located::Missing(ReasonCode::A001_SPAN_NOT_FOUND),
    }
}

/// Locate every span, preserving input order
pub fn locate_all<'a>(essay: &str, spans: &'a [HighlightSpan]) -> Vec<LocatedSpan<'a>> {
    spans
        .iter()
        .enumerate()
        .map(|(index, span)| LocatedSpan {
            index,
            span,
            located: locate(essay, &span.text),
        })
        .collect()
}
