//! Span Resolver: turns essay + highlight spans into a gap-free render plan
//!
//! Steps:
//! 1. Locate each span's first occurrence in the pristine essay
//! 2. Stable-sort by that position (ties keep input order)
//! 3. Walk left to right with a forward-only cursor into the original text
//! 4. Drop spans that aren't found or that start behind the cursor

use tracing::debug;
use crate::core::locator::{locate_all, Located};
use crate::types::{DroppedSpan, HighlightSpan, ReasonCode, RenderPlan, Segment};

/// Span resolver. Stateless: the same input always yields the same plan.
#[derive(Debug, Default)]
pub struct SpanResolver;

impl SpanResolver {
    /// Create new resolver
    pub fn new() -> Self {
        Self
    }

    /// Resolve spans against the essay into an ordered, non-overlapping plan
    pub fn resolve(&self, essay: &str, spans: &[HighlightSpan]) -> RenderPlan {
        let mut located = locate_all(essay, spans);
        let mut dropped = Vec::new();

        // Vec::sort_by_key is stable, so equal starts keep input order
        located.sort_by_key(|l| l.start().unwrap_or(usize::MAX));

        let mut segments = Vec::with_capacity(located.len() * 2 + 1);
        let mut cursor = 0;

        for entry in &located {
            let range = match &entry.located {
                Located::Found(range) => range.clone(),
                Located::Missing(reason) => {
                    debug!(index = entry.index, text = %entry.span.text, reason = reason.code(), "span dropped");
                    dropped.push(drop_of(entry.index, &entry.span.text, *reason));
                    continue;
                }
            };

            if range.start < cursor {
                debug!(
                    index = entry.index,
                    start = range.start,
                    cursor,
                    "span overlaps consumed text, dropped"
                );
                dropped.push(drop_of(
                    entry.index,
                    &entry.span.text,
                    ReasonCode::A002_OVERLAP_DROPPED,
                ));
                continue;
            }

            if range.start > cursor {
                segments.push(Segment::plain(&essay[cursor..range.start]));
            }
            segments.push(Segment::tagged(
                &essay[range.clone()],
                entry.span.category,
                entry.span.feedback.clone(),
            ));
            cursor = range.end;
        }

        if cursor < essay.len() {
            segments.push(Segment::plain(&essay[cursor..]));
        }

        dropped.sort_by_key(|d| d.index);
        RenderPlan { segments, dropped }
    }
}

fn drop_of(index: usize, text: &str, reason: ReasonCode) -> DroppedSpan {
    DroppedSpan {
        index,
        text: text.to_string(),
        reason,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use pretty_assertions::assert_eq;

    fn span(text: &str, category: Category) -> HighlightSpan {
        HighlightSpan::new(text, category)
    }

    #[test]
    fn test_single_highlight() {
        let plan = SpanResolver::new().resolve("The cat sat.", &[span("cat", Category::Strong)]);
        assert_eq!(
            plan.segments,
            vec![
                Segment::plain("The "),
                Segment::tagged("cat", Category::Strong, None),
                Segment::plain(" sat."),
            ]
        );
        assert!(plan.dropped.is_empty());
    }

    #[test]
    fn test_orders_by_position_not_input() {
        let spans = vec![span("sat", Category::Weak), span("The", Category::Strong)];
        let plan = SpanResolver::new().resolve("The cat sat.", &spans);
        assert_eq!(
            plan.segments,
            vec![
                Segment::tagged("The", Category::Strong, None),
                Segment::plain(" cat "),
                Segment::tagged("sat", Category::Weak, None),
                Segment::plain("."),
            ]
        );
    }

    #[test]
    fn test_duplicate_text_second_dropped() {
        let spans = vec![span("aa", Category::Strong), span("aa", Category::Weak)];
        let plan = SpanResolver::new().resolve("aa bb aa", &spans);
        assert_eq!(
            plan.segments,
            vec![
                Segment::tagged("aa", Category::Strong, None),
                Segment::plain(" bb aa"),
            ]
        );
        assert_eq!(plan.dropped.len(), 1);
        assert_eq!(plan.dropped[0].index, 1);
        assert_eq!(plan.dropped[0].reason, ReasonCode::A002_OVERLAP_DROPPED);
    }

    #[test]
    fn test_not_found_is_omitted() {
        let plan = SpanResolver::new().resolve("The cat sat.", &[span("zzz", Category::Weak)]);
        assert_eq!(plan.segments, vec![Segment::plain("The cat sat.")]);
        assert_eq!(plan.dropped[0].reason, ReasonCode::A001_SPAN_NOT_FOUND);
    }

    #[test]
    fn test_partial_overlap_dropped() {
        let spans = vec![span("bc", Category::Weak), span("abc", Category::Strong)];
        let plan = SpanResolver::new().resolve("xabcx", &spans);
        assert_eq!(
            plan.segments,
            vec![
                Segment::plain("x"),
                Segment::tagged("abc", Category::Strong, None),
                Segment::plain("x"),
            ]
        );
        assert_eq!(plan.dropped[0].index, 0);
    }

    #[test]
    fn test_adjacent_spans_kept() {
        let spans = vec![span("ab", Category::Strong), span("cd", Category::Weak)];
        let plan = SpanResolver::new().resolve("abcd", &spans);
        assert_eq!(plan.segments.len(), 2);
        assert!(plan.dropped.is_empty());
    }

    #[test]
    fn test_empty_inputs() {
        let resolver = SpanResolver::new();
        assert!(resolver.resolve("", &[]).is_empty());
        assert!(resolver.resolve("", &[span("a", Category::Weak)]).segments.is_empty());
        assert_eq!(resolver.resolve("abc", &[]).segments, vec![Segment::plain("abc")]);
    }

    #[test]
    fn test_empty_span_text_dropped() {
        let plan = SpanResolver::new().resolve("abc", &[span("", Category::Strong)]);
        assert_eq!(plan.segments, vec![Segment::plain("abc")]);
        assert_eq!(plan.dropped[0].reason, ReasonCode::A001_SPAN_EMPTY);
    }

    #[test]
    fn test_feedback_carried() {
        let spans = vec![span("cat", Category::Improvement).with_feedback("Be specific")];
        let plan = SpanResolver::new().resolve("The cat sat.", &spans);
        let tagged: Vec<_> = plan.tagged().collect();
        assert_eq!(tagged[0].feedback.as_deref(), Some("Be specific"));
    }

    #[test]
    fn test_whole_essay_highlighted() {
        let plan = SpanResolver::new().resolve("All of it.", &[span("All of it.", Category::Strong)]);
        assert_eq!(plan.segments.len(), 1);
        assert_eq!(plan.plain_text(), "All of it.");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::types::Category;
    use proptest::prelude::*;

    fn category() -> impl Strategy<Value = Category> {
        prop_oneof![
            Just(Category::Strong),
            Just(Category::Improvement),
            Just(Category::Weak),
        ]
    }

    fn spans_for(essay: String) -> impl Strategy<Value = (String, Vec<HighlightSpan>)> {
        let len = essay.chars().count();
        // Mix of real substrings (by char window) and arbitrary text
        let windowed = (0..=len, 0..=len, category()).prop_map({
            let essay = essay.clone();
            move |(a, b, c)| {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                let text: String = essay.chars().skip(lo).take(hi - lo).collect();
                HighlightSpan::new(text, c)
            }
        });
        let arbitrary = ("[a-z ]{0,4}", category()).prop_map(|(t, c)| HighlightSpan::new(t, c));
        prop::collection::vec(prop_oneof![windowed, arbitrary], 0..8)
            .prop_map(move |spans| (essay.clone(), spans))
    }

    fn essay_and_spans() -> impl Strategy<Value = (String, Vec<HighlightSpan>)> {
        "[a-cé ]{0,40}".prop_flat_map(spans_for)
    }

    proptest! {
        /// Property: segments concatenate back to the essay
        #[test]
        fn content_preserved((essay, spans) in essay_and_spans()) {
            let plan = SpanResolver::new().resolve(&essay, &spans);
            prop_assert_eq!(plan.plain_text(), essay.clone());
            prop_assert_eq!(plan.len(), essay.len());
        }

        /// Property: no empty segments, no two plain segments in a row
        #[test]
        fn segments_well_formed((essay, spans) in essay_and_spans()) {
            let plan = SpanResolver::new().resolve(&essay, &spans);
            for s in &plan.segments {
                prop_assert!(!s.text.is_empty());
            }
            for pair in plan.segments.windows(2) {
                prop_assert!(pair[0].is_tagged() || pair[1].is_tagged());
            }
        }

        /// Property: every span is either painted or reported dropped
        #[test]
        fn every_span_accounted_for((essay, spans) in essay_and_spans()) {
            let plan = SpanResolver::new().resolve(&essay, &spans);
            prop_assert_eq!(plan.tagged().count() + plan.dropped.len(), spans.len());
        }

        /// Property: resolving twice gives the same plan
        #[test]
        fn idempotent((essay, spans) in essay_and_spans()) {
            let resolver = SpanResolver::new();
            prop_assert_eq!(resolver.resolve(&essay, &spans), resolver.resolve(&essay, &spans));
        }
    }
}
