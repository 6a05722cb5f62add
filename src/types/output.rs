//! Output structures for one annotation pass

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::types::{DroppedSpan, PresentationUnit, RenderPlan, Segment};

/// Everything a caller gets back from annotating an essay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationOutput {
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Resolved segments
    pub segments: Vec<Segment>,
    /// Presentation units built from the segments
    pub units: Vec<PresentationUnit>,
    /// Spans left out of the plan
    pub dropped: Vec<DroppedSpan>,
}

impl AnnotationOutput {
    pub fn new(plan: RenderPlan, units: Vec<PresentationUnit>) -> Self {
        Self {
            timestamp: Utc::now(),
            segments: plan.segments,
            units,
            dropped: plan.dropped,
        }
    }

    pub fn highlight_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_tagged()).count()
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "segments={} | highlights={} | dropped={}",
            self.segments.len(),
            self.highlight_count(),
            self.dropped.len()
        )
    }
}
