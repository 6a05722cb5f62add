//! Render plan: the resolved, gap-free segment sequence over an essay

use serde::{Deserialize, Serialize};
use crate::types::{Category, ReasonCode};

/// One contiguous piece of the essay, tagged or plain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    /// `None` for plain text between highlights
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl Segment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: None,
            feedback: None,
        }
    }

    pub fn tagged(text: impl Into<String>, category: Category, feedback: Option<String>) -> Self {
        Self {
            text: text.into(),
            category: Some(category),
            feedback,
        }
    }

    pub fn is_tagged(&self) -> bool {
        self.category.is_some()
    }
}

/// A span the resolver left out of the plan, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedSpan {
    /// Position of the span in the caller's input list
    pub index: usize,
    pub text: String,
    pub reason: ReasonCode,
}

/// Ordered segments covering the essay end-to-end
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderPlan {
    pub segments: Vec<Segment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<DroppedSpan>,
}

impl RenderPlan {
    /// Concatenated segment text; always equals the resolved essay
    pub fn plain_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Total length in bytes
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.text.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn tagged(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| s.is_tagged())
    }
}
