//! Highlight spans as produced by the upstream feedback generator

use serde::{Deserialize, Serialize};

/// Feedback category of a highlight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Something the essay does well
    Strong,
    /// Acceptable but could be better
    Improvement,
    /// Needs rework
    Weak,
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Category::Strong => "strong",
            Category::Improvement => "improvement",
            Category::Weak => "weak",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A content-addressed highlight: located by its literal text, not an offset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightSpan {
    /// Literal substring to find in the essay
    pub text: String,
    /// Feedback category (`type` on the wire)
    #[serde(rename = "type")]
    pub category: Category,
    /// Explanatory note shown on interaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

impl HighlightSpan {
    pub fn new(text: impl Into<String>, category: Category) -> Self {
        Self {
            text: text.into(),
            category,
            feedback: None,
        }
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }
}
