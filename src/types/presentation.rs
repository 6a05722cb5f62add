//! Presentation units and the fixed category → visual treatment table

use serde::{Deserialize, Serialize};
use crate::types::Category;

/// The three visual treatments a highlight can get
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Strong writing
    Positive,
    /// Room for improvement
    Caution,
    /// Weak writing
    Negative,
}

impl Tone {
    /// The one place categories map to treatments
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Strong => Tone::Positive,
            Category::Improvement => Tone::Caution,
            Category::Weak => Tone::Negative,
        }
    }

    /// CSS class used by the HTML painter
    pub fn css_class(&self) -> &'static str {
        match self {
            Tone::Positive => "highlight highlight-strong",
            Tone::Caution => "highlight highlight-improvement",
            Tone::Negative => "highlight highlight-weak",
        }
    }

    /// Marker used in no-color terminal output
    pub fn marker(&self) -> &'static str {
        match self {
            Tone::Positive => "+",
            Tone::Caution => "~",
            Tone::Negative => "-",
        }
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tone::Positive => "POSITIVE",
            Tone::Caution => "CAUTION",
            Tone::Negative => "NEGATIVE",
        };
        write!(f, "{}", name)
    }
}

/// A unit the renderer paints: plain text or a styled inline span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PresentationUnit {
    Plain {
        text: String,
    },
    Styled {
        text: String,
        category: Category,
        tone: Tone,
        /// Shown on hover; empty when the span had none
        feedback: String,
    },
}

impl PresentationUnit {
    /// Underlying characters, regardless of styling
    pub fn text(&self) -> &str {
        match self {
            PresentationUnit::Plain { text } => text,
            PresentationUnit::Styled { text, .. } => text,
        }
    }

    pub fn tone(&self) -> Option<Tone> {
        match self {
            PresentationUnit::Plain { .. } => None,
            PresentationUnit::Styled { tone, .. } => Some(*tone),
        }
    }
}
