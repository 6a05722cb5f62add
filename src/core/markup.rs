//! Markup builder: render plan → presentation units → HTML / terminal
//!
//! Painting never changes the underlying characters; concatenating unit
//! text always reproduces the essay.

use colored::Colorize;
use crate::types::{PresentationUnit, RenderPlan, Tone};

/// Convert a resolved plan into presentation units
pub fn to_presentation(plan: &RenderPlan) -> Vec<PresentationUnit> {
    plan.segments
        .iter()
        .map(|segment| match segment.category {
            None => PresentationUnit::Plain {
                text: segment.text.clone(),
            },
            Some(category) => PresentationUnit::Styled {
                text: segment.text.clone(),
                category,
                tone: Tone::for_category(category),
                feedback: segment.feedback.clone().unwrap_or_default(),
            },
        })
        .collect()
}

/// Plain-text content of the units
pub fn plain_text(units: &[PresentationUnit]) -> String {
    units.iter().map(|u| u.text()).collect()
}

/// Paint units as inline HTML spans
pub fn render_html(units: &[PresentationUnit]) -> String {
    let mut html = String::new();
    for unit in units {
        match unit {
            PresentationUnit::Plain { text } => html.push_str(&escape_html(text)),
            PresentationUnit::Styled {
                text,
                tone,
                feedback,
                ..
            } => {
                html.push_str("<span class=\"");
                html.push_str(tone.css_class());
                html.push_str("\" data-feedback=\"");
                html.push_str(&escape_html(feedback));
                html.push_str("\">");
                html.push_str(&escape_html(text));
                html.push_str("</span>");
            }
        }
    }
    html
}

/// Paint units for a terminal
///
/// With color, highlights get a background per tone and feedback is left
/// out. Without color, highlights are bracketed with a numbered footnote
/// listing their feedback.
pub fn render_terminal(units: &[PresentationUnit], color: bool) -> String {
    if color {
        return units
            .iter()
            .map(|unit| match unit {
                PresentationUnit::Plain { text } => text.normal().to_string(),
                PresentationUnit::Styled { text, tone, .. } => paint(text, *tone),
            })
            .collect();
    }

    let mut body = String::new();
    let mut notes = Vec::new();
    for unit in units {
        match unit {
            PresentationUnit::Plain { text } => body.push_str(text),
            PresentationUnit::Styled {
                text,
                tone,
                feedback,
                ..
            } => {
                body.push('[');
                body.push_str(text);
                body.push(']');
                if !feedback.is_empty() {
                    notes.push(format!("{}{}", tone.marker(), feedback));
                    body.push_str(&format!("^{}", notes.len()));
                }
            }
        }
    }
    for (i, note) in notes.iter().enumerate() {
        body.push_str(&format!("\n  ^{} {}", i + 1, note));
    }
    body
}

fn paint(text: &str, tone: Tone) -> String {
    match tone {
        Tone::Positive => text.black().on_green().to_string(),
        Tone::Caution => text.black().on_yellow().to_string(),
        Tone::Negative => text.white().on_red().to_string(),
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// =============================================================================
// TESTS
// =============================================================================
