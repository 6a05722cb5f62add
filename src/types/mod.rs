//! Core types for Essaymark

mod highlight;
mod plan;
mod presentation;
mod reason;
mod reveal;
mod output;

pub use highlight::{Category, HighlightSpan};
pub use plan::{Segment, DroppedSpan, RenderPlan};
pub use presentation::{PresentationUnit, Tone};
pub use reason::ReasonCode;
pub use reveal::{RevealPhase, RevealView, ScanFrame};
pub use output::AnnotationOutput;
