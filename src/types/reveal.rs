//! Reveal phases and what the view shows in each

use serde::{Deserialize, Serialize};
use crate::types::{PresentationUnit, ReasonCode};

/// Phase of one essay view's analysis reveal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevealPhase {
    /// No analysis has begun
    Idle,
    /// Analysis in flight, plain text with scan line
    Scanning { stage: u32 },
    /// Annotations shown
    Revealed,
}

impl RevealPhase {
    /// Whether the view shows annotations in this phase
    pub fn shows_annotations(&self) -> bool {
        matches!(self, RevealPhase::Revealed)
    }
}

impl std::fmt::Display for RevealPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RevealPhase::Idle => write!(f, "IDLE"),
            RevealPhase::Scanning { stage } => write!(f, "SCANNING({})", stage),
            RevealPhase::Revealed => write!(f, "REVEALED"),
        }
    }
}

/// One scan-line position update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanFrame {
    /// Frame number within this scan, starting at 1
    pub frame: u64,
    /// Distance scanned so far
    pub position: f64,
    /// Extent of the rendered block
    pub extent: f64,
    /// True on the last frame; no tick follows it
    pub done: bool,
}

impl ScanFrame {
    /// Fraction of the block scanned, 0.0-1.0
    pub fn progress(&self) -> f64 {
        if self.extent <= 0.0 {
            return 1.0;
        }
        (self.position / self.extent).clamp(0.0, 1.0)
    }
}

/// What the essay view should display right now
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealView {
    pub phase: RevealPhase,
    pub reason: ReasonCode,
    /// Scan-line position while a scan is running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_line: Option<f64>,
    pub units: Vec<PresentationUnit>,
}

impl RevealView {
    pub fn is_annotated(&self) -> bool {
        self.units
            .iter()
            .any(|u| matches!(u, PresentationUnit::Styled { .. }))
    }
}
