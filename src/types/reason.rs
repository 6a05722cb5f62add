//! Reason codes for dropped spans and reveal transitions

use serde::{Deserialize, Serialize};

/// Reason codes for every recoverable condition and state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // A001: Locate
    // =========================================================================
    /// Span text does not occur in the essay
    A001_SPAN_NOT_FOUND,
    /// Span text is empty, nothing to paint
    A001_SPAN_EMPTY,

    // =========================================================================
    // A002: Overlap
    // =========================================================================
    /// Span starts inside a region already consumed by an earlier span
    A002_OVERLAP_DROPPED,

    // =========================================================================
    // A003: Reveal transitions
    // =========================================================================
    /// No analysis has begun
    A003_STATE_IDLE,
    /// Analysis began, scan running
    A003_TRANSITION_TO_SCANNING,
    /// Stage advanced, still scanning
    A003_STAGE_ADVANCED,
    /// Stage moved backwards, ignored
    A003_STAGE_REGRESSION_IGNORED,
    /// Reveal stage reached or analysis finished
    A003_TRANSITION_TO_REVEALED,
    /// View destroyed
    A003_TORN_DOWN,

    // =========================================================================
    // A004: Scan timer
    // =========================================================================
    /// Scan line reached the end of the block
    A004_SCAN_COMPLETE,
    /// Scan cancelled before reaching the end
    A004_SCAN_CANCELLED,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::A001_SPAN_NOT_FOUND => "A001_SPAN_NOT_FOUND",
            Self::A001_SPAN_EMPTY => "A001_SPAN_EMPTY",
            Self::A002_OVERLAP_DROPPED => "A002_OVERLAP_DROPPED",
            Self::A003_STATE_IDLE => "A003_STATE_IDLE",
            Self::A003_TRANSITION_TO_SCANNING => "A003_TRANSITION_TO_SCANNING",
            Self::A003_STAGE_ADVANCED => "A003_STAGE_ADVANCED",
            Self::A003_STAGE_REGRESSION_IGNORED => "A003_STAGE_REGRESSION_IGNORED",
            Self::A003_TRANSITION_TO_REVEALED => "A003_TRANSITION_TO_REVEALED",
            Self::A003_TORN_DOWN => "A003_TORN_DOWN",
            Self::A004_SCAN_COMPLETE => "A004_SCAN_COMPLETE",
            Self::A004_SCAN_CANCELLED => "A004_SCAN_CANCELLED",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::A001_SPAN_NOT_FOUND => "Highlight text not found in essay",
            Self::A001_SPAN_EMPTY => "Highlight text is empty",
            Self::A002_OVERLAP_DROPPED => "Highlight overlaps an earlier highlight",
            Self::A003_STATE_IDLE => "No analysis in progress",
            Self::A003_TRANSITION_TO_SCANNING => "Scanning essay",
            Self::A003_STAGE_ADVANCED => "Analysis stage advanced",
            Self::A003_STAGE_REGRESSION_IGNORED => "Stage regression ignored",
            Self::A003_TRANSITION_TO_REVEALED => "Annotations revealed",
            Self::A003_TORN_DOWN => "View torn down",
            Self::A004_SCAN_COMPLETE => "Scan line reached the end",
            Self::A004_SCAN_CANCELLED => "Scan cancelled",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
