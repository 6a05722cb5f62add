//! Essaymark: essay annotation engine
//!
//! Pipeline: essay + highlights → SpanResolver → RenderPlan → markup → display,
//! gated by the RevealController while an analysis is in flight.

pub mod core;
pub mod error;
pub mod types;

pub use error::EssaymarkError;

// =============================================================================
// SCAN ANIMATION
// =============================================================================

/// Distance the scan line moves per frame (display units)
pub const SCAN_STEP_UNITS: f64 = 100.0;

/// Interval between scan frames (milliseconds), roughly one 60 Hz refresh
pub const FRAME_INTERVAL_MS: u64 = 16;

/// Block extent used when the caller doesn't measure the rendered essay
pub const DEFAULT_BLOCK_EXTENT: f64 = 600.0;

// =============================================================================
// REVEAL
// =============================================================================

/// First analysis stage at which annotations are shown
pub const REVEAL_STAGE: u32 = 3;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
