//! Reveal Controller: state machine gating when annotations are shown
//!
//! Phase transitions:
//! - IDLE → SCANNING(0): `begin` (scan timer armed)
//! - SCANNING(n) → SCANNING(m), m > n: `advance_stage` (timer disarmed)
//! - SCANNING → REVEALED: stage ≥ 3, or `finish` (timer disarmed)
//! - any → IDLE: `teardown` (timer disarmed)
//!
//! The scan timer is a generation-stamped token. Every transition that ends
//! a scan bumps or clears the armed generation, so a stale token can never
//! produce another frame.

use std::time::Duration;
use tracing::{debug, info, warn};
use crate::{DEFAULT_BLOCK_EXTENT, FRAME_INTERVAL_MS, REVEAL_STAGE, SCAN_STEP_UNITS};
use crate::core::markup::to_presentation;
use crate::core::SpanResolver;
use crate::types::{HighlightSpan, PresentationUnit, ReasonCode, RevealPhase, RevealView, ScanFrame};

/// Scan animation settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanConfig {
    /// Distance the scan line moves per frame
    pub step: f64,
    /// Time between frames
    pub frame_interval: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            step: SCAN_STEP_UNITS,
            frame_interval: Duration::from_millis(FRAME_INTERVAL_MS),
        }
    }
}

impl ScanConfig {
    /// Replace a non-positive step or zero interval with the defaults
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            step: if self.step.is_finite() && self.step > 0.0 { self.step } else { defaults.step },
            frame_interval: if self.frame_interval.is_zero() {
                defaults.frame_interval
            } else {
                self.frame_interval
            },
        }
    }

    /// Number of frames a full scan over `extent` takes
    pub fn frames_for(&self, extent: f64) -> u64 {
        let extent = scan_extent(extent);
        if extent <= 0.0 || self.step <= 0.0 {
            return 1;
        }
        (extent / self.step).ceil().max(1.0) as u64
    }
}

/// Extent a scan actually covers: negative or NaN is 0, +inf is the default block
fn scan_extent(extent: f64) -> f64 {
    if extent == f64::INFINITY {
        DEFAULT_BLOCK_EXTENT
    } else if extent > 0.0 {
        extent
    } else {
        0.0
    }
}

/// Handle for one armed scan. Only the controller that issued it can honor it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanTimer {
    generation: u64,
}

/// Reveal state machine for one essay view
#[derive(Debug)]
pub struct RevealController {
    config: ScanConfig,
    /// Current phase
    phase: RevealPhase,
    /// Last stage reported by the caller
    stage: u32,
    /// Analysis flag
    analyzing: bool,
    /// Distance scanned so far
    cursor: f64,
    /// Extent of the rendered block
    extent: f64,
    /// Frames produced by the current scan
    frames: u64,
    /// Bumped on every `begin` and `teardown`
    generation: u64,
    /// Generation of the armed scan timer, if any
    armed: Option<u64>,
    /// Reason for the current phase
    reason: ReasonCode,
    resolver: SpanResolver,
}

impl Default for RevealController {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

impl RevealController {
    /// Create new controller in IDLE
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config: config.sanitized(),
            phase: RevealPhase::Idle,
            stage: 0,
            analyzing: false,
            cursor: 0.0,
            extent: 0.0,
            frames: 0,
            generation: 0,
            armed: None,
            reason: ReasonCode::A003_STATE_IDLE,
            resolver: SpanResolver::new(),
        }
    }

    /// Start a new analysis, cancelling any in-flight one
    pub fn begin(&mut self, extent: f64) -> ScanTimer {
        self.disarm(ReasonCode::A004_SCAN_CANCELLED);

        self.generation += 1;
        self.phase = RevealPhase::Scanning { stage: 0 };
        self.stage = 0;
        self.analyzing = true;
        self.cursor = 0.0;
        self.extent = scan_extent(extent);
        self.frames = 0;
        self.armed = Some(self.generation);
        self.reason = ReasonCode::A003_TRANSITION_TO_SCANNING;

        info!(generation = self.generation, extent = self.extent, "analysis started");
        ScanTimer {
            generation: self.generation,
        }
    }

    /// Advance the scan line by one frame
    ///
    /// Returns `None` once the timer is no longer armed; the caller must not
    /// schedule another tick after that.
    pub fn tick(&mut self, timer: &ScanTimer) -> Option<ScanFrame> {
        if self.armed != Some(timer.generation) {
            debug!(generation = timer.generation, "stale scan tick ignored");
            return None;
        }

        self.cursor += self.config.step;
        self.frames += 1;
        let done = self.cursor >= self.extent;

        let frame = ScanFrame {
            frame: self.frames,
            position: self.cursor.min(self.extent),
            extent: self.extent,
            done,
        };

        if done {
            self.disarm(ReasonCode::A004_SCAN_COMPLETE);
        }
        Some(frame)
    }

    /// Caller-reported analysis stage. Stages only move forward.
    pub fn advance_stage(&mut self, stage: u32) -> ReasonCode {
        if !self.analyzing {
            debug!(stage, "stage ignored, no analysis in flight");
            return self.reason;
        }
        if stage < self.stage {
            warn!(from = self.stage, to = stage, "stage regression ignored");
            return ReasonCode::A003_STAGE_REGRESSION_IGNORED;
        }
        if stage == self.stage {
            return self.reason;
        }

        self.stage = stage;
        self.disarm(ReasonCode::A004_SCAN_CANCELLED);

        if stage >= REVEAL_STAGE {
            self.reveal();
        } else {
            self.phase = RevealPhase::Scanning { stage };
            self.reason = ReasonCode::A003_STAGE_ADVANCED;
            debug!(stage, "stage advanced");
        }
        self.reason
    }

    /// Analysis flag cleared: show results
    pub fn finish(&mut self) -> ReasonCode {
        if !self.analyzing {
            return self.reason;
        }
        self.analyzing = false;
        self.disarm(ReasonCode::A004_SCAN_CANCELLED);
        self.reveal();
        self.reason
    }

    /// View destroyed: cancel everything and return to IDLE
    pub fn teardown(&mut self) {
        self.disarm(ReasonCode::A004_SCAN_CANCELLED);
        let generation = self.generation + 1;
        *self = Self {
            generation,
            reason: ReasonCode::A003_TORN_DOWN,
            ..Self::new(self.config)
        };
        debug!(generation, "view torn down");
    }

    /// What the view should display for this essay and highlight list
    pub fn view(&self, essay: &str, spans: &[HighlightSpan]) -> RevealView {
        let units = if self.phase.shows_annotations() {
            to_presentation(&self.resolver.resolve(essay, spans))
        } else if essay.is_empty() {
            Vec::new()
        } else {
            vec![PresentationUnit::Plain {
                text: essay.to_string(),
            }]
        };

        RevealView {
            phase: self.phase,
            reason: self.reason,
            scan_line: self.armed.map(|_| self.cursor.min(self.extent)),
            units,
        }
    }

    fn reveal(&mut self) {
        if self.phase != RevealPhase::Revealed {
            info!(stage = self.stage, "annotations revealed");
        }
        self.phase = RevealPhase::Revealed;
        self.reason = ReasonCode::A003_TRANSITION_TO_REVEALED;
    }

    fn disarm(&mut self, reason: ReasonCode) {
        if let Some(generation) = self.armed.take() {
            debug!(generation, frames = self.frames, reason = reason.code(), "scan timer disarmed");
        }
    }

    /// Get current phase
    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    /// Get last reported stage
    pub fn stage(&self) -> u32 {
        self.stage
    }

    /// Get analysis flag
    pub fn is_analyzing(&self) -> bool {
        self.analyzing
    }

    /// Is a scan timer armed?
    pub fn is_scanning(&self) -> bool {
        self.armed.is_some()
    }

    /// Get scan cursor position
    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    /// Get block extent
    pub fn extent(&self) -> f64 {
        self.extent
    }

    /// Get frames produced by the current scan
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Latest frame of the current or last scan, `done` once the timer is disarmed
    pub fn last_frame(&self) -> Option<ScanFrame> {
        (self.frames > 0).then(|| ScanFrame {
            frame: self.frames,
            position: self.cursor.min(self.extent),
            extent: self.extent,
            done: self.armed.is_none(),
        })
    }

    /// Get reason for the current phase
    pub fn reason(&self) -> ReasonCode {
        self.reason
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn spans() -> Vec<HighlightSpan> {
        vec![HighlightSpan::new("cat", Category::Strong)]
    }

    #[test]
    fn test_initial_state_is_idle() {
        let controller = RevealController::default();
        assert_eq!(controller.phase(), RevealPhase::Idle);
        assert!(!controller.is_scanning());
        let view = controller.view("The cat sat.", &spans());
        assert!(!view.is_annotated());
    }

    #[test]
    fn test_begin_arms_scan() {
        let mut controller = RevealController::default();
        controller.begin(300.0);
        assert_eq!(controller.phase(), RevealPhase::Scanning { stage: 0 });
        assert!(controller.is_scanning());
        assert_eq!(controller.view("x", &[]).scan_line, Some(0.0));
    }

    #[test]
    fn test_scan_self_terminates() {
        let mut controller = RevealController::default();
        let timer = controller.begin(250.0);

        let positions: Vec<f64> = std::iter::from_fn(|| controller.tick(&timer))
            .map(|f| f.position)
            .collect();

        assert_eq!(positions, vec![100.0, 200.0, 250.0]);
        assert!(!controller.is_scanning());
        assert!(controller.tick(&timer).is_none());
    }

    #[test]
    fn test_last_frame_marked_done() {
        let mut controller = RevealController::default();
        let timer = controller.begin(200.0);
        assert!(!controller.tick(&timer).unwrap().done);
        assert!(controller.tick(&timer).unwrap().done);
    }

    #[test]
    fn test_zero_extent_single_frame() {
        let mut controller = RevealController::default();
        let timer = controller.begin(0.0);
        let frame = controller.tick(&timer).unwrap();
        assert!(frame.done);
        assert_eq!(frame.progress(), 1.0);
        assert!(controller.tick(&timer).is_none());
    }

    #[test]
    fn test_stage_advance_cancels_timer() {
        let mut controller = RevealController::default();
        let timer = controller.begin(1000.0);
        controller.tick(&timer);

        controller.advance_stage(1);
        assert_eq!(controller.phase(), RevealPhase::Scanning { stage: 1 });
        assert!(!controller.is_scanning());
        assert!(controller.tick(&timer).is_none());
    }

    #[test]
    fn test_plain_until_reveal_stage() {
        let mut controller = RevealController::default();
        controller.begin(100.0);
        for stage in 1..REVEAL_STAGE {
            controller.advance_stage(stage);
            assert!(!controller.view("The cat sat.", &spans()).is_annotated());
        }
        controller.advance_stage(REVEAL_STAGE);
        assert_eq!(controller.phase(), RevealPhase::Revealed);
        assert!(controller.view("The cat sat.", &spans()).is_annotated());
    }

    #[test]
    fn test_finish_reveals_and_cancels() {
        let mut controller = RevealController::default();
        let timer = controller.begin(1000.0);
        assert_eq!(controller.finish(), ReasonCode::A003_TRANSITION_TO_REVEALED);
        assert!(controller.tick(&timer).is_none());
        assert!(controller.view("The cat sat.", &spans()).is_annotated());
    }

    #[test]
    fn test_stage_regression_ignored() {
        let mut controller = RevealController::default();
        controller.begin(100.0);
        controller.advance_stage(2);
        assert_eq!(controller.advance_stage(1), ReasonCode::A003_STAGE_REGRESSION_IGNORED);
        assert_eq!(controller.stage(), 2);
    }

    #[test]
    fn test_stage_without_analysis_ignored() {
        let mut controller = RevealController::default();
        controller.advance_stage(5);
        assert_eq!(controller.phase(), RevealPhase::Idle);
    }

    #[test]
    fn test_rebegin_invalidates_old_timer() {
        let mut controller = RevealController::default();
        let old = controller.begin(1000.0);
        controller.tick(&old);
        let new = controller.begin(1000.0);

        assert!(controller.tick(&old).is_none());
        let frame = controller.tick(&new).unwrap();
        assert_eq!(frame.frame, 1);
        assert_eq!(frame.position, 100.0);
    }

    #[test]
    fn test_teardown_returns_to_idle() {
        let mut controller = RevealController::default();
        let timer = controller.begin(1000.0);
        controller.teardown();

        assert_eq!(controller.phase(), RevealPhase::Idle);
        assert_eq!(controller.reason(), ReasonCode::A003_TORN_DOWN);
        assert!(controller.tick(&timer).is_none());

        // A fresh analysis after teardown must not revive the old token
        let fresh = controller.begin(1000.0);
        assert_ne!(fresh, timer);
        assert!(controller.tick(&timer).is_none());
    }

    #[test]
    fn test_bad_config_sanitized() {
        let controller = RevealController::new(ScanConfig {
            step: 0.0,
            frame_interval: Duration::ZERO,
        });
        assert_eq!(*controller.config(), ScanConfig::default());
    }

    #[test]
    fn test_frames_for() {
        let config = ScanConfig::default();
        assert_eq!(config.frames_for(250.0), 3);
        assert_eq!(config.frames_for(300.0), 3);
        assert_eq!(config.frames_for(0.0), 1);
    }

    #[test]
    fn test_non_finite_extent_still_terminates() {
        let mut controller = RevealController::default();
        let timer = controller.begin(f64::INFINITY);
        assert_eq!(controller.extent(), DEFAULT_BLOCK_EXTENT);

        let frames = std::iter::from_fn(|| controller.tick(&timer)).count() as u64;
        assert_eq!(frames, controller.config().frames_for(f64::INFINITY));
        assert!(!controller.is_scanning());

        let timer = controller.begin(f64::NAN);
        assert_eq!(controller.extent(), 0.0);
        assert!(controller.tick(&timer).unwrap().done);

        controller.begin(f64::NEG_INFINITY);
        assert_eq!(controller.extent(), 0.0);
    }

    #[test]
    fn test_last_frame_after_cancel() {
        let mut controller = RevealController::default();
        let timer = controller.begin(1000.0);
        assert_eq!(controller.last_frame(), None);

        controller.tick(&timer);
        assert!(!controller.last_frame().unwrap().done);

        controller.advance_stage(1);
        let frame = controller.last_frame().unwrap();
        assert!(frame.done);
        assert_eq!(frame.position, 100.0);
    }

    #[test]
    fn test_empty_essay_view() {
        let mut controller = RevealController::default();
        assert!(controller.view("", &spans()).units.is_empty());
        controller.begin(0.0);
        controller.finish();
        assert!(controller.view("", &spans()).units.is_empty());
    }
}
