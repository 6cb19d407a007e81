//! Voice-activity detection interface.
//!
//! The segmenter consumes VAD as a capability: fixed-size frames in,
//! optional boundary events out. Detector internals (thresholds, timers,
//! calibration) stay behind this boundary; the segmenter never reaches in.

pub mod energy;

pub use energy::{EnergyVad, EnergyVadConfig};

/// An utterance boundary signalled by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechBoundary {
    /// Speech onset detected in this frame.
    Start,
    /// Speech end confirmed (silence lasted the configured duration).
    End,
}

/// A voice-activity detector operating on fixed-size frames at 16kHz.
pub trait VoiceActivityDetector: Send {
    /// Classify one frame and report a boundary event, if any.
    ///
    /// `End` carries up to the configured silence-confirmation duration of
    /// latency: the detector waits that long before committing to the end
    /// of an utterance.
    fn step(&mut self, frame: &[f32]) -> Option<SpeechBoundary>;

    /// Clear transient trigger/timing state without discarding calibrated
    /// parameters (noise floor, thresholds).
    ///
    /// Called after a forced max-duration cut so the detector doesn't
    /// immediately re-emit an `End` for the already-finalized utterance.
    fn reset_transient_state(&mut self);
}
