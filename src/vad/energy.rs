//! RMS-energy voice-activity detector.
//!
//! Classifies frames by RMS level against a threshold, confirms utterance
//! ends after a configurable run of silent samples, and keeps a slow
//! noise-floor estimate so the effective threshold adapts to ambient level.
//! Timing is counted in samples, not wall-clock, so behavior is
//! deterministic for a given frame sequence.

use crate::defaults;
use crate::vad::{SpeechBoundary, VoiceActivityDetector};

/// Multiplier applied to the noise-floor estimate when deriving the
/// effective threshold. Speech must clear the ambient level by this factor.
const NOISE_FLOOR_MARGIN: f32 = 3.0;

/// Smoothing factor for the noise-floor EMA, updated once per idle frame.
const NOISE_FLOOR_ALPHA: f32 = 0.05;

/// Configuration for the energy detector.
#[derive(Debug, Clone, Copy)]
pub struct EnergyVadConfig {
    /// Minimum RMS level for speech (0.0 to 1.0).
    pub threshold: f32,
    /// Duration of continuous silence before speech is considered ended (milliseconds).
    pub silence_duration_ms: u32,
    /// Sample rate in Hz, used to convert the silence duration to samples.
    pub sample_rate: u32,
}

impl Default for EnergyVadConfig {
    fn default() -> Self {
        Self {
            threshold: defaults::VAD_THRESHOLD,
            silence_duration_ms: defaults::SILENCE_DURATION_MS,
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

/// Energy-based voice-activity detector.
pub struct EnergyVad {
    config: EnergyVadConfig,
    silence_samples_needed: u64,
    /// Whether we are inside an utterance (speech seen, end not yet confirmed).
    triggered: bool,
    /// Silent samples seen since the last speech frame while triggered.
    silence_samples: u64,
    /// EMA of idle RMS level. Calibration: survives soft resets.
    noise_floor: f32,
}

impl EnergyVad {
    pub fn new(config: EnergyVadConfig) -> Self {
        let silence_samples_needed =
            config.silence_duration_ms as u64 * config.sample_rate as u64 / 1000;
        Self {
            config,
            silence_samples_needed,
            triggered: false,
            silence_samples: 0,
            noise_floor: 0.0,
        }
    }

    /// The threshold actually applied, adapted to the ambient noise floor.
    fn effective_threshold(&self) -> f32 {
        self.config.threshold.max(self.noise_floor * NOISE_FLOOR_MARGIN)
    }

    /// Current noise-floor estimate (for level meters and diagnostics).
    pub fn noise_floor(&self) -> f32 {
        self.noise_floor
    }

    /// Returns true while the detector is inside an utterance.
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }
}

impl VoiceActivityDetector for EnergyVad {
    fn step(&mut self, frame: &[f32]) -> Option<SpeechBoundary> {
        let rms = calculate_rms(frame);
        let is_speech = rms > self.effective_threshold();

        if !self.triggered {
            if is_speech {
                self.triggered = true;
                self.silence_samples = 0;
                return Some(SpeechBoundary::Start);
            }
            // Only idle frames feed the calibration, so the floor tracks
            // ambient noise rather than speech.
            self.noise_floor += NOISE_FLOOR_ALPHA * (rms - self.noise_floor);
            return None;
        }

        if is_speech {
            self.silence_samples = 0;
            return None;
        }

        self.silence_samples += frame.len() as u64;
        if self.silence_samples >= self.silence_samples_needed {
            self.triggered = false;
            self.silence_samples = 0;
            return Some(SpeechBoundary::End);
        }

        None
    }

    fn reset_transient_state(&mut self) {
        self.triggered = false;
        self.silence_samples = 0;
        // noise_floor deliberately kept
    }
}

/// Calculates the Root Mean Square (RMS) of audio samples.
///
/// # Returns
/// RMS value where 0.0 is silence and ~0.707 is a full-scale sine wave.
pub fn calculate_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}
