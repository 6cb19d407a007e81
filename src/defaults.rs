//! Default configuration constants for livecap.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

use std::time::Duration;

/// Audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and computational efficiency for voice applications.
/// The sample rate is fixed: the VAD frame size and the STT engines both
/// assume it.
pub const SAMPLE_RATE: u32 = 16000;

/// Frame size in samples delivered to the VAD and the segmenter.
///
/// 512 samples at 16kHz = 32ms per frame.
pub const CHUNK_SIZE: usize = 512;

/// Number of recent frames retained while idle.
///
/// Kept so that the start of an utterance is not clipped: the VAD confirms
/// speech a frame or two after the actual onset.
pub const LOOKBACK_CHUNKS: usize = 5;

/// Maximum utterance duration in seconds before a forced cut.
///
/// Bounds worst-case memory and caption latency for continuous speech with
/// no detectable pauses (lectures, read-aloud text).
pub const MAX_SPEECH_SECS: f32 = 15.0;

/// Minimum interval in seconds between live caption refreshes.
///
/// While an utterance is still open, the current buffer is re-transcribed at
/// this cadence so the caption keeps moving before the VAD confirms the end.
pub const MIN_REFRESH_SECS: f32 = 0.5;

/// Default Voice Activity Detection (VAD) threshold.
///
/// This RMS-based threshold (0.0 to 1.0) determines when audio is considered
/// speech. A value of 0.02 is tuned for typical microphone input levels and
/// provides good sensitivity while filtering out background noise.
pub const VAD_THRESHOLD: f32 = 0.02;

/// Default silence duration in milliseconds before speech is considered ended.
///
/// 2000ms tolerates natural pauses mid-sentence; the refresh mechanism keeps
/// the caption live during this confirmation window.
pub const SILENCE_DURATION_MS: u32 = 2000;

/// How long the session worker waits on the frame queue before re-checking
/// the stop flag. Also the upper bound on shutdown latency.
pub const QUEUE_POLL: Duration = Duration::from_millis(500);

/// Maximum caption line length for the terminal renderer.
pub const MAX_LINE_LENGTH: usize = 80;

/// Default Whisper model name.
///
/// "base" (multilingual) supports auto-detection of any language.
/// Use "base.en" explicitly for English-only optimized transcription.
pub const DEFAULT_MODEL: &str = "base";

/// Default language code for transcription.
///
/// "auto" lets the engine detect the spoken language.
pub const DEFAULT_LANGUAGE: &str = "auto";

/// Language value that triggers automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// Report the GPU backend compiled into this build.
///
/// Returns a human-readable name based on the compile-time feature flags.
/// Only one GPU backend can be active at a time; if none is enabled, returns "CPU".
pub fn gpu_backend() -> &'static str {
    if cfg!(feature = "cuda") {
        "CUDA"
    } else if cfg!(feature = "vulkan") {
        "Vulkan"
    } else {
        "CPU"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_duration_is_32ms() {
        let ms = CHUNK_SIZE as f64 * 1000.0 / SAMPLE_RATE as f64;
        assert_eq!(ms, 32.0);
    }

    #[test]
    fn lookback_window_is_under_a_quarter_second() {
        let secs = (LOOKBACK_CHUNKS * CHUNK_SIZE) as f64 / SAMPLE_RATE as f64;
        assert!(secs < 0.25, "lookback window too large: {}s", secs);
    }

    #[test]
    fn gpu_backend_matches_compiled_feature() {
        let expected = if cfg!(feature = "cuda") {
            "CUDA"
        } else if cfg!(feature = "vulkan") {
            "Vulkan"
        } else {
            "CPU"
        };
        assert_eq!(gpu_backend(), expected);
    }
}
