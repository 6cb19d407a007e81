//! Fixed-size audio frames flowing from the capture callback to the segmenter.

use crate::defaults;

/// A fixed-size frame of mono f32 samples at 16kHz.
///
/// Produced by the capture callback (which copies out of driver-owned
/// memory), owned by the frame channel until the session worker consumes it.
/// Timing is implicit in arrival order; `sequence` allows gap detection.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Mono PCM samples in the range [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Sequence number for ordering and gap detection.
    pub sequence: u64,
}

impl AudioFrame {
    /// Creates a new audio frame.
    pub fn new(samples: Vec<f32>, sequence: u64) -> Self {
        Self { samples, sequence }
    }

    /// Frame duration in seconds at the fixed sample rate.
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / defaults::SAMPLE_RATE as f32
    }
}
