//! Live caption session: segmentation, timing, and the worker loop.

pub mod clock;
pub mod runner;
pub mod segmenter;

pub use clock::{Clock, MockClock, SystemClock};
pub use runner::{SessionHandle, spawn};
pub use segmenter::{SegmenterConfig, SegmenterState, SpeechSegmenter};
