//! Caption state and the consumer-facing event channel.

pub mod cache;
pub mod publisher;

pub use cache::CaptionCache;
pub use publisher::{CaptionEvent, CaptionPublisher};
