//! Audio capture and framing.

pub mod capture;
pub mod frame;

pub use capture::{AudioIngest, InputDevice, list_devices};
pub use frame::AudioFrame;
