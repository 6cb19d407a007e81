//! Fire-and-forget channel carrying captions and status updates to the consumer.

use crossbeam_channel::{Receiver, Sender, unbounded};

/// An event delivered to the caption consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptionEvent {
    /// Transient, human-readable pipeline state. Not accumulated.
    Status(String),
    /// The current best-known full transcript. Replaces the previous caption.
    Caption(String),
}

/// Producer side of the caption channel.
///
/// Cloneable (multi-producer); the consumer holds the `Receiver`. There is
/// no backpressure: sends never block, and a disconnected consumer is
/// silently ignored so the pipeline keeps running headless.
#[derive(Debug, Clone)]
pub struct CaptionPublisher {
    tx: Sender<CaptionEvent>,
}

impl CaptionPublisher {
    /// Create a publisher and its consumer endpoint.
    pub fn channel() -> (Self, Receiver<CaptionEvent>) {
        let (tx, rx) = unbounded();
        (Self { tx }, rx)
    }

    /// Publish a transient status message.
    pub fn status(&self, message: impl Into<String>) {
        let _ = self.tx.send(CaptionEvent::Status(message.into()));
    }

    /// Publish the current full caption text.
    pub fn caption(&self, text: impl Into<String>) {
        let _ = self.tx.send(CaptionEvent::Caption(text.into()));
    }
}
