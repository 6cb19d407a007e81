//! Session-scoped cache of finalized utterance transcripts.

/// Ordered, append-only collection of finalized utterance texts.
///
/// Grows only when an utterance is finalized; lives for the whole session.
/// Composition is deterministic: the same entries always produce the same
/// cumulative caption text.
#[derive(Debug, Default)]
pub struct CaptionCache {
    entries: Vec<String>,
}

impl CaptionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized utterance transcript.
    pub fn push(&mut self, text: String) {
        self.entries.push(text);
    }

    /// The cumulative caption text for all finalized utterances.
    ///
    /// Empty entries (silence-only utterances) are skipped so they never
    /// leave stray spaces in the composed text.
    pub fn compose(&self) -> String {
        self.entries
            .iter()
            .filter(|entry| !entry.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The cumulative caption text with an in-flight partial transcript
    /// appended. The partial is not retained.
    pub fn compose_with_partial(&self, partial: &str) -> String {
        let composed = self.compose();
        if composed.is_empty() {
            partial.to_string()
        } else if partial.is_empty() {
            composed
        } else {
            format!("{} {}", composed, partial)
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finalized entries in arrival order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}
