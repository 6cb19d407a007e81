//! Transcription sink: STT engine + optional translator + counters.
//!
//! The single entry point the segmenter uses to turn audio into caption
//! text. Construction performs one warm-up inference on silence so model
//! load cost is paid before the real-time loop starts.

use crate::defaults;
use crate::error::Result;
use crate::stt::engine::SpeechToText;
use crate::translate::Translator;
use std::time::Instant;

/// Cumulative transcription counters for one session.
///
/// Monotonically increasing; read for the end-of-session report.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TranscriberStats {
    /// Number of inference calls, warm-up included.
    pub inferences: u64,
    /// Total wall time spent in inference + translation, in seconds.
    pub inference_secs: f64,
    /// Total duration of audio processed, in seconds.
    pub speech_secs: f64,
}

impl TranscriberStats {
    /// Mean wall time per inference call, in seconds.
    pub fn mean_inference_secs(&self) -> f64 {
        if self.inferences == 0 {
            0.0
        } else {
            self.inference_secs / self.inferences as f64
        }
    }

    /// Speech seconds processed per second of inference. Above 1.0 means
    /// the engine keeps up with real time.
    pub fn realtime_factor(&self) -> f64 {
        if self.inference_secs == 0.0 {
            0.0
        } else {
            self.speech_secs / self.inference_secs
        }
    }

    /// Render the end-of-session report.
    pub fn summary(&self, model_name: &str) -> String {
        format!(
            "           model name :  {}\n\
                 number inferences :  {}\n\
               mean inference time :  {:.2}s\n\
             model realtime factor :  {:.2}x",
            model_name,
            self.inferences,
            self.mean_inference_secs(),
            self.realtime_factor(),
        )
    }
}

/// Wraps the STT engine and optional translator behind one call.
pub struct TranscriptionSink {
    engine: Box<dyn SpeechToText>,
    translator: Option<Box<dyn Translator>>,
    stats: TranscriberStats,
}

impl TranscriptionSink {
    /// Build the sink and run the warm-up inference.
    ///
    /// The warm-up transcribes one second of zeros through the full path
    /// and is counted in the stats, so the first real utterance doesn't
    /// absorb model load/JIT latency.
    ///
    /// # Errors
    /// A failing warm-up means the engine is unusable: fatal for the session.
    pub fn new(
        engine: Box<dyn SpeechToText>,
        translator: Option<Box<dyn Translator>>,
    ) -> Result<Self> {
        let mut sink = Self {
            engine,
            translator,
            stats: TranscriberStats::default(),
        };
        sink.transcribe(&vec![0.0; defaults::SAMPLE_RATE as usize])?;
        Ok(sink)
    }

    /// Transcribe one sample buffer, translating if configured.
    ///
    /// Safe to call repeatedly, including on empty or silent buffers.
    /// Translation is skipped for text that is empty after trimming; a
    /// translation error falls back to the untranslated text and never
    /// fails the call.
    pub fn transcribe(&mut self, samples: &[f32]) -> Result<String> {
        self.stats.inferences += 1;
        self.stats.speech_secs += samples.len() as f64 / defaults::SAMPLE_RATE as f64;
        let started = Instant::now();

        let mut text = self.engine.transcribe(samples)?;

        if let Some(translator) = &mut self.translator
            && !text.trim().is_empty()
        {
            match translator.translate(&text) {
                Ok(translated) => text = translated,
                Err(e) => {
                    eprintln!("Translation failed, using original text: {}", e);
                }
            }
        }

        self.stats.inference_secs += started.elapsed().as_secs_f64();
        Ok(text)
    }

    /// Release translator resources. Idempotent; runs on every session
    /// exit path before the stats are reported.
    pub fn close(&mut self) {
        if let Some(translator) = &mut self.translator {
            translator.close();
        }
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> TranscriberStats {
        self.stats
    }

    /// Name of the loaded model.
    pub fn model_name(&self) -> &str {
        self.engine.model_name()
    }

    /// Name of the active translation backend, if any.
    pub fn translator_name(&self) -> Option<&str> {
        self.translator.as_deref().map(|t| t.name())
    }
}

/// Backstop for exit paths that never reach the worker's explicit
/// teardown (for example a capture-open failure after the sink is
/// built): translator resources are still released.
impl Drop for TranscriptionSink {
    fn drop(&mut self) {
        self.close();
    }
}
