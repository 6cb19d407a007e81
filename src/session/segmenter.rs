//! VAD-driven utterance segmentation and incremental captioning.
//!
//! One frame in, zero or more caption events out. The segmenter owns the
//! speech buffer and the finalized-utterance cache, and decides when the
//! transcription sink runs: on utterance end, on a forced max-duration
//! cut, or on a non-finalizing refresh while speech is in flight.

use crate::audio::AudioFrame;
use crate::caption::{CaptionCache, CaptionPublisher};
use crate::config::Config;
use crate::defaults;
use crate::error::Result;
use crate::session::clock::{Clock, SystemClock};
use crate::stt::{TranscriberStats, TranscriptionSink};
use crate::vad::{SpeechBoundary, VoiceActivityDetector};
use std::time::Instant;

/// Timing and buffering parameters for the segmenter.
#[derive(Debug, Clone, Copy)]
pub struct SegmenterConfig {
    /// Sample rate of incoming frames, Hz.
    pub sample_rate: u32,
    /// Samples per frame.
    pub chunk_size: usize,
    /// Frames of pre-speech audio kept while idle.
    pub lookback_chunks: usize,
    /// Forced-cut ceiling for one utterance, seconds.
    pub max_speech_secs: f32,
    /// Minimum interval between non-finalizing refreshes, seconds.
    pub min_refresh_secs: f32,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            chunk_size: defaults::CHUNK_SIZE,
            lookback_chunks: defaults::LOOKBACK_CHUNKS,
            max_speech_secs: defaults::MAX_SPEECH_SECS,
            min_refresh_secs: defaults::MIN_REFRESH_SECS,
        }
    }
}

impl SegmenterConfig {
    /// Build from the user configuration. Frame geometry is fixed; only
    /// the tunable timings come from the config file.
    pub fn from_config(config: &Config) -> Self {
        Self {
            lookback_chunks: config.segmenter.lookback_chunks,
            max_speech_secs: config.segmenter.max_speech_secs,
            min_refresh_secs: config.segmenter.min_refresh_secs,
            ..Self::default()
        }
    }
}

/// Whether the segmenter is accumulating an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// Keeping only a bounded lookback of recent audio.
    Idle,
    /// Accumulating speech for the in-flight utterance.
    Recording,
}

/// Turns a stream of audio frames into finalized and in-flight captions.
pub struct SpeechSegmenter<V: VoiceActivityDetector, C: Clock = SystemClock> {
    config: SegmenterConfig,
    vad: V,
    sink: TranscriptionSink,
    publisher: CaptionPublisher,
    clock: C,
    cache: CaptionCache,
    state: SegmenterState,
    /// Lookback while idle, the utterance buffer while recording.
    speech: Vec<f32>,
    last_refresh: Instant,
    max_speech_samples: usize,
    lookback_samples: usize,
}

impl<V: VoiceActivityDetector> SpeechSegmenter<V, SystemClock> {
    pub fn new(
        config: SegmenterConfig,
        vad: V,
        sink: TranscriptionSink,
        publisher: CaptionPublisher,
    ) -> Self {
        Self::with_clock(config, vad, sink, publisher, SystemClock)
    }
}

impl<V: VoiceActivityDetector, C: Clock> SpeechSegmenter<V, C> {
    pub fn with_clock(
        config: SegmenterConfig,
        vad: V,
        sink: TranscriptionSink,
        publisher: CaptionPublisher,
        clock: C,
    ) -> Self {
        let max_speech_samples =
            (config.max_speech_secs * config.sample_rate as f32) as usize;
        let lookback_samples = config.lookback_chunks * config.chunk_size;
        let last_refresh = clock.now();
        Self {
            config,
            vad,
            sink,
            publisher,
            clock,
            cache: CaptionCache::new(),
            state: SegmenterState::Idle,
            speech: Vec::new(),
            last_refresh,
            max_speech_samples,
            lookback_samples,
        }
    }

    /// Process one frame.
    ///
    /// While idle, the frame joins the bounded lookback; a speech start
    /// promotes the lookback (pre-speech context included) into the
    /// utterance buffer. While recording, exactly one of three things can
    /// happen, in priority order: the utterance is finalized on a speech
    /// end, force-cut at the duration ceiling, or refreshed if the
    /// interval since the last refresh allows.
    ///
    /// # Errors
    /// Transcription failure. The buffers are left intact so the caller
    /// may keep feeding frames.
    pub fn push_frame(&mut self, frame: &AudioFrame) -> Result<()> {
        let boundary = self.vad.step(&frame.samples);
        self.speech.extend_from_slice(&frame.samples);

        match self.state {
            SegmenterState::Idle => {
                // Trim before the transition so the promoted buffer never
                // exceeds the lookback window.
                if self.speech.len() > self.lookback_samples {
                    let excess = self.speech.len() - self.lookback_samples;
                    self.speech.drain(..excess);
                }
                if boundary == Some(SpeechBoundary::Start) {
                    self.state = SegmenterState::Recording;
                    self.last_refresh = self.clock.now();
                    self.publisher.status("Speech detected.");
                }
            }
            SegmenterState::Recording => {
                if boundary == Some(SpeechBoundary::End) {
                    self.finalize_utterance()?;
                } else if boundary.is_none() {
                    if self.speech.len() > self.max_speech_samples {
                        // Forced cut. The detector still thinks speech is
                        // in progress, so clear its trigger state or it
                        // would emit an End for the utterance we just
                        // finalized.
                        self.finalize_utterance()?;
                        self.vad.reset_transient_state();
                        self.publisher.status("Max utterance length reached, splitting.");
                    } else if self.refresh_due() {
                        self.refresh()?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Drain any frames left in the queue at shutdown and finalize the
    /// in-flight utterance, if one exists. No partial audio is dropped.
    pub fn shutdown(&mut self, remaining: impl Iterator<Item = AudioFrame>) -> Result<()> {
        if self.state == SegmenterState::Recording {
            for frame in remaining {
                self.speech.extend_from_slice(&frame.samples);
            }
            self.finalize_utterance()?;
        }
        Ok(())
    }

    /// Release sink resources. Idempotent.
    pub fn close(&mut self) {
        self.sink.close();
    }

    fn refresh_due(&self) -> bool {
        self.clock
            .now()
            .duration_since(self.last_refresh)
            .as_secs_f32()
            >= self.config.min_refresh_secs
    }

    /// Non-finalizing refresh: re-transcribe the whole in-flight buffer
    /// and publish it appended to the finalized text. The cache and the
    /// speech buffer are untouched.
    fn refresh(&mut self) -> Result<()> {
        let text = self.sink.transcribe(&self.speech)?;
        self.publisher
            .caption(self.cache.compose_with_partial(text.trim()));
        self.last_refresh = self.clock.now();
        Ok(())
    }

    /// Final transcription of the utterance buffer: the text joins the
    /// cache, the composed caption is published, and the segmenter
    /// returns to idle with an empty buffer.
    ///
    /// The cache grows by exactly one entry per finalize, even for a
    /// silence-only utterance; empty entries vanish at composition.
    fn finalize_utterance(&mut self) -> Result<()> {
        let text = self.sink.transcribe(&self.speech)?;
        self.cache.push(text.trim().to_string());
        self.publisher.caption(self.cache.compose());
        self.speech.clear();
        self.state = SegmenterState::Idle;
        Ok(())
    }

    pub fn state(&self) -> SegmenterState {
        self.state
    }

    pub fn cache(&self) -> &CaptionCache {
        &self.cache
    }

    /// Samples currently buffered (lookback or in-flight utterance).
    pub fn buffered_samples(&self) -> usize {
        self.speech.len()
    }

    pub fn stats(&self) -> TranscriberStats {
        self.sink.stats()
    }

    pub fn model_name(&self) -> &str {
        self.sink.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::CaptionEvent;
    use crate::session::clock::MockClock;
    use crate::stt::MockSttEngine;
    use crossbeam_channel::Receiver;
    use std::time::Duration;

    /// Detector driven by a pre-planned script of boundary events, one
    /// entry per frame.
    struct ScriptedVad {
        script: Vec<Option<SpeechBoundary>>,
        cursor: usize,
        resets: usize,
    }

    impl ScriptedVad {
        fn new(script: Vec<Option<SpeechBoundary>>) -> Self {
            Self {
                script,
                cursor: 0,
                resets: 0,
            }
        }
    }

    impl VoiceActivityDetector for ScriptedVad {
        fn step(&mut self, _frame: &[f32]) -> Option<SpeechBoundary> {
            let event = self.script.get(self.cursor).copied().flatten();
            self.cursor += 1;
            event
        }

        fn reset_transient_state(&mut self) {
            self.resets += 1;
        }
    }

    fn frame(sequence: u64) -> AudioFrame {
        AudioFrame::new(vec![0.1; defaults::CHUNK_SIZE], sequence)
    }

    fn segmenter(
        script: Vec<Option<SpeechBoundary>>,
        response: &str,
    ) -> (
        SpeechSegmenter<ScriptedVad, MockClock>,
        Receiver<CaptionEvent>,
        MockClock,
    ) {
        let engine = MockSttEngine::new("test-model").with_response(response);
        let sink = TranscriptionSink::new(Box::new(engine), None).unwrap();
        let (publisher, rx) = CaptionPublisher::channel();
        let clock = MockClock::new();
        let seg = SpeechSegmenter::with_clock(
            SegmenterConfig::default(),
            ScriptedVad::new(script),
            sink,
            publisher,
            clock.clone(),
        );
        (seg, rx, clock)
    }

    fn captions(rx: &Receiver<CaptionEvent>) -> Vec<String> {
        rx.try_iter()
            .filter_map(|event| match event {
                CaptionEvent::Caption(text) => Some(text),
                CaptionEvent::Status(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_stays_idle_without_speech_start() {
        let (mut seg, rx, _clock) = segmenter(vec![None; 100], "never");

        for i in 0..100 {
            seg.push_frame(&frame(i)).unwrap();
        }

        assert_eq!(seg.state(), SegmenterState::Idle);
        assert!(seg.cache().is_empty());
        assert!(captions(&rx).is_empty());
    }

    #[test]
    fn test_idle_lookback_is_bounded() {
        let (mut seg, _rx, _clock) = segmenter(vec![None; 50], "never");

        for i in 0..50 {
            seg.push_frame(&frame(i)).unwrap();
        }

        assert_eq!(
            seg.buffered_samples(),
            defaults::LOOKBACK_CHUNKS * defaults::CHUNK_SIZE
        );
    }

    #[test]
    fn test_start_then_end_finalizes_once() {
        let mut script = vec![None, None, Some(SpeechBoundary::Start)];
        script.extend(vec![None; 10]);
        script.push(Some(SpeechBoundary::End));
        let (mut seg, rx, _clock) = segmenter(script, "hello world");

        for i in 0..14 {
            seg.push_frame(&frame(i)).unwrap();
        }

        assert_eq!(seg.state(), SegmenterState::Idle);
        assert_eq!(seg.cache().entries(), &["hello world".to_string()]);
        assert_eq!(captions(&rx), vec!["hello world".to_string()]);
        assert_eq!(seg.buffered_samples(), 0);
    }

    #[test]
    fn test_lookback_included_in_utterance() {
        // Idle frames before the start must be part of the transcribed
        // buffer: 5 lookback frames + 3 recording frames.
        let mut script = vec![None; 9];
        script[5] = Some(SpeechBoundary::Start);
        script.push(Some(SpeechBoundary::End));

        let engine = MockSttEngine::new("test-model").with_response("ok");
        let log = engine.call_log();
        let sink = TranscriptionSink::new(Box::new(engine), None).unwrap();
        let (publisher, _rx) = CaptionPublisher::channel();
        let mut seg = SpeechSegmenter::with_clock(
            SegmenterConfig::default(),
            ScriptedVad::new(script),
            sink,
            publisher,
            MockClock::new(),
        );

        for i in 0..10 {
            seg.push_frame(&frame(i)).unwrap();
        }

        // Last call is the finalize; the warm-up is first. The lookback
        // window (start frame included) is trimmed to 5 frames before the
        // transition, then 4 more frames accumulate.
        let lengths = log.lock().unwrap();
        assert_eq!(*lengths.last().unwrap(), 9 * defaults::CHUNK_SIZE);
    }

    #[test]
    fn test_max_duration_forces_cut_and_soft_reset() {
        // Start, then speech that never ends.
        let mut script = vec![Some(SpeechBoundary::Start)];
        let frames_to_ceiling = (defaults::MAX_SPEECH_SECS * defaults::SAMPLE_RATE as f32)
            as usize
            / defaults::CHUNK_SIZE
            + 2;
        script.extend(vec![None; frames_to_ceiling]);

        let engine = MockSttEngine::new("test-model").with_response("long speech");
        let sink = TranscriptionSink::new(Box::new(engine), None).unwrap();
        let (publisher, rx) = CaptionPublisher::channel();
        let mut seg = SpeechSegmenter::with_clock(
            SegmenterConfig::default(),
            ScriptedVad::new(script),
            sink,
            publisher,
            MockClock::new(),
        );

        for i in 0..(frames_to_ceiling as u64 + 1) {
            seg.push_frame(&frame(i)).unwrap();
        }

        assert_eq!(seg.cache().len(), 1);
        assert_eq!(seg.vad.resets, 1);
        assert_eq!(seg.state(), SegmenterState::Idle);
        assert_eq!(captions(&rx), vec!["long speech".to_string()]);
    }

    #[test]
    fn test_refresh_respects_min_interval() {
        let mut script = vec![Some(SpeechBoundary::Start)];
        script.extend(vec![None; 20]);
        let (mut seg, rx, clock) = segmenter(script, "partial");

        seg.push_frame(&frame(0)).unwrap();
        // Ten frames with no time passing: no refresh may fire
        for i in 1..11 {
            seg.push_frame(&frame(i)).unwrap();
        }
        assert!(captions(&rx).is_empty());

        // Cross the refresh interval: exactly one refresh on the next frame
        clock.advance(Duration::from_secs_f32(defaults::MIN_REFRESH_SECS));
        seg.push_frame(&frame(11)).unwrap();
        assert_eq!(captions(&rx), vec!["partial".to_string()]);

        // Immediately after, the interval gates again
        seg.push_frame(&frame(12)).unwrap();
        assert!(captions(&rx).is_empty());
    }

    #[test]
    fn test_refresh_does_not_touch_cache_or_buffer() {
        let mut script = vec![Some(SpeechBoundary::Start)];
        script.extend(vec![None; 5]);
        let (mut seg, _rx, clock) = segmenter(script, "partial");

        seg.push_frame(&frame(0)).unwrap();
        clock.advance(Duration::from_secs(1));
        seg.push_frame(&frame(1)).unwrap();

        assert!(seg.cache().is_empty());
        assert_eq!(seg.state(), SegmenterState::Recording);
        assert_eq!(seg.buffered_samples(), 2 * defaults::CHUNK_SIZE);
    }

    #[test]
    fn test_refresh_appends_partial_to_finalized_text() {
        // One finished utterance, then a refresh during the second.
        let mut script = vec![Some(SpeechBoundary::Start), Some(SpeechBoundary::End)];
        script.push(Some(SpeechBoundary::Start));
        script.extend(vec![None; 3]);
        let (mut seg, rx, clock) = segmenter(script, "words");

        seg.push_frame(&frame(0)).unwrap();
        seg.push_frame(&frame(1)).unwrap();
        seg.push_frame(&frame(2)).unwrap();
        clock.advance(Duration::from_secs(1));
        seg.push_frame(&frame(3)).unwrap();

        let published = captions(&rx);
        assert_eq!(published, vec!["words".to_string(), "words words".to_string()]);
    }

    #[test]
    fn test_end_takes_priority_over_refresh() {
        let script = vec![Some(SpeechBoundary::Start), Some(SpeechBoundary::End)];
        let (mut seg, rx, clock) = segmenter(script, "quick");

        seg.push_frame(&frame(0)).unwrap();
        clock.advance(Duration::from_secs(10));
        seg.push_frame(&frame(1)).unwrap();

        // One finalize, no separate refresh caption
        assert_eq!(captions(&rx), vec!["quick".to_string()]);
        assert_eq!(seg.cache().len(), 1);
    }

    #[test]
    fn test_shutdown_finalizes_in_flight_utterance() {
        let script = vec![Some(SpeechBoundary::Start), None, None];
        let (mut seg, rx, _clock) = segmenter(script, "tail words");

        seg.push_frame(&frame(0)).unwrap();
        let leftover = vec![frame(1), frame(2)];
        seg.shutdown(leftover.into_iter()).unwrap();

        assert_eq!(seg.state(), SegmenterState::Idle);
        assert_eq!(seg.cache().entries(), &["tail words".to_string()]);
        assert_eq!(captions(&rx), vec!["tail words".to_string()]);
    }

    #[test]
    fn test_shutdown_while_idle_is_a_no_op() {
        let (mut seg, rx, _clock) = segmenter(vec![None; 4], "never");

        seg.push_frame(&frame(0)).unwrap();
        seg.shutdown(vec![frame(1)].into_iter()).unwrap();

        assert!(seg.cache().is_empty());
        assert!(captions(&rx).is_empty());
        // One warm-up inference only
        assert_eq!(seg.stats().inferences, 1);
    }

    #[test]
    fn test_silence_only_utterance_caches_empty_entry() {
        // Engine returns "" for all-zero audio. The cache still grows by
        // one entry per finalize; the empty entry disappears on compose.
        let script = vec![Some(SpeechBoundary::Start), Some(SpeechBoundary::End)];
        let engine = MockSttEngine::new("test-model");
        let sink = TranscriptionSink::new(Box::new(engine), None).unwrap();
        let (publisher, rx) = CaptionPublisher::channel();
        let mut seg = SpeechSegmenter::with_clock(
            SegmenterConfig::default(),
            ScriptedVad::new(script),
            sink,
            publisher,
            MockClock::new(),
        );

        let silent = AudioFrame::new(vec![0.0; defaults::CHUNK_SIZE], 0);
        seg.push_frame(&silent).unwrap();
        seg.push_frame(&AudioFrame::new(vec![0.0; defaults::CHUNK_SIZE], 1))
            .unwrap();

        assert_eq!(seg.cache().len(), 1);
        assert_eq!(seg.cache().compose(), "");
        assert_eq!(captions(&rx), vec!["".to_string()]);
    }

    #[test]
    fn test_transcription_error_leaves_buffers_intact() {
        let script = vec![Some(SpeechBoundary::Start), Some(SpeechBoundary::End)];
        // Warm-up must succeed, so fail from the second call onward.
        struct FlakyEngine {
            calls: usize,
        }
        impl crate::stt::SpeechToText for FlakyEngine {
            fn transcribe(&mut self, _samples: &[f32]) -> crate::error::Result<String> {
                self.calls += 1;
                if self.calls > 1 {
                    Err(crate::error::LivecapError::Transcription {
                        message: "flaky".to_string(),
                    })
                } else {
                    Ok(String::new())
                }
            }
            fn model_name(&self) -> &str {
                "flaky"
            }
        }

        let sink = TranscriptionSink::new(Box::new(FlakyEngine { calls: 0 }), None).unwrap();
        let (publisher, _rx) = CaptionPublisher::channel();
        let mut seg = SpeechSegmenter::with_clock(
            SegmenterConfig::default(),
            ScriptedVad::new(script),
            sink,
            publisher,
            MockClock::new(),
        );

        seg.push_frame(&frame(0)).unwrap();
        assert!(seg.push_frame(&frame(1)).is_err());

        // Still recording, audio still buffered
        assert_eq!(seg.state(), SegmenterState::Recording);
        assert_eq!(seg.buffered_samples(), 2 * defaults::CHUNK_SIZE);
    }

    #[test]
    fn test_two_utterances_compose_in_order() {
        let script = vec![
            Some(SpeechBoundary::Start),
            Some(SpeechBoundary::End),
            Some(SpeechBoundary::Start),
            Some(SpeechBoundary::End),
        ];
        let (mut seg, rx, _clock) = segmenter(script, "again");

        for i in 0..4 {
            seg.push_frame(&frame(i)).unwrap();
        }

        assert_eq!(seg.cache().len(), 2);
        assert_eq!(
            captions(&rx).last().unwrap(),
            &"again again".to_string()
        );
    }
}
