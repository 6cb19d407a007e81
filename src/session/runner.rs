//! Worker thread driving the segmenter from the frame queue.

use crate::audio::AudioFrame;
use crate::caption::CaptionPublisher;
use crate::defaults;
use crate::session::clock::Clock;
use crate::session::segmenter::SpeechSegmenter;
use crate::stt::TranscriberStats;
use crate::vad::VoiceActivityDetector;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

/// Handle to a running caption session.
///
/// Dropping the handle without calling [`stop`](Self::stop) detaches the
/// worker; it keeps running until the frame channel disconnects.
pub struct SessionHandle {
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<TranscriberStats>>,
}

impl SessionHandle {
    /// Signal the worker to stop and wait for it to drain and finish.
    ///
    /// Returns the session stats, or `None` if the worker panicked.
    pub fn stop(mut self) -> Option<TranscriberStats> {
        self.stop.store(true, Ordering::SeqCst);
        self.worker.take().and_then(|worker| worker.join().ok())
    }
}

/// Spawn the session worker.
///
/// The worker polls the frame queue with a short timeout so the stop flag
/// is observed within one poll interval even when the microphone goes
/// quiet. A transcription error is reported and the loop keeps going;
/// losing one utterance must not end the session.
///
/// On stop, frames still queued are drained into the in-flight utterance
/// and finalized before the worker exits.
pub fn spawn<V, C>(
    mut segmenter: SpeechSegmenter<V, C>,
    frame_rx: Receiver<AudioFrame>,
    publisher: CaptionPublisher,
) -> SessionHandle
where
    V: VoiceActivityDetector + 'static,
    C: Clock + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);

    let worker = thread::spawn(move || {
        loop {
            if stop_flag.load(Ordering::SeqCst) {
                break;
            }
            match frame_rx.recv_timeout(defaults::QUEUE_POLL) {
                Ok(frame) => {
                    if let Err(e) = segmenter.push_frame(&frame) {
                        eprintln!("Transcription error: {}", e);
                        publisher.status(format!("Transcription error: {}", e));
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        if let Err(e) = segmenter.shutdown(frame_rx.try_iter()) {
            eprintln!("Failed to finalize last utterance: {}", e);
        }
        segmenter.close();
        publisher.status("Stopped.");
        segmenter.stats()
    });

    SessionHandle {
        stop,
        worker: Some(worker),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::CaptionEvent;
    use crate::session::clock::MockClock;
    use crate::session::segmenter::SegmenterConfig;
    use crate::stt::{MockSttEngine, TranscriptionSink};
    use crate::vad::SpeechBoundary;
    use crossbeam_channel::unbounded;

    struct IdleVad;

    impl VoiceActivityDetector for IdleVad {
        fn step(&mut self, _frame: &[f32]) -> Option<SpeechBoundary> {
            None
        }
        fn reset_transient_state(&mut self) {}
    }

    fn make_segmenter(
        vad: impl VoiceActivityDetector + 'static,
    ) -> (
        SpeechSegmenter<impl VoiceActivityDetector, MockClock>,
        Receiver<CaptionEvent>,
        CaptionPublisher,
    ) {
        let engine = MockSttEngine::new("test-model").with_response("drained");
        let sink = TranscriptionSink::new(Box::new(engine), None).unwrap();
        let (publisher, rx) = CaptionPublisher::channel();
        let segmenter = SpeechSegmenter::with_clock(
            SegmenterConfig::default(),
            vad,
            sink,
            publisher.clone(),
            MockClock::new(),
        );
        (segmenter, rx, publisher)
    }

    #[test]
    fn test_stop_on_quiet_queue_returns_promptly() {
        let (segmenter, _rx, publisher) = make_segmenter(IdleVad);
        let (_frame_tx, frame_rx) = unbounded();

        let handle = spawn(segmenter, frame_rx, publisher);
        let stats = handle.stop().expect("worker must not panic");

        // Warm-up only; no frames were processed
        assert_eq!(stats.inferences, 1);
    }

    #[test]
    fn test_disconnected_channel_ends_worker() {
        let (segmenter, rx, publisher) = make_segmenter(IdleVad);
        let (frame_tx, frame_rx) = unbounded::<AudioFrame>();

        let handle = spawn(segmenter, frame_rx, publisher);
        drop(frame_tx);

        // Worker exits on disconnect without the stop flag
        let stats = handle
            .worker
            .expect("worker present")
            .join()
            .expect("worker must not panic");
        assert_eq!(stats.inferences, 1);
        assert!(
            rx.try_iter()
                .any(|e| e == CaptionEvent::Status("Stopped.".to_string()))
        );
    }

    #[test]
    fn test_stop_drains_and_finalizes_in_flight_utterance() {
        struct StartOnceVad {
            started: bool,
        }
        impl VoiceActivityDetector for StartOnceVad {
            fn step(&mut self, _frame: &[f32]) -> Option<SpeechBoundary> {
                if self.started {
                    None
                } else {
                    self.started = true;
                    Some(SpeechBoundary::Start)
                }
            }
            fn reset_transient_state(&mut self) {}
        }

        let (segmenter, rx, publisher) = make_segmenter(StartOnceVad { started: false });
        let (frame_tx, frame_rx) = unbounded();

        let handle = spawn(segmenter, frame_rx, publisher);
        for i in 0..4u64 {
            frame_tx
                .send(AudioFrame::new(vec![0.1; defaults::CHUNK_SIZE], i))
                .unwrap();
        }

        // Let the worker pick everything up before signalling stop, so
        // the utterance is in flight when the drain runs.
        while !frame_tx.is_empty() {
            thread::sleep(std::time::Duration::from_millis(1));
        }

        let stats = handle.stop().expect("worker must not panic");

        // Warm-up + exactly one finalize for the in-flight utterance
        assert_eq!(stats.inferences, 2);
        let captions: Vec<_> = rx
            .try_iter()
            .filter(|e| matches!(e, CaptionEvent::Caption(_)))
            .collect();
        assert_eq!(
            captions,
            vec![CaptionEvent::Caption("drained".to_string())]
        );
    }
}
