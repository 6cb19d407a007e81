//! Caption session entry point.
//!
//! Orchestrates the complete live-caption flow:
//! capture → segment → transcribe → translate → render

use crate::audio::AudioIngest;
use crate::caption::CaptionPublisher;
use crate::config::Config;
use crate::error::Result;
use crate::output::spawn_renderer;
use crate::session::{SegmenterConfig, SpeechSegmenter};
use crate::stt::TranscriptionSink;
use crate::translate::create_translator;
use crate::vad::{EnergyVad, EnergyVadConfig};
use crossbeam_channel::unbounded;

/// CLI overrides applied on top of the loaded configuration.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub device: Option<String>,
    pub model: Option<String>,
    pub language: Option<String>,
    pub target_lang: Option<String>,
}

/// Run the caption session until Ctrl+C.
///
/// Engine initialization failure is fatal. Translator initialization
/// failure is not: the session runs degraded with untranslated captions.
pub async fn run_captions(mut config: Config, overrides: CliOverrides, quiet: bool) -> Result<()> {
    // Suppress noisy JACK/ALSA warnings before audio init
    crate::audio::capture::suppress_audio_warnings();

    apply_overrides(&mut config, overrides);
    config.validate()?;

    let (publisher, event_rx) = CaptionPublisher::channel();
    let renderer = spawn_renderer(event_rx, quiet);

    let outcome = run_session(config, &publisher).await;

    // Fatal errors surface on the consumer channel before the session ends.
    if let Err(e) = &outcome {
        publisher.status(format!("Session failed: {}", e));
    }

    // All publisher clones are gone after this; the renderer drains and exits.
    drop(publisher);
    let _ = renderer.join();

    if let Ok(Some((stats, model_name))) = &outcome
        && !quiet
    {
        eprintln!("{}", stats.summary(model_name));
    }
    outcome.map(|_| ())
}

/// Wire up the pipeline and run it until interrupted.
///
/// Returns the session stats and model name, or `None` if the worker
/// panicked.
async fn run_session(
    config: Config,
    publisher: &CaptionPublisher,
) -> Result<Option<(crate::stt::TranscriberStats, String)>> {
    publisher.status(format!(
        "Loading model '{}' ({} backend)...",
        config.stt.model,
        crate::defaults::gpu_backend()
    ));
    let engine = crate::stt::create_engine(&config.stt)?;

    let translator = match create_translator(&config.translation) {
        Ok(translator) => {
            if let Some(t) = &translator {
                publisher.status(format!("Translating with {}.", t.name()));
            }
            translator
        }
        Err(e) => {
            eprintln!("Translator unavailable, captions stay untranslated: {}", e);
            publisher.status("Translator unavailable; captions stay untranslated.");
            None
        }
    };

    let sink = TranscriptionSink::new(engine, translator)?;
    let model_name = sink.model_name().to_string();

    let vad = EnergyVad::new(EnergyVadConfig {
        threshold: config.audio.vad_threshold,
        silence_duration_ms: config.audio.silence_duration_ms,
        ..Default::default()
    });
    let segmenter = SpeechSegmenter::new(
        SegmenterConfig::from_config(&config),
        vad,
        sink,
        publisher.clone(),
    );

    let (frame_tx, frame_rx) = unbounded();
    let mut ingest = AudioIngest::open(config.audio.device.as_deref(), frame_tx)?;
    ingest.start()?;
    if let Some(name) = ingest.device_name() {
        publisher.status(format!("Capturing from '{}'.", name));
    }

    let handle = crate::session::spawn(segmenter, frame_rx, publisher.clone());
    publisher.status("Listening... press Ctrl+C to stop.");

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Signal handler failed: {}", e);
    }
    publisher.status("Stopping...");

    // Stop the microphone first so the worker's drain sees the full tail
    // of the last utterance, then wait for the worker to finish it. The
    // worker handles sink teardown and the final "Stopped." status on
    // every exit path.
    if let Err(e) = ingest.stop() {
        eprintln!("Failed to stop audio capture: {}", e);
    }
    Ok(handle.stop().map(|stats| (stats, model_name)))
}

fn apply_overrides(config: &mut Config, overrides: CliOverrides) {
    if let Some(device) = overrides.device {
        config.audio.device = Some(device);
    }
    if let Some(model) = overrides.model {
        config.stt.model = model;
    }
    if let Some(language) = overrides.language {
        config.stt.language = language;
    }
    if let Some(target_lang) = overrides.target_lang {
        config.translation.target_lang = target_lang;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply() {
        let mut config = Config::default();
        apply_overrides(
            &mut config,
            CliOverrides {
                device: Some("pipewire".to_string()),
                model: Some("small".to_string()),
                language: Some("de".to_string()),
                target_lang: Some("en".to_string()),
            },
        );
        assert_eq!(config.audio.device.as_deref(), Some("pipewire"));
        assert_eq!(config.stt.model, "small");
        assert_eq!(config.stt.language, "de");
        assert_eq!(config.translation.target_lang, "en");
    }

    #[test]
    fn test_empty_overrides_keep_config() {
        let mut config = Config::default();
        config.stt.model = "medium".to_string();
        apply_overrides(&mut config, CliOverrides::default());
        assert_eq!(config.stt.model, "medium");
        assert_eq!(config.audio.device, None);
    }
}
