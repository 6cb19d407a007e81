//! Live microphone capture using CPAL (Cross-Platform Audio Library).
//!
//! Opens exactly one input device at 16kHz mono f32 and delivers fixed
//! 512-sample frames into an unbounded channel. The hardware callback only
//! copies and pushes; it never blocks, infers, or touches the filesystem.

use crate::audio::frame::AudioFrame;
use crate::defaults;
use crate::error::{LivecapError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// This suppresses noisy ALSA/JACK/PipeWire messages that CPAL triggers
/// when probing audio backends. The messages are harmless but confusing to users.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2 (stderr).
/// Safe as long as no other thread is concurrently manipulating fd 2.
fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

/// Suppress noisy JACK/ALSA error messages that occur during audio backend probing.
///
/// # Safety
/// This modifies environment variables which is safe when called before spawning threads.
pub fn suppress_audio_warnings() {
    // SAFETY: Called at startup before any threads are spawned
    unsafe {
        std::env::set_var("JACK_NO_START_SERVER", "1");
        std::env::set_var("JACK_NO_AUDIO_RESERVATION", "1");
        std::env::set_var("PIPEWIRE_DEBUG", "0");
        std::env::set_var("ALSA_DEBUG", "0");
        std::env::set_var("PW_LOG", "0");
    }
}

/// An input device as reported to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDevice {
    /// Index into the host's input device list.
    pub id: usize,
    /// Human-readable device name.
    pub name: String,
}

/// List all available audio input devices.
///
/// # Errors
/// Returns `LivecapError::AudioCapture` if device enumeration fails.
///
/// # Note
/// During enumeration, cpal may output ALSA/JACK warnings to stderr while
/// probing backends. These warnings are harmless and suppressed here.
pub fn list_devices() -> Result<Vec<InputDevice>> {
    let (host, devices) = with_suppressed_stderr(|| {
        let host = cpal::default_host();
        let devices = host.input_devices();
        (host, devices)
    });
    let _ = host; // keep host alive while iterating devices
    let devices = devices.map_err(|e| LivecapError::AudioCapture {
        message: format!("Failed to enumerate input devices: {}", e),
    })?;

    let mut result = Vec::new();
    for (id, device) in devices.enumerate() {
        if let Ok(name) = device.name() {
            result.push(InputDevice { id, name });
        }
    }

    Ok(result)
}

/// Find an input device by name, or return the system default.
fn find_device(device_name: Option<&str>) -> Result<cpal::Device> {
    with_suppressed_stderr(|| {
        let host = cpal::default_host();

        if let Some(name) = device_name {
            let devices = host
                .input_devices()
                .map_err(|e| LivecapError::AudioCapture {
                    message: format!("Failed to enumerate devices: {}", e),
                })?;

            for dev in devices {
                if let Ok(dev_name) = dev.name()
                    && dev_name == name
                {
                    return Ok(dev);
                }
            }

            Err(LivecapError::AudioDeviceNotFound {
                device: name.to_string(),
            })
        } else {
            host.default_input_device()
                .ok_or_else(|| LivecapError::AudioDeviceNotFound {
                    device: "default".to_string(),
                })
        }
    })
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: The stream is only accessed from a single thread at a time
/// through the Mutex wrapper in AudioIngest. The stream methods are called
/// synchronously and don't cross thread boundaries unsafely.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Accumulates incoming samples and emits fixed 512-sample frames.
///
/// Lives inside the capture callback closure; whatever doesn't fill a whole
/// frame is carried over to the next callback so no samples are lost.
struct Framer {
    pending: Vec<f32>,
    sequence: Arc<AtomicU64>,
    tx: Sender<AudioFrame>,
}

impl Framer {
    fn new(sequence: Arc<AtomicU64>, tx: Sender<AudioFrame>) -> Self {
        Self {
            pending: Vec::with_capacity(defaults::CHUNK_SIZE * 2),
            sequence,
            tx,
        }
    }

    /// Fold in a block of mono samples and push every complete frame.
    ///
    /// The channel is unbounded, so `send` never blocks; a disconnected
    /// receiver (session already gone) is ignored.
    fn push(&mut self, samples: &[f32]) {
        self.pending.extend_from_slice(samples);
        while self.pending.len() >= defaults::CHUNK_SIZE {
            let frame: Vec<f32> = self.pending.drain(..defaults::CHUNK_SIZE).collect();
            let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
            let _ = self.tx.send(AudioFrame::new(frame, seq));
        }
    }
}

/// Live audio input feeding the segmentation pipeline.
///
/// Captures mono f32 audio at 16kHz. Tries the preferred format first
/// (f32/16kHz/mono), then falls back to the device's default config with
/// software conversion (channel mixing + resampling).
pub struct AudioIngest {
    device: cpal::Device,
    stream: Arc<Mutex<Option<SendableStream>>>,
    frame_tx: Sender<AudioFrame>,
    sequence: Arc<AtomicU64>,
    callback_count: Arc<AtomicU64>,
}

impl AudioIngest {
    /// Open an input device and bind it to the frame channel.
    ///
    /// # Arguments
    /// * `device_name` - Optional device name. If None, uses the default input device.
    /// * `frame_tx` - Unbounded channel the callback pushes frames into.
    ///
    /// # Errors
    /// Returns `LivecapError::AudioDeviceNotFound` if the named device doesn't
    /// exist, `LivecapError::AudioCapture` for enumeration failures. Either is
    /// fatal for the session.
    pub fn open(device_name: Option<&str>, frame_tx: Sender<AudioFrame>) -> Result<Self> {
        let device = find_device(device_name)?;

        Ok(Self {
            device,
            stream: Arc::new(Mutex::new(None)),
            frame_tx,
            sequence: Arc::new(AtomicU64::new(0)),
            callback_count: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Name of the opened device, if the backend reports one.
    pub fn device_name(&self) -> Option<String> {
        self.device.name().ok()
    }

    /// Build the audio stream with the preferred format (f32/16kHz/mono).
    fn build_stream(&self) -> Result<cpal::Stream> {
        let preferred_config = cpal::StreamConfig {
            channels: 1,
            sample_rate: defaults::SAMPLE_RATE,
            buffer_size: cpal::BufferSize::Default,
        };

        // Stream errors (overruns, device hiccups) are transient: log and
        // keep capturing.
        let err_callback = |err| {
            eprintln!("Audio stream error: {}", err);
        };

        let mut framer = Framer::new(Arc::clone(&self.sequence), self.frame_tx.clone());
        let counter = Arc::clone(&self.callback_count);
        self.device
            .build_input_stream(
                &preferred_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    counter.fetch_add(1, Ordering::Relaxed);
                    framer.push(data);
                },
                err_callback,
                None,
            )
            .map_err(|e| LivecapError::AudioCapture {
                message: format!("Failed to build f32/16kHz stream: {}", e),
            })
    }

    /// Build a stream using the device's default/native config, with software
    /// channel mixing (stereo→mono) and resampling (native rate→16kHz).
    fn build_stream_native(&self) -> Result<cpal::Stream> {
        use cpal::SampleFormat;

        let default_config =
            self.device
                .default_input_config()
                .map_err(|e| LivecapError::AudioCapture {
                    message: format!("Failed to query default input config: {}", e),
                })?;

        let native_rate = default_config.sample_rate();
        let native_channels = default_config.channels() as usize;
        let stream_config: cpal::StreamConfig = default_config.clone().into();

        eprintln!(
            "livecap: using native audio format ({}ch/{}Hz/{:?}), converting in software",
            native_channels,
            native_rate,
            default_config.sample_format(),
        );

        let err_callback = |err| {
            eprintln!("Audio stream error: {}", err);
        };

        let mut framer = Framer::new(Arc::clone(&self.sequence), self.frame_tx.clone());
        let counter = Arc::clone(&self.callback_count);

        match default_config.sample_format() {
            SampleFormat::F32 => self
                .device
                .build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        counter.fetch_add(1, Ordering::Relaxed);
                        let converted = convert_to_mono_16khz(
                            data,
                            native_channels,
                            native_rate,
                            defaults::SAMPLE_RATE,
                        );
                        framer.push(&converted);
                    },
                    err_callback,
                    None,
                )
                .map_err(|e| LivecapError::AudioCapture {
                    message: format!("Failed to build native f32 stream: {}", e),
                }),
            SampleFormat::I16 => self
                .device
                .build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        counter.fetch_add(1, Ordering::Relaxed);
                        let floats: Vec<f32> =
                            data.iter().map(|&s| s as f32 / 32768.0).collect();
                        let converted = convert_to_mono_16khz(
                            &floats,
                            native_channels,
                            native_rate,
                            defaults::SAMPLE_RATE,
                        );
                        framer.push(&converted);
                    },
                    err_callback,
                    None,
                )
                .map_err(|e| LivecapError::AudioCapture {
                    message: format!("Failed to build native i16 stream: {}", e),
                }),
            fmt => Err(LivecapError::AudioCapture {
                message: format!(
                    "Unsupported native sample format: {:?}. \
                     Try specifying a device with --device.",
                    fmt
                ),
            }),
        }
    }

    /// Start capturing. Frames begin flowing into the channel.
    pub fn start(&mut self) -> Result<()> {
        {
            let stream_guard = self.stream.lock().map_err(|e| LivecapError::AudioCapture {
                message: format!("Failed to lock stream: {}", e),
            })?;
            if stream_guard.is_some() {
                return Ok(()); // Already started
            }
        }

        let final_stream = match self.build_stream() {
            Ok(stream) => {
                stream.play().map_err(|e| LivecapError::AudioCapture {
                    message: format!("Failed to start audio stream: {}", e),
                })?;

                // Wait briefly to check if the CPAL callback actually fires.
                // Some PipeWire-ALSA setups accept non-native configs but never deliver data.
                std::thread::sleep(std::time::Duration::from_millis(200));

                if self.callback_count.load(Ordering::Relaxed) == 0 {
                    drop(stream);
                    let native = self.build_stream_native()?;
                    native.play().map_err(|e| LivecapError::AudioCapture {
                        message: format!("Failed to start native audio stream: {}", e),
                    })?;
                    native
                } else {
                    stream
                }
            }
            Err(_) => {
                // Preferred config rejected outright, go straight to native
                let native = self.build_stream_native()?;
                native.play().map_err(|e| LivecapError::AudioCapture {
                    message: format!("Failed to start native audio stream: {}", e),
                })?;
                native
            }
        };

        let mut stream_guard = self.stream.lock().map_err(|e| LivecapError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;
        *stream_guard = Some(SendableStream(final_stream));
        Ok(())
    }

    /// Stop capturing and release the device handle.
    pub fn stop(&mut self) -> Result<()> {
        let mut stream_guard = self.stream.lock().map_err(|e| LivecapError::AudioCapture {
            message: format!("Failed to lock stream: {}", e),
        })?;

        if let Some(sendable_stream) = stream_guard.take() {
            sendable_stream
                .0
                .pause()
                .map_err(|e| LivecapError::AudioCapture {
                    message: format!("Failed to stop audio stream: {}", e),
                })?;
        }
        Ok(())
    }
}

/// Mix multi-channel audio to mono and resample to the target rate.
fn convert_to_mono_16khz(
    samples: &[f32],
    channels: usize,
    source_rate: u32,
    target_rate: u32,
) -> Vec<f32> {
    // Mix to mono by averaging channels
    let mono: Vec<f32> = if channels <= 1 {
        samples.to_vec()
    } else {
        samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    if source_rate == target_rate {
        mono
    } else {
        resample(&mono, source_rate, target_rate)
    }
}

/// Linear-interpolation resampler for mono f32 audio.
fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if samples.is_empty() || source_rate == target_rate {
        return samples.to_vec();
    }

    let ratio = source_rate as f64 / target_rate as f64;
    let out_len = (samples.len() as f64 / ratio) as usize;
    let mut out = Vec::with_capacity(out_len);

    for i in 0..out_len {
        let pos = i as f64 * ratio;
        let idx = pos as usize;
        let frac = (pos - idx as f64) as f32;
        let a = samples[idx];
        let b = samples[(idx + 1).min(samples.len() - 1)];
        out.push(a + (b - a) * frac);
    }

    out
}
