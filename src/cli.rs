//! Command-line interface for livecap
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Live captions from your microphone
#[derive(Parser, Debug)]
#[command(
    name = "livecap",
    version = crate::version_string(),
    about = "Live captions from your microphone"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress status messages (captions still print)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Audio input device (e.g., pipewire, hw:0)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Whisper model (default: base, multilingual). Use base.en for English-only
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Language code for transcription (default: auto-detect). Examples: auto, en, de, es
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Target language for translation (implies the configured translation backend)
    #[arg(long, value_name = "LANG")]
    pub target_lang: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,
}
