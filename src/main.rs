use anyhow::Result;
use clap::Parser;
use livecap::app::{CliOverrides, run_captions};
use livecap::audio::list_devices;
use livecap::cli::{Cli, Commands};
use livecap::config::Config;
use owo_colors::OwoColorize;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let config = load_config(cli.config.as_deref())?;
            run_captions(
                config,
                CliOverrides {
                    device: cli.device,
                    model: cli.model,
                    language: cli.language,
                    target_lang: cli.target_lang,
                },
                cli.quiet,
            )
            .await?;
        }
        Some(Commands::Devices) => {
            list_audio_devices()?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path())?,
    };
    Ok(config.with_env_overrides())
}

fn list_audio_devices() -> Result<()> {
    let devices = list_devices()?;
    if devices.is_empty() {
        println!("No audio input devices found.");
        return Ok(());
    }
    println!("Available audio input devices:");
    for device in devices {
        println!("  {} {}", format!("[{}]", device.id).dimmed(), device.name);
    }
    Ok(())
}
