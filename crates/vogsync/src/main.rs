//! vogsync command-line player
//!
//! ```text
//! vogsync --file voice.wav --mode bloom --wled http://192.168.1.101,http://192.168.1.102
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use vogsync::audio_output::{AudioOutput, CpalOutput, NullOutput};
use vogsync::logging_setup;
use vogsync::Orchestrator;
use vogsync_control::WledDispatcher;
use vogsync_core::{ParameterStore, PlayerConfig, VisualMode, WavSource};

/// Play an audio file and drive WLED controllers from it
#[derive(Parser, Debug)]
#[command(name = "vogsync", version, about)]
struct Cli {
    /// WAV file to play
    #[arg(short, long)]
    file: PathBuf,

    /// Visual mode: wave or bloom
    #[arg(short, long)]
    mode: Option<VisualMode>,

    /// Controller base URLs, comma separated (zone order)
    #[arg(long, value_delimiter = ',')]
    wled: Vec<String>,

    /// TOML config file
    #[arg(short, long, env = "VOGSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Frame duration in milliseconds
    #[arg(long)]
    frame_ms: Option<u32>,

    /// Disable onset and pitch detection
    #[arg(long)]
    no_onset: bool,

    /// Drive the lights without opening an audio device
    #[arg(long)]
    no_audio: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn apply(&self, config: &mut PlayerConfig) {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        let controllers: Vec<String> = self
            .wled
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if !controllers.is_empty() {
            config.controllers = controllers;
        }
        if let Some(frame_ms) = self.frame_ms {
            config.frame_ms = frame_ms;
        }
        if self.no_onset {
            config.onset_detection = false;
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = PlayerConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    config.apply_env().context("Invalid environment override")?;
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let _log_guard = logging_setup::init(&config.log)?;

    let mode = config.mode;
    let params = Arc::new(ParameterStore::new(config.params));
    let dispatcher = Arc::new(
        WledDispatcher::new(config.dispatch_timeout()).context("Failed to create HTTP client")?,
    );
    let output: Arc<dyn AudioOutput> = if cli.no_audio {
        Arc::new(NullOutput)
    } else {
        Arc::new(CpalOutput)
    };

    info!("Controllers: {}", config.controllers.join(", "));
    let orchestrator = Orchestrator::new(config, params, dispatcher, output);

    let stop = orchestrator.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.stop();
        }
    });

    let source = WavSource::new(&cli.file);
    let report = orchestrator
        .render(&source, mode)
        .await
        .with_context(|| format!("Playback of {:?} failed", cli.file))?;

    println!(
        "{} frame(s) rendered, {} degraded, {} command(s) sent, {} dropped{}",
        report.frames,
        report.degraded_frames,
        report.dispatch.sent,
        report.dispatch.failed,
        if report.stopped { " (stopped)" } else { "" }
    );
    Ok(())
}
