//! Audio output
//!
//! `cpal::Stream` is not `Send`, so [`CpalOutput`] opens and owns the stream on a
//! dedicated thread. The thread reports whether the stream started over a
//! handshake channel, then parks until playback runs out or the
//! [`PlaybackHandle`] is released. Device errors raised after startup are
//! forwarded to the handle.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use vogsync_core::PcmAudio;

use crate::error::{Result, SessionError};

/// How often the output thread checks whether the buffer has played out
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Something that can play a decoded buffer concurrently with the frame loop
pub trait AudioOutput: Send + Sync {
    /// Start playback and return once the device is running.
    fn start(&self, audio: &PcmAudio) -> Result<PlaybackHandle>;

    fn name(&self) -> &'static str;
}

/// Running playback. Dropping or releasing it stops the output.
pub struct PlaybackHandle {
    stop_tx: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
    errors: Option<Receiver<String>>,
}

impl PlaybackHandle {
    /// A handle with nothing behind it
    pub fn detached() -> Self {
        Self {
            stop_tx: None,
            thread: None,
            errors: None,
        }
    }

    /// A handle without an output thread that reports device errors sent on `errors`
    pub fn detached_with_errors(errors: Receiver<String>) -> Self {
        Self {
            stop_tx: None,
            thread: None,
            errors: Some(errors),
        }
    }

    /// The device error reported since the last call, if any.
    pub fn take_error(&self) -> Option<String> {
        self.errors.as_ref()?.try_recv().ok()
    }

    /// Stop the output and wait for the device to be closed.
    pub fn release(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            // The thread may already have exited after playing out
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("Audio output thread panicked");
            }
        }
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Plays through the default output device of the default host
#[derive(Debug, Default)]
pub struct CpalOutput;

impl AudioOutput for CpalOutput {
    fn start(&self, audio: &PcmAudio) -> Result<PlaybackHandle> {
        let (ready_tx, ready_rx) = bounded::<std::result::Result<(), String>>(1);
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let (error_tx, error_rx) = bounded::<String>(1);

        let samples = audio.shared_samples();
        let sample_rate = audio.sample_rate();

        let thread = std::thread::Builder::new()
            .name("vogsync-audio".to_string())
            .spawn(move || run_output_thread(samples, sample_rate, ready_tx, stop_rx, error_tx))
            .map_err(|e| SessionError::AudioOutput(format!("failed to spawn thread: {}", e)))?;

        let startup = ready_rx
            .recv()
            .unwrap_or_else(|_| Err("output thread exited during startup".to_string()));

        match startup {
            Ok(()) => Ok(PlaybackHandle {
                stop_tx: Some(stop_tx),
                thread: Some(thread),
                errors: Some(error_rx),
            }),
            Err(message) => {
                let _ = thread.join();
                Err(SessionError::AudioOutput(message))
            }
        }
    }

    fn name(&self) -> &'static str {
        "cpal"
    }
}

fn run_output_thread(
    samples: Arc<[f32]>,
    sample_rate: u32,
    ready_tx: Sender<std::result::Result<(), String>>,
    stop_rx: Receiver<()>,
    error_tx: Sender<String>,
) {
    let finished = Arc::new(AtomicBool::new(false));
    let stream = match open_stream(samples, sample_rate, finished.clone(), error_tx) {
        Ok(stream) => stream,
        Err(message) => {
            let _ = ready_tx.send(Err(message));
            return;
        }
    };
    let _ = ready_tx.send(Ok(()));

    loop {
        match stop_rx.recv_timeout(POLL_INTERVAL) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                if finished.load(Ordering::Acquire) {
                    break;
                }
            }
        }
    }

    drop(stream);
    tracing::debug!("Audio output closed");
}

/// First f32 config whose rate range contains `sample_rate`.
///
/// The buffer is played at its own rate, there is no resampling.
fn select_config(
    configs: impl Iterator<Item = cpal::SupportedStreamConfigRange>,
    sample_rate: u32,
) -> Option<cpal::SupportedStreamConfigRange> {
    configs
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .find(|c| sample_rate >= c.min_sample_rate().0 && sample_rate <= c.max_sample_rate().0)
}

fn open_stream(
    samples: Arc<[f32]>,
    sample_rate: u32,
    finished: Arc<AtomicBool>,
    error_tx: Sender<String>,
) -> std::result::Result<cpal::Stream, String> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| "no output device available".to_string())?;
    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

    let configs = device
        .supported_output_configs()
        .map_err(|e| format!("{}: {}", device_name, e))?;
    let supported = select_config(configs, sample_rate)
        .ok_or_else(|| format!("{}: no f32 output at {}Hz", device_name, sample_rate))?;
    let channels = supported.channels().max(1);

    let config = cpal::StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };
    let channels = channels as usize;

    tracing::info!(
        "Audio output: {} ({} channels, {}Hz)",
        device_name,
        channels,
        sample_rate
    );

    let position = AtomicUsize::new(0);
    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                let mut pos = position.load(Ordering::Relaxed);
                for frame in data.chunks_mut(channels) {
                    let sample = samples.get(pos).copied().unwrap_or(0.0);
                    // Mono source: same sample on every device channel
                    frame.fill(sample);
                    pos = pos.saturating_add(1);
                }
                position.store(pos, Ordering::Relaxed);
                if pos >= samples.len() {
                    finished.store(true, Ordering::Release);
                }
            },
            move |err| {
                tracing::error!("Audio stream error: {}", err);
                // Only the first error is kept
                let _ = error_tx.try_send(err.to_string());
            },
            None,
        )
        .map_err(|e| format!("{}: {}", device_name, e))?;

    stream
        .play()
        .map_err(|e| format!("{}: {}", device_name, e))?;

    Ok(stream)
}

/// Discards audio. Used when playing lights only, and in tests.
#[derive(Debug, Default)]
pub struct NullOutput;

impl AudioOutput for NullOutput {
    fn start(&self, audio: &PcmAudio) -> Result<PlaybackHandle> {
        tracing::debug!("Null audio output: skipping {:.2}s of audio", audio.duration_secs());
        Ok(PlaybackHandle::detached())
    }

    fn name(&self) -> &'static str {
        "null"
    }
}
