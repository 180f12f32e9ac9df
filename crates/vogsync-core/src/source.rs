//! Audio sources
//!
//! The core only consumes decoded mono PCM. [`WavSource`] reads WAV files (integer
//! or float, any channel count) and down-mixes by averaging channels;
//! [`MemorySource`] wraps samples that are already in memory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{error::CoreError, Result};

/// Decoded mono audio shared between the frame loop and audio output
#[derive(Debug, Clone)]
pub struct PcmAudio {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl PcmAudio {
    pub fn new(samples: impl Into<Arc<[f32]>>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(CoreError::InvalidAudio("sample rate is zero".to_string()));
        }
        Ok(Self {
            samples: samples.into(),
            sample_rate,
        })
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Shared handle to the samples, for the playback thread
    pub fn shared_samples(&self) -> Arc<[f32]> {
        Arc::clone(&self.samples)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Something that can produce decoded mono PCM for a session
pub trait AudioSource: Send + Sync {
    fn load(&self) -> Result<PcmAudio>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

/// In-memory samples
#[derive(Debug, Clone)]
pub struct MemorySource {
    audio: PcmAudio,
}

impl MemorySource {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Ok(Self {
            audio: PcmAudio::new(samples, sample_rate)?,
        })
    }
}

impl AudioSource for MemorySource {
    fn load(&self) -> Result<PcmAudio> {
        Ok(self.audio.clone())
    }

    fn describe(&self) -> String {
        format!(
            "memory ({} samples @ {}Hz)",
            self.audio.len(),
            self.audio.sample_rate()
        )
    }
}

/// WAV file on disk
#[derive(Debug, Clone)]
pub struct WavSource {
    path: PathBuf,
}

impl WavSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AudioSource for WavSource {
    fn load(&self) -> Result<PcmAudio> {
        let reader = hound::WavReader::open(&self.path)?;
        let spec = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<std::result::Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<std::result::Result<_, _>>()?
            }
        };

        let mono = downmix(&interleaved, channels);
        tracing::info!(
            "Loaded {:?}: {} channel(s), {}Hz, {:.2}s",
            self.path,
            channels,
            spec.sample_rate,
            mono.len() as f32 / spec.sample_rate.max(1) as f32
        );
        PcmAudio::new(mono, spec.sample_rate)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Average interleaved channels into mono. A trailing partial frame is dropped.
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
