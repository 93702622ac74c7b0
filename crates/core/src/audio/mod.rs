use std::{fmt, path::Path, sync::Arc};

use crate::{Result, SyncFrameError};

/// Immutable decoded audio. Created once when audio is loaded and shared
/// read-only (usually behind an [`Arc`]) by the transport and every sampler.
#[derive(Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Builds a buffer from planar channel data. All channels must have the
    /// same length.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(SyncFrameError::config("sample rate must be positive"));
        }
        let Some(first) = channels.first() else {
            return Err(SyncFrameError::config("audio needs at least one channel"));
        };
        let length = first.len();
        if channels.iter().any(|channel| channel.len() != length) {
            return Err(SyncFrameError::config(
                "all audio channels must have the same length",
            ));
        }

        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Builds a buffer from interleaved samples (`L R L R ...`). Trailing
    /// samples that do not fill a whole frame are dropped.
    pub fn from_interleaved(
        sample_rate: u32,
        channel_count: usize,
        samples: &[f32],
    ) -> Result<Self> {
        if channel_count == 0 {
            return Err(SyncFrameError::config("audio needs at least one channel"));
        }

        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (channel, sample) in channels.iter_mut().zip(frame) {
                channel.push(*sample);
            }
        }

        Self::new(sample_rate, channels)
    }

    /// Decodes a PCM WAV file. Integer formats are scaled to `[-1, 1]`.
    pub fn from_wav_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1_i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|value| value as f32 * scale))
                    .collect::<std::result::Result<_, _>>()?
            }
        };

        tracing::info!(
            ?path,
            sample_rate = spec.sample_rate,
            channels = spec.channels,
            frames = samples.len() / usize::from(spec.channels.max(1)),
            "decoded wav"
        );

        Self::from_interleaved(spec.sample_rate, usize::from(spec.channels), &samples)
    }

    /// Wraps the buffer for sharing between the transport and samplers.
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of sample frames per channel.
    pub fn length(&self) -> usize {
        self.channels[0].len()
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.length() as f64 / f64::from(self.sample_rate)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Mono down-mix of one sample frame. Indices outside the buffer are
    /// silence.
    pub fn mono_sample(&self, index: i64) -> f32 {
        let Ok(index) = usize::try_from(index) else {
            return 0.0;
        };
        if index >= self.length() {
            return 0.0;
        }

        let sum: f32 = self.channels.iter().map(|channel| channel[index]).sum();
        sum / self.channels.len() as f32
    }
}

impl fmt::Debug for AudioBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioBuffer")
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels.len())
            .field("length", &self.length())
            .finish()
    }
}
