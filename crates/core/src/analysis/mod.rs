use std::{f32::consts::PI, fmt, sync::Arc};

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};
use serde::{Deserialize, Serialize};

use crate::{AudioBuffer, Result, SyncFrameError};

const MIN_FFT_SIZE: usize = 32;
const MAX_FFT_SIZE: usize = 32_768;
const MAGNITUDE_EPSILON: f32 = 1e-10;

/// Window applied to each analysis block before the FFT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowFunction {
    #[default]
    Hann,
    Hamming,
}

impl WindowFunction {
    fn value(self, index: usize, len: usize) -> f32 {
        if len <= 1 {
            return 1.0;
        }

        let phase = (2.0 * PI * index as f32) / (len as f32 - 1.0);
        match self {
            Self::Hann => 0.5 - 0.5 * phase.cos(),
            Self::Hamming => 0.54 - 0.46 * phase.cos(),
        }
    }
}

/// Parameters of a [`FrequencySampler`]. Defaults mirror a browser analyser
/// node with a 512-point FFT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SamplerConfig {
    pub fft_size: usize,
    pub smoothing: f32,
    pub min_decibels: f32,
    pub max_decibels: f32,
    pub window_function: WindowFunction,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            fft_size: 512,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
            window_function: WindowFunction::Hann,
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two()
            || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&self.fft_size)
        {
            return Err(SyncFrameError::config(format!(
                "fft size must be a power of two between {MIN_FFT_SIZE} and {MAX_FFT_SIZE}, got {}",
                self.fft_size
            )));
        }
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(SyncFrameError::config(format!(
                "smoothing must be within [0, 1], got {}",
                self.smoothing
            )));
        }
        if !self.min_decibels.is_finite()
            || !self.max_decibels.is_finite()
            || self.min_decibels >= self.max_decibels
        {
            return Err(SyncFrameError::config(format!(
                "decibel range [{}, {}] is empty",
                self.min_decibels, self.max_decibels
            )));
        }
        Ok(())
    }

    /// Number of magnitudes produced per sample, `fft_size / 2`.
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }
}

/// Offline spectrum analyser over a fixed audio buffer.
///
/// Each call to [`FrequencySampler::sample`] analyses the `fft_size` samples
/// ending at the requested time and folds the result into per-bin smoothing
/// state. Feeding strictly increasing times from a freshly reset sampler
/// reproduces the same byte sequence on every run.
pub struct FrequencySampler {
    audio: Arc<AudioBuffer>,
    config: SamplerConfig,
    window: Vec<f32>,
    smoothed: Vec<f32>,
    fft: FftResources,
}

impl FrequencySampler {
    pub fn new(audio: Arc<AudioBuffer>, config: SamplerConfig) -> Result<Self> {
        config.validate()?;

        let size = config.fft_size;
        let window = (0..size)
            .map(|index| config.window_function.value(index, size))
            .collect();
        let fft = FftResources::new(size);

        tracing::info!(
            fft_size = size,
            smoothing = config.smoothing,
            window = ?config.window_function,
            "frequency sampler ready"
        );

        Ok(Self {
            audio,
            smoothed: vec![0.0; config.bin_count()],
            config,
            window,
            fft,
        })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn bin_count(&self) -> usize {
        self.config.bin_count()
    }

    pub fn audio(&self) -> &Arc<AudioBuffer> {
        &self.audio
    }

    /// Clears the smoothing memory. Call before analysing an unrelated run.
    pub fn reset(&mut self) {
        self.smoothed.iter_mut().for_each(|bin| *bin = 0.0);
    }

    /// Byte spectrum (`0..=255` per bin) of the audio up to `time` seconds.
    pub fn sample(&mut self, time: f64) -> Result<Vec<u8>> {
        let size = self.config.fft_size;
        let time = if time.is_nan() {
            0.0
        } else {
            time.clamp(0.0, self.audio.duration())
        };
        let end = (time * f64::from(self.audio.sample_rate())).floor() as i64;
        let start = end - size as i64;

        for (offset, (slot, weight)) in self.fft.input.iter_mut().zip(&self.window).enumerate() {
            *slot = self.audio.mono_sample(start + offset as i64) * weight;
        }

        self.fft.plan.process_with_scratch(
            &mut self.fft.input,
            &mut self.fft.spectrum,
            &mut self.fft.scratch,
        )?;

        let scale = 2.0 / size as f32;
        let min_db = self.config.min_decibels;
        let max_db = self.config.max_decibels;
        let range_db = max_db - min_db;
        let smoothing = self.config.smoothing;

        let bytes = self
            .smoothed
            .iter_mut()
            .zip(&self.fft.spectrum)
            .map(|(state, bin)| {
                let magnitude = bin.norm() * scale;
                let db = 20.0 * (magnitude + MAGNITUDE_EPSILON).log10();
                let normalized = (db.clamp(min_db, max_db) - min_db) / range_db;
                *state = *state * smoothing + normalized * (1.0 - smoothing);
                (state.clamp(0.0, 1.0) * 255.0).round() as u8
            })
            .collect();

        Ok(bytes)
    }
}

struct FftResources {
    size: usize,
    plan: Arc<dyn RealToComplex<f32>>,
    scratch: Vec<Complex32>,
    spectrum: Vec<Complex32>,
    input: Vec<f32>,
}

impl FftResources {
    fn new(size: usize) -> Self {
        let plan = RealFftPlanner::<f32>::new().plan_fft_forward(size);
        let scratch = plan.make_scratch_vec();
        let spectrum = plan.make_output_vec();
        let input = plan.make_input_vec();
        Self {
            size,
            plan,
            scratch,
            spectrum,
            input,
        }
    }
}

impl fmt::Debug for FrequencySampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrequencySampler")
            .field("audio", &self.audio)
            .field("config", &self.config)
            .field("fft", &self.fft)
            .finish()
    }
}

impl fmt::Debug for FftResources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftResources")
            .field("size", &self.size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RATE: u32 = 8_000;

    fn sine(freq: f32, seconds: f32) -> Vec<f32> {
        let len = (seconds * RATE as f32) as usize;
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / RATE as f32).sin())
            .collect()
    }

    fn sampler(samples: Vec<f32>, config: SamplerConfig) -> FrequencySampler {
        let audio = AudioBuffer::new(RATE, vec![samples]).unwrap().into_shared();
        FrequencySampler::new(audio, config).unwrap()
    }

    fn unsmoothed() -> SamplerConfig {
        SamplerConfig {
            smoothing: 0.0,
            ..SamplerConfig::default()
        }
    }

    #[test]
    fn rejects_non_power_of_two_fft() {
        let audio = AudioBuffer::new(RATE, vec![vec![0.0; 16]]).unwrap().into_shared();
        for fft_size in [0, 500, 16, 65_536] {
            let config = SamplerConfig {
                fft_size,
                ..SamplerConfig::default()
            };
            let err = FrequencySampler::new(audio.clone(), config).unwrap_err();
            assert!(matches!(err, SyncFrameError::InvalidConfiguration(_)));
        }
    }

    #[test]
    fn rejects_bad_smoothing_and_decibel_range() {
        let audio = AudioBuffer::new(RATE, vec![vec![0.0; 16]]).unwrap().into_shared();
        let bad_smoothing = SamplerConfig {
            smoothing: 1.5,
            ..SamplerConfig::default()
        };
        assert!(FrequencySampler::new(audio.clone(), bad_smoothing).is_err());
        let bad_range = SamplerConfig {
            min_decibels: -10.0,
            max_decibels: -20.0,
            ..SamplerConfig::default()
        };
        assert!(FrequencySampler::new(audio, bad_range).is_err());
    }

    #[test]
    fn produces_half_fft_size_bins() {
        let mut sampler = sampler(sine(440.0, 1.0), SamplerConfig::default());
        assert_eq!(sampler.bin_count(), 256);
        assert_eq!(sampler.sample(0.5).unwrap().len(), 256);
    }

    #[test]
    fn sine_peaks_in_its_bin() {
        // 1000 Hz at 8 kHz with a 512-point FFT lands on bin 64.
        let mut sampler = sampler(sine(1000.0, 1.0), unsmoothed());
        let bins = sampler.sample(0.5).unwrap();
        let peak = bins
            .iter()
            .enumerate()
            .max_by_key(|(_, value)| **value)
            .map(|(index, _)| index)
            .unwrap();
        assert!((63..=65).contains(&peak), "peak at {peak}");
        assert_eq!(bins[64], 255);
    }

    #[test]
    fn hamming_window_peaks_in_the_same_bin() {
        let hamming = SamplerConfig {
            window_function: WindowFunction::Hamming,
            ..unsmoothed()
        };
        let bins = sampler(sine(1000.0, 1.0), hamming).sample(0.5).unwrap();
        let peak = bins
            .iter()
            .enumerate()
            .max_by_key(|(_, value)| **value)
            .map(|(index, _)| index)
            .unwrap();
        assert!((63..=65).contains(&peak), "peak at {peak}");
        assert_eq!(bins[64], 255);

        let hann = sampler(sine(1000.0, 1.0), unsmoothed()).sample(0.5).unwrap();
        assert_ne!(bins, hann);
    }

    #[test]
    fn silence_before_the_window_start_is_zero() {
        let mut sampler = sampler(sine(1000.0, 1.0), unsmoothed());
        assert!(sampler.sample(0.0).unwrap().iter().all(|&b| b == 0));
        assert!(sampler.sample(-3.0).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn window_never_looks_ahead() {
        // Loud for the first 4000 samples, silent afterwards.
        let mut samples = sine(1000.0, 0.5);
        samples.extend(std::iter::repeat(0.0).take(4_000));
        let mut sampler = sampler(samples, unsmoothed());

        // Window [4088, 4600) is entirely after the loud section.
        let bins = sampler.sample(0.575).unwrap();
        assert!(bins.iter().all(|&b| b == 0));

        // Window [3488, 4000) ends right where the tone stops.
        let bins = sampler.sample(0.5).unwrap();
        assert!(bins.iter().any(|&b| b > 0));
    }

    #[test]
    fn smoothing_carries_energy_forward_until_reset() {
        let mut samples = sine(1000.0, 0.5);
        samples.extend(std::iter::repeat(0.0).take(4_000));
        let mut sampler = sampler(samples, SamplerConfig::default());

        let loud = sampler.sample(0.25).unwrap();
        let after = sampler.sample(0.9).unwrap();
        assert!(after[64] > 0 && after[64] < loud[64]);

        sampler.reset();
        assert!(sampler.sample(0.9).unwrap().iter().all(|&b| b == 0));
    }

    #[test]
    fn two_samplers_produce_identical_sequences() {
        let samples: Vec<f32> = sine(330.0, 2.0)
            .iter()
            .zip(sine(2_100.0, 2.0))
            .map(|(a, b)| 0.6 * a + 0.3 * b)
            .collect();
        let audio = AudioBuffer::new(RATE, vec![samples]).unwrap().into_shared();

        let run = || {
            let mut sampler =
                FrequencySampler::new(audio.clone(), SamplerConfig::default()).unwrap();
            sampler.reset();
            (0..60)
                .map(|frame| sampler.sample(frame as f64 / 30.0).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn hamming_window_keeps_a_floor() {
        assert!((WindowFunction::Hamming.value(0, 512) - 0.08).abs() < 1e-6);
        assert!(WindowFunction::Hann.value(0, 512).abs() < 1e-6);
        assert!((WindowFunction::Hann.value(255, 511) - 1.0).abs() < 1e-6);
    }
}
