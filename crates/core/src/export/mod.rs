use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    AudioBuffer, FrequencySampler, KeyframeStore, MappingMatrix, PropertyUpdate, ReactiveMapping,
    Result, SamplerConfig, SteppedClock, SyncFrameError, Transport,
};

/// Frame cadence and range of an offline export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportSettings {
    pub fps: u32,
    pub start_seconds: f64,
    /// Defaults to the end of the timeline.
    pub end_seconds: Option<f64>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            fps: 30,
            start_seconds: 0.0,
            end_seconds: None,
        }
    }
}

impl ExportSettings {
    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(SyncFrameError::config("export fps must be positive"));
        }
        if !self.start_seconds.is_finite() || self.start_seconds < 0.0 {
            return Err(SyncFrameError::config("export start must be a non-negative time"));
        }
        if let Some(end) = self.end_seconds {
            if !end.is_finite() || end <= self.start_seconds {
                return Err(SyncFrameError::config("export end must come after its start"));
            }
        }
        Ok(())
    }
}

/// Everything the renderer needs for one exported frame, all evaluated at a
/// single time value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameState {
    pub index: u64,
    pub time: f64,
    pub updates: Vec<PropertyUpdate>,
    pub spectrum: Vec<u8>,
}

/// Steps a transport, a freshly reset frequency sampler and the keyframe
/// engine through the timeline at a fixed frame rate.
///
/// Frame `n` is evaluated at `start + n / fps`, computed from the index
/// rather than accumulated, so repeated runs yield identical frames.
#[derive(Debug)]
pub struct FrameExporter {
    settings: ExportSettings,
    transport: Transport<SteppedClock>,
    sampler: FrequencySampler,
    mappings: MappingMatrix,
    next_frame: u64,
    frame_count: u64,
}

impl FrameExporter {
    pub fn new(
        audio: Arc<AudioBuffer>,
        sampler_config: SamplerConfig,
        settings: ExportSettings,
        duration_override: Option<f64>,
        mappings: Vec<ReactiveMapping>,
    ) -> Result<Self> {
        settings.validate()?;
        for mapping in &mappings {
            mapping.validate(Some(sampler_config.bin_count()))?;
        }

        let mut transport = Transport::new();
        transport.init(SteppedClock::new(audio.duration()), duration_override)?;
        let duration = transport.duration_seconds();

        let end = settings.end_seconds.unwrap_or(duration).min(duration);
        if end <= settings.start_seconds {
            return Err(SyncFrameError::config(format!(
                "export range starts at {}s but the timeline ends at {end}s",
                settings.start_seconds
            )));
        }
        let frame_count = ((end - settings.start_seconds) * f64::from(settings.fps))
            .ceil()
            .max(1.0) as u64;

        let mut sampler = FrequencySampler::new(audio, sampler_config)?;
        sampler.reset();

        tracing::info!(fps = settings.fps, frame_count, end, "export prepared");

        Ok(Self {
            settings,
            transport,
            sampler,
            mappings: MappingMatrix::with_mappings(mappings),
            next_frame: 0,
            frame_count,
        })
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    pub fn frame_time(&self, index: u64) -> f64 {
        self.settings.start_seconds + index as f64 / f64::from(self.settings.fps)
    }

    /// Evaluates the next frame, or `None` once the range is exhausted.
    pub fn next_frame(&mut self, store: &KeyframeStore) -> Result<Option<FrameState>> {
        if self.next_frame >= self.frame_count {
            return Ok(None);
        }
        let index = self.next_frame;

        self.transport.seek(self.frame_time(index))?;
        let time = self.transport.tick();
        let spectrum = self.sampler.sample(time)?;
        let updates = self.mappings.evaluate(store, time, &spectrum).to_vec();

        self.next_frame += 1;
        Ok(Some(FrameState {
            index,
            time,
            updates,
            spectrum,
        }))
    }

    /// Evaluates every remaining frame.
    pub fn run(&mut self, store: &KeyframeStore) -> Result<Vec<FrameState>> {
        let mut frames = Vec::with_capacity((self.frame_count - self.next_frame) as usize);
        while let Some(frame) = self.next_frame(store)? {
            frames.push(frame);
        }
        tracing::info!(frames = frames.len(), "export finished");
        Ok(frames)
    }

    /// Rewinds to the first frame with cleared smoothing state.
    pub fn restart(&mut self) -> Result<()> {
        self.transport.stop()?;
        self.sampler.reset();
        self.next_frame = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Keyframe, KeyframeValue, Property, SpectrumBand};

    fn audio(seconds: usize) -> Arc<AudioBuffer> {
        let rate = 1_000;
        let samples = (0..rate * seconds)
            .map(|i| ((i as f32) * 0.37).sin() * if i % 700 < 350 { 1.0 } else { 0.1 })
            .collect();
        AudioBuffer::new(rate as u32, vec![samples]).unwrap().into_shared()
    }

    fn store() -> KeyframeStore {
        KeyframeStore::from_keyframes([
            Keyframe::new("cube", Property::PositionY, 0.0, KeyframeValue::Number(0.0)).unwrap(),
            Keyframe::new("cube", Property::PositionY, 2.0, KeyframeValue::Number(4.0))
                .unwrap()
                .with_ease("inOutSine"),
        ])
        .unwrap()
    }

    fn exporter(settings: ExportSettings) -> FrameExporter {
        FrameExporter::new(audio(2), SamplerConfig::default(), settings, None, Vec::new()).unwrap()
    }

    #[test]
    fn validates_settings() {
        let zero_fps = ExportSettings {
            fps: 0,
            ..ExportSettings::default()
        };
        assert!(zero_fps.validate().is_err());
        let backwards = ExportSettings {
            start_seconds: 2.0,
            end_seconds: Some(1.0),
            ..ExportSettings::default()
        };
        assert!(backwards.validate().is_err());
        assert!(ExportSettings::default().validate().is_ok());
    }

    #[test]
    fn frame_count_covers_the_timeline() {
        let exporter = exporter(ExportSettings::default());
        assert_eq!(exporter.frame_count(), 60);
        assert!((exporter.frame_time(30) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn every_frame_uses_one_time_value() {
        let mut exporter = exporter(ExportSettings {
            fps: 10,
            ..ExportSettings::default()
        });
        let frames = exporter.run(&store()).unwrap();
        assert_eq!(frames.len(), 20);

        for frame in &frames {
            let expected = store()
                .groups()
                .next()
                .and_then(|group| group.evaluate(frame.time));
            assert_eq!(frame.updates[0].value, expected.unwrap());
            assert_eq!(frame.spectrum.len(), 256);
        }
        assert!(frames.windows(2).all(|pair| pair[0].time < pair[1].time));
    }

    #[test]
    fn restart_reproduces_the_same_frames() {
        let mut exporter = exporter(ExportSettings::default());
        let first = exporter.run(&store()).unwrap();
        exporter.restart().unwrap();
        let second = exporter.run(&store()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rejects_mappings_outside_the_spectrum() {
        let mapping =
            ReactiveMapping::new(SpectrumBand::new(0, 1_000), "cube", Property::ScaleX, 1.0, 1.0)
                .unwrap();
        let result = FrameExporter::new(
            audio(1),
            SamplerConfig::default(),
            ExportSettings::default(),
            None,
            vec![mapping],
        );
        assert!(matches!(result, Err(SyncFrameError::InvalidConfiguration(_))));
    }

    #[test]
    fn duration_override_extends_the_export() {
        let exporter = FrameExporter::new(
            audio(1),
            SamplerConfig::default(),
            ExportSettings::default(),
            Some(3.0),
            Vec::new(),
        )
        .unwrap();
        assert_eq!(exporter.frame_count(), 90);
    }
}
