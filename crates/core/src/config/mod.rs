use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{ExportSettings, Result, SamplerConfig, SyncFrameError};

/// Top-level configuration for the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub sampler: SamplerConfig,
    pub export: ExportSettings,
    /// Timeline length in seconds. Falls back to the audio length when unset.
    pub duration_override: Option<f64>,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        self.sampler.validate()?;
        self.export.validate()?;
        if let Some(duration) = self.duration_override {
            if !duration.is_finite() || duration <= 0.0 {
                return Err(SyncFrameError::InvalidDuration(duration));
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::from_json(&fs::read_to_string(path.as_ref())?)?;
        tracing::info!(path = ?path.as_ref(), "loaded engine config");
        Ok(config)
    }
}

/// Engine settings plus a dirty flag. Persisting is explicit: callers decide
/// when to [`SettingsStore::save`].
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    settings: EngineConfig,
    dirty: bool,
}

impl SettingsStore {
    pub fn new(settings: EngineConfig) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            dirty: false,
        })
    }

    pub fn settings(&self) -> &EngineConfig {
        &self.settings
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Applies `change` and marks the store dirty. An edit that leaves the
    /// settings invalid is rolled back and reported.
    pub fn update(&mut self, change: impl FnOnce(&mut EngineConfig)) -> Result<()> {
        let mut next = self.settings.clone();
        change(&mut next);
        next.validate()?;
        if next != self.settings {
            self.settings = next;
            self.dirty = true;
        }
        Ok(())
    }

    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path.as_ref(), serde_json::to_string_pretty(&self.settings)?)?;
        self.dirty = false;
        tracing::info!(path = ?path.as_ref(), "saved settings");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(EngineConfig::load(path)?)
    }
}
