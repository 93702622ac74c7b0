use serde::{Deserialize, Serialize};

use crate::{KeyframeStore, KeyframeValue, ObjectId, Property, Result, SyncFrameError, ValueKind};

/// Concrete value routed to a scene-object property for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyUpdate {
    pub object_id: ObjectId,
    pub property: Property,
    pub value: KeyframeValue,
}

/// Evaluates every keyframe group of `store` at the same `time`.
pub fn evaluate_store(store: &KeyframeStore, time: f64) -> Vec<PropertyUpdate> {
    store
        .groups()
        .filter_map(|group| {
            group.evaluate(time).map(|value| PropertyUpdate {
                object_id: group.key().object_id.clone(),
                property: group.key().property,
                value,
            })
        })
        .collect()
}

/// Inclusive-exclusive range of spectrum bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectrumBand {
    pub start_bin: usize,
    pub end_bin: usize,
}

impl SpectrumBand {
    pub fn new(start_bin: usize, end_bin: usize) -> Self {
        Self { start_bin, end_bin }
    }

    /// Mean level of the band in `[0, 1]`. Bins past the end of `spectrum`
    /// are ignored.
    pub fn level(&self, spectrum: &[u8]) -> f64 {
        let end = self.end_bin.min(spectrum.len());
        let Some(bins) = spectrum.get(self.start_bin..end).filter(|bins| !bins.is_empty()) else {
            return 0.0;
        };
        let sum: u32 = bins.iter().map(|&b| u32::from(b)).sum();
        f64::from(sum) / (bins.len() as f64 * 255.0)
    }
}

/// Drives a numeric property from the energy of a spectrum band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactiveMapping {
    pub band: SpectrumBand,
    pub object_id: ObjectId,
    pub property: Property,
    pub gain: f64,
    pub offset: f64,
}

impl ReactiveMapping {
    pub fn new(
        band: SpectrumBand,
        object_id: impl Into<ObjectId>,
        property: Property,
        gain: f64,
        offset: f64,
    ) -> Result<Self> {
        let mapping = Self {
            band,
            object_id: object_id.into(),
            property,
            gain,
            offset,
        };
        mapping.validate(None)?;
        Ok(mapping)
    }

    /// Checks the target is numeric and the band is non-empty (and fits
    /// within `bin_count` when known).
    pub fn validate(&self, bin_count: Option<usize>) -> Result<()> {
        if self.property.value_kind() != ValueKind::Number {
            return Err(SyncFrameError::config(format!(
                "reactive mappings need a numeric property, `{}` is not",
                self.property
            )));
        }
        if self.band.start_bin >= self.band.end_bin {
            return Err(SyncFrameError::config("spectrum band is empty"));
        }
        if let Some(bins) = bin_count {
            if self.band.end_bin > bins {
                return Err(SyncFrameError::config(format!(
                    "spectrum band ends at bin {} but only {bins} bins exist",
                    self.band.end_bin
                )));
            }
        }
        if !self.gain.is_finite() || !self.offset.is_finite() {
            return Err(SyncFrameError::config("gain and offset must be finite"));
        }
        Ok(())
    }

    pub fn contribution(&self, spectrum: &[u8]) -> f64 {
        self.gain * self.band.level(spectrum)
    }
}

/// Per-frame property updates: keyframed values first, then audio-reactive
/// contributions layered on top.
#[derive(Debug, Default, Clone)]
pub struct MappingMatrix {
    mappings: Vec<ReactiveMapping>,
    updates: Vec<PropertyUpdate>,
}

impl MappingMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mappings(mappings: Vec<ReactiveMapping>) -> Self {
        Self {
            mappings,
            updates: Vec::new(),
        }
    }

    pub fn mappings(&self) -> &[ReactiveMapping] {
        &self.mappings
    }

    pub fn push_mapping(&mut self, mapping: ReactiveMapping) {
        self.mappings.push(mapping);
    }

    pub fn clear(&mut self) {
        self.updates.clear();
    }

    pub fn updates(&self) -> &[PropertyUpdate] {
        &self.updates
    }

    /// Rebuilds the updates for one instant. A mapping whose target is also
    /// keyframed adds its contribution to the keyframed number; otherwise it
    /// produces `offset + contribution`.
    pub fn evaluate(
        &mut self,
        store: &KeyframeStore,
        time: f64,
        spectrum: &[u8],
    ) -> &[PropertyUpdate] {
        self.updates = evaluate_store(store, time);

        for mapping in &self.mappings {
            let contribution = mapping.contribution(spectrum);
            let existing = self
                .updates
                .iter_mut()
                .find(|u| u.object_id == mapping.object_id && u.property == mapping.property);

            match existing {
                Some(PropertyUpdate {
                    value: KeyframeValue::Number(value),
                    ..
                }) => *value += contribution,
                Some(_) => {}
                None => self.updates.push(PropertyUpdate {
                    object_id: mapping.object_id.clone(),
                    property: mapping.property,
                    value: KeyframeValue::Number(mapping.offset + contribution),
                }),
            }
        }

        &self.updates
    }
}
