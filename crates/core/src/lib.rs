//! Core library for SyncFrame, an audio-synchronised keyframe animation engine.
//!
//! A single [`Transport`] clock drives everything. Each frame reads it once,
//! evaluates every keyframe group with [`KeyframeStore`], samples the
//! spectrum with [`FrequencySampler`] and layers the results through a
//! [`MappingMatrix`] into [`PropertyUpdate`]s for a [`PropertySink`].
//! [`FrameExporter`] runs the same pipeline frame by frame for offline
//! rendering.

pub mod analysis;
pub mod audio;
pub mod color;
pub mod config;
pub mod easing;
pub mod error;
pub mod export;
pub mod keyframe;
pub mod mapping;
pub mod scene;
pub mod timeline;

pub use analysis::{FrequencySampler, SamplerConfig, WindowFunction};
pub use audio::AudioBuffer;
pub use color::{Color, ColorFormat, Hsla};
pub use config::{EngineConfig, SettingsStore};
pub use easing::{Curve, Direction, Easing};
pub use error::{Result, SyncFrameError};
pub use export::{ExportSettings, FrameExporter, FrameState};
pub use keyframe::{
    GroupKey, Keyframe, KeyframeGroup, KeyframeId, KeyframeStore, KeyframeValue, ObjectId,
    Property, SharedKeyframes, ValueKind,
};
pub use mapping::{evaluate_store, MappingMatrix, PropertyUpdate, ReactiveMapping, SpectrumBand};
pub use scene::{PropertySink, SceneState};
pub use timeline::{AudioOutput, Phase, PlaybackClock, SteppedClock, Transport, TransportEvent};
