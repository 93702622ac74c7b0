//! Keyframes, keyframe groups and the interpolation engine.

mod interpolate;
mod property;
mod store;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Easing, Result, SyncFrameError};

pub use interpolate::{evaluate, try_interpolate};
pub use property::{Property, ValueKind};
pub use store::{GroupKey, KeyframeGroup, KeyframeStore, SharedKeyframes};

/// Unique identifier for a keyframe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyframeId(pub Uuid);

impl KeyframeId {
    /// Create a new random keyframe ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for KeyframeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for KeyframeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Reference to a scene object owned by the editing layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value stored in a keyframe. One interpolation rule per variant.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyframeValue {
    Number(f64),
    Bool(bool),
    Vector([f64; 3]),
    /// Colour string in any notation understood by [`crate::color::Color::parse`].
    Color(String),
    /// Categorical string such as an animation clip name.
    Discrete(String),
}

impl KeyframeValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Number(_) => ValueKind::Number,
            Self::Bool(_) => ValueKind::Bool,
            Self::Vector(_) => ValueKind::Vector,
            Self::Color(_) => ValueKind::Color,
            Self::Discrete(_) => ValueKind::Discrete,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<[f64; 3]> {
        match self {
            Self::Vector(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Color(s) | Self::Discrete(s) => Some(s),
            _ => None,
        }
    }

    fn from_raw(raw: RawValue, kind: ValueKind) -> Result<Self> {
        let value = match (raw, kind) {
            (RawValue::Number(v), ValueKind::Number) => Self::Number(v),
            (RawValue::Bool(v), ValueKind::Bool) => Self::Bool(v),
            (RawValue::Vector(v), ValueKind::Vector) => Self::Vector(v),
            (RawValue::Text(s), ValueKind::Color) => Self::Color(s),
            (RawValue::Text(s), ValueKind::Discrete) => Self::Discrete(s),
            (raw, kind) => {
                return Err(SyncFrameError::malformed(format!(
                    "expected a {kind} value, found {raw:?}"
                )))
            }
        };
        Ok(value)
    }

    fn into_raw(self) -> RawValue {
        match self {
            Self::Number(v) => RawValue::Number(v),
            Self::Bool(v) => RawValue::Bool(v),
            Self::Vector(v) => RawValue::Vector(v),
            Self::Color(s) | Self::Discrete(s) => RawValue::Text(s),
        }
    }
}

impl Serialize for KeyframeValue {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        self.clone().into_raw().serialize(serializer)
    }
}

/// Untagged JSON shape of a value. Strings are resolved to colour or discrete
/// by the owning property.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawValue {
    Bool(bool),
    Number(f64),
    Vector([f64; 3]),
    Text(String),
}

/// One keyframe. `id`, `object_id` and `property` are fixed at creation;
/// `time`, `value` and `ease` can be edited through [`KeyframeStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "KeyframeRecord", into = "KeyframeRecord")]
pub struct Keyframe {
    id: KeyframeId,
    object_id: ObjectId,
    property: Property,
    time: f64,
    value: KeyframeValue,
    ease: String,
    easing: Easing,
}

impl Keyframe {
    /// Creates a keyframe with `linear` easing.
    ///
    /// Fails with [`SyncFrameError::MalformedValue`] when `time` is negative or
    /// not finite, or when the value kind does not match the property.
    pub fn new(
        object_id: impl Into<ObjectId>,
        property: Property,
        time: f64,
        value: KeyframeValue,
    ) -> Result<Self> {
        validate_time(time)?;
        validate_kind(property, &value)?;
        Ok(Self {
            id: KeyframeId::new(),
            object_id: object_id.into(),
            property,
            time,
            value,
            ease: "linear".to_string(),
            easing: Easing::LINEAR,
        })
    }

    /// Sets the easing name that governs the transition *into* this keyframe.
    pub fn with_ease(mut self, name: impl Into<String>) -> Self {
        self.set_ease(name);
        self
    }

    pub fn id(&self) -> KeyframeId {
        self.id
    }

    pub fn object_id(&self) -> &ObjectId {
        &self.object_id
    }

    pub fn property(&self) -> Property {
        self.property
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn value(&self) -> &KeyframeValue {
        &self.value
    }

    /// The easing name exactly as authored.
    pub fn ease(&self) -> &str {
        &self.ease
    }

    /// The easing resolved from [`Self::ease`].
    pub fn easing(&self) -> Easing {
        self.easing
    }

    pub(crate) fn set_time(&mut self, time: f64) -> Result<()> {
        validate_time(time)?;
        self.time = time;
        Ok(())
    }

    pub(crate) fn set_value(&mut self, value: KeyframeValue) -> Result<()> {
        validate_kind(self.property, &value)?;
        self.value = value;
        Ok(())
    }

    pub(crate) fn set_ease(&mut self, name: impl Into<String>) {
        self.ease = name.into();
        self.easing = Easing::from_name(&self.ease);
    }
}

impl From<&str> for ObjectId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ObjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

fn validate_time(time: f64) -> Result<()> {
    if time.is_finite() && time >= 0.0 {
        Ok(())
    } else {
        Err(SyncFrameError::malformed(format!(
            "keyframe time must be a non-negative number of seconds, got {time}"
        )))
    }
}

fn validate_kind(property: Property, value: &KeyframeValue) -> Result<()> {
    let expected = property.value_kind();
    if value.kind() == expected {
        Ok(())
    } else {
        Err(SyncFrameError::malformed(format!(
            "`{property}` takes {expected} values, not {}",
            value.kind()
        )))
    }
}

fn default_ease() -> String {
    "linear".to_string()
}

/// Persisted shape of a keyframe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyframeRecord {
    id: KeyframeId,
    object_id: ObjectId,
    property: Property,
    time: f64,
    value: RawValue,
    #[serde(default = "default_ease")]
    ease: String,
}

impl TryFrom<KeyframeRecord> for Keyframe {
    type Error = SyncFrameError;

    fn try_from(record: KeyframeRecord) -> Result<Self> {
        let value = KeyframeValue::from_raw(record.value, record.property.value_kind())?;
        let mut keyframe = Keyframe::new(record.object_id, record.property, record.time, value)?;
        keyframe.id = record.id;
        keyframe.set_ease(record.ease);
        Ok(keyframe)
    }
}

impl From<Keyframe> for KeyframeRecord {
    fn from(keyframe: Keyframe) -> Self {
        Self {
            id: keyframe.id,
            object_id: keyframe.object_id,
            property: keyframe.property,
            time: keyframe.time,
            value: keyframe.value.into_raw(),
            ease: keyframe.ease,
        }
    }
}
