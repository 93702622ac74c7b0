use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::SyncFrameError;

/// Kind of value a property carries. Every keyframe group is homogeneous in
/// its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Number,
    Bool,
    Vector,
    Color,
    Discrete,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Number => "number",
            Self::Bool => "boolean",
            Self::Vector => "vector",
            Self::Color => "color",
            Self::Discrete => "discrete",
        };
        f.write_str(name)
    }
}

/// Closed set of animatable scene-object properties.
///
/// The dot-path form (`transform.position.x`) only exists at the
/// serialisation boundary; it is resolved once when a keyframe is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Property {
    Position,
    PositionX,
    PositionY,
    PositionZ,
    Rotation,
    RotationX,
    RotationY,
    RotationZ,
    Scale,
    ScaleX,
    ScaleY,
    ScaleZ,
    MaterialColor,
    MaterialEmissive,
    MaterialEmissiveIntensity,
    MaterialOpacity,
    Visible,
    ActiveAnimation,
    AnimationSpeed,
}

static PATHS: [(Property, &str); 19] = [
    (Property::Position, "transform.position"),
    (Property::PositionX, "transform.position.x"),
    (Property::PositionY, "transform.position.y"),
    (Property::PositionZ, "transform.position.z"),
    (Property::Rotation, "transform.rotation"),
    (Property::RotationX, "transform.rotation.x"),
    (Property::RotationY, "transform.rotation.y"),
    (Property::RotationZ, "transform.rotation.z"),
    (Property::Scale, "transform.scale"),
    (Property::ScaleX, "transform.scale.x"),
    (Property::ScaleY, "transform.scale.y"),
    (Property::ScaleZ, "transform.scale.z"),
    (Property::MaterialColor, "material.color"),
    (Property::MaterialEmissive, "material.emissive"),
    (Property::MaterialEmissiveIntensity, "material.emissiveIntensity"),
    (Property::MaterialOpacity, "material.opacity"),
    (Property::Visible, "visible"),
    (Property::ActiveAnimation, "activeAnimation"),
    (Property::AnimationSpeed, "animationSpeed"),
];

impl Property {
    /// Every property, in declaration order.
    pub fn all() -> impl Iterator<Item = Property> {
        PATHS.iter().map(|(property, _)| *property)
    }

    /// The dot-delimited path used in persisted data and by the renderer.
    pub fn path(self) -> &'static str {
        PATHS
            .iter()
            .find(|(property, _)| *property == self)
            .map(|(_, path)| *path)
            .unwrap_or_default()
    }

    pub fn value_kind(self) -> ValueKind {
        match self {
            Self::Position | Self::Rotation | Self::Scale => ValueKind::Vector,
            Self::MaterialColor | Self::MaterialEmissive => ValueKind::Color,
            Self::Visible => ValueKind::Bool,
            Self::ActiveAnimation => ValueKind::Discrete,
            Self::PositionX
            | Self::PositionY
            | Self::PositionZ
            | Self::RotationX
            | Self::RotationY
            | Self::RotationZ
            | Self::ScaleX
            | Self::ScaleY
            | Self::ScaleZ
            | Self::MaterialEmissiveIntensity
            | Self::MaterialOpacity
            | Self::AnimationSpeed => ValueKind::Number,
        }
    }
}

impl FromStr for Property {
    type Err = SyncFrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PATHS
            .iter()
            .find(|(_, path)| *path == s)
            .map(|(property, _)| *property)
            .ok_or_else(|| SyncFrameError::malformed(format!("unknown property path `{s}`")))
    }
}

impl TryFrom<String> for Property {
    type Error = SyncFrameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Property> for String {
    fn from(value: Property) -> Self {
        value.path().to_string()
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
