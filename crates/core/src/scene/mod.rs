use std::collections::BTreeMap;

use crate::{KeyframeValue, ObjectId, Property, PropertyUpdate};

/// Receiver of evaluated property values, implemented by the rendering layer.
pub trait PropertySink {
    fn set_property(&mut self, object_id: &ObjectId, property: Property, value: &KeyframeValue);

    fn apply_updates(&mut self, updates: &[PropertyUpdate]) {
        for update in updates {
            self.set_property(&update.object_id, update.property, &update.value);
        }
    }
}

/// In-memory property table. Keeps the last value applied to each property,
/// so properties without a contribution this frame hold their prior value.
#[derive(Debug, Default, Clone)]
pub struct SceneState {
    values: BTreeMap<(ObjectId, Property), KeyframeValue>,
}

impl SceneState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, object_id: &ObjectId, property: Property) -> Option<&KeyframeValue> {
        self.values.get(&(object_id.clone(), property))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries ordered by object id, then property.
    pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, Property, &KeyframeValue)> {
        self.values
            .iter()
            .map(|((object_id, property), value)| (object_id, *property, value))
    }
}

impl PropertySink for SceneState {
    fn set_property(&mut self, object_id: &ObjectId, property: Property, value: &KeyframeValue) {
        self.values
            .insert((object_id.clone(), property), value.clone());
    }
}
