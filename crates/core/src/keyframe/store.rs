use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::Path,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{Result, SyncFrameError};

use super::{evaluate, Keyframe, KeyframeId, KeyframeValue, ObjectId, Property};

/// Grouping key of a keyframe: one animated property of one scene object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub object_id: ObjectId,
    pub property: Property,
}

impl GroupKey {
    pub fn new(object_id: impl Into<ObjectId>, property: Property) -> Self {
        Self {
            object_id: object_id.into(),
            property,
        }
    }
}

/// All keyframes sharing a [`GroupKey`], sorted ascending by time. Keyframes
/// with equal times stay in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeGroup {
    key: GroupKey,
    keyframes: Vec<Keyframe>,
}

impl KeyframeGroup {
    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Value of this property at `time`, see [`super::evaluate`].
    pub fn evaluate(&self, time: f64) -> Option<KeyframeValue> {
        evaluate(&self.keyframes, time)
    }

    /// Time of the last keyframe.
    pub fn end_time(&self) -> f64 {
        self.keyframes.last().map(Keyframe::time).unwrap_or(0.0)
    }
}

/// Flat, insertion-ordered keyframe collection with derived groups.
///
/// Groups are rebuilt on every mutation, so readers always see a consistent
/// view.
#[derive(Debug, Clone, Default)]
pub struct KeyframeStore {
    keyframes: Vec<Keyframe>,
    groups: BTreeMap<GroupKey, KeyframeGroup>,
}

impl KeyframeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from keyframes in insertion order.
    pub fn from_keyframes(keyframes: impl IntoIterator<Item = Keyframe>) -> Result<Self> {
        let keyframes: Vec<Keyframe> = keyframes.into_iter().collect();

        let mut seen = HashSet::with_capacity(keyframes.len());
        let mut grouped: BTreeMap<GroupKey, Vec<Keyframe>> = BTreeMap::new();
        for keyframe in &keyframes {
            if !seen.insert(keyframe.id()) {
                return Err(duplicate(keyframe.id()));
            }
            grouped
                .entry(GroupKey::new(keyframe.object_id().clone(), keyframe.property()))
                .or_default()
                .push(keyframe.clone());
        }

        let groups = grouped
            .into_iter()
            .map(|(key, mut keyframes)| {
                sort_by_time(&mut keyframes);
                let group = KeyframeGroup {
                    key: key.clone(),
                    keyframes,
                };
                (key, group)
            })
            .collect();

        Ok(Self { keyframes, groups })
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Keyframes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Keyframe> {
        self.keyframes.iter()
    }

    pub fn get(&self, id: KeyframeId) -> Option<&Keyframe> {
        self.keyframes.iter().find(|k| k.id() == id)
    }

    /// Adds a keyframe after any existing keyframes with the same time.
    /// Value kinds are checked against the property when the keyframe is
    /// built, which keeps every group homogeneous.
    pub fn insert(&mut self, keyframe: Keyframe) -> Result<KeyframeId> {
        let id = keyframe.id();
        if self.get(id).is_some() {
            return Err(duplicate(id));
        }

        let key = GroupKey::new(keyframe.object_id().clone(), keyframe.property());
        let group = self
            .groups
            .entry(key.clone())
            .or_insert_with(|| KeyframeGroup {
                key,
                keyframes: Vec::new(),
            });
        let at = group.keyframes.partition_point(|k| k.time() <= keyframe.time());
        group.keyframes.insert(at, keyframe.clone());

        self.keyframes.push(keyframe);
        Ok(id)
    }

    pub fn remove(&mut self, id: KeyframeId) -> Result<Keyframe> {
        let index = self.index_of(id)?;
        let keyframe = self.keyframes.remove(index);
        self.rebuild_group(&GroupKey::new(keyframe.object_id().clone(), keyframe.property()));
        Ok(keyframe)
    }

    pub fn set_time(&mut self, id: KeyframeId, time: f64) -> Result<()> {
        self.edit(id, |keyframe| keyframe.set_time(time))
    }

    pub fn set_value(&mut self, id: KeyframeId, value: KeyframeValue) -> Result<()> {
        self.edit(id, |keyframe| keyframe.set_value(value))
    }

    pub fn set_ease(&mut self, id: KeyframeId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.edit(id, |keyframe| {
            keyframe.set_ease(name);
            Ok(())
        })
    }

    pub fn group(&self, object_id: &ObjectId, property: Property) -> Option<&KeyframeGroup> {
        self.groups.get(&GroupKey {
            object_id: object_id.clone(),
            property,
        })
    }

    /// Groups ordered by object id, then property.
    pub fn groups(&self) -> impl Iterator<Item = &KeyframeGroup> {
        self.groups.values()
    }

    /// Latest keyframe time across all groups.
    pub fn end_time(&self) -> f64 {
        self.groups().map(KeyframeGroup::end_time).fold(0.0, f64::max)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.keyframes)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let keyframes: Vec<Keyframe> = serde_json::from_str(json)?;
        Self::from_keyframes(keyframes)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path.as_ref(), self.to_json()?)?;
        tracing::info!(path = ?path.as_ref(), keyframes = self.len(), "saved keyframes");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        let store = Self::from_json(&json)?;
        tracing::info!(path = ?path.as_ref(), keyframes = store.len(), "loaded keyframes");
        Ok(store)
    }

    fn index_of(&self, id: KeyframeId) -> Result<usize> {
        self.keyframes
            .iter()
            .position(|k| k.id() == id)
            .ok_or_else(|| SyncFrameError::NotFound(id.to_string()))
    }

    fn edit(&mut self, id: KeyframeId, f: impl FnOnce(&mut Keyframe) -> Result<()>) -> Result<()> {
        let index = self.index_of(id)?;
        let keyframe = &mut self.keyframes[index];
        f(keyframe)?;
        let key = GroupKey::new(keyframe.object_id().clone(), keyframe.property());
        self.rebuild_group(&key);
        Ok(())
    }

    fn rebuild_group(&mut self, key: &GroupKey) {
        let mut keyframes: Vec<Keyframe> = self
            .keyframes
            .iter()
            .filter(|k| k.object_id() == &key.object_id && k.property() == key.property)
            .cloned()
            .collect();

        if keyframes.is_empty() {
            self.groups.remove(key);
            return;
        }

        sort_by_time(&mut keyframes);
        self.groups.insert(
            key.clone(),
            KeyframeGroup {
                key: key.clone(),
                keyframes,
            },
        );
    }
}

// Stable: equal times keep insertion order.
fn sort_by_time(keyframes: &mut [Keyframe]) {
    keyframes.sort_by(|a, b| a.time().total_cmp(&b.time()));
}

fn duplicate(id: KeyframeId) -> SyncFrameError {
    SyncFrameError::malformed(format!("keyframe `{id}` already exists"))
}

/// Thread-safe handle over a [`KeyframeStore`]. The editing layer takes the
/// write lock for mutations, render ticks take the read lock, so a tick never
/// observes a half-applied edit.
#[derive(Clone, Default)]
pub struct SharedKeyframes {
    shared: Arc<RwLock<KeyframeStore>>,
}

impl SharedKeyframes {
    pub fn new(store: KeyframeStore) -> Self {
        Self {
            shared: Arc::new(RwLock::new(store)),
        }
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, KeyframeStore>> {
        self.shared
            .read()
            .map_err(|_| SyncFrameError::msg("keyframe store has been poisoned"))
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, KeyframeStore>> {
        self.shared
            .write()
            .map_err(|_| SyncFrameError::msg("keyframe store has been poisoned"))
    }
}

impl std::fmt::Debug for SharedKeyframes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedKeyframes").finish()
    }
}
