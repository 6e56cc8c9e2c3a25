use std::collections::BTreeMap;

use relay_intents_types::{Key, KeyHash};

/// Insertion-ordered set of keys indexed by hash
///
/// Removal moves the last key into the freed slot, so indices of untouched
/// keys only change when a key before them is revoked.
#[derive(Clone, Debug, Default)]
pub struct KeyStore {
    order: Vec<KeyHash>,
    entries: BTreeMap<KeyHash, (usize, Key)>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns true when the key was new
    pub fn upsert(&mut self, key: Key) -> bool {
        let hash = key.hash();
        if let Some(entry) = self.entries.get_mut(&hash) {
            entry.1 = key;
            return false;
        }
        self.entries.insert(hash, (self.order.len(), key));
        self.order.push(hash);
        true
    }

    pub fn remove(&mut self, hash: &KeyHash) -> Option<Key> {
        let (index, key) = self.entries.remove(hash)?;
        self.order.swap_remove(index);
        if let Some(moved) = self.order.get(index) {
            if let Some(entry) = self.entries.get_mut(moved) {
                entry.0 = index;
            }
        }
        Some(key)
    }

    pub fn get(&self, hash: &KeyHash) -> Option<&Key> {
        self.entries.get(hash).map(|(_, key)| key)
    }

    pub fn contains(&self, hash: &KeyHash) -> bool {
        self.entries.contains_key(hash)
    }

    pub fn at(&self, index: usize) -> Option<(KeyHash, &Key)> {
        let hash = self.order.get(index)?;
        self.get(hash).map(|key| (*hash, key))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (KeyHash, &Key)> + '_ {
        self.order
            .iter()
            .filter_map(move |hash| self.get(hash).map(|key| (*hash, key)))
    }
}
