//! Open-addressed, power-of-two sized string map with linear probing and
//! tombstone deletion. The hash function is [`race_common::hash_bytes`] —
//! the same one backing `Slice` — so a key looked up via a borrowed slice
//! and one looked up via an owned `String` always agree.

use race_common::hash_bytes;

const GROW_LOAD_FACTOR: f64 = 0.75;
const COMPACT_TOMBSTONE_FRACTION: f64 = 0.5;

#[derive(Clone)]
enum Slot<V> {
    Empty,
    Occupied(String, V),
    Tombstone,
}

/// Open-addressing hash map keyed by owned strings, sized to the next
/// power of two and grown (or compacted in place) by [`HMap::maybe_resize`]
/// after every insert.
pub struct HMap<V> {
    slots: Vec<Slot<V>>,
    n_entries: usize,
    n_tombstones: usize,
}

impl<V> HMap<V> {
    pub fn new() -> Self {
        Self::with_capacity(8)
    }

    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.next_power_of_two().max(8);
        Self {
            slots: (0..cap).map(|_| Slot::Empty).collect(),
            n_entries: 0,
            n_tombstones: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.n_entries
    }

    pub fn is_empty(&self) -> bool {
        self.n_entries == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    fn start_index(&self, key: &str) -> usize {
        hash_bytes(key.as_bytes()) as usize & self.mask()
    }

    /// Linear probe for `key`: returns `Some(index)` of the occupied slot
    /// if present, else `None`.
    fn find_occupied(&self, key: &str) -> Option<usize> {
        let mask = self.mask();
        let mut idx = self.start_index(key);
        for _ in 0..self.slots.len() {
            match &self.slots[idx] {
                Slot::Empty => return None,
                Slot::Occupied(k, _) if k == key => return Some(idx),
                Slot::Occupied(_, _) | Slot::Tombstone => {
                    idx = (idx + 1) & mask;
                }
            }
        }
        None
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.find_occupied(key).map(|i| match &self.slots[i] {
            Slot::Occupied(_, v) => v,
            _ => unreachable!(),
        })
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let idx = self.find_occupied(key)?;
        match &mut self.slots[idx] {
            Slot::Occupied(_, v) => Some(v),
            _ => unreachable!(),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.find_occupied(key).is_some()
    }

    /// Insert or overwrite `key`. Returns the previous value, if any.
    /// `hmap_add_entry` in spec terms: may trigger compaction or a
    /// doubling rehash afterward.
    pub fn insert(&mut self, key: &str, value: V) -> Option<V> {
        if let Some(idx) = self.find_occupied(key) {
            return match std::mem::replace(&mut self.slots[idx], Slot::Empty) {
                Slot::Occupied(k, old) => {
                    self.slots[idx] = Slot::Occupied(k, value);
                    Some(old)
                }
                _ => unreachable!(),
            };
        }

        let mask = self.mask();
        let mut idx = self.start_index(key);
        loop {
            match &self.slots[idx] {
                Slot::Empty | Slot::Tombstone => {
                    if matches!(self.slots[idx], Slot::Tombstone) {
                        self.n_tombstones -= 1;
                    }
                    self.slots[idx] = Slot::Occupied(key.to_string(), value);
                    self.n_entries += 1;
                    break;
                }
                Slot::Occupied(_, _) => idx = (idx + 1) & mask,
            }
        }
        self.maybe_resize();
        None
    }

    /// Remove `key`, leaving a tombstone in its slot. Returns the removed
    /// value, if present.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let idx = self.find_occupied(key)?;
        let removed = std::mem::replace(&mut self.slots[idx], Slot::Tombstone);
        self.n_entries -= 1;
        self.n_tombstones += 1;
        match removed {
            Slot::Occupied(_, v) => Some(v),
            _ => unreachable!(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.slots.iter().filter_map(|s| match s {
            Slot::Occupied(k, v) => Some((k.as_str(), v)),
            _ => None,
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(k, _)| k)
    }

    fn maybe_resize(&mut self) {
        let load = (self.n_entries + self.n_tombstones) as f64 / self.slots.len() as f64;
        if load >= GROW_LOAD_FACTOR {
            self.rehash(self.slots.len() * 2);
            return;
        }
        let tombstone_fraction = if self.slots.is_empty() {
            0.0
        } else {
            self.n_tombstones as f64 / self.slots.len() as f64
        };
        if tombstone_fraction >= COMPACT_TOMBSTONE_FRACTION {
            self.rehash(self.slots.len());
        }
    }

    fn rehash(&mut self, new_cap: usize) {
        let new_cap = new_cap.next_power_of_two().max(8);
        let old = std::mem::replace(&mut self.slots, (0..new_cap).map(|_| Slot::Empty).collect());
        self.n_tombstones = 0;
        let mask = new_cap - 1;
        for slot in old {
            if let Slot::Occupied(k, v) = slot {
                let mut idx = hash_bytes(k.as_bytes()) as usize & mask;
                loop {
                    match &self.slots[idx] {
                        Slot::Empty => {
                            self.slots[idx] = Slot::Occupied(k, v);
                            break;
                        }
                        _ => idx = (idx + 1) & mask,
                    }
                }
            }
        }
    }
}

impl<V> Default for HMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn s3_scenario_sixty_four_keys() {
        let mut m = HMap::with_capacity(8);
        for i in 0..64 {
            m.insert(&format!("A{i}"), i);
        }
        assert_eq!(m.len(), 64);
        for i in 0..64 {
            assert_eq!(*m.get(&format!("A{i}")).unwrap(), i);
        }
    }

    #[test]
    fn insert_overwrites_and_returns_old_value() {
        let mut m = HMap::new();
        assert_eq!(m.insert("k", 1), None);
        assert_eq!(m.insert("k", 2), Some(1));
        assert_eq!(m.get("k"), Some(&2));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn remove_then_reinsert_finds_a_fresh_slot() {
        let mut m = HMap::new();
        m.insert("a", 1);
        m.insert("b", 2);
        assert_eq!(m.remove("a"), Some(1));
        assert_eq!(m.get("a"), None);
        assert_eq!(m.get("b"), Some(&2));
        m.insert("a", 3);
        assert_eq!(m.get("a"), Some(&3));
    }

    #[test]
    fn full_delete_cycle_returns_to_zero_entries() {
        let mut m = HMap::with_capacity(8);
        for i in 0..20 {
            m.insert(&format!("k{i}"), i);
        }
        for i in 0..20 {
            m.remove(&format!("k{i}"));
        }
        assert_eq!(m.len(), 0);
    }

    #[test]
    fn random_add_remove_trace_agrees_with_a_reference_set() {
        let mut m: HMap<i32> = HMap::with_capacity(8);
        let mut model: HashSet<String> = HashSet::new();
        let keys: Vec<String> = (0..12).map(|i| format!("key{i}")).collect();

        // Deterministic pseudo-random trace (LCG) rather than
        // `rand`/`Math.random()`, which this workspace intentionally does
        // not depend on for unit tests.
        let mut state: u64 = 0x243F6A8885A308D3;
        let mut next = || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            (state >> 33) as usize
        };

        for _ in 0..500 {
            let key = &keys[next() % keys.len()];
            if model.contains(key) {
                m.remove(key);
                model.remove(key);
            } else {
                m.insert(key, 1);
                model.insert(key.clone());
            }
            for k in &keys {
                assert_eq!(m.contains_key(k), model.contains(k), "mismatch for {k}");
            }
        }
        assert_eq!(m.len(), model.len());
    }
}
