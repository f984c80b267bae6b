//! A bounded map of in-flight requests (pending auth/wire exchanges) that
//! expire themselves after a configured timeout, per spec's "memory: ...
//! the pending-request map in the credential authenticator (bounded by
//! configured timeout with automatic expiry)".

use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

pub struct PendingStore<T> {
    timeout: Duration,
    entries: FxHashMap<String, (Instant, T)>,
}

impl<T> PendingStore<T> {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, entries: FxHashMap::default() }
    }

    pub fn insert(&mut self, id: impl Into<String>, value: T) {
        self.expire();
        self.entries.insert(id.into(), (Instant::now(), value));
    }

    /// Removes and returns the entry if present and not yet expired.
    pub fn take(&mut self, id: &str) -> Option<T> {
        self.expire();
        self.entries.remove(id).map(|(_, v)| v)
    }

    pub fn contains(&mut self, id: &str) -> bool {
        self.expire();
        self.entries.contains_key(id)
    }

    pub fn len(&mut self) -> usize {
        self.expire();
        self.entries.len()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    fn expire(&mut self) {
        let now = Instant::now();
        let timeout = self.timeout;
        self.entries.retain(|_, (inserted_at, _)| now.duration_since(*inserted_at) < timeout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn insert_then_take_returns_the_value_once() {
        let mut store = PendingStore::new(Duration::from_secs(60));
        store.insert("req-1", 42);
        assert_eq!(store.take("req-1"), Some(42));
        assert_eq!(store.take("req-1"), None);
    }

    #[test]
    fn entries_older_than_the_timeout_expire_automatically() {
        let mut store = PendingStore::new(Duration::from_millis(10));
        store.insert("req-1", "value");
        sleep(Duration::from_millis(30));
        assert_eq!(store.take("req-1"), None);
    }

    #[test]
    fn len_reflects_only_unexpired_entries() {
        let mut store = PendingStore::new(Duration::from_millis(10));
        store.insert("req-1", 1);
        assert_eq!(store.len(), 1);
        sleep(Duration::from_millis(30));
        assert_eq!(store.len(), 0);
    }
}
