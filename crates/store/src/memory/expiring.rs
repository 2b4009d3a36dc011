use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;

/// How often a write also drops expired entries.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Map whose entries expire on the tokio clock.
///
/// Expired entries are invisible to reads and are removed by the first write
/// after each sweep interval, so the map stays bounded by the live set.
#[derive(Debug)]
pub(crate) struct ExpiringMap<K, V> {
    entries: HashMap<K, (V, Instant)>,
    next_sweep: Option<Instant>,
}

impl<K, V> Default for ExpiringMap<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            next_sweep: None,
        }
    }
}

impl<K: Eq + Hash, V> ExpiringMap<K, V> {
    pub(crate) fn get(&self, key: &K) -> Option<&V> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(value, _)| value)
    }

    pub(crate) fn ttl_remaining(&self, key: &K) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > now)
            .map(|(_, expires_at)| *expires_at - now)
    }

    pub(crate) fn insert(&mut self, key: K, value: V, ttl: Duration) {
        let now = Instant::now();
        self.sweep(now);
        self.entries.insert(key, (value, now + ttl));
    }

    pub(crate) fn remove(&mut self, key: &K) {
        self.entries.remove(key);
    }

    /// Number of unexpired entries.
    pub(crate) fn live_count(&self) -> usize {
        let now = Instant::now();
        self.entries
            .values()
            .filter(|(_, expires_at)| *expires_at > now)
            .count()
    }

    /// Number of entries held, expired or not.
    pub(crate) fn stored_count(&self) -> usize {
        self.entries.len()
    }

    fn sweep(&mut self, now: Instant) {
        if self.next_sweep.is_some_and(|at| now < at) {
            return;
        }
        self.entries.retain(|_, (_, expires_at)| *expires_at > now);
        self.next_sweep = Some(now + SWEEP_INTERVAL);
    }
}
