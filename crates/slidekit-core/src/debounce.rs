//! Clocks and debounced deadlines.
//!
//! Deadlines are polled from the host event loop; nothing here spawns timers.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

#[cfg(not(target_arch = "wasm32"))]
pub use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
pub use web_time::{Duration, Instant};

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Latest-value-wins deadlines, one per key.
///
/// Scheduling a key that is already pending replaces its value and pushes
/// its deadline out.
pub struct Debouncer<K, V> {
    pending: HashMap<K, (Instant, V)>,
}

impl<K, V> Default for Debouncer<K, V> {
    fn default() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Debouncer<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debouncer")
            .field("pending", &self.pending.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<K: Eq + Hash + Clone, V> Debouncer<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, key: K, value: V, now: Instant, delay: Duration) {
        self.pending.insert(key, (now + delay, value));
    }

    pub fn cancel(&mut self, key: &K) -> Option<V> {
        self.pending.remove(key).map(|(_, v)| v)
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return entries whose deadline has passed, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<(K, V)> {
        let due: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, (deadline, _))| *deadline <= now)
            .map(|(k, _)| k.clone())
            .collect();
        let mut out: Vec<(Instant, K, V)> = due
            .into_iter()
            .filter_map(|k| self.pending.remove(&k).map(|(d, v)| (d, k, v)))
            .collect();
        out.sort_by_key(|(deadline, ..)| *deadline);
        out.into_iter().map(|(_, k, v)| (k, v)).collect()
    }

    /// Remove every entry regardless of deadline, earliest first.
    pub fn take_all(&mut self) -> Vec<(K, V)> {
        let mut out: Vec<(Instant, K, V)> = self.pending.drain().map(|(k, (d, v))| (d, k, v)).collect();
        out.sort_by_key(|(deadline, ..)| *deadline);
        out.into_iter().map(|(_, k, v)| (k, v)).collect()
    }

    /// Remove every entry whose key matches.
    pub fn take_where(&mut self, mut pred: impl FnMut(&K) -> bool) -> Vec<(K, V)> {
        let keys: Vec<K> = self.pending.keys().filter(|k| pred(k)).cloned().collect();
        keys.into_iter()
            .filter_map(|k| self.pending.remove(&k).map(|(_, v)| (k, v)))
            .collect()
    }
}
