//! Bounded in-memory response cache with insertion-order (FIFO) eviction.
//!
//! Each process holds its own cache; hits are best effort. The cache itself is
//! not synchronized, owners wrap it in a mutex.

use std::collections::{HashMap, VecDeque};

use sha2::{Digest, Sha256};

use crate::mode::Mode;

/// Cache key for a (mode, prompt) pair: SHA-256, hex encoded.
pub fn fingerprint(mode: Mode, prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(mode.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(prompt.as_bytes());
    hex::encode(hasher.finalize())
}

pub struct ResponseCache<V> {
    max_size: usize,
    entries: HashMap<String, V>,
    /// Keys in insertion order; overwriting a key keeps its original slot.
    order: VecDeque<String>,
}

impl<V> ResponseCache<V> {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Look up an entry. Reads never affect eviction order.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Insert or overwrite, then evict the oldest entry if over capacity.
    /// The entry just written is never the one evicted.
    pub fn put(&mut self, key: String, value: V) {
        if self.entries.insert(key.clone(), value).is_none() {
            self.order.push_back(key.clone());
        }

        if self.entries.len() > self.max_size {
            if let Some(oldest) = self.order.front() {
                if *oldest != key {
                    if let Some(evicted) = self.order.pop_front() {
                        self.entries.remove(&evicted);
                        tracing::debug!("evicted cache entry {}", short_key(&evicted));
                    }
                }
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.max_size
    }
}

/// First 12 hex characters, enough to tell keys apart in logs.
pub fn short_key(key: &str) -> &str {
    key.get(..12).unwrap_or(key)
}
