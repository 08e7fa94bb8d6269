//! Bounded, time-expiring cache of per-principal permission snapshots.

use crate::grants::PermissionMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use treegate_types::CacheKey;

/// Cache tuning knobs.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached (system, repository, principal) entries.
    pub capacity: usize,
    /// How long an entry stays valid after insertion.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            ttl: Duration::from_secs(180),
        }
    }
}

/// One cached permission snapshot.
///
/// Entries are interchangeable snapshots of the same ground truth; a
/// refresh replaces the entry wholesale rather than patching the map.
/// The global flags and the permission map are fetched independently:
/// an entry may hold either one before it holds both, since a
/// repository-wide grant answers the query without a map at all.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Permission map parsed from the authority's grant list, once
    /// fetched.
    pub permissions: Option<Arc<PermissionMap>>,
    /// Whether the principal can read the entire repository, once known.
    pub global_read: Option<bool>,
    /// Whether the principal can write the entire repository, once known.
    pub global_write: Option<bool>,
    /// Insertion time, used for TTL expiry and oldest-first eviction.
    pub created_at: Instant,
}

impl CacheEntry {
    /// Create a fresh entry around a newly fetched permission map.
    pub fn new(permissions: PermissionMap) -> Self {
        Self {
            permissions: Some(Arc::new(permissions)),
            global_read: None,
            global_write: None,
            created_at: Instant::now(),
        }
    }

    /// Create an entry that so far only carries the global flags.
    pub fn flags_only(read: bool, write: bool) -> Self {
        Self {
            permissions: None,
            global_read: Some(read),
            global_write: Some(write),
            created_at: Instant::now(),
        }
    }
}

/// Bounded keyed store of permission snapshots.
///
/// Every operation runs under a single mutex so that eviction-then-insert
/// and expiry-then-remove are observed atomically. The lock is only held
/// for short map operations; the remote fetch that produces an entry must
/// happen outside it. Two concurrent misses for the same key may both
/// fetch; the last insert wins.
#[derive(Debug)]
pub struct CacheStore {
    config: CacheConfig,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl CacheStore {
    /// Create a store with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Create a store with the default TTL and capacity.
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    /// Look up a live entry.
    ///
    /// An entry older than the TTL is treated as absent and removed as a
    /// side effect of the lookup.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(key) {
            Some(entry) => entry.created_at.elapsed() > self.config.ttl,
            None => return None,
        };
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).cloned()
    }

    /// Insert or replace an entry.
    ///
    /// When the store is at capacity and `key` is new, the entry with the
    /// smallest `created_at` is evicted first. The O(n) scan is fine at
    /// the capacities this store runs with.
    pub fn put(&self, key: CacheKey, entry: CacheEntry) {
        let mut entries = self.entries.lock();
        Self::insert_locked(&mut entries, self.config.capacity, key, entry);
    }

    fn insert_locked(
        entries: &mut HashMap<CacheKey, CacheEntry>,
        capacity: usize,
        key: CacheKey,
        entry: CacheEntry,
    ) {
        if !entries.contains_key(&key) && entries.len() >= capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, e)| e.created_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }
        entries.insert(key, entry);
    }

    /// Drop one entry (session end, forced refresh).
    pub fn invalidate(&self, key: &CacheKey) {
        self.entries.lock().remove(key);
    }

    /// Record the global-access answers for `key`.
    ///
    /// Updates the live entry in place, or starts a flags-only entry when
    /// none exists. Permissions evicted or expired in the meantime are
    /// never resurrected; only the freshly fetched flags are stored.
    pub fn set_global_flags(&self, key: &CacheKey, read: bool, write: bool) {
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(entry) => {
                entry.global_read = Some(read);
                entry.global_write = Some(write);
            }
            None => Self::insert_locked(
                &mut entries,
                self.config.capacity,
                key.clone(),
                CacheEntry::flags_only(read, write),
            ),
        }
    }

    /// Record a freshly parsed permission map for `key`.
    ///
    /// Attaches the map to the live entry, keeping its flags and
    /// `created_at`, or starts a new entry when none exists.
    pub fn set_permissions(&self, key: &CacheKey, permissions: Arc<PermissionMap>) {
        let mut entries = self.entries.lock();
        match entries.get_mut(key) {
            Some(entry) => entry.permissions = Some(permissions),
            None => Self::insert_locked(
                &mut entries,
                self.config.capacity,
                key.clone(),
                CacheEntry {
                    permissions: Some(permissions),
                    global_read: None,
                    global_write: None,
                    created_at: Instant::now(),
                },
            ),
        }
    }

    /// Number of stored entries (expired ones count until touched).
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
