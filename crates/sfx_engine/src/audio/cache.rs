//! Sound asset cache
//!
//! LRU map from a string key to a loaded [`SoundAsset`] plus its category and
//! access statistics.
//!
//! Recency is tracked with a logical clock: every insert and every hit takes
//! the next tick, so no two live entries share a timestamp. Eviction removes
//! the entry with the smallest stamp; on an equal stamp the entry inserted
//! first goes.

use crate::audio::asset::SoundAsset;
use crate::audio::mixer::SoundCategory;
use crate::audio::{AudioError, AudioResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Default maximum number of cached assets
pub const DEFAULT_MAX_CACHE_ENTRIES: usize = 50;

#[derive(Debug)]
struct CacheEntry {
    asset: Arc<SoundAsset>,
    category: SoundCategory,
    last_access: u64,
    access_count: u64,
    /// Insertion order, for eviction tie-breaks
    sequence: u64,
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStatistics {
    /// Cached entries
    pub entries: usize,
    /// Maximum entries before eviction
    pub max_size: usize,
    /// Successful lookups
    pub hits: u64,
    /// Failed lookups
    pub misses: u64,
    /// `hits / (hits + misses)`
    pub hit_rate: f32,
    /// Entries removed to make room
    pub evictions: u64,
    /// Encoded bytes held by cached assets
    pub total_bytes: usize,
}

/// LRU cache of sound assets
#[derive(Debug)]
pub struct SoundCache {
    entries: HashMap<String, CacheEntry>,
    max_size: usize,
    clock: u64,
    next_sequence: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    disposed: bool,
}

impl SoundCache {
    /// Create a cache holding at most `max_size` entries
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(max_size),
            max_size,
            clock: 0,
            next_sequence: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
            disposed: false,
        }
    }

    fn ensure_alive(&self) -> AudioResult<()> {
        if self.disposed {
            Err(AudioError::Disposed)
        } else {
            Ok(())
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Add or refresh an entry
    ///
    /// An existing key is updated in place without eviction. A new key
    /// evicts the least recently used entry first when the cache is full.
    ///
    /// # Errors
    /// `InvalidArgument` for an empty key, `Disposed` after [`dispose`](Self::dispose).
    pub fn add(&mut self, key: &str, asset: Arc<SoundAsset>, category: SoundCategory) -> AudioResult<()> {
        self.ensure_alive()?;
        if key.is_empty() {
            return Err(AudioError::InvalidArgument("sound key must not be empty".to_string()));
        }

        let now = self.tick();
        if let Some(entry) = self.entries.get_mut(key) {
            entry.asset = asset;
            entry.category = category;
            entry.last_access = now;
            entry.access_count = 0;
            return Ok(());
        }

        while self.entries.len() >= self.max_size.max(1) {
            if !self.evict_lru() {
                break;
            }
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                asset,
                category,
                last_access: now,
                access_count: 0,
                sequence,
            },
        );
        Ok(())
    }

    /// Look up an asset, refreshing its recency on a hit
    ///
    /// An empty key counts as a miss.
    pub fn get(&mut self, key: &str) -> AudioResult<Option<Arc<SoundAsset>>> {
        self.ensure_alive()?;

        let now = self.clock + 1;
        match self.entries.get_mut(key) {
            Some(entry) if !key.is_empty() => {
                entry.last_access = now;
                entry.access_count += 1;
                self.clock = now;
                self.hits += 1;
                Ok(Some(Arc::clone(&entry.asset)))
            }
            _ => {
                self.misses += 1;
                Ok(None)
            }
        }
    }

    /// Category recorded for `key`, or the default category
    ///
    /// Does not affect recency.
    pub fn get_category(&self, key: &str) -> AudioResult<SoundCategory> {
        self.ensure_alive()?;
        Ok(self.entries.get(key).map(|e| e.category).unwrap_or_default())
    }

    /// Look up an asset without counting a hit or miss or refreshing recency
    pub fn peek(&self, key: &str) -> AudioResult<Option<Arc<SoundAsset>>> {
        self.ensure_alive()?;
        Ok(self.entries.get(key).map(|e| Arc::clone(&e.asset)))
    }

    /// Whether `key` is cached (does not affect recency)
    pub fn contains(&self, key: &str) -> AudioResult<bool> {
        self.ensure_alive()?;
        Ok(self.entries.contains_key(key))
    }

    /// Remove an entry, returning its asset if it was present
    pub fn remove(&mut self, key: &str) -> AudioResult<Option<Arc<SoundAsset>>> {
        self.ensure_alive()?;
        Ok(self.entries.remove(key).map(|e| e.asset))
    }

    /// Remove every entry of `category`; returns how many were removed
    pub fn evict_category(&mut self, category: SoundCategory) -> AudioResult<usize> {
        self.ensure_alive()?;
        let before = self.entries.len();
        self.entries.retain(|_, e| e.category != category);
        let removed = before - self.entries.len();
        if removed > 0 {
            log::debug!("Evicted {} cached {} sounds", removed, category);
        }
        Ok(removed)
    }

    /// Remove every entry
    pub fn clear(&mut self) -> AudioResult<()> {
        self.ensure_alive()?;
        self.entries.clear();
        Ok(())
    }

    /// Evict least recently used entries until at most `size` remain
    pub fn trim_to_size(&mut self, size: usize) -> AudioResult<usize> {
        self.ensure_alive()?;
        let mut evicted = 0;
        while self.entries.len() > size && self.evict_lru() {
            evicted += 1;
        }
        Ok(evicted)
    }

    /// Change the capacity, trimming immediately if it shrank
    pub fn set_max_size(&mut self, max_size: usize) -> AudioResult<()> {
        self.ensure_alive()?;
        self.max_size = max_size;
        self.trim_to_size(max_size)?;
        Ok(())
    }

    /// Remove the entry with the oldest access stamp
    fn evict_lru(&mut self) -> bool {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, e)| (e.last_access, e.sequence))
            .map(|(key, _)| key.clone());

        let Some(key) = victim else {
            return false;
        };

        self.entries.remove(&key);
        self.evictions += 1;
        log::debug!("Evicted least recently used sound '{}'", key);
        true
    }

    /// Keys of every entry in `category`, sorted
    pub fn keys_in_category(&self, category: SoundCategory) -> AudioResult<Vec<String>> {
        self.ensure_alive()?;
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.category == category)
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Top `count` keys by access count, most accessed first
    ///
    /// Equal counts are ordered by key.
    pub fn most_accessed(&self, count: usize) -> AudioResult<Vec<(String, u64)>> {
        self.ensure_alive()?;
        let mut ranked: Vec<(String, u64)> = self
            .entries
            .iter()
            .map(|(k, e)| (k.clone(), e.access_count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(count);
        Ok(ranked)
    }

    /// Number of cached entries
    pub fn len(&self) -> AudioResult<usize> {
        self.ensure_alive()?;
        Ok(self.entries.len())
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> AudioResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Maximum number of entries
    pub fn max_size(&self) -> AudioResult<usize> {
        self.ensure_alive()?;
        Ok(self.max_size)
    }

    /// `hits / (hits + misses)`, or 0.0 before any lookup
    pub fn hit_rate(&self) -> AudioResult<f32> {
        self.ensure_alive()?;
        let total = self.hits + self.misses;
        Ok(if total == 0 {
            0.0
        } else {
            self.hits as f32 / total as f32
        })
    }

    /// Snapshot of the cache counters
    pub fn statistics(&self) -> AudioResult<CacheStatistics> {
        Ok(CacheStatistics {
            entries: self.len()?,
            max_size: self.max_size,
            hits: self.hits,
            misses: self.misses,
            hit_rate: self.hit_rate()?,
            evictions: self.evictions,
            total_bytes: self.entries.values().map(|e| e.asset.byte_len()).sum(),
        })
    }

    /// Drop every entry and refuse further use
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.entries.clear();
        self.disposed = true;
    }

    /// Whether [`dispose`](Self::dispose) was called
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Default for SoundCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CACHE_ENTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> Arc<SoundAsset> {
        Arc::new(SoundAsset::from_bytes(name, b"RIFF....WAVE").unwrap())
    }

    #[test]
    fn test_oldest_entry_is_evicted() {
        let mut cache = SoundCache::new(2);
        cache.add("a", asset("a"), SoundCategory::Ui).unwrap();
        cache.add("b", asset("b"), SoundCategory::Ui).unwrap();
        cache.add("c", asset("c"), SoundCategory::Ui).unwrap();

        assert_eq!(cache.len().unwrap(), 2);
        assert!(cache.get("a").unwrap().is_none());
        assert!(cache.get("b").unwrap().is_some());
        assert!(cache.get("c").unwrap().is_some());
    }

    #[test]
    fn test_lookup_refreshes_recency() {
        let mut cache = SoundCache::new(2);
        cache.add("a", asset("a"), SoundCategory::Ui).unwrap();
        cache.add("b", asset("b"), SoundCategory::Ui).unwrap();

        // Touch "a" so "b" becomes the oldest
        cache.get("a").unwrap();
        cache.add("c", asset("c"), SoundCategory::Ui).unwrap();

        assert!(cache.contains("a").unwrap());
        assert!(!cache.contains("b").unwrap());
        assert!(cache.contains("c").unwrap());
    }

    #[test]
    fn test_lru_invariant_over_mixed_sequence() {
        let mut cache = SoundCache::new(3);
        let ops: &[(&str, bool)] = &[
            ("a", true), ("b", true), ("c", true), ("a", false), ("d", true),
            ("c", false), ("e", true), ("a", false), ("f", true), ("g", true),
        ];

        for &(key, is_add) in ops {
            if is_add {
                let expected_victim = if cache.len().unwrap() == 3 {
                    cache
                        .entries
                        .iter()
                        .min_by_key(|(_, e)| e.last_access)
                        .map(|(k, _)| k.clone())
                } else {
                    None
                };

                cache.add(key, asset(key), SoundCategory::Battle).unwrap();

                if let Some(victim) = expected_victim {
                    assert!(!cache.contains(&victim).unwrap(), "expected {} to be evicted", victim);
                }
                assert!(cache.len().unwrap() <= 3);
            } else {
                cache.get(key).unwrap();
            }
        }
    }

    #[test]
    fn test_readd_refreshes_in_place() {
        let mut cache = SoundCache::new(2);
        cache.add("a", asset("a"), SoundCategory::Ui).unwrap();
        cache.add("b", asset("b"), SoundCategory::Ui).unwrap();

        let replacement = asset("a2");
        cache.add("a", Arc::clone(&replacement), SoundCategory::Battle).unwrap();

        assert_eq!(cache.len().unwrap(), 2);
        assert_eq!(cache.get_category("a").unwrap(), SoundCategory::Battle);
        assert_eq!(cache.get("a").unwrap().unwrap().id(), replacement.id());
    }

    #[test]
    fn test_hit_and_miss_accounting() {
        let mut cache = SoundCache::new(4);
        assert_eq!(cache.hit_rate().unwrap(), 0.0);

        cache.add("a", asset("a"), SoundCategory::Ui).unwrap();
        cache.get("a").unwrap();
        cache.get("a").unwrap();
        cache.get("missing").unwrap();
        cache.get("").unwrap();

        let stats = cache.statistics().unwrap();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.hit_rate, 0.5);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_peek_leaves_stats_and_order_alone() {
        let mut cache = SoundCache::new(2);
        cache.add("a", asset("a"), SoundCategory::Ui).unwrap();
        cache.add("b", asset("b"), SoundCategory::Ui).unwrap();

        assert_eq!(cache.peek("a").unwrap().unwrap().name(), "a");
        assert!(cache.peek("missing").unwrap().is_none());

        let stats = cache.statistics().unwrap();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);

        // "a" is still the oldest
        cache.add("c", asset("c"), SoundCategory::Ui).unwrap();
        assert!(!cache.contains("a").unwrap());
        assert!(cache.contains("b").unwrap());
    }

    #[test]
    fn test_get_category_does_not_touch_recency() {
        let mut cache = SoundCache::new(2);
        cache.add("a", asset("a"), SoundCategory::Item).unwrap();
        cache.add("b", asset("b"), SoundCategory::Ui).unwrap();

        assert_eq!(cache.get_category("a").unwrap(), SoundCategory::Item);
        assert_eq!(cache.get_category("zzz").unwrap(), SoundCategory::System);

        cache.add("c", asset("c"), SoundCategory::Ui).unwrap();
        assert!(!cache.contains("a").unwrap());
    }

    #[test]
    fn test_empty_key_rejected_on_add() {
        let mut cache = SoundCache::new(2);
        let result = cache.add("", asset("x"), SoundCategory::Ui);
        assert!(matches!(result, Err(AudioError::InvalidArgument(_))));
    }

    #[test]
    fn test_trim_to_size() {
        let mut cache = SoundCache::new(5);
        for key in ["a", "b", "c", "d"] {
            cache.add(key, asset(key), SoundCategory::Ui).unwrap();
        }
        cache.get("a").unwrap();

        assert_eq!(cache.trim_to_size(2).unwrap(), 2);
        assert!(cache.contains("a").unwrap());
        assert!(cache.contains("d").unwrap());

        assert_eq!(cache.trim_to_size(0).unwrap(), 2);
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn test_evict_category_and_clear() {
        let mut cache = SoundCache::new(5);
        cache.add("sword", asset("sword"), SoundCategory::Battle).unwrap();
        cache.add("shield", asset("shield"), SoundCategory::Battle).unwrap();
        cache.add("click", asset("click"), SoundCategory::Ui).unwrap();

        assert_eq!(cache.keys_in_category(SoundCategory::Battle).unwrap(), vec!["shield", "sword"]);
        assert_eq!(cache.evict_category(SoundCategory::Battle).unwrap(), 2);
        assert_eq!(cache.len().unwrap(), 1);

        assert!(cache.remove("click").unwrap().is_some());
        assert!(cache.remove("click").unwrap().is_none());

        cache.add("x", asset("x"), SoundCategory::Ui).unwrap();
        cache.clear().unwrap();
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn test_most_accessed() {
        let mut cache = SoundCache::new(5);
        for key in ["a", "b", "c"] {
            cache.add(key, asset(key), SoundCategory::Ui).unwrap();
        }
        for _ in 0..3 {
            cache.get("b").unwrap();
        }
        cache.get("c").unwrap();

        let top = cache.most_accessed(2).unwrap();
        assert_eq!(top, vec![("b".to_string(), 3), ("c".to_string(), 1)]);
    }

    #[test]
    fn test_set_max_size_trims() {
        let mut cache = SoundCache::new(4);
        for key in ["a", "b", "c", "d"] {
            cache.add(key, asset(key), SoundCategory::Ui).unwrap();
        }
        cache.set_max_size(1).unwrap();
        assert_eq!(cache.len().unwrap(), 1);
        assert!(cache.contains("d").unwrap());
        assert_eq!(cache.statistics().unwrap().evictions, 3);
    }

    #[test]
    fn test_disposed_cache_fails() {
        let mut cache = SoundCache::new(2);
        cache.add("a", asset("a"), SoundCategory::Ui).unwrap();
        cache.dispose();

        assert!(cache.is_disposed());
        assert!(matches!(cache.get("a"), Err(AudioError::Disposed)));
        assert!(matches!(cache.peek("a"), Err(AudioError::Disposed)));
        assert_eq!(cache.add("b", asset("b"), SoundCategory::Ui), Err(AudioError::Disposed));
        assert_eq!(cache.len(), Err(AudioError::Disposed));
        assert_eq!(cache.clear(), Err(AudioError::Disposed));
        assert_eq!(cache.trim_to_size(0), Err(AudioError::Disposed));
    }
}
