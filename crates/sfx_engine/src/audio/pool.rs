//! Instance pool
//!
//! One [`InstancePool`] exists per [`SoundCategory`]. It owns every
//! [`PlaybackInstance`] it has created, idle or checked out, in a slot map.
//! Idle instances wait in a per-asset FIFO bucket; checked-out instances are
//! tracked in the pool's active set. An instance is never in both places.
//!
//! # Recycling
//!
//! A returned instance is requeued into the bucket of the asset recorded on
//! the instance at creation time. If that bucket was cleared while the
//! instance was checked out, the instance is disposed instead.

use crate::audio::asset::{AssetId, SoundAsset};
use crate::audio::backend::{AudioBackend, PlaybackState};
use crate::audio::instance::PlaybackInstance;
use crate::audio::mixer::SoundCategory;
use slotmap::{new_key_type, SlotMap};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

new_key_type! {
    /// Key of an instance inside its category pool
    pub struct InstanceKey;
}

/// Idle queue and totals for one asset
#[derive(Debug, Default)]
struct PoolBucket {
    idle: VecDeque<InstanceKey>,
    created: u64,
    reused: u64,
}

/// Per-bucket statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketStatistics {
    /// Idle instances waiting for reuse
    pub idle: usize,
    /// Instances created for this asset
    pub created: u64,
    /// Requests satisfied from the idle queue
    pub reused: u64,
}

/// Statistics for one pool
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoolStatistics {
    /// Instances created since the last `clear_all`
    pub created: u64,
    /// Requests satisfied by reuse since the last `clear_all`
    pub reused: u64,
    /// Checked-out instances
    pub active: usize,
    /// Idle instances across all buckets
    pub idle: usize,
    /// Number of asset buckets
    pub buckets: usize,
    /// `reused / (created + reused)`
    pub reuse_rate: f32,
}

/// Reusable playback instances for one category
#[derive(Debug)]
pub struct InstancePool {
    category: SoundCategory,
    instances: SlotMap<InstanceKey, PlaybackInstance>,
    buckets: HashMap<AssetId, PoolBucket>,
    active: HashSet<InstanceKey>,
    created: u64,
    reused: u64,
}

impl InstancePool {
    /// Create an empty pool for `category`
    pub fn new(category: SoundCategory) -> Self {
        Self {
            category,
            instances: SlotMap::with_key(),
            buckets: HashMap::new(),
            active: HashSet::new(),
            created: 0,
            reused: 0,
        }
    }

    /// Category served by this pool
    pub fn category(&self) -> SoundCategory {
        self.category
    }

    /// Check out an instance for `asset`, reusing an idle one when possible
    ///
    /// Returns `None` if the backend cannot create a new instance.
    pub fn get_instance(
        &mut self,
        backend: &mut dyn AudioBackend,
        asset: &Arc<SoundAsset>,
    ) -> Option<InstanceKey> {
        let bucket = self.buckets.entry(asset.id()).or_default();

        if let Some(key) = bucket.idle.pop_front() {
            bucket.reused += 1;
            self.reused += 1;
            self.active.insert(key);
            return Some(key);
        }

        let key = self.create_instance(backend, asset)?;
        self.active.insert(key);
        Some(key)
    }

    /// Create a native instance and count it, without queueing or checking it out
    fn create_instance(
        &mut self,
        backend: &mut dyn AudioBackend,
        asset: &Arc<SoundAsset>,
    ) -> Option<InstanceKey> {
        match PlaybackInstance::create(backend, Arc::clone(asset), self.category) {
            Ok(instance) => {
                let key = self.instances.insert(instance);
                let bucket = self.buckets.entry(asset.id()).or_default();
                bucket.created += 1;
                self.created += 1;
                if bucket.created == 1 {
                    log::debug!("Created {} pool bucket for {} ({})", self.category, asset.id(), asset.name());
                }
                Some(key)
            }
            Err(err) => {
                log::debug!("Backend refused a {} instance for {}: {}", self.category, asset.name(), err);
                None
            }
        }
    }

    /// Return a checked-out instance
    ///
    /// Ignores keys that are not in this pool's active set, so double returns
    /// and foreign keys are harmless.
    pub fn return_instance(&mut self, backend: &mut dyn AudioBackend, key: InstanceKey) {
        if !self.active.remove(&key) {
            return;
        }

        let Some(instance) = self.instances.get_mut(key) else {
            return;
        };

        if instance.state(backend) != PlaybackState::Stopped {
            instance.stop(backend, true);
        }
        instance.reset(backend);

        let asset_id = instance.asset_id();
        if let Some(bucket) = self.buckets.get_mut(&asset_id) {
            bucket.idle.push_back(key);
        } else if let Some(instance) = self.instances.remove(key) {
            // Bucket was cleared while the instance was out
            instance.dispose(backend);
        }
    }

    /// Create up to `count` idle instances for `asset` ahead of first use
    ///
    /// Stops early if the backend refuses; returns how many were created.
    pub fn prewarm(&mut self, backend: &mut dyn AudioBackend, asset: &Arc<SoundAsset>, count: usize) -> usize {
        let mut created = 0;
        for _ in 0..count {
            let Some(key) = self.create_instance(backend, asset) else {
                break;
            };
            self.buckets.entry(asset.id()).or_default().idle.push_back(key);
            created += 1;
        }

        if created < count {
            log::debug!("Prewarmed {}/{} {} instances for {}", created, count, self.category, asset.name());
        }
        created
    }

    /// Dispose idle instances of one asset and remove its bucket
    ///
    /// Checked-out instances of that asset are disposed when returned.
    pub fn clear_pool(&mut self, backend: &mut dyn AudioBackend, asset: AssetId) {
        let Some(bucket) = self.buckets.remove(&asset) else {
            return;
        };

        for key in bucket.idle {
            if let Some(instance) = self.instances.remove(key) {
                instance.dispose(backend);
            }
        }
    }

    /// Stop and dispose every instance and reset the counters
    pub fn clear_all(&mut self, backend: &mut dyn AudioBackend) {
        for (key, mut instance) in self.instances.drain() {
            if self.active.contains(&key) {
                instance.stop(backend, true);
            }
            instance.dispose(backend);
        }

        self.active.clear();
        self.buckets.clear();
        self.created = 0;
        self.reused = 0;
    }

    /// Look up an instance owned by this pool
    pub fn instance(&self, key: InstanceKey) -> Option<&PlaybackInstance> {
        self.instances.get(key)
    }

    /// Mutable lookup of an instance owned by this pool
    pub fn instance_mut(&mut self, key: InstanceKey) -> Option<&mut PlaybackInstance> {
        self.instances.get_mut(key)
    }

    /// Whether `key` is currently checked out
    pub fn contains_active(&self, key: InstanceKey) -> bool {
        self.active.contains(&key)
    }

    /// Number of checked-out instances
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Idle instances waiting for `asset`
    pub fn idle_count(&self, asset: AssetId) -> usize {
        self.buckets.get(&asset).map_or(0, |b| b.idle.len())
    }

    /// Idle instances across all buckets
    pub fn total_idle(&self) -> usize {
        self.buckets.values().map(|b| b.idle.len()).sum()
    }

    /// Statistics for one asset bucket
    pub fn bucket_stats(&self, asset: AssetId) -> Option<BucketStatistics> {
        self.buckets.get(&asset).map(|b| BucketStatistics {
            idle: b.idle.len(),
            created: b.created,
            reused: b.reused,
        })
    }

    /// Instances created since the last `clear_all`
    pub fn created_count(&self) -> u64 {
        self.created
    }

    /// Requests satisfied by reuse since the last `clear_all`
    pub fn reused_count(&self) -> u64 {
        self.reused
    }

    /// `reused / (created + reused)`, or 0.0 before any request
    pub fn reuse_rate(&self) -> f32 {
        let total = self.created + self.reused;
        if total == 0 {
            0.0
        } else {
            self.reused as f32 / total as f32
        }
    }

    /// Snapshot of the pool counters
    pub fn statistics(&self) -> PoolStatistics {
        PoolStatistics {
            created: self.created,
            reused: self.reused,
            active: self.active.len(),
            idle: self.total_idle(),
            buckets: self.buckets.len(),
            reuse_rate: self.reuse_rate(),
        }
    }
}
