//! Sound effect manager
//!
//! Front door of the sound-effect system. Owns the asset cache, one instance
//! pool per category, the category mixer, the listener pose and the set of
//! instances currently checked out for playback.
//!
//! A `play` request walks a fixed pipeline: resolve the asset in the cache,
//! pick the category, check an instance out of that category's pool, apply
//! variation and the composed volume, position it in 3D if asked, start it.
//! Any stage may refuse, in which case `play` returns `Ok(None)`.
//!
//! Finished sounds are only recycled in [`SoundEffectManager::update`], which
//! the host calls once per frame.

use crate::audio::asset::SoundAsset;
use crate::audio::backend::{AudioBackend, PlaybackState};
use crate::audio::cache::{CacheStatistics, SoundCache};
use crate::audio::instance::PlaybackInstance;
use crate::audio::mixer::{clamp_unit, CategoryMixer, SoundCategory};
use crate::audio::playback::SoundEffectPlaybackConfig;
use crate::audio::pool::{InstanceKey, InstancePool, PoolStatistics};
use crate::audio::spatial::AudioListener;
use crate::audio::{AudioError, AudioResult};
use crate::config::SoundEffectsConfig;
use crate::foundation::math::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Handle to a sound started by [`SoundEffectManager::play`]
///
/// Stays valid while the instance is checked out. Once the instance is
/// recycled by `update`, calls taking this handle become no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundInstanceHandle {
    category: SoundCategory,
    key: InstanceKey,
}

impl SoundInstanceHandle {
    /// Category pool the instance was taken from
    pub fn category(&self) -> SoundCategory {
        self.category
    }

    /// Key of the instance inside its pool
    pub fn key(&self) -> InstanceKey {
        self.key
    }
}

/// Aggregate statistics of the sound-effect system
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoundEffectStatistics {
    /// Cache statistics (default after disposal)
    pub cache: CacheStatistics,
    /// Per-category pool statistics
    pub pools: BTreeMap<SoundCategory, PoolStatistics>,
    /// Instances currently checked out
    pub active: usize,
    /// Instances created across all pools
    pub total_created: u64,
    /// Requests satisfied by reuse across all pools
    pub total_reused: u64,
}

/// Sound effect manager
pub struct SoundEffectManager<B: AudioBackend> {
    backend: B,
    cache: SoundCache,
    pools: HashMap<SoundCategory, InstancePool>,
    mixer: CategoryMixer,
    listener: AudioListener,
    /// Checked-out instances in play order
    active: Vec<SoundInstanceHandle>,
    max_concurrent: usize,
    rng: StdRng,
    disposed: bool,
}

impl<B: AudioBackend> SoundEffectManager<B> {
    /// Create a manager with the default configuration
    ///
    /// # Errors
    /// Whatever the backend reports if it has to be initialized and fails.
    pub fn new(backend: B) -> AudioResult<Self> {
        Self::with_config(backend, &SoundEffectsConfig::default())
    }

    /// Create a manager from a configuration
    ///
    /// Initializes the backend if the caller has not done so.
    ///
    /// # Errors
    /// `InvalidArgument` if the configuration does not validate, or the
    /// backend's initialization error.
    pub fn with_config(mut backend: B, config: &SoundEffectsConfig) -> AudioResult<Self> {
        config
            .validate()
            .map_err(|err| AudioError::InvalidArgument(err.to_string()))?;

        if !backend.is_initialized() {
            backend.initialize(&config.backend)?;
        }

        let mut mixer = CategoryMixer::new();
        mixer.set_master_volume(config.master_volume);
        for (&category, &volume) in &config.category_volumes {
            mixer.set_category_volume(category, volume);
        }

        let pools = SoundCategory::ALL
            .iter()
            .map(|&category| (category, InstancePool::new(category)))
            .collect();

        let rng = match config.variation_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        log::info!(
            "Sound effect manager ready (cache {}, {} concurrent sounds)",
            config.max_cache_entries,
            config.max_concurrent_sounds
        );

        Ok(Self {
            backend,
            cache: SoundCache::new(config.max_cache_entries),
            pools,
            mixer,
            listener: AudioListener::default(),
            active: Vec::with_capacity(config.max_concurrent_sounds),
            max_concurrent: config.max_concurrent_sounds,
            rng,
            disposed: false,
        })
    }

    fn ensure_alive(&self) -> AudioResult<()> {
        if self.disposed {
            Err(AudioError::Disposed)
        } else {
            Ok(())
        }
    }

    /// Register a loaded asset under `key`
    ///
    /// Registering an existing key replaces its asset and category.
    ///
    /// # Errors
    /// `InvalidArgument` for an empty key, `Disposed` after teardown.
    pub fn load(&mut self, key: &str, asset: SoundAsset, category: SoundCategory) -> AudioResult<()> {
        self.cache.add(key, Arc::new(asset), category)
    }

    /// Play a cached sound
    ///
    /// # Returns
    /// `Ok(None)` when the request is refused: empty or unknown key, the
    /// concurrency ceiling reached even after a cleanup pass, or no instance
    /// available from the pool.
    ///
    /// # Errors
    /// `Disposed` after teardown.
    pub fn play(
        &mut self,
        key: &str,
        config: &SoundEffectPlaybackConfig,
    ) -> AudioResult<Option<SoundInstanceHandle>> {
        self.ensure_alive()?;

        if key.is_empty() {
            log::debug!("Refusing to play an empty sound key");
            return Ok(None);
        }

        if self.active.len() >= self.max_concurrent {
            self.update();
            if self.active.len() >= self.max_concurrent {
                log::debug!(
                    "Refusing '{}': {} sounds already playing",
                    key,
                    self.active.len()
                );
                return Ok(None);
            }
        }

        let Some(asset) = self.cache.get(key)? else {
            log::debug!("Refusing '{}': not loaded", key);
            return Ok(None);
        };

        let category = match config.category {
            Some(category) => category,
            None => self.cache.get_category(key)?,
        };

        let Some(pool) = self.pools.get_mut(&category) else {
            return Ok(None);
        };
        let Some(instance_key) = pool.get_instance(&mut self.backend, &asset) else {
            log::debug!("Refusing '{}': no {} instance available", key, category);
            return Ok(None);
        };
        let Some(instance) = pool.instance_mut(instance_key) else {
            return Ok(None);
        };

        let (volume, pitch) = vary(&mut self.rng, config);
        instance.set_base_volume(volume);
        let effective = self.mixer.effective_volume(instance.base_volume(), category);
        instance.set_volume(&mut self.backend, effective);
        instance.set_pitch(&mut self.backend, pitch);
        instance.set_pan(&mut self.backend, config.pan);
        instance.set_looping(&mut self.backend, config.looping);

        if config.use_3d {
            let position = config.position.unwrap_or_else(Vec3::zeros);
            instance.apply_3d(&mut self.backend, &self.listener, position);
        }

        instance.play(&mut self.backend);

        let handle = SoundInstanceHandle {
            category,
            key: instance_key,
        };
        self.active.push(handle);
        Ok(Some(handle))
    }

    /// Play a cached sound with default settings
    ///
    /// # Errors
    /// `Disposed` after teardown.
    pub fn play_simple(&mut self, key: &str) -> AudioResult<Option<SoundInstanceHandle>> {
        self.play(key, &SoundEffectPlaybackConfig::default())
    }

    /// Play a cached sound at a world position
    ///
    /// # Errors
    /// `Disposed` after teardown.
    pub fn play_3d(&mut self, key: &str, position: Vec3) -> AudioResult<Option<SoundInstanceHandle>> {
        self.play(key, &SoundEffectPlaybackConfig::default().at_position(position))
    }

    /// Play a cached sound with randomized volume and pitch
    ///
    /// # Errors
    /// `Disposed` after teardown.
    pub fn play_with_variation(
        &mut self,
        key: &str,
        volume_variation: f32,
        pitch_variation: f32,
    ) -> AudioResult<Option<SoundInstanceHandle>> {
        self.play(
            key,
            &SoundEffectPlaybackConfig::default().with_variation(volume_variation, pitch_variation),
        )
    }

    /// Stop every active sound of one category
    ///
    /// The instances go back to their pool on the next `update`.
    pub fn stop_category(&mut self, category: SoundCategory) {
        let Some(pool) = self.pools.get_mut(&category) else {
            return;
        };

        for handle in self.active.iter().filter(|handle| handle.category == category) {
            if let Some(instance) = pool.instance_mut(handle.key) {
                instance.stop(&mut self.backend, false);
            }
        }
    }

    /// Stop every active sound and recycle the instances
    pub fn stop_all(&mut self) {
        for handle in &self.active {
            if let Some(instance) = active_instance_mut(&mut self.pools, *handle) {
                instance.stop(&mut self.backend, true);
            }
        }
        self.update();
    }

    /// Stop one sound
    ///
    /// Returns `false` if the handle no longer refers to an active instance.
    pub fn stop(&mut self, handle: SoundInstanceHandle) -> bool {
        let Some(instance) = active_instance_mut(&mut self.pools, handle) else {
            return false;
        };
        instance.stop(&mut self.backend, true);
        true
    }

    /// Pause one sound
    pub fn pause(&mut self, handle: SoundInstanceHandle) -> bool {
        let Some(instance) = active_instance_mut(&mut self.pools, handle) else {
            return false;
        };
        instance.pause(&mut self.backend);
        true
    }

    /// Resume one paused sound
    pub fn resume(&mut self, handle: SoundInstanceHandle) -> bool {
        let Some(instance) = active_instance_mut(&mut self.pools, handle) else {
            return false;
        };
        instance.resume(&mut self.backend);
        true
    }

    /// Pause every playing sound
    pub fn pause_all(&mut self) {
        for handle in &self.active {
            if let Some(instance) = active_instance_mut(&mut self.pools, *handle) {
                instance.pause(&mut self.backend);
            }
        }
    }

    /// Resume every paused sound
    pub fn resume_all(&mut self) {
        for handle in &self.active {
            if let Some(instance) = active_instance_mut(&mut self.pools, *handle) {
                instance.resume(&mut self.backend);
            }
        }
    }

    /// Whether the sound behind `handle` is active and playing
    pub fn is_playing(&self, handle: SoundInstanceHandle) -> bool {
        self.instance(handle)
            .is_some_and(|instance| instance.state(&self.backend) == PlaybackState::Playing)
    }

    /// Look up an active instance
    pub fn instance(&self, handle: SoundInstanceHandle) -> Option<&PlaybackInstance> {
        let pool = self.pools.get(&handle.category)?;
        if !pool.contains_active(handle.key) {
            return None;
        }
        pool.instance(handle.key)
    }

    /// Change the requested volume of one active sound
    ///
    /// Category and master volume are applied on top.
    pub fn set_instance_volume(&mut self, handle: SoundInstanceHandle, volume: f32) -> bool {
        let Some(instance) = active_instance_mut(&mut self.pools, handle) else {
            return false;
        };
        instance.set_base_volume(volume);
        let effective = self.mixer.effective_volume(instance.base_volume(), handle.category);
        instance.set_volume(&mut self.backend, effective);
        true
    }

    /// Set the volume of one category and re-apply it to its active sounds
    ///
    /// After [`dispose`](Self::dispose) only the stored setting changes.
    pub fn set_category_volume(&mut self, category: SoundCategory, volume: f32) {
        self.log_if_disposed("set_category_volume");
        self.mixer.set_category_volume(category, volume);
        self.apply_volumes(Some(category));
    }

    /// Volume of one category
    pub fn category_volume(&self, category: SoundCategory) -> f32 {
        self.mixer.category_volume(category)
    }

    /// Set the master volume and re-apply it to every active sound
    ///
    /// After [`dispose`](Self::dispose) only the stored setting changes.
    pub fn set_master_volume(&mut self, volume: f32) {
        self.log_if_disposed("set_master_volume");
        self.mixer.set_master_volume(volume);
        self.apply_volumes(None);
    }

    /// Master volume
    pub fn master_volume(&self) -> f32 {
        self.mixer.master_volume()
    }

    /// Silence a category without losing its volume setting
    ///
    /// After [`dispose`](Self::dispose) only the stored setting changes.
    pub fn mute_category(&mut self, category: SoundCategory) {
        self.log_if_disposed("mute_category");
        self.mixer.mute_category(category);
        self.apply_volumes(Some(category));
    }

    /// Restore a muted category
    pub fn unmute_category(&mut self, category: SoundCategory) {
        self.log_if_disposed("unmute_category");
        self.mixer.unmute_category(category);
        self.apply_volumes(Some(category));
    }

    /// Whether a category is muted
    pub fn is_muted(&self, category: SoundCategory) -> bool {
        self.mixer.is_muted(category)
    }

    fn log_if_disposed(&self, operation: &str) {
        if self.disposed {
            log::debug!("{} after dispose: setting stored, no sounds to update", operation);
        }
    }

    /// Recompute effective volume for active sounds (one category, or all)
    fn apply_volumes(&mut self, only: Option<SoundCategory>) {
        for handle in &self.active {
            if only.is_some_and(|category| category != handle.category) {
                continue;
            }
            if let Some(instance) = active_instance_mut(&mut self.pools, *handle) {
                let effective = self.mixer.effective_volume(instance.base_volume(), handle.category);
                instance.set_volume(&mut self.backend, effective);
            }
        }
    }

    /// Move the listener and re-position every active 3D sound
    ///
    /// After [`dispose`](Self::dispose) only the stored pose changes.
    pub fn update_listener(&mut self, position: Vec3, forward: Vec3, up: Vec3) {
        self.log_if_disposed("update_listener");
        self.listener = AudioListener::new(position, forward, up);

        for handle in &self.active {
            if let Some(instance) = active_instance_mut(&mut self.pools, *handle) {
                instance.refresh_3d(&mut self.backend, &self.listener);
            }
        }
    }

    /// Current listener pose
    pub fn listener(&self) -> &AudioListener {
        &self.listener
    }

    /// Return finished sounds to their pools (call once per frame)
    ///
    /// Returns the number of instances recycled.
    pub fn update(&mut self) -> usize {
        let Self {
            backend,
            pools,
            active,
            ..
        } = self;

        let before = active.len();
        active.retain(|handle| {
            let Some(pool) = pools.get_mut(&handle.category) else {
                return false;
            };
            let stopped = pool
                .instance(handle.key)
                .map_or(true, |instance| instance.state(&*backend) == PlaybackState::Stopped);
            if stopped {
                pool.return_instance(&mut *backend, handle.key);
            }
            !stopped
        });

        before - active.len()
    }

    /// Stop everything and empty the cache
    ///
    /// Pools keep their idle instances.
    ///
    /// # Errors
    /// `Disposed` after teardown.
    pub fn clear_cache(&mut self) -> AudioResult<()> {
        self.ensure_alive()?;
        self.stop_all();
        self.cache.clear()
    }

    /// Remove one sound from the cache and release its pooled instances
    ///
    /// Instances of the sound that are still playing are released when they
    /// finish.
    ///
    /// # Errors
    /// `NotFound` for an unknown key, `Disposed` after teardown.
    pub fn unload(&mut self, key: &str) -> AudioResult<()> {
        let Some(asset) = self.cache.remove(key)? else {
            return Err(AudioError::NotFound(key.to_string()));
        };

        for pool in self.pools.values_mut() {
            pool.clear_pool(&mut self.backend, asset.id());
        }
        log::debug!("Unloaded sound '{}'", key);
        Ok(())
    }

    /// Create idle instances of a cached sound ahead of first use
    ///
    /// Returns how many were created.
    ///
    /// # Errors
    /// `NotFound` for an unknown key, `Disposed` after teardown.
    pub fn prewarm(&mut self, key: &str, count: usize) -> AudioResult<usize> {
        let Some(asset) = self.cache.peek(key)? else {
            return Err(AudioError::NotFound(key.to_string()));
        };
        let category = self.cache.get_category(key)?;

        Ok(self
            .pools
            .get_mut(&category)
            .map_or(0, |pool| pool.prewarm(&mut self.backend, &asset, count)))
    }

    /// Number of instances currently checked out
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Concurrency ceiling
    pub fn max_concurrent_sounds(&self) -> usize {
        self.max_concurrent
    }

    /// Snapshot of cache and pool statistics
    pub fn statistics(&self) -> SoundEffectStatistics {
        let pools: BTreeMap<_, _> = self
            .pools
            .iter()
            .map(|(&category, pool)| (category, pool.statistics()))
            .collect();

        SoundEffectStatistics {
            cache: self.cache.statistics().unwrap_or_default(),
            total_created: pools.values().map(|stats| stats.created).sum(),
            total_reused: pools.values().map(|stats| stats.reused).sum(),
            active: self.active.len(),
            pools,
        }
    }

    /// The asset cache
    pub fn cache(&self) -> &SoundCache {
        &self.cache
    }

    /// The instance pool of one category
    pub fn pool(&self, category: SoundCategory) -> Option<&InstancePool> {
        self.pools.get(&category)
    }

    /// The native backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The native backend, mutably
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Whether [`dispose`](Self::dispose) has run
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Stop and release every instance, drop the cache and shut the backend down
    ///
    /// Safe to call more than once; also runs on drop.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }

        let stats = self.statistics();
        for pool in self.pools.values_mut() {
            pool.clear_all(&mut self.backend);
        }
        self.active.clear();
        self.cache.dispose();
        self.backend.shutdown();
        self.disposed = true;

        log::info!(
            "Sound effect manager disposed ({} created, {} reused, cache hit rate {:.2})",
            stats.total_created,
            stats.total_reused,
            stats.cache.hit_rate
        );
    }
}

impl<B: AudioBackend> Drop for SoundEffectManager<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Checked-out instance behind a handle
fn active_instance_mut(
    pools: &mut HashMap<SoundCategory, InstancePool>,
    handle: SoundInstanceHandle,
) -> Option<&mut PlaybackInstance> {
    let pool = pools.get_mut(&handle.category)?;
    if !pool.contains_active(handle.key) {
        return None;
    }
    pool.instance_mut(handle.key)
}

/// Draw randomized volume and pitch for one request
fn vary(rng: &mut StdRng, config: &SoundEffectPlaybackConfig) -> (f32, f32) {
    if !config.randomize_variation {
        return (config.volume, config.pitch);
    }

    let volume_spread = config.volume_variation.abs();
    let pitch_spread = config.pitch_variation.abs();

    let volume = if volume_spread.is_finite() && volume_spread > 0.0 {
        config.volume * (1.0 + rng.gen_range(-volume_spread..=volume_spread))
    } else {
        config.volume
    };
    let pitch = if pitch_spread.is_finite() && pitch_spread > 0.0 {
        config.pitch + rng.gen_range(-pitch_spread..=pitch_spread)
    } else {
        config.pitch
    };

    // Pitch is clamped against the backend range when applied
    (clamp_unit(volume), pitch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::backend::null_backend::NullBackend;
    use approx::assert_relative_eq;

    fn wav(name: &str) -> SoundAsset {
        SoundAsset::from_bytes(name, b"RIFF\0\0\0\0WAVEfmt ").unwrap()
    }

    fn manager() -> SoundEffectManager<NullBackend> {
        SoundEffectManager::new(NullBackend::new()).unwrap()
    }

    #[test]
    fn test_new_initializes_backend() {
        let manager = manager();
        assert!(manager.backend().is_initialized());
        assert_eq!(manager.max_concurrent_sounds(), 32);
        assert_eq!(manager.cache().max_size().unwrap(), 50);
        assert_eq!(manager.active_count(), 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = SoundEffectsConfig::default().with_max_concurrent_sounds(0);
        let result = SoundEffectManager::with_config(NullBackend::new(), &config);
        assert!(matches!(result, Err(AudioError::InvalidArgument(_))));
    }

    #[test]
    fn test_config_volumes_are_applied() {
        let config = SoundEffectsConfig::default()
            .with_master_volume(0.5)
            .with_category_volume(SoundCategory::Ui, 0.5);
        let mut manager = SoundEffectManager::with_config(NullBackend::new(), &config).unwrap();
        manager.load("click", wav("click.wav"), SoundCategory::Ui).unwrap();

        let handle = manager.play_simple("click").unwrap().unwrap();
        assert_relative_eq!(manager.instance(handle).unwrap().volume(), 0.25);
    }

    #[test]
    fn test_refused_requests() {
        let mut manager = manager();
        assert!(manager.play_simple("").unwrap().is_none());
        assert!(manager.play_simple("missing").unwrap().is_none());
        assert_eq!(manager.active_count(), 0);
    }

    #[test]
    fn test_category_override() {
        let mut manager = manager();
        manager.load("step", wav("step.wav"), SoundCategory::Character).unwrap();

        let handle = manager
            .play("step", &SoundEffectPlaybackConfig::default().with_category(SoundCategory::Environment))
            .unwrap()
            .unwrap();
        assert_eq!(handle.category(), SoundCategory::Environment);
        assert_eq!(manager.pool(SoundCategory::Environment).unwrap().active_count(), 1);
        assert_eq!(manager.pool(SoundCategory::Character).unwrap().active_count(), 0);
    }

    #[test]
    fn test_play_applies_parameters() {
        let mut manager = manager();
        manager.load("laser", wav("laser.wav"), SoundCategory::Battle).unwrap();

        let config = SoundEffectPlaybackConfig::default()
            .with_volume(0.6)
            .with_pitch(0.25)
            .with_pan(-0.5)
            .looping();
        let handle = manager.play("laser", &config).unwrap().unwrap();

        let instance = manager.instance(handle).unwrap();
        let native = manager.backend().instance(instance.handle()).unwrap();
        assert_relative_eq!(native.volume, 0.6);
        assert_relative_eq!(native.pitch, 0.25);
        assert_relative_eq!(native.pan, -0.5);
        assert!(native.looping);
        assert_eq!(native.state, PlaybackState::Playing);
        assert!(manager.is_playing(handle));
    }

    #[test]
    fn test_stop_category_defers_recycling() {
        let mut manager = manager();
        manager.load("hit", wav("hit.wav"), SoundCategory::Battle).unwrap();
        manager.load("click", wav("click.wav"), SoundCategory::Ui).unwrap();

        let hit = manager.play_simple("hit").unwrap().unwrap();
        let click = manager.play_simple("click").unwrap().unwrap();

        manager.stop_category(SoundCategory::Battle);
        assert!(!manager.is_playing(hit));
        assert!(manager.is_playing(click));
        assert_eq!(manager.active_count(), 2);

        assert_eq!(manager.update(), 1);
        assert_eq!(manager.active_count(), 1);
        assert!(manager.instance(hit).is_none());
    }

    #[test]
    fn test_stop_all_recycles() {
        let mut manager = manager();
        manager.load("hit", wav("hit.wav"), SoundCategory::Battle).unwrap();
        manager.play_simple("hit").unwrap();
        manager.play_simple("hit").unwrap();

        manager.stop_all();
        assert_eq!(manager.active_count(), 0);
        assert_eq!(manager.pool(SoundCategory::Battle).unwrap().total_idle(), 2);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut manager = manager();
        manager.load("hum", wav("hum.wav"), SoundCategory::Ambient).unwrap();
        let handle = manager.play_simple("hum").unwrap().unwrap();

        assert!(manager.pause(handle));
        assert!(!manager.is_playing(handle));

        // Paused sounds are not recycled
        assert_eq!(manager.update(), 0);

        manager.resume_all();
        assert!(manager.is_playing(handle));

        manager.pause_all();
        assert!(manager.resume(handle));
        assert!(manager.stop(handle));
        assert_eq!(manager.update(), 1);
        assert!(!manager.stop(handle));
    }

    #[test]
    fn test_mute_category() {
        let mut manager = manager();
        manager.load("hit", wav("hit.wav"), SoundCategory::Battle).unwrap();
        let handle = manager.play_simple("hit").unwrap().unwrap();

        manager.mute_category(SoundCategory::Battle);
        assert!(manager.is_muted(SoundCategory::Battle));
        assert_eq!(manager.instance(handle).unwrap().volume(), 0.0);

        manager.unmute_category(SoundCategory::Battle);
        assert_relative_eq!(manager.instance(handle).unwrap().volume(), 1.0);
    }

    #[test]
    fn test_out_of_range_volume_survives_reapply() {
        let mut manager = manager();
        manager.load("hit", wav("hit.wav"), SoundCategory::Battle).unwrap();
        manager.set_category_volume(SoundCategory::Battle, 0.5);

        let loud = SoundEffectPlaybackConfig::default().with_volume(2.0);
        let handle = manager.play("hit", &loud).unwrap().unwrap();
        let before = manager.instance(handle).unwrap().volume();
        assert_relative_eq!(before, 0.5);

        manager.set_category_volume(SoundCategory::Battle, 0.5);
        assert_relative_eq!(manager.instance(handle).unwrap().volume(), before);

        manager.set_master_volume(1.0);
        let native = manager.instance(handle).unwrap().handle();
        assert_relative_eq!(manager.backend().instance(native).unwrap().volume, before);
    }

    #[test]
    fn test_set_instance_volume() {
        let mut manager = manager();
        manager.load("hit", wav("hit.wav"), SoundCategory::Battle).unwrap();
        manager.set_master_volume(0.5);
        let handle = manager.play_simple("hit").unwrap().unwrap();

        assert!(manager.set_instance_volume(handle, 0.5));
        let instance = manager.instance(handle).unwrap();
        assert_relative_eq!(instance.base_volume(), 0.5);
        assert_relative_eq!(instance.volume(), 0.25);
    }

    #[test]
    fn test_unload() {
        let mut manager = manager();
        manager.load("hit", wav("hit.wav"), SoundCategory::Battle).unwrap();
        assert_eq!(manager.prewarm("hit", 3).unwrap(), 3);
        assert_eq!(manager.pool(SoundCategory::Battle).unwrap().total_idle(), 3);

        manager.unload("hit").unwrap();
        assert_eq!(manager.pool(SoundCategory::Battle).unwrap().total_idle(), 0);
        assert_eq!(manager.backend().live_instances(), 0);
        assert!(manager.play_simple("hit").unwrap().is_none());

        assert!(matches!(manager.unload("hit"), Err(AudioError::NotFound(_))));
        assert!(matches!(manager.prewarm("hit", 1), Err(AudioError::NotFound(_))));
    }

    #[test]
    fn test_unload_while_playing_disposes_on_return() {
        let mut manager = manager();
        manager.load("hit", wav("hit.wav"), SoundCategory::Battle).unwrap();
        manager.play_simple("hit").unwrap().unwrap();

        manager.unload("hit").unwrap();
        assert_eq!(manager.backend().live_instances(), 1);

        manager.backend_mut().finish_all();
        assert_eq!(manager.update(), 1);
        assert_eq!(manager.backend().live_instances(), 0);
    }

    #[test]
    fn test_clear_cache_keeps_pools() {
        let mut manager = manager();
        manager.load("hit", wav("hit.wav"), SoundCategory::Battle).unwrap();
        manager.play_simple("hit").unwrap();

        manager.clear_cache().unwrap();
        assert_eq!(manager.active_count(), 0);
        assert!(manager.cache().is_empty().unwrap());
        assert_eq!(manager.pool(SoundCategory::Battle).unwrap().total_idle(), 1);
    }

    #[test]
    fn test_backend_refusal_is_not_an_error() {
        let backend = NullBackend::initialized().with_instance_limit(1);
        let mut manager = SoundEffectManager::new(backend).unwrap();
        manager.load("hit", wav("hit.wav"), SoundCategory::Battle).unwrap();

        assert!(manager.play_simple("hit").unwrap().is_some());
        assert!(manager.play_simple("hit").unwrap().is_none());
        assert_eq!(manager.active_count(), 1);
    }

    #[test]
    fn test_statistics() {
        let mut manager = manager();
        manager.load("hit", wav("hit.wav"), SoundCategory::Battle).unwrap();
        manager.play_simple("hit").unwrap();
        manager.play_simple("nope").unwrap();

        let stats = manager.statistics();
        assert_eq!(stats.active, 1);
        assert_eq!(stats.total_created, 1);
        assert_eq!(stats.cache.hits, 1);
        assert_eq!(stats.cache.misses, 1);
        assert_eq!(stats.pools.len(), SoundCategory::ALL.len());
        assert_eq!(stats.pools[&SoundCategory::Battle].active, 1);
    }

    #[test]
    fn test_dispose() {
        let mut manager = manager();
        manager.load("hit", wav("hit.wav"), SoundCategory::Battle).unwrap();
        manager.play_simple("hit").unwrap();

        manager.dispose();
        manager.dispose();

        assert!(manager.is_disposed());
        assert_eq!(manager.active_count(), 0);
        assert!(!manager.backend().is_initialized());
        assert_eq!(manager.backend().live_instances(), 0);
        assert!(matches!(manager.play_simple("hit"), Err(AudioError::Disposed)));
        assert!(matches!(
            manager.load("x", wav("x.wav"), SoundCategory::Ui),
            Err(AudioError::Disposed)
        ));
        assert!(matches!(manager.clear_cache(), Err(AudioError::Disposed)));
        assert_eq!(manager.update(), 0);
    }

    #[test]
    fn test_settings_after_dispose_are_stored_only() {
        let mut manager = manager();
        manager.load("hit", wav("hit.wav"), SoundCategory::Battle).unwrap();
        manager.play_simple("hit").unwrap();
        manager.dispose();

        manager.set_category_volume(SoundCategory::Battle, 0.25);
        manager.set_master_volume(0.5);
        manager.mute_category(SoundCategory::Ui);
        manager.unmute_category(SoundCategory::Ui);
        manager.update_listener(Vec3::new(1.0, 0.0, 0.0), -Vec3::z(), Vec3::y());

        assert_relative_eq!(manager.category_volume(SoundCategory::Battle), 0.25);
        assert_relative_eq!(manager.master_volume(), 0.5);
        assert_eq!(manager.active_count(), 0);
        assert_eq!(manager.backend().live_instances(), 0);
        assert!(matches!(manager.play_simple("hit"), Err(AudioError::Disposed)));
    }

    #[test]
    fn test_prewarm_is_not_a_cache_lookup() {
        let config = SoundEffectsConfig::default().with_max_cache_entries(2);
        let mut manager = SoundEffectManager::with_config(NullBackend::new(), &config).unwrap();
        manager.load("a", wav("a.wav"), SoundCategory::Ui).unwrap();
        manager.load("b", wav("b.wav"), SoundCategory::Ui).unwrap();

        assert_eq!(manager.prewarm("a", 2).unwrap(), 2);
        let stats = manager.statistics().cache;
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);

        // "a" stays the least recently used entry
        manager.load("c", wav("c.wav"), SoundCategory::Ui).unwrap();
        assert!(!manager.cache().contains("a").unwrap());
        assert!(manager.cache().contains("b").unwrap());
    }

    #[test]
    fn test_boxed_backend() {
        let backend: Box<dyn AudioBackend> = Box::new(NullBackend::new());
        let mut manager = SoundEffectManager::new(backend).unwrap();
        manager.load("hit", wav("hit.wav"), SoundCategory::Battle).unwrap();
        assert!(manager.play_simple("hit").unwrap().is_some());
    }

    #[test]
    fn test_variation_without_spread_is_exact() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = SoundEffectPlaybackConfig::default()
            .with_volume(0.7)
            .with_variation(0.0, f32::NAN);
        assert_eq!(vary(&mut rng, &config), (0.7, 0.0));
    }
}
