//! Headless audio backend
//!
//! Tracks instance parameters and play state in memory without producing
//! sound. Used on machines without an audio device and throughout the test
//! suite, where [`NullBackend::finish`] stands in for a sound reaching its end.

use super::{AudioBackend, AudioBackendConfig, PlaybackState, SoundHandle};
use crate::audio::asset::{AssetId, SoundAsset};
use crate::audio::spatial::{AudioEmitter, AudioListener, SpatialConfig, SpatialParams};
use crate::audio::AudioError;
use std::collections::HashMap;

/// Stored state of one simulated instance
#[derive(Debug, Clone)]
pub struct NullInstance {
    /// Asset the instance was created for
    pub asset: AssetId,
    /// Current play state
    pub state: PlaybackState,
    /// Last volume set
    pub volume: f32,
    /// Last pan set
    pub pan: f32,
    /// Last pitch set
    pub pitch: f32,
    /// Looping flag
    pub looping: bool,
    /// Result of the last 3D application
    pub spatial: Option<SpatialParams>,
    /// Number of times `play` was called
    pub play_count: u32,
}

/// In-memory audio backend
#[derive(Debug)]
pub struct NullBackend {
    instances: HashMap<SoundHandle, NullInstance>,
    spatial: SpatialConfig,
    next_id: u32,
    /// Maximum live instances (None = unlimited)
    instance_limit: Option<usize>,
    /// When set, every playback call fails
    fail_playback: bool,
    destroyed: usize,
    initialized: bool,
}

impl NullBackend {
    /// Create a new headless backend (call `initialize` before use)
    pub fn new() -> Self {
        Self {
            instances: HashMap::new(),
            spatial: SpatialConfig::default(),
            next_id: 0,
            instance_limit: None,
            fail_playback: false,
            destroyed: 0,
            initialized: false,
        }
    }

    /// Create and initialize a backend with default configuration
    pub fn initialized() -> Self {
        let mut backend = Self::new();
        backend.initialized = true;
        backend
    }

    /// Limit how many live instances `create_instance` will hand out
    pub fn with_instance_limit(mut self, limit: usize) -> Self {
        self.instance_limit = Some(limit);
        self
    }

    /// Change the live-instance limit
    pub fn set_instance_limit(&mut self, limit: Option<usize>) {
        self.instance_limit = limit;
    }

    /// Make every playback call fail, as a broken native engine would
    pub fn set_fail_playback(&mut self, fail: bool) {
        self.fail_playback = fail;
    }

    /// Simulate a sound reaching its natural end
    pub fn finish(&mut self, handle: SoundHandle) {
        if let Some(instance) = self.instances.get_mut(&handle) {
            instance.state = PlaybackState::Stopped;
        }
    }

    /// Simulate every playing sound reaching its end
    pub fn finish_all(&mut self) {
        for instance in self.instances.values_mut() {
            if instance.state == PlaybackState::Playing {
                instance.state = PlaybackState::Stopped;
            }
        }
    }

    /// Inspect an instance
    pub fn instance(&self, handle: SoundHandle) -> Option<&NullInstance> {
        self.instances.get(&handle)
    }

    /// Number of live native instances
    pub fn live_instances(&self) -> usize {
        self.instances.len()
    }

    /// Number of instances destroyed since creation
    pub fn destroyed_instances(&self) -> usize {
        self.destroyed
    }

    /// Generate a new sound handle
    fn next_handle(&mut self) -> SoundHandle {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        SoundHandle::new(id, 0)
    }

    fn playback_check(&self) -> Result<(), AudioError> {
        if self.fail_playback {
            return Err(AudioError::PlaybackFailed("simulated native failure".to_string()));
        }
        Ok(())
    }

    fn instance_mut(&mut self, handle: SoundHandle) -> Result<&mut NullInstance, AudioError> {
        self.playback_check()?;
        self.instances.get_mut(&handle).ok_or(AudioError::InvalidHandle)
    }

    fn instance_ref(&self, handle: SoundHandle) -> Result<&NullInstance, AudioError> {
        self.playback_check()?;
        self.instances.get(&handle).ok_or(AudioError::InvalidHandle)
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for NullBackend {
    fn initialize(&mut self, config: &AudioBackendConfig) -> Result<(), AudioError> {
        if self.initialized {
            return Ok(());
        }

        self.spatial = config.spatial.clone();
        self.initialized = true;
        log::info!("Null audio backend initialized");
        Ok(())
    }

    fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }

        self.destroyed += self.instances.len();
        self.instances.clear();
        self.initialized = false;
        log::info!("Null audio backend shutdown");
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn create_instance(&mut self, asset: &SoundAsset) -> Result<SoundHandle, AudioError> {
        if !self.initialized {
            return Err(AudioError::BackendNotInitialized);
        }

        if let Some(limit) = self.instance_limit {
            if self.instances.len() >= limit {
                return Err(AudioError::ResourceExhausted(format!(
                    "native instance limit of {} reached",
                    limit
                )));
            }
        }

        let handle = self.next_handle();
        self.instances.insert(
            handle,
            NullInstance {
                asset: asset.id(),
                state: PlaybackState::Stopped,
                volume: 1.0,
                pan: 0.0,
                pitch: 0.0,
                looping: false,
                spatial: None,
                play_count: 0,
            },
        );
        Ok(handle)
    }

    fn destroy_instance(&mut self, handle: SoundHandle) {
        if self.instances.remove(&handle).is_some() {
            self.destroyed += 1;
        }
    }

    fn play(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        let instance = self.instance_mut(handle)?;
        instance.state = PlaybackState::Playing;
        instance.play_count += 1;
        Ok(())
    }

    fn pause(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        let instance = self.instance_mut(handle)?;
        if instance.state == PlaybackState::Playing {
            instance.state = PlaybackState::Paused;
        }
        Ok(())
    }

    fn resume(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        let instance = self.instance_mut(handle)?;
        if instance.state == PlaybackState::Paused {
            instance.state = PlaybackState::Playing;
        }
        Ok(())
    }

    fn stop(&mut self, handle: SoundHandle, _immediate: bool) -> Result<(), AudioError> {
        self.instance_mut(handle)?.state = PlaybackState::Stopped;
        Ok(())
    }

    fn set_volume(&mut self, handle: SoundHandle, volume: f32) -> Result<(), AudioError> {
        self.instance_mut(handle)?.volume = volume;
        Ok(())
    }

    fn volume(&self, handle: SoundHandle) -> Result<f32, AudioError> {
        Ok(self.instance_ref(handle)?.volume)
    }

    fn set_pan(&mut self, handle: SoundHandle, pan: f32) -> Result<(), AudioError> {
        self.instance_mut(handle)?.pan = pan;
        Ok(())
    }

    fn pan(&self, handle: SoundHandle) -> Result<f32, AudioError> {
        Ok(self.instance_ref(handle)?.pan)
    }

    fn set_pitch(&mut self, handle: SoundHandle, pitch: f32) -> Result<(), AudioError> {
        self.instance_mut(handle)?.pitch = pitch;
        Ok(())
    }

    fn pitch(&self, handle: SoundHandle) -> Result<f32, AudioError> {
        Ok(self.instance_ref(handle)?.pitch)
    }

    fn set_looping(&mut self, handle: SoundHandle, looping: bool) -> Result<(), AudioError> {
        self.instance_mut(handle)?.looping = looping;
        Ok(())
    }

    fn state(&self, handle: SoundHandle) -> PlaybackState {
        self.instances
            .get(&handle)
            .map_or(PlaybackState::Stopped, |instance| instance.state)
    }

    fn apply_3d(
        &mut self,
        handle: SoundHandle,
        listener: &AudioListener,
        emitter: &AudioEmitter,
    ) -> Result<(), AudioError> {
        let params = self.spatial.compute(listener, emitter);
        self.instance_mut(handle)?.spatial = Some(params);
        Ok(())
    }

    fn clear_3d(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        self.instance_mut(handle)?.spatial = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    fn test_asset() -> SoundAsset {
        SoundAsset::from_bytes("beep.wav", b"RIFF....WAVE").unwrap()
    }

    #[test]
    fn test_backend_initialization() {
        let mut backend = NullBackend::new();
        assert!(!backend.is_initialized());

        backend.initialize(&AudioBackendConfig::default()).unwrap();
        assert!(backend.is_initialized());

        backend.shutdown();
        assert!(!backend.is_initialized());
    }

    #[test]
    fn test_create_without_initialization() {
        let mut backend = NullBackend::new();
        let result = backend.create_instance(&test_asset());
        assert!(matches!(result, Err(AudioError::BackendNotInitialized)));
    }

    #[test]
    fn test_handle_generation() {
        let mut backend = NullBackend::initialized();
        let asset = test_asset();
        let handle1 = backend.create_instance(&asset).unwrap();
        let handle2 = backend.create_instance(&asset).unwrap();

        assert_ne!(handle1.id, handle2.id);
        assert_eq!(backend.live_instances(), 2);
    }

    #[test]
    fn test_play_pause_resume_finish() {
        let mut backend = NullBackend::initialized();
        let handle = backend.create_instance(&test_asset()).unwrap();
        assert_eq!(backend.state(handle), PlaybackState::Stopped);

        backend.play(handle).unwrap();
        assert_eq!(backend.state(handle), PlaybackState::Playing);

        backend.pause(handle).unwrap();
        assert_eq!(backend.state(handle), PlaybackState::Paused);

        backend.resume(handle).unwrap();
        assert_eq!(backend.state(handle), PlaybackState::Playing);

        backend.finish(handle);
        assert_eq!(backend.state(handle), PlaybackState::Stopped);
    }

    #[test]
    fn test_instance_limit() {
        let mut backend = NullBackend::initialized().with_instance_limit(1);
        let asset = test_asset();

        let handle = backend.create_instance(&asset).unwrap();
        assert!(matches!(
            backend.create_instance(&asset),
            Err(AudioError::ResourceExhausted(_))
        ));

        backend.destroy_instance(handle);
        assert!(backend.create_instance(&asset).is_ok());
        assert_eq!(backend.destroyed_instances(), 1);
    }

    #[test]
    fn test_invalid_handle_operations() {
        let mut backend = NullBackend::initialized();
        let invalid_handle = SoundHandle::new(999, 0);

        assert!(matches!(backend.play(invalid_handle), Err(AudioError::InvalidHandle)));
        assert!(matches!(backend.set_volume(invalid_handle, 0.5), Err(AudioError::InvalidHandle)));
        assert!(matches!(backend.volume(invalid_handle), Err(AudioError::InvalidHandle)));
        assert_eq!(backend.state(invalid_handle), PlaybackState::Stopped);
    }

    #[test]
    fn test_apply_3d_records_spatial_params() {
        let mut backend = NullBackend::initialized();
        let handle = backend.create_instance(&test_asset()).unwrap();

        backend
            .apply_3d(handle, &AudioListener::default(), &AudioEmitter::at(Vec3::new(2.0, 0.0, 0.0)))
            .unwrap();

        let spatial = backend.instance(handle).unwrap().spatial.unwrap();
        assert!(spatial.pan > 0.99);
    }

    #[test]
    fn test_fail_playback() {
        let mut backend = NullBackend::initialized();
        let handle = backend.create_instance(&test_asset()).unwrap();
        backend.set_fail_playback(true);

        assert!(matches!(backend.play(handle), Err(AudioError::PlaybackFailed(_))));
        assert_eq!(backend.state(handle), PlaybackState::Stopped);
    }
}
