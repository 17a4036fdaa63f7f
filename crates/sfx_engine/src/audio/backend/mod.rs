//! Audio backend implementations
//!
//! Platform-independent abstraction over the native engine that actually
//! mixes and outputs samples. The pool and manager only rely on this trait.

pub mod null_backend;
#[cfg(feature = "rodio")]
pub mod rodio_backend;

use crate::audio::asset::SoundAsset;
use crate::audio::spatial::{AudioEmitter, AudioListener, SpatialConfig};
use crate::audio::AudioError;
use serde::{Deserialize, Serialize};

/// Native playback handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle {
    /// Unique identifier for the native instance
    pub id: u32,
    /// Generation counter for handle validation
    pub generation: u32,
}

impl SoundHandle {
    /// Create a new sound handle
    pub fn new(id: u32, generation: u32) -> Self {
        Self { id, generation }
    }
}

/// Native play state of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Producing sound
    Playing,
    /// Suspended, can be resumed
    Paused,
    /// Finished or stopped; eligible for recycling
    #[default]
    Stopped,
}

/// Audio backend trait for platform abstraction
///
/// Not `Send + Sync`: the sound-effect system is driven from a single game
/// thread and callers serialize access themselves.
pub trait AudioBackend {
    /// Initialize the audio backend
    fn initialize(&mut self, config: &AudioBackendConfig) -> Result<(), AudioError>;

    /// Shutdown the audio backend, releasing every native instance
    fn shutdown(&mut self);

    /// Check if backend is initialized
    fn is_initialized(&self) -> bool;

    /// Create a stopped playback instance for `asset`
    fn create_instance(&mut self, asset: &SoundAsset) -> Result<SoundHandle, AudioError>;

    /// Release a playback instance. Unknown handles are ignored.
    fn destroy_instance(&mut self, handle: SoundHandle);

    /// Start playback from the beginning
    fn play(&mut self, handle: SoundHandle) -> Result<(), AudioError>;

    /// Pause a playing sound
    fn pause(&mut self, handle: SoundHandle) -> Result<(), AudioError>;

    /// Resume a paused sound
    fn resume(&mut self, handle: SoundHandle) -> Result<(), AudioError>;

    /// Stop a sound; `immediate = false` lets the backend fade or finish the
    /// current loop iteration if it supports that
    fn stop(&mut self, handle: SoundHandle, immediate: bool) -> Result<(), AudioError>;

    /// Set volume of a sound (0.0 to 1.0)
    fn set_volume(&mut self, handle: SoundHandle, volume: f32) -> Result<(), AudioError>;

    /// Get volume of a sound
    fn volume(&self, handle: SoundHandle) -> Result<f32, AudioError>;

    /// Set stereo pan (-1.0 to 1.0)
    fn set_pan(&mut self, handle: SoundHandle, pan: f32) -> Result<(), AudioError>;

    /// Get stereo pan
    fn pan(&self, handle: SoundHandle) -> Result<f32, AudioError>;

    /// Set pitch offset in octaves (within `±max_pitch()`)
    fn set_pitch(&mut self, handle: SoundHandle, pitch: f32) -> Result<(), AudioError>;

    /// Get pitch offset
    fn pitch(&self, handle: SoundHandle) -> Result<f32, AudioError>;

    /// Enable or disable looping
    fn set_looping(&mut self, handle: SoundHandle, looping: bool) -> Result<(), AudioError>;

    /// Query the current play state. Unknown handles report `Stopped`.
    fn state(&self, handle: SoundHandle) -> PlaybackState;

    /// Position the instance relative to the listener
    fn apply_3d(
        &mut self,
        handle: SoundHandle,
        listener: &AudioListener,
        emitter: &AudioEmitter,
    ) -> Result<(), AudioError>;

    /// Drop any 3D positioning so the instance plays unattenuated and centred
    fn clear_3d(&mut self, handle: SoundHandle) -> Result<(), AudioError>;

    /// Largest pitch offset the engine accepts, in either direction
    fn max_pitch(&self) -> f32 {
        1.0
    }
}

impl<B: AudioBackend + ?Sized> AudioBackend for Box<B> {
    fn initialize(&mut self, config: &AudioBackendConfig) -> Result<(), AudioError> {
        (**self).initialize(config)
    }

    fn shutdown(&mut self) {
        (**self).shutdown();
    }

    fn is_initialized(&self) -> bool {
        (**self).is_initialized()
    }

    fn create_instance(&mut self, asset: &SoundAsset) -> Result<SoundHandle, AudioError> {
        (**self).create_instance(asset)
    }

    fn destroy_instance(&mut self, handle: SoundHandle) {
        (**self).destroy_instance(handle);
    }

    fn play(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        (**self).play(handle)
    }

    fn pause(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        (**self).pause(handle)
    }

    fn resume(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        (**self).resume(handle)
    }

    fn stop(&mut self, handle: SoundHandle, immediate: bool) -> Result<(), AudioError> {
        (**self).stop(handle, immediate)
    }

    fn set_volume(&mut self, handle: SoundHandle, volume: f32) -> Result<(), AudioError> {
        (**self).set_volume(handle, volume)
    }

    fn volume(&self, handle: SoundHandle) -> Result<f32, AudioError> {
        (**self).volume(handle)
    }

    fn set_pan(&mut self, handle: SoundHandle, pan: f32) -> Result<(), AudioError> {
        (**self).set_pan(handle, pan)
    }

    fn pan(&self, handle: SoundHandle) -> Result<f32, AudioError> {
        (**self).pan(handle)
    }

    fn set_pitch(&mut self, handle: SoundHandle, pitch: f32) -> Result<(), AudioError> {
        (**self).set_pitch(handle, pitch)
    }

    fn pitch(&self, handle: SoundHandle) -> Result<f32, AudioError> {
        (**self).pitch(handle)
    }

    fn set_looping(&mut self, handle: SoundHandle, looping: bool) -> Result<(), AudioError> {
        (**self).set_looping(handle, looping)
    }

    fn state(&self, handle: SoundHandle) -> PlaybackState {
        (**self).state(handle)
    }

    fn apply_3d(
        &mut self,
        handle: SoundHandle,
        listener: &AudioListener,
        emitter: &AudioEmitter,
    ) -> Result<(), AudioError> {
        (**self).apply_3d(handle, listener, emitter)
    }

    fn clear_3d(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        (**self).clear_3d(handle)
    }

    fn max_pitch(&self) -> f32 {
        (**self).max_pitch()
    }
}

/// Configuration for audio backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioBackendConfig {
    /// Sample rate (e.g., 44100, 48000)
    pub sample_rate: u32,
    /// Number of output channels (1=mono, 2=stereo)
    pub channels: u16,
    /// Buffer size for audio processing
    pub buffer_size: usize,
    /// Distance model used for 3D sounds
    pub spatial: SpatialConfig,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            buffer_size: 4096,
            spatial: SpatialConfig::default(),
        }
    }
}

/// Create the default audio backend for the platform
///
/// Uses rodio when the `rodio` feature is enabled, otherwise the headless
/// [`null_backend::NullBackend`].
pub fn create_backend(config: &AudioBackendConfig) -> Result<Box<dyn AudioBackend>, AudioError> {
    #[cfg(feature = "rodio")]
    let mut backend: Box<dyn AudioBackend> = Box::new(rodio_backend::RodioBackend::new());
    #[cfg(not(feature = "rodio"))]
    let mut backend: Box<dyn AudioBackend> = Box::new(null_backend::NullBackend::new());

    backend.initialize(config)?;
    Ok(backend)
}
