//! Playback-instance wrapper
//!
//! [`PlaybackInstance`] adapts one native [`SoundHandle`]. It clamps every
//! parameter before handing it to the backend and absorbs backend failures:
//! a broken native call degrades to a no-op instead of aborting the frame.

use crate::audio::asset::{AssetId, SoundAsset};
use crate::audio::backend::{AudioBackend, PlaybackState, SoundHandle};
use crate::audio::mixer::{clamp_unit, SoundCategory};
use crate::audio::spatial::{AudioEmitter, AudioListener};
use crate::audio::AudioResult;
use crate::foundation::math::Vec3;
use std::sync::Arc;

/// Default pitch offset (no transposition)
pub const DEFAULT_PITCH: f32 = 0.0;

/// A pooled native playback handle plus the parameters last applied to it
#[derive(Debug)]
pub struct PlaybackInstance {
    handle: SoundHandle,
    category: SoundCategory,
    /// Source asset, fixed at creation; keys the pool bucket on return
    asset: Arc<SoundAsset>,
    is_3d: bool,
    emitter: Option<Vec3>,
    /// Requested volume before category and master scaling
    base_volume: f32,
    volume: f32,
    pan: f32,
    pitch: f32,
    looping: bool,
}

impl PlaybackInstance {
    /// Create a native instance for `asset`
    ///
    /// # Errors
    /// Whatever the backend reports when it cannot create the instance.
    pub fn create(
        backend: &mut dyn AudioBackend,
        asset: Arc<SoundAsset>,
        category: SoundCategory,
    ) -> AudioResult<Self> {
        let handle = backend.create_instance(&asset)?;
        Ok(Self {
            handle,
            category,
            asset,
            is_3d: false,
            emitter: None,
            base_volume: 1.0,
            volume: 1.0,
            pan: 0.0,
            pitch: DEFAULT_PITCH,
            looping: false,
        })
    }

    /// Native handle
    pub fn handle(&self) -> SoundHandle {
        self.handle
    }

    /// Category of the pool that owns this instance
    pub fn category(&self) -> SoundCategory {
        self.category
    }

    /// Source asset
    pub fn asset(&self) -> &Arc<SoundAsset> {
        &self.asset
    }

    /// Identity of the source asset
    pub fn asset_id(&self) -> AssetId {
        self.asset.id()
    }

    /// Whether 3D positioning is applied
    pub fn is_3d(&self) -> bool {
        self.is_3d
    }

    /// Emitter position of a 3D instance
    pub fn emitter(&self) -> Option<Vec3> {
        self.emitter
    }

    /// Requested volume before category and master scaling
    pub fn base_volume(&self) -> f32 {
        self.base_volume
    }

    /// Store the requested volume; the caller applies the effective volume
    pub fn set_base_volume(&mut self, volume: f32) {
        self.base_volume = clamp_unit(volume);
    }

    /// Effective volume last applied
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Apply an effective volume (clamped to 0.0..=1.0)
    pub fn set_volume(&mut self, backend: &mut dyn AudioBackend, volume: f32) {
        self.volume = clamp_unit(volume);
        absorb("set_volume", backend.set_volume(self.handle, self.volume));
    }

    /// Pan last applied
    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// Apply stereo pan (clamped to -1.0..=1.0)
    pub fn set_pan(&mut self, backend: &mut dyn AudioBackend, pan: f32) {
        self.pan = if pan.is_nan() { 0.0 } else { pan.clamp(-1.0, 1.0) };
        absorb("set_pan", backend.set_pan(self.handle, self.pan));
    }

    /// Pitch last applied
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Apply pitch (clamped to the backend's `±max_pitch()`)
    pub fn set_pitch(&mut self, backend: &mut dyn AudioBackend, pitch: f32) {
        let max = backend.max_pitch().abs();
        self.pitch = if pitch.is_nan() { DEFAULT_PITCH } else { pitch.clamp(-max, max) };
        absorb("set_pitch", backend.set_pitch(self.handle, self.pitch));
    }

    /// Looping flag
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Enable or disable looping
    pub fn set_looping(&mut self, backend: &mut dyn AudioBackend, looping: bool) {
        self.looping = looping;
        absorb("set_looping", backend.set_looping(self.handle, looping));
    }

    /// Mark as 3D and position the emitter relative to `listener`
    pub fn apply_3d(&mut self, backend: &mut dyn AudioBackend, listener: &AudioListener, position: Vec3) {
        self.is_3d = true;
        self.emitter = Some(position);
        absorb(
            "apply_3d",
            backend.apply_3d(self.handle, listener, &AudioEmitter::at(position)),
        );
    }

    /// Re-apply the stored emitter position against a new listener pose
    pub fn refresh_3d(&mut self, backend: &mut dyn AudioBackend, listener: &AudioListener) {
        if let (true, Some(position)) = (self.is_3d, self.emitter) {
            self.apply_3d(backend, listener, position);
        }
    }

    /// Native play state
    pub fn state(&self, backend: &dyn AudioBackend) -> PlaybackState {
        backend.state(self.handle)
    }

    /// Start playback
    pub fn play(&mut self, backend: &mut dyn AudioBackend) {
        absorb("play", backend.play(self.handle));
    }

    /// Pause; no-op unless playing
    pub fn pause(&mut self, backend: &mut dyn AudioBackend) {
        if self.state(backend) == PlaybackState::Playing {
            absorb("pause", backend.pause(self.handle));
        }
    }

    /// Resume; no-op unless paused
    pub fn resume(&mut self, backend: &mut dyn AudioBackend) {
        if self.state(backend) == PlaybackState::Paused {
            absorb("resume", backend.resume(self.handle));
        }
    }

    /// Stop playback
    pub fn stop(&mut self, backend: &mut dyn AudioBackend, immediate: bool) {
        absorb("stop", backend.stop(self.handle, immediate));
    }

    /// Restore default parameters before the instance is requeued
    ///
    /// Idempotent: a second call leaves the same observable state.
    pub fn reset(&mut self, backend: &mut dyn AudioBackend) {
        self.base_volume = 1.0;
        self.set_volume(backend, 1.0);
        self.set_pitch(backend, DEFAULT_PITCH);
        self.set_pan(backend, 0.0);
        self.set_looping(backend, false);
        self.clear_3d(backend);
    }

    /// Return to plain 2D playback, on the wrapper and in the backend
    pub fn clear_3d(&mut self, backend: &mut dyn AudioBackend) {
        self.is_3d = false;
        self.emitter = None;
        absorb("clear_3d", backend.clear_3d(self.handle));
    }

    /// Release the native handle
    pub fn dispose(self, backend: &mut dyn AudioBackend) {
        backend.destroy_instance(self.handle);
    }
}

/// Swallow a native failure
fn absorb(operation: &str, result: AudioResult<()>) {
    if let Err(err) = result {
        log::trace!("Ignoring native {} failure: {}", operation, err);
    }
}
