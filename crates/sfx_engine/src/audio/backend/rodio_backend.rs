//! Rodio audio backend implementation
//!
//! Uses the Rodio library for cross-platform audio playback.
//! Rodio is pure Rust and supports WAV, OGG Vorbis, MP3, and FLAC formats.
//!
//! Each native instance keeps the asset's encoded bytes and creates a fresh
//! [`Sink`] every time it is played, so a recycled instance can be replayed
//! any number of times.
//!
//! # Example
//!
//! ```no_run
//! use sfx_engine::audio::backend::{AudioBackend, AudioBackendConfig};
//! use sfx_engine::audio::backend::rodio_backend::RodioBackend;
//! use sfx_engine::audio::SoundAsset;
//!
//! let mut backend = RodioBackend::new();
//! backend.initialize(&AudioBackendConfig::default()).unwrap();
//!
//! let bytes = std::fs::read("resources/audio/laser.wav").unwrap();
//! let asset = SoundAsset::from_bytes("laser.wav", &bytes).unwrap();
//! let handle = backend.create_instance(&asset).unwrap();
//!
//! backend.set_volume(handle, 0.5).unwrap();
//! backend.play(handle).unwrap();
//! ```

use super::{AudioBackend, AudioBackendConfig, PlaybackState, SoundHandle};
use crate::audio::asset::SoundAsset;
use crate::audio::spatial::{AudioEmitter, AudioListener, SpatialConfig, SpatialParams};
use crate::audio::AudioError;
use rodio::source::ChannelVolume;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

/// One native instance: encoded data plus the sink of the current playback
struct RodioInstance {
    data: Arc<[u8]>,
    sink: Option<Sink>,
    volume: f32,
    pan: f32,
    pitch: f32,
    looping: bool,
    spatial: Option<SpatialParams>,
}

impl RodioInstance {
    fn output_volume(&self) -> f32 {
        self.volume * self.spatial.map_or(1.0, |s| s.gain)
    }

    fn output_pan(&self) -> f32 {
        (self.pan + self.spatial.map_or(0.0, |s| s.pan)).clamp(-1.0, 1.0)
    }

    /// Pitch offset in octaves to playback speed
    fn speed(&self) -> f32 {
        2.0_f32.powf(self.pitch)
    }
}

/// Rodio-based audio backend
pub struct RodioBackend {
    /// Audio output stream (must be kept alive)
    _output_stream: Option<OutputStream>,
    /// Output stream handle for creating sinks
    stream_handle: Option<OutputStreamHandle>,
    /// Native instances by handle
    instances: HashMap<SoundHandle, RodioInstance>,
    /// Distance model for 3D sounds
    spatial: SpatialConfig,
    /// Next sound ID for handle generation
    next_id: u32,
    /// Initialization state
    initialized: bool,
}

impl RodioBackend {
    /// Create a new Rodio backend
    pub fn new() -> Self {
        Self {
            _output_stream: None,
            stream_handle: None,
            instances: HashMap::new(),
            spatial: SpatialConfig::default(),
            next_id: 0,
            initialized: false,
        }
    }

    /// Generate a new sound handle
    fn next_handle(&mut self) -> SoundHandle {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        SoundHandle::new(id, 0)
    }

    fn instance_mut(&mut self, handle: SoundHandle) -> Result<&mut RodioInstance, AudioError> {
        self.instances.get_mut(&handle).ok_or(AudioError::InvalidHandle)
    }

    fn instance(&self, handle: SoundHandle) -> Result<&RodioInstance, AudioError> {
        self.instances.get(&handle).ok_or(AudioError::InvalidHandle)
    }

    /// Build a sink for `instance` and start it
    fn start_sink(stream_handle: &OutputStreamHandle, instance: &RodioInstance) -> Result<Sink, AudioError> {
        let sink = Sink::try_new(stream_handle)
            .map_err(|e| AudioError::PlaybackFailed(format!("Failed to create sink: {}", e)))?;

        let decoder = Decoder::new(Cursor::new(Arc::clone(&instance.data)))
            .map_err(|e| AudioError::PlaybackFailed(format!("Failed to decode audio: {}", e)))?;

        // Equal-power stereo placement; pan is fixed for the lifetime of the sink
        let angle = (instance.output_pan() + 1.0) * std::f32::consts::FRAC_PI_4;
        let channel_volumes = vec![angle.cos(), angle.sin()];

        if instance.looping {
            let source = decoder.convert_samples::<f32>().repeat_infinite();
            sink.append(ChannelVolume::new(source, channel_volumes));
        } else {
            let source = decoder.convert_samples::<f32>();
            sink.append(ChannelVolume::new(source, channel_volumes));
        }

        sink.set_speed(instance.speed());
        sink.set_volume(instance.output_volume());
        sink.play();
        Ok(sink)
    }
}

impl AudioBackend for RodioBackend {
    fn initialize(&mut self, config: &AudioBackendConfig) -> Result<(), AudioError> {
        if self.initialized {
            return Ok(());
        }

        // Create output stream
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| AudioError::BackendInitFailed(format!("Failed to create audio output: {}", e)))?;

        self._output_stream = Some(stream);
        self.stream_handle = Some(stream_handle);
        self.spatial = config.spatial.clone();
        self.initialized = true;

        log::info!("Rodio audio backend initialized");
        Ok(())
    }

    fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }

        for (_handle, instance) in self.instances.drain() {
            if let Some(sink) = instance.sink {
                sink.stop();
            }
        }

        // Drop stream handle and output
        self.stream_handle = None;
        self._output_stream = None;
        self.initialized = false;

        log::info!("Rodio audio backend shutdown");
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn create_instance(&mut self, asset: &SoundAsset) -> Result<SoundHandle, AudioError> {
        if !self.initialized {
            return Err(AudioError::BackendNotInitialized);
        }

        let handle = self.next_handle();
        self.instances.insert(
            handle,
            RodioInstance {
                data: asset.shared_data(),
                sink: None,
                volume: 1.0,
                pan: 0.0,
                pitch: 0.0,
                looping: false,
                spatial: None,
            },
        );
        Ok(handle)
    }

    fn destroy_instance(&mut self, handle: SoundHandle) {
        if let Some(instance) = self.instances.remove(&handle) {
            if let Some(sink) = instance.sink {
                sink.stop();
            }
        }
    }

    fn play(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        let stream_handle = self.stream_handle.clone().ok_or(AudioError::BackendNotInitialized)?;
        let instance = self.instance_mut(handle)?;

        if let Some(old) = instance.sink.take() {
            old.stop();
        }
        instance.sink = Some(Self::start_sink(&stream_handle, instance)?);
        Ok(())
    }

    fn pause(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        if let Some(sink) = &self.instance(handle)?.sink {
            sink.pause();
        }
        Ok(())
    }

    fn resume(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        if let Some(sink) = &self.instance(handle)?.sink {
            sink.play();
        }
        Ok(())
    }

    fn stop(&mut self, handle: SoundHandle, _immediate: bool) -> Result<(), AudioError> {
        // Rodio has no release stage, so every stop is immediate
        if let Some(sink) = self.instance_mut(handle)?.sink.take() {
            sink.stop();
        }
        Ok(())
    }

    fn set_volume(&mut self, handle: SoundHandle, volume: f32) -> Result<(), AudioError> {
        let instance = self.instance_mut(handle)?;
        instance.volume = volume;
        if let Some(sink) = &instance.sink {
            sink.set_volume(instance.output_volume());
        }
        Ok(())
    }

    fn volume(&self, handle: SoundHandle) -> Result<f32, AudioError> {
        Ok(self.instance(handle)?.volume)
    }

    fn set_pan(&mut self, handle: SoundHandle, pan: f32) -> Result<(), AudioError> {
        self.instance_mut(handle)?.pan = pan;
        Ok(())
    }

    fn pan(&self, handle: SoundHandle) -> Result<f32, AudioError> {
        Ok(self.instance(handle)?.pan)
    }

    fn set_pitch(&mut self, handle: SoundHandle, pitch: f32) -> Result<(), AudioError> {
        let instance = self.instance_mut(handle)?;
        instance.pitch = pitch;
        if let Some(sink) = &instance.sink {
            sink.set_speed(instance.speed());
        }
        Ok(())
    }

    fn pitch(&self, handle: SoundHandle) -> Result<f32, AudioError> {
        Ok(self.instance(handle)?.pitch)
    }

    fn set_looping(&mut self, handle: SoundHandle, looping: bool) -> Result<(), AudioError> {
        self.instance_mut(handle)?.looping = looping;
        Ok(())
    }

    fn state(&self, handle: SoundHandle) -> PlaybackState {
        match self.instances.get(&handle).and_then(|i| i.sink.as_ref()) {
            Some(sink) if sink.empty() => PlaybackState::Stopped,
            Some(sink) if sink.is_paused() => PlaybackState::Paused,
            Some(_) => PlaybackState::Playing,
            None => PlaybackState::Stopped,
        }
    }

    fn apply_3d(
        &mut self,
        handle: SoundHandle,
        listener: &AudioListener,
        emitter: &AudioEmitter,
    ) -> Result<(), AudioError> {
        let params = self.spatial.compute(listener, emitter);
        let instance = self.instance_mut(handle)?;
        instance.spatial = Some(params);
        if let Some(sink) = &instance.sink {
            sink.set_volume(instance.output_volume());
        }
        Ok(())
    }

    fn clear_3d(&mut self, handle: SoundHandle) -> Result<(), AudioError> {
        let instance = self.instance_mut(handle)?;
        instance.spatial = None;
        if let Some(sink) = &instance.sink {
            sink.set_volume(instance.output_volume());
        }
        Ok(())
    }
}

impl Default for RodioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        self.shutdown();
    }
}
