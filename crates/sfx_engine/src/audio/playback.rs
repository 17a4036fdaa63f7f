//! Per-play configuration

use crate::audio::mixer::SoundCategory;
use crate::foundation::math::Vec3;

/// Options for one `play` request
///
/// Every field has a default; build with the `with_*` methods.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundEffectPlaybackConfig {
    /// Requested volume before category and master scaling
    pub volume: f32,
    /// Pitch offset in octaves
    pub pitch: f32,
    /// Stereo pan
    pub pan: f32,
    /// Loop until stopped
    pub looping: bool,
    /// Category override; `None` uses the category the sound was loaded with
    pub category: Option<SoundCategory>,
    /// Position the sound in 3D
    pub use_3d: bool,
    /// Emitter position for 3D sounds (origin if unset)
    pub position: Option<Vec3>,
    /// Randomize volume and pitch by the variation amounts
    pub randomize_variation: bool,
    /// Maximum pitch offset added or subtracted
    pub pitch_variation: f32,
    /// Maximum fraction of the volume added or subtracted
    pub volume_variation: f32,
}

impl Default for SoundEffectPlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 1.0,
            pitch: 0.0,
            pan: 0.0,
            looping: false,
            category: None,
            use_3d: false,
            position: None,
            randomize_variation: false,
            pitch_variation: 0.0,
            volume_variation: 0.0,
        }
    }
}

impl SoundEffectPlaybackConfig {
    /// Set the requested volume
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    /// Set the pitch offset
    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    /// Set the stereo pan
    pub fn with_pan(mut self, pan: f32) -> Self {
        self.pan = pan;
        self
    }

    /// Loop until stopped
    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }

    /// Override the category
    pub fn with_category(mut self, category: SoundCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Position the sound in 3D at `position`
    pub fn at_position(mut self, position: Vec3) -> Self {
        self.use_3d = true;
        self.position = Some(position);
        self
    }

    /// Randomize volume and pitch
    pub fn with_variation(mut self, volume_variation: f32, pitch_variation: f32) -> Self {
        self.randomize_variation = true;
        self.volume_variation = volume_variation;
        self.pitch_variation = pitch_variation;
        self
    }
}
