//! # SFX Engine
//!
//! Pooled sound-effect playback for real-time game loops.
//!
//! ## Features
//!
//! - **Asset Cache**: Bounded LRU cache of loaded sounds with hit/miss statistics
//! - **Instance Pooling**: Per-category pools recycle native playback handles
//! - **Category Mixing**: Independent volume and mute per category, plus master volume
//! - **3D Positioning**: Listener-relative gain and pan for world-space sounds
//! - **Pluggable Backends**: Headless backend for tests, rodio for real output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sfx_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut sounds = SoundEffectManager::new(NullBackend::new())?;
//!
//!     let bytes = std::fs::read("assets/audio/explosion.wav")?;
//!     sounds.load("explosion", SoundAsset::from_bytes("explosion.wav", &bytes)?, SoundCategory::Battle)?;
//!     sounds.set_category_volume(SoundCategory::Battle, 0.5);
//!
//!     sounds.play_3d("explosion", Vec3::new(4.0, 0.0, -2.0))?;
//!
//!     // Once per frame
//!     sounds.update();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod audio;
pub mod config;
pub mod foundation;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        audio::{
            AudioBackend, AudioError, AudioResult, NullBackend, PlaybackState, SoundAsset,
            SoundCategory, SoundEffectManager, SoundEffectPlaybackConfig, SoundInstanceHandle,
        },
        config::{Config, SoundEffectsConfig},
        foundation::math::Vec3,
    };
}
