//! Spatial audio
//!
//! Listener-relative positioning for 3D sound effects. Backends turn an
//! emitter/listener pair into a distance gain and a stereo pan through
//! [`SpatialConfig::compute`].

use crate::foundation::math::{normalize_or, Vec3};
use serde::{Deserialize, Serialize};

/// Configuration for spatial audio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialConfig {
    /// Maximum audible distance from listener
    pub max_distance: f32,
    /// Reference distance for attenuation (no falloff)
    pub reference_distance: f32,
    /// Falloff exponent (1.0 = linear, 2.0 = inverse square)
    pub falloff_exponent: f32,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            max_distance: 100.0,
            reference_distance: 1.0,
            falloff_exponent: 1.0,
        }
    }
}

/// Listener pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioListener {
    /// Position in world space
    pub position: Vec3,
    /// Facing direction
    pub forward: Vec3,
    /// Up direction
    pub up: Vec3,
}

impl Default for AudioListener {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            forward: -Vec3::z(),
            up: Vec3::y(),
        }
    }
}

impl AudioListener {
    /// Create a listener pose
    pub fn new(position: Vec3, forward: Vec3, up: Vec3) -> Self {
        Self { position, forward, up }
    }

    /// Unit vector pointing to the listener's right
    pub fn right(&self) -> Vec3 {
        let forward = normalize_or(self.forward, -Vec3::z());
        let up = normalize_or(self.up, Vec3::y());
        normalize_or(forward.cross(&up), Vec3::x())
    }
}

/// Sound emitter placed in the world
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AudioEmitter {
    /// Position in world space
    pub position: Vec3,
}

impl AudioEmitter {
    /// Create an emitter at `position`
    pub fn at(position: Vec3) -> Self {
        Self { position }
    }
}

/// Result of a spatial computation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialParams {
    /// Distance attenuation factor (0.0 to 1.0)
    pub gain: f32,
    /// Stereo pan (-1.0 left to 1.0 right)
    pub pan: f32,
}

impl SpatialConfig {
    /// Calculate attenuation factor for an emitter at `distance` from the listener
    pub fn attenuation(&self, distance: f32) -> f32 {
        // Beyond max distance, sound is inaudible
        if distance > self.max_distance {
            return 0.0;
        }

        // Within reference distance, no attenuation
        if distance <= self.reference_distance {
            return 1.0;
        }

        let range = self.max_distance - self.reference_distance;
        if range <= f32::EPSILON {
            return 0.0;
        }

        let normalized_distance = (distance - self.reference_distance) / range;
        let attenuation: f32 = 1.0 - normalized_distance.powf(self.falloff_exponent);
        attenuation.max(0.0)
    }

    /// Compute gain and pan of `emitter` as heard by `listener`
    pub fn compute(&self, listener: &AudioListener, emitter: &AudioEmitter) -> SpatialParams {
        let offset = emitter.position - listener.position;
        let distance = offset.norm();

        // Emitter on top of the listener is centred
        let pan = if distance <= f32::EPSILON {
            0.0
        } else {
            (offset / distance).dot(&listener.right()).clamp(-1.0, 1.0)
        };

        SpatialParams {
            gain: self.attenuation(distance),
            pan,
        }
    }
}
