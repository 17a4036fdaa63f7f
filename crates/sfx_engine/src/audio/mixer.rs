//! Category mixer
//!
//! Holds the per-category volume table and the master volume, and composes
//! them into the effective volume applied to native playback handles.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sound categories for independent volume control and pooling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum SoundCategory {
    /// User interface feedback
    Ui,
    /// Combat sounds
    Battle,
    /// Ambient background loops
    Ambient,
    /// Character voices and footsteps
    Character,
    /// World and environment sounds
    Environment,
    /// Item pickups and usage
    Item,
    /// System-level sounds (default category)
    #[default]
    System,
}

impl SoundCategory {
    /// Every category, in declaration order
    pub const ALL: [Self; 7] = [
        Self::Ui,
        Self::Battle,
        Self::Ambient,
        Self::Character,
        Self::Environment,
        Self::Item,
        Self::System,
    ];

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            Self::Ui => "UI",
            Self::Battle => "Battle",
            Self::Ambient => "Ambient",
            Self::Character => "Character",
            Self::Environment => "Environment",
            Self::Item => "Item",
            Self::System => "System",
        }
    }
}

impl std::fmt::Display for SoundCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Audio mixer managing category volumes and master volume
#[derive(Debug, Clone)]
pub struct CategoryMixer {
    /// Volume levels for each category (0.0 to 1.0)
    category_volumes: HashMap<SoundCategory, f32>,
    /// Mute state for each category
    category_muted: HashMap<SoundCategory, bool>,
    /// Master volume (0.0 to 1.0)
    master_volume: f32,
}

impl CategoryMixer {
    /// Create a new mixer with every category at full volume
    pub fn new() -> Self {
        let category_volumes = SoundCategory::ALL.iter().map(|&c| (c, 1.0)).collect();

        Self {
            category_volumes,
            category_muted: HashMap::new(),
            master_volume: 1.0,
        }
    }

    /// Set volume for a specific category (clamped to 0.0..=1.0)
    pub fn set_category_volume(&mut self, category: SoundCategory, volume: f32) {
        self.category_volumes.insert(category, clamp_unit(volume));
    }

    /// Get volume for a specific category
    pub fn category_volume(&self, category: SoundCategory) -> f32 {
        *self.category_volumes.get(&category).unwrap_or(&1.0)
    }

    /// Set the master volume (clamped to 0.0..=1.0)
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = clamp_unit(volume);
    }

    /// Get the master volume
    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Compose `base × category × master`, clamped to 0.0..=1.0
    ///
    /// Muted categories always yield 0.0.
    pub fn effective_volume(&self, base: f32, category: SoundCategory) -> f32 {
        if self.is_muted(category) {
            return 0.0;
        }

        clamp_unit(base * self.category_volume(category) * self.master_volume)
    }

    /// Mute a category
    pub fn mute_category(&mut self, category: SoundCategory) {
        self.category_muted.insert(category, true);
    }

    /// Unmute a category
    pub fn unmute_category(&mut self, category: SoundCategory) {
        self.category_muted.insert(category, false);
    }

    /// Check if a category is muted
    pub fn is_muted(&self, category: SoundCategory) -> bool {
        *self.category_muted.get(&category).unwrap_or(&false)
    }
}

impl Default for CategoryMixer {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp to 0.0..=1.0, mapping NaN to 0.0
pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
