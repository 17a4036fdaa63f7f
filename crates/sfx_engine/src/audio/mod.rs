//! Sound-effect system
//!
//! Loading, caching and pooled playback of short sound effects.
//!
//! The [`SoundEffectManager`] owns an LRU [`SoundCache`] of loaded assets, one
//! [`InstancePool`] per [`SoundCategory`], and the [`CategoryMixer`] that
//! composes per-category and master volume. Playback instances are recycled
//! rather than recreated; the per-frame [`SoundEffectManager::update`] call is
//! the only place finished sounds are returned to their pool.

pub mod asset;
pub mod backend;
pub mod cache;
pub mod instance;
pub mod manager;
pub mod mixer;
pub mod playback;
pub mod pool;
pub mod spatial;

#[cfg(test)]
mod tests;

pub use asset::{AssetId, AudioFormat, SoundAsset};
pub use backend::{AudioBackend, AudioBackendConfig, PlaybackState, SoundHandle};
pub use backend::null_backend::NullBackend;
pub use cache::{CacheStatistics, SoundCache};
pub use instance::PlaybackInstance;
pub use manager::{SoundEffectManager, SoundEffectStatistics, SoundInstanceHandle};
pub use mixer::{CategoryMixer, SoundCategory};
pub use playback::SoundEffectPlaybackConfig;
pub use pool::{BucketStatistics, InstanceKey, InstancePool, PoolStatistics};
pub use spatial::{AudioEmitter, AudioListener, SpatialConfig, SpatialParams};

use thiserror::Error;

/// Result type for sound-effect operations
pub type AudioResult<T> = Result<T, AudioError>;

/// Audio system errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Operation attempted after teardown
    #[error("Audio component has been disposed")]
    Disposed,

    /// Empty key, empty asset data or similar caller error
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unknown sound key
    #[error("Sound not found: {0}")]
    NotFound(String),

    /// Concurrency limit reached or backend refused a new instance
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Backend was used before `initialize`
    #[error("Audio backend not initialized")]
    BackendNotInitialized,

    /// Backend failed to start
    #[error("Audio backend initialization failed: {0}")]
    BackendInitFailed(String),

    /// Handle does not refer to a live native instance
    #[error("Invalid sound handle")]
    InvalidHandle,

    /// Native playback call failed
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),
}
