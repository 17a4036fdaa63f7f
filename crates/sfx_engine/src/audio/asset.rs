//! Sound asset types
//!
//! A [`SoundAsset`] stores the raw encoded bytes of a sound effect. It is
//! immutable once created and is identified by its [`AssetId`], never by the
//! key it was cached under.

use crate::audio::{AudioError, AudioResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_ASSET_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a loaded sound asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(u64);

impl AssetId {
    fn next() -> Self {
        Self(NEXT_ASSET_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "asset#{}", self.0)
    }
}

/// Supported audio formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// WAV uncompressed
    Wav,
    /// OGG Vorbis compressed
    Ogg,
    /// MP3 compressed
    Mp3,
    /// FLAC lossless
    Flac,
    /// Unknown format
    Unknown,
}

/// Sound asset containing encoded audio data
///
/// The bytes are decoded on demand by the backend when an instance plays.
#[derive(Debug)]
pub struct SoundAsset {
    id: AssetId,
    name: String,
    data: Arc<[u8]>,
    format: AudioFormat,
}

impl SoundAsset {
    /// Create a new asset from raw bytes and a known format
    pub fn new(name: impl Into<String>, data: impl Into<Arc<[u8]>>, format: AudioFormat) -> Self {
        Self {
            id: AssetId::next(),
            name: name.into(),
            data: data.into(),
            format,
        }
    }

    /// Create an asset from encoded file bytes, detecting the format
    ///
    /// # Errors
    /// `InvalidArgument` if `bytes` is empty or not a recognised format.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> AudioResult<Self> {
        if bytes.is_empty() {
            return Err(AudioError::InvalidArgument("Empty audio data".to_string()));
        }

        let format = Self::detect_format(bytes);
        if format == AudioFormat::Unknown {
            return Err(AudioError::InvalidArgument("Unknown audio format".to_string()));
        }

        Ok(Self::new(name, bytes, format))
    }

    /// Asset identity
    pub fn id(&self) -> AssetId {
        self.id
    }

    /// Debug name, usually the file name the bytes came from
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw encoded data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Shared handle to the encoded data, for backends that decode lazily
    pub fn shared_data(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }

    /// Encoded format
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Size of the encoded data in bytes
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Detect audio format from magic bytes
    pub fn detect_format(bytes: &[u8]) -> AudioFormat {
        if bytes.len() < 4 {
            return AudioFormat::Unknown;
        }

        match &bytes[0..4] {
            b"RIFF" => AudioFormat::Wav,
            b"OggS" => AudioFormat::Ogg,
            b"fLaC" => AudioFormat::Flac,
            // MP3 can start with ID3 tag or frame sync
            [0xFF, 0xFB, _, _] | [0xFF, 0xFA, _, _] => AudioFormat::Mp3,
            [b'I', b'D', b'3', _] => AudioFormat::Mp3,
            _ => AudioFormat::Unknown,
        }
    }
}
