//! Audio backend implementations
//!
//! Platform-independent abstraction over audio playback libraries. The
//! registry only ever talks to a `dyn AudioBackend`, so any implementation of
//! the capability set can be swapped in.

pub mod null_backend;
#[cfg(feature = "rodio")]
pub mod rodio_backend;
#[cfg(test)]
pub(crate) mod testing;

use crate::audio::AudioError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use null_backend::NullBackend;

/// Identifies one opened voice inside a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId {
    /// Unique identifier for the voice
    pub id: u32,
}

impl VoiceId {
    /// Create a new voice id
    pub fn new(id: u32) -> Self {
        Self { id }
    }
}

/// How the backend should hold an audio resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Short effect decoded fully into memory
    Buffered,
    /// Long track streamed from disk while playing
    Streamed,
}

/// Audio backend trait for platform abstraction
///
/// # Threading
/// NOT Send + Sync: the registry is driven from a single host loop. A backend
/// may still mix on its own thread internally.
///
/// `stop` and `release` must be safe to call redundantly.
pub trait AudioBackend {
    /// Initialize the audio backend
    fn initialize(&mut self, config: &AudioBackendConfig) -> Result<(), AudioError>;

    /// Shutdown the audio backend
    fn shutdown(&mut self);

    /// Check if backend is initialized
    fn is_initialized(&self) -> bool;

    /// Per-frame housekeeping
    fn update(&mut self);

    /// Open a resource and prepare a paused voice for it
    fn open(&mut self, path: &Path, kind: ResourceKind, looping: bool) -> Result<VoiceId, AudioError>;

    /// Start or resume a voice. A voice that was stopped restarts from the beginning.
    fn play(&mut self, voice: VoiceId) -> Result<(), AudioError>;

    /// Pause a playing voice
    fn pause(&mut self, voice: VoiceId) -> Result<(), AudioError>;

    /// Stop a voice, rewinding it
    fn stop(&mut self, voice: VoiceId) -> Result<(), AudioError>;

    /// Set the output gain of a voice
    fn set_gain(&mut self, voice: VoiceId, gain: f32) -> Result<(), AudioError>;

    /// Whether a voice ran out of samples (or is unknown to the backend)
    fn is_finished(&self, voice: VoiceId) -> bool;

    /// Stop a voice and free everything it holds
    fn release(&mut self, voice: VoiceId);

    /// Stop and release all voices
    fn stop_all(&mut self);
}

/// Configuration for audio backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioBackendConfig {
    /// Sample rate (e.g., 44100, 48000)
    pub sample_rate: u32,
    /// Number of output channels (1=mono, 2=stereo)
    pub channels: u16,
    /// Buffer size for audio processing
    pub buffer_size: usize,
}

impl Default for AudioBackendConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 2,
            buffer_size: 4096,
        }
    }
}

/// Create the default audio backend for the platform
#[cfg(feature = "rodio")]
pub fn create_backend(config: &AudioBackendConfig) -> Result<Box<dyn AudioBackend>, AudioError> {
    let mut backend = Box::new(rodio_backend::RodioBackend::new());
    backend.initialize(config)?;
    Ok(backend)
}

/// Create the default audio backend for the platform
///
/// Built without an output backend; callers fall back to [`NullBackend`].
#[cfg(not(feature = "rodio"))]
pub fn create_backend(_config: &AudioBackendConfig) -> Result<Box<dyn AudioBackend>, AudioError> {
    Err(AudioError::BackendFailure(
        "built without an audio output backend (enable the `rodio` feature)".to_string(),
    ))
}

/// Hands out sequential voice ids
#[derive(Debug, Default)]
pub(crate) struct VoiceIdGenerator {
    next_id: u32,
}

impl VoiceIdGenerator {
    pub(crate) fn next(&mut self) -> VoiceId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        VoiceId::new(id)
    }
}
