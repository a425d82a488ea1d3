//! Audio system
//!
//! Channel-based management of sound effects and music tracks. The
//! [`AudioChannelRegistry`] owns every live instance, maps numbered channels to
//! them, and reclaims instances once they are off every channel and finished
//! playing. Decoding and mixing are left to an [`backend::AudioBackend`].

pub mod backend;
pub mod channels;
pub mod handle;
pub mod pool;
pub mod registry;

pub use backend::{AudioBackend, AudioBackendConfig, ResourceKind, VoiceId};
pub use channels::ChannelTable;
pub use handle::{AudioKey, MusicHandle, Music, PlaySettings, Playable, PlaybackState, Sound, SoundHandle};
pub use pool::HandlePool;
pub use registry::AudioChannelRegistry;

/// Audio errors
///
/// None of these are fatal: the registry absorbs backend failures and turns
/// them into "no playback".
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// Nothing is assigned to the requested channel
    #[error("Channel {channel} is empty")]
    ChannelEmpty {
        /// The channel that was read
        channel: u32,
    },

    /// The backend could not open or decode an audio resource
    #[error("Invalid audio resource: {0}")]
    InvalidResource(String),

    /// The audio output subsystem is unavailable
    #[error("Audio backend failure: {0}")]
    BackendFailure(String),

    /// The backend was used before `initialize`
    #[error("Audio backend not initialized")]
    BackendNotInitialized,

    /// The handle was destroyed or never belonged to this registry
    #[error("Invalid audio handle")]
    InvalidHandle,
}
