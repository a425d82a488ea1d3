//! # Channel Audio
//!
//! Channel-based audio resource management for games.
//!
//! ## Features
//!
//! - **Numbered Channels**: Address "the music channel" or "the explosion
//!   channel" without tracking instance identity
//! - **Deferred Reclamation**: Instances live until they are off every
//!   channel and finished playing
//! - **Global Volume**: One master gain applied to every instance
//! - **Pluggable Backends**: Rodio output, or a silent fallback when no device
//!   is available
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use channel_audio::prelude::*;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = AudioConfig::load_from_file("audio.toml")?;
//!     let mut audio = AudioChannelRegistry::new(config);
//!
//!     audio.play_music_on_channel(0, "music/theme.ogg", PlaySettings::new().with_looping(true));
//!
//!     loop {
//!         // Game logic...
//!         audio.play_sound_on_channel(1, "sfx/laser.wav", PlaySettings::new());
//!
//!         audio.tick();
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod audio;
pub mod config;
pub mod foundation;

/// Common imports for registry users
pub mod prelude {
    pub use crate::{
        audio::{
            AudioChannelRegistry, AudioError, MusicHandle, PlaySettings, Playable,
            PlaybackState, SoundHandle,
        },
        config::{AudioConfig, Config, ConfigError},
    };
}
