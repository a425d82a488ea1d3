//! Silent audio backend
//!
//! Used when no output device can be opened. Every request succeeds and
//! nothing is heard: one-shot voices report finished as soon as they start,
//! looping voices play silently until stopped.

use super::{AudioBackend, AudioBackendConfig, ResourceKind, VoiceId, VoiceIdGenerator};
use crate::audio::AudioError;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NullVoiceState {
    Paused,
    Playing,
    Stopped,
}

#[derive(Debug, Clone)]
struct NullVoice {
    looping: bool,
    state: NullVoiceState,
    gain: f32,
}

/// Backend that accepts everything and outputs nothing
#[derive(Debug, Default)]
pub struct NullBackend {
    voices: HashMap<VoiceId, NullVoice>,
    ids: VoiceIdGenerator,
    initialized: bool,
}

impl NullBackend {
    /// Create a new, uninitialized null backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of voices currently held
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Last gain set on a voice
    pub fn gain(&self, voice: VoiceId) -> Option<f32> {
        self.voices.get(&voice).map(|v| v.gain)
    }

    fn voice_mut(&mut self, voice: VoiceId) -> Result<&mut NullVoice, AudioError> {
        self.voices.get_mut(&voice).ok_or(AudioError::InvalidHandle)
    }
}

impl AudioBackend for NullBackend {
    fn initialize(&mut self, _config: &AudioBackendConfig) -> Result<(), AudioError> {
        if !self.initialized {
            self.initialized = true;
            log::info!("Null audio backend initialized; playback is silent");
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        if !self.initialized {
            return;
        }
        self.stop_all();
        self.initialized = false;
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn update(&mut self) {}

    fn open(&mut self, _path: &Path, _kind: ResourceKind, looping: bool) -> Result<VoiceId, AudioError> {
        if !self.initialized {
            return Err(AudioError::BackendNotInitialized);
        }

        let voice = self.ids.next();
        self.voices.insert(
            voice,
            NullVoice {
                looping,
                state: NullVoiceState::Paused,
                gain: 1.0,
            },
        );
        Ok(voice)
    }

    fn play(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        self.voice_mut(voice)?.state = NullVoiceState::Playing;
        Ok(())
    }

    fn pause(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        let voice = self.voice_mut(voice)?;
        if voice.state == NullVoiceState::Playing {
            voice.state = NullVoiceState::Paused;
        }
        Ok(())
    }

    fn stop(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        if let Some(voice) = self.voices.get_mut(&voice) {
            voice.state = NullVoiceState::Stopped;
        }
        Ok(())
    }

    fn set_gain(&mut self, voice: VoiceId, gain: f32) -> Result<(), AudioError> {
        self.voice_mut(voice)?.gain = gain;
        Ok(())
    }

    fn is_finished(&self, voice: VoiceId) -> bool {
        self.voices.get(&voice).map_or(true, |v| match v.state {
            NullVoiceState::Paused => false,
            NullVoiceState::Playing => !v.looping,
            NullVoiceState::Stopped => true,
        })
    }

    fn release(&mut self, voice: VoiceId) {
        self.voices.remove(&voice);
    }

    fn stop_all(&mut self) {
        self.voices.clear();
    }
}
