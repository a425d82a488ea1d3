//! Scripted in-memory backend for registry tests
//!
//! The probe shares state with the backend so a test can keep inspecting it
//! after the backend has been boxed into a registry.

use super::{AudioBackend, AudioBackendConfig, ResourceKind, VoiceId, VoiceIdGenerator};
use crate::audio::AudioError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScriptedState {
    Paused,
    Playing,
    Stopped,
}

#[derive(Debug, Clone)]
pub(crate) struct ScriptedVoice {
    pub path: PathBuf,
    pub kind: ResourceKind,
    pub looping: bool,
    pub state: ScriptedState,
    pub gain: f32,
    pub finished: bool,
}

#[derive(Debug, Default)]
pub(crate) struct ScriptState {
    pub voices: HashMap<VoiceId, ScriptedVoice>,
    pub released: Vec<VoiceId>,
    pub updates: usize,
    ids: VoiceIdGenerator,
}

/// Shared view into a [`ScriptedBackend`]
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptProbe(Rc<RefCell<ScriptState>>);

impl ScriptProbe {
    /// Simulate the track running out of samples
    pub fn finish(&self, voice: VoiceId) {
        if let Some(v) = self.0.borrow_mut().voices.get_mut(&voice) {
            v.finished = true;
        }
    }

    pub fn voice(&self, voice: VoiceId) -> Option<ScriptedVoice> {
        self.0.borrow().voices.get(&voice).cloned()
    }

    pub fn gain(&self, voice: VoiceId) -> Option<f32> {
        self.voice(voice).map(|v| v.gain)
    }

    pub fn live_voices(&self) -> usize {
        self.0.borrow().voices.len()
    }

    pub fn was_released(&self, voice: VoiceId) -> bool {
        self.0.borrow().released.contains(&voice)
    }

    pub fn updates(&self) -> usize {
        self.0.borrow().updates
    }
}

/// Backend whose voices only finish when a test says so.
///
/// Paths whose file name starts with `missing` fail to open.
#[derive(Debug)]
pub(crate) struct ScriptedBackend {
    state: Rc<RefCell<ScriptState>>,
}

impl ScriptedBackend {
    pub fn new() -> (Self, ScriptProbe) {
        let probe = ScriptProbe::default();
        let backend = Self {
            state: Rc::clone(&probe.0),
        };
        (backend, probe)
    }

    fn with_voice<R>(
        &self,
        voice: VoiceId,
        f: impl FnOnce(&mut ScriptedVoice) -> R,
    ) -> Result<R, AudioError> {
        let mut state = self.state.borrow_mut();
        let voice = state.voices.get_mut(&voice).ok_or(AudioError::InvalidHandle)?;
        Ok(f(voice))
    }
}

impl AudioBackend for ScriptedBackend {
    fn initialize(&mut self, _config: &AudioBackendConfig) -> Result<(), AudioError> {
        Ok(())
    }

    fn shutdown(&mut self) {
        self.stop_all();
    }

    fn is_initialized(&self) -> bool {
        true
    }

    fn update(&mut self) {
        self.state.borrow_mut().updates += 1;
    }

    fn open(&mut self, path: &Path, kind: ResourceKind, looping: bool) -> Result<VoiceId, AudioError> {
        let missing = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("missing"));
        if missing {
            return Err(AudioError::InvalidResource(path.display().to_string()));
        }

        let mut state = self.state.borrow_mut();
        let voice = state.ids.next();
        state.voices.insert(
            voice,
            ScriptedVoice {
                path: path.to_path_buf(),
                kind,
                looping,
                state: ScriptedState::Paused,
                gain: 1.0,
                finished: false,
            },
        );
        Ok(voice)
    }

    fn play(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        self.with_voice(voice, |v| {
            if v.state == ScriptedState::Stopped {
                v.finished = false;
            }
            v.state = ScriptedState::Playing;
        })
    }

    fn pause(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        self.with_voice(voice, |v| v.state = ScriptedState::Paused)
    }

    fn stop(&mut self, voice: VoiceId) -> Result<(), AudioError> {
        let _ = self.with_voice(voice, |v| v.state = ScriptedState::Stopped);
        Ok(())
    }

    fn set_gain(&mut self, voice: VoiceId, gain: f32) -> Result<(), AudioError> {
        self.with_voice(voice, |v| v.gain = gain)
    }

    fn is_finished(&self, voice: VoiceId) -> bool {
        self.state
            .borrow()
            .voices
            .get(&voice)
            .map_or(true, |v| v.finished || v.state == ScriptedState::Stopped)
    }

    fn release(&mut self, voice: VoiceId) {
        let mut state = self.state.borrow_mut();
        if state.voices.remove(&voice).is_some() {
            state.released.push(voice);
        }
    }

    fn stop_all(&mut self) {
        let mut state = self.state.borrow_mut();
        let drained: Vec<VoiceId> = state.voices.drain().map(|(voice, _)| voice).collect();
        state.released.extend(drained);
    }
}
