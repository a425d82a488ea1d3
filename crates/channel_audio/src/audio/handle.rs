//! Audio handles and the instances they point at
//!
//! Handles are small generational keys. The instance data lives inside the
//! registry; a handle whose instance was destroyed never becomes valid again.

use crate::audio::backend::{AudioBackend, ResourceKind, VoiceId};
use crate::audio::pool::HandlePool;
use crate::audio::registry::AudioChannelRegistry;
use crate::foundation::collections::{new_key_type, Key};
use std::path::{Path, PathBuf};

new_key_type! {
    /// Handle to a sound effect instance
    pub struct SoundHandle;

    /// Handle to a music track instance
    pub struct MusicHandle;
}

/// Playback state of one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    /// Opened but never played
    Created,
    /// Producing sound
    Playing,
    /// Paused, resumes where it left off
    Paused,
    /// Finished or explicitly stopped
    Stopped,
}

impl PlaybackState {
    /// Whether nothing is audible and nothing will resume on its own.
    ///
    /// A fresh `Created` instance counts as stopped.
    pub fn is_stopped(self) -> bool {
        matches!(self, Self::Created | Self::Stopped)
    }
}

/// Per-instance settings for a play request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaySettings {
    /// Instance volume (0.0 to 1.0), scaled by the global volume
    pub volume: f32,
    /// Restart from the beginning whenever the end is reached
    pub looping: bool,
}

impl PlaySettings {
    /// Full volume, played once
    pub fn new() -> Self {
        Self {
            volume: 1.0,
            looping: false,
        }
    }

    /// Set instance volume
    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    /// Enable or disable looping
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }
}

impl Default for PlaySettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamp a volume into `0.0..=1.0`. NaN has no sensible mapping and is rejected.
pub(crate) fn normalize_volume(volume: f32) -> Option<f32> {
    if volume.is_nan() {
        None
    } else {
        Some(volume.clamp(0.0, 1.0))
    }
}

/// Backend voice plus the logical state the registry tracks for it
#[derive(Debug, Clone)]
pub struct Instance {
    path: PathBuf,
    voice: VoiceId,
    state: PlaybackState,
    volume: f32,
    looping: bool,
}

impl Instance {
    pub(crate) fn new(path: &Path, voice: VoiceId, settings: PlaySettings) -> Self {
        Self {
            path: path.to_path_buf(),
            voice,
            state: PlaybackState::Created,
            volume: normalize_volume(settings.volume).unwrap_or(1.0),
            looping: settings.looping,
        }
    }
}

/// Capability set shared by sound effects and music tracks.
///
/// Backend errors are logged and absorbed; the logical state always follows
/// the call so the host loop never has to handle audio failures.
pub trait Playable {
    /// How the backend should hold this variant's resource
    const KIND: ResourceKind;

    /// Name used in log messages
    const LABEL: &'static str;

    /// Wrap a freshly opened instance
    fn from_instance(instance: Instance) -> Self;

    /// Shared instance data
    fn instance(&self) -> &Instance;

    /// Shared instance data, mutable
    fn instance_mut(&mut self) -> &mut Instance;

    /// Source file of this instance
    fn path(&self) -> &Path {
        &self.instance().path
    }

    /// Backend voice driving this instance
    fn voice(&self) -> VoiceId {
        self.instance().voice
    }

    /// Last observed playback state
    fn state(&self) -> PlaybackState {
        self.instance().state
    }

    /// Instance volume before the global volume is applied
    fn volume(&self) -> f32 {
        self.instance().volume
    }

    /// Whether the instance loops
    fn is_looping(&self) -> bool {
        self.instance().looping
    }

    /// Volume actually sent to the backend
    fn effective_volume(&self, global_volume: f32) -> f32 {
        self.volume() * global_volume
    }

    /// Whether the instance is silent for good (`Created` or `Stopped`)
    fn is_stopped(&self) -> bool {
        self.state().is_stopped()
    }

    /// Start, resume, or restart playback.
    ///
    /// Polls the backend first, so a voice that ran dry since the last
    /// refresh is rewound and restarted instead of being taken for playing.
    fn play(&mut self, backend: &mut dyn AudioBackend) {
        if self.refresh(&*backend) {
            if let Err(e) = backend.stop(self.voice()) {
                log::warn!("Failed to rewind {} {}: {}", Self::LABEL, self.path().display(), e);
            }
        }
        if self.state() == PlaybackState::Playing {
            return;
        }
        if let Err(e) = backend.play(self.voice()) {
            log::warn!("Failed to play {} {}: {}", Self::LABEL, self.path().display(), e);
        }
        self.instance_mut().state = PlaybackState::Playing;
    }

    /// Pause if currently playing. A voice that already ran dry becomes `Stopped` instead.
    fn pause(&mut self, backend: &mut dyn AudioBackend) {
        self.refresh(&*backend);
        if self.state() != PlaybackState::Playing {
            return;
        }
        if let Err(e) = backend.pause(self.voice()) {
            log::warn!("Failed to pause {} {}: {}", Self::LABEL, self.path().display(), e);
        }
        self.instance_mut().state = PlaybackState::Paused;
    }

    /// Stop and rewind
    fn stop(&mut self, backend: &mut dyn AudioBackend) {
        if let Err(e) = backend.stop(self.voice()) {
            log::warn!("Failed to stop {} {}: {}", Self::LABEL, self.path().display(), e);
        }
        self.instance_mut().state = PlaybackState::Stopped;
    }

    /// Change the instance volume and push the new effective gain
    fn set_volume(&mut self, volume: f32, global_volume: f32, backend: &mut dyn AudioBackend) {
        let Some(volume) = normalize_volume(volume) else {
            log::warn!("Ignoring NaN volume for {} {}", Self::LABEL, self.path().display());
            return;
        };
        self.instance_mut().volume = volume;
        self.apply_gain(global_volume, backend);
    }

    /// Send `volume * global_volume` to the backend
    fn apply_gain(&self, global_volume: f32, backend: &mut dyn AudioBackend) {
        if let Err(e) = backend.set_gain(self.voice(), self.effective_volume(global_volume)) {
            log::warn!("Failed to set gain on {} {}: {}", Self::LABEL, self.path().display(), e);
        }
    }

    /// Poll the backend; a playing instance whose voice ran dry becomes `Stopped`.
    ///
    /// Returns `true` when the state changed.
    fn refresh(&mut self, backend: &dyn AudioBackend) -> bool {
        if self.state() == PlaybackState::Playing && backend.is_finished(self.voice()) {
            self.instance_mut().state = PlaybackState::Stopped;
            return true;
        }
        false
    }
}

/// A short sound effect, decoded fully into memory by the backend
#[derive(Debug, Clone)]
pub struct Sound(Instance);

impl Playable for Sound {
    const KIND: ResourceKind = ResourceKind::Buffered;
    const LABEL: &'static str = "sound";

    fn from_instance(instance: Instance) -> Self {
        Self(instance)
    }

    fn instance(&self) -> &Instance {
        &self.0
    }

    fn instance_mut(&mut self) -> &mut Instance {
        &mut self.0
    }
}

/// A music track, streamed from disk by the backend
#[derive(Debug, Clone)]
pub struct Music(Instance);

impl Playable for Music {
    const KIND: ResourceKind = ResourceKind::Streamed;
    const LABEL: &'static str = "music";

    fn from_instance(instance: Instance) -> Self {
        Self(instance)
    }

    fn instance(&self) -> &Instance {
        &self.0
    }

    fn instance_mut(&mut self) -> &mut Instance {
        &mut self.0
    }
}

/// Ties a handle type to its instance type and its pool inside the registry.
///
/// Implemented for [`SoundHandle`] and [`MusicHandle`]; lets the registry
/// expose one generic set of handle operations for both variants.
pub trait AudioKey: Key {
    /// Instance type this handle points at
    type Instance: Playable;

    /// The pool holding handles of this type
    fn pool(registry: &AudioChannelRegistry) -> &HandlePool<Self, Self::Instance>;

    /// The pool plus the backend, borrowed together
    fn pool_mut(
        registry: &mut AudioChannelRegistry,
    ) -> (&mut HandlePool<Self, Self::Instance>, &mut dyn AudioBackend);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::backend::testing::{ScriptedBackend, ScriptedState};

    fn open_sound(backend: &mut ScriptedBackend, settings: PlaySettings) -> Sound {
        let path = Path::new("laser.wav");
        let voice = backend.open(path, Sound::KIND, settings.looping).unwrap();
        Sound::from_instance(Instance::new(path, voice, settings))
    }

    #[test]
    fn test_created_counts_as_stopped() {
        assert!(PlaybackState::Created.is_stopped());
        assert!(PlaybackState::Stopped.is_stopped());
        assert!(!PlaybackState::Playing.is_stopped());
        assert!(!PlaybackState::Paused.is_stopped());
    }

    #[test]
    fn test_state_transitions() {
        let (mut backend, probe) = ScriptedBackend::new();
        let mut sound = open_sound(&mut backend, PlaySettings::new());
        assert_eq!(sound.state(), PlaybackState::Created);

        sound.play(&mut backend);
        assert_eq!(sound.state(), PlaybackState::Playing);
        assert_eq!(probe.voice(sound.voice()).unwrap().state, ScriptedState::Playing);

        sound.pause(&mut backend);
        assert_eq!(sound.state(), PlaybackState::Paused);

        sound.play(&mut backend);
        assert_eq!(sound.state(), PlaybackState::Playing);

        sound.stop(&mut backend);
        assert_eq!(sound.state(), PlaybackState::Stopped);
        assert!(sound.is_stopped());
    }

    #[test]
    fn test_pause_ignored_unless_playing() {
        let (mut backend, _probe) = ScriptedBackend::new();
        let mut sound = open_sound(&mut backend, PlaySettings::new());

        sound.pause(&mut backend);
        assert_eq!(sound.state(), PlaybackState::Created);
    }

    #[test]
    fn test_refresh_observes_track_end() {
        let (mut backend, probe) = ScriptedBackend::new();
        let mut sound = open_sound(&mut backend, PlaySettings::new());
        sound.play(&mut backend);

        assert!(!sound.refresh(&backend));
        probe.finish(sound.voice());
        assert!(sound.refresh(&backend));
        assert_eq!(sound.state(), PlaybackState::Stopped);
        assert!(!sound.refresh(&backend));
    }

    #[test]
    fn test_pause_after_track_end_stops() {
        let (mut backend, probe) = ScriptedBackend::new();
        let mut sound = open_sound(&mut backend, PlaySettings::new());
        sound.play(&mut backend);
        probe.finish(sound.voice());

        sound.pause(&mut backend);
        assert_eq!(sound.state(), PlaybackState::Stopped);
        assert!(sound.is_stopped());
    }

    #[test]
    fn test_play_after_track_end_restarts() {
        let (mut backend, probe) = ScriptedBackend::new();
        let mut sound = open_sound(&mut backend, PlaySettings::new());
        sound.play(&mut backend);
        probe.finish(sound.voice());

        sound.play(&mut backend);
        assert_eq!(sound.state(), PlaybackState::Playing);
        assert!(!backend.is_finished(sound.voice()));
        assert!(!sound.refresh(&backend));
    }

    #[test]
    fn test_set_volume_clamps_and_scales() {
        let (mut backend, probe) = ScriptedBackend::new();
        let mut sound = open_sound(&mut backend, PlaySettings::new());

        sound.set_volume(2.0, 0.5, &mut backend);
        assert_eq!(sound.volume(), 1.0);
        assert_eq!(probe.gain(sound.voice()), Some(0.5));

        sound.set_volume(f32::NAN, 0.5, &mut backend);
        assert_eq!(sound.volume(), 1.0);
    }

    #[test]
    fn test_backend_errors_are_absorbed() {
        let (mut backend, _probe) = ScriptedBackend::new();
        let mut sound = open_sound(&mut backend, PlaySettings::new().with_volume(0.4));
        backend.release(sound.voice());

        sound.play(&mut backend);
        assert_eq!(sound.state(), PlaybackState::Playing);
        assert!(sound.refresh(&backend));
        assert_eq!(sound.state(), PlaybackState::Stopped);
    }

    #[test]
    fn test_variants_use_different_resource_kinds() {
        assert_eq!(Sound::KIND, ResourceKind::Buffered);
        assert_eq!(Music::KIND, ResourceKind::Streamed);
    }
}
