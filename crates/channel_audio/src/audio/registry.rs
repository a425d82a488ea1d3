//! Audio channel registry
//!
//! Owns every live sound and music instance, maps numbered channels to them,
//! applies the global volume, and reclaims instances once no channel holds
//! them and they have stopped.
//!
//! The registry is built explicitly and owned by whatever runs the host loop;
//! one registry per session is an application-level convention. Drive it by
//! calling [`AudioChannelRegistry::tick`] once per frame.
//!
//! # Example
//!
//! ```
//! use channel_audio::audio::{AudioChannelRegistry, PlaySettings};
//! use channel_audio::config::AudioConfig;
//!
//! let mut audio = AudioChannelRegistry::new(AudioConfig::default());
//!
//! let theme = audio.play_music_on_channel(0, "music/theme.ogg", PlaySettings::new().with_looping(true));
//! audio.play_sound_on_channel(3, "sfx/laser.wav", PlaySettings::new().with_volume(0.8));
//!
//! audio.set_global_volume(0.5);
//! assert_eq!(audio.global_volume(), 0.5);
//!
//! // Once per frame
//! audio.tick();
//!
//! if let Ok(music) = audio.get_music_on_channel(0) {
//!     assert_eq!(Some(music), theme);
//! }
//! ```

use crate::audio::backend::{self, AudioBackend, NullBackend};
use crate::audio::handle::{
    normalize_volume, AudioKey, Instance, Music, MusicHandle, PlaySettings, Playable,
    PlaybackState, Sound, SoundHandle,
};
use crate::audio::pool::HandlePool;
use crate::audio::AudioError;
use crate::config::AudioConfig;
use std::path::Path;

/// Channel-based owner of all sound and music instances
pub struct AudioChannelRegistry {
    sounds: HandlePool<SoundHandle, Sound>,
    musics: HandlePool<MusicHandle, Music>,
    backend: Box<dyn AudioBackend>,
    /// Why the configured backend could not be used, if it could not
    backend_failure: Option<AudioError>,
    global_volume: f32,
    gc_interval_ticks: u32,
    ticks: u64,
}

impl AudioChannelRegistry {
    /// Create a registry with the platform's default backend.
    ///
    /// Never fails: if no output device can be opened, the failure is logged
    /// and kept for [`backend_failure`](Self::backend_failure), and playback
    /// becomes a silent no-op.
    pub fn new(config: AudioConfig) -> Self {
        match backend::create_backend(&config.backend) {
            Ok(backend) => Self::with_backend(backend, &config),
            Err(e) => {
                log::warn!("Audio backend unavailable, continuing silently: {}", e);
                let mut fallback = NullBackend::new();
                // The null backend cannot fail to initialize
                let _ = fallback.initialize(&config.backend);
                let mut registry = Self::with_backend(Box::new(fallback), &config);
                registry.backend_failure = Some(e);
                registry
            }
        }
    }

    /// Create a registry driving an already initialized backend
    pub fn with_backend(backend: Box<dyn AudioBackend>, config: &AudioConfig) -> Self {
        if let Err(e) = config.validate() {
            log::warn!("{}; out-of-range values are clamped", e);
        }

        Self {
            sounds: HandlePool::new(),
            musics: HandlePool::new(),
            backend,
            backend_failure: None,
            global_volume: normalize_volume(config.global_volume).unwrap_or(1.0),
            gc_interval_ticks: config.gc_interval_ticks.max(1),
            ticks: 0,
        }
    }

    /// The error that forced the silent fallback backend, if any
    pub fn backend_failure(&self) -> Option<&AudioError> {
        self.backend_failure.as_ref()
    }

    // ========================================================================
    // Channels
    // ========================================================================

    /// Sound on a channel.
    ///
    /// An unassigned channel yields `ChannelEmpty`, which means "nothing
    /// playing here" rather than a failure.
    pub fn get_sound_on_channel(&self, channel: u32) -> Result<SoundHandle, AudioError> {
        self.sounds.on_channel(channel)
    }

    /// Put a sound on a channel.
    ///
    /// The previous occupant loses this channel's reference and is reclaimed
    /// by a later collection once it has stopped; it keeps playing meanwhile.
    /// Fails with `InvalidHandle` if the sound was already destroyed.
    pub fn set_sound_on_channel(&mut self, channel: u32, sound: SoundHandle) -> Result<(), AudioError> {
        self.set_on_channel(channel, sound)
    }

    /// Music on a channel, or `ChannelEmpty`
    pub fn get_music_on_channel(&self, channel: u32) -> Result<MusicHandle, AudioError> {
        self.musics.on_channel(channel)
    }

    /// Put a music track on a channel; same contract as [`set_sound_on_channel`](Self::set_sound_on_channel)
    pub fn set_music_on_channel(&mut self, channel: u32, music: MusicHandle) -> Result<(), AudioError> {
        self.set_on_channel(channel, music)
    }

    fn set_on_channel<K: AudioKey>(&mut self, channel: u32, handle: K) -> Result<(), AudioError> {
        let (pool, _) = K::pool_mut(self);
        if let Some(previous) = pool.assign(channel, handle)? {
            log::debug!(
                "Channel {} {} replaced; previous occupant has {} channel refs left",
                channel,
                <K::Instance as Playable>::LABEL,
                pool.channel_refs(previous).unwrap_or(0)
            );
        }
        Ok(())
    }

    /// Take a sound off a channel without stopping it
    pub fn release_sound_channel(&mut self, channel: u32) -> Option<SoundHandle> {
        self.sounds.release_channel(channel)
    }

    /// Take a music track off a channel without stopping it
    pub fn release_music_channel(&mut self, channel: u32) -> Option<MusicHandle> {
        self.musics.release_channel(channel)
    }

    /// Occupied sound channels, ascending
    pub fn sound_channels(&self) -> Vec<u32> {
        self.sounds.channels().channels().collect()
    }

    /// Occupied music channels, ascending
    pub fn music_channels(&self) -> Vec<u32> {
        self.musics.channels().channels().collect()
    }

    // ========================================================================
    // Global volume
    // ========================================================================

    /// Master volume (0.0 to 1.0)
    pub fn global_volume(&self) -> f32 {
        self.global_volume
    }

    /// Set the master volume and push it to every live instance immediately.
    ///
    /// Values are clamped to `0.0..=1.0`; NaN is ignored. Each instance plays
    /// at `instance_volume * global_volume`.
    pub fn set_global_volume(&mut self, volume: f32) {
        let Some(volume) = normalize_volume(volume) else {
            log::warn!("Ignoring NaN global volume");
            return;
        };
        if approx::abs_diff_eq!(volume, self.global_volume) {
            return;
        }

        self.global_volume = volume;
        let backend = self.backend.as_mut();
        for sound in self.sounds.instances_mut() {
            sound.apply_gain(volume, backend);
        }
        for music in self.musics.instances_mut() {
            music.apply_gain(volume, backend);
        }
        log::debug!("Global volume set to {:.2}", volume);
    }

    // ========================================================================
    // Lifetime
    // ========================================================================

    /// Stop and destroy every instance and empty every channel.
    ///
    /// Bypasses the stopped-and-unreferenced rule; meant for full teardown
    /// such as a scene change.
    pub fn clear_all(&mut self) {
        let backend = self.backend.as_mut();
        let sounds = self.sounds.clear(backend);
        let musics = self.musics.clear(backend);
        log::info!("Cleared {} sounds and {} musics", sounds, musics);
    }

    /// Destroy every instance that no channel holds and that has stopped.
    ///
    /// Polls the backend first so finished tracks are noticed. Returns the
    /// number of instances destroyed; a second call with nothing changed in
    /// between destroys nothing.
    pub fn collect_garbage(&mut self) -> usize {
        let backend = self.backend.as_mut();
        self.sounds.refresh(backend);
        self.musics.refresh(backend);

        let collected = self.sounds.collect_garbage(backend) + self.musics.collect_garbage(backend);
        if collected > 0 {
            log::debug!("Collected {} audio instances", collected);
        }
        collected
    }

    /// Per-frame maintenance: backend housekeeping, then garbage collection
    /// every `gc_interval_ticks` ticks.
    ///
    /// Returns the number of instances collected this tick.
    pub fn tick(&mut self) -> usize {
        self.backend.update();
        self.ticks += 1;
        if self.ticks % u64::from(self.gc_interval_ticks) == 0 {
            self.collect_garbage()
        } else {
            0
        }
    }

    // ========================================================================
    // Instances
    // ========================================================================

    /// Open a sound effect, unassigned and not yet playing.
    ///
    /// Assign or play it before the next collection or it is reclaimed.
    pub fn create_sound<P: AsRef<Path>>(&mut self, path: P, settings: PlaySettings) -> Result<SoundHandle, AudioError> {
        self.create(path.as_ref(), settings)
    }

    /// Open a music track, unassigned and not yet playing
    pub fn create_music<P: AsRef<Path>>(&mut self, path: P, settings: PlaySettings) -> Result<MusicHandle, AudioError> {
        self.create(path.as_ref(), settings)
    }

    fn create<K: AudioKey>(&mut self, path: &Path, settings: PlaySettings) -> Result<K, AudioError> {
        let global_volume = self.global_volume;
        let (pool, backend) = K::pool_mut(self);

        let voice = backend.open(path, <K::Instance as Playable>::KIND, settings.looping)?;
        let instance = <K::Instance as Playable>::from_instance(Instance::new(path, voice, settings));
        instance.apply_gain(global_volume, backend);

        log::debug!("Created {} {}", <K::Instance as Playable>::LABEL, path.display());
        Ok(pool.insert(instance))
    }

    /// Sound instance behind a handle
    pub fn sound(&self, handle: SoundHandle) -> Option<&Sound> {
        self.sounds.get(handle)
    }

    /// Music instance behind a handle
    pub fn music(&self, handle: MusicHandle) -> Option<&Music> {
        self.musics.get(handle)
    }

    /// Number of live sounds, assigned or not
    pub fn sound_count(&self) -> usize {
        self.sounds.len()
    }

    /// Number of live musics, assigned or not
    pub fn music_count(&self) -> usize {
        self.musics.len()
    }

    /// Whether a handle still points at a live instance
    pub fn is_alive<K: AudioKey>(&self, handle: K) -> bool {
        K::pool(self).contains(handle)
    }

    /// How many channels hold a handle
    pub fn channel_refs<K: AudioKey>(&self, handle: K) -> Option<u32> {
        K::pool(self).channel_refs(handle)
    }

    /// Last observed playback state
    pub fn state<K: AudioKey>(&self, handle: K) -> Option<PlaybackState> {
        K::pool(self).get(handle).map(|instance| instance.state())
    }

    /// Poll the backend and report whether the instance is stopped.
    ///
    /// Destroyed handles report `true`.
    pub fn is_stopped<K: AudioKey>(&mut self, handle: K) -> bool {
        let (pool, backend) = K::pool_mut(self);
        pool.get_mut(handle).map_or(true, |instance| {
            instance.refresh(backend);
            instance.is_stopped()
        })
    }

    /// Start, resume, or restart an instance
    pub fn play<K: AudioKey>(&mut self, handle: K) -> Result<(), AudioError> {
        let (pool, backend) = K::pool_mut(self);
        pool.get_mut(handle).ok_or(AudioError::InvalidHandle)?.play(backend);
        Ok(())
    }

    /// Pause a playing instance
    pub fn pause<K: AudioKey>(&mut self, handle: K) -> Result<(), AudioError> {
        let (pool, backend) = K::pool_mut(self);
        pool.get_mut(handle).ok_or(AudioError::InvalidHandle)?.pause(backend);
        Ok(())
    }

    /// Stop an instance; it stays registered until collected
    pub fn stop<K: AudioKey>(&mut self, handle: K) -> Result<(), AudioError> {
        let (pool, backend) = K::pool_mut(self);
        pool.get_mut(handle).ok_or(AudioError::InvalidHandle)?.stop(backend);
        Ok(())
    }

    /// Set an instance's own volume (0.0 to 1.0)
    pub fn set_volume<K: AudioKey>(&mut self, handle: K, volume: f32) -> Result<(), AudioError> {
        let global_volume = self.global_volume;
        let (pool, backend) = K::pool_mut(self);
        pool.get_mut(handle)
            .ok_or(AudioError::InvalidHandle)?
            .set_volume(volume, global_volume, backend);
        Ok(())
    }

    /// An instance's own volume
    pub fn volume<K: AudioKey>(&self, handle: K) -> Option<f32> {
        K::pool(self).get(handle).map(|instance| instance.volume())
    }

    /// Volume the backend plays an instance at
    pub fn effective_volume<K: AudioKey>(&self, handle: K) -> Option<f32> {
        K::pool(self)
            .get(handle)
            .map(|instance| instance.effective_volume(self.global_volume))
    }

    // ========================================================================
    // Channel-level playback
    // ========================================================================

    /// Open a sound, put it on a channel and start it.
    ///
    /// If the resource cannot be opened the request is dropped, the channel
    /// keeps whatever it had, and `None` is returned.
    pub fn play_sound_on_channel<P: AsRef<Path>>(
        &mut self,
        channel: u32,
        path: P,
        settings: PlaySettings,
    ) -> Option<SoundHandle> {
        self.play_on_channel(Some(channel), path.as_ref(), settings)
    }

    /// Open a music track, put it on a channel and start it
    pub fn play_music_on_channel<P: AsRef<Path>>(
        &mut self,
        channel: u32,
        path: P,
        settings: PlaySettings,
    ) -> Option<MusicHandle> {
        self.play_on_channel(Some(channel), path.as_ref(), settings)
    }

    /// Fire-and-forget sound; reclaimed once it finishes
    pub fn play_sound<P: AsRef<Path>>(&mut self, path: P, settings: PlaySettings) -> Option<SoundHandle> {
        self.play_on_channel(None, path.as_ref(), settings)
    }

    /// Fire-and-forget music track; reclaimed once it finishes
    pub fn play_music<P: AsRef<Path>>(&mut self, path: P, settings: PlaySettings) -> Option<MusicHandle> {
        self.play_on_channel(None, path.as_ref(), settings)
    }

    fn play_on_channel<K: AudioKey>(
        &mut self,
        channel: Option<u32>,
        path: &Path,
        settings: PlaySettings,
    ) -> Option<K> {
        let handle = match self.create::<K>(path, settings) {
            Ok(handle) => handle,
            Err(e) => {
                log::warn!(
                    "Dropping {} play request for {}: {}",
                    <K::Instance as Playable>::LABEL,
                    path.display(),
                    e
                );
                return None;
            }
        };

        if let Some(channel) = channel {
            // Freshly created, so still live
            self.set_on_channel(channel, handle).ok()?;
        }
        self.play(handle).ok()?;
        Some(handle)
    }

    fn on_channel<K: AudioKey>(&self, channel: u32) -> Option<K> {
        K::pool(self).channels().get(channel)
    }

    /// Stop the sound on a channel; no-op when the channel is empty
    pub fn stop_sound_on_channel(&mut self, channel: u32) {
        if let Some(sound) = self.on_channel::<SoundHandle>(channel) {
            let _ = self.stop(sound);
        }
    }

    /// Pause the sound on a channel
    pub fn pause_sound_on_channel(&mut self, channel: u32) {
        if let Some(sound) = self.on_channel::<SoundHandle>(channel) {
            let _ = self.pause(sound);
        }
    }

    /// Resume (or restart) the sound on a channel
    pub fn resume_sound_on_channel(&mut self, channel: u32) {
        if let Some(sound) = self.on_channel::<SoundHandle>(channel) {
            let _ = self.play(sound);
        }
    }

    /// Set the volume of the sound on a channel
    pub fn set_sound_volume_on_channel(&mut self, channel: u32, volume: f32) {
        if let Some(sound) = self.on_channel::<SoundHandle>(channel) {
            let _ = self.set_volume(sound, volume);
        }
    }

    /// Volume of the sound on a channel
    pub fn sound_volume_on_channel(&self, channel: u32) -> Option<f32> {
        self.volume(self.on_channel::<SoundHandle>(channel)?)
    }

    /// Stop the music on a channel; no-op when the channel is empty
    pub fn stop_music_on_channel(&mut self, channel: u32) {
        if let Some(music) = self.on_channel::<MusicHandle>(channel) {
            let _ = self.stop(music);
        }
    }

    /// Pause the music on a channel
    pub fn pause_music_on_channel(&mut self, channel: u32) {
        if let Some(music) = self.on_channel::<MusicHandle>(channel) {
            let _ = self.pause(music);
        }
    }

    /// Resume (or restart) the music on a channel
    pub fn resume_music_on_channel(&mut self, channel: u32) {
        if let Some(music) = self.on_channel::<MusicHandle>(channel) {
            let _ = self.play(music);
        }
    }

    /// Set the volume of the music on a channel
    pub fn set_music_volume_on_channel(&mut self, channel: u32, volume: f32) {
        if let Some(music) = self.on_channel::<MusicHandle>(channel) {
            let _ = self.set_volume(music, volume);
        }
    }

    /// Volume of the music on a channel
    pub fn music_volume_on_channel(&self, channel: u32) -> Option<f32> {
        self.volume(self.on_channel::<MusicHandle>(channel)?)
    }
}

impl Drop for AudioChannelRegistry {
    fn drop(&mut self) {
        self.clear_all();
        self.backend.shutdown();
    }
}

impl AudioKey for SoundHandle {
    type Instance = Sound;

    fn pool(registry: &AudioChannelRegistry) -> &HandlePool<Self, Sound> {
        &registry.sounds
    }

    fn pool_mut(registry: &mut AudioChannelRegistry) -> (&mut HandlePool<Self, Sound>, &mut dyn AudioBackend) {
        (&mut registry.sounds, registry.backend.as_mut())
    }
}

impl AudioKey for MusicHandle {
    type Instance = Music;

    fn pool(registry: &AudioChannelRegistry) -> &HandlePool<Self, Music> {
        &registry.musics
    }

    fn pool_mut(registry: &mut AudioChannelRegistry) -> (&mut HandlePool<Self, Music>, &mut dyn AudioBackend) {
        (&mut registry.musics, registry.backend.as_mut())
    }
}
