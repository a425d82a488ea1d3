//! Handle pool
//!
//! The handle registry and channel table for one handle variant. Every live
//! instance sits in the registry whether or not a channel holds it; each
//! entry counts how many channels point at it so collection never has to scan
//! the table.

use crate::audio::backend::AudioBackend;
use crate::audio::channels::ChannelTable;
use crate::audio::handle::Playable;
use crate::audio::AudioError;
use crate::foundation::collections::{HandleMap, Key};

#[derive(Debug, Clone)]
struct Entry<T> {
    instance: T,
    /// Number of channels currently mapped to this entry
    channel_refs: u32,
}

/// Handle registry plus channel table for one handle variant
#[derive(Debug, Clone)]
pub struct HandlePool<K: Key, T> {
    handles: HandleMap<K, Entry<T>>,
    channels: ChannelTable<K>,
}

impl<K: Key, T: Playable> HandlePool<K, T> {
    /// Create an empty pool
    pub fn new() -> Self {
        Self {
            handles: HandleMap::with_key(),
            channels: ChannelTable::new(),
        }
    }

    /// Register an instance, not assigned to any channel
    pub fn insert(&mut self, instance: T) -> K {
        self.handles.insert(Entry {
            instance,
            channel_refs: 0,
        })
    }

    /// Instance behind a handle
    pub fn get(&self, handle: K) -> Option<&T> {
        self.handles.get(handle).map(|entry| &entry.instance)
    }

    /// Mutable instance behind a handle
    pub fn get_mut(&mut self, handle: K) -> Option<&mut T> {
        self.handles.get_mut(handle).map(|entry| &mut entry.instance)
    }

    /// Whether the handle is still live
    pub fn contains(&self, handle: K) -> bool {
        self.handles.contains_key(handle)
    }

    /// How many channels hold the handle
    pub fn channel_refs(&self, handle: K) -> Option<u32> {
        self.handles.get(handle).map(|entry| entry.channel_refs)
    }

    /// Number of live handles
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether no handle is live
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Live handles and their instances
    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> + '_ {
        self.handles.iter().map(|(handle, entry)| (handle, &entry.instance))
    }

    /// Live instances, mutable
    pub fn instances_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.handles.values_mut().map(|entry| &mut entry.instance)
    }

    /// The channel table
    pub fn channels(&self) -> &ChannelTable<K> {
        &self.channels
    }

    /// Handle on a channel, or `ChannelEmpty`
    pub fn on_channel(&self, channel: u32) -> Result<K, AudioError> {
        self.channels
            .get(channel)
            .ok_or(AudioError::ChannelEmpty { channel })
    }

    /// Put a live handle on a channel.
    ///
    /// Returns the previous occupant, which loses that channel's reference but
    /// stays registered until collected.
    pub fn assign(&mut self, channel: u32, handle: K) -> Result<Option<K>, AudioError> {
        if !self.contains(handle) {
            return Err(AudioError::InvalidHandle);
        }
        if self.channels.get(channel) == Some(handle) {
            return Ok(None);
        }

        if let Some(entry) = self.handles.get_mut(handle) {
            entry.channel_refs += 1;
        }
        let previous = self.channels.assign(channel, handle);
        if let Some(previous) = previous {
            self.drop_channel_ref(previous);
        }
        Ok(previous)
    }

    /// Empty a channel without touching the handle's playback
    pub fn release_channel(&mut self, channel: u32) -> Option<K> {
        let previous = self.channels.release(channel)?;
        self.drop_channel_ref(previous);
        Some(previous)
    }

    fn drop_channel_ref(&mut self, handle: K) {
        if let Some(entry) = self.handles.get_mut(handle) {
            entry.channel_refs = entry.channel_refs.saturating_sub(1);
        }
    }

    /// Poll the backend for instances that finished playing.
    ///
    /// Returns how many moved to `Stopped`.
    pub fn refresh(&mut self, backend: &dyn AudioBackend) -> usize {
        self.handles
            .values_mut()
            .map(|entry| entry.instance.refresh(backend))
            .filter(|&changed| changed)
            .count()
    }

    /// Destroy every handle that no channel holds and that is stopped.
    ///
    /// Returns the number destroyed.
    pub fn collect_garbage(&mut self, backend: &mut dyn AudioBackend) -> usize {
        let dead: Vec<K> = self
            .handles
            .iter()
            .filter(|(_, entry)| entry.channel_refs == 0 && entry.instance.is_stopped())
            .map(|(handle, _)| handle)
            .collect();

        for &handle in &dead {
            if let Some(entry) = self.handles.remove(handle) {
                backend.release(entry.instance.voice());
                log::debug!(
                    "Collected {} {}",
                    T::LABEL,
                    entry.instance.path().display()
                );
            }
        }

        dead.len()
    }

    /// Stop and destroy everything, regardless of channel or playback state.
    ///
    /// Returns the number destroyed.
    pub fn clear(&mut self, backend: &mut dyn AudioBackend) -> usize {
        self.channels.clear();
        let count = self.handles.len();
        for (_, entry) in self.handles.drain() {
            backend.release(entry.instance.voice());
        }
        count
    }

    /// Panics if the channel table and reference counts disagree
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        for (channel, handle) in self.channels.iter() {
            assert!(
                self.contains(handle),
                "channel {channel} holds a handle missing from the registry"
            );
        }
        for (handle, entry) in &self.handles {
            let held = self.channels.iter().filter(|&(_, h)| h == handle).count();
            assert_eq!(entry.channel_refs as usize, held, "stale channel count");
        }
    }
}

impl<K: Key, T: Playable> Default for HandlePool<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::backend::testing::{ScriptProbe, ScriptedBackend};
    use crate::audio::handle::{Instance, PlaySettings, Sound, SoundHandle};
    use std::path::Path;

    fn setup() -> (HandlePool<SoundHandle, Sound>, ScriptedBackend, ScriptProbe) {
        let (backend, probe) = ScriptedBackend::new();
        (HandlePool::new(), backend, probe)
    }

    fn add_sound(pool: &mut HandlePool<SoundHandle, Sound>, backend: &mut ScriptedBackend, name: &str) -> SoundHandle {
        let path = Path::new(name);
        let voice = backend.open(path, Sound::KIND, false).unwrap();
        pool.insert(Sound::from_instance(Instance::new(path, voice, PlaySettings::new())))
    }

    #[test]
    fn test_empty_channel_is_reported() {
        let (pool, _backend, _probe) = setup();
        assert_eq!(pool.on_channel(9), Err(AudioError::ChannelEmpty { channel: 9 }));
    }

    #[test]
    fn test_reassignment_moves_reference() {
        let (mut pool, mut backend, _probe) = setup();
        let first = add_sound(&mut pool, &mut backend, "a.wav");
        let second = add_sound(&mut pool, &mut backend, "b.wav");

        assert_eq!(pool.assign(3, first), Ok(None));
        assert_eq!(pool.channel_refs(first), Some(1));

        assert_eq!(pool.assign(3, second), Ok(Some(first)));
        assert_eq!(pool.channel_refs(first), Some(0));
        assert_eq!(pool.channel_refs(second), Some(1));
        assert_eq!(pool.on_channel(3), Ok(second));
        assert!(pool.contains(first));
        pool.assert_consistent();
    }

    #[test]
    fn test_same_handle_on_two_channels() {
        let (mut pool, mut backend, _probe) = setup();
        let sound = add_sound(&mut pool, &mut backend, "a.wav");

        pool.assign(1, sound).unwrap();
        pool.assign(2, sound).unwrap();
        pool.assign(2, sound).unwrap();
        assert_eq!(pool.channel_refs(sound), Some(2));

        pool.release_channel(1);
        assert_eq!(pool.channel_refs(sound), Some(1));
        assert_eq!(pool.collect_garbage(&mut backend), 0);

        pool.release_channel(2);
        assert_eq!(pool.collect_garbage(&mut backend), 1);
        assert!(!pool.contains(sound));
        pool.assert_consistent();
    }

    #[test]
    fn test_collection_needs_stopped_and_unreferenced() {
        let (mut pool, mut backend, probe) = setup();
        let playing = add_sound(&mut pool, &mut backend, "a.wav");
        let assigned = add_sound(&mut pool, &mut backend, "b.wav");

        pool.get_mut(playing).unwrap().play(&mut backend);
        pool.assign(0, assigned).unwrap();

        assert_eq!(pool.collect_garbage(&mut backend), 0);

        let voice = pool.get(playing).unwrap().voice();
        probe.finish(voice);
        assert_eq!(pool.refresh(&backend), 1);
        assert_eq!(pool.collect_garbage(&mut backend), 1);
        assert!(probe.was_released(voice));
        assert!(pool.contains(assigned));
    }

    #[test]
    fn test_stale_handle_cannot_be_assigned() {
        let (mut pool, mut backend, _probe) = setup();
        let sound = add_sound(&mut pool, &mut backend, "a.wav");
        assert_eq!(pool.collect_garbage(&mut backend), 1);

        assert_eq!(pool.assign(4, sound), Err(AudioError::InvalidHandle));
        assert!(pool.channels().is_empty());
    }

    #[test]
    fn test_clear_releases_everything() {
        let (mut pool, mut backend, probe) = setup();
        let a = add_sound(&mut pool, &mut backend, "a.wav");
        let _b = add_sound(&mut pool, &mut backend, "b.wav");
        pool.assign(1, a).unwrap();
        pool.get_mut(a).unwrap().play(&mut backend);

        assert_eq!(pool.clear(&mut backend), 2);
        assert!(pool.is_empty());
        assert!(pool.channels().is_empty());
        assert_eq!(probe.live_voices(), 0);
    }
}
