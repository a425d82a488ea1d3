//! Channel table
//!
//! Sparse mapping from channel number to the handle occupying it. Channel
//! numbers are a logical index, so any `u32` is accepted.

use std::collections::BTreeMap;

/// Maps channel numbers to handles; at most one handle per channel
#[derive(Debug, Clone)]
pub struct ChannelTable<K> {
    slots: BTreeMap<u32, K>,
}

impl<K: Copy + PartialEq> ChannelTable<K> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
        }
    }

    /// Handle on a channel
    pub fn get(&self, channel: u32) -> Option<K> {
        self.slots.get(&channel).copied()
    }

    /// Put a handle on a channel, returning the previous occupant
    pub fn assign(&mut self, channel: u32, handle: K) -> Option<K> {
        self.slots.insert(channel, handle)
    }

    /// Empty a channel, returning what was on it
    pub fn release(&mut self, channel: u32) -> Option<K> {
        self.slots.remove(&channel)
    }

    /// Whether any channel holds the handle
    pub fn contains_handle(&self, handle: K) -> bool {
        self.slots.values().any(|&h| h == handle)
    }

    /// Occupied channels in ascending order
    pub fn channels(&self) -> impl Iterator<Item = u32> + '_ {
        self.slots.keys().copied()
    }

    /// `(channel, handle)` pairs in ascending channel order
    pub fn iter(&self) -> impl Iterator<Item = (u32, K)> + '_ {
        self.slots.iter().map(|(&channel, &handle)| (channel, handle))
    }

    /// Number of occupied channels
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no channel is occupied
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Empty every channel
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl<K: Copy + PartialEq> Default for ChannelTable<K> {
    fn default() -> Self {
        Self::new()
    }
}
