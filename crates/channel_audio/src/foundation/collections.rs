//! Specialized collection types

pub use slotmap::{new_key_type, Key, SlotMap};

/// Generational handle map; keys stay invalid once their entry is removed
pub type HandleMap<K, T> = SlotMap<K, T>;
