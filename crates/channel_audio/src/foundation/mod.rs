//! Foundation module - Core utilities and types
//!
//! Small building blocks shared by the audio registry:
//! - Collections (generational handle maps)
//! - Logging utilities

pub mod collections;
pub mod logging;
