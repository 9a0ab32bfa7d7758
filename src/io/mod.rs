//! IO modules - external system interfaces
//!
//! This module contains everything the controller talks to outside itself:
//! - `motion` - Motion capability (permission, subscription) and scripted replay
//! - `store` - Key-value persistence for chef specials
//! - `feedback` - Haptic and audio cues
//! - `host` - Typed channel of notifications for the embedding UI

pub mod feedback;
pub mod host;
pub mod motion;
pub mod store;

// Re-export commonly used types
pub use feedback::{AudioCue, Feedback, HapticPattern, LogFeedback};
pub use host::{create_host_channel, HostCallbacks, HostEvent, HostSender};
pub use motion::{
    replay_events, Availability, MotionCapability, NoMotion, Script, ScriptLine, ScriptedMotion,
};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
