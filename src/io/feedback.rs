//! Haptic and audio feedback
//!
//! Feedback is best effort. `fire_haptic`/`fire_chime` swallow and log
//! failures so a missing vibration motor never interrupts a flow.

use smallvec::SmallVec;
use tracing::{debug, warn};

/// Vibration pattern in milliseconds, alternating on/off
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HapticPattern(pub SmallVec<[u32; 4]>);

impl HapticPattern {
    pub fn pulse(ms: u32) -> Self {
        Self(SmallVec::from_slice(&[ms]))
    }

    /// Short on/off/on used for admin entry and order placement
    pub fn double_pulse() -> Self {
        Self(SmallVec::from_slice(&[100, 50, 100]))
    }

    /// Item added to the order
    pub fn confirm() -> Self {
        Self::pulse(200)
    }

    /// Wrong PIN
    pub fn reject() -> Self {
        Self::pulse(300)
    }

    /// Card tap
    pub fn tap() -> Self {
        Self::pulse(20)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCue {
    /// Service bell after an order is placed
    OrderBell,
    /// Card flipped to its ingredients
    Sizzle,
}

pub trait Feedback: Send + Sync {
    fn haptic(&self, pattern: &HapticPattern) -> anyhow::Result<()>;
    fn chime(&self, cue: AudioCue) -> anyhow::Result<()>;
}

pub fn fire_haptic(feedback: &dyn Feedback, pattern: HapticPattern) {
    if let Err(e) = feedback.haptic(&pattern) {
        warn!(pattern = ?pattern.as_slice(), error = %e, "haptic_failed");
    }
}

pub fn fire_chime(feedback: &dyn Feedback, cue: AudioCue) {
    if let Err(e) = feedback.chime(cue) {
        warn!(cue = ?cue, error = %e, "chime_failed");
    }
}

/// Logs instead of vibrating
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFeedback;

impl Feedback for LogFeedback {
    fn haptic(&self, pattern: &HapticPattern) -> anyhow::Result<()> {
        debug!(pattern = ?pattern.as_slice(), "haptic");
        Ok(())
    }

    fn chime(&self, cue: AudioCue) -> anyhow::Result<()> {
        debug!(cue = ?cue, "chime");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Cue {
        Haptic(Vec<u32>),
        Chime(AudioCue),
    }

    /// Captures every cue; fails every call when `broken`
    #[derive(Default, Clone)]
    pub struct RecordingFeedback {
        pub cues: Arc<Mutex<Vec<Cue>>>,
        pub broken: bool,
    }

    impl RecordingFeedback {
        pub fn cues(&self) -> Vec<Cue> {
            self.cues.lock().clone()
        }

        pub fn haptics(&self) -> Vec<Vec<u32>> {
            self.cues()
                .into_iter()
                .filter_map(|c| match c {
                    Cue::Haptic(p) => Some(p),
                    Cue::Chime(_) => None,
                })
                .collect()
        }
    }

    impl Feedback for RecordingFeedback {
        fn haptic(&self, pattern: &HapticPattern) -> anyhow::Result<()> {
            if self.broken {
                anyhow::bail!("no vibration motor");
            }
            self.cues.lock().push(Cue::Haptic(pattern.as_slice().to_vec()));
            Ok(())
        }

        fn chime(&self, cue: AudioCue) -> anyhow::Result<()> {
            if self.broken {
                anyhow::bail!("audio context unavailable");
            }
            self.cues.lock().push(Cue::Chime(cue));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::recording::{Cue, RecordingFeedback};
    use super::*;

    #[test]
    fn test_patterns() {
        assert_eq!(HapticPattern::double_pulse().as_slice(), &[100, 50, 100]);
        assert_eq!(HapticPattern::confirm().as_slice(), &[200]);
        assert_eq!(HapticPattern::reject().as_slice(), &[300]);
    }

    #[test]
    fn test_fire_records() {
        let feedback = RecordingFeedback::default();
        fire_haptic(&feedback, HapticPattern::tap());
        fire_chime(&feedback, AudioCue::OrderBell);
        assert_eq!(feedback.cues(), vec![Cue::Haptic(vec![20]), Cue::Chime(AudioCue::OrderBell)]);
    }

    #[test]
    fn test_failures_are_swallowed() {
        let feedback = RecordingFeedback { broken: true, ..Default::default() };
        fire_haptic(&feedback, HapticPattern::reject());
        fire_chime(&feedback, AudioCue::OrderBell);
        assert!(feedback.cues().is_empty());
    }
}
