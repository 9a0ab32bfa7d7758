//! Long-press recognition
//!
//! One press is tracked at a time. A press that is still held at its deadline
//! fires once; releasing earlier is a tap and cancels the deadline.

use crate::domain::events::PressTarget;
use crate::infra::config::Config;

/// Result of releasing a press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Release {
    /// Released before the deadline
    Tap(PressTarget),
    /// The long press already fired
    AfterLongPress,
    /// Nothing was being pressed
    Stray,
}

#[derive(Debug, Clone)]
struct Pending {
    target: PressTarget,
    deadline_ms: u64,
    fired: bool,
}

#[derive(Debug, Clone)]
pub struct PressTimer {
    logo_ms: u64,
    card_ms: u64,
    pending: Option<Pending>,
}

impl PressTimer {
    pub fn new(logo_ms: u64, card_ms: u64) -> Self {
        Self { logo_ms, card_ms, pending: None }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.logo_long_press_ms(), config.card_long_press_ms())
    }

    /// Begin a press, replacing any press in progress
    pub fn start(&mut self, target: PressTarget, now_ms: u64) {
        let hold_ms = match target {
            PressTarget::Logo => self.logo_ms,
            PressTarget::Card(_) => self.card_ms,
        };
        self.pending = Some(Pending { target, deadline_ms: now_ms.saturating_add(hold_ms), fired: false });
    }

    pub fn end(&mut self) -> Release {
        match self.pending.take() {
            Some(p) if p.fired => Release::AfterLongPress,
            Some(p) => Release::Tap(p.target),
            None => Release::Stray,
        }
    }

    /// Fire the held press if its deadline has passed
    pub fn poll(&mut self, now_ms: u64) -> Option<PressTarget> {
        let pending = self.pending.as_mut()?;
        if pending.fired || now_ms < pending.deadline_ms {
            return None;
        }
        pending.fired = true;
        Some(pending.target.clone())
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.as_ref().filter(|p| !p.fired).map(|p| p.deadline_ms)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ItemId;

    fn timer() -> PressTimer {
        PressTimer::new(3_000, 500)
    }

    #[test]
    fn test_logo_fires_at_3000ms() {
        let mut timer = timer();
        timer.start(PressTarget::Logo, 100);
        assert_eq!(timer.poll(3_099), None);
        assert_eq!(timer.poll(3_100), Some(PressTarget::Logo));
        assert_eq!(timer.poll(9_000), None);
        assert_eq!(timer.end(), Release::AfterLongPress);
    }

    #[test]
    fn test_card_fires_at_500ms() {
        let mut timer = timer();
        let card = PressTarget::Card(ItemId::from("a"));
        timer.start(card.clone(), 0);
        assert_eq!(timer.next_deadline(), Some(500));
        assert_eq!(timer.poll(500), Some(card));
        assert_eq!(timer.next_deadline(), None);
    }

    #[test]
    fn test_early_release_is_tap() {
        let mut timer = timer();
        timer.start(PressTarget::Logo, 0);
        assert_eq!(timer.end(), Release::Tap(PressTarget::Logo));
        assert_eq!(timer.poll(5_000), None);
        assert_eq!(timer.end(), Release::Stray);
    }

    #[test]
    fn test_new_press_replaces_old() {
        let mut timer = timer();
        timer.start(PressTarget::Logo, 0);
        timer.start(PressTarget::Card(ItemId::from("b")), 100);
        assert_eq!(timer.poll(600), Some(PressTarget::Card(ItemId::from("b"))));
        assert_eq!(timer.poll(3_000), None);
    }

    #[test]
    fn test_cancel() {
        let mut timer = timer();
        timer.start(PressTarget::Logo, 0);
        timer.cancel();
        assert_eq!(timer.next_deadline(), None);
        assert_eq!(timer.poll(3_000), None);
    }
}
