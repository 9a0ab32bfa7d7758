//! Idle-attention timer
//!
//! A repeating debounce: every activity pushes the deadline out by the quiet
//! window. When the deadline passes the timer fires and re-arms itself. A fire
//! while anything modal is open is swallowed but still re-arms.

use crate::domain::types::InteractionContext;
use tracing::debug;

/// What happened when the deadline was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleFire {
    /// Hint became visible
    Show,
    /// Hint was already visible; nothing new for the host
    AlreadyShown,
    /// Something modal was open, fire swallowed
    Suppressed,
}

#[derive(Debug, Clone)]
pub struct IdleAttentionTimer {
    quiet_ms: u64,
    deadline: Option<u64>,
    hint_shown: bool,
}

impl IdleAttentionTimer {
    /// Create an armed timer
    pub fn new(quiet_ms: u64, now_ms: u64) -> Self {
        Self { quiet_ms, deadline: Some(now_ms.saturating_add(quiet_ms)), hint_shown: false }
    }

    /// Reset the countdown. Returns true if a visible hint was dismissed.
    pub fn on_activity(&mut self, now_ms: u64) -> bool {
        self.deadline = Some(now_ms.saturating_add(self.quiet_ms));
        std::mem::replace(&mut self.hint_shown, false)
    }

    /// Fire if the deadline has passed
    pub fn poll(&mut self, now_ms: u64, ctx: &InteractionContext) -> Option<IdleFire> {
        let deadline = self.deadline?;
        if now_ms < deadline {
            return None;
        }

        self.deadline = Some(now_ms.saturating_add(self.quiet_ms));

        if ctx.suppresses_idle() {
            debug!(now_ms = %now_ms, ctx = ?ctx, "idle_hint_suppressed");
            return Some(IdleFire::Suppressed);
        }

        if self.hint_shown {
            return Some(IdleFire::AlreadyShown);
        }
        self.hint_shown = true;
        Some(IdleFire::Show)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.deadline
    }

    pub fn hint_shown(&self) -> bool {
        self.hint_shown
    }

    /// Disarm on teardown. Returns true if a visible hint was dismissed.
    pub fn cancel(&mut self) -> bool {
        self.deadline = None;
        std::mem::replace(&mut self.hint_shown, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: u64 = 10_000;

    fn idle_ctx() -> InteractionContext {
        InteractionContext::default()
    }

    #[test]
    fn test_fires_after_quiet_window() {
        let mut timer = IdleAttentionTimer::new(QUIET, 0);
        assert_eq!(timer.poll(9_999, &idle_ctx()), None);
        assert_eq!(timer.poll(10_000, &idle_ctx()), Some(IdleFire::Show));
        assert!(timer.hint_shown());
    }

    #[test]
    fn test_activity_before_deadline_pushes_it_out() {
        let mut timer = IdleAttentionTimer::new(QUIET, 0);
        assert!(!timer.on_activity(9_999));

        assert_eq!(timer.poll(10_000, &idle_ctx()), None);
        assert_eq!(timer.next_deadline(), Some(19_999));
        assert_eq!(timer.poll(19_999, &idle_ctx()), Some(IdleFire::Show));
    }

    #[test]
    fn test_suppressed_fire_still_rearms() {
        let mut timer = IdleAttentionTimer::new(QUIET, 0);
        let busy = InteractionContext { detail_open: true, ..Default::default() };

        assert_eq!(timer.poll(10_000, &busy), Some(IdleFire::Suppressed));
        assert!(!timer.hint_shown());
        assert_eq!(timer.next_deadline(), Some(20_000));

        assert_eq!(timer.poll(20_000, &idle_ctx()), Some(IdleFire::Show));
    }

    #[test]
    fn test_each_modal_suppresses() {
        for ctx in [
            InteractionContext { detail_open: true, ..Default::default() },
            InteractionContext { cart_open: true, ..Default::default() },
            InteractionContext { session_active: true, ..Default::default() },
        ] {
            let mut timer = IdleAttentionTimer::new(QUIET, 0);
            assert_eq!(timer.poll(QUIET, &ctx), Some(IdleFire::Suppressed));
        }
    }

    #[test]
    fn test_repeats_without_reshowing() {
        let mut timer = IdleAttentionTimer::new(QUIET, 0);
        assert_eq!(timer.poll(10_000, &idle_ctx()), Some(IdleFire::Show));
        assert_eq!(timer.poll(20_000, &idle_ctx()), Some(IdleFire::AlreadyShown));

        assert!(timer.on_activity(20_500));
        assert!(!timer.hint_shown());
        assert_eq!(timer.poll(30_500, &idle_ctx()), Some(IdleFire::Show));
    }

    #[test]
    fn test_cancel_disarms() {
        let mut timer = IdleAttentionTimer::new(QUIET, 0);
        timer.poll(10_000, &idle_ctx());
        assert!(timer.cancel());
        assert_eq!(timer.next_deadline(), None);
        assert_eq!(timer.poll(1_000_000, &idle_ctx()), None);
    }
}
