//! Event and deadline handlers for the SessionController
//!
//! Each handler updates one surface (selection, detail view, cart drawer,
//! PIN pad, specials) and reports the result to the host.

use super::{Command, DetailView, SessionController};
use crate::domain::events::{PermissionOutcome, PressTarget};
use crate::domain::menu::ItemDraft;
use crate::domain::types::{epoch_ms, ItemId, MenuItem, MotionReading};
use crate::io::feedback::{fire_chime, fire_haptic, AudioCue, HapticPattern};
use crate::services::admin_gate::PinOutcome;
use crate::services::idle_timer::IdleFire;
use crate::services::press_timer::Release;
use crate::services::selection_animator::AnimatorEvent;
use tracing::{debug, info, warn};

/// Shown when the platform refuses motion access
pub const PERMISSION_DENIED_MESSAGE: &str =
    "Motion access was denied. Tap \"Chef decides\" to let the chef pick for you.";

/// What asked for a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TriggerSource {
    Shake,
    Manual,
    Permission,
}

impl TriggerSource {
    fn as_str(self) -> &'static str {
        match self {
            TriggerSource::Shake => "shake",
            TriggerSource::Manual => "manual",
            TriggerSource::Permission => "permission",
        }
    }
}

impl SessionController {
    pub(crate) fn handle_activity(&mut self, now_ms: u64) {
        if self.idle.on_activity(now_ms) {
            self.host.on_idle_hint(false);
        }
    }

    pub(crate) fn handle_motion(&mut self, reading: &MotionReading, now_ms: u64) {
        let Some(sample) = reading.to_sample() else {
            self.metrics.record_motion_sample_dropped();
            debug!(timestamp_ms = %reading.timestamp_ms, "motion_reading_unusable");
            return;
        };

        if self.classifier.process(&sample, now_ms).is_some() {
            self.metrics.record_shake_detected();
            self.trigger_selection(now_ms, TriggerSource::Shake);
        }
    }

    /// Gate a shake or manual trigger and start a session if it passes.
    /// Returns true if a session started.
    pub(crate) fn trigger_selection(&mut self, now_ms: u64, source: TriggerSource) -> bool {
        let ctx = self.context();
        let from_shake = source == TriggerSource::Shake;
        let source = source.as_str();
        if !ctx.accepts_selection() {
            self.metrics.record_trigger_gated(from_shake, false);
            debug!(source = %source, ctx = ?ctx, "selection_trigger_dropped");
            return false;
        }
        self.metrics.record_trigger_gated(from_shake, true);

        // Shakes are not user activity on their own, but an accepted one dismisses the hint
        self.handle_activity(now_ms);

        let pool = self.catalog.candidate_pool(self.admin.specials());
        match self.animator.start(pool, now_ms, &ctx) {
            Ok(session) => {
                info!(session_id = %session.id, source = %source, "selection_triggered");
                self.metrics.record_session_started();
            }
            Err(reason) => {
                self.metrics.record_session_rejected();
                warn!(source = %source, reason = %reason, "selection_rejected");
                return false;
            }
        }

        // First frame is due immediately
        self.advance_selection(now_ms);
        true
    }

    pub(crate) fn advance_selection(&mut self, now_ms: u64) {
        let ticks = self.animator.timing().ticks;
        for event in self.animator.advance(now_ms) {
            match event {
                AnimatorEvent::Tick { item, tick, .. } => {
                    self.host.on_shuffle_display(&item, tick);
                }
                AnimatorEvent::Settled { winner, .. } => {
                    self.host.on_shuffle_display(&winner, ticks + 1);
                }
                AnimatorEvent::Done(session) => {
                    let Some(winner) = session.winner else {
                        continue;
                    };
                    self.metrics.record_session_completed();
                    info!(
                        session_id = %session.id,
                        winner = %winner.id,
                        elapsed_ms = %now_ms.saturating_sub(session.started_at_ms),
                        "selection_done"
                    );
                    self.host.on_winner_selected(&winner);
                    self.show_detail(winner, true);
                }
            }
        }
    }

    pub(crate) fn advance_press(&mut self, now_ms: u64) {
        match self.press.poll(now_ms) {
            Some(PressTarget::Logo) => {
                if self.admin.is_authenticated() {
                    debug!("logo_long_press_already_admin");
                    return;
                }
                self.admin.open_pin_pad();
                fire_haptic(self.feedback.as_ref(), HapticPattern::double_pulse());
                self.host.on_pin_pad(true, 0);
                info!("pin_pad_opened");
            }
            Some(PressTarget::Card(item_id)) => self.open_detail(&item_id, false),
            None => {}
        }
    }

    pub(crate) fn advance_detail(&mut self, now_ms: u64) {
        let due = self.detail.as_ref().and_then(|d| d.close_at_ms).is_some_and(|at| now_ms >= at);
        if due {
            self.close_detail();
        }
    }

    pub(crate) fn advance_idle(&mut self, now_ms: u64) {
        let ctx = self.context();
        match self.idle.poll(now_ms, &ctx) {
            Some(IdleFire::Show) => {
                self.metrics.record_idle_hint(true);
                self.host.on_idle_hint(true);
            }
            Some(IdleFire::Suppressed) => self.metrics.record_idle_hint(false),
            Some(IdleFire::AlreadyShown) | None => {}
        }
    }

    pub(crate) fn handle_press_start(&mut self, target: PressTarget, now_ms: u64) {
        self.press.start(target, now_ms);
    }

    pub(crate) fn handle_press_end(&mut self) {
        if let Release::Tap(PressTarget::Card(item_id)) = self.press.end() {
            fire_haptic(self.feedback.as_ref(), HapticPattern::tap());
            // Sizzle only on the turn to the ingredients side
            let show_ingredients = !self.flipped.remove(&item_id);
            if show_ingredients {
                fire_chime(self.feedback.as_ref(), AudioCue::Sizzle);
                self.flipped.insert(item_id.clone());
            }
            self.host.on_card_flipped(&item_id, show_ingredients);
            debug!(item_id = %item_id, show_ingredients = %show_ingredients, "card_tapped");
        }
    }

    /// Open the detail view for a browsed item
    pub(crate) fn open_detail(&mut self, item_id: &ItemId, recommended: bool) {
        let ctx = self.context();
        if ctx.is_busy() {
            debug!(item_id = %item_id, ctx = ?ctx, "open_detail_ignored");
            return;
        }
        let Some(item) = self.catalog.find(item_id, self.admin.specials()).cloned() else {
            warn!(item_id = %item_id, "open_detail_unknown_item");
            return;
        };
        self.show_detail(item, recommended);
    }

    fn show_detail(&mut self, item: MenuItem, recommended: bool) {
        debug!(item_id = %item.id, recommended = %recommended, "detail_opened");
        self.host.on_detail_view(Some(&item), recommended);
        self.detail = Some(DetailView { item, recommended, close_at_ms: None });
    }

    /// Close the detail view, dropping its pending close deadline
    pub(crate) fn close_detail(&mut self) {
        if self.detail.take().is_some() {
            self.host.on_detail_view(None, false);
        }
    }

    pub(crate) fn handle_add_to_order(&mut self, now_ms: u64) {
        let Some(detail) = self.detail.as_mut() else {
            debug!("add_to_order_without_detail");
            return;
        };
        if detail.close_at_ms.is_some() {
            debug!(item_id = %detail.item.id, "add_to_order_repeat_ignored");
            return;
        }

        detail.close_at_ms = Some(now_ms.saturating_add(self.config.add_confirm_ms()));
        let quantity = self.cart.add(&detail.item);
        info!(
            item_id = %detail.item.id,
            quantity = %quantity,
            recommended = %detail.recommended,
            "added_to_order"
        );

        self.metrics.record_cart_mutation();
        fire_haptic(self.feedback.as_ref(), HapticPattern::confirm());
        self.notify_cart();
    }

    pub(crate) fn handle_open_cart(&mut self) {
        if self.cart_open || self.animator.is_active() || self.detail.is_some() {
            return;
        }
        self.cart_open = true;
        self.host.on_cart_drawer(true, self.order_placed);
    }

    pub(crate) fn handle_close_cart(&mut self) {
        if !self.cart_open {
            return;
        }
        self.cart_open = false;
        self.order_placed = false;
        self.host.on_cart_drawer(false, false);
    }

    pub(crate) fn handle_adjust_quantity(&mut self, item_id: &ItemId, delta: i64) {
        if !self.cart_open || self.order_placed {
            debug!(item_id = %item_id, placed = %self.order_placed, "quantity_locked");
            return;
        }
        if self.cart.adjust_quantity(item_id, delta) {
            self.metrics.record_cart_mutation();
            self.notify_cart();
        }
    }

    pub(crate) fn handle_place_order(&mut self) {
        if !self.cart_open || self.order_placed || self.cart.is_empty() {
            debug!(open = %self.cart_open, placed = %self.order_placed, "place_order_ignored");
            return;
        }

        self.order_placed = true;
        let totals = self.cart.totals();
        info!(
            total_items = %totals.total_items,
            total_price = %totals.total_price,
            lines = %self.cart.lines().len(),
            "order_placed"
        );

        self.metrics.record_order_placed();
        fire_chime(self.feedback.as_ref(), AudioCue::OrderBell);
        fire_haptic(self.feedback.as_ref(), HapticPattern::double_pulse());
        self.host.on_cart_drawer(true, true);
    }

    pub(crate) fn handle_pin_digit(&mut self, digit: char) {
        match self.admin.submit_digit(digit) {
            PinOutcome::Pending(entered) => self.host.on_pin_pad(true, entered),
            PinOutcome::Authenticated => {
                self.host.on_pin_pad(false, 0);
                self.host.on_admin_authenticated();
            }
            PinOutcome::Rejected => {
                self.metrics.record_pin_failure();
                fire_haptic(self.feedback.as_ref(), HapticPattern::reject());
                self.host.on_pin_pad(true, 0);
            }
            PinOutcome::Ignored => debug!(digit = ?digit, "pin_digit_ignored"),
        }
    }

    pub(crate) fn handle_pin_clear(&mut self) {
        self.admin.clear_pin();
        if self.admin.session().pin_pad_open {
            self.host.on_pin_pad(true, 0);
        }
    }

    pub(crate) fn handle_pin_cancel(&mut self) {
        let was_open = self.admin.session().pin_pad_open;
        self.admin.cancel_pin();
        if was_open {
            self.host.on_pin_pad(false, 0);
        }
    }

    fn require_admin(&self, action: &'static str) -> bool {
        let ok = self.admin.is_authenticated();
        if !ok {
            warn!(action = %action, "admin_action_unauthenticated");
        }
        ok
    }

    pub(crate) fn handle_admin_add(&mut self, draft: ItemDraft) {
        if !self.require_admin("add") {
            return;
        }
        match self.admin.add_item(draft, epoch_ms(), &self.catalog) {
            Ok(_) => self.notify_specials(),
            Err(e) => warn!(error = %e, "special_rejected"),
        }
    }

    pub(crate) fn handle_admin_update(&mut self, item_id: &ItemId, draft: ItemDraft) {
        if !self.require_admin("update") {
            return;
        }
        match self.admin.update_item(item_id, draft) {
            Ok(true) => self.notify_specials(),
            Ok(false) => debug!(item_id = %item_id, "update_unknown_special"),
            Err(e) => warn!(item_id = %item_id, error = %e, "special_rejected"),
        }
    }

    pub(crate) fn handle_admin_delete(&mut self, item_id: &ItemId) {
        if !self.require_admin("delete") {
            return;
        }
        let had_in_cart = self.cart.quantity_of(item_id) > 0;
        if !self.admin.delete_item(item_id, &mut self.cart) {
            debug!(item_id = %item_id, "delete_unknown_special");
            return;
        }

        if self.detail.as_ref().is_some_and(|d| &d.item.id == item_id) {
            self.close_detail();
        }
        self.flipped.remove(item_id);
        self.notify_specials();
        if had_in_cart {
            self.metrics.record_cart_mutation();
            self.notify_cart();
        }
    }

    pub(crate) fn handle_permission_request(&mut self, now_ms: u64) {
        if self.motion_enabled {
            self.trigger_selection(now_ms, TriggerSource::Permission);
            return;
        }
        self.commands.push(Command::RequestPermission);
    }

    pub(crate) fn handle_permission_outcome(&mut self, outcome: PermissionOutcome, now_ms: u64) {
        match outcome {
            PermissionOutcome::Granted => {
                info!("motion_permission_granted");
                self.enable_motion();
                self.trigger_selection(now_ms, TriggerSource::Permission);
            }
            PermissionOutcome::Denied => {
                info!("motion_permission_denied");
                self.host.on_permission_denied(PERMISSION_DENIED_MESSAGE);
            }
        }
    }

    pub(crate) fn enable_motion(&mut self) {
        self.motion_enabled = true;
        if !self.subscribed {
            self.subscribed = true;
            self.commands.push(Command::Subscribe);
        }
    }

    fn notify_specials(&self) {
        self.host.on_specials_changed(self.admin.specials());
        self.publish_menu();
    }

    fn notify_cart(&self) {
        self.host.on_cart_changed(self.cart.lines(), self.cart.totals());
    }
}
