//! Host callbacks and the channel that carries them
//!
//! The controller reports everything the UI has to render through
//! [`HostCallbacks`]. `HostSender` turns each callback into a [`HostEvent`]
//! on a bounded mpsc; when the channel is full the event is dropped and
//! counted rather than blocking the core.
//!
//! A slice of the buffer is held back for state-changing events (winner, cart,
//! specials, auth). Frequent presentation events (shuffle frames, idle hint,
//! pad/drawer visibility) stop being queued once only that slice is left, so a
//! slow host loses animation frames before it loses a winner.

use crate::domain::menu::MenuCategory;
use crate::domain::types::{CartLine, CartTotals, ItemId, MenuItem};
use crate::infra::metrics::Metrics;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Share of the buffer reserved for state-changing events (1/8)
const RESERVED_SHIFT: u32 = 3;

pub trait HostCallbacks: Send {
    /// Selection finished; called once per completed session
    fn on_winner_selected(&self, item: &MenuItem);
    fn on_cart_changed(&self, lines: &[CartLine], totals: CartTotals);
    fn on_admin_authenticated(&self);
    fn on_idle_hint(&self, shown: bool);
    fn on_shuffle_display(&self, item: &MenuItem, tick: u32);
    fn on_permission_denied(&self, message: &str);
    fn on_specials_changed(&self, items: &[MenuItem]);
    /// Full menu as rendered: specials category first when there are any
    fn on_menu(&self, categories: &[MenuCategory]);
    /// Detail view opened (`Some`) or closed (`None`)
    fn on_detail_view(&self, item: Option<&MenuItem>, recommended: bool);
    fn on_cart_drawer(&self, open: bool, order_placed: bool);
    /// PIN pad visibility and how many digits are entered
    fn on_pin_pad(&self, open: bool, digits: usize);
    /// Card turned to its ingredients side (`true`) or back to the photo
    fn on_card_flipped(&self, item_id: &ItemId, show_ingredients: bool);
}

/// One host notification
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    WinnerSelected { item: MenuItem },
    CartChanged { lines: Vec<CartLine>, totals: CartTotals },
    AdminAuthenticated,
    IdleHint { shown: bool },
    ShuffleDisplay { item: MenuItem, tick: u32 },
    PermissionDenied { message: String },
    SpecialsChanged { items: Vec<MenuItem> },
    DetailView { item: Option<MenuItem>, recommended: bool },
    CartDrawer { open: bool, order_placed: bool },
    PinPad { open: bool, digits: usize },
    Menu { categories: Vec<MenuCategory> },
    CardFlipped { item_id: ItemId, show_ingredients: bool },
}

impl HostEvent {
    /// Events that change what the user owns or sees as a result; never shed early
    pub fn is_state_change(&self) -> bool {
        matches!(
            self,
            HostEvent::WinnerSelected { .. }
                | HostEvent::CartChanged { .. }
                | HostEvent::AdminAuthenticated
                | HostEvent::PermissionDenied { .. }
                | HostEvent::SpecialsChanged { .. }
                | HostEvent::Menu { .. }
        )
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Channel-backed callbacks
///
/// Non-blocking - if the channel is full, events are dropped.
#[derive(Clone)]
pub struct HostSender {
    tx: mpsc::Sender<HostEvent>,
    /// Free slots kept for state-changing events
    reserved: usize,
    metrics: Arc<Metrics>,
}

impl HostSender {
    pub fn new(tx: mpsc::Sender<HostEvent>, metrics: Arc<Metrics>) -> Self {
        let reserved = tx.max_capacity() >> RESERVED_SHIFT;
        Self { tx, reserved, metrics }
    }

    fn send(&self, event: HostEvent) {
        let state_change = event.is_state_change();
        if !state_change && self.tx.capacity() <= self.reserved {
            self.metrics.record_host_event_dropped();
            debug!(reserved = %self.reserved, "host_event_shed");
            return;
        }
        if let Err(e) = self.tx.try_send(event) {
            self.metrics.record_host_event_dropped();
            if state_change {
                warn!(error = %e, "host_state_event_dropped");
            } else {
                debug!(error = %e, "host_event_dropped");
            }
        }
    }
}

impl HostCallbacks for HostSender {
    fn on_winner_selected(&self, item: &MenuItem) {
        self.send(HostEvent::WinnerSelected { item: item.clone() });
    }

    fn on_cart_changed(&self, lines: &[CartLine], totals: CartTotals) {
        self.send(HostEvent::CartChanged { lines: lines.to_vec(), totals });
    }

    fn on_admin_authenticated(&self) {
        self.send(HostEvent::AdminAuthenticated);
    }

    fn on_idle_hint(&self, shown: bool) {
        self.send(HostEvent::IdleHint { shown });
    }

    fn on_shuffle_display(&self, item: &MenuItem, tick: u32) {
        self.send(HostEvent::ShuffleDisplay { item: item.clone(), tick });
    }

    fn on_permission_denied(&self, message: &str) {
        self.send(HostEvent::PermissionDenied { message: message.to_string() });
    }

    fn on_specials_changed(&self, items: &[MenuItem]) {
        self.send(HostEvent::SpecialsChanged { items: items.to_vec() });
    }

    fn on_detail_view(&self, item: Option<&MenuItem>, recommended: bool) {
        self.send(HostEvent::DetailView { item: item.cloned(), recommended });
    }

    fn on_cart_drawer(&self, open: bool, order_placed: bool) {
        self.send(HostEvent::CartDrawer { open, order_placed });
    }

    fn on_pin_pad(&self, open: bool, digits: usize) {
        self.send(HostEvent::PinPad { open, digits });
    }

    fn on_menu(&self, categories: &[MenuCategory]) {
        self.send(HostEvent::Menu { categories: categories.to_vec() });
    }

    fn on_card_flipped(&self, item_id: &ItemId, show_ingredients: bool) {
        self.send(HostEvent::CardFlipped { item_id: item_id.clone(), show_ingredients });
    }
}

/// Create a new host channel pair
///
/// Buffer size determines how many events can be queued before drops start.
pub fn create_host_channel(
    buffer_size: usize,
    metrics: Arc<Metrics>,
) -> (HostSender, mpsc::Receiver<HostEvent>) {
    let (tx, rx) = mpsc::channel(buffer_size);
    (HostSender::new(tx, metrics), rx)
}
