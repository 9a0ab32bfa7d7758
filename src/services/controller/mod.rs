//! Session orchestration
//!
//! The SessionController is the single event processor that coordinates:
//! - Shake detection (classifier) and the "chef decides" gate
//! - The selection animator and winner delivery
//! - Idle hint, long-press and add-to-order deadlines
//! - Cart drawer, detail view and the admin PIN/CRUD flow
//!
//! Time is explicit: every entry point takes `now_ms`, measured from the
//! controller's origin. `next_deadline` says when `advance` must run next.

mod handlers;

use crate::domain::events::CoreEvent;
use crate::domain::menu::Catalog;
use crate::domain::types::{InteractionContext, ItemId, MenuItem};
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::io::feedback::Feedback;
use crate::io::host::HostCallbacks;
use crate::io::motion::{Availability, MotionCapability};
use crate::services::admin_gate::AdminGate;
use crate::services::cart_ledger::CartLedger;
use crate::services::idle_timer::IdleAttentionTimer;
use crate::services::motion_classifier::{ClassifierParams, MotionClassifier};
use crate::services::press_timer::PressTimer;
use crate::services::selection_animator::{Picker, SelectionAnimator, SelectionTiming};
use handlers::TriggerSource;
use rustc_hash::FxHashSet;
use std::sync::Arc;
use std::time::Instant as StdInstant;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, error, info};

/// Async work the run loop performs on the controller's behalf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Ask the platform for motion access
    RequestPermission,
    /// Start pushing sensor readings
    Subscribe,
}

/// The item shown in the detail view
#[derive(Debug, Clone)]
pub struct DetailView {
    pub item: MenuItem,
    /// Opened by a finished selection rather than by browsing
    pub recommended: bool,
    /// Set after "add to order"; the view closes at this time
    pub(crate) close_at_ms: Option<u64>,
}

/// Outbound collaborators
pub struct Collaborators {
    pub host: Box<dyn HostCallbacks>,
    pub feedback: Arc<dyn Feedback>,
    pub picker: Box<dyn Picker>,
    pub metrics: Arc<Metrics>,
}

pub struct SessionController {
    pub(crate) classifier: MotionClassifier,
    pub(crate) idle: IdleAttentionTimer,
    pub(crate) animator: SelectionAnimator,
    pub(crate) press: PressTimer,
    pub(crate) cart: CartLedger,
    pub(crate) admin: AdminGate,
    pub(crate) catalog: Catalog,
    pub(crate) detail: Option<DetailView>,
    /// Cards currently showing their ingredients side
    pub(crate) flipped: FxHashSet<ItemId>,
    pub(crate) cart_open: bool,
    /// Order placed in the current drawer session; locks quantity controls
    pub(crate) order_placed: bool,
    pub(crate) motion_enabled: bool,
    pub(crate) subscribed: bool,
    pub(crate) shut_down: bool,
    pub(crate) commands: Vec<Command>,
    pub(crate) config: Config,
    pub(crate) host: Box<dyn HostCallbacks>,
    pub(crate) feedback: Arc<dyn Feedback>,
    pub(crate) metrics: Arc<Metrics>,
}

impl SessionController {
    pub fn new(
        config: Config,
        catalog: Catalog,
        mut admin: AdminGate,
        collaborators: Collaborators,
        now_ms: u64,
    ) -> Self {
        let Collaborators { host, feedback, picker, metrics } = collaborators;
        admin.drop_shadowed(&catalog);
        Self {
            classifier: MotionClassifier::new(ClassifierParams::from_config(&config), now_ms),
            idle: IdleAttentionTimer::new(config.idle_quiet_ms(), now_ms),
            animator: SelectionAnimator::new(SelectionTiming::from_config(&config), picker),
            press: PressTimer::from_config(&config),
            cart: CartLedger::new(),
            admin,
            catalog,
            detail: None,
            flipped: FxHashSet::default(),
            cart_open: false,
            order_placed: false,
            motion_enabled: false,
            subscribed: false,
            shut_down: false,
            commands: Vec::new(),
            config,
            host,
            feedback,
            metrics,
        }
    }

    /// Modal state as seen by the gate and the idle timer
    pub fn context(&self) -> InteractionContext {
        InteractionContext {
            detail_open: self.detail.is_some(),
            cart_open: self.cart_open,
            session_active: self.animator.is_active(),
        }
    }

    pub fn cart(&self) -> &CartLedger {
        &self.cart
    }

    pub fn admin(&self) -> &AdminGate {
        &self.admin
    }

    pub fn detail(&self) -> Option<&DetailView> {
        self.detail.as_ref()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Record what the sensor can do. Available sensors are subscribed immediately.
    pub fn attach_motion(&mut self, availability: Availability) {
        info!(availability = ?availability, "motion_attached");
        if availability == Availability::Available {
            self.enable_motion();
        }
    }

    /// Send the rendered menu (specials category first) to the host
    pub fn publish_menu(&self) {
        self.host.on_menu(&self.catalog.with_specials(self.admin.specials()));
    }

    /// Drain pending async commands
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Earliest pending deadline across every owned timer
    pub fn next_deadline(&self) -> Option<u64> {
        [
            self.animator.next_deadline(),
            self.press.next_deadline(),
            self.detail.as_ref().and_then(|d| d.close_at_ms),
            self.idle.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Process a single event, dispatching to the appropriate handler
    pub fn process_event(&mut self, event: CoreEvent, now_ms: u64) {
        if self.shut_down {
            return;
        }
        let process_start = StdInstant::now();
        if !matches!(event, CoreEvent::Motion(_)) {
            debug!(event = %event.kind(), now_ms = %now_ms, "event_received");
        }

        // Timers that came due before this event fire first
        self.advance(now_ms);

        if event.is_user_activity() {
            self.handle_activity(now_ms);
        }

        match event {
            CoreEvent::Motion(reading) => self.handle_motion(&reading, now_ms),
            CoreEvent::ManualTrigger => {
                self.trigger_selection(now_ms, TriggerSource::Manual);
            }
            CoreEvent::Activity => {}
            CoreEvent::PressStart { target } => self.handle_press_start(target, now_ms),
            CoreEvent::PressEnd => self.handle_press_end(),
            CoreEvent::OpenDetail { item_id } => self.open_detail(&item_id, false),
            CoreEvent::CloseDetail => self.close_detail(),
            CoreEvent::AddToOrder => self.handle_add_to_order(now_ms),
            CoreEvent::OpenCart => self.handle_open_cart(),
            CoreEvent::CloseCart => self.handle_close_cart(),
            CoreEvent::AdjustQuantity { item_id, delta } => self.handle_adjust_quantity(&item_id, delta),
            CoreEvent::PlaceOrder => self.handle_place_order(),
            CoreEvent::PinDigit { digit } => self.handle_pin_digit(digit),
            CoreEvent::PinClear => self.handle_pin_clear(),
            CoreEvent::PinCancel => self.handle_pin_cancel(),
            CoreEvent::AdminAdd { draft } => self.handle_admin_add(draft),
            CoreEvent::AdminUpdate { item_id, draft } => self.handle_admin_update(&item_id, draft),
            CoreEvent::AdminDelete { item_id } => self.handle_admin_delete(&item_id),
            CoreEvent::AdminLogout => self.admin.logout(),
            CoreEvent::RequestMotionPermission => self.handle_permission_request(now_ms),
            CoreEvent::MotionPermission { outcome } => self.handle_permission_outcome(outcome, now_ms),
            CoreEvent::Shutdown => self.shutdown(),
        }

        let latency_us = process_start.elapsed().as_micros() as u64;
        self.metrics.record_event_processed(latency_us);
    }

    /// Fire every deadline that is due at `now_ms`
    pub fn advance(&mut self, now_ms: u64) {
        if self.shut_down {
            return;
        }
        self.advance_selection(now_ms);
        self.advance_press(now_ms);
        self.advance_detail(now_ms);
        self.advance_idle(now_ms);
    }

    /// Cancel every timer and stop accepting events
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        if let Some(session) = self.animator.cancel() {
            self.metrics.record_session_cancelled();
            info!(session_id = %session.id, "selection_cancelled_on_shutdown");
        }
        self.idle.cancel();
        self.press.cancel();
        self.detail = None;
        self.shut_down = true;
        info!(
            cart_items = %self.cart.totals().total_items,
            specials = %self.admin.specials().len(),
            "controller_shutdown"
        );
    }

    /// Consume events until `Shutdown` arrives or every sender is gone
    ///
    /// `event_tx` is used to post async results (permission outcomes) back
    /// into the loop; sensor subscriptions get an upgraded sender.
    pub async fn run(
        mut self,
        mut event_rx: mpsc::Receiver<CoreEvent>,
        event_tx: mpsc::WeakSender<CoreEvent>,
        motion: Arc<dyn MotionCapability>,
        origin: Instant,
    ) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        self.attach_motion(motion.availability());
        self.publish_menu();

        loop {
            self.dispatch_commands(&motion, &event_tx, &stop_rx);
            if self.shut_down {
                break;
            }

            let deadline = self.next_deadline().map(|ms| origin + Duration::from_millis(ms));

            tokio::select! {
                event = event_rx.recv() => {
                    match event {
                        Some(e) => self.process_event(e, elapsed_ms(origin)),
                        None => {
                            self.shutdown();
                            break;
                        }
                    }
                }
                _ = sleep_until_opt(deadline) => {
                    self.advance(elapsed_ms(origin));
                }
            }
        }

        let _ = stop_tx.send(true);
        self
    }

    fn dispatch_commands(
        &mut self,
        motion: &Arc<dyn MotionCapability>,
        event_tx: &mpsc::WeakSender<CoreEvent>,
        stop_rx: &watch::Receiver<bool>,
    ) {
        for command in self.take_commands() {
            let Some(tx) = event_tx.upgrade() else {
                continue;
            };
            let motion = motion.clone();
            match command {
                Command::RequestPermission => {
                    tokio::spawn(async move {
                        let outcome = motion.request_permission().await;
                        let _ = tx.send(CoreEvent::MotionPermission { outcome }).await;
                    });
                }
                Command::Subscribe => {
                    let stop_rx = stop_rx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = motion.subscribe(tx, stop_rx).await {
                            error!(error = %e, "motion_subscription_failed");
                        }
                    });
                }
            }
        }
    }
}

fn elapsed_ms(origin: Instant) -> u64 {
    origin.elapsed().as_millis() as u64
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
