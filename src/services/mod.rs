//! Services - business logic and state management
//!
//! This module contains the core business logic services:
//! - `controller` - Central event orchestrator and session state
//! - `motion_classifier` - Shake detection with threshold, throttle, and startup guard
//! - `selection_animator` - Timed "chef decides" draw (ticks, settle, done)
//! - `idle_timer` - Quiet-period attention hint
//! - `press_timer` - Long-press detection for the logo and menu cards
//! - `cart_ledger` - Order lines and derived totals
//! - `admin_gate` - PIN authentication and persisted chef specials

pub mod admin_gate;
pub mod cart_ledger;
pub mod controller;
pub mod idle_timer;
pub mod motion_classifier;
pub mod press_timer;
pub mod selection_animator;

// Re-export commonly used types
pub use admin_gate::{AdminGate, AdminSession, PinOutcome};
pub use cart_ledger::CartLedger;
pub use controller::{Collaborators, Command, DetailView, SessionController};
pub use idle_timer::{IdleAttentionTimer, IdleFire};
pub use motion_classifier::{ClassifierParams, Decision, MotionClassifier};
pub use press_timer::{PressTimer, Release};
pub use selection_animator::{
    AnimatorEvent, Picker, RandomPicker, ScriptedPicker, SelectionAnimator, SelectionSession,
    SelectionTiming, SessionStatus, StartRejected,
};
