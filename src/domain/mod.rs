//! Domain models - core value types, controller inputs and the menu catalog
//!
//! This module contains the canonical data types used throughout the core:
//! - `MotionSample` / `MotionReading` - accelerometer input
//! - `MenuItem` / `ItemId` - the things being browsed, drawn, and ordered
//! - `CartLine` / `CartTotals` - order aggregate rows and derived totals
//! - `InteractionContext` - which modal surfaces are open
//! - `CoreEvent` - everything the controller reacts to
//! - `Catalog` / `ItemDraft` - static menu plus the specials overlay

pub mod events;
pub mod menu;
pub mod types;

pub use events::{CoreEvent, PermissionOutcome, PressTarget};
pub use menu::{Catalog, DraftError, ItemDraft, MenuCategory};
pub use types::{
    CartLine, CartTotals, InteractionContext, ItemId, ItemTags, MenuItem, MotionReading,
    MotionSample, ShakeEvent,
};
