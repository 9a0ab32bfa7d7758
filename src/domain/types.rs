//! Shared types for the selection core

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Get current epoch milliseconds
#[inline]
pub fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Newtype wrapper for menu item IDs to provide type safety
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A single accelerometer sample as seen by the classifier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub timestamp_ms: u64,
    /// True when the vector excludes gravity (linear acceleration)
    pub has_linear_acceleration: bool,
}

impl MotionSample {
    pub fn linear(x: f64, y: f64, z: f64, timestamp_ms: u64) -> Self {
        Self { x, y, z, timestamp_ms, has_linear_acceleration: true }
    }

    pub fn with_gravity(x: f64, y: f64, z: f64, timestamp_ms: u64) -> Self {
        Self { x, y, z, timestamp_ms, has_linear_acceleration: false }
    }

    #[inline]
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Raw device-motion record as delivered by the host
///
/// Either vector may be missing. Linear acceleration wins when both are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionReading {
    pub timestamp_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceleration: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceleration_including_gravity: Option<[f64; 3]>,
}

impl MotionReading {
    /// Convert to a classifier sample, or None if the reading carries no usable vector
    pub fn to_sample(&self) -> Option<MotionSample> {
        let finite = |v: &[f64; 3]| v.iter().all(|c| c.is_finite());

        if let Some([x, y, z]) = self.acceleration.filter(finite) {
            return Some(MotionSample::linear(x, y, z, self.timestamp_ms));
        }
        self.acceleration_including_gravity
            .filter(finite)
            .map(|[x, y, z]| MotionSample::with_gravity(x, y, z, self.timestamp_ms))
    }
}

/// A detected shake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShakeEvent {
    pub timestamp_ms: u64,
}

/// Dietary/marketing flags shown on a card
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemTags {
    #[serde(default)]
    pub is_veg: bool,
    #[serde(default)]
    pub is_spicy: bool,
    #[serde(default)]
    pub is_popular: bool,
}

/// A menu entry. Replaced wholesale on admin update, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: ItemId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hindi_name: Option<String>,
    #[serde(default)]
    pub description: String,
    pub price: u32,
    #[serde(default)]
    pub image: String,
    #[serde(flatten)]
    pub tags: ItemTags,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub is_custom: bool,
}

/// One cart row: an item snapshot and a quantity that is always >= 1
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLine {
    pub item: MenuItem,
    pub quantity: u32,
}

impl CartLine {
    #[inline]
    pub fn line_price(&self) -> u64 {
        u64::from(self.item.price) * u64::from(self.quantity)
    }
}

/// Derived cart totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub total_items: u64,
    pub total_price: u64,
}

/// Which modal surfaces are currently up
///
/// Passed to both the idle timer and the shake gate so neither reads UI state on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionContext {
    pub detail_open: bool,
    pub cart_open: bool,
    pub session_active: bool,
}

impl InteractionContext {
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.detail_open || self.cart_open || self.session_active
    }

    /// Gate for starting a selection session
    #[inline]
    pub fn accepts_selection(&self) -> bool {
        !self.is_busy()
    }

    /// Idle hint must be swallowed while anything modal is up
    #[inline]
    pub fn suppresses_idle(&self) -> bool {
        self.is_busy()
    }
}
