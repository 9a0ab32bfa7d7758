//! Inputs to the session controller
//!
//! Every host interaction, sensor reading and async completion arrives as a
//! `CoreEvent` on one channel. The serde shape doubles as the replay script
//! format: one JSON object per line with a `type` tag.

use crate::domain::menu::ItemDraft;
use crate::domain::types::{ItemId, MotionReading};
use serde::{Deserialize, Serialize};

/// What a long press is held on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressTarget {
    /// Store logo, opens the PIN pad
    Logo,
    /// Menu card, opens the detail view
    Card(ItemId),
}

/// Result of asking the platform for motion access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionOutcome {
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoreEvent {
    /// Raw device-motion record
    Motion(MotionReading),
    /// "Chef decides" button, same gate as a shake
    ManualTrigger,
    /// Scroll/touch anywhere; resets the idle countdown
    Activity,
    PressStart { target: PressTarget },
    PressEnd,
    OpenDetail { item_id: ItemId },
    CloseDetail,
    /// Add the item in the open detail view
    AddToOrder,
    OpenCart,
    CloseCart,
    AdjustQuantity { item_id: ItemId, delta: i64 },
    PlaceOrder,
    PinDigit { digit: char },
    PinClear,
    PinCancel,
    AdminAdd { draft: ItemDraft },
    AdminUpdate { item_id: ItemId, draft: ItemDraft },
    AdminDelete { item_id: ItemId },
    AdminLogout,
    /// User tapped "enable shake"
    RequestMotionPermission,
    MotionPermission { outcome: PermissionOutcome },
    Shutdown,
}

impl CoreEvent {
    /// Name used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            CoreEvent::Motion(_) => "motion",
            CoreEvent::ManualTrigger => "manual_trigger",
            CoreEvent::Activity => "activity",
            CoreEvent::PressStart { .. } => "press_start",
            CoreEvent::PressEnd => "press_end",
            CoreEvent::OpenDetail { .. } => "open_detail",
            CoreEvent::CloseDetail => "close_detail",
            CoreEvent::AddToOrder => "add_to_order",
            CoreEvent::OpenCart => "open_cart",
            CoreEvent::CloseCart => "close_cart",
            CoreEvent::AdjustQuantity { .. } => "adjust_quantity",
            CoreEvent::PlaceOrder => "place_order",
            CoreEvent::PinDigit { .. } => "pin_digit",
            CoreEvent::PinClear => "pin_clear",
            CoreEvent::PinCancel => "pin_cancel",
            CoreEvent::AdminAdd { .. } => "admin_add",
            CoreEvent::AdminUpdate { .. } => "admin_update",
            CoreEvent::AdminDelete { .. } => "admin_delete",
            CoreEvent::AdminLogout => "admin_logout",
            CoreEvent::RequestMotionPermission => "request_motion_permission",
            CoreEvent::MotionPermission { .. } => "motion_permission",
            CoreEvent::Shutdown => "shutdown",
        }
    }

    /// Events that count as user activity for the idle timer
    pub fn is_user_activity(&self) -> bool {
        !matches!(
            self,
            CoreEvent::Motion(_) | CoreEvent::MotionPermission { .. } | CoreEvent::Shutdown
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tagged_events() {
        let motion: CoreEvent = serde_json::from_str(
            r#"{"type":"motion","timestamp_ms":2500,"acceleration":[30.0,0.0,0.0]}"#,
        )
        .unwrap();
        assert_eq!(motion.kind(), "motion");
        assert!(!motion.is_user_activity());

        let press: CoreEvent =
            serde_json::from_str(r#"{"type":"press_start","target":{"card":"p1"}}"#).unwrap();
        assert_eq!(press, CoreEvent::PressStart { target: PressTarget::Card(ItemId::from("p1")) });

        let logo: CoreEvent = serde_json::from_str(r#"{"type":"press_start","target":"logo"}"#).unwrap();
        assert_eq!(logo, CoreEvent::PressStart { target: PressTarget::Logo });

        let digit: CoreEvent = serde_json::from_str(r#"{"type":"pin_digit","digit":"8"}"#).unwrap();
        assert_eq!(digit, CoreEvent::PinDigit { digit: '8' });
        assert!(digit.is_user_activity());
    }

    #[test]
    fn test_parse_admin_add() {
        let event: CoreEvent = serde_json::from_str(
            r#"{"type":"admin_add","draft":{"name":"Kheer","price":90,"image":"kheer.jpg"}}"#,
        )
        .unwrap();
        match event {
            CoreEvent::AdminAdd { draft } => {
                assert_eq!(draft.name, "Kheer");
                assert_eq!(draft.price, 90);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(serde_json::from_str::<CoreEvent>(r#"{"type":"teleport"}"#).is_err());
    }
}
