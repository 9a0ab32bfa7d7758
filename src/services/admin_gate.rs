//! Admin gate - PIN mode switch and the persisted specials list
//!
//! Digits accumulate while the PIN pad is open. The sixth digit triggers the
//! comparison; either way the buffer is cleared. Specials are read from the
//! key-value store once and written back after every mutation. A store that is
//! missing, unreadable or holds garbage yields an empty list.

use crate::domain::menu::{Catalog, DraftError, ItemDraft};
use crate::domain::types::{ItemId, MenuItem};
use crate::io::store::KeyValueStore;
use crate::services::cart_ledger::CartLedger;
use std::sync::Arc;
use tracing::{info, warn};

/// Store key holding the specials JSON array
pub const SPECIALS_KEY: &str = "jp_specials";

pub const PIN_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOutcome {
    /// Digit accepted; carries the buffer length
    Pending(usize),
    Authenticated,
    Rejected,
    /// Pad closed or not a digit
    Ignored,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminSession {
    pub authenticated: bool,
    pub pin_buffer: String,
    pub pin_pad_open: bool,
}

pub struct AdminGate {
    pin: String,
    session: AdminSession,
    specials: Vec<MenuItem>,
    store: Arc<dyn KeyValueStore>,
}

impl AdminGate {
    /// Build the gate and read persisted specials
    pub fn load(pin: &str, store: Arc<dyn KeyValueStore>) -> Self {
        let specials = read_specials(store.as_ref());
        info!(specials = %specials.len(), "admin_specials_loaded");
        Self { pin: pin.to_string(), session: AdminSession::default(), specials, store }
    }

    pub fn session(&self) -> &AdminSession {
        &self.session
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.authenticated
    }

    pub fn specials(&self) -> &[MenuItem] {
        &self.specials
    }

    /// Show the PIN pad with an empty buffer
    pub fn open_pin_pad(&mut self) {
        self.session.pin_pad_open = true;
        self.session.pin_buffer.clear();
    }

    pub fn submit_digit(&mut self, digit: char) -> PinOutcome {
        if !self.session.pin_pad_open || !digit.is_ascii_digit() {
            return PinOutcome::Ignored;
        }

        self.session.pin_buffer.push(digit);
        let len = self.session.pin_buffer.len();
        if len < PIN_LENGTH {
            return PinOutcome::Pending(len);
        }

        let matched = self.session.pin_buffer == self.pin;
        self.session.pin_buffer.clear();
        if matched {
            self.session.authenticated = true;
            self.session.pin_pad_open = false;
            info!("admin_authenticated");
            PinOutcome::Authenticated
        } else {
            warn!("admin_pin_rejected");
            PinOutcome::Rejected
        }
    }

    /// Empty the buffer, pad stays open
    pub fn clear_pin(&mut self) {
        self.session.pin_buffer.clear();
    }

    /// Empty the buffer and close the pad
    pub fn cancel_pin(&mut self) {
        self.session.pin_buffer.clear();
        self.session.pin_pad_open = false;
    }

    pub fn logout(&mut self) {
        if self.session.authenticated {
            info!("admin_logged_out");
        }
        self.session.authenticated = false;
    }

    /// Create a special. Ids are `custom-<epoch ms>`, bumped until unique
    /// across both the specials and the static catalog.
    pub fn add_item(
        &mut self,
        draft: ItemDraft,
        now_ms: u64,
        catalog: &Catalog,
    ) -> Result<MenuItem, DraftError> {
        draft.validate()?;

        let mut stamp = now_ms;
        let id = loop {
            let candidate = ItemId::new(format!("custom-{stamp}"));
            let taken = catalog.contains(&candidate)
                || self.specials.iter().any(|item| item.id == candidate);
            if !taken {
                break candidate;
            }
            stamp += 1;
        };

        let item = draft.into_item(id);
        self.specials.insert(0, item.clone());
        info!(item_id = %item.id, name = %item.name, price = %item.price, "special_added");
        self.persist();
        Ok(item)
    }

    /// Drop persisted specials whose id is already used by the static catalog.
    /// Returns how many were dropped; the store is rewritten if any were.
    pub fn drop_shadowed(&mut self, catalog: &Catalog) -> usize {
        let before = self.specials.len();
        self.specials.retain(|item| {
            let shadowed = catalog.contains(&item.id);
            if shadowed {
                warn!(item_id = %item.id, name = %item.name, "special_shadows_catalog_item_dropped");
            }
            !shadowed
        });
        let dropped = before - self.specials.len();
        if dropped > 0 {
            self.persist();
        }
        dropped
    }

    /// Replace a special in place, keeping its id. `Ok(false)` for an unknown id.
    pub fn update_item(&mut self, id: &ItemId, draft: ItemDraft) -> Result<bool, DraftError> {
        draft.validate()?;

        let Some(slot) = self.specials.iter_mut().find(|item| &item.id == id) else {
            return Ok(false);
        };
        *slot = draft.into_item(id.clone());
        info!(item_id = %id, "special_updated");
        self.persist();
        Ok(true)
    }

    /// Remove a special and every cart line referencing it
    pub fn delete_item(&mut self, id: &ItemId, cart: &mut CartLedger) -> bool {
        let before = self.specials.len();
        self.specials.retain(|item| &item.id != id);
        if self.specials.len() == before {
            return false;
        }

        let removed_from_cart = cart.remove_all_of(id);
        info!(item_id = %id, removed_from_cart = %removed_from_cart, "special_deleted");
        self.persist();
        true
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.specials)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.store.set(SPECIALS_KEY, &json));
        if let Err(e) = result {
            warn!(error = %e, "specials_persist_failed");
        }
    }
}

fn read_specials(store: &dyn KeyValueStore) -> Vec<MenuItem> {
    let raw = match store.get(SPECIALS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(error = %e, "specials_read_failed_using_empty");
            return Vec::new();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, "specials_corrupt_using_empty");
            Vec::new()
        }
    }
}
