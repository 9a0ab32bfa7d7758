//! Cart ledger - the order aggregate
//!
//! Ordered lines, at most one per item id, every quantity >= 1. Totals are
//! derived on read so they can never drift from the lines.

use crate::domain::types::{CartLine, CartTotals, ItemId, MenuItem};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct CartLedger {
    lines: Vec<CartLine>,
}

impl CartLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one of `item`. Existing line gets +1, otherwise a new line is appended.
    /// Returns the resulting quantity.
    pub fn add(&mut self, item: &MenuItem) -> u32 {
        if let Some(line) = self.line_mut(&item.id) {
            line.quantity = line.quantity.saturating_add(1);
            debug!(item_id = %item.id, quantity = %line.quantity, "cart_line_incremented");
            return line.quantity;
        }
        self.lines.push(CartLine { item: item.clone(), quantity: 1 });
        debug!(item_id = %item.id, "cart_line_added");
        1
    }

    /// Change a line's quantity by `delta`. Dropping to zero or below removes it.
    /// Returns false if the id is not in the cart.
    pub fn adjust_quantity(&mut self, id: &ItemId, delta: i64) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };

        let next = i64::from(self.lines[pos].quantity).saturating_add(delta);
        if next <= 0 {
            self.lines.remove(pos);
            debug!(item_id = %id, "cart_line_removed");
        } else {
            self.lines[pos].quantity = u32::try_from(next).unwrap_or(u32::MAX);
        }
        true
    }

    /// Drop the line for `id`, if any. Returns the quantity removed.
    pub fn remove_all_of(&mut self, id: &ItemId) -> u32 {
        match self.position(id) {
            Some(pos) => self.lines.remove(pos).quantity,
            None => 0,
        }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn quantity_of(&self, id: &ItemId) -> u32 {
        self.lines.iter().find(|l| &l.item.id == id).map_or(0, |l| l.quantity)
    }

    pub fn totals(&self) -> CartTotals {
        self.lines.iter().fold(CartTotals::default(), |acc, line| CartTotals {
            total_items: acc.total_items + u64::from(line.quantity),
            total_price: acc.total_price + line.line_price(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn position(&self, id: &ItemId) -> Option<usize> {
        self.lines.iter().position(|l| &l.item.id == id)
    }

    fn line_mut(&mut self, id: &ItemId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| &l.item.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::menu::fixtures::item;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rustc_hash::FxHashSet;

    #[test]
    fn test_add_increments_existing_line() {
        let mut cart = CartLedger::new();
        let a = item("a", 50);

        assert_eq!(cart.add(&a), 1);
        assert_eq!(cart.add(&a), 2);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.totals(), CartTotals { total_items: 2, total_price: 100 });
    }

    #[test]
    fn test_lines_keep_insertion_order() {
        let mut cart = CartLedger::new();
        cart.add(&item("b", 80));
        cart.add(&item("a", 50));
        cart.add(&item("b", 80));

        let ids: Vec<&str> = cart.lines().iter().map(|l| l.item.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_adjust_to_zero_removes_line() {
        let mut cart = CartLedger::new();
        let a = item("a", 50);
        cart.add(&a);
        cart.add(&a);

        assert!(cart.adjust_quantity(&a.id, -1));
        assert_eq!(cart.quantity_of(&a.id), 1);
        assert!(cart.adjust_quantity(&a.id, -5));
        assert!(cart.is_empty());
        assert_eq!(cart.totals(), CartTotals::default());
    }

    #[test]
    fn test_adjust_unknown_id_is_noop() {
        let mut cart = CartLedger::new();
        cart.add(&item("a", 50));
        assert!(!cart.adjust_quantity(&ItemId::from("zzz"), 3));
        assert_eq!(cart.totals().total_items, 1);
    }

    #[test]
    fn test_remove_all_of() {
        let mut cart = CartLedger::new();
        let a = item("a", 50);
        cart.add(&a);
        cart.add(&a);
        cart.add(&item("b", 80));

        assert_eq!(cart.remove_all_of(&a.id), 2);
        assert_eq!(cart.remove_all_of(&a.id), 0);
        assert_eq!(cart.totals(), CartTotals { total_items: 1, total_price: 80 });
    }

    #[test]
    fn test_random_sequences_keep_invariants() {
        let menu: Vec<MenuItem> = (0..6).map(|i| item(&format!("i{i}"), 15 * i + 5)).collect();

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut cart = CartLedger::new();

            for _ in 0..200 {
                let target = &menu[rng.gen_range(0..menu.len())];
                match rng.gen_range(0..3) {
                    0 => {
                        cart.add(target);
                    }
                    1 => {
                        cart.adjust_quantity(&target.id, rng.gen_range(-3..=3));
                    }
                    _ => {
                        cart.remove_all_of(&target.id);
                    }
                }

                let mut seen = FxHashSet::default();
                for line in cart.lines() {
                    assert!(line.quantity >= 1);
                    assert!(seen.insert(line.item.id.clone()), "duplicate line");
                }

                let expected_items: u64 = cart.lines().iter().map(|l| u64::from(l.quantity)).sum();
                let expected_price: u64 = cart
                    .lines()
                    .iter()
                    .map(|l| u64::from(l.item.price) * u64::from(l.quantity))
                    .sum();
                assert_eq!(
                    cart.totals(),
                    CartTotals { total_items: expected_items, total_price: expected_price }
                );
            }
        }
    }

    #[test]
    fn test_extreme_deltas_clamp_instead_of_wrapping() {
        let mut cart = CartLedger::new();
        let a = item("a", 50);
        cart.add(&a);

        assert!(cart.adjust_quantity(&a.id, i64::MAX));
        assert_eq!(cart.quantity_of(&a.id), u32::MAX);

        // Already at the cap: another add stays there
        assert_eq!(cart.add(&a), u32::MAX);

        assert!(cart.adjust_quantity(&a.id, i64::MIN));
        assert!(cart.is_empty());
    }
}
