//! # Deduction Engine
//!
//! Turns a cart into the total amount of each ingredient it consumes.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cart = [Latte × 2, Cappuccino × 1]                                     │
//! │                                                                         │
//! │  Latte      × 2 → Espresso Beans 18×2 = 36   Milk 200×2 = 400           │
//! │  Cappuccino × 1 → Espresso Beans 18×1 = 18   Milk 150×1 = 150           │
//! │                   ─────────────────────────  ──────────────────         │
//! │  deduction      → Espresso Beans       54    Milk          550          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pure function of the cart and the recipes. A product without a recipe
//! contributes nothing. Totals are always non-negative; callers choose
//! whether to subtract (sale) or add (restock) them via [`DeltaDirection`].
//!
//! Summation runs in cart order then recipe order, so identical carts give
//! bit-identical totals. Reordering a cart can change the last bits of a
//! total, which is irrelevant at café quantities.

use serde::{Deserialize, Serialize};

use crate::bom::RecipeSource;

/// One `(product, quantity)` input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionLine {
    pub product_id: String,
    pub quantity: i64,
}

impl DeductionLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        DeductionLine {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Ingredient → total quantity, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deduction {
    totals: Vec<(String, f64)>,
}

impl Deduction {
    pub fn new() -> Self {
        Deduction::default()
    }

    /// Adds `quantity` to the running total for `ingredient`.
    pub fn accumulate(&mut self, ingredient: &str, quantity: f64) {
        match self.totals.iter_mut().find(|(name, _)| name == ingredient) {
            Some((_, total)) => *total += quantity,
            None => self.totals.push((ingredient.to_string(), quantity)),
        }
    }

    pub fn get(&self, ingredient: &str) -> Option<f64> {
        self.totals
            .iter()
            .find(|(name, _)| name == ingredient)
            .map(|(_, total)| *total)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.totals.iter().map(|(name, total)| (name.as_str(), *total))
    }

    pub fn ingredients(&self) -> impl Iterator<Item = &str> {
        self.totals.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    /// An empty deduction is a no-op, not an error.
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

impl FromIterator<(String, f64)> for Deduction {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        let mut deduction = Deduction::new();
        for (ingredient, qty) in iter {
            deduction.accumulate(&ingredient, qty);
        }
        deduction
    }
}

/// Which way a deduction moves stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaDirection {
    /// A sale consumes stock.
    Subtract,
    /// A cancellation or restock returns it.
    Add,
}

impl DeltaDirection {
    /// Applies the direction to a non-negative deduction total.
    #[inline]
    pub fn signed(&self, quantity: f64) -> f64 {
        match self {
            DeltaDirection::Subtract => -quantity,
            DeltaDirection::Add => quantity,
        }
    }

    /// The opposite direction; cancelling a sale uses the inverse.
    pub fn inverse(&self) -> Self {
        match self {
            DeltaDirection::Subtract => DeltaDirection::Add,
            DeltaDirection::Add => DeltaDirection::Subtract,
        }
    }
}

/// Computes total ingredient consumption for `lines`.
///
/// ## Example
/// ```rust
/// use brewline_core::bom::BomTable;
/// use brewline_core::deduction::{compute_deduction, DeductionLine};
///
/// let bom = BomTable::default_menu();
/// let d = compute_deduction(
///     &[DeductionLine::new("C1003", 1), DeductionLine::new("C1001", 2)],
///     &bom,
/// );
/// assert_eq!(d.get("Espresso Beans"), Some(54.0));
/// assert_eq!(d.get("Milk"), Some(200.0));
/// ```
pub fn compute_deduction<R>(lines: &[DeductionLine], recipes: &R) -> Deduction
where
    R: RecipeSource + ?Sized,
{
    let mut deduction = Deduction::new();
    for line in lines {
        for item in recipes.recipe(&line.product_id) {
            deduction.accumulate(&item.ingredient, item.quantity_per_unit * line.quantity as f64);
        }
    }
    deduction
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bom::{BomEntry, BomTable};

    #[test]
    fn test_latte_times_two() {
        let bom = BomTable::default_menu();
        let d = compute_deduction(&[DeductionLine::new("C1003", 2)], &bom);

        assert_eq!(d.len(), 2);
        assert_eq!(d.get("Espresso Beans"), Some(36.0));
        assert_eq!(d.get("Milk"), Some(400.0));
    }

    #[test]
    fn test_shared_ingredient_is_summed() {
        let bom = BomTable::default_menu();
        let lines = [
            DeductionLine::new("C1003", 2),
            DeductionLine::new("C1002", 1),
            DeductionLine::new("C1004", 3),
        ];
        let d = compute_deduction(&lines, &bom);

        // 18×2 + 18×1 + 18×3
        assert_eq!(d.get("Espresso Beans"), Some(108.0));
        assert_eq!(d.get("Milk"), Some(550.0));
        assert_eq!(d.get("Hot Water"), Some(450.0));
        assert_eq!(
            d.ingredients().collect::<Vec<_>>(),
            vec!["Espresso Beans", "Milk", "Hot Water"]
        );
    }

    #[test]
    fn test_empty_cart_is_empty_deduction() {
        let d = compute_deduction(&[], &BomTable::default_menu());
        assert!(d.is_empty());
    }

    #[test]
    fn test_product_without_recipe_contributes_nothing() {
        let bom = BomTable::default_menu();
        let d = compute_deduction(
            &[DeductionLine::new("C9999", 4), DeductionLine::new("C1001", 1)],
            &bom,
        );
        assert_eq!(d.len(), 1);
        assert_eq!(d.get("Espresso Beans"), Some(18.0));
    }

    #[test]
    fn test_deterministic_for_identical_carts() {
        let bom = BomTable::from_entries(vec![
            BomEntry::new("X1", "Syrup", 0.1),
            BomEntry::new("X2", "Syrup", 0.2),
        ]);
        let lines = [DeductionLine::new("X1", 3), DeductionLine::new("X2", 7)];
        assert_eq!(compute_deduction(&lines, &bom), compute_deduction(&lines, &bom));
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(DeltaDirection::Subtract.signed(36.0), -36.0);
        assert_eq!(DeltaDirection::Add.signed(36.0), 36.0);
        assert_eq!(DeltaDirection::Subtract.inverse(), DeltaDirection::Add);
    }
}
