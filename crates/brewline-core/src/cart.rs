//! # Cart
//!
//! The order being built at the counter. A `Cart` is a plain value owned by
//! whichever workflow is building the order; nothing here is global.
//!
//! ## Cart Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operator action            Cart method           Effect                │
//! │  ───────────────            ───────────           ──────                │
//! │  Pick product + qty ──────► add()       ───────► push or merge line     │
//! │  Change quantity ─────────► update()    ───────► set qty (0 removes)    │
//! │  Remove line ─────────────► remove()    ───────► drop line              │
//! │  Start over ──────────────► clear()     ───────► no lines               │
//! │  Save / pay ──────────────► to_deduction_input() → deduction engine     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Lines are unique by `product_id` (adding the same product merges)
//! - Every quantity is within `1..=MAX_LINE_QUANTITY`
//! - At most `MAX_CART_LINES` lines

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::deduction::DeductionLine;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::OrderLine;
use crate::validation::validate_quantity;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

/// A cart line: the product snapshot plus quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    /// Product name when added (frozen).
    pub product_name: String,
    /// Price when added (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl CartLine {
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            product_id: product.product_id.to_string(),
            product_name: product.name.to_string(),
            unit_price_cents: product.price.cents(),
            quantity,
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price() * self.quantity
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Rebuilds a cart from a saved order's lines.
    pub fn from_order_lines(lines: &[OrderLine]) -> Self {
        Cart {
            lines: lines
                .iter()
                .map(|l| CartLine {
                    product_id: l.product_id.clone(),
                    product_name: l.product_name.clone(),
                    unit_price_cents: l.unit_price_cents,
                    quantity: l.quantity,
                })
                .collect(),
        }
    }

    /// Adds `quantity` of `product`, merging with an existing line.
    pub fn add(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product.product_id)
        {
            let merged = line.quantity + quantity;
            if merged > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: merged,
                    max: MAX_LINE_QUANTITY,
                });
            }
            line.quantity = merged;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        self.lines.push(CartLine::from_product(product, quantity));
        Ok(())
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn update(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove(product_id);
        }
        validate_quantity(quantity)?;

        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
        line.quantity = quantity;
        Ok(())
    }

    pub fn remove(&mut self, product_id: &str) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        if self.lines.len() == before {
            return Err(CoreError::ProductNotFound(product_id.to_string()));
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Errors with `cart is empty` when there is nothing to bill.
    pub fn ensure_not_empty(&self) -> CoreResult<()> {
        if self.is_empty() {
            return Err(ValidationError::Empty {
                field: "cart".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// `(product_id, quantity)` pairs for the deduction engine.
    pub fn to_deduction_input(&self) -> Vec<DeductionLine> {
        self.lines
            .iter()
            .map(|l| DeductionLine::new(l.product_id.clone(), l.quantity))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn product(id: &str) -> &'static Product {
        Catalog::menu().get(id).unwrap()
    }

    #[test]
    fn test_add_merges_same_product() {
        let mut cart = Cart::new();
        cart.add(product("C1003"), 2).unwrap();
        cart.add(product("C1003"), 1).unwrap();
        cart.add(product("C1001"), 1).unwrap();

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.total_quantity(), 4);
        // 3 × 3.20 + 2.50
        assert_eq!(cart.subtotal().cents(), 1210);
    }

    #[test]
    fn test_update_zero_removes() {
        let mut cart = Cart::new();
        cart.add(product("C1005"), 2).unwrap();
        cart.update("C1005", 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_unknown_line() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.update("C1002", 3),
            Err(CoreError::ProductNotFound(_))
        ));
        assert!(cart.remove("C1002").is_err());
    }

    #[test]
    fn test_quantity_limits() {
        let mut cart = Cart::new();
        assert!(cart.add(product("C1001"), 0).is_err());
        assert!(cart.add(product("C1001"), -2).is_err());

        cart.add(product("C1001"), MAX_LINE_QUANTITY).unwrap();
        assert!(matches!(
            cart.add(product("C1001"), 1),
            Err(CoreError::QuantityTooLarge { .. })
        ));
    }

    #[test]
    fn test_deduction_input_and_empty_check() {
        let mut cart = Cart::new();
        assert!(cart.ensure_not_empty().is_err());

        cart.add(product("C1003"), 2).unwrap();
        assert!(cart.ensure_not_empty().is_ok());
        assert_eq!(cart.to_deduction_input(), vec![DeductionLine::new("C1003", 2)]);

        cart.clear();
        assert!(cart.to_deduction_input().is_empty());
    }
}
