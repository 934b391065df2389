//! # Menu Catalog
//!
//! The café sells a fixed menu defined at startup. Product ids are the keys
//! the BOM table is indexed by.
//!
//! | Id    | Name       | Price |
//! |-------|------------|-------|
//! | C1001 | Espresso   | $2.50 |
//! | C1002 | Cappuccino | $3.00 |
//! | C1003 | Latte      | $3.20 |
//! | C1004 | Americano  | $2.80 |
//! | C1005 | Mocha      | $3.50 |

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// An immutable catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Product {
    pub product_id: &'static str,
    pub name: &'static str,
    pub price: Money,
}

impl Product {
    /// Label shown in product pickers: `"C1003 — Latte"`.
    pub fn label(&self) -> String {
        format!("{} — {}", self.product_id, self.name)
    }
}

/// The built-in menu.
pub const MENU: &[Product] = &[
    Product {
        product_id: "C1001",
        name: "Espresso",
        price: Money::from_cents(250),
    },
    Product {
        product_id: "C1002",
        name: "Cappuccino",
        price: Money::from_cents(300),
    },
    Product {
        product_id: "C1003",
        name: "Latte",
        price: Money::from_cents(320),
    },
    Product {
        product_id: "C1004",
        name: "Americano",
        price: Money::from_cents(280),
    },
    Product {
        product_id: "C1005",
        name: "Mocha",
        price: Money::from_cents(350),
    },
];

/// Read-only view over a set of products.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    products: &'static [Product],
}

impl Catalog {
    /// The café's built-in menu.
    pub const fn menu() -> Self {
        Catalog { products: MENU }
    }

    pub fn products(&self) -> &'static [Product] {
        self.products
    }

    pub fn find(&self, product_id: &str) -> Option<&'static Product> {
        self.products.iter().find(|p| p.product_id == product_id)
    }

    /// Like [`Catalog::find`] but reports an unknown id as an error.
    pub fn get(&self, product_id: &str) -> CoreResult<&'static Product> {
        self.find(product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::menu()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_lookup() {
        let catalog = Catalog::menu();
        let latte = catalog.get("C1003").unwrap();
        assert_eq!(latte.name, "Latte");
        assert_eq!(latte.price.cents(), 320);
        assert_eq!(latte.label(), "C1003 — Latte");
    }

    #[test]
    fn test_unknown_product() {
        let err = Catalog::menu().get("C9999").unwrap_err();
        assert_eq!(err.to_string(), "Product not found: C9999");
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids: Vec<_> = MENU.iter().map(|p| p.product_id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), MENU.len());
    }
}
