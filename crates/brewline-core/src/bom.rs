//! # Bill of Materials
//!
//! Maps each sellable product to the ingredients one unit of it consumes.
//!
//! ## Data Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BomEntry rows (storage)              BomTable (in memory)              │
//! │  ───────────────────────              ────────────────────              │
//! │  (C1003, Espresso Beans, 18, g)  ──►  C1003 ─► [Espresso Beans 18 g,    │
//! │  (C1003, Milk,          200, ml)             Milk 200 ml]               │
//! │  (C1005, Espresso Beans, 18, g)  ──►  C1005 ─► [Espresso Beans 18 g,    │
//! │  ...                                         Milk 150 ml, ...]          │
//! │                                                                         │
//! │  Key: (product_id, ingredient). Product and recipe order are kept,      │
//! │  which makes deduction and inventory listings deterministic.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The table is seeded into storage once from [`DEFAULT_BOM`] and is only
//! rewritten by an explicit admin reset.

use serde::{Deserialize, Serialize};

// =============================================================================
// Built-in Tables
// =============================================================================

/// Built-in recipes: `(product_id, [(ingredient, quantity_per_unit)])`.
pub const DEFAULT_BOM: &[(&str, &[(&str, f64)])] = &[
    ("C1001", &[("Espresso Beans", 18.0)]),
    ("C1002", &[("Espresso Beans", 18.0), ("Milk", 150.0)]),
    ("C1003", &[("Espresso Beans", 18.0), ("Milk", 200.0)]),
    ("C1004", &[("Espresso Beans", 18.0), ("Hot Water", 150.0)]),
    (
        "C1005",
        &[
            ("Espresso Beans", 18.0),
            ("Milk", 150.0),
            ("Chocolate Syrup", 25.0),
        ],
    ),
];

const INGREDIENT_UNITS: &[(&str, &str)] = &[
    ("Espresso Beans", "g"),
    ("Milk", "ml"),
    ("Hot Water", "ml"),
    ("Chocolate Syrup", "g"),
];

const SHELF_LIFE_DAYS: &[(&str, i64)] = &[
    ("Espresso Beans", 30),
    ("Milk", 7),
    ("Chocolate Syrup", 180),
];

/// Unit of measure for an ingredient; empty string when unknown.
pub fn ingredient_unit(ingredient: &str) -> &'static str {
    INGREDIENT_UNITS
        .iter()
        .find(|(name, _)| *name == ingredient)
        .map(|(_, unit)| *unit)
        .unwrap_or("")
}

/// Days an ingredient keeps after it is received. `None` for non-perishables
/// and unknown ingredients.
pub fn shelf_life_days(ingredient: &str) -> Option<i64> {
    SHELF_LIFE_DAYS
        .iter()
        .find(|(name, _)| *name == ingredient)
        .map(|(_, days)| *days)
}

/// Every ingredient of the built-in BOM, once, in first-seen order.
pub fn bom_ingredients() -> Vec<String> {
    BomTable::default_menu().ingredients()
}

// =============================================================================
// Types
// =============================================================================

/// One persisted BOM row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomEntry {
    pub product_id: String,
    pub ingredient: String,
    pub quantity_per_unit: f64,
    pub unit: String,
}

impl BomEntry {
    /// Builds an entry, taking the unit from the ingredient lookup.
    pub fn new(product_id: impl Into<String>, ingredient: impl Into<String>, qty: f64) -> Self {
        let ingredient = ingredient.into();
        BomEntry {
            product_id: product_id.into(),
            unit: ingredient_unit(&ingredient).to_string(),
            ingredient,
            quantity_per_unit: qty,
        }
    }
}

/// One ingredient of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeItem {
    pub ingredient: String,
    pub quantity_per_unit: f64,
    pub unit: String,
}

/// Anything that can answer "what does one unit of this product consume?".
///
/// The deduction engine only depends on this trait, so it works the same
/// whether recipes came from storage or from the built-in table.
pub trait RecipeSource {
    /// The recipe for `product_id`, or an empty slice if it has none.
    fn recipe(&self, product_id: &str) -> &[RecipeItem];
}

/// In-memory BOM, grouped by product in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BomTable {
    products: Vec<(String, Vec<RecipeItem>)>,
}

impl BomTable {
    /// Groups flat rows by product. A repeated `(product, ingredient)` pair
    /// keeps the last quantity.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = BomEntry>,
    {
        let mut table = BomTable::default();
        for entry in entries {
            table.upsert(entry);
        }
        table
    }

    fn upsert(&mut self, entry: BomEntry) {
        let idx = match self
            .products
            .iter()
            .position(|(id, _)| *id == entry.product_id)
        {
            Some(idx) => idx,
            None => {
                self.products.push((entry.product_id.clone(), Vec::new()));
                self.products.len() - 1
            }
        };
        let recipe = &mut self.products[idx].1;
        match recipe.iter_mut().find(|r| r.ingredient == entry.ingredient) {
            Some(item) => {
                item.quantity_per_unit = entry.quantity_per_unit;
                item.unit = entry.unit;
            }
            None => recipe.push(RecipeItem {
                ingredient: entry.ingredient,
                quantity_per_unit: entry.quantity_per_unit,
                unit: entry.unit,
            }),
        }
    }

    /// The café's built-in recipes.
    pub fn default_menu() -> Self {
        BomTable::from_entries(default_entries())
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Product ids with a recipe, in table order.
    pub fn product_ids(&self) -> impl Iterator<Item = &str> {
        self.products.iter().map(|(id, _)| id.as_str())
    }

    /// Flattens back into storage rows.
    pub fn entries(&self) -> Vec<BomEntry> {
        self.products
            .iter()
            .flat_map(|(product_id, recipe)| {
                recipe.iter().map(move |item| BomEntry {
                    product_id: product_id.clone(),
                    ingredient: item.ingredient.clone(),
                    quantity_per_unit: item.quantity_per_unit,
                    unit: item.unit.clone(),
                })
            })
            .collect()
    }

    /// Distinct ingredients in first-seen order (product order, then
    /// recipe order).
    pub fn ingredients(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for (_, recipe) in &self.products {
            for item in recipe {
                if !seen.iter().any(|s| *s == item.ingredient) {
                    seen.push(item.ingredient.clone());
                }
            }
        }
        seen
    }
}

impl RecipeSource for BomTable {
    fn recipe(&self, product_id: &str) -> &[RecipeItem] {
        self.products
            .iter()
            .find(|(id, _)| id == product_id)
            .map(|(_, recipe)| recipe.as_slice())
            .unwrap_or(&[])
    }
}

/// [`DEFAULT_BOM`] as storage rows.
pub fn default_entries() -> Vec<BomEntry> {
    DEFAULT_BOM
        .iter()
        .flat_map(|(product_id, recipe)| {
            recipe
                .iter()
                .map(move |(ingredient, qty)| BomEntry::new(*product_id, *ingredient, *qty))
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
