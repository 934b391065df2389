//! # Inventory Math
//!
//! The pure half of inventory reconciliation: what a quantity change should
//! be logged as, when incoming stock must be used by, which rows are below
//! safety stock, and the order rows are shown in. The storage half lives in
//! `brewline-db`.
//!
//! ## Change Log Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  previous     current     entry                                         │
//! │  ────────     ───────     ─────                                         │
//! │  None         any         none (row was just created, no old value)     │
//! │  q            q           none (zero delta)                             │
//! │  0            -400        Wasted  400  old 0    new -400                │
//! │  -400         0           Added   400  old -400 new 0   use_before=+7d  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bom::shelf_life_days;
use crate::deduction::Deduction;
use crate::types::{ChangeType, InventoryChange, InventoryRow};
use crate::validation::{validate_ingredient_name, validate_safety_stock, validate_stock_quantity};
use crate::ValidationError;

// =============================================================================
// Quantity Transitions
// =============================================================================

/// Before/after of one atomic quantity update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantityTransition {
    /// `None` when the row did not exist (or had no quantity) before.
    pub previous: Option<f64>,
    pub current: f64,
}

impl QuantityTransition {
    /// Signed change, or `None` when there was no previous value.
    pub fn delta(&self) -> Option<f64> {
        self.previous.map(|old| self.current - old)
    }
}

/// Use-before date for a change entry.
///
/// Only incoming stock (`Added`) of a perishable ingredient gets one.
pub fn use_before(
    ingredient: &str,
    change_type: ChangeType,
    recorded_at: DateTime<Utc>,
) -> Option<NaiveDate> {
    if change_type != ChangeType::Added {
        return None;
    }
    let days = shelf_life_days(ingredient)?;
    Some((recorded_at + Duration::days(days)).date_naive())
}

/// Builds the audit entry for a transition.
///
/// Returns `None` when nothing should be logged: the row had no previous
/// value, or the quantity did not change.
pub fn change_entry(
    ingredient: &str,
    transition: QuantityTransition,
    reference: Option<&str>,
    recorded_at: DateTime<Utc>,
) -> Option<InventoryChange> {
    let old = transition.previous?;
    let delta = transition.current - old;
    let change_type = ChangeType::from_delta(delta)?;

    Some(InventoryChange {
        id: Uuid::new_v4().to_string(),
        ingredient: ingredient.to_string(),
        change_type,
        quantity_changed: delta.abs(),
        old_quantity: old,
        new_quantity: transition.current,
        reference: reference.map(str::to_string),
        recorded_at,
        use_before: use_before(ingredient, change_type, recorded_at),
    })
}

/// What a set of logged changes took out of stock, per ingredient.
///
/// Only `Wasted` entries count. Replaying the result with
/// `DeltaDirection::Add` returns exactly what those entries removed.
pub fn consumed_by(changes: &[InventoryChange]) -> Deduction {
    changes
        .iter()
        .filter(|c| c.change_type == ChangeType::Wasted)
        .map(|c| (c.ingredient.clone(), c.quantity_changed))
        .collect()
}

// =============================================================================
// Admin Edits
// =============================================================================

/// An absolute level set from the admin screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEdit {
    pub ingredient: String,
    pub quantity: f64,
    pub safety_stock: f64,
}

impl InventoryEdit {
    pub fn new(ingredient: impl Into<String>, quantity: f64, safety_stock: f64) -> Self {
        InventoryEdit {
            ingredient: ingredient.into(),
            quantity,
            safety_stock,
        }
    }

    /// Validates and normalises the edit (trims the ingredient name).
    pub fn validated(self) -> Result<Self, ValidationError> {
        let ingredient = validate_ingredient_name(&self.ingredient)?;
        validate_stock_quantity("quantity", self.quantity)?;
        validate_safety_stock(self.safety_stock)?;
        Ok(InventoryEdit { ingredient, ..self })
    }
}

// =============================================================================
// Reporting
// =============================================================================

/// Row of the stock report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockReportRow {
    pub ingredient: String,
    pub quantity: f64,
    pub unit: String,
    pub safety_stock: f64,
    pub below_safety_stock: bool,
}

impl From<&InventoryRow> for StockReportRow {
    fn from(row: &InventoryRow) -> Self {
        StockReportRow {
            ingredient: row.ingredient.clone(),
            quantity: row.quantity,
            unit: row.unit.clone(),
            safety_stock: row.safety_stock,
            below_safety_stock: row.is_below_safety_stock(),
        }
    }
}

pub fn stock_report(rows: &[InventoryRow]) -> Vec<StockReportRow> {
    rows.iter().map(StockReportRow::from).collect()
}

/// Sorts rows for display: BOM ingredients first in `bom_order`, then any
/// other rows alphabetically.
pub fn canonical_order(mut rows: Vec<InventoryRow>, bom_order: &[String]) -> Vec<InventoryRow> {
    rows.sort_by(|a, b| {
        let rank = |name: &str| bom_order.iter().position(|i| i == name);
        match (rank(&a.ingredient), rank(&b.ingredient)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.ingredient.cmp(&b.ingredient),
        }
    });
    rows
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_consumption_entry() {
        let t = QuantityTransition {
            previous: Some(0.0),
            current: -400.0,
        };
        let entry = change_entry("Milk", t, Some("inv-1"), at_noon()).unwrap();

        assert_eq!(entry.change_type, ChangeType::Wasted);
        assert_eq!(entry.quantity_changed, 400.0);
        assert_eq!(entry.old_quantity, 0.0);
        assert_eq!(entry.new_quantity, -400.0);
        assert_eq!(entry.reference.as_deref(), Some("inv-1"));
        assert_eq!(entry.use_before, None);
    }

    #[test]
    fn test_restock_entry_gets_use_before() {
        let t = QuantityTransition {
            previous: Some(-400.0),
            current: 0.0,
        };
        let entry = change_entry("Milk", t, None, at_noon()).unwrap();

        assert_eq!(entry.change_type, ChangeType::Added);
        assert_eq!(entry.use_before, NaiveDate::from_ymd_opt(2024, 3, 8));
    }

    #[test]
    fn test_no_entry_without_previous_or_delta() {
        let fresh = QuantityTransition {
            previous: None,
            current: 36.0,
        };
        assert!(change_entry("Espresso Beans", fresh, None, at_noon()).is_none());
        assert_eq!(fresh.delta(), None);

        let same = QuantityTransition {
            previous: Some(5.0),
            current: 5.0,
        };
        assert!(change_entry("Espresso Beans", same, None, at_noon()).is_none());
    }

    #[test]
    fn test_non_perishable_has_no_use_before() {
        assert_eq!(use_before("Hot Water", ChangeType::Added, at_noon()), None);
        assert_eq!(use_before("Milk", ChangeType::Wasted, at_noon()), None);
        assert_eq!(
            use_before("Espresso Beans", ChangeType::Added, at_noon()),
            NaiveDate::from_ymd_opt(2024, 3, 31)
        );
    }

    #[test]
    fn test_edit_validation() {
        let edit = InventoryEdit::new("  Milk ", 1200.0, 500.0).validated().unwrap();
        assert_eq!(edit.ingredient, "Milk");

        assert!(InventoryEdit::new("Milk", f64::NAN, 0.0).validated().is_err());
        assert!(InventoryEdit::new("Milk", 10.0, -1.0).validated().is_err());
        assert!(InventoryEdit::new(" ", 10.0, 0.0).validated().is_err());
    }

    #[test]
    fn test_stock_report_flags_low_rows() {
        let mut milk = InventoryRow::empty("Milk", "ml");
        milk.safety_stock = 500.0;
        let beans = InventoryRow::empty("Espresso Beans", "g");

        let report = stock_report(&[beans, milk]);
        assert!(!report[0].below_safety_stock);
        assert!(report[1].below_safety_stock);
    }

    #[test]
    fn test_canonical_order() {
        let order = vec!["Espresso Beans".to_string(), "Milk".to_string()];
        let rows = vec![
            InventoryRow::empty("Sugar", "g"),
            InventoryRow::empty("Milk", "ml"),
            InventoryRow::empty("Cinnamon", "g"),
            InventoryRow::empty("Espresso Beans", "g"),
        ];
        let names: Vec<_> = canonical_order(rows, &order)
            .into_iter()
            .map(|r| r.ingredient)
            .collect();
        assert_eq!(names, vec!["Espresso Beans", "Milk", "Cinnamon", "Sugar"]);
    }

    #[test]
    fn test_consumed_by_counts_only_wasted() {
        let sale = |name: &str, old: f64, new: f64| {
            change_entry(
                name,
                QuantityTransition {
                    previous: Some(old),
                    current: new,
                },
                Some("inv-1"),
                at_noon(),
            )
            .unwrap()
        };
        let changes = vec![
            sale("Milk", 1000.0, 800.0),
            sale("Espresso Beans", 500.0, 482.0),
            sale("Milk", 800.0, 650.0),
            // restock of the same reference is ignored
            sale("Milk", 650.0, 1000.0),
        ];

        let consumed = consumed_by(&changes);
        assert_eq!(consumed.len(), 2);
        assert_eq!(consumed.get("Milk"), Some(350.0));
        assert_eq!(consumed.get("Espresso Beans"), Some(18.0));
        assert!(consumed_by(&[]).is_empty());
    }
}
