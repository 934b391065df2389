//! # Domain Types
//!
//! Records that flow between the workflows and the storage layer.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │   InvoiceLine   │   │  InventoryRow   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  order_id       │──►│  invoice_id     │   │  ingredient (PK)│       │
//! │  │  status         │   │  product_id     │   │  quantity (f64) │       │
//! │  │  stock_committed│   │  kitchen_status │   │  safety_stock   │       │
//! │  └────────┬────────┘   └─────────────────┘   └────────┬────────┘       │
//! │           │                                           │                 │
//! │  ┌────────▼────────┐   ┌─────────────────┐   ┌────────▼────────┐       │
//! │  │   OrderLine     │   │    Customer     │   │ InventoryChange │       │
//! │  │  product snapshot│  │  CUST-0001      │   │ Added / Wasted  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Order and invoice lines copy the product name and unit price at the time
//! the line was created, so history survives menu changes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::order::{KitchenStatus, OrderStatus};

// =============================================================================
// Customer
// =============================================================================

/// A café customer, identified at the counter by their customer number
/// (usually a phone number).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Sequential identifier: `CUST-0001`.
    pub customer_id: String,
    /// Business identifier typed at the counter.
    pub customer_number: String,
    pub customer_name: String,
}

/// Customer details as typed at checkout.
///
/// `name` is only consulted when `number` is not yet known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInput {
    pub number: String,
    pub name: Option<String>,
}

impl CustomerInput {
    pub fn new(number: impl Into<String>) -> Self {
        CustomerInput {
            number: number.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Order header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub status: OrderStatus,
    /// Customer is optional until payment.
    pub customer_id: Option<String>,
    pub customer_number: Option<String>,
    pub customer_name: Option<String>,
    /// True once the order's ingredient deduction has been applied to
    /// inventory. Cancellation restocks only when this is set.
    pub stock_committed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line on an order (snapshot of the menu item at the time it was added).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl OrderLine {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// Row of the pending-orders list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: String,
    pub created_at: DateTime<Utc>,
    pub customer_number: Option<String>,
    pub customer_name: Option<String>,
    pub status: OrderStatus,
    pub total_cents: i64,
}

// =============================================================================
// Invoices (billing rows)
// =============================================================================

/// One billed product line. An invoice is every line sharing `invoice_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub invoice_id: String,
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_cents: i64,
    pub kitchen_status: KitchenStatus,
    pub created_at: DateTime<Utc>,
}

/// Row of the kitchen queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceSummary {
    pub invoice_id: String,
    pub order_id: String,
    pub customer_id: String,
    pub kitchen_status: KitchenStatus,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// Row of the billing history view: an invoice line joined with its customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingHistoryRow {
    pub invoice_id: String,
    pub created_at: DateTime<Utc>,
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub customer_number: Option<String>,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_cents: i64,
    pub kitchen_status: KitchenStatus,
}

// =============================================================================
// Inventory
// =============================================================================

/// On-hand stock of one ingredient.
///
/// `quantity` may go negative: selling more than is on hand is recorded,
/// not refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRow {
    pub ingredient: String,
    pub quantity: f64,
    pub unit: String,
    /// Reporting threshold; never enforced.
    pub safety_stock: f64,
}

impl InventoryRow {
    /// A freshly created row: zero stock, zero safety stock.
    pub fn empty(ingredient: impl Into<String>, unit: impl Into<String>) -> Self {
        InventoryRow {
            ingredient: ingredient.into(),
            quantity: 0.0,
            unit: unit.into(),
            safety_stock: 0.0,
        }
    }

    /// True when on-hand quantity is strictly below safety stock.
    #[inline]
    pub fn is_below_safety_stock(&self) -> bool {
        self.quantity < self.safety_stock
    }
}

/// Direction of a logged inventory change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeType {
    /// Stock went up (restock, cancellation refund, admin increase).
    Added,
    /// Stock went down (consumption by a sale, admin decrease).
    Wasted,
}

impl ChangeType {
    /// Classifies a signed delta. Returns `None` for zero.
    pub fn from_delta(delta: f64) -> Option<Self> {
        if delta > 0.0 {
            Some(ChangeType::Added)
        } else if delta < 0.0 {
            Some(ChangeType::Wasted)
        } else {
            None
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Added => "Added",
            ChangeType::Wasted => "Wasted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Added" => Some(ChangeType::Added),
            "Wasted" => Some(ChangeType::Wasted),
            _ => None,
        }
    }
}

/// Append-only audit entry: one per non-zero quantity change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryChange {
    pub id: String,
    pub ingredient: String,
    pub change_type: ChangeType,
    /// Absolute value of the delta.
    pub quantity_changed: f64,
    pub old_quantity: f64,
    pub new_quantity: f64,
    /// Invoice or order that caused the change; `None` for admin edits.
    pub reference: Option<String>,
    pub recorded_at: DateTime<Utc>,
    /// Only set for `Added` entries of perishable ingredients.
    pub use_before: Option<NaiveDate>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_type_from_delta() {
        assert_eq!(ChangeType::from_delta(150.0), Some(ChangeType::Added));
        assert_eq!(ChangeType::from_delta(-36.0), Some(ChangeType::Wasted));
        assert_eq!(ChangeType::from_delta(0.0), None);
    }

    #[test]
    fn test_change_type_round_trips_through_text() {
        for ct in [ChangeType::Added, ChangeType::Wasted] {
            assert_eq!(ChangeType::parse(ct.as_str()), Some(ct));
        }
        assert_eq!(ChangeType::parse("Spilled"), None);
    }

    #[test]
    fn test_below_safety_stock_is_strict() {
        let mut row = InventoryRow::empty("Milk", "ml");
        row.safety_stock = 500.0;
        row.quantity = 499.5;
        assert!(row.is_below_safety_stock());

        row.quantity = 500.0;
        assert!(!row.is_below_safety_stock());
    }
}
