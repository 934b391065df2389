//! # Order & Invoice Status
//!
//! Two small state machines: the order lifecycle at the till and the
//! kitchen lifecycle of a paid invoice.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │              save cart (replace lines)                                  │
//! │                  ┌──────┐                                               │
//! │                  ▼      │                                               │
//! │             ┌─────────┐ │   finalize_payment    ┌────────┐              │
//! │  create ──► │ Pending │─┴─────────────────────► │  Paid  │  (terminal)  │
//! │             └────┬────┘  deduct stock ONCE      └────────┘              │
//! │                  │                                                      │
//! │                  │ cancel (restock if stock_committed)                  │
//! │                  ▼                                                      │
//! │             ┌───────────┐                                               │
//! │             │ Cancelled │  (terminal)                                   │
//! │             └───────────┘                                               │
//! │                                                                         │
//! │  Paid → Paid is REJECTED: an order cannot be paid twice.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Kitchen Lifecycle (per invoice)
//! ```text
//! Ongoing ──► Done
//!    │
//!    └──────► Cancelled   (restocks the invoice's deduction)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order at the till.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Cart being built or parked; no inventory effect.
    #[default]
    Pending,
    /// Paid: invoice written, stock deducted exactly once.
    Paid,
    /// Cancelled before payment.
    Cancelled,
}

impl OrderStatus {
    /// Storage representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "paid" => Some(OrderStatus::Paid),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Cancelled)
    }

    /// Checks that payment may be finalized from this status.
    ///
    /// Only `Pending` may be paid. This is what stops a second payment from
    /// writing a duplicate invoice and deducting stock twice.
    pub fn ensure_payable(&self, order_id: &str) -> CoreResult<()> {
        self.ensure(OrderStatus::Pending, order_id, "finalize payment")
    }

    /// Checks that the order's lines may still be edited.
    pub fn ensure_editable(&self, order_id: &str) -> CoreResult<()> {
        self.ensure(OrderStatus::Pending, order_id, "edit items")
    }

    /// Checks that the order may be cancelled.
    pub fn ensure_cancellable(&self, order_id: &str) -> CoreResult<()> {
        self.ensure(OrderStatus::Pending, order_id, "cancel")
    }

    fn ensure(&self, required: OrderStatus, order_id: &str, action: &'static str) -> CoreResult<()> {
        if *self == required {
            Ok(())
        } else {
            Err(CoreError::InvalidOrderStatus {
                order_id: order_id.to_string(),
                current: *self,
                action,
            })
        }
    }
}

// =============================================================================
// Kitchen Status
// =============================================================================

/// Fulfilment status of a paid invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KitchenStatus {
    /// Paid, still being prepared.
    #[default]
    Ongoing,
    /// Handed over.
    Done,
    /// Voided before it was handed over; stock was returned.
    Cancelled,
}

impl KitchenStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            KitchenStatus::Ongoing => "ongoing",
            KitchenStatus::Done => "done",
            KitchenStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ongoing" => Some(KitchenStatus::Ongoing),
            "done" => Some(KitchenStatus::Done),
            "cancelled" => Some(KitchenStatus::Cancelled),
            _ => None,
        }
    }

    /// Both kitchen transitions start from `Ongoing`.
    pub fn ensure_ongoing(&self, invoice_id: &str, action: &'static str) -> CoreResult<()> {
        if *self == KitchenStatus::Ongoing {
            Ok(())
        } else {
            Err(CoreError::InvalidKitchenStatus {
                invoice_id: invoice_id.to_string(),
                current: *self,
                action,
            })
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(KitchenStatus::default(), KitchenStatus::Ongoing);
    }

    #[test]
    fn test_only_pending_is_payable() {
        assert!(OrderStatus::Pending.ensure_payable("o-1").is_ok());

        let err = OrderStatus::Paid.ensure_payable("o-1").unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidOrderStatus {
                current: OrderStatus::Paid,
                ..
            }
        ));
        assert!(OrderStatus::Cancelled.ensure_payable("o-1").is_err());
    }

    #[test]
    fn test_terminal_states_cannot_be_cancelled_or_edited() {
        for status in [OrderStatus::Paid, OrderStatus::Cancelled] {
            assert!(status.is_terminal());
            assert!(status.ensure_cancellable("o-1").is_err());
            assert!(status.ensure_editable("o-1").is_err());
        }
        assert!(!OrderStatus::Pending.is_terminal());
    }

    #[test]
    fn test_status_text_round_trip() {
        for s in [OrderStatus::Pending, OrderStatus::Paid, OrderStatus::Cancelled] {
            assert_eq!(OrderStatus::parse(s.as_str()), Some(s));
        }
        for s in [KitchenStatus::Ongoing, KitchenStatus::Done, KitchenStatus::Cancelled] {
            assert_eq!(KitchenStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(OrderStatus::parse("Paid"), None);
    }

    #[test]
    fn test_kitchen_transitions_need_ongoing() {
        assert!(KitchenStatus::Ongoing.ensure_ongoing("i-1", "complete").is_ok());
        assert!(KitchenStatus::Done.ensure_ongoing("i-1", "cancel").is_err());
        assert!(KitchenStatus::Cancelled.ensure_ongoing("i-1", "complete").is_err());
    }
}
