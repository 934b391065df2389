//! # Checkout
//!
//! Payment of an order: status flip, invoice rows, and the inventory
//! deduction, all on one transaction.
//!
//! ## Steps
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  load order ─► ensure Pending ─► lines non-empty ─► resolve customer    │
//! │       ─► load recipes (seeds the BOM on a fresh database)               │
//! │       │              (plain errors up to here)                          │
//! │       ▼                                                                 │
//! │  MarkPaid      pending → paid (conditional UPDATE), attach customer     │
//! │  WriteInvoice  one invoice line per order line, kitchen = ongoing       │
//! │  DeductStock   ensure rows, subtract deduction, change log,             │
//! │                stock_committed = true if anything was deducted          │
//! │  Commit                                                                 │
//! │                                                                         │
//! │  A storage failure from MarkPaid on becomes CheckoutAborted and the     │
//! │  transaction is rolled back: no invoice without its deduction.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Database;
use tracing::{error, info};
use uuid::Uuid;

use brewline_core::cart::Cart;
use brewline_core::deduction::{compute_deduction, DeltaDirection};
use brewline_core::order::{KitchenStatus, OrderStatus};
use brewline_core::validation::{validate_cart_size, validate_customer_number};
use brewline_core::{
    CoreError, Customer, CustomerInput, InventoryChange, InvoiceLine, Money, Order, OrderLine,
    ValidationError,
};

use super::customers::resolve_in;
use super::orders::order_lines_from_cart;
use super::{load_recipes, Cafe, CheckoutStage, ServiceError, ServiceResult};
use crate::error::{DbError, DbResult};
use crate::reconciler::Reconciler;
use crate::store::{BillingStore, CafeStore, OrderStore};

/// What the customer is handed after paying.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub invoice_id: String,
    pub order_id: String,
    pub customer: Customer,
    pub lines: Vec<InvoiceLine>,
    pub total_cents: i64,
    /// Inventory changes written by this payment.
    pub deducted: Vec<InventoryChange>,
    pub paid_at: DateTime<Utc>,
}

impl Receipt {
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

impl<DB> Cafe<DB>
where
    DB: Database,
    DB::Connection: CafeStore,
{
    /// Bills a cart in one step: creates the order, then pays it.
    ///
    /// An empty cart or a missing customer number is a validation error and
    /// nothing is stored.
    pub async fn checkout(&self, cart: &Cart, customer: &CustomerInput) -> ServiceResult<Receipt> {
        cart.ensure_not_empty()?;
        validate_cart_size(cart.lines().len())?;
        validate_customer_number(&customer.number)?;

        let now = Utc::now();
        let order = Order {
            order_id: Uuid::new_v4().to_string(),
            status: OrderStatus::Pending,
            customer_id: None,
            customer_number: None,
            customer_name: None,
            stock_committed: false,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;
        tx.insert_order(&order).await?;
        tx.replace_order_lines(&order.order_id, &order_lines_from_cart(&order.order_id, cart))
            .await?;

        let receipt = pay_in(&mut *tx, &order.order_id, customer, now).await?;
        tx.commit()
            .await
            .map_err(|e| aborted(&order.order_id, CheckoutStage::Commit, e.into()))?;

        log_paid(&receipt);
        Ok(receipt)
    }
}

/// Pays a Pending order on an open transaction.
pub(crate) async fn pay_in<S: CafeStore + ?Sized>(
    store: &mut S,
    order_id: &str,
    input: &CustomerInput,
    at: DateTime<Utc>,
) -> ServiceResult<Receipt> {
    let order = store
        .get_order(order_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Order", order_id))?;
    order.status.ensure_payable(order_id)?;

    let lines = store.order_lines(order_id).await?;
    if lines.is_empty() {
        return Err(ValidationError::Empty {
            field: "order".to_string(),
        }
        .into());
    }

    let customer = resolve_in(&mut *store, input, at).await?;

    let bom = load_recipes(&mut *store).await?;
    let deduction = compute_deduction(&Cart::from_order_lines(&lines).to_deduction_input(), &bom);
    let invoice_id = Uuid::new_v4().to_string();

    // MarkPaid
    let flipped = store
        .transition_order(order_id, OrderStatus::Pending, OrderStatus::Paid, at)
        .await
        .map_err(|e| aborted(order_id, CheckoutStage::MarkPaid, e))?;
    if !flipped {
        let current = store
            .get_order(order_id)
            .await?
            .map_or(OrderStatus::Paid, |o| o.status);
        return Err(CoreError::InvalidOrderStatus {
            order_id: order_id.to_string(),
            current,
            action: "finalize payment",
        }
        .into());
    }
    store
        .attach_customer(order_id, &customer.customer_id, at)
        .await
        .map_err(|e| aborted(order_id, CheckoutStage::MarkPaid, e))?;

    // WriteInvoice
    let invoice = invoice_lines(&invoice_id, &customer, &lines, at);
    write_invoice(&mut *store, &invoice)
        .await
        .map_err(|e| aborted(order_id, CheckoutStage::WriteInvoice, e))?;

    // DeductStock
    let deducted = Reconciler::new(&mut *store)
        .with_reference(invoice_id.as_str())
        .reconcile(&deduction, DeltaDirection::Subtract, at)
        .await
        .map_err(|e| aborted(order_id, CheckoutStage::DeductStock, e))?;
    // Only a logged deduction is ever handed back by a cancellation.
    if !deducted.is_empty() {
        store
            .set_stock_committed(order_id, true, at)
            .await
            .map_err(|e| aborted(order_id, CheckoutStage::DeductStock, e))?;
    }

    let total_cents = invoice.iter().map(|l| l.total_cents).sum();
    Ok(Receipt {
        invoice_id,
        order_id: order_id.to_string(),
        customer,
        lines: invoice,
        total_cents,
        deducted,
        paid_at: at,
    })
}

fn invoice_lines(
    invoice_id: &str,
    customer: &Customer,
    lines: &[OrderLine],
    at: DateTime<Utc>,
) -> Vec<InvoiceLine> {
    lines
        .iter()
        .map(|l| InvoiceLine {
            invoice_id: invoice_id.to_string(),
            order_id: l.order_id.clone(),
            customer_id: customer.customer_id.clone(),
            product_id: l.product_id.clone(),
            product_name: l.product_name.clone(),
            quantity: l.quantity,
            unit_price_cents: l.unit_price_cents,
            total_cents: l.line_total_cents,
            kitchen_status: KitchenStatus::Ongoing,
            created_at: at,
        })
        .collect()
}

async fn write_invoice<S: CafeStore + ?Sized>(store: &mut S, lines: &[InvoiceLine]) -> DbResult<()> {
    for line in lines {
        store.insert_invoice_line(line).await?;
    }
    Ok(())
}

/// Logs and wraps a storage failure that hit after billing began.
pub(crate) fn aborted(reference: &str, stage: CheckoutStage, source: DbError) -> ServiceError {
    error!(
        reference,
        stage = %stage,
        error = %source,
        "Checkout aborted; rolling back invoice and inventory together"
    );
    ServiceError::CheckoutAborted {
        reference: reference.to_string(),
        stage,
        source,
    }
}

pub(crate) fn log_paid(receipt: &Receipt) {
    info!(
        order_id = %receipt.order_id,
        invoice_id = %receipt.invoice_id,
        customer_id = %receipt.customer.customer_id,
        total = %receipt.total(),
        changes = receipt.deducted.len(),
        "Order paid"
    );
}

#[cfg(test)]
mod tests {
    use super::super::tests::test_cafe;
    use super::*;
    use brewline_core::catalog::Catalog;
    use brewline_core::ChangeType;

    use crate::store::InventoryStore;

    fn cart(items: &[(&str, i64)]) -> Cart {
        let catalog = Catalog::menu();
        let mut cart = Cart::new();
        for (id, qty) in items {
            cart.add(catalog.get(id).unwrap(), *qty).unwrap();
        }
        cart
    }

    fn alice() -> CustomerInput {
        CustomerInput::new("0300-1111111").with_name("Alice")
    }

    #[tokio::test]
    async fn test_checkout_bills_and_deducts() {
        let cafe = test_cafe().await;

        let receipt = cafe
            .checkout(&cart(&[("C1003", 2), ("C1001", 1)]), &alice())
            .await
            .unwrap();

        assert_eq!(receipt.lines.len(), 2);
        assert_eq!(receipt.total_cents, 2 * 320 + 250);
        assert_eq!(receipt.customer.customer_id, "CUST-0001");

        let mut conn = cafe.pool().acquire().await.unwrap();
        // 2 lattes + 1 espresso = 54 g beans, 400 ml milk
        assert_eq!(conn.get_row("Espresso Beans").await.unwrap().unwrap().quantity, -54.0);
        assert_eq!(conn.get_row("Milk").await.unwrap().unwrap().quantity, -400.0);

        let order = conn.get_order(&receipt.order_id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert!(order.stock_committed);
        assert_eq!(order.customer_name.as_deref(), Some("Alice"));

        let invoice = conn.invoice_lines(&receipt.invoice_id).await.unwrap();
        assert_eq!(invoice.len(), 2);
        assert!(invoice.iter().all(|l| l.kitchen_status == KitchenStatus::Ongoing));

        let changes = conn.recent_changes(10).await.unwrap();
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.change_type == ChangeType::Wasted));
        assert!(changes
            .iter()
            .all(|c| c.reference.as_deref() == Some(receipt.invoice_id.as_str())));
    }

    #[tokio::test]
    async fn test_empty_cart_is_validation_error() {
        let cafe = test_cafe().await;
        let err = cafe.checkout(&Cart::new(), &alice()).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_missing_customer_commits_nothing() {
        let cafe = test_cafe().await;

        let err = cafe
            .checkout(&cart(&[("C1003", 1)]), &CustomerInput::new(""))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        // Unknown number and no name: fails inside the transaction.
        let err = cafe
            .checkout(&cart(&[("C1003", 1)]), &CustomerInput::new("999"))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        assert!(cafe.billing_history(10).await.unwrap().is_empty());
        assert!(cafe.recent_changes(10).await.unwrap().is_empty());
        let mut conn = cafe.pool().acquire().await.unwrap();
        assert!(conn.orders_with_status(OrderStatus::Paid).await.unwrap().is_empty());
        assert_eq!(conn.get_row("Milk").await.unwrap().unwrap().quantity, 0.0);
    }

    #[tokio::test]
    async fn test_product_without_recipe_deducts_nothing() {
        let cafe = test_cafe().await;
        let order = cafe.create_order().await.unwrap();

        // A line for a product the BOM has never heard of.
        let mut conn = cafe.pool().acquire().await.unwrap();
        conn.replace_order_lines(
            &order.order_id,
            &[OrderLine {
                order_id: order.order_id.clone(),
                product_id: "SEASONAL".to_string(),
                product_name: "Seasonal Special".to_string(),
                quantity: 1,
                unit_price_cents: 400,
                line_total_cents: 400,
            }],
        )
        .await
        .unwrap();
        drop(conn);

        let receipt = cafe.finalize_payment(&order.order_id, &alice()).await.unwrap();
        assert_eq!(receipt.total_cents, 400);
        assert!(receipt.deducted.is_empty());
    }

    #[tokio::test]
    async fn test_failed_stock_write_rolls_back_whole_sale() {
        let cafe = test_cafe().await;
        {
            let mut conn = cafe.pool().acquire().await.unwrap();
            sqlx::query(
                "CREATE TRIGGER fail_stock BEFORE UPDATE ON inventory \
                 BEGIN SELECT RAISE(ABORT, 'disk full'); END",
            )
            .execute(&mut *conn)
            .await
            .unwrap();
        }

        let err = cafe
            .checkout(&cart(&[("C1003", 2)]), &alice())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::CheckoutAborted {
                stage: CheckoutStage::DeductStock,
                ..
            }
        ));

        // Nothing from the sale survives: no invoice, no order, no stock move.
        let mut conn = cafe.pool().acquire().await.unwrap();
        assert!(conn.billing_history(10).await.unwrap().is_empty());
        assert!(conn.recent_changes(10).await.unwrap().is_empty());
        assert!(conn.orders_with_status(OrderStatus::Paid).await.unwrap().is_empty());
        assert!(conn.orders_with_status(OrderStatus::Pending).await.unwrap().is_empty());
        assert_eq!(conn.get_row("Milk").await.unwrap().unwrap().quantity, 0.0);
    }
}
