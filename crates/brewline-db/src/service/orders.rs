//! # Orders
//!
//! Pending orders built up over several visits to the counter, then paid
//! or cancelled.

use chrono::Utc;
use serde::Serialize;
use sqlx::Database;
use tracing::{debug, info};
use uuid::Uuid;

use brewline_core::cart::Cart;
use brewline_core::deduction::{compute_deduction, DeltaDirection};
use brewline_core::order::OrderStatus;
use brewline_core::validation::{validate_cart_size, validate_customer_number, validate_uuid};
use brewline_core::{CoreError, CustomerInput, Money, Order, OrderLine, OrderSummary};

use super::checkout::{aborted, log_paid, pay_in};
use super::{load_recipes, Cafe, Cancellation, CheckoutStage, Receipt, ServiceError, ServiceResult};
use crate::reconciler::Reconciler;
use crate::store::{CafeStore, OrderStore};

/// An order header with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub total_cents: i64,
}

impl OrderDetail {
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// The lines as an editable cart.
    pub fn cart(&self) -> Cart {
        Cart::from_order_lines(&self.lines)
    }
}

/// Snapshots cart lines as order lines.
pub(crate) fn order_lines_from_cart(order_id: &str, cart: &Cart) -> Vec<OrderLine> {
    cart.lines()
        .iter()
        .map(|l| OrderLine {
            order_id: order_id.to_string(),
            product_id: l.product_id.clone(),
            product_name: l.product_name.clone(),
            quantity: l.quantity,
            unit_price_cents: l.unit_price_cents,
            line_total_cents: l.line_total().cents(),
        })
        .collect()
}

impl<DB> Cafe<DB>
where
    DB: Database,
    DB::Connection: CafeStore,
{
    /// Opens an empty Pending order.
    pub async fn create_order(&self) -> ServiceResult<Order> {
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

        let mut conn = self.pool.acquire().await?;
        conn.insert_order(&order).await?;

        info!(order_id = %order.order_id, "Created order");
        Ok(order)
    }

    /// Replaces the order's lines with the cart. Only Pending orders can be
    /// edited. An empty cart clears the order.
    pub async fn save_order_cart(&self, order_id: &str, cart: &Cart) -> ServiceResult<OrderDetail> {
        validate_uuid(order_id)?;
        validate_cart_size(cart.lines().len())?;

        let mut tx = self.pool.begin().await?;
        let order = tx
            .get_order(order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))?;
        order.status.ensure_editable(order_id)?;

        let lines = order_lines_from_cart(order_id, cart);
        let now = Utc::now();
        tx.replace_order_lines(order_id, &lines).await?;
        tx.touch_order(order_id, now).await?;
        tx.commit().await?;

        debug!(order_id, lines = lines.len(), "Saved order cart");
        let total_cents = lines.iter().map(|l| l.line_total_cents).sum();
        Ok(OrderDetail {
            order: Order {
                updated_at: now,
                ..order
            },
            lines,
            total_cents,
        })
    }

    pub async fn load_order(&self, order_id: &str) -> ServiceResult<OrderDetail> {
        validate_uuid(order_id)?;

        let mut conn = self.pool.acquire().await?;
        let order = conn
            .get_order(order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))?;
        let lines = conn.order_lines(order_id).await?;
        let total_cents = lines.iter().map(|l| l.line_total_cents).sum();

        Ok(OrderDetail {
            order,
            lines,
            total_cents,
        })
    }

    /// Pending orders, newest first.
    pub async fn list_pending_orders(&self) -> ServiceResult<Vec<OrderSummary>> {
        let mut conn = self.pool.acquire().await?;
        Ok(conn.orders_with_status(OrderStatus::Pending).await?)
    }

    /// Pays a Pending order.
    ///
    /// Any other state is rejected, so paying twice never writes a second
    /// invoice or deducts stock twice.
    pub async fn finalize_payment(
        &self,
        order_id: &str,
        customer: &CustomerInput,
    ) -> ServiceResult<Receipt> {
        validate_uuid(order_id)?;
        validate_customer_number(&customer.number)?;

        let mut tx = self.pool.begin().await?;
        let receipt = pay_in(&mut *tx, order_id, customer, Utc::now()).await?;
        tx.commit()
            .await
            .map_err(|e| aborted(order_id, CheckoutStage::Commit, e.into()))?;

        log_paid(&receipt);
        Ok(receipt)
    }

    /// Cancels a Pending order and deletes its lines.
    ///
    /// If the order's stock had been committed, its deduction is added back
    /// in the same transaction.
    pub async fn cancel_order(&self, order_id: &str) -> ServiceResult<Cancellation> {
        validate_uuid(order_id)?;

        let mut tx = self.pool.begin().await?;
        let order = tx
            .get_order(order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))?;
        order.status.ensure_cancellable(order_id)?;

        let now = Utc::now();
        let mut restocked = Vec::new();
        if order.stock_committed {
            let lines = tx.order_lines(order_id).await?;
            let bom = load_recipes(&mut *tx).await?;
            let deduction =
                compute_deduction(&Cart::from_order_lines(&lines).to_deduction_input(), &bom);
            restocked = Reconciler::new(&mut *tx)
                .with_reference(order_id)
                .reconcile(&deduction, DeltaDirection::Add, now)
                .await?;
            tx.set_stock_committed(order_id, false, now).await?;
        }

        if !tx
            .transition_order(order_id, OrderStatus::Pending, OrderStatus::Cancelled, now)
            .await?
        {
            return Err(CoreError::InvalidOrderStatus {
                order_id: order_id.to_string(),
                current: order.status,
                action: "cancel",
            }
            .into());
        }
        tx.delete_order_lines(order_id).await?;
        tx.commit().await?;

        info!(order_id, restocked = restocked.len(), "Cancelled order");
        Ok(Cancellation {
            id: order_id.to_string(),
            restocked,
        })
    }
}
