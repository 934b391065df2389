//! # SQLite Store
//!
//! Storage traits for the embedded file store.
//!
//! ## Atomicity
//! `insert_if_absent` is a single `INSERT ... ON CONFLICT DO NOTHING`.
//! `adjust_quantity` and `set_levels` are one upsert each that copies the
//! current quantity into `previous_quantity` and returns both columns, so
//! the before/after pair comes from the same write on any connection, with
//! or without a surrounding transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use brewline_core::bom::BomEntry;
use brewline_core::inventory::QuantityTransition;
use brewline_core::order::{KitchenStatus, OrderStatus};
use brewline_core::{
    BillingHistoryRow, Customer, InventoryChange, InventoryRow, InvoiceLine, InvoiceSummary,
    Order, OrderLine, OrderSummary,
};

use super::{
    convert_all, BillingStore, BomRecord, BomStore, ChangeRecord, CustomerRecord, CustomerStore,
    HistoryRecord, InventoryRecord, InventoryStore, InvoiceLineRecord, InvoiceSummaryRecord,
    OrderLineRecord, OrderRecord, OrderStore, OrderSummaryRecord,
};
use crate::error::DbResult;

// =============================================================================
// BOM
// =============================================================================

#[async_trait]
impl BomStore for SqliteConnection {
    async fn count_bom_entries(&mut self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bom")
            .fetch_one(&mut *self)
            .await?;
        Ok(count)
    }

    async fn insert_bom_entries(&mut self, entries: &[BomEntry]) -> DbResult<u64> {
        let mut inserted = 0;
        for entry in entries {
            let result = sqlx::query(
                r#"
                INSERT INTO bom (product_id, ingredient, quantity_per_unit, unit)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT (product_id, ingredient) DO NOTHING
                "#,
            )
            .bind(&entry.product_id)
            .bind(&entry.ingredient)
            .bind(entry.quantity_per_unit)
            .bind(&entry.unit)
            .execute(&mut *self)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    async fn load_bom(&mut self) -> DbResult<Vec<BomEntry>> {
        let records: Vec<BomRecord> = sqlx::query_as(
            r#"
            SELECT product_id, ingredient, quantity_per_unit, unit
            FROM bom
            ORDER BY rowid
            "#,
        )
        .fetch_all(&mut *self)
        .await?;
        Ok(records.into_iter().map(Into::into).collect())
    }
}

// =============================================================================
// Inventory
// =============================================================================

#[async_trait]
impl InventoryStore for SqliteConnection {
    async fn insert_if_absent(&mut self, ingredient: &str, unit: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO inventory (ingredient, quantity, unit, safety_stock)
            VALUES (?1, 0, ?2, 0)
            ON CONFLICT (ingredient) DO NOTHING
            "#,
        )
        .bind(ingredient)
        .bind(unit)
        .execute(&mut *self)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_row(&mut self, ingredient: &str) -> DbResult<Option<InventoryRow>> {
        let record: Option<InventoryRecord> = sqlx::query_as(
            r#"
            SELECT ingredient, quantity, unit, safety_stock
            FROM inventory
            WHERE ingredient = ?1
            "#,
        )
        .bind(ingredient)
        .fetch_optional(&mut *self)
        .await?;
        Ok(record.map(Into::into))
    }

    async fn adjust_quantity(
        &mut self,
        ingredient: &str,
        unit: &str,
        delta: f64,
    ) -> DbResult<QuantityTransition> {
        let (previous, current): (Option<f64>, f64) = sqlx::query_as(
            r#"
            INSERT INTO inventory (ingredient, quantity, unit, safety_stock)
            VALUES (?1, ?2, ?3, 0)
            ON CONFLICT (ingredient) DO UPDATE SET
                previous_quantity = inventory.quantity,
                quantity = inventory.quantity + excluded.quantity
            RETURNING previous_quantity, quantity
            "#,
        )
        .bind(ingredient)
        .bind(delta)
        .bind(unit)
        .fetch_one(&mut *self)
        .await?;

        debug!(ingredient, delta, ?previous, current, "Adjusted inventory quantity");
        Ok(QuantityTransition { previous, current })
    }

    async fn set_levels(
        &mut self,
        ingredient: &str,
        unit: &str,
        quantity: f64,
        safety_stock: f64,
    ) -> DbResult<QuantityTransition> {
        let (previous, current): (Option<f64>, f64) = sqlx::query_as(
            r#"
            INSERT INTO inventory (ingredient, quantity, unit, safety_stock)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (ingredient) DO UPDATE SET
                previous_quantity = inventory.quantity,
                quantity = excluded.quantity,
                safety_stock = excluded.safety_stock
            RETURNING previous_quantity, quantity
            "#,
        )
        .bind(ingredient)
        .bind(quantity)
        .bind(unit)
        .bind(safety_stock)
        .fetch_one(&mut *self)
        .await?;

        debug!(ingredient, quantity, safety_stock, "Set inventory levels");
        Ok(QuantityTransition { previous, current })
    }

    async fn list_rows(&mut self) -> DbResult<Vec<InventoryRow>> {
        let records: Vec<InventoryRecord> = sqlx::query_as(
            r#"
            SELECT ingredient, quantity, unit, safety_stock
            FROM inventory
            ORDER BY ingredient
            "#,
        )
        .fetch_all(&mut *self)
        .await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    async fn delete_all_rows(&mut self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM inventory")
            .execute(&mut *self)
            .await?;
        Ok(result.rows_affected())
    }

    async fn append_change(&mut self, change: &InventoryChange) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory_changes (
                id, ingredient, change_type, quantity_changed,
                old_quantity, new_quantity, reference, recorded_at, use_before
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&change.id)
        .bind(&change.ingredient)
        .bind(change.change_type.as_str())
        .bind(change.quantity_changed)
        .bind(change.old_quantity)
        .bind(change.new_quantity)
        .bind(&change.reference)
        .bind(change.recorded_at)
        .bind(change.use_before)
        .execute(&mut *self)
        .await?;
        Ok(())
    }

    async fn recent_changes(&mut self, limit: i64) -> DbResult<Vec<InventoryChange>> {
        let records: Vec<ChangeRecord> = sqlx::query_as(
            r#"
            SELECT id, ingredient, change_type, quantity_changed,
                   old_quantity, new_quantity, reference, recorded_at, use_before
            FROM inventory_changes
            ORDER BY seq DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *self)
        .await?;
        convert_all(records)
    }

    async fn changes_with_reference(&mut self, reference: &str) -> DbResult<Vec<InventoryChange>> {
        let records: Vec<ChangeRecord> = sqlx::query_as(
            r#"
            SELECT id, ingredient, change_type, quantity_changed,
                   old_quantity, new_quantity, reference, recorded_at, use_before
            FROM inventory_changes
            WHERE reference = ?1
            ORDER BY seq
            "#,
        )
        .bind(reference)
        .fetch_all(&mut *self)
        .await?;
        convert_all(records)
    }
}

// =============================================================================
// Customers
// =============================================================================

#[async_trait]
impl CustomerStore for SqliteConnection {
    async fn find_customer(&mut self, number: &str) -> DbResult<Option<Customer>> {
        let record: Option<CustomerRecord> = sqlx::query_as(
            r#"
            SELECT customer_id, customer_number, customer_name
            FROM customers
            WHERE customer_number = ?1
            "#,
        )
        .bind(number)
        .fetch_optional(&mut *self)
        .await?;
        Ok(record.map(Into::into))
    }

    async fn count_customers(&mut self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&mut *self)
            .await?;
        Ok(count)
    }

    async fn insert_customer(&mut self, customer: &Customer, at: DateTime<Utc>) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO customers (customer_id, customer_number, customer_name, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&customer.customer_id)
        .bind(&customer.customer_number)
        .bind(&customer.customer_name)
        .bind(at)
        .execute(&mut *self)
        .await?;
        Ok(())
    }
}

// =============================================================================
// Orders
// =============================================================================

#[async_trait]
impl OrderStore for SqliteConnection {
    async fn insert_order(&mut self, order: &Order) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (order_id, status, customer_id, stock_committed, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&order.order_id)
        .bind(order.status.as_str())
        .bind(&order.customer_id)
        .bind(order.stock_committed)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *self)
        .await?;
        Ok(())
    }

    async fn get_order(&mut self, order_id: &str) -> DbResult<Option<Order>> {
        let record: Option<OrderRecord> = sqlx::query_as(
            r#"
            SELECT o.order_id, o.status, o.customer_id,
                   c.customer_number, c.customer_name,
                   o.stock_committed, o.created_at, o.updated_at
            FROM orders o
            LEFT JOIN customers c ON c.customer_id = o.customer_id
            WHERE o.order_id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_optional(&mut *self)
        .await?;
        record.map(Order::try_from).transpose()
    }

    async fn replace_order_lines(&mut self, order_id: &str, lines: &[OrderLine]) -> DbResult<()> {
        sqlx::query("DELETE FROM order_lines WHERE order_id = ?1")
            .bind(order_id)
            .execute(&mut *self)
            .await?;

        for (line_no, line) in lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_lines (
                    order_id, line_no, product_id, product_name,
                    quantity, unit_price_cents, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(order_id)
            .bind(line_no as i64)
            .bind(&line.product_id)
            .bind(&line.product_name)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.line_total_cents)
            .execute(&mut *self)
            .await?;
        }
        Ok(())
    }

    async fn order_lines(&mut self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let records: Vec<OrderLineRecord> = sqlx::query_as(
            r#"
            SELECT order_id, product_id, product_name,
                   quantity, unit_price_cents, line_total_cents
            FROM order_lines
            WHERE order_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *self)
        .await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    async fn delete_order_lines(&mut self, order_id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM order_lines WHERE order_id = ?1")
            .bind(order_id)
            .execute(&mut *self)
            .await?;
        Ok(result.rows_affected())
    }

    async fn orders_with_status(&mut self, status: OrderStatus) -> DbResult<Vec<OrderSummary>> {
        let records: Vec<OrderSummaryRecord> = sqlx::query_as(
            r#"
            SELECT o.order_id, o.created_at, c.customer_number, c.customer_name, o.status,
                   COALESCE((SELECT SUM(l.line_total_cents)
                             FROM order_lines l
                             WHERE l.order_id = o.order_id), 0) AS total_cents
            FROM orders o
            LEFT JOIN customers c ON c.customer_id = o.customer_id
            WHERE o.status = ?1
            ORDER BY o.created_at DESC, o.rowid DESC
            "#,
        )
        .bind(status.as_str())
        .fetch_all(&mut *self)
        .await?;
        convert_all(records)
    }

    async fn transition_order(
        &mut self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET status = ?3, updated_at = ?4
            WHERE order_id = ?1 AND status = ?2
            "#,
        )
        .bind(order_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(at)
        .execute(&mut *self)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn attach_customer(
        &mut self,
        order_id: &str,
        customer_id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query("UPDATE orders SET customer_id = ?2, updated_at = ?3 WHERE order_id = ?1")
            .bind(order_id)
            .bind(customer_id)
            .bind(at)
            .execute(&mut *self)
            .await?;
        Ok(())
    }

    async fn set_stock_committed(
        &mut self,
        order_id: &str,
        committed: bool,
        at: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query("UPDATE orders SET stock_committed = ?2, updated_at = ?3 WHERE order_id = ?1")
            .bind(order_id)
            .bind(committed)
            .bind(at)
            .execute(&mut *self)
            .await?;
        Ok(())
    }

    async fn touch_order(&mut self, order_id: &str, at: DateTime<Utc>) -> DbResult<()> {
        sqlx::query("UPDATE orders SET updated_at = ?2 WHERE order_id = ?1")
            .bind(order_id)
            .bind(at)
            .execute(&mut *self)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Billing
// =============================================================================

#[async_trait]
impl BillingStore for SqliteConnection {
    async fn insert_invoice_line(&mut self, line: &InvoiceLine) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO invoice_lines (
                invoice_id, order_id, customer_id, product_id, product_name,
                quantity, unit_price_cents, total_cents, kitchen_status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&line.invoice_id)
        .bind(&line.order_id)
        .bind(&line.customer_id)
        .bind(&line.product_id)
        .bind(&line.product_name)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.total_cents)
        .bind(line.kitchen_status.as_str())
        .bind(line.created_at)
        .execute(&mut *self)
        .await?;
        Ok(())
    }

    async fn invoice_lines(&mut self, invoice_id: &str) -> DbResult<Vec<InvoiceLine>> {
        let records: Vec<InvoiceLineRecord> = sqlx::query_as(
            r#"
            SELECT invoice_id, order_id, customer_id, product_id, product_name,
                   quantity, unit_price_cents, total_cents, kitchen_status, created_at
            FROM invoice_lines
            WHERE invoice_id = ?1
            ORDER BY seq
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&mut *self)
        .await?;
        convert_all(records)
    }

    async fn invoices_with_status(
        &mut self,
        status: KitchenStatus,
    ) -> DbResult<Vec<InvoiceSummary>> {
        let records: Vec<InvoiceSummaryRecord> = sqlx::query_as(
            r#"
            SELECT invoice_id, MIN(order_id) AS order_id, MIN(customer_id) AS customer_id,
                   MIN(kitchen_status) AS kitchen_status,
                   COALESCE(SUM(total_cents), 0) AS total_cents,
                   MIN(created_at) AS created_at
            FROM invoice_lines
            WHERE kitchen_status = ?1
            GROUP BY invoice_id
            ORDER BY MIN(seq)
            "#,
        )
        .bind(status.as_str())
        .fetch_all(&mut *self)
        .await?;
        convert_all(records)
    }

    async fn transition_invoice(
        &mut self,
        invoice_id: &str,
        from: KitchenStatus,
        to: KitchenStatus,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE invoice_lines SET kitchen_status = ?3
            WHERE invoice_id = ?1 AND kitchen_status = ?2
            "#,
        )
        .bind(invoice_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&mut *self)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn billing_history(&mut self, limit: i64) -> DbResult<Vec<BillingHistoryRow>> {
        let records: Vec<HistoryRecord> = sqlx::query_as(
            r#"
            SELECT i.invoice_id, i.created_at, i.customer_id,
                   c.customer_name, c.customer_number,
                   i.product_id, i.product_name, i.quantity,
                   i.unit_price_cents, i.total_cents, i.kitchen_status
            FROM invoice_lines i
            LEFT JOIN customers c ON c.customer_id = i.customer_id
            ORDER BY i.seq DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *self)
        .await?;
        convert_all(records)
    }
}
