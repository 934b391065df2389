//! # Storage Boundary
//!
//! The small set of storage operations the workflows need, implemented once
//! per backend on the connection type itself.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Reconciler / Cafe workflows                                           │
//! │          │  generic over  S: InventoryStore, DB::Connection: CafeStore  │
//! │          ▼                                                              │
//! │   ┌──────────────┬──────────────┬─────────────┬──────────────┬────────┐ │
//! │   │  BomStore    │InventoryStore│ OrderStore  │ BillingStore │Customer│ │
//! │   └──────┬───────┴──────┬───────┴──────┬──────┴──────┬───────┴───┬────┘ │
//! │          │              │              │             │           │      │
//! │   impl for SqliteConnection (sqlite.rs)   impl for PgConnection         │
//! │                                           (postgres.rs)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Implementing on the connection (not the pool) means every method works
//! equally on a pooled connection and inside a `Transaction`, which derefs
//! to the same connection type. Workflows pick the scope; the store never
//! commits on its own.

pub mod postgres;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use brewline_core::bom::BomEntry;
use brewline_core::inventory::QuantityTransition;
use brewline_core::order::{KitchenStatus, OrderStatus};
use brewline_core::{
    BillingHistoryRow, ChangeType, Customer, InventoryChange, InventoryRow, InvoiceLine,
    InvoiceSummary, Order, OrderLine, OrderSummary,
};

use crate::error::{DbError, DbResult};

// =============================================================================
// Traits
// =============================================================================

/// Recipes, seeded once.
#[async_trait]
pub trait BomStore: Send {
    async fn count_bom_entries(&mut self) -> DbResult<i64>;

    /// Inserts entries, skipping `(product, ingredient)` pairs already present.
    async fn insert_bom_entries(&mut self, entries: &[BomEntry]) -> DbResult<u64>;

    /// All entries, in insertion order.
    async fn load_bom(&mut self) -> DbResult<Vec<BomEntry>>;
}

/// Ingredient rows and the change log.
///
/// Each method is atomic at the single-row level. Callers run multi-row
/// work inside a transaction.
#[async_trait]
pub trait InventoryStore: Send {
    /// Inserts a zero-quantity row unless one exists. Never touches an
    /// existing row. Returns whether a row was created.
    async fn insert_if_absent(&mut self, ingredient: &str, unit: &str) -> DbResult<bool>;

    async fn get_row(&mut self, ingredient: &str) -> DbResult<Option<InventoryRow>>;

    /// Adds a signed `delta` to the row's quantity (creating the row at
    /// `delta` if absent) and reports the before/after. Both values come
    /// from the one write, so the pair is exact without a transaction.
    async fn adjust_quantity(
        &mut self,
        ingredient: &str,
        unit: &str,
        delta: f64,
    ) -> DbResult<QuantityTransition>;

    /// Sets absolute quantity and safety stock (creating the row if absent).
    async fn set_levels(
        &mut self,
        ingredient: &str,
        unit: &str,
        quantity: f64,
        safety_stock: f64,
    ) -> DbResult<QuantityTransition>;

    /// All rows, alphabetical.
    async fn list_rows(&mut self) -> DbResult<Vec<InventoryRow>>;

    async fn delete_all_rows(&mut self) -> DbResult<u64>;

    async fn append_change(&mut self, change: &InventoryChange) -> DbResult<()>;

    /// Newest first.
    async fn recent_changes(&mut self, limit: i64) -> DbResult<Vec<InventoryChange>>;

    /// Every entry written under `reference`, oldest first.
    async fn changes_with_reference(&mut self, reference: &str) -> DbResult<Vec<InventoryChange>>;
}

#[async_trait]
pub trait CustomerStore: Send {
    async fn find_customer(&mut self, number: &str) -> DbResult<Option<Customer>>;

    async fn count_customers(&mut self) -> DbResult<i64>;

    async fn insert_customer(&mut self, customer: &Customer, at: DateTime<Utc>) -> DbResult<()>;
}

#[async_trait]
pub trait OrderStore: Send {
    async fn insert_order(&mut self, order: &Order) -> DbResult<()>;

    /// Header joined with its customer, if any.
    async fn get_order(&mut self, order_id: &str) -> DbResult<Option<Order>>;

    /// Replaces every line of the order.
    async fn replace_order_lines(&mut self, order_id: &str, lines: &[OrderLine]) -> DbResult<()>;

    async fn order_lines(&mut self, order_id: &str) -> DbResult<Vec<OrderLine>>;

    async fn delete_order_lines(&mut self, order_id: &str) -> DbResult<u64>;

    /// Newest first, with line totals.
    async fn orders_with_status(&mut self, status: OrderStatus) -> DbResult<Vec<OrderSummary>>;

    /// Conditional status flip. Returns `false` (and changes nothing) when
    /// the order is not currently in `from`.
    async fn transition_order(
        &mut self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
        at: DateTime<Utc>,
    ) -> DbResult<bool>;

    async fn attach_customer(
        &mut self,
        order_id: &str,
        customer_id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<()>;

    async fn set_stock_committed(
        &mut self,
        order_id: &str,
        committed: bool,
        at: DateTime<Utc>,
    ) -> DbResult<()>;

    async fn touch_order(&mut self, order_id: &str, at: DateTime<Utc>) -> DbResult<()>;
}

#[async_trait]
pub trait BillingStore: Send {
    async fn insert_invoice_line(&mut self, line: &InvoiceLine) -> DbResult<()>;

    async fn invoice_lines(&mut self, invoice_id: &str) -> DbResult<Vec<InvoiceLine>>;

    /// Oldest first, with invoice totals.
    async fn invoices_with_status(
        &mut self,
        status: KitchenStatus,
    ) -> DbResult<Vec<InvoiceSummary>>;

    /// Conditional kitchen status flip for every line of the invoice.
    async fn transition_invoice(
        &mut self,
        invoice_id: &str,
        from: KitchenStatus,
        to: KitchenStatus,
    ) -> DbResult<bool>;

    /// Newest first.
    async fn billing_history(&mut self, limit: i64) -> DbResult<Vec<BillingHistoryRow>>;
}

/// Everything the workflows need from one connection.
pub trait CafeStore: BomStore + InventoryStore + CustomerStore + OrderStore + BillingStore {}

impl<T> CafeStore for T where T: BomStore + InventoryStore + CustomerStore + OrderStore + BillingStore
{}

// =============================================================================
// Row Records (shared by both backends)
// =============================================================================
//
// Enums are stored as TEXT and parsed here, so the same records decode from
// SQLite and Postgres rows.

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BomRecord {
    pub product_id: String,
    pub ingredient: String,
    pub quantity_per_unit: f64,
    pub unit: String,
}

impl From<BomRecord> for BomEntry {
    fn from(r: BomRecord) -> Self {
        BomEntry {
            product_id: r.product_id,
            ingredient: r.ingredient,
            quantity_per_unit: r.quantity_per_unit,
            unit: r.unit,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct InventoryRecord {
    pub ingredient: String,
    pub quantity: f64,
    pub unit: String,
    pub safety_stock: f64,
}

impl From<InventoryRecord> for InventoryRow {
    fn from(r: InventoryRecord) -> Self {
        InventoryRow {
            ingredient: r.ingredient,
            quantity: r.quantity,
            unit: r.unit,
            safety_stock: r.safety_stock,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ChangeRecord {
    pub id: String,
    pub ingredient: String,
    pub change_type: String,
    pub quantity_changed: f64,
    pub old_quantity: f64,
    pub new_quantity: f64,
    pub reference: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub use_before: Option<NaiveDate>,
}

impl TryFrom<ChangeRecord> for InventoryChange {
    type Error = DbError;

    fn try_from(r: ChangeRecord) -> DbResult<Self> {
        let change_type = ChangeType::parse(&r.change_type)
            .ok_or_else(|| DbError::invalid_data("inventory_changes.change_type", &r.change_type))?;
        Ok(InventoryChange {
            id: r.id,
            ingredient: r.ingredient,
            change_type,
            quantity_changed: r.quantity_changed,
            old_quantity: r.old_quantity,
            new_quantity: r.new_quantity,
            reference: r.reference,
            recorded_at: r.recorded_at,
            use_before: r.use_before,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CustomerRecord {
    pub customer_id: String,
    pub customer_number: String,
    pub customer_name: String,
}

impl From<CustomerRecord> for Customer {
    fn from(r: CustomerRecord) -> Self {
        Customer {
            customer_id: r.customer_id,
            customer_number: r.customer_number,
            customer_name: r.customer_name,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderRecord {
    pub order_id: String,
    pub status: String,
    pub customer_id: Option<String>,
    pub customer_number: Option<String>,
    pub customer_name: Option<String>,
    pub stock_committed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRecord> for Order {
    type Error = DbError;

    fn try_from(r: OrderRecord) -> DbResult<Self> {
        Ok(Order {
            status: parse_order_status(&r.status)?,
            order_id: r.order_id,
            customer_id: r.customer_id,
            customer_number: r.customer_number,
            customer_name: r.customer_name,
            stock_committed: r.stock_committed,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderLineRecord {
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl From<OrderLineRecord> for OrderLine {
    fn from(r: OrderLineRecord) -> Self {
        OrderLine {
            order_id: r.order_id,
            product_id: r.product_id,
            product_name: r.product_name,
            quantity: r.quantity,
            unit_price_cents: r.unit_price_cents,
            line_total_cents: r.line_total_cents,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderSummaryRecord {
    pub order_id: String,
    pub created_at: DateTime<Utc>,
    pub customer_number: Option<String>,
    pub customer_name: Option<String>,
    pub status: String,
    pub total_cents: i64,
}

impl TryFrom<OrderSummaryRecord> for OrderSummary {
    type Error = DbError;

    fn try_from(r: OrderSummaryRecord) -> DbResult<Self> {
        Ok(OrderSummary {
            status: parse_order_status(&r.status)?,
            order_id: r.order_id,
            created_at: r.created_at,
            customer_number: r.customer_number,
            customer_name: r.customer_name,
            total_cents: r.total_cents,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct InvoiceLineRecord {
    pub invoice_id: String,
    pub order_id: String,
    pub customer_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_cents: i64,
    pub kitchen_status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<InvoiceLineRecord> for InvoiceLine {
    type Error = DbError;

    fn try_from(r: InvoiceLineRecord) -> DbResult<Self> {
        Ok(InvoiceLine {
            kitchen_status: parse_kitchen_status(&r.kitchen_status)?,
            invoice_id: r.invoice_id,
            order_id: r.order_id,
            customer_id: r.customer_id,
            product_id: r.product_id,
            product_name: r.product_name,
            quantity: r.quantity,
            unit_price_cents: r.unit_price_cents,
            total_cents: r.total_cents,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct InvoiceSummaryRecord {
    pub invoice_id: String,
    pub order_id: String,
    pub customer_id: String,
    pub kitchen_status: String,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<InvoiceSummaryRecord> for InvoiceSummary {
    type Error = DbError;

    fn try_from(r: InvoiceSummaryRecord) -> DbResult<Self> {
        Ok(InvoiceSummary {
            kitchen_status: parse_kitchen_status(&r.kitchen_status)?,
            invoice_id: r.invoice_id,
            order_id: r.order_id,
            customer_id: r.customer_id,
            total_cents: r.total_cents,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct HistoryRecord {
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
    pub kitchen_status: String,
}

impl TryFrom<HistoryRecord> for BillingHistoryRow {
    type Error = DbError;

    fn try_from(r: HistoryRecord) -> DbResult<Self> {
        Ok(BillingHistoryRow {
            kitchen_status: parse_kitchen_status(&r.kitchen_status)?,
            invoice_id: r.invoice_id,
            created_at: r.created_at,
            customer_id: r.customer_id,
            customer_name: r.customer_name,
            customer_number: r.customer_number,
            product_id: r.product_id,
            product_name: r.product_name,
            quantity: r.quantity,
            unit_price_cents: r.unit_price_cents,
            total_cents: r.total_cents,
        })
    }
}

fn parse_order_status(s: &str) -> DbResult<OrderStatus> {
    OrderStatus::parse(s).ok_or_else(|| DbError::invalid_data("orders.status", s))
}

fn parse_kitchen_status(s: &str) -> DbResult<KitchenStatus> {
    KitchenStatus::parse(s).ok_or_else(|| DbError::invalid_data("invoice_lines.kitchen_status", s))
}

/// Converts fetched records, failing on the first undecodable one.
pub(crate) fn convert_all<R, T>(records: Vec<R>) -> DbResult<Vec<T>>
where
    T: TryFrom<R, Error = DbError>,
{
    records.into_iter().map(T::try_from).collect()
}
