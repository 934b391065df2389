//! # Café Workflows
//!
//! Transactional operations behind the counter, the kitchen screen, and the
//! admin page. Each public method owns its transaction: it begins one,
//! runs storage calls on the transaction's connection, and commits only when
//! every step succeeded.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create_order ──► Pending ──save_order_cart──► Pending (lines replaced) │
//! │                     │                                                   │
//! │                     ├── finalize_payment ──► Paid                       │
//! │                     │     invoice lines (Ongoing)                       │
//! │                     │     BOM deduction subtracted, change log          │
//! │                     │     stock_committed = true                        │
//! │                     │                                                   │
//! │                     └── cancel_order ──► Cancelled                      │
//! │                           restock only if stock_committed               │
//! │                                                                         │
//! │  Invoice (kitchen):  Ongoing ──complete_invoice──► Done                 │
//! │                         └─────cancel_invoice────► Cancelled (restock)   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Backends
//! [`Cafe`] is generic over the sqlx database. Any backend whose connection
//! implements [`CafeStore`] gets every workflow.

mod admin;
mod checkout;
mod customers;
mod kitchen;
mod orders;
mod reports;

pub use checkout::Receipt;
pub use orders::OrderDetail;

use serde::Serialize;
use sqlx::{Database, Pool};
use thiserror::Error;
use tracing::info;

use brewline_core::admin::AdminGate;
use brewline_core::bom::{default_entries, BomTable};
use brewline_core::catalog::Catalog;
use brewline_core::{CoreError, InventoryChange, ValidationError};

use crate::error::DbError;
use crate::reconciler::Reconciler;
use crate::store::{BomStore, CafeStore};

// =============================================================================
// Errors
// =============================================================================

/// Where a checkout was when its storage write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckoutStage {
    MarkPaid,
    WriteInvoice,
    DeductStock,
    Commit,
}

impl CheckoutStage {
    pub const fn as_str(&self) -> &'static str {
        match self {
            CheckoutStage::MarkPaid => "mark paid",
            CheckoutStage::WriteInvoice => "write invoice",
            CheckoutStage::DeductStock => "deduct stock",
            CheckoutStage::Commit => "commit",
        }
    }
}

impl std::fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Business rule or validation failure. Nothing was committed.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Billing and inventory could not both be written. The transaction was
    /// rolled back, so neither the invoice nor the deduction is stored.
    #[error("Checkout {reference} aborted at {stage}: {source}")]
    CheckoutAborted {
        reference: String,
        stage: CheckoutStage,
        #[source]
        source: DbError,
    },
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// True for input problems the operator can fix and retry.
    pub fn is_validation(&self) -> bool {
        matches!(self, ServiceError::Core(CoreError::Validation(_)))
    }
}

impl From<ValidationError> for ServiceError {
    fn from(e: ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(e))
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(DbError::from(e))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Cafe
// =============================================================================

/// Result of a cancellation that may have returned stock.
#[derive(Debug, Clone, Serialize)]
pub struct Cancellation {
    /// Order or invoice id.
    pub id: String,
    /// One entry per restocked ingredient; empty when nothing was committed.
    pub restocked: Vec<InventoryChange>,
}

/// What `bootstrap` had to create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub bom_entries_inserted: u64,
    pub inventory_rows_created: usize,
}

/// Workflow entry point for one backend.
pub struct Cafe<DB: Database> {
    pool: Pool<DB>,
    catalog: Catalog,
    admin: AdminGate,
}

impl<DB: Database> Clone for Cafe<DB> {
    fn clone(&self) -> Self {
        Cafe {
            pool: self.pool.clone(),
            catalog: self.catalog,
            admin: self.admin.clone(),
        }
    }
}

impl<DB> Cafe<DB>
where
    DB: Database,
    DB::Connection: CafeStore,
{
    pub fn new(pool: Pool<DB>, admin: AdminGate) -> Self {
        Cafe {
            pool,
            catalog: Catalog::menu(),
            admin,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn pool(&self) -> &Pool<DB> {
        &self.pool
    }

    /// Seeds the BOM when the table is empty. Later calls are no-ops.
    pub async fn seed_bom(&self) -> ServiceResult<u64> {
        let mut tx = self.pool.begin().await?;
        let inserted = seed_bom_in(&mut *tx).await?;
        tx.commit().await?;
        Ok(inserted)
    }

    /// First-run setup: seed the BOM, then make sure every BOM ingredient
    /// has an inventory row.
    pub async fn bootstrap(&self) -> ServiceResult<BootstrapReport> {
        let mut tx = self.pool.begin().await?;

        let bom_entries_inserted = seed_bom_in(&mut *tx).await?;
        let bom = load_recipes(&mut *tx).await?;
        let ingredients = bom.ingredients();
        let inventory_rows_created = Reconciler::new(&mut *tx)
            .ensure_rows_exist(ingredients.iter().map(String::as_str))
            .await?;

        tx.commit().await?;

        info!(
            bom_entries_inserted,
            inventory_rows_created, "Bootstrap complete"
        );
        Ok(BootstrapReport {
            bom_entries_inserted,
            inventory_rows_created,
        })
    }
}

// =============================================================================
// Shared Helpers
// =============================================================================

async fn seed_bom_in<S: BomStore + ?Sized>(store: &mut S) -> ServiceResult<u64> {
    if store.count_bom_entries().await? > 0 {
        return Ok(0);
    }
    let inserted = store.insert_bom_entries(&default_entries()).await?;
    info!(inserted, "Seeded BOM");
    Ok(inserted)
}

/// Loads the stored recipes, seeding the built-in BOM first on a database
/// that has never been initialised. A sale is always costed against a
/// populated table.
async fn load_recipes<S: BomStore + ?Sized>(store: &mut S) -> ServiceResult<BomTable> {
    seed_bom_in(&mut *store).await?;
    Ok(BomTable::from_entries(store.load_bom().await?))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use brewline_core::bom::bom_ingredients;
    use sqlx::Sqlite;

    use crate::pool::{Database, DbConfig};
    use crate::store::InventoryStore;

    /// A cafe over an empty database: no BOM, no inventory rows.
    pub(crate) async fn fresh_cafe() -> Cafe<Sqlite> {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.cafe(AdminGate::default())
    }

    pub(crate) async fn test_cafe() -> Cafe<Sqlite> {
        let cafe = fresh_cafe().await;
        cafe.bootstrap().await.unwrap();
        cafe
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let cafe = db.cafe(AdminGate::default());

        let first = cafe.bootstrap().await.unwrap();
        assert_eq!(first.bom_entries_inserted, 10);
        assert_eq!(first.inventory_rows_created, bom_ingredients().len());

        let second = cafe.bootstrap().await.unwrap();
        assert_eq!(second, BootstrapReport::default());
        assert_eq!(cafe.seed_bom().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bootstrap_creates_zero_rows_with_units() {
        let cafe = test_cafe().await;
        let mut conn = cafe.pool().acquire().await.unwrap();

        let beans = conn.get_row("Espresso Beans").await.unwrap().unwrap();
        assert_eq!(beans.quantity, 0.0);
        assert_eq!(beans.unit, "g");
        assert_eq!(beans.safety_stock, 0.0);
    }

    #[test]
    fn test_validation_errors_are_recoverable() {
        let err: ServiceError = ValidationError::required("customer number").into();
        assert!(err.is_validation());
        assert!(!ServiceError::not_found("Order", "x").is_validation());
    }

    #[test]
    fn test_checkout_aborted_message_names_stage() {
        let err = ServiceError::CheckoutAborted {
            reference: "inv-1".to_string(),
            stage: CheckoutStage::DeductStock,
            source: DbError::QueryFailed("disk I/O error".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("inv-1"));
        assert!(msg.contains("deduct stock"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
