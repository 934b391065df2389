//! # Inventory Reconciler
//!
//! Makes sure every referenced ingredient has an inventory row, then
//! applies a deduction in a given direction and writes one audit entry per
//! non-zero change.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Deduction {Espresso Beans: 36, Milk: 400}, direction Subtract          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. ensure_rows_exist  ── INSERT ... ON CONFLICT DO NOTHING per name    │
//! │       │                  (unit from the ingredient table, qty 0)        │
//! │       ▼   happens-before                                                │
//! │  2. apply_delta        ── per ingredient: atomic read-modify-write      │
//! │       │                   Milk: 0 → -400                                │
//! │       ▼                                                                 │
//! │  3. change log         ── Wasted 400, old 0, new -400                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Step 2 is one upsert per ingredient that returns the quantity it
//! replaced alongside the new one, so the logged old/new pair is exact even
//! on a plain pooled connection with other writers about. A transaction is
//! only needed when a whole cart must land or fail together; checkout and
//! the cancellations pass their transaction's connection for that.

use chrono::{DateTime, Utc};
use tracing::debug;

use brewline_core::bom::ingredient_unit;
use brewline_core::deduction::{Deduction, DeltaDirection};
use brewline_core::inventory::change_entry;
use brewline_core::InventoryChange;

use crate::error::DbResult;
use crate::store::InventoryStore;

/// Applies deductions to one store connection.
pub struct Reconciler<'s, S: InventoryStore + ?Sized> {
    store: &'s mut S,
    reference: Option<String>,
}

impl<'s, S: InventoryStore + ?Sized> Reconciler<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Reconciler {
            store,
            reference: None,
        }
    }

    /// Invoice or order id recorded on every change entry.
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Creates a zero-quantity row for each ingredient that lacks one.
    /// Existing rows are left untouched. Returns how many rows were created.
    pub async fn ensure_rows_exist<'a, I>(&mut self, ingredients: I) -> DbResult<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut created = 0;
        for ingredient in ingredients {
            if self
                .store
                .insert_if_absent(ingredient, ingredient_unit(ingredient))
                .await?
            {
                debug!(ingredient, "Created inventory row");
                created += 1;
            }
        }
        Ok(created)
    }

    /// Applies `deduction` in `direction` and logs each change.
    ///
    /// Zero totals are skipped. A row that did not exist beforehand is
    /// created at the delta and not logged (there is no old value).
    pub async fn apply_delta(
        &mut self,
        deduction: &Deduction,
        direction: DeltaDirection,
        at: DateTime<Utc>,
    ) -> DbResult<Vec<InventoryChange>> {
        let mut changes = Vec::with_capacity(deduction.len());
        for (ingredient, total) in deduction.iter() {
            if total == 0.0 {
                continue;
            }
            let transition = self
                .store
                .adjust_quantity(ingredient, ingredient_unit(ingredient), direction.signed(total))
                .await?;

            if let Some(change) =
                change_entry(ingredient, transition, self.reference.as_deref(), at)
            {
                self.store.append_change(&change).await?;
                changes.push(change);
            }
        }
        Ok(changes)
    }

    /// `ensure_rows_exist` for every ingredient in the deduction, then
    /// `apply_delta`.
    pub async fn reconcile(
        &mut self,
        deduction: &Deduction,
        direction: DeltaDirection,
        at: DateTime<Utc>,
    ) -> DbResult<Vec<InventoryChange>> {
        if deduction.is_empty() {
            return Ok(Vec::new());
        }
        self.ensure_rows_exist(deduction.ingredients()).await?;
        self.apply_delta(deduction, direction, at).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use brewline_core::bom::BomTable;
    use brewline_core::deduction::{compute_deduction, DeductionLine};
    use brewline_core::ChangeType;

    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn milk(qty: f64) -> Deduction {
        std::iter::once(("Milk".to_string(), qty)).collect()
    }

    #[tokio::test]
    async fn test_ensure_rows_exist_is_idempotent() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let mut reconciler = Reconciler::new(&mut *conn);
        assert_eq!(reconciler.ensure_rows_exist(["Milk", "Espresso Beans"]).await.unwrap(), 2);
        reconciler
            .apply_delta(&milk(250.0), DeltaDirection::Add, Utc::now())
            .await
            .unwrap();

        let mut reconciler = Reconciler::new(&mut *conn);
        assert_eq!(reconciler.ensure_rows_exist(["Milk", "Espresso Beans"]).await.unwrap(), 0);

        let row = conn.get_row("Milk").await.unwrap().unwrap();
        assert_eq!(row.quantity, 250.0);
        assert_eq!(row.unit, "ml");
    }

    #[tokio::test]
    async fn test_unknown_ingredient_gets_empty_unit() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        Reconciler::new(&mut *conn)
            .ensure_rows_exist(["Oat Milk"])
            .await
            .unwrap();
        let row = conn.get_row("Oat Milk").await.unwrap().unwrap();
        assert_eq!(row.unit, "");
        assert_eq!(row.quantity, 0.0);
    }

    #[tokio::test]
    async fn test_sale_from_empty_goes_negative_and_logs_once() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let mut reconciler = Reconciler::new(&mut *conn).with_reference("inv-1");
        reconciler.ensure_rows_exist(["Milk"]).await.unwrap();
        let changes = reconciler
            .apply_delta(&milk(400.0), DeltaDirection::Subtract, Utc::now())
            .await
            .unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::Wasted);
        assert_eq!(changes[0].old_quantity, 0.0);
        assert_eq!(changes[0].new_quantity, -400.0);
        assert_eq!(changes[0].quantity_changed, 400.0);
        assert_eq!(changes[0].reference.as_deref(), Some("inv-1"));

        assert_eq!(conn.get_row("Milk").await.unwrap().unwrap().quantity, -400.0);
        assert_eq!(conn.recent_changes(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_subtract_then_add_round_trips() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        conn.set_levels("Milk", "ml", 1000.0, 0.0).await.unwrap();

        let mut reconciler = Reconciler::new(&mut *conn);
        reconciler
            .reconcile(&milk(400.0), DeltaDirection::Subtract, Utc::now())
            .await
            .unwrap();
        reconciler
            .reconcile(&milk(400.0), DeltaDirection::Add, Utc::now())
            .await
            .unwrap();

        assert_eq!(conn.get_row("Milk").await.unwrap().unwrap().quantity, 1000.0);

        let log = conn.recent_changes(10).await.unwrap();
        assert_eq!(log.len(), 2);
        // newest first
        assert_eq!(log[0].change_type, ChangeType::Added);
        assert!(log[0].use_before.is_some());
        assert_eq!(log[1].change_type, ChangeType::Wasted);
        assert!(log[1].use_before.is_none());
    }

    #[tokio::test]
    async fn test_missing_row_is_created_without_log() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let changes = Reconciler::new(&mut *conn)
            .apply_delta(&milk(150.0), DeltaDirection::Add, Utc::now())
            .await
            .unwrap();

        assert!(changes.is_empty());
        assert_eq!(conn.get_row("Milk").await.unwrap().unwrap().quantity, 150.0);
        assert!(conn.recent_changes(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_and_zero_deductions_are_noops() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let mut reconciler = Reconciler::new(&mut *conn);
        let none = reconciler
            .reconcile(&Deduction::new(), DeltaDirection::Subtract, Utc::now())
            .await
            .unwrap();
        assert!(none.is_empty());

        let zero = reconciler
            .reconcile(&milk(0.0), DeltaDirection::Subtract, Utc::now())
            .await
            .unwrap();
        assert!(zero.is_empty());
        assert!(conn.recent_changes(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_latte_cart_deduction() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let bom = BomTable::default_menu();
        let deduction = compute_deduction(&[DeductionLine::new("C1003", 2)], &bom);
        let changes = Reconciler::new(&mut *conn)
            .reconcile(&deduction, DeltaDirection::Subtract, Utc::now())
            .await
            .unwrap();

        assert_eq!(changes.len(), 2);
        assert_eq!(conn.get_row("Espresso Beans").await.unwrap().unwrap().quantity, -36.0);
        assert_eq!(conn.get_row("Milk").await.unwrap().unwrap().quantity, -400.0);
    }

    #[tokio::test]
    async fn test_concurrent_sales_log_exact_transitions() {
        let path = std::env::temp_dir().join(format!("brewline-{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(4))
            .await
            .unwrap();
        {
            let mut conn = db.pool().acquire().await.unwrap();
            conn.set_levels("Milk", "ml", 1000.0, 0.0).await.unwrap();
        }

        let mut sales = Vec::new();
        for i in 0..20 {
            let pool = db.pool().clone();
            sales.push(tokio::spawn(async move {
                let mut conn = pool.acquire().await.unwrap();
                Reconciler::new(&mut *conn)
                    .with_reference(format!("inv-{i}"))
                    .apply_delta(&milk(10.0), DeltaDirection::Subtract, Utc::now())
                    .await
                    .unwrap()
            }));
        }
        for sale in sales {
            assert_eq!(sale.await.unwrap().len(), 1);
        }

        let mut conn = db.pool().acquire().await.unwrap();
        assert_eq!(conn.get_row("Milk").await.unwrap().unwrap().quantity, 800.0);

        let log = conn.recent_changes(50).await.unwrap();
        assert_eq!(log.len(), 20);
        assert!(log.iter().all(|c| c.old_quantity - c.new_quantity == 10.0));
        // Each sale saw a different starting level: no two read the same row.
        let mut olds: Vec<i64> = log.iter().map(|c| c.old_quantity as i64).collect();
        olds.sort_unstable();
        olds.dedup();
        assert_eq!(olds.len(), 20);
        drop(conn);

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }

    #[tokio::test]
    async fn test_fractional_transition_is_exact() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        conn.set_levels("Chocolate Syrup", "g", 0.1, 0.0).await.unwrap();

        let syrup: Deduction = std::iter::once(("Chocolate Syrup".to_string(), 0.2)).collect();
        let changes = Reconciler::new(&mut *conn)
            .apply_delta(&syrup, DeltaDirection::Add, Utc::now())
            .await
            .unwrap();

        assert_eq!(changes[0].old_quantity, 0.1);
        assert_eq!(changes[0].new_quantity, 0.1 + 0.2);
    }
}
