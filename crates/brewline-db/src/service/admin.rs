//! # Inventory Administration
//!
//! BOM sync, the destructive reset, and absolute level edits.
//!
//! ## Admin Gate
//! Reset and edits check [`AdminCredentials`] against the configured pair by
//! plain equality. That is a placeholder for a real authentication service
//! in front of this crate, not a security boundary.

use chrono::Utc;
use sqlx::Database;
use tracing::{info, warn};

use brewline_core::admin::AdminCredentials;
use brewline_core::bom::ingredient_unit;
use brewline_core::inventory::{canonical_order, change_entry, InventoryEdit};
use brewline_core::{InventoryChange, InventoryRow};

use super::{load_recipes, Cafe, ServiceResult};
use crate::reconciler::Reconciler;
use crate::store::{CafeStore, InventoryStore};

impl<DB> Cafe<DB>
where
    DB: Database,
    DB::Connection: CafeStore,
{
    /// Makes sure every BOM ingredient has a row. Never deletes.
    ///
    /// Returns the inventory in display order.
    pub async fn sync_inventory_with_bom(&self) -> ServiceResult<Vec<InventoryRow>> {
        let mut tx = self.pool.begin().await?;
        let bom_order = load_recipes(&mut *tx).await?.ingredients();
        let created = Reconciler::new(&mut *tx)
            .ensure_rows_exist(bom_order.iter().map(String::as_str))
            .await?;
        let rows = tx.list_rows().await?;
        tx.commit().await?;

        info!(created, "Synced inventory with BOM");
        Ok(canonical_order(rows, &bom_order))
    }

    /// Deletes every inventory row and reseeds each BOM ingredient at zero.
    pub async fn reset_inventory_from_bom(
        &self,
        credentials: &AdminCredentials,
    ) -> ServiceResult<Vec<InventoryRow>> {
        self.admin.authorize(credentials)?;

        let mut tx = self.pool.begin().await?;
        let bom_order = load_recipes(&mut *tx).await?.ingredients();
        let deleted = tx.delete_all_rows().await?;
        Reconciler::new(&mut *tx)
            .ensure_rows_exist(bom_order.iter().map(String::as_str))
            .await?;
        let rows = tx.list_rows().await?;
        tx.commit().await?;

        warn!(
            admin_id = %credentials.id,
            deleted,
            reseeded = rows.len(),
            "Inventory reset from BOM"
        );
        Ok(canonical_order(rows, &bom_order))
    }

    /// Sets absolute quantity and safety stock per ingredient.
    ///
    /// Every edit is validated before anything is written. Quantity changes
    /// are logged like any other delta.
    pub async fn update_inventory_levels(
        &self,
        credentials: &AdminCredentials,
        edits: Vec<InventoryEdit>,
    ) -> ServiceResult<Vec<InventoryChange>> {
        self.admin.authorize(credentials)?;
        let edits = edits
            .into_iter()
            .map(InventoryEdit::validated)
            .collect::<Result<Vec<_>, _>>()?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut changes = Vec::new();
        for edit in &edits {
            let unit = match tx.get_row(&edit.ingredient).await? {
                Some(row) => row.unit,
                None => ingredient_unit(&edit.ingredient).to_string(),
            };
            let transition = tx
                .set_levels(&edit.ingredient, &unit, edit.quantity, edit.safety_stock)
                .await?;
            if let Some(change) = change_entry(&edit.ingredient, transition, None, now) {
                tx.append_change(&change).await?;
                changes.push(change);
            }
        }
        tx.commit().await?;

        info!(
            admin_id = %credentials.id,
            edits = edits.len(),
            changes = changes.len(),
            "Updated inventory levels"
        );
        Ok(changes)
    }

    /// BOM ingredients in recipe order, then anything else alphabetically.
    pub async fn inventory(&self) -> ServiceResult<Vec<InventoryRow>> {
        let mut conn = self.pool.acquire().await?;
        let bom_order = load_recipes(&mut *conn).await?.ingredients();
        let rows = conn.list_rows().await?;
        Ok(canonical_order(rows, &bom_order))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::test_cafe;
    use super::super::ServiceError;
    use super::*;
    use brewline_core::{ChangeType, CoreError};

    fn admin() -> AdminCredentials {
        AdminCredentials::new("123", "456")
    }

    fn names(rows: &[InventoryRow]) -> Vec<&str> {
        rows.iter().map(|r| r.ingredient.as_str()).collect()
    }

    #[tokio::test]
    async fn test_inventory_in_canonical_order() {
        let cafe = test_cafe().await;
        cafe.update_inventory_levels(&admin(), vec![InventoryEdit::new("Almond Milk", 5.0, 0.0)])
            .await
            .unwrap();

        let rows = cafe.inventory().await.unwrap();
        assert_eq!(
            names(&rows),
            vec!["Espresso Beans", "Milk", "Hot Water", "Chocolate Syrup", "Almond Milk"]
        );
    }

    #[tokio::test]
    async fn test_sync_keeps_existing_rows() {
        let cafe = test_cafe().await;
        cafe.update_inventory_levels(&admin(), vec![InventoryEdit::new("Milk", 750.0, 100.0)])
            .await
            .unwrap();

        let rows = cafe.sync_inventory_with_bom().await.unwrap();
        assert_eq!(rows.len(), 4);
        let milk = rows.iter().find(|r| r.ingredient == "Milk").unwrap();
        assert_eq!(milk.quantity, 750.0);
        assert_eq!(milk.safety_stock, 100.0);
    }

    #[tokio::test]
    async fn test_reset_requires_admin() {
        let cafe = test_cafe().await;
        let err = cafe
            .reset_inventory_from_bom(&AdminCredentials::new("123", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_reset_reseeds_at_zero() {
        let cafe = test_cafe().await;
        cafe.update_inventory_levels(
            &admin(),
            vec![
                InventoryEdit::new("Milk", 750.0, 100.0),
                InventoryEdit::new("Almond Milk", 5.0, 0.0),
            ],
        )
        .await
        .unwrap();

        let rows = cafe.reset_inventory_from_bom(&admin()).await.unwrap();
        assert_eq!(
            names(&rows),
            vec!["Espresso Beans", "Milk", "Hot Water", "Chocolate Syrup"]
        );
        assert!(rows.iter().all(|r| r.quantity == 0.0 && r.safety_stock == 0.0));
        assert_eq!(rows[1].unit, "ml");
    }

    #[tokio::test]
    async fn test_level_edits_are_logged() {
        let cafe = test_cafe().await;
        let changes = cafe
            .update_inventory_levels(
                &admin(),
                vec![
                    InventoryEdit::new("Milk", 1000.0, 200.0),
                    // Unchanged quantity: safety stock only, nothing logged.
                    InventoryEdit::new("Hot Water", 0.0, 50.0),
                ],
            )
            .await
            .unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::Added);
        assert_eq!(changes[0].quantity_changed, 1000.0);
        assert!(changes[0].use_before.is_some());

        let changes = cafe
            .update_inventory_levels(&admin(), vec![InventoryEdit::new("Milk", 700.0, 200.0)])
            .await
            .unwrap();
        assert_eq!(changes[0].change_type, ChangeType::Wasted);
        assert_eq!(changes[0].old_quantity, 1000.0);
        assert_eq!(changes[0].new_quantity, 700.0);
    }

    #[tokio::test]
    async fn test_invalid_edit_writes_nothing() {
        let cafe = test_cafe().await;
        let err = cafe
            .update_inventory_levels(
                &admin(),
                vec![
                    InventoryEdit::new("Milk", 1000.0, 0.0),
                    InventoryEdit::new("Espresso Beans", 10.0, -1.0),
                ],
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let rows = cafe.inventory().await.unwrap();
        assert_eq!(rows[1].quantity, 0.0);
    }
}
