//! Read-only reports: stock levels, billing history, the change log.

use sqlx::Database;

use brewline_core::inventory::{stock_report, StockReportRow};
use brewline_core::{BillingHistoryRow, InventoryChange};

use super::{Cafe, ServiceResult};
use crate::store::{BillingStore, CafeStore, InventoryStore};

impl<DB> Cafe<DB>
where
    DB: Database,
    DB::Connection: CafeStore,
{
    /// Every inventory row, flagged when below its safety stock.
    pub async fn stock_report(&self) -> ServiceResult<Vec<StockReportRow>> {
        Ok(stock_report(&self.inventory().await?))
    }

    /// Only the critical rows of the stock report.
    pub async fn low_stock(&self) -> ServiceResult<Vec<StockReportRow>> {
        let mut rows = self.stock_report().await?;
        rows.retain(|r| r.below_safety_stock);
        Ok(rows)
    }

    /// Invoice lines with their customer, newest first.
    pub async fn billing_history(&self, limit: i64) -> ServiceResult<Vec<BillingHistoryRow>> {
        let mut conn = self.pool.acquire().await?;
        Ok(conn.billing_history(limit.max(0)).await?)
    }

    /// Inventory change log, newest first.
    pub async fn recent_changes(&self, limit: i64) -> ServiceResult<Vec<InventoryChange>> {
        let mut conn = self.pool.acquire().await?;
        Ok(conn.recent_changes(limit.max(0)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::test_cafe;
    use brewline_core::admin::AdminCredentials;
    use brewline_core::cart::Cart;
    use brewline_core::catalog::Catalog;
    use brewline_core::inventory::InventoryEdit;
    use brewline_core::CustomerInput;

    #[tokio::test]
    async fn test_low_stock_flags_rows_below_threshold() {
        let cafe = test_cafe().await;
        cafe.update_inventory_levels(
            &AdminCredentials::new("123", "456"),
            vec![
                InventoryEdit::new("Milk", 100.0, 500.0),
                InventoryEdit::new("Espresso Beans", 1000.0, 250.0),
                // Equal to the threshold is not critical.
                InventoryEdit::new("Chocolate Syrup", 50.0, 50.0),
            ],
        )
        .await
        .unwrap();

        let report = cafe.stock_report().await.unwrap();
        assert_eq!(report.len(), 4);

        let low = cafe.low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].ingredient, "Milk");
    }

    #[tokio::test]
    async fn test_billing_history_newest_first() {
        let cafe = test_cafe().await;
        let catalog = Catalog::menu();

        for (product, number) in [("C1001", "100"), ("C1004", "200")] {
            let mut cart = Cart::new();
            cart.add(catalog.get(product).unwrap(), 1).unwrap();
            cafe.checkout(&cart, &CustomerInput::new(number).with_name("Guest"))
                .await
                .unwrap();
        }

        let history = cafe.billing_history(10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].product_id, "C1004");
        assert_eq!(history[0].customer_number.as_deref(), Some("200"));
        assert_eq!(history[1].product_id, "C1001");

        assert_eq!(cafe.billing_history(1).await.unwrap().len(), 1);
        // 2 sales: beans twice, water once
        assert_eq!(cafe.recent_changes(10).await.unwrap().len(), 3);
    }
}
