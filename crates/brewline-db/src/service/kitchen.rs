//! Kitchen queue: paid invoices waiting to be made.
//!
//! Completing an invoice is a status flip. Cancelling one returns its
//! ingredients to stock, since they were deducted at payment.

use chrono::Utc;
use sqlx::Database;
use tracing::info;

use brewline_core::deduction::DeltaDirection;
use brewline_core::inventory::consumed_by;
use brewline_core::order::KitchenStatus;
use brewline_core::validation::validate_uuid;
use brewline_core::{CoreError, InvoiceLine, InvoiceSummary};

use super::{Cafe, Cancellation, ServiceError, ServiceResult};
use crate::reconciler::Reconciler;
use crate::store::{BillingStore, CafeStore, InventoryStore, OrderStore};

impl<DB> Cafe<DB>
where
    DB: Database,
    DB::Connection: CafeStore,
{
    /// Invoices still being prepared, oldest first.
    pub async fn ongoing_invoices(&self) -> ServiceResult<Vec<InvoiceSummary>> {
        let mut conn = self.pool.acquire().await?;
        Ok(conn.invoices_with_status(KitchenStatus::Ongoing).await?)
    }

    pub async fn invoice(&self, invoice_id: &str) -> ServiceResult<Vec<InvoiceLine>> {
        validate_uuid(invoice_id)?;
        let mut conn = self.pool.acquire().await?;
        let lines = conn.invoice_lines(invoice_id).await?;
        if lines.is_empty() {
            return Err(ServiceError::not_found("Invoice", invoice_id));
        }
        Ok(lines)
    }

    /// Ongoing → Done.
    pub async fn complete_invoice(&self, invoice_id: &str) -> ServiceResult<()> {
        validate_uuid(invoice_id)?;

        let mut tx = self.pool.begin().await?;
        let lines = tx.invoice_lines(invoice_id).await?;
        ensure_ongoing(invoice_id, &lines, "complete")?;

        if !tx
            .transition_invoice(invoice_id, KitchenStatus::Ongoing, KitchenStatus::Done)
            .await?
        {
            return Err(lost_race(invoice_id, "complete"));
        }
        tx.commit().await?;

        info!(invoice_id, "Invoice done");
        Ok(())
    }

    /// Ongoing → Cancelled, restocking what the invoice's payment deducted.
    ///
    /// The order stays Paid; its `stock_committed` flag is cleared so the
    /// same stock is never returned twice.
    pub async fn cancel_invoice(&self, invoice_id: &str) -> ServiceResult<Cancellation> {
        validate_uuid(invoice_id)?;

        let mut tx = self.pool.begin().await?;
        let lines = tx.invoice_lines(invoice_id).await?;
        let order_id = ensure_ongoing(invoice_id, &lines, "cancel")?;

        if !tx
            .transition_invoice(invoice_id, KitchenStatus::Ongoing, KitchenStatus::Cancelled)
            .await?
        {
            return Err(lost_race(invoice_id, "cancel"));
        }

        let now = Utc::now();
        let committed = tx
            .get_order(&order_id)
            .await?
            .is_some_and(|o| o.stock_committed);

        let mut restocked = Vec::new();
        if committed {
            // Hand back what the payment logged, not a fresh recipe lookup.
            let taken = tx.changes_with_reference(invoice_id).await?;
            let deduction = consumed_by(&taken);
            restocked = Reconciler::new(&mut *tx)
                .with_reference(invoice_id)
                .reconcile(&deduction, DeltaDirection::Add, now)
                .await?;
            tx.set_stock_committed(&order_id, false, now).await?;
        }
        tx.commit().await?;

        info!(
            invoice_id,
            order_id = %order_id,
            restocked = restocked.len(),
            "Invoice cancelled"
        );
        Ok(Cancellation {
            id: invoice_id.to_string(),
            restocked,
        })
    }
}

/// Checks the invoice exists and is Ongoing; returns its order id.
fn ensure_ongoing(
    invoice_id: &str,
    lines: &[InvoiceLine],
    action: &'static str,
) -> ServiceResult<String> {
    let first = lines
        .first()
        .ok_or_else(|| ServiceError::not_found("Invoice", invoice_id))?;
    first.kitchen_status.ensure_ongoing(invoice_id, action)?;
    Ok(first.order_id.clone())
}

fn lost_race(invoice_id: &str, action: &'static str) -> ServiceError {
    CoreError::InvalidKitchenStatus {
        invoice_id: invoice_id.to_string(),
        current: KitchenStatus::Done,
        action,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::super::tests::{fresh_cafe, test_cafe};
    use super::*;
    use brewline_core::cart::Cart;
    use brewline_core::catalog::Catalog;
    use brewline_core::{ChangeType, CustomerInput, OrderLine};

    use crate::store::BomStore;

    async fn paid_mocha(cafe: &Cafe<sqlx::Sqlite>) -> String {
        let mut cart = Cart::new();
        cart.add(Catalog::menu().get("C1005").unwrap(), 1).unwrap();
        cafe.checkout(&cart, &CustomerInput::new("42").with_name("Dana"))
            .await
            .unwrap()
            .invoice_id
    }

    #[tokio::test]
    async fn test_queue_and_complete() {
        let cafe = test_cafe().await;
        let invoice_id = paid_mocha(&cafe).await;

        let queue = cafe.ongoing_invoices().await.unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].invoice_id, invoice_id);
        assert_eq!(queue[0].total_cents, 350);

        cafe.complete_invoice(&invoice_id).await.unwrap();
        assert!(cafe.ongoing_invoices().await.unwrap().is_empty());

        let err = cafe.complete_invoice(&invoice_id).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::InvalidKitchenStatus {
                current: KitchenStatus::Done,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_cancel_invoice_restores_stock() {
        let cafe = test_cafe().await;
        {
            let mut conn = cafe.pool().acquire().await.unwrap();
            conn.set_levels("Espresso Beans", "g", 1000.0, 0.0).await.unwrap();
            conn.set_levels("Milk", "ml", 2000.0, 0.0).await.unwrap();
            conn.set_levels("Chocolate Syrup", "g", 500.0, 0.0).await.unwrap();
        }

        let invoice_id = paid_mocha(&cafe).await;
        {
            let mut conn = cafe.pool().acquire().await.unwrap();
            assert_eq!(conn.get_row("Milk").await.unwrap().unwrap().quantity, 1850.0);
        }

        let cancelled = cafe.cancel_invoice(&invoice_id).await.unwrap();
        assert_eq!(cancelled.restocked.len(), 3);
        assert!(cancelled
            .restocked
            .iter()
            .all(|c| c.change_type == ChangeType::Added));

        let mut conn = cafe.pool().acquire().await.unwrap();
        assert_eq!(conn.get_row("Espresso Beans").await.unwrap().unwrap().quantity, 1000.0);
        assert_eq!(conn.get_row("Milk").await.unwrap().unwrap().quantity, 2000.0);
        assert_eq!(conn.get_row("Chocolate Syrup").await.unwrap().unwrap().quantity, 500.0);
        drop(conn);

        // Cannot be cancelled (or restocked) twice.
        assert!(cafe.cancel_invoice(&invoice_id).await.is_err());
        let mut conn = cafe.pool().acquire().await.unwrap();
        assert_eq!(conn.get_row("Milk").await.unwrap().unwrap().quantity, 2000.0);
    }

    #[tokio::test]
    async fn test_done_invoice_cannot_be_cancelled() {
        let cafe = test_cafe().await;
        let invoice_id = paid_mocha(&cafe).await;
        cafe.complete_invoice(&invoice_id).await.unwrap();

        let err = cafe.cancel_invoice(&invoice_id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::InvalidKitchenStatus { .. })));
    }

    #[tokio::test]
    async fn test_unknown_invoice_is_not_found() {
        let cafe = test_cafe().await;
        let id = uuid::Uuid::new_v4().to_string();
        assert!(matches!(
            cafe.complete_invoice(&id).await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
        assert!(matches!(
            cafe.invoice(&id).await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_cancel_after_sale_on_fresh_database_is_exact() {
        // No `init`: the first sale has to seed the BOM itself.
        let cafe = fresh_cafe().await;

        let mut cart = Cart::new();
        cart.add(Catalog::menu().get("C1003").unwrap(), 2).unwrap();
        let receipt = cafe
            .checkout(&cart, &CustomerInput::new("42").with_name("Dana"))
            .await
            .unwrap();
        assert_eq!(receipt.deducted.len(), 2);
        {
            let mut conn = cafe.pool().acquire().await.unwrap();
            assert_eq!(conn.count_bom_entries().await.unwrap(), 10);
            assert_eq!(conn.get_row("Milk").await.unwrap().unwrap().quantity, -400.0);
            assert_eq!(conn.get_row("Espresso Beans").await.unwrap().unwrap().quantity, -36.0);
        }

        let report = cafe.bootstrap().await.unwrap();
        assert_eq!(report.bom_entries_inserted, 0);

        let cancelled = cafe.cancel_invoice(&receipt.invoice_id).await.unwrap();
        assert_eq!(cancelled.restocked.len(), 2);

        let mut conn = cafe.pool().acquire().await.unwrap();
        assert_eq!(conn.get_row("Milk").await.unwrap().unwrap().quantity, 0.0);
        assert_eq!(conn.get_row("Espresso Beans").await.unwrap().unwrap().quantity, 0.0);
        assert_eq!(conn.get_row("Chocolate Syrup").await.unwrap().unwrap().quantity, 0.0);
    }

    #[tokio::test]
    async fn test_cancel_restocks_only_what_was_logged() {
        let cafe = test_cafe().await;
        let order = cafe.create_order().await.unwrap();

        // A product with no recipe: the sale moves no stock.
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

        let receipt = cafe
            .finalize_payment(&order.order_id, &CustomerInput::new("42").with_name("Dana"))
            .await
            .unwrap();
        let mut conn = cafe.pool().acquire().await.unwrap();
        assert!(!conn.get_order(&order.order_id).await.unwrap().unwrap().stock_committed);
        drop(conn);

        let cancelled = cafe.cancel_invoice(&receipt.invoice_id).await.unwrap();
        assert!(cancelled.restocked.is_empty());
        assert!(cafe.recent_changes(10).await.unwrap().is_empty());
    }
}
