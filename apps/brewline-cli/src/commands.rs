//! # Command Handlers
//!
//! One handler per subcommand, generic over the backend. Each calls a single
//! workflow on [`Cafe`] and prints the result as text or, with `--json`, as
//! pretty JSON.

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::Database;

use brewline_core::admin::AdminCredentials;
use brewline_core::cart::Cart;
use brewline_core::inventory::{InventoryEdit, StockReportRow};
use brewline_core::{CustomerInput, InventoryChange, InventoryRow, Money};
use brewline_db::{Cafe, CafeStore, Cancellation, OrderDetail, Receipt};

use crate::cli::{
    AdminArgs, CheckoutArgs, Command, CustomerArgs, InventoryCommand, KitchenCommand,
    OrderCommand, ReportCommand,
};

pub async fn run<DB>(cafe: &Cafe<DB>, command: Command, json: bool) -> Result<()>
where
    DB: Database,
    DB::Connection: CafeStore,
{
    match command {
        Command::Init => {
            let report = cafe.bootstrap().await?;
            emit(json, &report, |r| {
                println!(
                    "BOM rows inserted: {}, inventory rows created: {}",
                    r.bom_entries_inserted, r.inventory_rows_created
                )
            })
        }
        Command::Menu => emit(json, cafe.catalog().products(), |products| {
            for p in products.iter() {
                println!("{:<24} {:>8}", p.label(), p.price);
            }
        }),
        Command::Checkout(args) => checkout(cafe, args, json).await,
        Command::Order(command) => order(cafe, command, json).await,
        Command::Kitchen(command) => kitchen(cafe, command, json).await,
        Command::Inventory(command) => inventory(cafe, command, json).await,
        Command::Report(command) => report(cafe, command, json).await,
    }
}

async fn checkout<DB>(cafe: &Cafe<DB>, args: CheckoutArgs, json: bool) -> Result<()>
where
    DB: Database,
    DB::Connection: CafeStore,
{
    let mut cart = Cart::new();
    for (product_id, qty) in &args.items {
        cart.add(cafe.catalog().get(product_id)?, *qty)?;
    }
    let receipt = cafe
        .checkout(&cart, &customer_input(args.customer))
        .await
        .context("checkout failed")?;
    emit(json, &receipt, print_receipt)
}

async fn order<DB>(cafe: &Cafe<DB>, command: OrderCommand, json: bool) -> Result<()>
where
    DB: Database,
    DB::Connection: CafeStore,
{
    match command {
        OrderCommand::New => {
            let order = cafe.create_order().await?;
            emit(json, &order, |o| println!("{}", o.order_id))
        }
        OrderCommand::Add {
            order_id,
            product_id,
            qty,
        } => {
            let mut cart = cafe.load_order(&order_id).await?.cart();
            cart.add(cafe.catalog().get(&product_id)?, qty)?;
            let detail = cafe.save_order_cart(&order_id, &cart).await?;
            emit(json, &detail, print_order)
        }
        OrderCommand::Set {
            order_id,
            product_id,
            qty,
        } => {
            let mut cart = cafe.load_order(&order_id).await?.cart();
            cart.update(&product_id, qty)?;
            let detail = cafe.save_order_cart(&order_id, &cart).await?;
            emit(json, &detail, print_order)
        }
        OrderCommand::Show { order_id } => {
            let detail = cafe.load_order(&order_id).await?;
            emit(json, &detail, print_order)
        }
        OrderCommand::List => {
            let orders = cafe.list_pending_orders().await?;
            emit(json, &orders, |orders| {
                for o in orders {
                    println!(
                        "{}  {}  {:<20} {:>8}",
                        o.order_id,
                        o.created_at.format("%Y-%m-%d %H:%M"),
                        o.customer_name.as_deref().unwrap_or("-"),
                        Money::from_cents(o.total_cents)
                    );
                }
            })
        }
        OrderCommand::Pay { order_id, customer } => {
            let receipt = cafe
                .finalize_payment(&order_id, &customer_input(customer))
                .await
                .with_context(|| format!("payment for order {order_id} failed"))?;
            emit(json, &receipt, print_receipt)
        }
        OrderCommand::Cancel { order_id } => {
            let cancellation = cafe.cancel_order(&order_id).await?;
            emit(json, &cancellation, print_cancellation)
        }
    }
}

async fn kitchen<DB>(cafe: &Cafe<DB>, command: KitchenCommand, json: bool) -> Result<()>
where
    DB: Database,
    DB::Connection: CafeStore,
{
    match command {
        KitchenCommand::List => {
            let queue = cafe.ongoing_invoices().await?;
            emit(json, &queue, |queue| {
                for i in queue {
                    println!(
                        "{}  {}  {:<10} {:>8}",
                        i.invoice_id,
                        i.created_at.format("%H:%M"),
                        i.customer_id,
                        Money::from_cents(i.total_cents)
                    );
                }
            })
        }
        KitchenCommand::Show { invoice_id } => {
            let lines = cafe.invoice(&invoice_id).await?;
            emit(json, &lines, |lines| {
                for l in lines {
                    println!("{:>3} × {:<12} {:?}", l.quantity, l.product_name, l.kitchen_status);
                }
            })
        }
        KitchenCommand::Done { invoice_id } => {
            cafe.complete_invoice(&invoice_id).await?;
            emit(json, &invoice_id, |id| println!("Invoice {id} done"))
        }
        KitchenCommand::Cancel { invoice_id } => {
            let cancellation = cafe.cancel_invoice(&invoice_id).await?;
            emit(json, &cancellation, print_cancellation)
        }
    }
}

async fn inventory<DB>(cafe: &Cafe<DB>, command: InventoryCommand, json: bool) -> Result<()>
where
    DB: Database,
    DB::Connection: CafeStore,
{
    match command {
        InventoryCommand::List => emit(json, &cafe.inventory().await?, print_rows),
        InventoryCommand::Sync => emit(json, &cafe.sync_inventory_with_bom().await?, print_rows),
        InventoryCommand::Reset { admin } => {
            let rows = cafe.reset_inventory_from_bom(&credentials(admin)).await?;
            emit(json, &rows, print_rows)
        }
        InventoryCommand::Set {
            ingredient,
            quantity,
            safety,
            admin,
        } => {
            let changes = cafe
                .update_inventory_levels(
                    &credentials(admin),
                    vec![InventoryEdit::new(ingredient, quantity, safety)],
                )
                .await?;
            emit(json, &changes, print_changes)
        }
    }
}

async fn report<DB>(cafe: &Cafe<DB>, command: ReportCommand, json: bool) -> Result<()>
where
    DB: Database,
    DB::Connection: CafeStore,
{
    match command {
        ReportCommand::Stock => emit(json, &cafe.stock_report().await?, print_stock),
        ReportCommand::Low => emit(json, &cafe.low_stock().await?, print_stock),
        ReportCommand::History { limit } => {
            let rows = cafe.billing_history(limit).await?;
            emit(json, &rows, |rows| {
                for r in rows {
                    println!(
                        "{}  {:<20} {:>3} × {:<12} {:>8}  {:?}",
                        r.created_at.format("%Y-%m-%d %H:%M"),
                        r.customer_name.as_deref().unwrap_or(&r.customer_id),
                        r.quantity,
                        r.product_name,
                        Money::from_cents(r.total_cents),
                        r.kitchen_status
                    );
                }
            })
        }
        ReportCommand::Changes { limit } => {
            emit(json, &cafe.recent_changes(limit).await?, print_changes)
        }
    }
}

// =============================================================================
// Output
// =============================================================================

fn emit<T: Serialize + ?Sized>(json: bool, value: &T, text: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text(value);
    }
    Ok(())
}

fn customer_input(args: CustomerArgs) -> CustomerInput {
    CustomerInput {
        number: args.number,
        name: args.name,
    }
}

fn credentials(args: AdminArgs) -> AdminCredentials {
    AdminCredentials::new(args.id, args.password)
}

fn print_receipt(r: &Receipt) {
    println!("Invoice  {}", r.invoice_id);
    println!("Order    {}", r.order_id);
    println!(
        "Customer {} ({})",
        r.customer.customer_name, r.customer.customer_id
    );
    for l in &r.lines {
        println!(
            "  {:>3} × {:<12} {:>8}",
            l.quantity,
            l.product_name,
            Money::from_cents(l.total_cents)
        );
    }
    println!("Total    {}", r.total());
}

fn print_order(d: &OrderDetail) {
    println!("Order {} ({:?})", d.order.order_id, d.order.status);
    for l in &d.lines {
        println!("  {:>3} × {:<12} {:>8}", l.quantity, l.product_name, l.line_total());
    }
    println!("Total {}", d.total());
}

fn print_cancellation(c: &Cancellation) {
    println!("Cancelled {}", c.id);
    print_changes(&c.restocked);
}

fn print_rows(rows: &Vec<InventoryRow>) {
    for r in rows {
        println!(
            "{:<16} {:>10.1} {:<3} (safety {:.1})",
            r.ingredient, r.quantity, r.unit, r.safety_stock
        );
    }
}

fn print_stock(rows: &Vec<StockReportRow>) {
    for r in rows {
        let flag = if r.below_safety_stock { "  LOW" } else { "" };
        println!(
            "{:<16} {:>10.1} {:<3} / {:.1}{}",
            r.ingredient, r.quantity, r.unit, r.safety_stock, flag
        );
    }
}

fn print_changes(changes: &Vec<InventoryChange>) {
    for c in changes {
        let use_before = c
            .use_before
            .map(|d| format!("  use before {d}"))
            .unwrap_or_default();
        println!(
            "{:<16} {:?} {:.1}  {:.1} → {:.1}{}",
            c.ingredient, c.change_type, c.quantity_changed, c.old_quantity, c.new_quantity, use_before
        );
    }
}
