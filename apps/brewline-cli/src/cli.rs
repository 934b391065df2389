//! Command-line surface.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "brewline", about = "Café point of sale and inventory", version)]
pub struct Cli {
    /// Config file (default: ./brewline.toml if present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Seed the BOM and create missing inventory rows
    Init,
    /// Show the menu
    Menu,
    /// Bill a cart in one step
    Checkout(CheckoutArgs),
    #[command(subcommand)]
    Order(OrderCommand),
    #[command(subcommand)]
    Kitchen(KitchenCommand),
    #[command(subcommand)]
    Inventory(InventoryCommand),
    #[command(subcommand)]
    Report(ReportCommand),
}

#[derive(Debug, Args)]
pub struct CustomerArgs {
    /// Customer number (phone)
    #[arg(long = "customer", value_name = "NUMBER")]
    pub number: String,
    /// Name, required the first time a number is seen
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Product and quantity, e.g. `C1003=2` (quantity defaults to 1)
    #[arg(long = "item", value_name = "PRODUCT[=QTY]", required = true, value_parser = parse_item)]
    pub items: Vec<(String, i64)>,
    #[command(flatten)]
    pub customer: CustomerArgs,
}

#[derive(Debug, Subcommand)]
pub enum OrderCommand {
    /// Open an empty order
    New,
    /// Add a product to a pending order
    Add {
        order_id: String,
        product_id: String,
        #[arg(long, default_value_t = 1)]
        qty: i64,
    },
    /// Set a line's quantity (0 removes it)
    Set {
        order_id: String,
        product_id: String,
        qty: i64,
    },
    Show {
        order_id: String,
    },
    /// Pending orders, newest first
    List,
    Pay {
        order_id: String,
        #[command(flatten)]
        customer: CustomerArgs,
    },
    Cancel {
        order_id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum KitchenCommand {
    /// Invoices being prepared, oldest first
    List,
    Show {
        invoice_id: String,
    },
    Done {
        invoice_id: String,
    },
    /// Void an invoice and return its ingredients to stock
    Cancel {
        invoice_id: String,
    },
}

#[derive(Debug, Args)]
pub struct AdminArgs {
    #[arg(long = "admin-id", env = "BREWLINE_ADMIN_ID")]
    pub id: String,
    #[arg(long = "admin-password", env = "BREWLINE_ADMIN_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Subcommand)]
pub enum InventoryCommand {
    List,
    /// Create rows for BOM ingredients that lack one
    Sync,
    /// Delete all rows and reseed BOM ingredients at zero
    Reset {
        #[command(flatten)]
        admin: AdminArgs,
    },
    /// Set absolute quantity and safety stock
    Set {
        ingredient: String,
        quantity: f64,
        #[arg(long, default_value_t = 0.0)]
        safety: f64,
        #[command(flatten)]
        admin: AdminArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    Stock,
    /// Rows below safety stock
    Low,
    History {
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
    Changes {
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },
}

/// `C1003=2` → `("C1003", 2)`; `C1003` → `("C1003", 1)`.
fn parse_item(s: &str) -> Result<(String, i64), String> {
    let (product, qty) = match s.split_once('=') {
        Some((product, qty)) => {
            let qty = qty
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("invalid quantity in '{s}'"))?;
            (product, qty)
        }
        None => (s, 1),
    };
    let product = product.trim();
    if product.is_empty() {
        return Err(format!("missing product id in '{s}'"));
    }
    Ok((product.to_string(), qty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item() {
        assert_eq!(parse_item("C1003=2").unwrap(), ("C1003".to_string(), 2));
        assert_eq!(parse_item("C1001").unwrap(), ("C1001".to_string(), 1));
        assert!(parse_item("C1003=two").is_err());
        assert!(parse_item("=2").is_err());
    }

    #[test]
    fn test_checkout_args() {
        let cli = Cli::try_parse_from([
            "brewline",
            "--json",
            "checkout",
            "--item",
            "C1003=2",
            "--item",
            "C1005",
            "--customer",
            "0300-1234567",
            "--name",
            "Alice",
        ])
        .unwrap();
        assert!(cli.json);
        let Command::Checkout(args) = cli.command else {
            panic!("expected checkout");
        };
        assert_eq!(args.items.len(), 2);
        assert_eq!(args.customer.number, "0300-1234567");
        assert_eq!(args.customer.name.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_checkout_needs_an_item() {
        assert!(Cli::try_parse_from(["brewline", "checkout", "--customer", "1"]).is_err());
    }

    #[test]
    fn test_inventory_set_args() {
        let cli = Cli::try_parse_from([
            "brewline",
            "inventory",
            "set",
            "Milk",
            "1500",
            "--safety",
            "300",
            "--admin-id",
            "123",
            "--admin-password",
            "456",
        ])
        .unwrap();
        let Command::Inventory(InventoryCommand::Set {
            ingredient,
            quantity,
            safety,
            admin,
        }) = cli.command
        else {
            panic!("expected inventory set");
        };
        assert_eq!(ingredient, "Milk");
        assert_eq!(quantity, 1500.0);
        assert_eq!(safety, 300.0);
        assert_eq!(admin.id, "123");
    }
}
