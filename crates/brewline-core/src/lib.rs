//! # brewline-core: Pure Business Logic for Brewline
//!
//! This crate holds the café's business rules as pure functions with zero I/O
//! dependencies. Storage and workflows live in `brewline-db`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Brewline Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Operator surface (brewline CLI)                 │   │
//! │  │     checkout, orders, kitchen queue, inventory admin, reports   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               brewline-db (workflows + storage)                 │   │
//! │  │        Reconciler • Checkout • Orders • SQLite / Postgres       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ brewline-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌────────┐ ┌────────┐  │   │
//! │  │   │ catalog │ │   bom   │ │ deduction │ │  cart  │ │ order  │  │   │
//! │  │   └─────────┘ └─────────┘ └───────────┘ └────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`catalog`] - The fixed café menu
//! - [`bom`] - Bill of materials: product → ingredient quantities
//! - [`deduction`] - Cart → total ingredient consumption
//! - [`inventory`] - Stock rows, change-log math, safety stock
//! - [`cart`] - The order being built
//! - [`order`] - Order and invoice status transitions
//! - [`money`] - Integer-cent money type
//! - [`admin`] - Placeholder admin credential gate
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use brewline_core::bom::BomTable;
//! use brewline_core::deduction::{compute_deduction, DeductionLine};
//!
//! let bom = BomTable::default_menu();
//! let deduction = compute_deduction(&[DeductionLine::new("C1003", 2)], &bom);
//!
//! assert_eq!(deduction.get("Espresso Beans"), Some(36.0));
//! assert_eq!(deduction.get("Milk"), Some(400.0));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod admin;
pub mod bom;
pub mod cart;
pub mod catalog;
pub mod deduction;
pub mod error;
pub mod inventory;
pub mod money;
pub mod order;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single product on one cart line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (typing 1000 instead of 10 would
/// deduct 18 kg of beans in one go).
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Prefix of sequential customer identifiers (`CUST-0001`, `CUST-0002`, ...).
pub const CUSTOMER_ID_PREFIX: &str = "CUST";
