//! # brewline-db: Storage and Workflows for Brewline
//!
//! Everything that touches a database: pools, migrations, the storage
//! traits with their SQLite and Postgres implementations, the inventory
//! reconciler, and the transactional café workflows built on them.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Brewline Data Flow                               │
//! │                                                                         │
//! │  brewline-cli (checkout, order pay, kitchen cancel, inventory reset)    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   brewline-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │  Cafe<DB>     │───►│  Reconciler   │───►│ store traits │   │   │
//! │  │   │  (service/)   │    │ ensure + delta│    │ (store/)     │   │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────┬───────┘   │   │
//! │  │           │ begin / commit                         │           │   │
//! │  │   ┌───────▼───────┐                  ┌─────────────▼────────┐  │   │
//! │  │   │ Database      │                  │ SqliteConnection     │  │   │
//! │  │   │ HostedDatabase│                  │ PgConnection         │  │   │
//! │  │   └───────────────┘                  └──────────────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  brewline.db (embedded file)   or   postgres://… (hosted)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Embedded SQLite pool and configuration
//! - [`hosted`] - Hosted Postgres pool and configuration
//! - [`migrations`] - Embedded schema migrations for both backends
//! - [`error`] - Database error types
//! - [`store`] - Storage traits and backend implementations
//! - [`reconciler`] - Ensure-rows-then-apply-delta inventory updates
//! - [`service`] - Checkout, orders, kitchen, admin, reports
//!
//! ## Usage
//!
//! ```rust,ignore
//! use brewline_core::admin::AdminGate;
//! use brewline_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./brewline.db")).await?;
//! let cafe = db.cafe(AdminGate::default());
//! cafe.bootstrap().await?;
//!
//! let receipt = cafe.checkout(&cart, &CustomerInput::new("0300-1234567")).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod hosted;
pub mod migrations;
pub mod pool;
pub mod reconciler;
pub mod service;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use hosted::{HostedConfig, HostedDatabase};
pub use pool::{Database, DbConfig};
pub use reconciler::Reconciler;
pub use service::{
    BootstrapReport, Cafe, Cancellation, CheckoutStage, OrderDetail, Receipt, ServiceError,
    ServiceResult,
};
pub use store::CafeStore;
