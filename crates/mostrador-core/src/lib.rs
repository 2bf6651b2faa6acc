//! # mostrador-core: Pure Business Logic for Mostrador POS
//!
//! This crate is the **heart** of Mostrador POS. It contains all business
//! logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Mostrador POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (React SPA)                         │   │
//! │  │    Clientes ──► Productos ──► Venta ──► Inventario ──► Factura │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ REST (JSON)                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    mostrador-server (axum)                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ mostrador-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐ ┌────────┐ │   │
//! │  │   │  types   │ │  money  │ │   sale   │ │ ledger │ │invoice │ │   │
//! │  │   │ Product  │ │  Money  │ │ SaleDraft│ │ stock  │ │ Factus │ │   │
//! │  │   │ Seller   │ │ TaxRate │ │ aggregate│ │  fold  │ │payload │ │   │
//! │  │   └──────────┘ └─────────┘ └──────────┘ └────────┘ └────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  mostrador-db (Database Layer)                  │   │
//! │  │             SQLite queries, migrations, repositories            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Catalog types (Product, Seller, MovementType, movements)
//! - [`customer`] - Customer sum type and the resolved customer view
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`coerce`] - Lenient numeric coercion for sale line items
//! - [`ledger`] - Signed-quantity stock folding
//! - [`sale`] - Sale codes, line-item aggregation, drafts and committed sales
//! - [`invoice`] - Electronic-invoice payload mapping
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use mostrador_core::money::Money;
//! use mostrador_core::types::TaxRate;
//!
//! // Create money from cents (never from floats!)
//! let price = Money::from_cents(150_000); // $1.500,00
//!
//! // 19% IVA
//! let tax = price.calculate_tax(TaxRate::DEFAULT_IVA);
//! assert_eq!(tax.cents(), 28_500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod coerce;
pub mod customer;
pub mod error;
pub mod invoice;
pub mod ledger;
pub mod money;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use customer::{Customer, CustomerDetail, CustomerInput, CustomerKind, ResolvedCustomer};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use sale::{
    LineItemInput, Sale, SaleCode, SaleDetail, SaleDraft, SaleLineItem, SaleReceipt,
    SaleRequest, SaleTotals, SellerOverrides, SellerSnapshot,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Prefix of every sale code (`V000000001`).
pub const SALE_CODE_PREFIX: char = 'V';

/// Number of digits in the numeric part of a sale code.
pub const SALE_CODE_DIGITS: usize = 9;

/// Movement type codes seeded as non-deletable system defaults.
///
/// ## Business Reason
/// The sale workflow and the stock-adjustment screens rely on these four
/// types existing with their original flow direction.
pub const SYSTEM_MOVEMENT_TYPE_CODES: [i64; 4] = [1, 2, 3, 4];

/// Default page size for paginated listings.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound for a requested page size.
pub const MAX_PAGE_SIZE: u32 = 200;
