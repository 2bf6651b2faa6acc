//! # Repository Module
//!
//! Database repository implementations for Mostrador POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  axum handler                                                          │
//! │       │                                                                 │
//! │       │  db.sales().create(draft)                                      │
//! │       ▼                                                                 │
//! │  SaleRepository::create  ── BEGIN ─────────────────────────────┐       │
//! │       │                                                        │       │
//! │       ├── customer::fetch_customer(&mut tx)       shared       │       │
//! │       ├── movement_type::find_sale_type(&mut tx)  helpers take │       │
//! │       ├── product::find_by_code(&mut tx)          a connection │       │
//! │       ├── seller::fetch(&mut tx)                  so they can  │       │
//! │       └── inventory::insert_movement(&mut tx)     join the tx  │       │
//! │                                                                │       │
//! │  ─────────────────────────────────────────────── COMMIT ───────┘       │
//! │                                                                         │
//! │  Repositories own a pool clone; helpers that must run inside another   │
//! │  repository's transaction take `&mut SqliteConnection` instead.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer upsert, lookup, resolution
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD
//! - [`SellerRepository`](seller::SellerRepository) - The seller singleton
//! - [`MovementTypeRepository`](movement_type::MovementTypeRepository) - Movement type CRUD
//! - [`InventoryRepository`](inventory::InventoryRepository) - Stock, history, batch posting
//! - [`SaleRepository`](sale::SaleRepository) - Atomic sale create/delete and read-back

pub mod customer;
pub mod inventory;
pub mod movement_type;
pub mod product;
pub mod sale;
pub mod seller;
