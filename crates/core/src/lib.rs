//! Stridewell Core - Shared domain types and logic.
//!
//! This crate provides the types and rules used across all Stridewell components:
//! - `storefront` - Public shopping API (catalog, cart, checkout, profiles)
//! - `admin` - Back-office API for products, users, and payments
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. With the `postgres` feature, records derive
//! `sqlx::FromRow` and enums map to their `PostgreSQL` types.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, currencies, statuses, and roles
//! - [`authz`] - The single admin authorization predicate
//! - [`cart`] - Cart lines and cart math
//! - [`catalog`] - Catalog query parameters and sort orders
//! - [`image`] - Upload checks for product images
//! - [`pagination`] - Offset pagination requests and metadata
//! - [`product`], [`payment`], [`user`] - Persisted records and their inputs
//! - [`stats`] - Dashboard aggregates

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod authz;
pub mod cart;
pub mod catalog;
pub mod image;
pub mod pagination;
pub mod payment;
pub mod product;
pub mod stats;
pub mod types;
pub mod user;

pub use authz::AdminPolicy;
pub use cart::{Cart, CartError, CartLine};
pub use catalog::{CatalogQuery, ProductSort};
pub use image::{ImageError, ImageKind};
pub use pagination::{PageRequest, Paginated, PaginationMeta};
pub use payment::{AdminPaymentView, Payment, PaymentWithProduct};
pub use product::{Product, ProductDraft, ProductError};
pub use stats::{AdminStats, TopSellingProduct, UserStats};
pub use types::*;
pub use user::{ProfileUpdate, UserProfile};
