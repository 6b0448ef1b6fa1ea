//! Leadbook Core - Domain types and pure business rules.
//!
//! This crate provides everything about a buyer lead that does not need I/O:
//! - [`types`] - Type-safe IDs, email addresses, classification enums, and the
//!   `Buyer` / `BuyerHistory` models
//! - [`validation`] - The buyer schema: untyped record in, `BuyerDraft` or field issues out
//! - [`import`] - CSV bulk-import parsing and per-row validation
//! - [`rate_limit`] - The fixed-window admission rule used by the server's limiter
//!
//! # Architecture
//!
//! The core crate contains no database access and no HTTP. The `postgres` feature
//! only adds `sqlx` encode/decode impls so the server can bind these types directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod import;
pub mod rate_limit;
pub mod types;
pub mod validation;

pub use types::*;
