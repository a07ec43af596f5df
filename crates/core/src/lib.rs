//! Farmacia Core - Shared types library.
//!
//! This crate provides common types used across all Farmacia Nordic clients:
//! - `pos` - Point of sale, warehouse picking and HR app for store staff
//! - `customer` - Consumer mobile app
//! - `storefront` - Consumer web store
//!
//! # Architecture
//!
//! The core crate contains only types and pure state reducers - no I/O, no
//! storage, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, RUTs, statuses, roles, the shopping
//!   cart reducer and the foreground/background visibility gate

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
