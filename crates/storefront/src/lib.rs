//! Farmacia web store.
//!
//! - [`cart`] - Cart persisted to local storage
//! - [`catalog`] - Product listing and detail, cached for five minutes
//! - [`product_page`] - Quantity picker and add-to-cart with the prescription rule
//! - [`search`] - Search bar suggestions and the results page
//!
//! [`app::StorefrontApp`] wires the shared services from `farmacia-client`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod product_page;
pub mod search;

pub use app::StorefrontApp;
pub use cart::{CartError, CartStore};
pub use catalog::Catalog;
pub use error::{AppError, Result};
