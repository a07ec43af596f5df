//! Core types for Farmacia Nordic.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod lifecycle;
pub mod price;
pub mod role;
pub mod rut;
pub mod status;

pub use cart::{Cart, CartItem, NewCartItem};
pub use id::*;
pub use lifecycle::{AppPhase, Visibility, VisibilityGate};
pub use price::{CurrencyCode, Price};
pub use role::{Module, Role, RoleParseError};
pub use rut::{Rut, RutError};
pub use status::*;
