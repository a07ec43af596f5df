//! Farmacia consumer app.
//!
//! - [`search`] - Find cheaper bioequivalent generics
//! - [`prescription`] - Photograph and upload a prescription
//! - [`profile`] - Device-local preferences
//!
//! [`app::CustomerApp`] wires the shared services from `farmacia-client`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod error;
pub mod prescription;
pub mod profile;
pub mod search;

pub use app::CustomerApp;
pub use error::{AppError, Result};
