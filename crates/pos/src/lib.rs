//! Farmacia staff app.
//!
//! One app for store staff, routed by role after login:
//!
//! - [`register`] - Point of sale with controlled-drug prescription capture
//! - [`picking`] - Warehouse picking along an AI-optimized route
//! - [`payroll`] - Biometric-gated payroll slips and commission dashboard
//! - [`hardware`] - Barcode scanner and ESC/POS receipt printer
//!
//! [`app::PosApp`] wires the shared services from `farmacia-client`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod app;
pub mod error;
pub mod hardware;
pub mod payroll;
pub mod picking;
pub mod register;

pub use app::PosApp;
pub use error::{AppError, Result};
