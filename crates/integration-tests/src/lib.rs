//! Integration tests for the Farmacia clients.
//!
//! Each test drives one or more app crates against a `wiremock` server
//! standing in for both the backend API and the AI service.
//!
//! # Test Categories
//!
//! - `session` - Sign-in, role routing, request headers and 401 handling
//! - `pos_checkout` - Register checkout with a receipt printer
//! - `customer_search` - Bioequivalent search and prescription upload
//! - `storefront_cart` - Cart persistence across restarts and the product page
//!
//! Shared fixtures live here.

use farmacia_client::ClientConfig;
use farmacia_client::credentials::UserData;
use farmacia_core::UserId;
use serde_json::{Value, json};
use wiremock::MockServer;

/// Config pointing both services at the mock server.
#[must_use]
pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::default().with_base_urls(&server.uri(), &server.uri())
}

/// Stable product UUID for fixture `n`.
#[must_use]
pub fn product_uuid(n: u128) -> uuid::Uuid {
    uuid::Uuid::from_u128(n)
}

/// Backend product record.
#[must_use]
pub fn product_json(n: u128, name: &str, price: Option<u32>, controlled: bool) -> Value {
    json!({
        "id": product_uuid(n),
        "sku": format!("SKU-{n}"),
        "name": name,
        "activePrinciple": "Paracetamol",
        "isControlled": controlled,
        "price": price,
        "stock": 25
    })
}

/// Backend sale record.
#[must_use]
pub fn sale_json(n: u128, total: u32) -> Value {
    json!({
        "id": uuid::Uuid::from_u128(n),
        "status": "COMPLETED",
        "totalAmount": total,
        "erpSyncStatus": "PENDING",
        "createdAt": "2026-10-18T12:00:00Z"
    })
}

/// AI search hit.
#[must_use]
pub fn search_hit(n: u128, name: &str) -> Value {
    json!({
        "id": product_uuid(n),
        "sku": format!("SKU-{n}"),
        "name": name,
        "active_principle": "Paracetamol",
        "is_controlled": false,
        "similarity_score": 0.92
    })
}

/// Signed-in user with `role`.
#[must_use]
pub fn user(role: &str) -> UserData {
    UserData {
        id: UserId::new(uuid::Uuid::from_u128(42)),
        email: "vendedor@farmacia.cl".to_string(),
        full_name: "Camila Soto".to_string(),
        role: role.to_string(),
    }
}
