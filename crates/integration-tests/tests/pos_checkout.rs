//! Integration tests for the register checkout.
//!
//! A seller loads the catalog, rings up products (one of them controlled),
//! charges the sale and gets a receipt on the connected printer.

use farmacia_client::{CredentialStore, MemorySecureStore};
use farmacia_core::TenantId;
use farmacia_integration_tests::{config_for, product_json, product_uuid, sale_json, user};
use farmacia_pos::PosApp;
use farmacia_pos::hardware::{ConnectionType, MemoryTransport, PrinterConfig, PrinterService};
use farmacia_pos::register::{AddOutcome, Register};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

async fn mount_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                product_json(1, "Paracetamol 500mg", Some(2990), false),
                product_json(2, "Clonazepam 2mg", Some(5990), true),
                product_json(3, "Vitamina C", None, false),
            ],
            "total": 3,
            "page": 0,
            "pageSize": 50
        })))
        .mount(server)
        .await;
}

fn signed_in_app(server: &MockServer) -> PosApp {
    let app = PosApp::new(
        config_for(server),
        CredentialStore::new(MemorySecureStore::new()),
    )
    .unwrap();
    app.sign_in(
        SecretString::from("jwt-caja".to_string()),
        None,
        &TenantId::new("farmacias-sur"),
        &user("SELLER"),
    )
    .unwrap();
    app
}

async fn connected_printer() -> PrinterService<MemoryTransport> {
    let mut printer = PrinterService::new(MemoryTransport::default());
    printer
        .connect(PrinterConfig {
            connection: ConnectionType::Bluetooth,
            address: Some("00:11:22:33:44:55".to_string()),
            port: None,
        })
        .await
        .unwrap();
    printer
}

fn ring_up(register: &mut Register) {
    let products: Vec<_> = register.filtered_products().into_iter().cloned().collect();
    assert_eq!(products.len(), 3);

    assert_eq!(register.add_to_cart(&products[0]).unwrap(), AddOutcome::Added);
    assert_eq!(register.add_to_cart(&products[0]).unwrap(), AddOutcome::Added);
    assert_eq!(
        register.add_to_cart(&products[1]).unwrap(),
        AddOutcome::PrescriptionRequired
    );
    register
        .submit_prescription("12.345.678-5", "Dra. Paula Munoz")
        .unwrap();
    assert!(register.add_to_cart(&products[2]).is_err());
}

// =============================================================================
// Checkout Tests
// =============================================================================

#[tokio::test]
async fn test_checkout_records_sale_and_prints_receipt() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    Mock::given(method("POST"))
        .and(path("/sales"))
        .and(header("authorization", "Bearer jwt-caja"))
        .and(header("x-tenant-id", "farmacias-sur"))
        .and(body_partial_json(json!({
            "items": [
                {"productId": product_uuid(1), "quantity": 2},
                {"productId": product_uuid(2), "quantity": 1}
            ],
            "prescriptions": [{"doctorName": "Dra. Paula Munoz"}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(sale_json(900, 11970)))
        .expect(1)
        .mount(&server)
        .await;

    let app = signed_in_app(&server);
    let mut register = app.open_register().await.unwrap();
    ring_up(&mut register);
    assert_eq!(register.total(), Decimal::from(11970));

    let mut printer = connected_printer().await;
    let summary = app.charge(&mut register, &mut printer).await.unwrap().unwrap();

    assert_eq!(summary.message(), "Total: $11.970");
    assert!(register.cart().is_empty());

    let jobs = &printer.transport().jobs;
    assert_eq!(jobs.len(), 1);
    assert!(contains(&jobs[0], b"FARMACIA NORDIC"));
    assert!(contains(&jobs[0], b"2x Paracetamol 500mg"));
    assert!(contains(&jobs[0], b"TOTAL: $11.970"));
}

#[tokio::test]
async fn test_checkout_without_printer_still_records_sale() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    Mock::given(method("POST"))
        .and(path("/sales"))
        .respond_with(ResponseTemplate::new(201).set_body_json(sale_json(901, 11970)))
        .expect(1)
        .mount(&server)
        .await;

    let app = signed_in_app(&server);
    let mut register = app.open_register().await.unwrap();
    ring_up(&mut register);

    let mut printer = PrinterService::new(MemoryTransport::default());
    let summary = app.charge(&mut register, &mut printer).await.unwrap();
    assert!(summary.is_some());
    assert!(printer.transport().jobs.is_empty());
}

#[tokio::test]
async fn test_rejected_sale_keeps_cart_and_prints_nothing() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    Mock::given(method("POST"))
        .and(path("/sales"))
        .respond_with(ResponseTemplate::new(422))
        .expect(1)
        .mount(&server)
        .await;

    let app = signed_in_app(&server);
    let mut register = app.open_register().await.unwrap();
    ring_up(&mut register);

    let mut printer = connected_printer().await;
    let err = app.charge(&mut register, &mut printer).await.unwrap_err();
    assert_eq!(err.user_message(), "API Error: 422");
    assert_eq!(register.cart().item_count(), 3);
    assert!(printer.transport().jobs.is_empty());
}
