//! Integration tests for the signed-in session.
//!
//! Sign-in stores the session and routes by role. From then on every backend
//! request carries the bearer token and tenant header, and AI requests fall
//! back to the stored tenant. A 401 from the backend drops the token.

use farmacia_client::{AiClient, ApiError, CredentialStore, MemorySecureStore};
use farmacia_core::{Module, TenantId};
use farmacia_integration_tests::{config_for, product_json, user};
use farmacia_pos::PosApp;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pos_app(server: &MockServer) -> PosApp {
    PosApp::new(
        config_for(server),
        CredentialStore::new(MemorySecureStore::new()),
    )
    .unwrap()
}

fn sign_in(app: &PosApp, role: &str) -> Module {
    app.sign_in(
        SecretString::from("jwt-abc".to_string()),
        Some(SecretString::from("refresh-xyz".to_string())),
        &TenantId::new("farmacias-sur"),
        &user(role),
    )
    .unwrap()
}

// =============================================================================
// Role Routing Tests
// =============================================================================

#[tokio::test]
async fn test_sign_in_routes_by_role() {
    let server = MockServer::start().await;
    let app = pos_app(&server);

    assert_eq!(sign_in(&app, "SELLER"), Module::Pos);
    assert_eq!(sign_in(&app, "PHARMACIST"), Module::Pos);
    assert_eq!(sign_in(&app, "WAREHOUSE_OP"), Module::Wms);
    assert_eq!(sign_in(&app, "HR_MANAGER"), Module::Hr);
    assert_eq!(sign_in(&app, "SUPERHERO"), Module::Pos);
    assert_eq!(app.home_module().unwrap(), Module::Pos);
}

#[tokio::test]
async fn test_refresh_token_kept_until_sign_out() {
    let server = MockServer::start().await;
    let app = pos_app(&server);
    sign_in(&app, "SELLER");

    let refresh = app.credentials().get_refresh_token().unwrap().unwrap();
    assert_eq!(refresh.expose_secret(), "refresh-xyz");

    app.sign_out().unwrap();
    assert!(app.credentials().get_refresh_token().unwrap().is_none());
    assert!(app.credentials().get_user().unwrap().is_none());
}

// =============================================================================
// Header Tests
// =============================================================================

#[tokio::test]
async fn test_requests_carry_bearer_and_tenant() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .and(header("authorization", "Bearer jwt-abc"))
        .and(header("x-tenant-id", "farmacias-sur"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [product_json(1, "Paracetamol 500mg", Some(2990), false)],
            "total": 1,
            "page": 0,
            "pageSize": 50
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .and(body_partial_json(json!({"tenant_id": "farmacias-sur"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": "para",
            "tenant_id": "farmacias-sur",
            "results": [],
            "total": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let app = pos_app(&server);
    sign_in(&app, "SELLER");

    let register = app.open_register().await.unwrap();
    assert_eq!(register.filtered_products().len(), 1);

    // No explicit tenant: the AI client falls back to the stored one.
    let ai = AiClient::new(app.config(), app.credentials().clone()).unwrap();
    assert!(
        ai.suggestions("para", &TenantId::default())
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn test_anonymous_requests_have_no_auth_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/paracetamol-500"))
        .and(header("authorization", "Bearer jwt-abc"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/paracetamol-500"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(product_json(
                1,
                "Paracetamol 500mg",
                Some(2990),
                false,
            )),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = pos_app(&server);
    let product = app.api().product("paracetamol-500").await.unwrap();
    assert_eq!(product.name, "Paracetamol 500mg");
}

// =============================================================================
// 401 Handling Tests
// =============================================================================

#[tokio::test]
async fn test_unauthorized_clears_token_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let app = pos_app(&server);
    sign_in(&app, "WAREHOUSE_OP");
    assert!(app.credentials().is_authenticated().unwrap());

    let err = app.open_register().await.unwrap_err();
    assert_eq!(err.user_message(), "Sesion expirada, ingrese nuevamente");

    let credentials = app.credentials();
    assert!(!credentials.is_authenticated().unwrap());
    assert!(credentials.get_token().unwrap().is_none());
    assert_eq!(
        credentials.get_tenant_id().unwrap(),
        Some(TenantId::new("farmacias-sur"))
    );
    // The stored profile still routes until the user signs out.
    assert_eq!(app.home_module().unwrap(), Module::Wms);
}

#[tokio::test]
async fn test_other_failures_keep_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let app = pos_app(&server);
    sign_in(&app, "SELLER");

    let err = app.api().product("missing").await.unwrap_err();
    assert!(matches!(err, ApiError::Status(404)));
    assert!(app.credentials().is_authenticated().unwrap());
}
