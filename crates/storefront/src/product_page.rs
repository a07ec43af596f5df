//! Product detail page.
//!
//! The shopper picks a quantity and adds it to the cart. Controlled
//! products need a prescription upload first.

use farmacia_client::api::{PrescriptionImage, PrescriptionReceipt, Product};
use farmacia_client::{ApiClient, ApiError, telemetry};
use farmacia_core::NewCartItem;
use tracing::{info, instrument, warn};

use crate::cart::{CartError, CartStore, PRESCRIPTION_REQUIRED_MESSAGE};
use crate::catalog::Catalog;

/// Add-to-cart button text.
pub const ADD_TO_CART_LABEL: &str = "Agregar al carrito";

#[derive(Debug, Clone)]
pub struct ProductPage {
    product: Product,
    bioequivalents: Vec<Product>,
    quantity: u32,
    prescription_uploaded: bool,
}

impl ProductPage {
    #[must_use]
    pub const fn new(product: Product) -> Self {
        Self {
            product,
            bioequivalents: Vec::new(),
            quantity: 1,
            prescription_uploaded: false,
        }
    }

    /// Load the product and its bioequivalents.
    ///
    /// A failed bioequivalent lookup leaves that section empty.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the product cannot be fetched.
    #[instrument(skip(catalog))]
    pub async fn load(catalog: &Catalog, slug: &str) -> Result<Self, ApiError> {
        let product = catalog.product(slug).await?;
        let bioequivalents = match catalog.bioequivalents(product.id).await {
            Ok(products) => products,
            Err(e) => {
                warn!(product_id = %product.id, error = %e, "Bioequivalent lookup failed");
                Vec::new()
            }
        };
        Ok(Self {
            bioequivalents,
            ..Self::new(product)
        })
    }

    #[must_use]
    pub const fn product(&self) -> &Product {
        &self.product
    }

    #[must_use]
    pub fn bioequivalents(&self) -> &[Product] {
        &self.bioequivalents
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    pub const fn increment(&mut self) {
        self.quantity = self.quantity.saturating_add(1);
    }

    /// Never goes below one.
    pub const fn decrement(&mut self) {
        if self.quantity > 1 {
            self.quantity -= 1;
        }
    }

    #[must_use]
    pub const fn prescription_uploaded(&self) -> bool {
        self.prescription_uploaded
    }

    /// Send the prescription for this product.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the backend rejects the upload; the page stays
    /// locked.
    #[instrument(skip(self, api, image), fields(product_id = %self.product.id))]
    pub async fn upload_prescription(
        &mut self,
        api: &ApiClient,
        image: &PrescriptionImage,
    ) -> Result<PrescriptionReceipt, ApiError> {
        let receipt = api.upload_prescription(image).await?;
        self.prescription_uploaded = true;
        info!(prescription_id = %receipt.id, "Prescription attached to product");
        Ok(receipt)
    }

    /// Whether the add button is enabled.
    #[must_use]
    pub const fn can_add_to_cart(&self) -> bool {
        !self.product.is_controlled || self.prescription_uploaded
    }

    #[must_use]
    pub const fn button_label(&self) -> &'static str {
        if self.can_add_to_cart() {
            ADD_TO_CART_LABEL
        } else {
            PRESCRIPTION_REQUIRED_MESSAGE
        }
    }

    /// Add the chosen quantity to the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::PrescriptionRequired` for a controlled product
    /// without a prescription and `CartError::MissingPrice` for an unpriced
    /// one; the cart is untouched in both cases.
    #[instrument(skip(self, cart), fields(product_id = %self.product.id, quantity = self.quantity))]
    pub fn add_to_cart(&self, cart: &CartStore) -> Result<u32, CartError> {
        if !self.can_add_to_cart() {
            return Err(CartError::PrescriptionRequired(self.product.id));
        }
        let price = self
            .product
            .price
            .ok_or(CartError::MissingPrice(self.product.id))?;

        let mut item = NewCartItem::new(self.product.id, self.product.name.clone(), price)
            .controlled(self.product.is_controlled)
            .with_prescription(self.prescription_uploaded);
        if let Some(url) = &self.product.image_url {
            item = item.with_image(url.clone());
        }
        cart.add_units(item, self.quantity)?;

        let quantity = self.quantity.to_string();
        telemetry::add_breadcrumb(
            "cart",
            "Added to cart",
            Some(&[("sku", self.product.sku.as_str()), ("quantity", quantity.as_str())]),
        );
        Ok(self.quantity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use farmacia_client::{ClientConfig, CredentialStore, MemoryStore};
    use rust_decimal::Decimal;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn product(controlled: bool, price: Option<u32>) -> Product {
        serde_json::from_value(json!({
            "id": uuid::Uuid::from_u128(3),
            "sku": "CLZ-2",
            "name": "Clonazepam 2mg",
            "isControlled": controlled,
            "imageUrl": "https://cdn.example.com/clz.png",
            "price": price
        }))
        .unwrap()
    }

    fn cart() -> CartStore {
        CartStore::open(Arc::new(MemoryStore::new())).unwrap()
    }

    #[test]
    fn test_quantity_never_below_one() {
        let mut page = ProductPage::new(product(false, Some(8990)));
        page.decrement();
        assert_eq!(page.quantity(), 1);
        page.increment();
        page.increment();
        page.decrement();
        assert_eq!(page.quantity(), 2);
    }

    #[test]
    fn test_controlled_without_prescription_is_rejected() {
        let page = ProductPage::new(product(true, Some(8990)));
        let cart = cart();
        assert_eq!(page.button_label(), "Sube la receta primero");
        assert!(matches!(
            page.add_to_cart(&cart),
            Err(CartError::PrescriptionRequired(_))
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_adds_quantity_units() {
        let mut page = ProductPage::new(product(false, Some(8990)));
        page.increment();
        page.increment();
        let cart = cart();

        assert_eq!(page.button_label(), ADD_TO_CART_LABEL);
        assert_eq!(page.add_to_cart(&cart).unwrap(), 3);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.total(), Decimal::from(8990 * 3));

        let line = cart.get(page.product().id).unwrap();
        assert_eq!(line.prescription_uploaded, Some(false));
        assert_eq!(line.image_url.as_deref(), Some("https://cdn.example.com/clz.png"));
    }

    #[test]
    fn test_unpriced_product_is_rejected() {
        let page = ProductPage::new(product(false, None));
        let cart = cart();
        assert!(matches!(
            page.add_to_cart(&cart),
            Err(CartError::MissingPrice(_))
        ));
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_upload_unlocks_controlled_product() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/prescriptions"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "rx-7"})))
            .expect(1)
            .mount(&server)
            .await;
        let config = ClientConfig::default().with_base_urls(&server.uri(), &server.uri());
        let api = ApiClient::new(&config, CredentialStore::in_memory()).unwrap();

        let mut page = ProductPage::new(product(true, Some(8990)));
        let image = PrescriptionImage {
            file_name: "receta.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            bytes: vec![0xFF, 0xD8],
        };
        assert_eq!(page.upload_prescription(&api, &image).await.unwrap().id, "rx-7");
        assert!(page.prescription_uploaded());

        let cart = cart();
        page.add_to_cart(&cart).unwrap();
        assert!(cart.missing_prescriptions().is_empty());
    }

    #[tokio::test]
    async fn test_load_tolerates_bioequivalent_failure() {
        let server = MockServer::start().await;
        let id = uuid::Uuid::from_u128(3);
        Mock::given(method("GET"))
            .and(path("/products/clonazepam-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "sku": "CLZ-2",
                "name": "Clonazepam 2mg",
                "isControlled": true,
                "price": 8990
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/products/{id}/bioequivalents")))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let config = ClientConfig::default().with_base_urls(&server.uri(), &server.uri());
        let catalog = Catalog::new(ApiClient::new(&config, CredentialStore::in_memory()).unwrap());

        let page = ProductPage::load(&catalog, "clonazepam-2").await.unwrap();
        assert_eq!(page.product().sku, "CLZ-2");
        assert!(page.bioequivalents().is_empty());
        assert!(!page.can_add_to_cart());
    }
}
