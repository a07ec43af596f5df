//! Point-of-sale register.
//!
//! The seller filters the catalog, builds a cart and charges it. Controlled
//! products go through a prescription step first: the register holds the
//! product as pending until the patient's RUT and the prescribing doctor
//! are entered, and keeps that data for the compliance log sent with the
//! sale.

use chrono::{DateTime, Local};
use farmacia_client::api::{ControlledDispense, CreateSaleRequest, Product, SaleItemRequest};
use farmacia_client::{ApiClient, ApiError};
use farmacia_core::{BranchId, Cart, CartItem, NewCartItem, Price, ProductId, Rut, RutError, SaleId};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::hardware::{PrinterError, PrinterService, PrinterTransport};

/// Alert title shown after a successful sale.
pub const SALE_DONE_TITLE: &str = "Venta Procesada";

/// Errors raised by register actions.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// Patient RUT or doctor name left blank.
    #[error("Complete los datos de la receta")]
    MissingPrescriptionData,

    #[error("RUT invalido: {0}")]
    InvalidRut(#[from] RutError),

    /// A prescription was submitted with no controlled product waiting.
    #[error("No hay producto pendiente de receta")]
    NoPendingPrescription,

    /// The catalog entry has no price and cannot be sold.
    #[error("Producto sin precio: {0}")]
    MissingPrice(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// What happened when a product was tapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The product is in the cart.
    Added,
    /// A prescription form must be completed first.
    PrescriptionRequired,
}

/// Result of a completed checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub sale_id: SaleId,
    pub total: Decimal,
    pub lines: Vec<CartItem>,
}

impl CheckoutSummary {
    /// Alert body, e.g. `Total: $14.970`.
    #[must_use]
    pub fn message(&self) -> String {
        format!("Total: {}", Price::clp(self.total).display())
    }

    /// Print the customer receipt for this sale.
    ///
    /// # Errors
    ///
    /// Returns `PrinterError` if the printer is disconnected or the job
    /// cannot be sent.
    pub async fn print<T: PrinterTransport>(
        &self,
        printer: &mut PrinterService<T>,
        date: DateTime<Local>,
    ) -> Result<(), PrinterError> {
        printer.print_sale(&self.lines, self.total, date).await
    }
}

/// Register screen state.
#[derive(Debug, Default)]
pub struct Register {
    catalog: Vec<Product>,
    query: String,
    cart: Cart,
    pending: Option<Product>,
    dispensations: Vec<ControlledDispense>,
    branch_id: Option<BranchId>,
}

impl Register {
    /// A register over a fixed catalog.
    #[must_use]
    pub fn new(catalog: Vec<Product>) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    /// Tag sales with the branch the terminal belongs to.
    #[must_use]
    pub const fn with_branch(mut self, branch_id: BranchId) -> Self {
        self.branch_id = Some(branch_id);
        self
    }

    /// Load the first catalog page from the backend.
    ///
    /// # Errors
    ///
    /// Returns `RegisterError::Api` if the catalog request fails.
    #[instrument(skip(api))]
    pub async fn load(api: &ApiClient, page_size: u32) -> Result<Self, RegisterError> {
        let page = api.products(0, page_size).await?;
        info!(products = page.data.len(), "Register catalog loaded");
        Ok(Self::new(page.data))
    }

    /// Update the search box.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Products whose name or active principle contains the query,
    /// ignoring case.
    #[must_use]
    pub fn filtered_products(&self) -> Vec<&Product> {
        let needle = self.query.trim().to_lowercase();
        self.catalog
            .iter()
            .filter(|p| {
                needle.is_empty()
                    || p.name.to_lowercase().contains(&needle)
                    || p.active_principle
                        .as_deref()
                        .is_some_and(|a| a.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Tap a product.
    ///
    /// # Errors
    ///
    /// Returns `RegisterError::MissingPrice` if the product has no price.
    pub fn add_to_cart(&mut self, product: &Product) -> Result<AddOutcome, RegisterError> {
        if product.price.is_none() {
            return Err(RegisterError::MissingPrice(product.name.clone()));
        }
        if product.is_controlled {
            debug!(product_id = %product.id, "Controlled product needs prescription");
            self.pending = Some(product.clone());
            return Ok(AddOutcome::PrescriptionRequired);
        }
        self.cart.add_item(cart_item(product, None)?);
        Ok(AddOutcome::Added)
    }

    /// Controlled product waiting on the prescription form.
    #[must_use]
    pub const fn pending_prescription(&self) -> Option<&Product> {
        self.pending.as_ref()
    }

    /// Complete the prescription form and add the pending product.
    ///
    /// On error the form stays open and nothing is added.
    ///
    /// # Errors
    ///
    /// Returns `MissingPrescriptionData` for blank fields, `InvalidRut` for a
    /// malformed RUT, and `NoPendingPrescription` if nothing is waiting.
    #[instrument(skip(self, patient_rut, doctor_name))]
    pub fn submit_prescription(
        &mut self,
        patient_rut: &str,
        doctor_name: &str,
    ) -> Result<(), RegisterError> {
        let doctor_name = doctor_name.trim();
        if patient_rut.trim().is_empty() || doctor_name.is_empty() {
            return Err(RegisterError::MissingPrescriptionData);
        }
        let patient_rut = Rut::parse(patient_rut)?;
        let product = self
            .pending
            .take()
            .ok_or(RegisterError::NoPendingPrescription)?;

        self.cart.add_item(cart_item(&product, Some(true))?);
        self.dispensations.push(ControlledDispense {
            product_id: product.id,
            patient_rut,
            doctor_name: doctor_name.to_string(),
            prescription_date: None,
        });
        debug!(product_id = %product.id, "Prescription recorded");
        Ok(())
    }

    /// Close the prescription form without adding anything.
    pub fn cancel_prescription(&mut self) {
        self.pending = None;
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Set a line's quantity; zero or below removes it.
    pub fn update_quantity(&mut self, id: ProductId, quantity: i64) {
        self.cart.update_quantity(id, quantity);
        if self.cart.get(id).is_none() {
            self.dispensations.retain(|d| d.product_id != id);
        }
    }

    /// Remove a line.
    pub fn remove_item(&mut self, id: ProductId) {
        self.cart.remove_item(id);
        self.dispensations.retain(|d| d.product_id != id);
    }

    #[must_use]
    pub fn total(&self) -> Decimal {
        self.cart.total()
    }

    /// Charge the cart.
    ///
    /// An empty cart does nothing and returns `None`. On success the cart is
    /// cleared. On failure the cart is kept so the seller can retry.
    ///
    /// # Errors
    ///
    /// Returns `RegisterError::Api` if the sale is rejected.
    #[instrument(skip(self, api), fields(lines = self.cart.items().len()))]
    pub async fn checkout(
        &mut self,
        api: &ApiClient,
    ) -> Result<Option<CheckoutSummary>, RegisterError> {
        if self.cart.is_empty() {
            return Ok(None);
        }

        let request = self.sale_request();
        let sale = api.create_sale(&request).await?;

        let total = self.cart.total();
        let lines = std::mem::take(&mut self.cart).into_items();
        self.dispensations.clear();
        info!(sale_id = %sale.id, total = %total, "Sale processed");

        Ok(Some(CheckoutSummary {
            sale_id: sale.id,
            total,
            lines,
        }))
    }

    fn sale_request(&self) -> CreateSaleRequest {
        CreateSaleRequest {
            branch_id: self.branch_id,
            items: self
                .cart
                .items()
                .iter()
                .map(|line| SaleItemRequest {
                    product_id: line.id,
                    quantity: line.quantity,
                    unit_price: line.price,
                })
                .collect(),
            prescriptions: self.dispensations.clone(),
        }
    }
}

fn cart_item(product: &Product, prescription: Option<bool>) -> Result<NewCartItem, RegisterError> {
    let price = product
        .price
        .ok_or_else(|| RegisterError::MissingPrice(product.name.clone()))?;
    let mut item = NewCartItem::new(product.id, product.name.clone(), price)
        .controlled(product.is_controlled);
    if let Some(url) = &product.image_url {
        item = item.with_image(url.clone());
    }
    if let Some(uploaded) = prescription {
        item = item.with_prescription(uploaded);
    }
    Ok(item)
}
