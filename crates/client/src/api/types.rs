//! Backend record shapes.
//!
//! The backend owns these records; the clients only read them or submit
//! requests. Field names follow the backend's camelCase JSON.

use chrono::{DateTime, NaiveDate, Utc};
use farmacia_core::{
    BatchId, BranchId, BranchType, EmployeeId, ErpSyncStatus, PayrollId, Price, ProductId, Rut,
    SaleId, SaleStatus, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active_principle: Option<String>,
    #[serde(default)]
    pub is_controlled: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stock: Option<i64>,
}

impl Product {
    /// Formatted CLP price, if the backend sent one.
    #[must_use]
    pub fn display_price(&self) -> Option<String> {
        self.price.map(|p| Price::clp(p).display())
    }

    /// `true` when the product has a known stock of zero or less.
    #[must_use]
    pub fn is_out_of_stock(&self) -> bool {
        self.stock.is_some_and(|s| s <= 0)
    }
}

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> PaginatedResponse<T> {
    /// Number of pages at the current page size.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.page_size))
    }

    /// `true` if a later page exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        u64::from(self.page) + 1 < self.total_pages()
    }
}

/// Stock lookup result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockResponse {
    pub stock: i64,
}

/// Bioequivalent lookup result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BioequivalentsResponse {
    pub bioequivalents: Vec<Product>,
}

/// Physical branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    #[serde(rename = "type")]
    pub branch_type: BranchType,
    #[serde(default)]
    pub address: Option<String>,
}

/// Lot of a product with an expiry date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: BatchId,
    pub product_id: ProductId,
    pub batch_number: String,
    pub expiry_date: NaiveDate,
}

/// Quantity of a batch held at a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryStock {
    pub batch_id: BatchId,
    pub branch_id: BranchId,
    pub quantity_on_hand: i64,
    #[serde(default)]
    pub quantity_reserved: i64,
}

impl InventoryStock {
    /// Units that can still be sold.
    #[must_use]
    pub const fn available(&self) -> i64 {
        self.quantity_on_hand - self.quantity_reserved
    }
}

/// Line of a sale request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

/// Prescription data recorded when dispensing a controlled product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlledDispense {
    pub product_id: ProductId,
    pub patient_rut: Rut,
    pub doctor_name: String,
    #[serde(default)]
    pub prescription_date: Option<NaiveDate>,
}

/// Body of `POST /sales`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<BranchId>,
    pub items: Vec<SaleItemRequest>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prescriptions: Vec<ControlledDispense>,
}

/// Line of a recorded sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    #[serde(default)]
    pub batch_id: Option<BatchId>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
}

/// Recorded sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: SaleId,
    #[serde(default)]
    pub branch_id: Option<BranchId>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub status: SaleStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(default)]
    pub erp_sync_status: ErpSyncStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<SaleItem>,
}

/// Audit record kept for controlled-drug dispensing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceLog {
    pub sale_id: SaleId,
    pub product_id: ProductId,
    pub drug_type: String,
    pub patient_rut: Rut,
    pub doctor_name: String,
    pub logged_at: DateTime<Utc>,
}

/// Staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub full_name: String,
    pub rut: Rut,
    #[serde(default)]
    pub branch_id: Option<BranchId>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub base_salary: Option<Decimal>,
}

/// Monthly payroll slip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payroll {
    pub id: PayrollId,
    pub employee_id: EmployeeId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_liquid: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub commission_amount: Decimal,
}

impl Payroll {
    /// Period label in `MM/YYYY` form.
    #[must_use]
    pub fn period_label(&self) -> String {
        self.period_start.format("%m/%Y").to_string()
    }
}

/// Image submitted as a prescription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrescriptionImage {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Acknowledgement of an uploaded prescription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionReceipt {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}
