//! Status enums for backend records.
//!
//! Wire values are the backend's upper-case strings.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    #[default]
    Completed,
    Pending,
    Cancelled,
}

/// Whether a sale has been pushed to the ERP ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErpSyncStatus {
    #[default]
    Pending,
    Synced,
    Failed,
}

/// Kind of physical branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BranchType {
    Store,
    Warehouse,
    Hq,
}

/// Warehouse picking task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PickPriority {
    High,
    #[default]
    Normal,
}
