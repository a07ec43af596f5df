//! Warehouse picking.
//!
//! The AI service returns an optimized walking route (FEFO allocation, zone
//! and bin ordering). A [`PickingSession`] walks that route one stop at a
//! time: the operator scans the product, the scan must match the stop's
//! expected code, and only then can the pick be confirmed. Reads from the
//! barcode scanner reach the session through [`PickingSession::attach_scanner`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use farmacia_client::ai::{OptimizedRoute, PickingRequest};
use farmacia_client::{AiClient, AiError};
use farmacia_core::{BatchId, PickPriority, ProductId};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::hardware::{ScanResult, ScannerService};

/// Errors raised while picking.
#[derive(Debug, Error)]
pub enum PickingError {
    #[error("La ruta no tiene items")]
    EmptyRoute,

    #[error("Picking finalizado")]
    Completed,

    /// The scanned code is not the product expected at this stop.
    #[error("Producto incorrecto: se esperaba {expected}, se escaneo {scanned}")]
    WrongItem { expected: String, scanned: String },

    /// Confirm was pressed before a matching scan.
    #[error("Escanee el producto antes de confirmar")]
    NotVerified,

    #[error(transparent)]
    Ai(#[from] AiError),
}

/// Pending order in the warehouse queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickingTask {
    pub id: String,
    pub order_id: String,
    pub item_count: u32,
    pub priority: PickPriority,
    pub estimated_minutes: u32,
}

impl PickingTask {
    #[must_use]
    pub const fn is_urgent(&self) -> bool {
        matches!(self.priority, PickPriority::High)
    }
}

/// Tasks ordered urgent first, otherwise in arrival order.
#[must_use]
pub fn order_queue(mut tasks: Vec<PickingTask>) -> Vec<PickingTask> {
    tasks.sort_by_key(|t| !t.is_urgent());
    tasks
}

/// Display data for a product on the route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductLabel {
    pub name: String,
    /// Code printed on the package (barcode or SKU).
    pub code: String,
}

/// One stop on the route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickStop {
    pub sequence: u32,
    pub zone_name: String,
    pub bin_code: String,
    pub batch_id: BatchId,
    pub product_id: ProductId,
    pub product_name: String,
    pub expected_code: String,
    pub quantity: u32,
    pub picked: bool,
}

/// Result of confirming a pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickProgress {
    /// Moved on to the next stop.
    Next,
    /// The last stop was confirmed.
    Completed,
}

/// Session shared between the picking screen and the scanner callback.
pub type SharedPickingSession = Arc<Mutex<PickingSession>>;

/// Walk through an optimized route.
#[derive(Debug, Clone)]
pub struct PickingSession {
    stops: Vec<PickStop>,
    current: usize,
    verified: bool,
}

impl PickingSession {
    /// Build a session from route stops.
    ///
    /// Stops are ordered by `sequence`. Products without a label show their
    /// ID and must be scanned by ID.
    ///
    /// # Errors
    ///
    /// Returns `PickingError::EmptyRoute` for an empty route.
    pub fn new(
        route: Vec<OptimizedRoute>,
        labels: &HashMap<ProductId, ProductLabel>,
    ) -> Result<Self, PickingError> {
        if route.is_empty() {
            return Err(PickingError::EmptyRoute);
        }
        let mut stops: Vec<PickStop> = route
            .into_iter()
            .map(|stop| {
                let (product_name, expected_code) = labels.get(&stop.product_id).map_or_else(
                    || (stop.product_id.to_string(), stop.product_id.to_string()),
                    |label| (label.name.clone(), label.code.clone()),
                );
                PickStop {
                    sequence: stop.sequence,
                    zone_name: stop.zone_name,
                    bin_code: stop.bin_code,
                    batch_id: stop.batch_id,
                    product_id: stop.product_id,
                    product_name,
                    expected_code,
                    quantity: stop.quantity,
                    picked: false,
                }
            })
            .collect();
        stops.sort_by_key(|s| s.sequence);

        Ok(Self {
            stops,
            current: 0,
            verified: false,
        })
    }

    /// Ask the AI service for a route and start a session on it.
    ///
    /// # Errors
    ///
    /// Returns `PickingError::Ai` if the route request fails and
    /// `PickingError::EmptyRoute` if nothing could be allocated.
    #[instrument(skip(ai, request, labels), fields(branch_id = %request.branch_id))]
    pub async fn plan(
        ai: &AiClient,
        request: &PickingRequest,
        labels: &HashMap<ProductId, ProductLabel>,
    ) -> Result<Self, PickingError> {
        let response = ai.optimize_route(request).await?;
        for line in &response.lines {
            let requested = request
                .items
                .iter()
                .filter(|i| i.product_id == line.product_id)
                .map(|i| i.quantity)
                .sum();
            if line.is_short(requested) {
                warn!(
                    product_id = %line.product_id,
                    requested,
                    allocated = line.total_picked,
                    "Insufficient stock for pick line"
                );
            }
        }
        Self::new(response.optimized_route, labels)
    }

    /// All stops in walking order.
    #[must_use]
    pub fn stops(&self) -> &[PickStop] {
        &self.stops
    }

    /// Stop the operator is standing at, `None` once complete.
    #[must_use]
    pub fn current(&self) -> Option<&PickStop> {
        if self.is_complete() {
            return None;
        }
        self.stops.get(self.current)
    }

    /// `true` once the current stop has a matching scan.
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        self.verified
    }

    /// Check a scanned code against the current stop.
    ///
    /// Comparison ignores surrounding whitespace and case. A mismatch keeps
    /// the operator on the same stop.
    ///
    /// # Errors
    ///
    /// Returns `WrongItem` on mismatch and `Completed` if the route is done.
    #[instrument(skip(self))]
    pub fn scan(&mut self, code: &str) -> Result<&PickStop, PickingError> {
        let index = self.current;
        let stop = self.current().ok_or(PickingError::Completed)?;
        let scanned = code.trim();
        if !scanned.eq_ignore_ascii_case(stop.expected_code.trim()) {
            let expected = stop.expected_code.clone();
            self.verified = false;
            debug!(%expected, %scanned, "Scan mismatch");
            return Err(PickingError::WrongItem {
                expected,
                scanned: scanned.to_string(),
            });
        }
        self.verified = true;
        self.stops.get(index).ok_or(PickingError::Completed)
    }

    /// Check a scanner read against the current stop.
    ///
    /// # Errors
    ///
    /// Same as [`PickingSession::scan`].
    pub fn scan_result(&mut self, result: &ScanResult) -> Result<&PickStop, PickingError> {
        self.scan(&result.data)
    }

    /// Share the session and feed every read from `scanner` into it.
    ///
    /// Replaces the scanner's callback. A rejected read is logged and leaves
    /// the current stop unverified.
    pub fn attach_scanner(self, scanner: &ScannerService) -> SharedPickingSession {
        let shared = Arc::new(Mutex::new(self));
        let session = Arc::clone(&shared);
        scanner.on_scan(move |result| {
            let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = session.scan_result(result) {
                warn!(error = %e, code = %result.data, "Scan rejected");
            }
        });
        shared
    }

    /// Mark the verified stop as picked and advance.
    ///
    /// # Errors
    ///
    /// Returns `NotVerified` without a matching scan and `Completed` if the
    /// route is done.
    pub fn confirm_pick(&mut self) -> Result<PickProgress, PickingError> {
        if self.is_complete() {
            return Err(PickingError::Completed);
        }
        if !self.verified {
            return Err(PickingError::NotVerified);
        }
        let stop = self
            .stops
            .get_mut(self.current)
            .ok_or(PickingError::Completed)?;
        stop.picked = true;
        self.verified = false;
        debug!(sequence = stop.sequence, bin = %stop.bin_code, "Pick confirmed");

        if self.current + 1 < self.stops.len() {
            self.current += 1;
            Ok(PickProgress::Next)
        } else {
            info!(stops = self.stops.len(), "Picking completed");
            Ok(PickProgress::Completed)
        }
    }

    #[must_use]
    pub fn picked_count(&self) -> usize {
        self.stops.iter().filter(|s| s.picked).count()
    }

    /// Picked fraction in `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress(&self) -> f64 {
        if self.stops.is_empty() {
            return 0.0;
        }
        self.picked_count() as f64 / self.stops.len() as f64
    }

    /// Progress text, e.g. `1 de 3 items`.
    #[must_use]
    pub fn progress_label(&self) -> String {
        format!("{} de {} items", self.picked_count(), self.stops.len())
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.stops.iter().all(|s| s.picked)
    }
}
