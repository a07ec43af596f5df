//! Barcode scanner.
//!
//! USB HID scanners type the code followed by Enter; Bluetooth and camera
//! scanners deliver whole codes. Either way the binding hands complete codes
//! to [`ScannerService::deliver`] and the registered callback receives a
//! [`ScanResult`].

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::ConnectionType;

/// Symbology reported by simulated scans.
pub const SIMULATED_FORMAT: &str = "EAN-13";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScannerError {
    #[error("Scanner not connected")]
    NotConnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerConfig {
    pub connection: ConnectionType,
    pub device_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    Barcode,
    Qr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub kind: ScanKind,
    pub data: String,
    pub format: Option<String>,
    pub timestamp: DateTime<Utc>,
}

type ScanCallback = Arc<dyn Fn(&ScanResult) + Send + Sync>;

/// Scanner connection plus the single scan callback.
#[derive(Default)]
pub struct ScannerService {
    config: Option<ScannerConfig>,
    callback: Mutex<Option<ScanCallback>>,
    listening: bool,
}

impl std::fmt::Debug for ScannerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerService")
            .field("config", &self.config)
            .field("has_callback", &self.has_callback())
            .field("listening", &self.listening)
            .finish()
    }
}

impl ScannerService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, config: ScannerConfig) {
        info!(connection = %config.connection, device = ?config.device_id, "Scanner connected");
        self.config = Some(config);
    }

    /// Drop the connection and the registered callback.
    pub fn disconnect(&mut self) {
        info!("Scanner disconnected");
        self.config = None;
        self.listening = false;
        *self.callback.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.config.is_some()
    }

    #[must_use]
    pub const fn config(&self) -> Option<&ScannerConfig> {
        self.config.as_ref()
    }

    /// Register the scan callback, replacing any previous one.
    pub fn on_scan<F>(&self, callback: F)
    where
        F: Fn(&ScanResult) + Send + Sync + 'static,
    {
        *self.callback.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(callback));
        debug!("Scan callback registered");
    }

    #[must_use]
    pub fn has_callback(&self) -> bool {
        self.callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Feed a complete scan from the device binding.
    ///
    /// # Errors
    ///
    /// Returns `ScannerError::NotConnected` when no scanner is connected.
    pub fn deliver(&self, result: ScanResult) -> Result<(), ScannerError> {
        if !self.is_connected() {
            warn!("Scan received while scanner not connected");
            return Err(ScannerError::NotConnected);
        }
        debug!(data = %result.data, format = ?result.format, "Scan");
        let callback = self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(callback) = callback {
            callback(&result);
        }
        Ok(())
    }

    /// Emit an EAN-13 scan of `barcode` as if the device had read it.
    ///
    /// # Errors
    ///
    /// Returns `ScannerError::NotConnected` when no scanner is connected.
    pub fn simulate_scan(&self, barcode: &str) -> Result<(), ScannerError> {
        self.deliver(ScanResult {
            kind: ScanKind::Barcode,
            data: barcode.to_string(),
            format: Some(SIMULATED_FORMAT.to_string()),
            timestamp: Utc::now(),
        })
    }

    /// Start accepting keyboard-wedge input.
    pub fn start_listening(&mut self) {
        self.listening = true;
        debug!("Started listening for scans");
    }

    pub fn stop_listening(&mut self) {
        self.listening = false;
        debug!("Stopped listening for scans");
    }

    #[must_use]
    pub const fn is_listening(&self) -> bool {
        self.listening
    }
}
