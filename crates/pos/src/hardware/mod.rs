//! Peripheral services: barcode scanner and thermal receipt printer.

pub mod printer;
pub mod scanner;

pub use printer::{
    Align, MemoryTransport, PrinterConfig, PrinterError, PrinterService, PrinterTransport,
    ReceiptLine, TextSize,
};
pub use scanner::{ScanKind, ScanResult, ScannerConfig, ScannerError, ScannerService};

/// Physical link to a peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionType {
    Camera,
    Bluetooth,
    Usb,
    Network,
}

impl ConnectionType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::Bluetooth => "bluetooth",
            Self::Usb => "usb",
            Self::Network => "network",
        }
    }
}

impl std::fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
