//! ESC/POS thermal receipt printer.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use farmacia_core::{CartItem, Price};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use super::ConnectionType;

pub const RECEIPT_HEADER: &str = "FARMACIA NORDIC";
pub const RECEIPT_SEPARATOR: &str = "------------------------";
pub const RECEIPT_FOOTER: &str = "Gracias por su compra";

const ESC: u8 = 0x1B;
const GS: u8 = 0x1D;
const LF: u8 = 0x0A;
/// WPC1252 code page, covers Spanish accents.
const CODE_PAGE_WPC1252: u8 = 16;

#[derive(Debug, Error)]
pub enum PrinterError {
    #[error("Printer not connected")]
    NotConnected,

    #[error("printer transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterConfig {
    pub connection: ConnectionType,
    pub address: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextSize {
    #[default]
    Normal,
    Large,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReceiptLine {
    pub text: String,
    pub align: Align,
    pub bold: bool,
    pub size: TextSize,
}

impl ReceiptLine {
    pub fn new(text: impl Into<String>, align: Align) -> Self {
        Self {
            text: text.into(),
            align,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    #[must_use]
    pub const fn large(mut self) -> Self {
        self.size = TextSize::Large;
        self
    }
}

/// Byte pipe to the printer.
#[async_trait]
pub trait PrinterTransport: Send + Sync {
    async fn open(&mut self, config: &PrinterConfig) -> Result<(), PrinterError>;
    async fn send(&mut self, bytes: &[u8]) -> Result<(), PrinterError>;
    async fn close(&mut self) -> Result<(), PrinterError>;
}

/// Layout of a sale receipt.
#[must_use]
pub fn sale_receipt(items: &[CartItem], total: Decimal, date: DateTime<Local>) -> Vec<ReceiptLine> {
    let mut lines = vec![
        ReceiptLine::new(RECEIPT_HEADER, Align::Center).bold().large(),
        ReceiptLine::new(RECEIPT_SEPARATOR, Align::Center),
        ReceiptLine::new(date.format("%d-%m-%Y, %H:%M:%S").to_string(), Align::Center),
        ReceiptLine::new("", Align::Left),
    ];
    for item in items {
        lines.push(ReceiptLine::new(
            format!("{}x {}", item.quantity, item.name),
            Align::Left,
        ));
        lines.push(ReceiptLine::new(
            Price::clp(item.line_total()).display(),
            Align::Right,
        ));
    }
    lines.push(ReceiptLine::new(RECEIPT_SEPARATOR, Align::Center));
    lines.push(ReceiptLine::new(format!("TOTAL: {}", Price::clp(total).display()), Align::Right).bold());
    lines.push(ReceiptLine::new("", Align::Left));
    lines.push(ReceiptLine::new(RECEIPT_FOOTER, Align::Center));
    lines
}

/// Encode receipt lines as an ESC/POS job ending in a partial cut.
#[must_use]
pub fn encode_escpos(lines: &[ReceiptLine]) -> Vec<u8> {
    let mut out = vec![ESC, b'@', ESC, b't', CODE_PAGE_WPC1252];
    for line in lines {
        let justification = match line.align {
            Align::Left => 0,
            Align::Center => 1,
            Align::Right => 2,
        };
        let size = match line.size {
            TextSize::Normal => 0x00,
            TextSize::Large => 0x11,
        };
        out.extend_from_slice(&[ESC, b'a', justification]);
        out.extend_from_slice(&[ESC, b'E', u8::from(line.bold)]);
        out.extend_from_slice(&[GS, b'!', size]);
        out.extend(line.text.chars().map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?')));
        out.push(LF);
    }
    out.extend_from_slice(&[ESC, b'd', 3, GS, b'V', 1]);
    out
}

/// Receipt printer over a transport.
#[derive(Debug)]
pub struct PrinterService<T> {
    transport: T,
    config: Option<PrinterConfig>,
}

impl<T: PrinterTransport> PrinterService<T> {
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            config: None,
        }
    }

    /// Open the transport.
    ///
    /// # Errors
    ///
    /// Returns the transport error; the service stays disconnected.
    #[instrument(skip(self), fields(connection = %config.connection))]
    pub async fn connect(&mut self, config: PrinterConfig) -> Result<(), PrinterError> {
        self.transport.open(&config).await?;
        info!(address = ?config.address, "Printer connected");
        self.config = Some(config);
        Ok(())
    }

    /// Close the transport. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns the transport error; the service is disconnected regardless.
    pub async fn disconnect(&mut self) -> Result<(), PrinterError> {
        if self.config.take().is_none() {
            return Ok(());
        }
        info!("Printer disconnected");
        self.transport.close().await
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.config.is_some()
    }

    /// # Errors
    ///
    /// Returns `PrinterError::NotConnected` when disconnected, or the
    /// transport error.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn print_receipt(&mut self, lines: &[ReceiptLine]) -> Result<(), PrinterError> {
        if !self.is_connected() {
            error!("Printer not connected");
            return Err(PrinterError::NotConnected);
        }
        let job = encode_escpos(lines);
        debug!(bytes = job.len(), "Sending print job");
        self.transport.send(&job).await
    }

    /// Print the standard sale receipt.
    ///
    /// # Errors
    ///
    /// Same as [`PrinterService::print_receipt`].
    pub async fn print_sale(
        &mut self,
        items: &[CartItem],
        total: Decimal,
        date: DateTime<Local>,
    ) -> Result<(), PrinterError> {
        self.print_receipt(&sale_receipt(items, total, date)).await
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }
}

/// Transport that keeps every job in memory.
///
/// Stands in for the device on desktop builds and in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryTransport {
    pub open: bool,
    pub jobs: Vec<Vec<u8>>,
    /// Makes `open` fail with this message.
    pub fail_open: Option<String>,
}

#[async_trait]
impl PrinterTransport for MemoryTransport {
    async fn open(&mut self, _config: &PrinterConfig) -> Result<(), PrinterError> {
        if let Some(message) = &self.fail_open {
            return Err(PrinterError::Transport(message.clone()));
        }
        self.open = true;
        Ok(())
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<(), PrinterError> {
        if !self.open {
            return Err(PrinterError::Transport("transport closed".to_string()));
        }
        self.jobs.push(bytes.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), PrinterError> {
        self.open = false;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use farmacia_core::ProductId;

    use super::*;

    fn bluetooth() -> PrinterConfig {
        PrinterConfig {
            connection: ConnectionType::Bluetooth,
            address: Some("00:11:22:33:44:55".to_string()),
            port: None,
        }
    }

    fn items() -> Vec<CartItem> {
        vec![
            CartItem {
                id: ProductId::new(uuid::Uuid::from_u128(1)),
                name: "Paracetamol 500mg".to_string(),
                price: Decimal::from(2990),
                quantity: 2,
                image_url: None,
                is_controlled: false,
                prescription_uploaded: None,
            },
            CartItem {
                id: ProductId::new(uuid::Uuid::from_u128(2)),
                name: "Ibuprofeno 400mg".to_string(),
                price: Decimal::from(3490),
                quantity: 1,
                image_url: None,
                is_controlled: false,
                prescription_uploaded: None,
            },
        ]
    }

    #[test]
    fn test_sale_receipt_layout() {
        let date = Local.with_ymd_and_hms(2026, 1, 31, 18, 5, 9).unwrap();
        let lines = sale_receipt(&items(), Decimal::from(9470), date);
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            texts,
            [
                "FARMACIA NORDIC",
                "------------------------",
                "31-01-2026, 18:05:09",
                "",
                "2x Paracetamol 500mg",
                "$5.980",
                "1x Ibuprofeno 400mg",
                "$3.490",
                "------------------------",
                "TOTAL: $9.470",
                "",
                "Gracias por su compra",
            ]
        );
        assert!(lines[0].bold);
        assert_eq!(lines[0].size, TextSize::Large);
        assert_eq!(lines[5].align, Align::Right);
        assert!(lines[9].bold);
        assert_eq!(lines[11].align, Align::Center);
    }

    #[test]
    fn test_escpos_encoding() {
        let job = encode_escpos(&[ReceiptLine::new("Año", Align::Center).bold()]);
        assert_eq!(&job[..5], &[ESC, b'@', ESC, b't', 16]);
        assert_eq!(
            &job[5..17],
            &[ESC, b'a', 1, ESC, b'E', 1, GS, b'!', 0, b'A', 0xF1, b'o']
        );
        assert_eq!(&job[job.len() - 6..], &[ESC, b'd', 3, GS, b'V', 1]);

        let job = encode_escpos(&[ReceiptLine::new("✓", Align::Left)]);
        assert!(job.contains(&b'?'));
    }

    #[tokio::test]
    async fn test_print_requires_connection() {
        let mut printer = PrinterService::new(MemoryTransport::default());
        let err = printer
            .print_receipt(&[ReceiptLine::new("x", Align::Left)])
            .await
            .unwrap_err();
        assert!(matches!(err, PrinterError::NotConnected));
        assert!(printer.transport().jobs.is_empty());
    }

    #[tokio::test]
    async fn test_connect_print_disconnect() {
        let mut printer = PrinterService::new(MemoryTransport::default());
        printer.connect(bluetooth()).await.unwrap();
        assert!(printer.is_connected());

        let date = Local.with_ymd_and_hms(2026, 1, 31, 18, 5, 9).unwrap();
        printer
            .print_sale(&items(), Decimal::from(9470), date)
            .await
            .unwrap();
        assert_eq!(printer.transport().jobs.len(), 1);

        printer.disconnect().await.unwrap();
        printer.disconnect().await.unwrap();
        assert!(!printer.is_connected());
        assert!(!printer.transport().open);
    }

    #[tokio::test]
    async fn test_failed_open_stays_disconnected() {
        let mut printer = PrinterService::new(MemoryTransport {
            fail_open: Some("no device".to_string()),
            ..MemoryTransport::default()
        });
        assert!(printer.connect(bluetooth()).await.is_err());
        assert!(!printer.is_connected());
    }
}
