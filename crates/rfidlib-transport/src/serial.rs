//! Serial port transport for RFID reader communication.
//!
//! This module provides [`SerialTransport`], which implements the
//! [`Transport`] trait for USB virtual COM ports and physical RS-232
//! connections.
//!
//! The MF700 ships configured for 9600 baud, 8 data bits, no parity, one
//! stop bit, no flow control, which is what [`SerialConfig::default`]
//! gives you. The reader draws its interface power from the DTR and RTS
//! lines, so both are asserted on open.
//!
//! # Example
//!
//! ```no_run
//! use rfidlib_transport::SerialTransport;
//! use rfidlib_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> rfidlib_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 9600).await?;
//!
//! // Wait up to 1 second for frame bytes from the reader.
//! let mut buf = [0u8; 64];
//! let n = transport.receive(&mut buf, Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use rfidlib_core::error::{Error, Result};
use rfidlib_core::transport::Transport;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};

/// Serial port configuration.
///
/// Defaults match the MF700 factory settings:
/// - 9600 baud
/// - 8 data bits
/// - 1 stop bit
/// - No parity
///
/// Flow control is always off; the reader has no handshake lines.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate (the MF700 supports 9600 by default).
    pub baud_rate: u32,
    /// Number of data bits (typically 8).
    pub data_bits: DataBits,
    /// Number of stop bits (typically 1).
    pub stop_bits: StopBits,
    /// Parity checking (typically None).
    pub parity: Parity,
    /// Assert the DTR line on open. The MF700 is powered from this line.
    pub assert_dtr: bool,
    /// Assert the RTS line on open. The MF700 is powered from this line.
    pub assert_rts: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            assert_dtr: true,
            assert_rts: true,
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Seven,
    Eight,
}

impl From<DataBits> for tokio_serial::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Seven => tokio_serial::DataBits::Seven,
            DataBits::Eight => tokio_serial::DataBits::Eight,
        }
    }
}

/// Number of stop bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for tokio_serial::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => tokio_serial::StopBits::One,
            StopBits::Two => tokio_serial::StopBits::Two,
        }
    }
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for tokio_serial::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => tokio_serial::Parity::None,
            Parity::Odd => tokio_serial::Parity::Odd,
            Parity::Even => tokio_serial::Parity::Even,
        }
    }
}

/// Serial port transport for RFID reader communication.
///
/// Implements the [`Transport`] trait for USB virtual COM ports and
/// physical RS-232 connections to a reader.
pub struct SerialTransport {
    /// The underlying serial port stream.
    port: Option<SerialStream>,
    /// Port name for logging/debugging.
    port_name: String,
}

impl SerialTransport {
    /// Open a serial port with the given baud rate and default settings.
    ///
    /// # Arguments
    ///
    /// * `port` - Serial port path (e.g. "/dev/ttyUSB0" on Linux, "COM3" on Windows)
    /// * `baud_rate` - Baud rate (9600 for a factory-configured MF700)
    pub async fn open(port: &str, baud_rate: u32) -> Result<Self> {
        let config = SerialConfig {
            baud_rate,
            ..Default::default()
        };
        Self::open_with_config(port, config).await
    }

    /// Open a serial port with full configuration control.
    pub async fn open_with_config(port: &str, config: SerialConfig) -> Result<Self> {
        tracing::debug!(
            port = %port,
            baud_rate = config.baud_rate,
            data_bits = ?config.data_bits,
            stop_bits = ?config.stop_bits,
            parity = ?config.parity,
            "Opening serial port"
        );

        let mut serial_stream = tokio_serial::new(port, config.baud_rate)
            .data_bits(config.data_bits.into())
            .stop_bits(config.stop_bits.into())
            .parity(config.parity.into())
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| {
                tracing::error!(port = %port, error = %e, "Failed to open serial port");
                Error::Transport(format!("Failed to open serial port {}: {}", port, e))
            })?;

        // The MF700 draws interface power from DTR/RTS; without these
        // asserted the reader never transmits.
        if let Err(e) = serial_stream.write_data_terminal_ready(config.assert_dtr) {
            tracing::warn!(port = %port, error = %e, "Failed to set DTR");
        }
        if let Err(e) = serial_stream.write_request_to_send(config.assert_rts) {
            tracing::warn!(port = %port, error = %e, "Failed to set RTS");
        }

        tracing::info!(port = %port, baud_rate = config.baud_rate, "Serial port opened successfully");

        Ok(Self {
            port: Some(serial_stream),
            port_name: port.to_string(),
        })
    }

    /// Get the name of the serial port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        let result = tokio::time::timeout(timeout, port.read(buf)).await;

        match result {
            Ok(Ok(n)) => {
                tracing::trace!(
                    port = %self.port_name,
                    bytes = n,
                    data = ?&buf[..n],
                    "Received data"
                );
                Ok(n)
            }
            Ok(Err(e)) => {
                tracing::error!(
                    port = %self.port_name,
                    error = %e,
                    "Failed to receive data"
                );
                if e.kind() == std::io::ErrorKind::BrokenPipe
                    || e.kind() == std::io::ErrorKind::NotConnected
                {
                    Err(Error::ConnectionLost)
                } else {
                    Err(Error::Io(e))
                }
            }
            Err(_) => Err(Error::Timeout),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(port) = self.port.take() {
            drop(port);
            tracing::info!(port = %self.port_name, "Serial port closed");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.port.is_some() {
            tracing::debug!(port = %self.port_name, "SerialTransport dropped, closing port");
        }
    }
}
