//! Fluent builder for [`Mf700Reader`].

use std::time::Duration;

use rfidlib_core::error::{Error, Result};
use rfidlib_core::transport::Transport;
use rfidlib_transport::serial::{SerialConfig, SerialTransport};

use crate::reader::Mf700Reader;

/// The baud rate the MF700 ships configured for.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default per-read timeout for the listener's idle poll.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Builder for [`Mf700Reader`] instances.
///
/// ```no_run
/// use rfidlib_mf700::Mf700Builder;
///
/// # async fn open() -> rfidlib_core::error::Result<()> {
/// let reader = Mf700Builder::new()
///     .serial_port("/dev/ttyUSB0")
///     .build()
///     .await?;
/// reader.start().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Mf700Builder {
    serial_port: Option<String>,
    baud_rate: u32,
    poll_timeout: Duration,
}

impl Mf700Builder {
    pub fn new() -> Self {
        Mf700Builder {
            serial_port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }

    /// Serial port device the reader is attached to, e.g. `/dev/ttyUSB0`
    /// or `COM3`. Required for [`build`](Mf700Builder::build).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the baud rate. The factory setting is 9600.
    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Override how long each idle read waits before polling again.
    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Validate the configuration, open the serial port, and construct
    /// the reader. The reader starts parked; call
    /// [`Mf700Reader::start`] to begin listening.
    pub async fn build(self) -> Result<Mf700Reader> {
        let port = self
            .serial_port
            .ok_or_else(|| Error::InvalidParameter("serial port is required".to_string()))?;
        if self.baud_rate == 0 {
            return Err(Error::InvalidParameter(
                "baud rate must be positive".to_string(),
            ));
        }

        let config = SerialConfig {
            baud_rate: self.baud_rate,
            ..Default::default()
        };
        let transport = SerialTransport::open_with_config(&port, config).await?;
        Ok(Mf700Reader::new(
            Box::new(transport),
            self.poll_timeout,
            Some(port),
        ))
    }

    /// Construct the reader around an already-open transport.
    ///
    /// Used by tests and by callers that manage the port themselves.
    pub fn build_with_transport(self, transport: Box<dyn Transport>) -> Mf700Reader {
        Mf700Reader::new(transport, self.poll_timeout, self.serial_port)
    }
}

impl Default for Mf700Builder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfidlib_test_harness::MockTransport;

    #[tokio::test]
    async fn build_without_port_is_invalid() {
        let result = Mf700Builder::new().build().await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn build_with_zero_baud_is_invalid() {
        let result = Mf700Builder::new()
            .serial_port("/dev/ttyUSB0")
            .baud_rate(0)
            .build()
            .await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn build_with_transport_carries_port_name() {
        let reader = Mf700Builder::new()
            .serial_port("/dev/ttyUSB0")
            .build_with_transport(Box::new(MockTransport::new()));
        assert_eq!(reader.port_name(), Some("/dev/ttyUSB0"));
    }

    #[test]
    fn defaults_match_factory_settings() {
        let builder = Mf700Builder::new();
        assert_eq!(builder.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(builder.poll_timeout, DEFAULT_POLL_TIMEOUT);
    }
}
