//! Transport implementations for rfidlib.
//!
//! This crate provides the concrete implementation of the
//! [`Transport`](rfidlib_core::Transport) trait from `rfidlib-core`:
//!
//! - [`SerialTransport`]: USB virtual COM ports and RS-232 serial
//!   connections to the reader
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
//! let mut buf = [0u8; 64];
//! let n = transport.receive(&mut buf, Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::{DataBits, Parity, SerialConfig, SerialTransport, StopBits};
