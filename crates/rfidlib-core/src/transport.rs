//! Transport trait for reader communication.
//!
//! The [`Transport`] trait abstracts over the physical link to an RFID
//! reader. The MF700 wire protocol is strictly receive-only — the reader
//! pushes a frame whenever a tag is in range and accepts no commands — so
//! the trait has no send side. Implementations exist for serial ports
//! (`rfidlib-transport`) and for a scripted mock (`rfidlib-test-harness`)
//! used to test protocol engines deterministically.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport from a reader.
///
/// Implementations handle the physical layer only. Framing, buffering,
/// and decode are handled by the protocol engine that consumes this
/// trait; the engine never polls the device itself beyond calling
/// `receive`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Receive bytes from the reader into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Waits up to `timeout`
    /// for data to arrive; returns [`Error::Timeout`](crate::error::Error::Timeout)
    /// if nothing arrived within the deadline. A timeout is the normal
    /// idle state for a reader with no tag in range.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport connection.
    ///
    /// After `close()`, subsequent `receive()` calls should return
    /// [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
