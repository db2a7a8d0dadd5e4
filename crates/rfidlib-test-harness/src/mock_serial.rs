//! Mock transport for deterministic testing of the protocol engine.
//!
//! [`MockTransport`] implements the [`Transport`] trait with a scripted
//! queue of receive chunks. The MF700 protocol is receive-only, so unlike
//! a request/response mock there is nothing to match against — the mock
//! simply plays back chunks in order, one per `receive()` call, letting
//! tests control exactly how the byte stream is fragmented.
//!
//! # Example
//!
//! ```
//! use rfidlib_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // One tag frame, split across two reads mid-payload.
//! mock.push_chunk(&[0x02, b'0', b'0', b'1']);
//! mock.push_chunk(&[b'2', 0x0D, 0x0A, 0x03]);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

use rfidlib_core::error::{Error, Result};
use rfidlib_core::transport::Transport;

/// A mock [`Transport`] for testing protocol engines without hardware.
///
/// Chunks are returned in push order, one per `receive()` call. A chunk
/// larger than the caller's buffer is split, with the remainder returned
/// by subsequent calls — the same behavior as a real UART read. When the
/// queue is empty, `receive()` returns [`Error::Timeout`] (the idle state
/// of a reader with no tag in range), or [`Error::ConnectionLost`] if
/// [`close_when_drained`](MockTransport::close_when_drained) is set.
#[derive(Debug, Default)]
pub struct MockTransport {
    /// Ordered queue of chunks to play back.
    chunks: VecDeque<Vec<u8>>,
    /// Whether the transport is "connected".
    connected: bool,
    /// Simulate the port dropping once all chunks have been read.
    close_when_drained: bool,
}

impl MockTransport {
    /// Create a new mock transport in the connected state with no chunks.
    pub fn new() -> Self {
        MockTransport {
            chunks: VecDeque::new(),
            connected: true,
            close_when_drained: false,
        }
    }

    /// Queue a chunk of bytes to be returned by a future `receive()` call.
    pub fn push_chunk(&mut self, data: &[u8]) {
        self.chunks.push_back(data.to_vec());
    }

    /// Return the number of queued chunks not yet consumed.
    pub fn remaining_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Set the connected state of the mock transport.
    ///
    /// When `false`, subsequent `receive()` calls return
    /// [`Error::NotConnected`].
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// When enabled, the first `receive()` after the chunk queue empties
    /// returns [`Error::ConnectionLost`] and marks the mock disconnected.
    ///
    /// Use this to test how a driver reacts to the port dropping out from
    /// under it mid-session.
    pub fn close_when_drained(&mut self, enabled: bool) {
        self.close_when_drained = enabled;
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        match self.chunks.pop_front() {
            Some(chunk) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    // Caller's buffer was too small; keep the rest for the
                    // next read, exactly like a real UART.
                    self.chunks.push_front(chunk[n..].to_vec());
                }
                Ok(n)
            }
            None => {
                if self.close_when_drained {
                    self.connected = false;
                    Err(Error::ConnectionLost)
                } else {
                    Err(Error::Timeout)
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.chunks.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
