//! rfidlib-test-harness: Test utilities and mock transports for rfidlib.
//!
//! This crate provides [`MockTransport`] for deterministic unit testing
//! of the framing protocol engine and reader driver without requiring
//! real RFID hardware.

pub mod mock_serial;

pub use mock_serial::MockTransport;
