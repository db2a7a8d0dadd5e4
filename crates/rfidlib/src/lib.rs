//! # rfidlib -- Async RFID Tag Reading over Serial
//!
//! `rfidlib` is an asynchronous Rust library for receiving tag detections
//! from serial-attached RFID readers. It is designed for access-control
//! panels, asset tracking, and attendance systems where tags must be
//! delivered reliably, in order, and without polling loops in application
//! code.
//!
//! ## Quick Start
//!
//! Add `rfidlib` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! rfidlib = { version = "0.1", features = ["mf700"] }
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! Open a reader and print every tag it sees:
//!
//! ```no_run
//! use rfidlib::ReaderEvent;
//! use rfidlib::mf700::Mf700Builder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let reader = Mf700Builder::new()
//!         .serial_port("/dev/ttyUSB0")
//!         .build()
//!         .await?;
//!
//!     let mut events = reader.subscribe();
//!     reader.start().await?;
//!
//!     while let Ok(event) = events.recv().await {
//!         if let ReaderEvent::TagDetected(tag) = event {
//!             println!("tag: {tag}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized as a workspace of focused crates:
//!
//! | Crate                  | Purpose                                       |
//! |------------------------|-----------------------------------------------|
//! | `rfidlib-core`         | [`Transport`] trait, events, identifiers, errors |
//! | `rfidlib-transport`    | Async serial transport (tokio-serial)         |
//! | `rfidlib-mf700`        | MF700 STX/ETX frame protocol driver           |
//! | `rfidlib-test-harness` | Mock transports for hardware-free testing     |
//! | **`rfidlib`**          | This facade crate -- re-exports everything    |
//!
//! Reader drivers consume the [`Transport`] trait, so tests can substitute
//! a scripted mock for a live serial port.
//!
//! ## Feature Flags
//!
//! Each reader backend is gated behind a feature flag:
//!
//! | Feature | Enables                           | Default |
//! |---------|-----------------------------------|---------|
//! | `mf700` | [`mf700`] module (STX/ETX frames) | yes     |
//!
//! ## Event Subscription
//!
//! Reader drivers emit [`ReaderEvent`]s through a broadcast channel: one
//! `TagDetected` per frame the reader sends, in wire order, plus
//! `Connected`/`Disconnected` lifecycle markers. Protocol-level failures
//! (garbled frames, buffer overflows, a dropped port) go to a separate
//! diagnostics channel so they are observable without polluting the tag
//! stream:
//!
//! ```no_run
//! # async fn example(reader: &rfidlib::mf700::Mf700Reader) {
//! let mut diags = reader.subscribe_diagnostics();
//! while let Ok(diag) = diags.recv().await {
//!     eprintln!("line problem: {diag}");
//! }
//! # }
//! ```

pub use rfidlib_core::*;

/// Async serial transport built on tokio-serial.
pub mod serial {
    pub use rfidlib_transport::serial::*;
}

/// MF700 reader backend.
///
/// Provides [`Mf700Reader`](mf700::Mf700Reader) and
/// [`Mf700Builder`](mf700::Mf700Builder) for the MF700's receive-only
/// STX/ETX-framed serial protocol.
#[cfg(feature = "mf700")]
pub mod mf700 {
    pub use rfidlib_mf700::*;
}
