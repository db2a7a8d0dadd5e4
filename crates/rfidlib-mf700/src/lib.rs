//! rfidlib-mf700: Driver for the MF700 RFID reader.
//!
//! The MF700 is a receive-only device: it announces each detected tag as
//! a single serial frame and accepts no commands. This crate provides the
//! frame accumulation and decode logic ([`protocol`]), the async driver
//! that owns the serial link and broadcasts detections ([`reader`]), and
//! a fluent builder to wire it all up ([`builder`]).
//!
//! ```no_run
//! use rfidlib_mf700::Mf700Builder;
//!
//! # async fn run() -> rfidlib_core::error::Result<()> {
//! let reader = Mf700Builder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .build()
//!     .await?;
//!
//! let mut events = reader.subscribe();
//! reader.start().await?;
//! while let Ok(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod protocol;
pub mod reader;

pub use builder::Mf700Builder;
pub use protocol::{decode_frame, DecodeError, Frame, FrameAccumulator, FrameOutcome};
pub use reader::{Diagnostic, Mf700Reader};
