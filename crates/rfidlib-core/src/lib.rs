//! rfidlib-core: Core traits, types, and error definitions for rfidlib.
//!
//! This crate defines the device-agnostic abstractions that rfidlib
//! reader backends implement. Applications that only consume decoded tag
//! events depend on these types without pulling in any specific driver.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level receive channel from a reader
//! - [`ReaderEvent`] -- asynchronous tag detection notifications
//! - [`TagIdentifier`] -- a decoded tag payload
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod events;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use rfidlib_core::*`.
pub use error::{Error, Result};
pub use events::ReaderEvent;
pub use transport::Transport;
pub use types::TagIdentifier;
