//! Asynchronous reader event types.
//!
//! Events are emitted by reader drivers through a `tokio::sync::broadcast`
//! channel whenever a tag identifier has been decoded from the byte stream,
//! or when the connection state changes. Access-control front ends and
//! attendance loggers subscribe to these events instead of polling.

use crate::types::TagIdentifier;

/// An event emitted by a reader driver.
///
/// Subscribe via the driver's `subscribe()` method. Events are delivered
/// on a best-effort basis through a bounded broadcast channel; a consumer
/// that falls far behind may miss events (e.g. a stack of tags swiped in
/// rapid succession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    /// A tag was detected and its identifier decoded.
    ///
    /// Emitted exactly once per complete, decodable frame, in the order
    /// the frames were completed on the wire. Malformed frames never
    /// produce this event — see the driver's diagnostics channel.
    TagDetected(TagIdentifier),

    /// The reader's byte stream is attached and being listened to.
    Connected,

    /// The connection to the reader was lost or closed.
    Disconnected,
}
