//! MF700 frame accumulation and decode.
//!
//! The reader pushes one frame per tag detection over the serial line:
//!
//! ```text
//! STX (0x02)  payload bytes  CR (0x0D)  LF (0x0A)  ETX (0x03)
//! ```
//!
//! Bytes arrive in arbitrary-sized chunks, so the frame boundary can land
//! anywhere: mid-payload, between CR and LF, or with two frames packed
//! into a single read when tags are swiped in quick succession. This
//! module converts that chunked stream back into discrete frames:
//!
//! - [`FrameAccumulator`] buffers chunks in a fixed 40-byte working buffer
//!   (the reader's documented maximum frame size) and cuts a [`Frame`] at
//!   every ETX.
//! - [`decode_frame`] extracts the tag identifier between the STX marker
//!   and the CR LF terminator.

use std::collections::VecDeque;

use rfidlib_core::types::TagIdentifier;

/// Start-of-text marker: first byte of the payload region.
pub const STX: u8 = 0x02;

/// End-of-text marker: terminates a frame on the wire.
pub const ETX: u8 = 0x03;

/// Carriage return: first byte of the payload terminator.
pub const CR: u8 = 0x0D;

/// Line feed: second byte of the payload terminator.
pub const LF: u8 = 0x0A;

/// Maximum frame size the MF700 emits, and therefore the fixed capacity
/// of the accumulator's working buffer. This is a transport limit from
/// the reader's documentation, not a tuning knob.
pub const FRAME_CAPACITY: usize = 40;

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// The raw bytes of one complete frame, captured at the moment the ETX
/// marker was observed (ETX itself is not included).
///
/// Immutable once captured; consumed by [`decode_frame`] and discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8>,
}

impl Frame {
    fn capture(bytes: &[u8]) -> Self {
        Frame {
            bytes: bytes.to_vec(),
        }
    }

    /// The frame's raw bytes (everything up to, but excluding, ETX).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of bytes in the frame.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// `true` for a zero-length frame (an ETX with nothing before it).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// Result of feeding one chunk into (or polling) the accumulator.
#[derive(Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// No complete frame yet; buffered bytes are retained for the next feed.
    Incomplete,

    /// An ETX was observed. The frame spans from the buffer start to the
    /// ETX, exclusive; the buffer has been reset and any bytes that
    /// followed the ETX are retained as the start of the next frame.
    Complete(Frame),

    /// A 41st byte arrived without an ETX. The buffer has been reset and
    /// accumulation resynchronizes from the overflowing byte onward.
    Overflow,

    /// The byte source reported the stream closed. Input is rejected
    /// until [`FrameAccumulator::reset`] attaches a fresh stream.
    TransportClosed,
}

/// Accumulates arbitrary-sized byte chunks and cuts complete frames.
///
/// The working buffer is a fixed 40-byte array with an explicit logical
/// length; it never grows, and an append that would exceed it is reported
/// as [`FrameOutcome::Overflow`] rather than silently truncated. Each
/// input byte is examined exactly once, at append time, so no bytes are
/// ever re-scanned.
///
/// Multiple frames packed into one chunk are all captured: [`feed`]
/// returns the first outcome and queues the rest in arrival order, to be
/// drained with [`poll`]:
///
/// ```
/// use rfidlib_mf700::protocol::{FrameAccumulator, FrameOutcome};
///
/// let mut acc = FrameAccumulator::new();
/// let mut outcome = acc.feed(b"\x02A1\r\n\x03\x02B2\r\n\x03");
/// while let FrameOutcome::Complete(frame) = outcome {
///     // decode_frame(&frame) ...
///     outcome = acc.poll();
/// }
/// ```
///
/// The accumulator performs no I/O and assumes single-writer access; if
/// chunks are delivered from more than one thread, the caller must
/// serialize calls into it.
///
/// [`feed`]: FrameAccumulator::feed
/// [`poll`]: FrameAccumulator::poll
#[derive(Debug)]
pub struct FrameAccumulator {
    /// Fixed working buffer for the in-progress frame.
    buf: [u8; FRAME_CAPACITY],
    /// Logical length: how many bytes of `buf` are in use. Never exceeds
    /// `FRAME_CAPACITY`.
    len: usize,
    /// Outcomes produced while consuming a chunk, in arrival order. Holds
    /// only `Complete` and `Overflow` entries; never longer than the
    /// chunk that produced them.
    outcomes: VecDeque<FrameOutcome>,
    /// Set once the byte source reports the stream closed.
    closed: bool,
}

impl FrameAccumulator {
    /// Create an empty accumulator attached to a fresh stream.
    pub fn new() -> Self {
        FrameAccumulator {
            buf: [0; FRAME_CAPACITY],
            len: 0,
            outcomes: VecDeque::new(),
            closed: false,
        }
    }

    /// Append a chunk and return the first resulting outcome.
    ///
    /// Feeding an empty chunk is a no-op returning
    /// [`FrameOutcome::Incomplete`]. After the stream has been marked
    /// closed, chunks are rejected (never buffered) with
    /// [`FrameOutcome::TransportClosed`].
    ///
    /// When a chunk produces more than one outcome (several frames, or a
    /// frame after an overflow), the remainder is drained via [`poll`].
    ///
    /// [`poll`]: FrameAccumulator::poll
    pub fn feed(&mut self, chunk: &[u8]) -> FrameOutcome {
        if self.closed {
            return FrameOutcome::TransportClosed;
        }
        if chunk.is_empty() {
            return FrameOutcome::Incomplete;
        }
        for &byte in chunk {
            self.push_byte(byte);
        }
        self.poll()
    }

    /// Return the next outcome already produced by buffered input, or
    /// [`FrameOutcome::Incomplete`] if the accumulator is waiting for
    /// more bytes.
    pub fn poll(&mut self) -> FrameOutcome {
        if self.closed {
            return FrameOutcome::TransportClosed;
        }
        self.outcomes.pop_front().unwrap_or(FrameOutcome::Incomplete)
    }

    fn push_byte(&mut self, byte: u8) {
        if byte == ETX {
            let frame = Frame::capture(&self.buf[..self.len]);
            self.len = 0;
            self.outcomes.push_back(FrameOutcome::Complete(frame));
        } else if self.len == FRAME_CAPACITY {
            // 41st byte without a terminator: reset and resynchronize.
            // The overflowing byte begins the next accumulation, so a
            // valid frame immediately following garbage is not lost.
            self.len = 0;
            self.outcomes.push_back(FrameOutcome::Overflow);
            self.buf[0] = byte;
            self.len = 1;
        } else {
            self.buf[self.len] = byte;
            self.len += 1;
        }
    }

    /// Record that the byte source reported the stream closed.
    ///
    /// Discards buffered bytes and pending outcomes; subsequent [`feed`]
    /// calls are rejected until [`reset`] attaches a fresh stream.
    ///
    /// [`feed`]: FrameAccumulator::feed
    /// [`reset`]: FrameAccumulator::reset
    pub fn mark_closed(&mut self) {
        self.len = 0;
        self.outcomes.clear();
        self.closed = true;
    }

    /// Discard all state and attach a fresh stream starting at offset 0.
    pub fn reset(&mut self) {
        self.len = 0;
        self.outcomes.clear();
        self.closed = false;
    }

    /// Number of bytes currently buffered for the in-progress frame.
    pub fn buffered(&self) -> usize {
        self.len
    }

    /// `true` if nothing is buffered and no outcomes are pending.
    pub fn is_empty(&self) -> bool {
        self.len == 0 && self.outcomes.is_empty()
    }

    /// `true` once the stream has been marked closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Default for FrameAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// Why a complete frame could not be decoded into a tag identifier.
///
/// These are recoverable conditions: the frame is discarded, the
/// accumulator keeps running, and the condition is reported on the
/// driver's diagnostics channel rather than raised as a hard error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The frame contains no STX start marker.
    #[error("no STX start marker in frame")]
    MissingStart,

    /// No CR LF terminator was found after the STX marker.
    #[error("no CR LF terminator after payload")]
    MissingTerminator,

    /// The payload between STX and CR LF is not valid UTF-8 text.
    #[error("payload is not valid UTF-8 text")]
    InvalidPayload,
}

/// Extract the tag identifier from a complete frame.
///
/// The payload is every byte strictly between the first STX and the CR
/// of the first CR LF sequence that follows it, returned at exactly its
/// transmitted length. A frame missing either marker is rejected — a
/// garbled payload is never silently passed through as an empty or
/// truncated identifier.
pub fn decode_frame(frame: &Frame) -> Result<TagIdentifier, DecodeError> {
    let bytes = frame.as_bytes();

    let start = bytes
        .iter()
        .position(|&b| b == STX)
        .ok_or(DecodeError::MissingStart)?;

    let region = &bytes[start + 1..];
    let term = region
        .windows(2)
        .position(|pair| pair == [CR, LF])
        .ok_or(DecodeError::MissingTerminator)?;

    let payload = &region[..term];
    let text = std::str::from_utf8(payload).map_err(|_| DecodeError::InvalidPayload)?;

    Ok(TagIdentifier::new(text))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
