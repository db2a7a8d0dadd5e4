//! MF700 reader driver: owns the transport, runs the listener task, and
//! fans decoded tag detections out to subscribers.
//!
//! The driver is a thin supervisor around the framing engine in
//! [`crate::protocol`]. A single spawned task holds exclusive ownership of
//! the transport (the single-writer rule: only that task ever feeds the
//! accumulator), reads chunks in a loop, and publishes:
//!
//! - [`ReaderEvent`]s on the event channel: one `TagDetected` per decoded
//!   frame, in wire order, plus `Connected`/`Disconnected` lifecycle
//!   markers.
//! - [`Diagnostic`]s on a separate channel: malformed frames, buffer
//!   overflows, and transport loss. Subscribing to diagnostics is
//!   optional; a dropped diagnostic never affects tag delivery.

use std::time::Duration;

use tokio::sync::{broadcast, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use rfidlib_core::error::{Error, Result};
use rfidlib_core::events::ReaderEvent;
use rfidlib_core::transport::Transport;

use crate::protocol::{self, DecodeError, FrameAccumulator, FrameOutcome};

/// Capacity of the tag event broadcast channel.
const EVENT_CHANNEL_SIZE: usize = 256;

/// Capacity of the diagnostics broadcast channel.
const DIAG_CHANNEL_SIZE: usize = 64;

/// Read buffer size for one transport receive. Larger than any single
/// frame, so a tag swiped during an idle poll arrives in one read.
const READ_BUF_SIZE: usize = 64;

/// How long the listener sleeps after an idle (timed-out) poll before
/// trying again.
const IDLE_BACKOFF: Duration = Duration::from_millis(10);

/// A recoverable protocol-level failure observed by the listener task.
///
/// Diagnostics are reported on their own channel so that noisy line
/// conditions are visible to operators without polluting the tag event
/// stream. None of these stop the listener except [`TransportClosed`],
/// which accompanies a [`ReaderEvent::Disconnected`].
///
/// [`TransportClosed`]: Diagnostic::TransportClosed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// More than a frame's worth of bytes arrived without a terminator.
    /// The buffered bytes were discarded and accumulation resynchronized.
    BufferOverflow,

    /// A complete frame arrived but could not be decoded. The frame was
    /// discarded.
    Decode(DecodeError),

    /// The serial connection dropped. The listener has stopped.
    TransportClosed,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::BufferOverflow => write!(f, "frame buffer overflow"),
            Diagnostic::Decode(e) => write!(f, "frame decode failed: {e}"),
            Diagnostic::TransportClosed => write!(f, "transport closed"),
        }
    }
}

/// Handle to a running listener task.
struct Listener {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    /// Returns the transport when the task exits, so the reader can be
    /// restarted or closed cleanly.
    transport_rx: oneshot::Receiver<Box<dyn Transport>>,
}

/// Driver for an MF700 RFID reader on a serial link.
///
/// Construct with [`Mf700Builder`](crate::builder::Mf700Builder). The
/// reader starts parked: the transport is held but no bytes are read
/// until [`start`](Mf700Reader::start) spawns the listener task. Call
/// [`subscribe`](Mf700Reader::subscribe) before `start` to guarantee no
/// detection is missed.
pub struct Mf700Reader {
    /// The transport, parked here whenever no listener task is running.
    transport: Mutex<Option<Box<dyn Transport>>>,
    listener: Mutex<Option<Listener>>,
    event_tx: broadcast::Sender<ReaderEvent>,
    diag_tx: broadcast::Sender<Diagnostic>,
    poll_timeout: Duration,
    port_name: Option<String>,
}

impl Mf700Reader {
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        poll_timeout: Duration,
        port_name: Option<String>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (diag_tx, _) = broadcast::channel(DIAG_CHANNEL_SIZE);
        Mf700Reader {
            transport: Mutex::new(Some(transport)),
            listener: Mutex::new(None),
            event_tx,
            diag_tx,
            poll_timeout,
            port_name,
        }
    }

    /// Subscribe to the tag event stream.
    ///
    /// Every decoded frame produces exactly one
    /// [`ReaderEvent::TagDetected`], delivered in wire order. A receiver
    /// that falls behind the channel capacity misses the oldest events
    /// (standard broadcast semantics) but never reorders them.
    pub fn subscribe(&self) -> broadcast::Receiver<ReaderEvent> {
        self.event_tx.subscribe()
    }

    /// Subscribe to the diagnostics stream (malformed frames, overflows,
    /// transport loss).
    pub fn subscribe_diagnostics(&self) -> broadcast::Receiver<Diagnostic> {
        self.diag_tx.subscribe()
    }

    /// The serial port this reader was opened on, if any.
    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    /// `true` while the listener task is running.
    ///
    /// Returns `false` once the task has exited, including when it
    /// stopped itself after a connection loss. In that case a [`stop`]
    /// is still required to reap the task and recover the transport
    /// before a restart.
    ///
    /// [`stop`]: Mf700Reader::stop
    pub async fn is_listening(&self) -> bool {
        self.listener
            .lock()
            .await
            .as_ref()
            .is_some_and(|listener| !listener.task.is_finished())
    }

    /// Spawn the listener task, moving the transport into it.
    ///
    /// Emits [`ReaderEvent::Connected`] once the task is polling. Calling
    /// `start` while already listening is a no-op.
    pub async fn start(&self) -> Result<()> {
        let mut listener = self.listener.lock().await;
        if listener.is_some() {
            debug!("listener already running");
            return Ok(());
        }

        let transport = self
            .transport
            .lock()
            .await
            .take()
            .ok_or(Error::NotConnected)?;

        let cancel = CancellationToken::new();
        let (transport_tx, transport_rx) = oneshot::channel();

        let task = tokio::spawn(listener_loop(
            transport,
            self.poll_timeout,
            self.event_tx.clone(),
            self.diag_tx.clone(),
            cancel.clone(),
            transport_tx,
        ));

        *listener = Some(Listener {
            cancel,
            task,
            transport_rx,
        });
        debug!(port = ?self.port_name, "reader listener started");
        Ok(())
    }

    /// Stop the listener task and park the transport for reuse.
    ///
    /// A no-op if no listener is running.
    pub async fn stop(&self) -> Result<()> {
        let Some(listener) = self.listener.lock().await.take() else {
            return Ok(());
        };

        listener.cancel.cancel();
        // The task hands the transport back on its way out.
        if let Ok(transport) = listener.transport_rx.await {
            *self.transport.lock().await = Some(transport);
        }
        let _ = listener.task.await;
        debug!(port = ?self.port_name, "reader listener stopped");
        Ok(())
    }

    /// Stop listening and close the underlying serial port.
    pub async fn close(&self) -> Result<()> {
        self.stop().await?;
        if let Some(mut transport) = self.transport.lock().await.take() {
            transport.close().await?;
        }
        Ok(())
    }
}

/// What the read arm of the listener loop decided.
enum ReadStep {
    Continue,
    Closed,
}

async fn listener_loop(
    mut transport: Box<dyn Transport>,
    poll_timeout: Duration,
    event_tx: broadcast::Sender<ReaderEvent>,
    diag_tx: broadcast::Sender<Diagnostic>,
    cancel: CancellationToken,
    transport_tx: oneshot::Sender<Box<dyn Transport>>,
) {
    let mut acc = FrameAccumulator::new();
    let _ = event_tx.send(ReaderEvent::Connected);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("listener cancelled");
                break;
            }

            step = read_step(
                transport.as_mut(),
                poll_timeout,
                &mut acc,
                &event_tx,
                &diag_tx,
            ) => {
                if matches!(step, ReadStep::Closed) {
                    break;
                }
            }
        }
    }

    // Hand the transport back even after a connection loss, so close()
    // can still release the port handle.
    let _ = transport_tx.send(transport);
}

async fn read_step(
    transport: &mut dyn Transport,
    poll_timeout: Duration,
    acc: &mut FrameAccumulator,
    event_tx: &broadcast::Sender<ReaderEvent>,
    diag_tx: &broadcast::Sender<Diagnostic>,
) -> ReadStep {
    let mut buf = [0u8; READ_BUF_SIZE];
    match transport.receive(&mut buf, poll_timeout).await {
        Ok(n) if n > 0 => {
            drain_chunk(acc, &buf[..n], event_tx, diag_tx);
            ReadStep::Continue
        }
        Ok(_) => ReadStep::Continue,
        Err(Error::Timeout) => {
            // No tag in range. Back off briefly so a transport that
            // returns immediately cannot spin the loop hot.
            tokio::time::sleep(IDLE_BACKOFF).await;
            ReadStep::Continue
        }
        Err(e) => {
            match e {
                Error::ConnectionLost | Error::NotConnected => {
                    warn!("serial connection lost");
                }
                other => {
                    error!(error = %other, "transport read failed");
                }
            }
            acc.mark_closed();
            let _ = diag_tx.send(Diagnostic::TransportClosed);
            let _ = event_tx.send(ReaderEvent::Disconnected);
            ReadStep::Closed
        }
    }
}

/// Feed one received chunk and publish everything it produced, in order.
fn drain_chunk(
    acc: &mut FrameAccumulator,
    chunk: &[u8],
    event_tx: &broadcast::Sender<ReaderEvent>,
    diag_tx: &broadcast::Sender<Diagnostic>,
) {
    let mut outcome = acc.feed(chunk);
    loop {
        match outcome {
            FrameOutcome::Complete(frame) => match protocol::decode_frame(&frame) {
                Ok(id) => {
                    debug!(tag = %id, "tag detected");
                    let _ = event_tx.send(ReaderEvent::TagDetected(id));
                }
                Err(e) => {
                    warn!(error = %e, frame_len = frame.len(), "discarding malformed frame");
                    let _ = diag_tx.send(Diagnostic::Decode(e));
                }
            },
            FrameOutcome::Overflow => {
                warn!("frame buffer overflow, resynchronizing");
                let _ = diag_tx.send(Diagnostic::BufferOverflow);
            }
            FrameOutcome::Incomplete | FrameOutcome::TransportClosed => break,
        }
        outcome = acc.poll();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{CR, ETX, LF, STX};
    use rfidlib_test_harness::MockTransport;

    fn wire_frame(payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![STX];
        bytes.extend_from_slice(payload);
        bytes.extend_from_slice(&[CR, LF, ETX]);
        bytes
    }

    fn reader_with(mock: MockTransport) -> Mf700Reader {
        Mf700Reader::new(Box::new(mock), Duration::from_millis(10), None)
    }

    async fn recv_event(rx: &mut broadcast::Receiver<ReaderEvent>) -> ReaderEvent {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    async fn recv_diag(rx: &mut broadcast::Receiver<Diagnostic>) -> Diagnostic {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for diagnostic")
            .expect("diagnostic channel closed")
    }

    #[tokio::test]
    async fn delivers_one_event_per_frame_in_order() {
        let mut mock = MockTransport::new();
        // Two frames packed into one read, a third on its own.
        let mut chunk = wire_frame(b"A1");
        chunk.extend_from_slice(&wire_frame(b"B2"));
        mock.push_chunk(&chunk);
        mock.push_chunk(&wire_frame(b"C3"));

        let reader = reader_with(mock);
        let mut rx = reader.subscribe();
        reader.start().await.unwrap();

        assert_eq!(recv_event(&mut rx).await, ReaderEvent::Connected);
        for expected in ["A1", "B2", "C3"] {
            match recv_event(&mut rx).await {
                ReaderEvent::TagDetected(id) => assert_eq!(id.as_str(), expected),
                other => panic!("expected TagDetected, got {other:?}"),
            }
        }

        reader.stop().await.unwrap();
    }

    #[tokio::test]
    async fn frame_split_across_reads_is_reassembled() {
        let mut mock = MockTransport::new();
        let frame = wire_frame(b"0006541358");
        let (head, tail) = frame.split_at(4);
        mock.push_chunk(head);
        mock.push_chunk(tail);

        let reader = reader_with(mock);
        let mut rx = reader.subscribe();
        reader.start().await.unwrap();

        assert_eq!(recv_event(&mut rx).await, ReaderEvent::Connected);
        match recv_event(&mut rx).await {
            ReaderEvent::TagDetected(id) => assert_eq!(id.as_str(), "0006541358"),
            other => panic!("expected TagDetected, got {other:?}"),
        }

        reader.stop().await.unwrap();
    }

    #[tokio::test]
    async fn malformed_frame_reports_diagnostic_and_keeps_listening() {
        let mut mock = MockTransport::new();
        // ETX-terminated frame with no STX, then a valid frame.
        mock.push_chunk(&[b'J', b'U', b'N', b'K', ETX]);
        mock.push_chunk(&wire_frame(b"OK"));

        let reader = reader_with(mock);
        let mut events = reader.subscribe();
        let mut diags = reader.subscribe_diagnostics();
        reader.start().await.unwrap();

        assert_eq!(
            recv_diag(&mut diags).await,
            Diagnostic::Decode(DecodeError::MissingStart)
        );

        assert_eq!(recv_event(&mut events).await, ReaderEvent::Connected);
        match recv_event(&mut events).await {
            ReaderEvent::TagDetected(id) => assert_eq!(id.as_str(), "OK"),
            other => panic!("expected TagDetected, got {other:?}"),
        }

        reader.stop().await.unwrap();
    }

    #[tokio::test]
    async fn overflow_reports_diagnostic_and_recovers() {
        let mut mock = MockTransport::new();
        let mut chunk = vec![b'X'; 60]; // garbage, no terminator
        chunk.extend_from_slice(&wire_frame(b"AFTER"));
        mock.push_chunk(&chunk);

        let reader = reader_with(mock);
        let mut events = reader.subscribe();
        let mut diags = reader.subscribe_diagnostics();
        reader.start().await.unwrap();

        assert_eq!(recv_diag(&mut diags).await, Diagnostic::BufferOverflow);

        assert_eq!(recv_event(&mut events).await, ReaderEvent::Connected);
        match recv_event(&mut events).await {
            ReaderEvent::TagDetected(id) => assert_eq!(id.as_str(), "AFTER"),
            other => panic!("expected TagDetected, got {other:?}"),
        }

        reader.stop().await.unwrap();
    }

    /// Wait for `is_listening()` to settle to the expected value. The
    /// listener sends its final events just before the task returns, so
    /// an observer can see `Disconnected` a moment before the task is
    /// actually finished.
    async fn wait_for_listening(reader: &Mf700Reader, expected: bool) {
        for _ in 0..100 {
            if reader.is_listening().await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("is_listening never became {expected}");
    }

    #[tokio::test]
    async fn connection_loss_emits_disconnected_and_diagnostic() {
        let mut mock = MockTransport::new();
        mock.push_chunk(&wire_frame(b"LAST"));
        mock.close_when_drained(true);

        let reader = reader_with(mock);
        let mut events = reader.subscribe();
        let mut diags = reader.subscribe_diagnostics();
        reader.start().await.unwrap();

        assert_eq!(recv_event(&mut events).await, ReaderEvent::Connected);
        match recv_event(&mut events).await {
            ReaderEvent::TagDetected(id) => assert_eq!(id.as_str(), "LAST"),
            other => panic!("expected TagDetected, got {other:?}"),
        }
        assert_eq!(recv_event(&mut events).await, ReaderEvent::Disconnected);
        assert_eq!(recv_diag(&mut diags).await, Diagnostic::TransportClosed);

        reader.stop().await.unwrap();
    }

    #[tokio::test]
    async fn connection_loss_stops_reporting_listening() {
        let mut mock = MockTransport::new();
        mock.close_when_drained(true);

        let reader = reader_with(mock);
        let mut events = reader.subscribe();
        reader.start().await.unwrap();
        assert!(reader.is_listening().await);

        assert_eq!(recv_event(&mut events).await, ReaderEvent::Connected);
        assert_eq!(recv_event(&mut events).await, ReaderEvent::Disconnected);
        wait_for_listening(&reader, false).await;

        reader.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_recovers_transport_for_restart() {
        let mut mock = MockTransport::new();
        mock.push_chunk(&wire_frame(b"ONE"));

        let reader = reader_with(mock);
        let mut rx = reader.subscribe();
        reader.start().await.unwrap();
        assert!(reader.is_listening().await);

        assert_eq!(recv_event(&mut rx).await, ReaderEvent::Connected);
        match recv_event(&mut rx).await {
            ReaderEvent::TagDetected(id) => assert_eq!(id.as_str(), "ONE"),
            other => panic!("expected TagDetected, got {other:?}"),
        }

        reader.stop().await.unwrap();
        assert!(!reader.is_listening().await);

        // The transport came back; a second start succeeds.
        reader.start().await.unwrap();
        assert_eq!(recv_event(&mut rx).await, ReaderEvent::Connected);
        reader.stop().await.unwrap();
    }

    #[tokio::test]
    async fn start_twice_is_noop() {
        let reader = reader_with(MockTransport::new());
        reader.start().await.unwrap();
        reader.start().await.unwrap();
        reader.stop().await.unwrap();
    }

    #[tokio::test]
    async fn close_releases_transport() {
        let reader = reader_with(MockTransport::new());
        reader.start().await.unwrap();
        reader.close().await.unwrap();

        // Transport is gone; restarting is an error.
        assert!(matches!(reader.start().await, Err(Error::NotConnected)));
    }
}
