//! Error types for rfidlib.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport-layer and configuration
//! errors are captured here; protocol-level frame decode errors live with
//! the protocol engine in `rfidlib-mf700`, since they are recoverable
//! conditions reported through the diagnostics channel rather than
//! failures of an operation.

/// The error type for all rfidlib operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port open failure, device error).
    #[error("transport error: {0}")]
    Transport(String),

    /// An invalid parameter was passed when configuring a reader.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Timed out waiting for data from the reader.
    ///
    /// This is the normal idle condition for a receive-only device: the
    /// reader only transmits when a tag is in range.
    #[error("timeout waiting for data")]
    Timeout,

    /// No connection to the reader has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection to the reader was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_transport() {
        let e = Error::Transport("port busy".into());
        assert_eq!(e.to_string(), "transport error: port busy");
    }

    #[test]
    fn error_display_invalid_parameter() {
        let e = Error::InvalidParameter("baud rate must be positive".into());
        assert_eq!(
            e.to_string(),
            "invalid parameter: baud rate must be positive"
        );
    }

    #[test]
    fn error_display_timeout() {
        let e = Error::Timeout;
        assert_eq!(e.to_string(), "timeout waiting for data");
    }

    #[test]
    fn error_display_not_connected() {
        let e = Error::NotConnected;
        assert_eq!(e.to_string(), "not connected");
    }

    #[test]
    fn error_display_connection_lost() {
        let e = Error::ConnectionLost;
        assert_eq!(e.to_string(), "connection lost");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("pipe broken"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<Error>();
    }
}
