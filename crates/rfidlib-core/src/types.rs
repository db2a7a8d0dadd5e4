//! Core types used throughout rfidlib.

use std::fmt;

/// A decoded RFID tag identifier.
///
/// This is the printable payload extracted from one complete protocol
/// frame: the characters between the STX marker and the CR LF terminator,
/// at exactly their transmitted length. The identifier is opaque to the
/// library — card-number formats vary by tag type and site convention, so
/// interpretation is left to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagIdentifier(String);

impl TagIdentifier {
    /// Create a tag identifier from decoded payload text.
    pub fn new(id: impl Into<String>) -> Self {
        TagIdentifier(id.into())
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identifier, returning the owned payload string.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Length of the identifier in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if the identifier carries no characters.
    ///
    /// An empty identifier is legal on the wire (STX immediately followed
    /// by CR LF); whether it is meaningful is up to the consumer.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TagIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TagIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TagIdentifier {
    fn from(s: &str) -> Self {
        TagIdentifier(s.to_string())
    }
}
