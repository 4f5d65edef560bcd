//! The trait every registrable message kind implements.

use crate::error::ProtocolError;

/// A typed message that can be carried as a frame payload.
///
/// Implementations own their payload encoding entirely — fixed-width
/// binary fields, JSON, anything — as long as `unpack(pack(m)?) == m`.
/// The frame header (type code, length) is the codec's job, never the
/// message's.
///
/// Message kinds are associated with their wire type codes by a
/// [`Registry`](crate::Registry), not by the kind itself, so the same
/// kind can be registered under different codes in different protocols.
pub trait Message: Send + Sized + 'static {
    /// Serializes this message into payload bytes.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Encode`] when the value cannot be represented in
    /// the kind's payload encoding.
    fn pack(&self) -> Result<Vec<u8>, ProtocolError>;

    /// Parses payload bytes into a message.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Decode`] when the bytes are malformed for this
    /// kind.
    fn unpack(data: &[u8]) -> Result<Self, ProtocolError>;
}
