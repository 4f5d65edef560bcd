//! The unit exchanged over the wire.

use bytes::Bytes;

/// One complete `(type, payload)` unit as it appears on the wire.
///
/// The type code is widened to `u64` in memory regardless of the
/// configured wire width; the codec enforces the width bound when the
/// frame is packed. The payload is a cheaply cloneable [`Bytes`] so a
/// frame split out of a receive buffer shares storage with it instead of
/// copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message type code.
    pub msg_type: u64,
    /// Opaque payload bytes. May be empty.
    pub payload: Bytes,
}

impl Frame {
    /// Creates a frame from a type code and payload bytes.
    pub fn new(msg_type: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            msg_type,
            payload: payload.into(),
        }
    }
}
