//! Error types for the protocol layer.
//!
//! Partial data is never an error here: the stream codec absorbs it by
//! returning "no frame yet" and waiting for more bytes. Everything below
//! is either a caller mistake caught before any I/O happens (bad config,
//! duplicate registration, out-of-range values) or a peer speaking a
//! different protocol (unknown type codes, truncated datagrams).

/// Errors that can occur while encoding, decoding, or registering messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A codec was configured with field widths outside `1..=8`.
    #[error("invalid codec config: {0}")]
    InvalidConfig(String),

    /// The type code does not fit in the configured type field.
    #[error("type code {code} does not fit in {width} byte(s)")]
    TypeOutOfRange { code: u64, width: usize },

    /// The payload does not fit in the configured length field.
    #[error("payload of {len} bytes exceeds the {max}-byte limit of a {width}-byte length field")]
    PayloadTooLarge { len: usize, max: u64, width: usize },

    /// A datagram ended before the type field did.
    ///
    /// Datagram frames carry no length field, so the only malformed shape
    /// a datagram can take is being shorter than the type code itself.
    #[error("datagram of {len} byte(s) is shorter than the {width}-byte type field")]
    TruncatedDatagram { len: usize, width: usize },

    /// No message kind is registered for this type code.
    ///
    /// Surfaced to the caller rather than dropped: an unregistered code
    /// means the peer is speaking a different protocol version, and
    /// silently ignoring it would corrupt dispatch without a trace.
    #[error("unknown message type {0}")]
    UnknownMessageType(u64),

    /// A typed send was attempted for a kind the registry does not know.
    #[error("message kind {0} is not registered")]
    UnregisteredKind(&'static str),

    /// Two message kinds were registered under the same type code.
    ///
    /// Raised at registration time, before any connection exists.
    #[error("duplicate type code {code}: {existing} and {duplicate}")]
    DuplicateTypeCode {
        code: u64,
        existing: &'static str,
        duplicate: &'static str,
    },

    /// The same message kind was registered under two type codes.
    #[error("message kind {0} is already registered")]
    DuplicateKind(&'static str),

    /// A message kind failed to serialize its payload.
    #[error("encode failed for {kind}: {reason}")]
    Encode { kind: &'static str, reason: String },

    /// A message kind failed to parse its payload.
    #[error("decode failed for {kind}: {reason}")]
    Decode { kind: &'static str, reason: String },
}
