//! Frame codecs for stream and datagram transports.
//!
//! Both codecs map a `(type, payload)` pair to bytes and back. They differ
//! only in framing: a stream carries no record boundaries, so the stream
//! codec writes an explicit payload-length field and reassembles frames
//! from an accumulating buffer; a datagram transport delimits every read
//! itself, so the datagram codec writes just `type || payload` and decodes
//! one frame per datagram.
//!
//! ```text
//! stream:    [ type: T bytes ][ length: L bytes ][ payload: length bytes ]
//! datagram:  [ type: T bytes ][ payload: rest of datagram ]
//! ```
//!
//! Field widths and byte order are fixed per [`CodecConfig`] and must
//! match between peers. A mismatch is not detectable at runtime — the
//! decoded type and length are garbage that looks like any other value —
//! so configuration agreement is a protocol-version concern, not an error
//! path.

use bytes::{Buf, BytesMut};

use crate::error::ProtocolError;
use crate::frame::Frame;

/// Widest supported type/length field, in bytes.
const MAX_FIELD_WIDTH: usize = 8;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Byte order for the integer fields of a frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Most significant byte first (network order). The default.
    #[default]
    Big,
    /// Least significant byte first.
    Little,
}

/// Field widths and byte order for a codec.
///
/// Validated at construction and immutable afterwards. Both ends of a
/// connection must use identical values; there is no negotiation.
///
/// The default — a 1-byte type code, a 2-byte length field, big-endian —
/// supports 256 message kinds and stream payloads up to 65535 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    type_size_bytes: usize,
    data_size_bytes: usize,
    byte_order: ByteOrder,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            type_size_bytes: 1,
            data_size_bytes: 2,
            byte_order: ByteOrder::Big,
        }
    }
}

impl CodecConfig {
    /// Creates a config, validating that both field widths are in `1..=8`.
    pub fn new(
        type_size_bytes: usize,
        data_size_bytes: usize,
        byte_order: ByteOrder,
    ) -> Result<Self, ProtocolError> {
        for (name, width) in [
            ("type_size_bytes", type_size_bytes),
            ("data_size_bytes", data_size_bytes),
        ] {
            if width == 0 || width > MAX_FIELD_WIDTH {
                return Err(ProtocolError::InvalidConfig(format!(
                    "{name} must be between 1 and {MAX_FIELD_WIDTH}, got {width}"
                )));
            }
        }
        Ok(Self {
            type_size_bytes,
            data_size_bytes,
            byte_order,
        })
    }

    /// Width of the type-code field in bytes.
    pub fn type_size_bytes(&self) -> usize {
        self.type_size_bytes
    }

    /// Width of the payload-length field in bytes (stream framing only).
    pub fn data_size_bytes(&self) -> usize {
        self.data_size_bytes
    }

    /// Byte order of the integer fields.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Largest type code representable in the configured type field.
    pub fn max_type_code(&self) -> u64 {
        max_for_width(self.type_size_bytes)
    }

    /// Largest payload length representable in the configured length field.
    pub fn max_payload_len(&self) -> u64 {
        max_for_width(self.data_size_bytes)
    }
}

/// Largest unsigned value that fits in `width` bytes.
pub(crate) fn max_for_width(width: usize) -> u64 {
    if width >= MAX_FIELD_WIDTH {
        u64::MAX
    } else {
        (1u64 << (8 * width)) - 1
    }
}

// ---------------------------------------------------------------------------
// Fixed-width integer fields
// ---------------------------------------------------------------------------

/// Appends `value` to `out` as a `width`-byte integer in the given order.
///
/// The caller has already checked that `value` fits in `width` bytes.
fn put_uint(out: &mut Vec<u8>, value: u64, width: usize, order: ByteOrder) {
    match order {
        ByteOrder::Big => out.extend_from_slice(&value.to_be_bytes()[MAX_FIELD_WIDTH - width..]),
        ByteOrder::Little => out.extend_from_slice(&value.to_le_bytes()[..width]),
    }
}

/// Reads an unsigned integer field of up to 8 bytes in the given order.
fn read_uint(bytes: &[u8], order: ByteOrder) -> u64 {
    match order {
        ByteOrder::Big => bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
        ByteOrder::Little => bytes
            .iter()
            .rev()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
    }
}

// ---------------------------------------------------------------------------
// Stream framing
// ---------------------------------------------------------------------------

/// Codec for stream transports: `type || length || payload`.
///
/// Pure with respect to I/O; [`unpack`](Self::unpack) operates on a
/// caller-owned receive buffer and consumes exactly the bytes of each
/// frame it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamCodec {
    config: CodecConfig,
}

impl StreamCodec {
    /// Creates a stream codec with the given configuration.
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// The codec's configuration.
    pub fn config(&self) -> CodecConfig {
        self.config
    }

    /// Combined width of the type and length fields.
    pub fn header_len(&self) -> usize {
        self.config.type_size_bytes + self.config.data_size_bytes
    }

    /// Serializes one frame: `type || len(payload) || payload`.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::TypeOutOfRange`] if the type code does not fit in
    /// the configured type field; [`ProtocolError::PayloadTooLarge`] if
    /// the payload does not fit in the configured length field.
    pub fn pack(&self, msg_type: u64, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        check_type_code(msg_type, self.config.type_size_bytes)?;
        if payload.len() as u64 > self.config.max_payload_len() {
            return Err(ProtocolError::PayloadTooLarge {
                len: payload.len(),
                max: self.config.max_payload_len(),
                width: self.config.data_size_bytes,
            });
        }

        let mut out = Vec::with_capacity(self.header_len() + payload.len());
        put_uint(&mut out, msg_type, self.config.type_size_bytes, self.config.byte_order);
        put_uint(
            &mut out,
            payload.len() as u64,
            self.config.data_size_bytes,
            self.config.byte_order,
        );
        out.extend_from_slice(payload);
        Ok(out)
    }

    /// Extracts the next complete frame from `buffer`, if one has fully
    /// arrived.
    ///
    /// Returns `None` — leaving the buffer untouched — while the header or
    /// the payload is still incomplete; the caller appends the next read
    /// and tries again. On success the frame's bytes are consumed from the
    /// front of the buffer and whatever follows them is retained, so a
    /// single read that batched several frames yields them by calling
    /// `unpack` repeatedly until it returns `None`.
    ///
    /// A zero-length payload is a valid frame.
    pub fn unpack(&self, buffer: &mut BytesMut) -> Option<Frame> {
        let type_width = self.config.type_size_bytes;
        let header_len = self.header_len();
        if buffer.len() < header_len {
            return None;
        }

        let payload_len =
            read_uint(&buffer[type_width..header_len], self.config.byte_order) as usize;
        if buffer.len() < header_len + payload_len {
            return None;
        }

        let msg_type = read_uint(&buffer[..type_width], self.config.byte_order);
        buffer.advance(header_len);
        let payload = buffer.split_to(payload_len).freeze();
        Some(Frame { msg_type, payload })
    }
}

// ---------------------------------------------------------------------------
// Datagram framing
// ---------------------------------------------------------------------------

/// Codec for datagram transports: `type || payload`, no length field.
///
/// The transport's own datagram boundary delimits the payload, so there
/// is no reassembly and no partial state: one datagram is exactly one
/// frame.
///
/// # Precondition
///
/// This framing is only correct if the underlying transport preserves
/// message boundaries exactly — one send arrives as one receive, never
/// merged with or split from its neighbors. UDP satisfies this; a
/// transport that coalesces reads must use [`StreamCodec`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DatagramCodec {
    config: CodecConfig,
}

impl DatagramCodec {
    /// Creates a datagram codec. Only the type width and byte order of
    /// `config` are used; the length field does not exist in this framing.
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// The codec's configuration.
    pub fn config(&self) -> CodecConfig {
        self.config
    }

    /// Serializes one frame: `type || payload`.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::TypeOutOfRange`] if the type code does not fit in
    /// the configured type field.
    pub fn pack(&self, msg_type: u64, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        check_type_code(msg_type, self.config.type_size_bytes)?;
        let mut out = Vec::with_capacity(self.config.type_size_bytes + payload.len());
        put_uint(&mut out, msg_type, self.config.type_size_bytes, self.config.byte_order);
        out.extend_from_slice(payload);
        Ok(out)
    }

    /// Decodes one whole datagram into a frame.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::TruncatedDatagram`] if the datagram is shorter
    /// than the type field.
    pub fn unpack(&self, datagram: &[u8]) -> Result<Frame, ProtocolError> {
        let type_width = self.config.type_size_bytes;
        if datagram.len() < type_width {
            return Err(ProtocolError::TruncatedDatagram {
                len: datagram.len(),
                width: type_width,
            });
        }
        Ok(Frame::new(
            read_uint(&datagram[..type_width], self.config.byte_order),
            datagram[type_width..].to_vec(),
        ))
    }
}

fn check_type_code(msg_type: u64, width: usize) -> Result<(), ProtocolError> {
    if msg_type > max_for_width(width) {
        return Err(ProtocolError::TypeOutOfRange {
            code: msg_type,
            width,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Framing selection
// ---------------------------------------------------------------------------

/// A codec for either framing, selected by the transport a connection
/// runs over. Stream and datagram connections share all of their state
/// machine logic; this enum is the one point where the framing strategies
/// diverge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameCodec {
    /// Length-prefixed framing for stream transports.
    Stream(StreamCodec),
    /// Boundary-delimited framing for datagram transports.
    Datagram(DatagramCodec),
}

impl FrameCodec {
    /// Serializes one frame using the selected framing.
    pub fn pack(&self, msg_type: u64, payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        match self {
            FrameCodec::Stream(codec) => codec.pack(msg_type, payload),
            FrameCodec::Datagram(codec) => codec.pack(msg_type, payload),
        }
    }

    /// The codec's configuration.
    pub fn config(&self) -> CodecConfig {
        match self {
            FrameCodec::Stream(codec) => codec.config(),
            FrameCodec::Datagram(codec) => codec.config(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stream() -> StreamCodec {
        StreamCodec::new(CodecConfig::default())
    }

    fn datagram() -> DatagramCodec {
        DatagramCodec::new(CodecConfig::default())
    }

    // =====================================================================
    // Configuration
    // =====================================================================

    #[test]
    fn test_default_config() {
        let config = CodecConfig::default();
        assert_eq!(config.type_size_bytes(), 1);
        assert_eq!(config.data_size_bytes(), 2);
        assert_eq!(config.byte_order(), ByteOrder::Big);
        assert_eq!(config.max_type_code(), 255);
        assert_eq!(config.max_payload_len(), 65535);
    }

    #[test]
    fn test_config_rejects_zero_width() {
        assert!(CodecConfig::new(0, 2, ByteOrder::Big).is_err());
        assert!(CodecConfig::new(1, 0, ByteOrder::Big).is_err());
    }

    #[test]
    fn test_config_rejects_oversized_width() {
        assert!(CodecConfig::new(9, 2, ByteOrder::Big).is_err());
        assert!(CodecConfig::new(1, 9, ByteOrder::Big).is_err());
    }

    #[test]
    fn test_full_width_fields_allowed() {
        let config = CodecConfig::new(8, 8, ByteOrder::Big).unwrap();
        assert_eq!(config.max_type_code(), u64::MAX);
        assert_eq!(config.max_payload_len(), u64::MAX);
    }

    // =====================================================================
    // Stream pack
    // =====================================================================

    #[test]
    fn test_pack_layout_big_endian() {
        // 1-byte type, 2-byte big-endian length, then the payload.
        let bytes = stream().pack(5, b"hello").unwrap();
        assert_eq!(bytes, [&[5u8, 0, 5][..], &b"hello"[..]].concat());
    }

    #[test]
    fn test_pack_layout_little_endian() {
        let codec = StreamCodec::new(CodecConfig::new(2, 2, ByteOrder::Little).unwrap());
        let bytes = codec.pack(0x0102, b"ab").unwrap();
        assert_eq!(bytes, vec![0x02, 0x01, 2, 0, b'a', b'b']);
    }

    #[test]
    fn test_pack_type_out_of_range() {
        let err = stream().pack(256, b"").unwrap_err();
        assert!(matches!(err, ProtocolError::TypeOutOfRange { code: 256, width: 1 }));
    }

    #[test]
    fn test_pack_payload_too_large() {
        let payload = vec![0u8; 65536];
        let err = stream().pack(0, &payload).unwrap_err();
        assert!(matches!(err, ProtocolError::PayloadTooLarge { len: 65536, .. }));
    }

    #[test]
    fn test_pack_max_values_fit() {
        assert!(stream().pack(255, &vec![0u8; 65535]).is_ok());
    }

    // =====================================================================
    // Stream unpack — the reassembly contract
    // =====================================================================

    #[test]
    fn test_round_trip() {
        let codec = stream();
        let mut buffer = BytesMut::from(&codec.pack(5, b"hello").unwrap()[..]);
        let frame = codec.unpack(&mut buffer).expect("complete frame");
        assert_eq!(frame, Frame::new(5, &b"hello"[..]));
        assert!(buffer.is_empty());
        assert_eq!(codec.unpack(&mut buffer), None);
    }

    #[test]
    fn test_round_trip_zero_length_payload() {
        let codec = stream();
        let mut buffer = BytesMut::from(&codec.pack(3, b"").unwrap()[..]);
        let frame = codec.unpack(&mut buffer).expect("complete frame");
        assert_eq!(frame, Frame::new(3, &b""[..]));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_partial_delivery_byte_at_a_time() {
        // No frame until the very last byte arrives; the buffer is left
        // untouched on every short read.
        let codec = stream();
        let wire = codec.pack(5, b"hello").unwrap();
        let mut buffer = BytesMut::new();

        for &byte in &wire[..wire.len() - 1] {
            buffer.extend_from_slice(&[byte]);
            let before = buffer.len();
            assert_eq!(codec.unpack(&mut buffer), None);
            assert_eq!(buffer.len(), before);
        }

        buffer.extend_from_slice(&wire[wire.len() - 1..]);
        let frame = codec.unpack(&mut buffer).expect("complete frame");
        assert_eq!(frame, Frame::new(5, &b"hello"[..]));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_batched_frames_in_one_buffer() {
        let codec = stream();
        let second = codec.pack(2, b"bb").unwrap();
        let mut buffer = BytesMut::from(&codec.pack(1, b"a").unwrap()[..]);
        buffer.extend_from_slice(&second);

        let frame = codec.unpack(&mut buffer).expect("first frame");
        assert_eq!(frame, Frame::new(1, &b"a"[..]));
        assert_eq!(&buffer[..], &second[..]);

        let frame = codec.unpack(&mut buffer).expect("second frame");
        assert_eq!(frame, Frame::new(2, &b"bb"[..]));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_complete_frame_plus_partial_remainder() {
        let codec = stream();
        let mut buffer = BytesMut::from(&codec.pack(1, b"a").unwrap()[..]);
        buffer.extend_from_slice(&codec.pack(2, b"bb").unwrap()[..3]);

        assert_eq!(codec.unpack(&mut buffer), Some(Frame::new(1, &b"a"[..])));
        assert_eq!(codec.unpack(&mut buffer), None);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_unpack_wide_fields_little_endian() {
        let config = CodecConfig::new(3, 4, ByteOrder::Little).unwrap();
        let codec = StreamCodec::new(config);
        let mut buffer = BytesMut::from(&codec.pack(0x01_02_03, b"xyz").unwrap()[..]);
        let frame = codec.unpack(&mut buffer).expect("complete frame");
        assert_eq!(frame.msg_type, 0x01_02_03);
        assert_eq!(&frame.payload[..], b"xyz");
    }

    // =====================================================================
    // Datagram framing
    // =====================================================================

    #[test]
    fn test_datagram_round_trip() {
        let codec = datagram();
        let wire = codec.pack(9, b"state").unwrap();
        assert_eq!(wire, [&[9u8][..], &b"state"[..]].concat());
        assert_eq!(codec.unpack(&wire).unwrap(), Frame::new(9, &b"state"[..]));
    }

    #[test]
    fn test_datagram_empty_payload() {
        let codec = datagram();
        let wire = codec.pack(4, b"").unwrap();
        assert_eq!(codec.unpack(&wire).unwrap(), Frame::new(4, &b""[..]));
    }

    #[test]
    fn test_datagram_truncated() {
        let codec = DatagramCodec::new(CodecConfig::new(2, 2, ByteOrder::Big).unwrap());
        let err = codec.unpack(&[0x01]).unwrap_err();
        assert!(matches!(err, ProtocolError::TruncatedDatagram { len: 1, width: 2 }));
    }

    #[test]
    fn test_datagram_type_out_of_range() {
        let err = datagram().pack(1000, b"").unwrap_err();
        assert!(matches!(err, ProtocolError::TypeOutOfRange { code: 1000, width: 1 }));
    }

    // =====================================================================
    // FrameCodec
    // =====================================================================

    #[test]
    fn test_frame_codec_pack_matches_inner() {
        let config = CodecConfig::default();
        let by_enum = FrameCodec::Stream(StreamCodec::new(config)).pack(1, b"x").unwrap();
        assert_eq!(by_enum, StreamCodec::new(config).pack(1, b"x").unwrap());

        let by_enum = FrameCodec::Datagram(DatagramCodec::new(config)).pack(1, b"x").unwrap();
        assert_eq!(by_enum, DatagramCodec::new(config).pack(1, b"x").unwrap());
    }
}
