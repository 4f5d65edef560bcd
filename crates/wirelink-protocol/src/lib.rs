//! Wire protocol for Wirelink.
//!
//! This crate defines the "language" that peers speak, with no I/O of its
//! own:
//!
//! - **Codec** ([`StreamCodec`], [`DatagramCodec`], [`FrameCodec`]) — how a
//!   `(type, payload)` pair becomes bytes and comes back, including
//!   reassembly of partial and batched stream reads.
//! - **Frames** ([`Frame`]) — one complete `(type, payload)` unit.
//! - **Messages** ([`Message`], [`Registry`]) — the closed set of typed
//!   message kinds an application declares at startup, keyed by small
//!   integer type codes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding,
//!   decoding, or registering.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the
//! connection machinery. It knows nothing about sockets or handlers —
//! only about turning frames into bytes and back.
//!
//! ```text
//! Transport (bytes) → Codec (Frame) → Registry (typed Message)
//! ```

mod codec;
mod error;
mod frame;
mod message;
mod registry;

pub use codec::{ByteOrder, CodecConfig, DatagramCodec, FrameCodec, StreamCodec};
pub use error::ProtocolError;
pub use frame::Frame;
pub use message::Message;
pub use registry::{DecodedMessage, RegisteredKind, Registry, RegistryBuilder};
