//! Message type registry: the static table from wire type codes to typed
//! message kinds.
//!
//! A registry is built once at startup from the closed set of message
//! kinds the protocol declares, then shared read-only (typically behind an
//! `Arc`) by every component that packs, unpacks, or dispatches messages.
//! It is an explicit value passed to whoever needs it — never a hidden
//! process-global.
//!
//! Registration fails fast: a duplicate type code or a kind registered
//! twice is reported from [`RegistryBuilder::register`], before any
//! connection exists.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

use crate::codec::max_for_width;
use crate::error::ProtocolError;
use crate::message::Message;

type DecodeFn = fn(&[u8]) -> Result<Box<dyn Any + Send>, ProtocolError>;

// ---------------------------------------------------------------------------
// Registered kinds and decoded values
// ---------------------------------------------------------------------------

/// One entry in a [`Registry`]: a message kind bound to a type code.
pub struct RegisteredKind {
    code: u64,
    name: &'static str,
    type_id: TypeId,
    decode: DecodeFn,
}

impl RegisteredKind {
    /// The wire type code this kind is registered under.
    pub fn code(&self) -> u64 {
        self.code
    }

    /// The kind's Rust type name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The kind's `TypeId`, used as the routing key.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

impl std::fmt::Debug for RegisteredKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredKind")
            .field("code", &self.code)
            .field("name", &self.name)
            .finish()
    }
}

/// A payload decoded through the registry: the typed value, erased.
///
/// Carries the kind's `TypeId` so a route table can look up the handler
/// without downcasting first, and [`downcast`](Self::downcast) recovers
/// the concrete message for the handler call.
pub struct DecodedMessage {
    type_id: TypeId,
    kind: &'static str,
    value: Box<dyn Any + Send>,
}

impl DecodedMessage {
    /// The `TypeId` of the decoded kind.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The decoded kind's type name, for diagnostics.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Whether the decoded value is an `M`.
    pub fn is<M: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<M>()
    }

    /// Recovers the concrete message, or returns `self` unchanged if the
    /// decoded kind is not an `M`.
    pub fn downcast<M: 'static>(self) -> Result<M, DecodedMessage> {
        let Self { type_id, kind, value } = self;
        match value.downcast::<M>() {
            Ok(message) => Ok(*message),
            Err(value) => Err(Self { type_id, kind, value }),
        }
    }
}

impl std::fmt::Debug for DecodedMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedMessage").field("kind", &self.kind).finish()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Read-only mapping between wire type codes and message kinds.
///
/// Built with [`Registry::builder`]; immutable afterwards, so it may be
/// read concurrently from any number of connections without locking.
#[derive(Debug)]
pub struct Registry {
    by_code: HashMap<u64, RegisteredKind>,
    code_by_type: HashMap<TypeId, u64>,
}

impl Registry {
    /// Starts building a registry for codecs with the given type-field
    /// width; registered codes must fit in that many bytes.
    pub fn builder(type_size_bytes: usize) -> RegistryBuilder {
        RegistryBuilder {
            by_code: HashMap::new(),
            code_by_type: HashMap::new(),
            type_size_bytes,
        }
    }

    /// Looks up the kind registered under `code`.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::UnknownMessageType`] when no kind is registered
    /// for the code — a protocol mismatch between peers, surfaced rather
    /// than dropped.
    pub fn resolve(&self, code: u64) -> Result<&RegisteredKind, ProtocolError> {
        self.by_code
            .get(&code)
            .ok_or(ProtocolError::UnknownMessageType(code))
    }

    /// Resolves `code` and decodes `payload` as that kind.
    pub fn decode(&self, code: u64, payload: &[u8]) -> Result<DecodedMessage, ProtocolError> {
        let entry = self.resolve(code)?;
        Ok(DecodedMessage {
            type_id: entry.type_id,
            kind: entry.name,
            value: (entry.decode)(payload)?,
        })
    }

    /// The type code `M` was registered under, if any.
    pub fn code_of<M: 'static>(&self) -> Option<u64> {
        self.code_by_type.get(&TypeId::of::<M>()).copied()
    }

    /// Packs a typed message into `(code, payload)` for sending.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::UnregisteredKind`] when `M` was never registered,
    /// or the kind's own [`Message::pack`] error.
    pub fn pack_message<M: Message>(&self, message: &M) -> Result<(u64, Vec<u8>), ProtocolError> {
        let code = self
            .code_of::<M>()
            .ok_or(ProtocolError::UnregisteredKind(type_name::<M>()))?;
        Ok((code, message.pack()?))
    }

    /// Whether any kind is registered under `code`.
    pub fn contains(&self, code: u64) -> bool {
        self.by_code.contains_key(&code)
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// Whether the registry has no kinds at all.
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Fail-fast builder for a [`Registry`].
#[derive(Debug)]
pub struct RegistryBuilder {
    by_code: HashMap<u64, RegisteredKind>,
    code_by_type: HashMap<TypeId, u64>,
    type_size_bytes: usize,
}

impl RegistryBuilder {
    /// Registers message kind `M` under `code`.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::TypeOutOfRange`] if `code` does not fit in the
    /// configured type field, [`ProtocolError::DuplicateTypeCode`] if the
    /// code is taken, [`ProtocolError::DuplicateKind`] if `M` is already
    /// registered under another code. All raised here, at declaration
    /// time, never at first use.
    pub fn register<M: Message>(&mut self, code: u64) -> Result<&mut Self, ProtocolError> {
        if code > max_for_width(self.type_size_bytes) {
            return Err(ProtocolError::TypeOutOfRange {
                code,
                width: self.type_size_bytes,
            });
        }
        if let Some(existing) = self.by_code.get(&code) {
            return Err(ProtocolError::DuplicateTypeCode {
                code,
                existing: existing.name,
                duplicate: type_name::<M>(),
            });
        }
        if self.code_by_type.contains_key(&TypeId::of::<M>()) {
            return Err(ProtocolError::DuplicateKind(type_name::<M>()));
        }

        let decode: DecodeFn = |data| Ok(Box::new(M::unpack(data)?));
        self.by_code.insert(
            code,
            RegisteredKind {
                code,
                name: type_name::<M>(),
                type_id: TypeId::of::<M>(),
                decode,
            },
        );
        self.code_by_type.insert(TypeId::of::<M>(), code);
        Ok(self)
    }

    /// Finishes the build; the registry is read-only from here on.
    pub fn build(self) -> Registry {
        Registry {
            by_code: self.by_code,
            code_by_type: self.code_by_type,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
