//! Unified error type for the Wirelink message layer.

use wirelink_protocol::ProtocolError;
use wirelink_transport::TransportError;

use crate::routing::RoutingError;

/// Top-level error that wraps the layer-specific errors.
///
/// When using the `wirelink` crate directly, you deal with this single
/// error type instead of importing errors from each sub-crate. The
/// `#[from]` attributes auto-generate `From` impls, so the `?` operator
/// converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum WirelinkError {
    /// A transport-level error (connect, bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (pack, unpack, registry).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A routing-level error (build or dispatch).
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// A send was attempted on a connection that is not open.
    ///
    /// A local programming error, never retried by this layer.
    #[error("connection is not open")]
    NotConnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: WirelinkError = TransportError::Connect(io).into();
        assert!(matches!(err, WirelinkError::Transport(_)));
        assert!(err.to_string().contains("connect failed"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: WirelinkError = ProtocolError::UnknownMessageType(9).into();
        assert!(matches!(err, WirelinkError::Protocol(_)));
        assert!(err.to_string().contains("unknown message type 9"));
    }

    #[test]
    fn test_from_routing_error() {
        let err: WirelinkError = RoutingError::DuplicateRoute("Move").into();
        assert!(matches!(err, WirelinkError::Routing(_)));
    }
}
