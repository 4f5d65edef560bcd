/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Establishing an outbound connection failed (refused, timed out,
    /// DNS failure).
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),

    /// Binding a local socket failed.
    #[error("bind failed: {0}")]
    Bind(#[source] std::io::Error),

    /// Accepting an inbound connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// Sending data failed.
    #[error("send failed: {0}")]
    Send(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    Recv(#[source] std::io::Error),
}
