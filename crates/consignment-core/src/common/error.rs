//! Error types for the order-management service.
//!
//! [`Error`] captures every reportable failure of a request. It converts into
//! `tonic::Status` so handlers can propagate with `?` and clients receive an
//! appropriate status code.
//!
//! ## Error Cases
//! - `NotFound`: unknown product or order identifier.
//! - `Transport`: the inbound stream failed with something other than a clean
//!   end-of-input.
//! - `MalformedInput`: an inbound message cannot be applied (recovered
//!   locally by the update stream).
//! - `ChannelError`: the outbound channel to the client is closed.
//! - `InvalidRequest`: the request was rejected before any work started.
//! - `ServiceShutdown`: a request arrived while the service was shutting down.
//! - `SessionClosed`: an event was delivered to a session that already ended.

use tonic::Status;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Unified error type for the order-management service.
#[derive(Clone, thiserror::Error, Debug)]
pub enum Error {
    /// No record exists for the identifier.
    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: String },

    /// Receive failure on an inbound stream.
    #[error("Transport error: {0}")]
    Transport(Status),

    /// The inbound message is not usable.
    #[error("Malformed input: {reason}")]
    MalformedInput { reason: String },

    /// Internal channel send/receive failure (e.g. the client went away).
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// The client request was invalid.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The service is in the process of shutting down.
    #[error("Service is shutting down")]
    ServiceShutdown,

    /// The processing session has already reached its terminal state.
    #[error("Processing session is closed")]
    SessionClosed,
}

impl Error {
    pub fn order_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Order",
            id: id.into(),
        }
    }

    pub fn product_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Product",
            id: id.into(),
        }
    }
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound { .. } => Status::not_found(err.to_string()),
            Error::Transport(status) => status,
            Error::MalformedInput { reason } | Error::InvalidRequest { reason } => {
                Status::invalid_argument(reason)
            }
            Error::ChannelError { context } => {
                Status::internal(format!("Channel error: {context}"))
            }
            Error::ServiceShutdown => Status::unavailable("Service is shutting down"),
            Error::SessionClosed => Status::failed_precondition("Processing session is closed"),
        }
    }
}
