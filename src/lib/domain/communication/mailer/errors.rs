//! Mailer errors

use thiserror::Error;

use super::MediaKind;

/// Errors that can occur when attaching a body variant
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    /// The text has characters the message encoding cannot represent
    #[error("{kind} body cannot be represented in {encoding}")]
    UnmappableText {
        /// The kind of the rejected variant
        kind: MediaKind,

        /// The name of the message encoding
        encoding: &'static str,
    },
}

/// An opaque failure reported by a [`Sender`](super::Sender)
#[derive(Debug, Error)]
#[error(transparent)]
pub struct TransportError(#[from] anyhow::Error);

impl TransportError {
    /// Wraps any error as a transport failure
    pub fn new<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(err.into())
    }

    /// Creates a transport failure from a message
    pub fn msg(message: impl Into<String>) -> Self {
        Self(anyhow::anyhow!(message.into()))
    }
}

/// Errors that can occur when delivering a message
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// A required capability was not supplied
    #[error("delivery helper is missing its {0}")]
    InvalidConfiguration(&'static str),

    /// The message cannot be delivered as given
    #[error("invalid message: {0}")]
    InvalidArgument(String),

    /// The sender failed to transmit the message
    #[error(transparent)]
    Transport(#[from] TransportError),
}
