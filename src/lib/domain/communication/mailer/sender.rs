//! Sender capability

use async_trait::async_trait;

#[cfg(test)]
use mockall::mock;

use super::{Message, TransportError};

/// Transmits messages
#[async_trait]
pub trait Sender: Send + Sync + 'static {
    /// Sends a message, blocking the calling thread until the transport is done.
    ///
    /// # Arguments
    /// * `message` - The [`Message`] to send.
    ///
    /// # Returns
    /// A [`Result`] indicating success, or the [`TransportError`] the transport reported.
    fn send(&self, message: &Message) -> Result<(), TransportError>;

    /// Sends a message without blocking the calling thread.
    ///
    /// # Arguments
    /// * `message` - The [`Message`] to send.
    ///
    /// # Returns
    /// A [`Result`] indicating success, or the [`TransportError`] the transport reported.
    async fn send_async(&self, message: &Message) -> Result<(), TransportError>;
}

#[cfg(test)]
mock! {
    pub Sender {}

    #[async_trait]
    impl Sender for Sender {
        fn send(&self, message: &Message) -> Result<(), TransportError>;
        async fn send_async(&self, message: &Message) -> Result<(), TransportError>;
    }
}
