//! Interceptor capability

use super::Message;

/// What an [`Interceptor`] wants to happen to a message about to be sent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendDecision {
    /// Hand the message to the sender
    Proceed,

    /// Silently drop the message
    Cancel,
}

/// The message about to be sent, as seen by [`Interceptor::on_sending`]
#[derive(Debug)]
pub struct SendingContext<'a> {
    message: &'a Message,
}

impl<'a> SendingContext<'a> {
    pub(crate) fn new(message: &'a Message) -> Self {
        Self { message }
    }

    /// The message being sent
    pub fn message(&self) -> &'a Message {
        self.message
    }
}

/// Observes and vetoes deliveries
pub trait Interceptor: Send + Sync + 'static {
    /// Called before the message is handed to the sender.
    ///
    /// Returning [`SendDecision::Cancel`] suppresses the send; neither the sender
    /// nor [`Interceptor::on_sent`] are invoked afterwards.
    fn on_sending(&self, context: &SendingContext<'_>) -> SendDecision;

    /// Called once the sender reported success.
    fn on_sent(&self, message: &Message);
}

#[cfg(test)]
pub use recording::{CallLog, RecordingInterceptor};
