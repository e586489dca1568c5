//! Intercepted delivery

use std::{fmt, sync::Arc};

use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{DeliveryError, Interceptor, Message, SendDecision, Sender, SendingContext};

/// The outcome of a delivery that did not fail
#[derive(Debug, PartialEq, Eq)]
pub enum Delivery {
    /// The sender transmitted the message and the post-send hook ran
    Sent(Message),

    /// The interceptor vetoed the send; nothing was transmitted
    Cancelled(Message),
}

impl Delivery {
    /// Whether the message was transmitted
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }

    /// The message that was delivered or cancelled
    pub fn message(&self) -> &Message {
        match self {
            Self::Sent(message) | Self::Cancelled(message) => message,
        }
    }

    /// Takes back ownership of the message
    pub fn into_message(self) -> Message {
        match self {
            Self::Sent(message) | Self::Cancelled(message) => message,
        }
    }
}

/// Drives one [`Interceptor`] and one [`Sender`] for each delivery.
///
/// Holds no state across calls: delivering the same message twice runs the
/// hooks and the sender twice.
pub struct DeliveryHelper<S, I>
where
    S: Sender,
    I: Interceptor,
{
    sender: Arc<S>,
    interceptor: Arc<I>,
}

impl<S, I> DeliveryHelper<S, I>
where
    S: Sender,
    I: Interceptor,
{
    /// Creates a new delivery helper.
    pub fn new(sender: Arc<S>, interceptor: Arc<I>) -> Self {
        Self {
            sender,
            interceptor,
        }
    }

    /// Starts building a delivery helper from optional parts.
    pub fn builder() -> DeliveryHelperBuilder<S, I> {
        DeliveryHelperBuilder::default()
    }

    /// Delivers a message, blocking on the sender's synchronous transport.
    ///
    /// # Arguments
    /// * `message` - The [`Message`] to deliver.
    ///
    /// # Returns
    /// - [`Ok`] with [`Delivery::Sent`] once the message was sent and the post-send hook ran.
    /// - [`Ok`] with [`Delivery::Cancelled`] if the interceptor vetoed the send.
    /// - [`Err`] with a [`DeliveryError`] if the message is undeliverable or the transport failed.
    pub fn deliver(&self, message: Message) -> Result<Delivery, DeliveryError> {
        if self.intercept(&message)? == SendDecision::Cancel {
            return Ok(Delivery::Cancelled(message));
        }

        self.sender.send(&message)?;

        Ok(self.sent(message))
    }

    /// Delivers a message through the sender's asynchronous transport.
    ///
    /// The post-send hook runs after the transport future completes, on
    /// whichever worker polls it. If the transport fails the hook is not run.
    ///
    /// # Arguments
    /// * `message` - The [`Message`] to deliver.
    ///
    /// # Returns
    /// The same outcomes as [`DeliveryHelper::deliver`].
    pub async fn deliver_async(&self, message: Message) -> Result<Delivery, DeliveryError> {
        if self.intercept(&message)? == SendDecision::Cancel {
            return Ok(Delivery::Cancelled(message));
        }

        self.sender.send_async(&message).await?;

        Ok(self.sent(message))
    }

    /// Runs [`DeliveryHelper::deliver_async`] on a new tokio task.
    pub fn spawn(&self, message: Message) -> JoinHandle<Result<Delivery, DeliveryError>> {
        let helper = self.clone();

        tokio::spawn(async move { helper.deliver_async(message).await })
    }

    fn intercept(&self, message: &Message) -> Result<SendDecision, DeliveryError> {
        if message.to.is_empty() {
            return Err(DeliveryError::InvalidArgument(
                "message has no recipients".to_string(),
            ));
        }

        if !message.has_body() {
            return Err(DeliveryError::InvalidArgument(
                "message has no body variants".to_string(),
            ));
        }

        let decision = self.interceptor.on_sending(&SendingContext::new(message));

        if decision == SendDecision::Cancel {
            debug!(subject = %message.subject, "delivery cancelled by interceptor");
        }

        Ok(decision)
    }

    fn sent(&self, message: Message) -> Delivery {
        info!(subject = %message.subject, recipients = message.to.len(), "message sent");

        self.interceptor.on_sent(&message);

        Delivery::Sent(message)
    }
}

impl<S, I> Clone for DeliveryHelper<S, I>
where
    S: Sender,
    I: Interceptor,
{
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
            interceptor: Arc::clone(&self.interceptor),
        }
    }
}

impl<S, I> fmt::Debug for DeliveryHelper<S, I>
where
    S: Sender,
    I: Interceptor,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryHelper")
            .field("sender", &"Sender")
            .field("interceptor", &"Interceptor")
            .finish()
    }
}

/// Builder for a [`DeliveryHelper`]
pub struct DeliveryHelperBuilder<S, I> {
    sender: Option<Arc<S>>,
    interceptor: Option<Arc<I>>,
}

impl<S, I> Default for DeliveryHelperBuilder<S, I> {
    fn default() -> Self {
        Self {
            sender: None,
            interceptor: None,
        }
    }
}

impl<S, I> DeliveryHelperBuilder<S, I>
where
    S: Sender,
    I: Interceptor,
{
    /// Sets the sender
    pub fn sender(mut self, sender: Arc<S>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Sets the interceptor
    pub fn interceptor(mut self, interceptor: Arc<I>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    /// Builds the helper, failing with [`DeliveryError::InvalidConfiguration`]
    /// if either capability is missing.
    pub fn build(self) -> Result<DeliveryHelper<S, I>, DeliveryError> {
        let sender = self
            .sender
            .ok_or(DeliveryError::InvalidConfiguration("sender"))?;
        let interceptor = self
            .interceptor
            .ok_or(DeliveryError::InvalidConfiguration("interceptor"))?;

        Ok(DeliveryHelper::new(sender, interceptor))
    }
}

impl<S, I> fmt::Debug for DeliveryHelperBuilder<S, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryHelperBuilder")
            .field("sender", &self.sender.is_some())
            .field("interceptor", &self.interceptor.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::domain::communication::{
        email_addresses::EmailAddress,
        mailer::{
            tests::{CallLog, MockSender, RecordingInterceptor},
            MediaKind, TransportError,
        },
    };

    use super::*;

    fn message() -> Message {
        let mut message = Message::new(
            EmailAddress::new_unchecked("from@example.com"),
            EmailAddress::new_unchecked("to@example.com"),
            "Welcome",
        );
        message.attach(MediaKind::PlainText, "Hi").unwrap();
        message
    }

    fn recording_sender(log: &CallLog, sends: usize, async_sends: usize) -> MockSender {
        let mut sender = MockSender::new();

        let sync_log = log.clone();
        sender.expect_send().times(sends).returning(move |_| {
            sync_log.push("send");
            Ok(())
        });

        let async_log = log.clone();
        sender.expect_send_async().times(async_sends).returning(move |_| {
            async_log.push("send");
            Ok(())
        });

        sender
    }

    fn helper(
        sender: MockSender,
        log: &CallLog,
        decision: SendDecision,
    ) -> DeliveryHelper<MockSender, RecordingInterceptor> {
        DeliveryHelper::new(
            Arc::new(sender),
            Arc::new(RecordingInterceptor::new(log.clone(), decision)),
        )
    }

    #[test]
    fn test_deliver_runs_hooks_around_send() -> TestResult {
        let log = CallLog::default();
        let mut sender = MockSender::new();
        let send_log = log.clone();
        sender.expect_send().times(1).returning(move |_| {
            send_log.push("send");
            Ok(())
        });
        sender.expect_send_async().times(0);

        let helper = helper(sender, &log, SendDecision::Proceed);

        let delivery = helper.deliver(message())?;

        assert!(delivery.is_sent());
        assert_eq!(delivery.message().subject, "Welcome");
        assert_eq!(log.calls(), vec!["on_sending", "send", "on_sent"]);

        Ok(())
    }

    #[test]
    fn test_deliver_cancelled_skips_sender_and_post_send_hook() -> TestResult {
        let log = CallLog::default();
        let helper = helper(recording_sender(&log, 0, 0), &log, SendDecision::Cancel);

        let delivery = helper.deliver(message())?;

        assert_eq!(delivery, Delivery::Cancelled(message()));
        assert_eq!(log.calls(), vec!["on_sending"]);

        Ok(())
    }

    #[test]
    fn test_deliver_propagates_transport_failure_without_post_send_hook() {
        let log = CallLog::default();
        let mut sender = MockSender::new();
        sender
            .expect_send()
            .times(1)
            .returning(|_| Err(TransportError::msg("connection refused")));

        let helper = helper(sender, &log, SendDecision::Proceed);

        let result = helper.deliver(message());

        assert!(matches!(
            result,
            Err(DeliveryError::Transport(ref err)) if err.to_string() == "connection refused"
        ));
        assert_eq!(log.calls(), vec!["on_sending"]);
    }

    #[test]
    fn test_deliver_twice_sends_twice() -> TestResult {
        let log = CallLog::default();
        let mut sender = MockSender::new();
        sender.expect_send().times(2).returning(|_| Ok(()));

        let helper = helper(sender, &log, SendDecision::Proceed);

        let first = helper.deliver(message())?;
        let second = helper.deliver(first.into_message())?;

        assert!(second.is_sent());
        assert_eq!(
            log.calls(),
            vec!["on_sending", "on_sent", "on_sending", "on_sent"]
        );

        Ok(())
    }

    #[test]
    fn test_deliver_rejects_message_without_body() {
        let log = CallLog::default();
        let helper = helper(recording_sender(&log, 0, 0), &log, SendDecision::Proceed);

        let message = Message::new(
            EmailAddress::new_unchecked("from@example.com"),
            EmailAddress::new_unchecked("to@example.com"),
            "Empty",
        );

        let result = helper.deliver(message);

        assert!(matches!(result, Err(DeliveryError::InvalidArgument(_))));
        assert!(log.calls().is_empty());
    }

    #[test]
    fn test_deliver_rejects_message_without_recipients() {
        let log = CallLog::default();
        let helper = helper(recording_sender(&log, 0, 0), &log, SendDecision::Proceed);

        let mut message = message();
        message.to.clear();

        let result = helper.deliver(message);

        assert!(matches!(result, Err(DeliveryError::InvalidArgument(_))));
        assert!(log.calls().is_empty());
    }

    #[tokio::test]
    async fn test_deliver_async_runs_hooks_around_send() -> TestResult {
        let log = CallLog::default();
        let mut sender = MockSender::new();
        let send_log = log.clone();
        sender.expect_send().times(0);
        sender.expect_send_async().times(1).returning(move |_| {
            send_log.push("send");
            Ok(())
        });

        let helper = helper(sender, &log, SendDecision::Proceed);

        let delivery = helper.deliver_async(message()).await?;

        assert!(delivery.is_sent());
        assert_eq!(log.calls(), vec!["on_sending", "send", "on_sent"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_deliver_async_cancelled_skips_sender() -> TestResult {
        let log = CallLog::default();
        let helper = helper(recording_sender(&log, 0, 0), &log, SendDecision::Cancel);

        let delivery = helper.deliver_async(message()).await?;

        assert!(!delivery.is_sent());
        assert_eq!(log.calls(), vec!["on_sending"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_deliver_async_failure_skips_post_send_hook() {
        let log = CallLog::default();
        let mut sender = MockSender::new();
        sender
            .expect_send_async()
            .times(1)
            .returning(|_| Err(TransportError::msg("timed out")));

        let helper = helper(sender, &log, SendDecision::Proceed);

        let result = helper.deliver_async(message()).await;

        assert!(matches!(result, Err(DeliveryError::Transport(_))));
        assert_eq!(log.calls(), vec!["on_sending"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_spawned_delivery_resolves_after_post_send_hook() -> TestResult {
        let log = CallLog::default();
        let helper = helper(recording_sender(&log, 0, 1), &log, SendDecision::Proceed);

        let delivery = helper.spawn(message()).await??;

        assert!(delivery.is_sent());
        assert_eq!(log.calls(), vec!["on_sending", "send", "on_sent"]);

        Ok(())
    }

    #[test]
    fn test_builder_requires_sender() {
        let log = CallLog::default();

        let result = DeliveryHelper::<MockSender, RecordingInterceptor>::builder()
            .interceptor(Arc::new(RecordingInterceptor::new(
                log,
                SendDecision::Proceed,
            )))
            .build();

        assert!(matches!(
            result,
            Err(DeliveryError::InvalidConfiguration("sender"))
        ));
    }

    #[test]
    fn test_builder_requires_interceptor() {
        let result = DeliveryHelper::<MockSender, RecordingInterceptor>::builder()
            .sender(Arc::new(MockSender::new()))
            .build();

        assert!(matches!(
            result,
            Err(DeliveryError::InvalidConfiguration("interceptor"))
        ));
    }

    #[test]
    fn test_builder_with_both_capabilities_builds() {
        let log = CallLog::default();

        let result = DeliveryHelper::builder()
            .sender(Arc::new(MockSender::new()))
            .interceptor(Arc::new(RecordingInterceptor::new(
                log,
                SendDecision::Proceed,
            )))
            .build();

        assert!(result.is_ok());
    }
}
