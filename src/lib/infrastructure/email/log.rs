//! Sender that only logs what it would have sent

use async_trait::async_trait;
use tracing::info;

use crate::domain::communication::mailer::{Message, Sender, TransportError};

/// Dry-run sender
#[derive(Debug, Default, Clone)]
pub struct LogSender;

impl LogSender {
    fn log(&self, message: &Message) {
        let recipients: Vec<&str> = message.to.iter().map(|to| to.as_str()).collect();
        let kinds: Vec<String> = message
            .bodies()
            .iter()
            .map(|part| part.kind().to_string())
            .collect();

        info!(
            from = %message.from,
            to = ?recipients,
            subject = %message.subject,
            bodies = ?kinds,
            "not sending message (dry run)"
        );
    }
}

#[async_trait]
impl Sender for LogSender {
    fn send(&self, message: &Message) -> Result<(), TransportError> {
        self.log(message);

        Ok(())
    }

    async fn send_async(&self, message: &Message) -> Result<(), TransportError> {
        self.log(message);

        Ok(())
    }
}
