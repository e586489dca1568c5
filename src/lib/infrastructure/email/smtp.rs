//! SMTP sender implementation

use anyhow::Result;
use async_trait::async_trait;
use clap::{ArgAction, Parser};
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, SmtpTransport, Tokio1Executor, Transport,
};
use tracing::debug;

use crate::domain::communication::mailer::{BodyPart, MediaKind, Message, Sender, TransportError};

/// SMTP configuration
#[derive(Clone, Default, Debug, Parser)]
pub struct SmtpConfig {
    /// The SMTP host
    #[clap(long = "smtp-host", env = "SMTP_HOST", default_value = "localhost")]
    pub host: String,

    /// The SMTP port
    #[clap(long = "smtp-port", env = "SMTP_PORT", default_value = "587")]
    pub port: u16,

    /// The SMTP username
    #[clap(long = "smtp-user", env = "SMTP_USER", default_value = "")]
    pub username: String,

    /// The SMTP password
    #[clap(long = "smtp-password", env = "SMTP_PASSWORD", default_value = "")]
    pub password: String,

    /// Verify the TLS certificate
    #[clap(
        long = "smtp-verify-tls",
        env = "SMTP_VERIFY_TLS",
        default_value = "true",
        action = ArgAction::Set
    )]
    pub verify_tls: bool,

    /// Enable STARTTLS (TLS upgrade on connection) instead of implicit TLS
    #[clap(
        long = "smtp-starttls",
        env = "SMTP_STARTTLS",
        default_value = "true",
        action = ArgAction::Set
    )]
    pub starttls: bool,
}

/// SMTP sender
#[derive(Debug, Default, Clone)]
pub struct SmtpSender {
    config: SmtpConfig,
}

impl SmtpSender {
    /// Create a new SMTP sender
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn credentials(&self) -> Credentials {
        Credentials::new(self.config.username.clone(), self.config.password.clone())
    }

    fn tls(&self) -> Result<Tls> {
        let parameters = TlsParameters::builder(self.config.host.to_string())
            .dangerous_accept_invalid_certs(!self.config.verify_tls)
            .build()?;

        Ok(if self.config.starttls {
            Tls::Required(parameters)
        } else {
            Tls::Wrapper(parameters)
        })
    }

    /// Create a blocking SMTP transport from the configuration
    pub fn transport(&self) -> Result<SmtpTransport> {
        let relay = if self.config.starttls {
            SmtpTransport::starttls_relay(&self.config.host)?
        } else {
            SmtpTransport::relay(&self.config.host)?
        };

        Ok(relay
            .credentials(self.credentials())
            .port(self.config.port)
            .tls(self.tls()?)
            .build())
    }

    /// Create a tokio SMTP transport from the configuration
    pub fn async_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let relay = if self.config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)?
        };

        Ok(relay
            .credentials(self.credentials())
            .port(self.config.port)
            .tls(self.tls()?)
            .build())
    }
}

#[async_trait]
impl Sender for SmtpSender {
    fn send(&self, message: &Message) -> Result<(), TransportError> {
        let email = build_email(message)?;

        self.transport()?.send(&email).map_err(TransportError::new)?;

        Ok(())
    }

    async fn send_async(&self, message: &Message) -> Result<(), TransportError> {
        let email = build_email(message)?;

        self.async_transport()?
            .send(email)
            .await
            .map_err(TransportError::new)?;

        Ok(())
    }
}

/// Converts a [`Message`] into a `lettre` message.
///
/// A message with both variants becomes `multipart/alternative`, plain text
/// first.
pub fn build_email(message: &Message) -> Result<lettre::Message, TransportError> {
    let mut builder = lettre::Message::builder()
        .from(mailbox(message.from.as_str())?)
        .subject(message.subject.clone());

    for to in &message.to {
        builder = builder.to(mailbox(to.as_str())?);
    }

    let charset = message.encoding().name().to_ascii_lowercase();

    let email = match (
        message.body(MediaKind::PlainText),
        message.body(MediaKind::Html),
    ) {
        (Some(plain), Some(html)) => builder.multipart(
            MultiPart::alternative()
                .singlepart(single_part(plain, &charset)?)
                .singlepart(single_part(html, &charset)?),
        ),
        (Some(part), None) | (None, Some(part)) => builder.singlepart(single_part(part, &charset)?),
        (None, None) => {
            return Err(TransportError::msg("message has no body variants"));
        }
    };

    debug!(subject = %message.subject, "built SMTP message");

    email.map_err(TransportError::new)
}

fn mailbox(address: &str) -> Result<Mailbox, TransportError> {
    address.parse().map_err(TransportError::new)
}

fn single_part(part: &BodyPart, charset: &str) -> Result<SinglePart, TransportError> {
    let content_type = ContentType::parse(&format!("{}; charset={charset}", part.kind()))
        .map_err(TransportError::new)?;

    Ok(SinglePart::builder()
        .header(content_type)
        .body(part.content().to_vec()))
}
