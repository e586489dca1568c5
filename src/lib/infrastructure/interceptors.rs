//! Stock interceptors

use std::{fmt, sync::Arc};

use tracing::{info, warn};

use crate::domain::communication::mailer::{Interceptor, Message, SendDecision, SendingContext};

/// Lets every message through
#[derive(Debug, Default, Clone)]
pub struct NoopInterceptor;

impl Interceptor for NoopInterceptor {
    fn on_sending(&self, _context: &SendingContext<'_>) -> SendDecision {
        SendDecision::Proceed
    }

    fn on_sent(&self, _message: &Message) {}
}

/// Writes an audit line before and after every send
#[derive(Debug, Default, Clone)]
pub struct AuditInterceptor;

impl Interceptor for AuditInterceptor {
    fn on_sending(&self, context: &SendingContext<'_>) -> SendDecision {
        let message = context.message();

        info!(
            from = %message.from,
            recipients = message.to.len(),
            subject = %message.subject,
            "sending message"
        );

        SendDecision::Proceed
    }

    fn on_sent(&self, message: &Message) {
        info!(subject = %message.subject, "message delivered");
    }
}

/// Cancels every send, for environments that must never deliver mail
#[derive(Debug, Default, Clone)]
pub struct SuppressingInterceptor;

impl Interceptor for SuppressingInterceptor {
    fn on_sending(&self, context: &SendingContext<'_>) -> SendDecision {
        warn!(subject = %context.message().subject, "delivery suppressed");

        SendDecision::Cancel
    }

    fn on_sent(&self, _message: &Message) {}
}

/// Runs several interceptors in order.
///
/// The first [`SendDecision::Cancel`] wins; interceptors after it are not asked.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    /// Creates an empty chain, which lets every message through.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interceptor to the chain
    pub fn with(mut self, interceptor: impl Interceptor) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Appends an already shared interceptor to the chain
    pub fn with_shared(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// The number of interceptors in the chain
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Whether the chain has no interceptors
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

impl Interceptor for InterceptorChain {
    fn on_sending(&self, context: &SendingContext<'_>) -> SendDecision {
        let cancelled = self
            .interceptors
            .iter()
            .any(|interceptor| interceptor.on_sending(context) == SendDecision::Cancel);

        if cancelled {
            SendDecision::Cancel
        } else {
            SendDecision::Proceed
        }
    }

    fn on_sent(&self, message: &Message) {
        for interceptor in &self.interceptors {
            interceptor.on_sent(message);
        }
    }
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}
