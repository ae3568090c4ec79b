use std::fmt;

use crate::error::HandlerError;
use crate::message::SqsMessage;
use crate::processor::MessageHandler;

/// Wraps a handler in a `tracing` span per message.
///
/// The span is named after the handler and carries the message id. Responses
/// and errors are recorded as span events when capture is enabled; errors are
/// still returned unchanged.
#[derive(Debug, Clone)]
pub struct TracedHandler<H> {
    inner: H,
    name: String,
    capture_response: bool,
    capture_error: bool,
}

impl<H> TracedHandler<H> {
    pub fn new(name: impl Into<String>, inner: H) -> Self {
        Self {
            inner,
            name: format!("## {}", name.into()),
            capture_response: true,
            capture_error: true,
        }
    }

    pub fn capture_response(mut self, enabled: bool) -> Self {
        self.capture_response = enabled;
        self
    }

    pub fn capture_error(mut self, enabled: bool) -> Self {
        self.capture_error = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H> MessageHandler for TracedHandler<H>
where
    H: MessageHandler,
    H::Output: fmt::Debug,
{
    type Output = H::Output;

    fn process(&self, message: &SqsMessage) -> Result<H::Output, HandlerError> {
        let span = tracing::info_span!(
            "handler",
            otel.name = %self.name,
            message_id = %message.message_id,
            receive_count = message.receive_count(),
        );
        let _entered = span.enter();

        let result = self.inner.process(message);
        match &result {
            Ok(response) if self.capture_response => {
                tracing::debug!(response = ?response, "{} response", self.name);
            }
            Err(error) if self.capture_error => {
                tracing::error!(error = %error, "{} error", self.name);
            }
            _ => {}
        }
        result
    }
}
