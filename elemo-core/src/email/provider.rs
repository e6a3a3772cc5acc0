//! Email sender trait and error types

use super::templates::Template;
use crate::context::{Context, ContextError};
use async_trait::async_trait;
use thiserror::Error;

/// Email sender error types
#[derive(Error, Debug)]
pub enum EmailProviderError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error(transparent)]
    Interrupted(#[from] ContextError),
}

/// Delivers a rendered template to a single recipient
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(
        &self,
        ctx: &Context,
        subject: &str,
        to: &str,
        template: &Template,
    ) -> Result<(), EmailProviderError>;
}
