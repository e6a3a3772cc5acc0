//! Transactional email
//!
//! Templates are rendered by a [`TemplateRenderer`] and handed to an
//! [`EmailSender`] for delivery. The SMTP sender uses lettre.

pub mod provider;
pub mod smtp;
pub mod templates;

pub use provider::{EmailProviderError, EmailSender};
pub use smtp::SmtpEmailSender;
pub use templates::{
    template_data, BuiltinTemplates, EmailTemplate, Template, TemplateEngine, TemplateError,
    TemplateRenderer,
};
