//! Email template system
//!
//! Provides simple variable substitution for email templates.
//! Variables are specified using {{VariableName}} syntax.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Template rendering errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),

    #[error("invalid template data: {0}")]
    Data(String),

    #[error("template {template} is missing variable {variable}")]
    MissingVariable { template: String, variable: String },
}

/// Built-in email templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    PasswordReset,
    OrganizationInvite,
    LicenseExpiryReminder,
    UserWelcome,
}

impl EmailTemplate {
    pub const ALL: [EmailTemplate; 4] = [
        EmailTemplate::PasswordReset,
        EmailTemplate::OrganizationInvite,
        EmailTemplate::LicenseExpiryReminder,
        EmailTemplate::UserWelcome,
    ];

    /// Name the template is looked up by
    pub fn path(&self) -> &'static str {
        match self {
            Self::PasswordReset => "password-reset",
            Self::OrganizationInvite => "organization-invite",
            Self::LicenseExpiryReminder => "license-expiry-reminder",
            Self::UserWelcome => "user-welcome",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.path() == path)
    }

    /// Get the subject line for this template
    pub fn subject(&self) -> &'static str {
        match self {
            Self::PasswordReset => "Reset your password",
            Self::OrganizationInvite => "You have been invited to join {{OrganizationName}}",
            Self::LicenseExpiryReminder => {
                "Your license for {{LicenseOrganization}} is about to expire"
            }
            Self::UserWelcome => "Welcome to {{Hostname}}",
        }
    }

    /// Get the HTML body template
    pub fn html_body(&self) -> &'static str {
        match self {
            Self::PasswordReset => PASSWORD_RESET_TEMPLATE,
            Self::OrganizationInvite => ORGANIZATION_INVITE_TEMPLATE,
            Self::LicenseExpiryReminder => LICENSE_EXPIRY_TEMPLATE,
            Self::UserWelcome => USER_WELCOME_TEMPLATE,
        }
    }

    /// Get the plain text body template
    pub fn text_body(&self) -> &'static str {
        match self {
            Self::PasswordReset => PASSWORD_RESET_TEMPLATE_TEXT,
            Self::OrganizationInvite => ORGANIZATION_INVITE_TEMPLATE_TEXT,
            Self::LicenseExpiryReminder => LICENSE_EXPIRY_TEMPLATE_TEXT,
            Self::UserWelcome => USER_WELCOME_TEMPLATE_TEXT,
        }
    }
}

/// Template rendering engine with variable substitution
#[derive(Debug, Default)]
pub struct TemplateEngine {
    variables: HashMap<String, String>,
}

impl TemplateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Set multiple variables from an iterator
    pub fn set_all<I, K, V>(&mut self, iter: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in iter {
            self.variables.insert(k.into(), v.into());
        }
        self
    }

    /// Render a template string, replacing {{variable}} with values.
    /// Placeholders without a value are left as-is.
    pub fn render(&self, template: &str) -> String {
        self.expand(template, false).0
    }

    /// Like [`Self::render`], with values HTML-escaped
    pub fn render_html(&self, template: &str) -> String {
        self.expand(template, true).0
    }

    /// Single pass over the placeholders of `template`. Inserted values are
    /// never rescanned. Also returns the first placeholder without a value.
    fn expand(&self, template: &str, html: bool) -> (String, Option<String>) {
        let mut out = String::with_capacity(template.len());
        let mut missing = None;
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                rest = &rest[start..];
                break;
            };

            let key = &after[..end];
            match self.variables.get(key) {
                Some(value) if html => out.push_str(&escape_html(value)),
                Some(value) => out.push_str(value),
                None => {
                    missing.get_or_insert_with(|| key.to_string());
                    out.push_str(&rest[start..start + end + 4]);
                }
            }
            rest = &after[end + 2..];
        }
        out.push_str(rest);

        (out, missing)
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Flatten a serializable data record into template variables.
///
/// The record must serialize to a JSON object; string values are used
/// verbatim, everything else through its JSON representation.
pub fn template_data<T: Serialize>(record: &T) -> Result<BTreeMap<String, String>, TemplateError> {
    let value = serde_json::to_value(record).map_err(|e| TemplateError::Data(e.to_string()))?;
    let serde_json::Value::Object(fields) = value else {
        return Err(TemplateError::Data(
            "template data must be an object".to_string(),
        ));
    };

    Ok(fields
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}

/// A rendered email, handed to the email sender as-is
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub path: String,
    pub subject: String,
    pub data: BTreeMap<String, String>,
    pub html_body: String,
    pub text_body: String,
}

/// Resolves a template by path and renders it with the given data
#[cfg_attr(test, mockall::automock)]
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, path: &str, data: BTreeMap<String, String>)
        -> Result<Template, TemplateError>;
}

/// Renderer for the built-in [`EmailTemplate`]s.
///
/// Rendering fails if a placeholder of the template has no value. Values
/// are HTML-escaped in the HTML body only.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTemplates;

impl TemplateRenderer for BuiltinTemplates {
    fn render(
        &self,
        path: &str,
        data: BTreeMap<String, String>,
    ) -> Result<Template, TemplateError> {
        let template = EmailTemplate::from_path(path)
            .ok_or_else(|| TemplateError::NotFound(path.to_string()))?;

        let mut engine = TemplateEngine::new();
        engine.set_all(data.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let render = |source: &str, html: bool| match engine.expand(source, html) {
            (_, Some(variable)) => Err(TemplateError::MissingVariable {
                template: path.to_string(),
                variable,
            }),
            (rendered, None) => Ok(rendered),
        };

        let subject = render(template.subject(), false)?;
        let html_body = render(template.html_body(), true)?;
        let text_body = render(template.text_body(), false)?;

        Ok(Template {
            path: path.to_string(),
            subject,
            data,
            html_body,
            text_body,
        })
    }
}

// ============================================================================
// Email Templates
// ============================================================================

macro_rules! html_page {
    ($title:literal, $content:literal) => {
        concat!(
            "<!DOCTYPE html>\n<html>\n<head>\n    <meta charset=\"utf-8\">\n    <title>",
            $title,
            "</title>\n    <style>\n        body { font-family: Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; background-color: #f5f5f5; }\n        .container { max-width: 600px; margin: 40px auto; padding: 40px; background: #ffffff; border-radius: 8px; }\n        .button { display: inline-block; background-color: #2563eb; color: #ffffff; padding: 14px 28px; text-decoration: none; border-radius: 6px; }\n        .footer { font-size: 12px; color: #666; margin-top: 30px; border-top: 1px solid #eee; }\n    </style>\n</head>\n<body>\n    <div class=\"container\">\n",
            $content,
            "\n        <div class=\"footer\">\n            <p>Questions? Contact us at <a href=\"mailto:{{SupportEmail}}\">{{SupportEmail}}</a>.</p>\n        </div>\n    </div>\n</body>\n</html>"
        )
    };
}

const PASSWORD_RESET_TEMPLATE: &str = html_page!(
    "Reset your password",
    r#"        <h1>Reset your password</h1>
        <p>Hi {{FirstName}},</p>
        <p>We received a request to reset the password of your account <strong>{{Username}}</strong>.</p>
        <p style="text-align: center; margin: 30px 0;">
            <a href="{{PasswordResetURL}}" class="button">Reset password</a>
        </p>
        <p>If you didn't request a password reset, you can safely ignore this email.</p>"#
);

const PASSWORD_RESET_TEMPLATE_TEXT: &str = r#"Reset your password

Hi {{FirstName}},

We received a request to reset the password of your account {{Username}}.

Visit the link below to reset your password:

{{PasswordResetURL}}

If you didn't request a password reset, you can safely ignore this email.

Questions? Contact us at {{SupportEmail}}."#;

const ORGANIZATION_INVITE_TEMPLATE: &str = html_page!(
    "Invitation",
    r#"        <h1>You're invited!</h1>
        <p>Hi {{FirstName}},</p>
        <p>You have been invited to join <strong>{{OrganizationName}}</strong>.</p>
        <p style="text-align: center; margin: 30px 0;">
            <a href="{{InvitationURL}}" class="button">Accept invitation</a>
        </p>
        <p>If you didn't expect this invitation, you can safely ignore this email.</p>"#
);

const ORGANIZATION_INVITE_TEMPLATE_TEXT: &str = r#"You're invited!

Hi {{FirstName}},

You have been invited to join {{OrganizationName}}.

Visit the link below to accept the invitation:

{{InvitationURL}}

If you didn't expect this invitation, you can safely ignore this email.

Questions? Contact us at {{SupportEmail}}."#;

const LICENSE_EXPIRY_TEMPLATE: &str = html_page!(
    "License expiry",
    r#"        <h1>Your license is about to expire</h1>
        <p>The license <strong>{{LicenseID}}</strong> issued to {{LicenseOrganization}} ({{LicenseEmail}}) expires on <strong>{{LicenseExpiresAt}}</strong>.</p>
        <p>Your installation at <a href="{{ServerURL}}">{{ServerURL}}</a> will stop accepting new resources once the license expires.</p>
        <p>To renew, write to <a href="mailto:{{RenewEmail}}">{{RenewEmail}}</a>.</p>"#
);

const LICENSE_EXPIRY_TEMPLATE_TEXT: &str = r#"Your license is about to expire

The license {{LicenseID}} issued to {{LicenseOrganization}} ({{LicenseEmail}}) expires on {{LicenseExpiresAt}}.

Your installation at {{ServerURL}} will stop accepting new resources once the license expires.

To renew, write to {{RenewEmail}}.

Questions? Contact us at {{SupportEmail}}."#;

const USER_WELCOME_TEMPLATE: &str = html_page!(
    "Welcome",
    r#"        <h1>Welcome to {{Hostname}}</h1>
        <p>Hi {{FirstName}},</p>
        <p>Your account is ready. Sign in to get started.</p>
        <p style="text-align: center; margin: 30px 0;">
            <a href="{{ServerURL}}" class="button">Open Elemo</a>
        </p>"#
);

const USER_WELCOME_TEMPLATE_TEXT: &str = r#"Welcome to {{Hostname}}

Hi {{FirstName}},

Your account is ready. Sign in to get started:

{{ServerURL}}

Questions? Contact us at {{SupportEmail}}."#;
