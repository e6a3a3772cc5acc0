//! Transactional email service
//!
//! Builds the data record of each message, renders it through a
//! [`TemplateRenderer`] and hands the result to an [`EmailSender`].

use super::base::{BaseService, ServiceOption};
use crate::config::SmtpConfig;
use crate::context::Context;
use crate::domain::{Organization, User, RENEW_EMAIL};
use crate::email::{
    template_data, BuiltinTemplates, EmailSender, EmailTemplate, TemplateRenderer,
};
use crate::error::{Error, ErrorKind, Result};
use crate::telemetry::SpanGuard;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// RFC 850 layout used for dates shown in emails
const EMAIL_DATE_FORMAT: &str = "%A, %d-%b-%y %H:%M:%S UTC";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailService: Send + Sync {
    /// Send the password reset link at `reset_path` to `user`
    async fn send_auth_password_reset_email(
        &self,
        ctx: &Context,
        user: &User,
        reset_path: &str,
    ) -> Result<()>;

    /// Invite `user` to `organization` through the link at `path`
    async fn send_organization_invitation_email(
        &self,
        ctx: &Context,
        organization: &Organization,
        user: &User,
        path: &str,
    ) -> Result<()>;

    /// Remind the license holder that the license expires soon. The
    /// license is named by its identifier as the holder knows it.
    async fn send_system_license_expiry_email(
        &self,
        ctx: &Context,
        license_id: &str,
        license_email: &str,
        license_organization: &str,
        license_expires_at: DateTime<Utc>,
    ) -> Result<()>;

    async fn send_user_welcome_email(&self, ctx: &Context, user: &User) -> Result<()>;
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordResetTemplateData {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "FirstName")]
    pub first_name: String,
    #[serde(rename = "PasswordResetURL")]
    pub password_reset_url: String,
    #[serde(rename = "SupportEmail")]
    pub support_email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationInviteTemplateData {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "FirstName")]
    pub first_name: String,
    #[serde(rename = "OrganizationName")]
    pub organization_name: String,
    #[serde(rename = "InvitationURL")]
    pub invitation_url: String,
    #[serde(rename = "SupportEmail")]
    pub support_email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LicenseExpiryTemplateData {
    #[serde(rename = "LicenseID")]
    pub license_id: String,
    #[serde(rename = "LicenseEmail")]
    pub license_email: String,
    #[serde(rename = "LicenseOrganization")]
    pub license_organization: String,
    #[serde(rename = "LicenseExpiresAt")]
    pub license_expires_at: String,
    #[serde(rename = "ServerURL")]
    pub server_url: String,
    #[serde(rename = "RenewEmail")]
    pub renew_email: String,
    #[serde(rename = "SupportEmail")]
    pub support_email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserWelcomeTemplateData {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "FirstName")]
    pub first_name: String,
    #[serde(rename = "Hostname")]
    pub hostname: String,
    #[serde(rename = "ServerURL")]
    pub server_url: String,
    #[serde(rename = "SupportEmail")]
    pub support_email: String,
}

/// `https://<hostname>/<path>` with exactly one slash between the parts.
/// A scheme already present on `hostname` is replaced.
pub fn server_url(hostname: &str, path: &str) -> String {
    let host = hostname
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    let path = path.trim().trim_start_matches('/');

    if path.is_empty() {
        format!("https://{}", host)
    } else {
        format!("https://{}/{}", host, path)
    }
}

pub struct EmailServiceImpl {
    base: BaseService,
    client: Arc<dyn EmailSender>,
    renderer: Arc<dyn TemplateRenderer>,
    hostname: String,
    support_address: String,
}

impl EmailServiceImpl {
    /// Requires an email sender. Templates are rendered by
    /// [`BuiltinTemplates`] unless replaced with [`Self::with_renderer`].
    pub fn new(
        client: Option<Arc<dyn EmailSender>>,
        config: &SmtpConfig,
        options: impl IntoIterator<Item = ServiceOption>,
    ) -> Result<Self> {
        let base = BaseService::new(options)?;
        let client = client.ok_or(ErrorKind::NoSMTPClient)?;

        Ok(Self {
            base,
            client,
            renderer: Arc::new(BuiltinTemplates),
            hostname: config.hostname.clone(),
            support_address: config.support_address.clone(),
        })
    }

    pub fn with_renderer(mut self, renderer: Option<Arc<dyn TemplateRenderer>>) -> Result<Self> {
        self.renderer = renderer.ok_or(ErrorKind::NoTemplateRenderer)?;
        Ok(self)
    }

    async fn send<T: Serialize + Sync>(
        &self,
        ctx: &Context,
        span: &SpanGuard,
        template: EmailTemplate,
        to: &str,
        data: &T,
    ) -> Result<()> {
        let data = template_data(data).map_err(|e| Error::join(ErrorKind::EmailSend, e))?;
        let rendered = self
            .renderer
            .render(template.path(), data)
            .map_err(|e| Error::join(ErrorKind::EmailSend, e))?;

        span.add_event("send email");
        ctx.run(
            self.client
                .send_email(ctx, &rendered.subject, to, &rendered),
        )
        .await
        .map_err(|e| Error::join(ErrorKind::EmailSend, e))?;

        self.base
            .logger()
            .debug(&format!("{} email sent", template.path()));
        Ok(())
    }
}

#[async_trait]
impl EmailService for EmailServiceImpl {
    async fn send_auth_password_reset_email(
        &self,
        ctx: &Context,
        user: &User,
        reset_path: &str,
    ) -> Result<()> {
        let span = self
            .base
            .span(ctx, "service.email/send_auth_password_reset_email");

        let data = PasswordResetTemplateData {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            password_reset_url: server_url(&self.hostname, reset_path),
            support_email: self.support_address.clone(),
        };

        self.send(ctx, &span, EmailTemplate::PasswordReset, &user.email, &data)
            .await
    }

    async fn send_organization_invitation_email(
        &self,
        ctx: &Context,
        organization: &Organization,
        user: &User,
        path: &str,
    ) -> Result<()> {
        let span = self
            .base
            .span(ctx, "service.email/send_organization_invitation_email");

        let data = OrganizationInviteTemplateData {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            organization_name: organization.name.clone(),
            invitation_url: server_url(&self.hostname, path),
            support_email: self.support_address.clone(),
        };

        self.send(
            ctx,
            &span,
            EmailTemplate::OrganizationInvite,
            &user.email,
            &data,
        )
        .await
    }

    async fn send_system_license_expiry_email(
        &self,
        ctx: &Context,
        license_id: &str,
        license_email: &str,
        license_organization: &str,
        license_expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let span = self
            .base
            .span(ctx, "service.email/send_system_license_expiry_email");

        let data = LicenseExpiryTemplateData {
            license_id: license_id.to_string(),
            license_email: license_email.to_string(),
            license_organization: license_organization.to_string(),
            license_expires_at: license_expires_at.format(EMAIL_DATE_FORMAT).to_string(),
            server_url: server_url(&self.hostname, ""),
            renew_email: RENEW_EMAIL.to_string(),
            support_email: self.support_address.clone(),
        };

        self.send(
            ctx,
            &span,
            EmailTemplate::LicenseExpiryReminder,
            license_email,
            &data,
        )
        .await
    }

    async fn send_user_welcome_email(&self, ctx: &Context, user: &User) -> Result<()> {
        let span = self.base.span(ctx, "service.email/send_user_welcome_email");

        let data = UserWelcomeTemplateData {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            hostname: self.hostname.clone(),
            server_url: server_url(&self.hostname, ""),
            support_email: self.support_address.clone(),
        };

        self.send(ctx, &span, EmailTemplate::UserWelcome, &user.email, &data)
            .await
    }
}
