//! Shared dependency bundle and option protocol for every service

use super::{EmailService, LicenseService, PermissionService};
use crate::context::Context;
use crate::domain::{Id, PermissionKind};
use crate::error::{ErrorKind, Result};
use crate::repository::{OrganizationRepository, PermissionRepository, UserRepository};
use crate::telemetry::{Logger, NoopTracer, SpanGuard, Tracer};
use std::sync::Arc;

/// A collaborator handed to a service constructor.
///
/// Options are applied in order. An option carrying `None` stops
/// construction with the matching `No*` error kind.
pub enum ServiceOption {
    Logger(Option<Logger>),
    Tracer(Option<Arc<dyn Tracer>>),
    PermissionRepository(Option<Arc<dyn PermissionRepository>>),
    UserRepository(Option<Arc<dyn UserRepository>>),
    OrganizationRepository(Option<Arc<dyn OrganizationRepository>>),
    LicenseService(Option<Arc<dyn LicenseService>>),
    PermissionService(Option<Arc<dyn PermissionService>>),
    EmailService(Option<Arc<dyn EmailService>>),
}

impl ServiceOption {
    pub fn logger(logger: Logger) -> Self {
        Self::Logger(Some(logger))
    }

    pub fn tracer(tracer: Arc<dyn Tracer>) -> Self {
        Self::Tracer(Some(tracer))
    }

    pub fn permission_repository(repo: Arc<dyn PermissionRepository>) -> Self {
        Self::PermissionRepository(Some(repo))
    }

    pub fn user_repository(repo: Arc<dyn UserRepository>) -> Self {
        Self::UserRepository(Some(repo))
    }

    pub fn organization_repository(repo: Arc<dyn OrganizationRepository>) -> Self {
        Self::OrganizationRepository(Some(repo))
    }

    pub fn license_service(service: Arc<dyn LicenseService>) -> Self {
        Self::LicenseService(Some(service))
    }

    pub fn permission_service(service: Arc<dyn PermissionService>) -> Self {
        Self::PermissionService(Some(service))
    }

    pub fn email_service(service: Arc<dyn EmailService>) -> Self {
        Self::EmailService(Some(service))
    }
}

/// Collaborators shared by every concrete service
#[derive(Clone)]
pub struct BaseService {
    logger: Logger,
    tracer: Arc<dyn Tracer>,
    permission_repo: Option<Arc<dyn PermissionRepository>>,
    user_repo: Option<Arc<dyn UserRepository>>,
    organization_repo: Option<Arc<dyn OrganizationRepository>>,
    license_service: Option<Arc<dyn LicenseService>>,
    permission_service: Option<Arc<dyn PermissionService>>,
    email_service: Option<Arc<dyn EmailService>>,
}

impl Default for BaseService {
    fn default() -> Self {
        Self {
            logger: Logger::default(),
            tracer: Arc::new(NoopTracer),
            permission_repo: None,
            user_repo: None,
            organization_repo: None,
            license_service: None,
            permission_service: None,
            email_service: None,
        }
    }
}

impl BaseService {
    /// Start from the defaults and apply `options` in order
    pub fn new(options: impl IntoIterator<Item = ServiceOption>) -> Result<Self> {
        let mut base = Self::default();
        for option in options {
            base.apply(option)?;
        }
        Ok(base)
    }

    fn apply(&mut self, option: ServiceOption) -> Result<()> {
        match option {
            ServiceOption::Logger(logger) => {
                self.logger = logger.ok_or(ErrorKind::NoLogger)?;
            }
            ServiceOption::Tracer(tracer) => {
                self.tracer = tracer.ok_or(ErrorKind::NoTracer)?;
            }
            ServiceOption::PermissionRepository(repo) => {
                self.permission_repo = Some(repo.ok_or(ErrorKind::NoPermissionRepository)?);
            }
            ServiceOption::UserRepository(repo) => {
                self.user_repo = Some(repo.ok_or(ErrorKind::NoUserRepository)?);
            }
            ServiceOption::OrganizationRepository(repo) => {
                self.organization_repo = Some(repo.ok_or(ErrorKind::NoOrganizationRepository)?);
            }
            ServiceOption::LicenseService(service) => {
                self.license_service = Some(service.ok_or(ErrorKind::NoLicenseService)?);
            }
            ServiceOption::PermissionService(service) => {
                self.permission_service = Some(service.ok_or(ErrorKind::NoPermissionService)?);
            }
            ServiceOption::EmailService(service) => {
                self.email_service = Some(service.ok_or(ErrorKind::NoEmailService)?);
            }
        }
        Ok(())
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Start the span of a service operation
    pub fn span(&self, ctx: &Context, name: &str) -> SpanGuard {
        self.tracer.start(ctx, name)
    }

    pub fn require_permission_repository(&self) -> Result<Arc<dyn PermissionRepository>> {
        Ok(self
            .permission_repo
            .clone()
            .ok_or(ErrorKind::NoPermissionRepository)?)
    }

    pub fn require_user_repository(&self) -> Result<Arc<dyn UserRepository>> {
        Ok(self.user_repo.clone().ok_or(ErrorKind::NoUserRepository)?)
    }

    pub fn require_organization_repository(&self) -> Result<Arc<dyn OrganizationRepository>> {
        Ok(self
            .organization_repo
            .clone()
            .ok_or(ErrorKind::NoOrganizationRepository)?)
    }

    pub fn require_license_service(&self) -> Result<Arc<dyn LicenseService>> {
        Ok(self
            .license_service
            .clone()
            .ok_or(ErrorKind::NoLicenseService)?)
    }

    pub fn require_permission_service(&self) -> Result<Arc<dyn PermissionService>> {
        Ok(self
            .permission_service
            .clone()
            .ok_or(ErrorKind::NoPermissionService)?)
    }

    pub fn require_email_service(&self) -> Result<Arc<dyn EmailService>> {
        Ok(self.email_service.clone().ok_or(ErrorKind::NoEmailService)?)
    }

    pub fn user_repository(&self) -> Option<Arc<dyn UserRepository>> {
        self.user_repo.clone()
    }

    pub fn email_service(&self) -> Option<Arc<dyn EmailService>> {
        self.email_service.clone()
    }

    /// Whether the principal of `ctx` holds any of `kinds` (or `all`) on
    /// `target`. A missing principal, a missing permission repository and
    /// every lookup failure count as denied.
    pub async fn ctx_user_permitted(
        &self,
        ctx: &Context,
        span: &SpanGuard,
        target: Id,
        kinds: &[PermissionKind],
    ) -> bool {
        match ctx.principal() {
            Some(principal) => self.has_permission(ctx, span, principal, target, kinds).await,
            None => false,
        }
    }

    /// Whether `subject` holds any of `kinds` (or `all`) on `target`
    pub async fn has_permission(
        &self,
        ctx: &Context,
        span: &SpanGuard,
        subject: Id,
        target: Id,
        kinds: &[PermissionKind],
    ) -> bool {
        let Some(repo) = &self.permission_repo else {
            return false;
        };

        span.add_event("check permission");
        let result = ctx
            .run(repo.has_permission(subject, target, PermissionKind::with_all(kinds)))
            .await;
        span.add_event("permission checked");

        // PermissionError::Read and hard failures both deny.
        matches!(result, Ok(true))
    }
}
