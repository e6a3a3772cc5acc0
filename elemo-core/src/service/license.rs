//! License policy
//!
//! Expiry, feature flags and quota evaluation against live resource counts.

use super::base::{BaseService, ServiceOption};
use super::permission::PermissionService;
use crate::context::Context;
use crate::domain::{Feature, License, Quota, SystemRole};
use crate::error::{BoxError, Error, ErrorKind, Result};
use crate::repository::{LicenseRepository, Pingable};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LicenseService: Send + Sync {
    /// Whether the license expired
    async fn expired(&self, ctx: &Context) -> Result<bool>;

    /// Whether the license unlocks `feature`
    async fn has_feature(&self, ctx: &Context, feature: &Feature) -> Result<bool>;

    /// Whether one more resource counted by `quota` fits in the license.
    ///
    /// Fails with `QuotaInvalid` when the license does not cap `quota`.
    async fn within_threshold(&self, ctx: &Context, quota: Quota) -> Result<bool>;

    /// A copy of the license, for system owners, admins and support only
    async fn get_license(&self, ctx: &Context) -> Result<License>;

    /// Fails with `LicenseInvalid` once the license expired
    async fn ping(&self, ctx: &Context) -> Result<()>;
}

pub struct LicenseServiceImpl {
    base: BaseService,
    license: License,
    license_repo: Arc<dyn LicenseRepository>,
    permission_service: Arc<dyn PermissionService>,
}

impl LicenseServiceImpl {
    /// Requires a license, a license repository and a permission service
    pub fn new(
        license: Option<License>,
        license_repo: Option<Arc<dyn LicenseRepository>>,
        options: impl IntoIterator<Item = ServiceOption>,
    ) -> Result<Self> {
        let base = BaseService::new(options)?;
        let license = license.ok_or(ErrorKind::NoLicense)?;
        let license_repo = license_repo.ok_or(ErrorKind::NoLicenseRepository)?;
        let permission_service = base.require_permission_service()?;

        Ok(Self {
            base,
            license,
            license_repo,
            permission_service,
        })
    }

    async fn count(&self, ctx: &Context, quota: Quota) -> std::result::Result<u64, BoxError> {
        let repo = &self.license_repo;
        match quota {
            Quota::Documents => ctx.run(repo.document_count()).await,
            Quota::Namespaces => ctx.run(repo.namespace_count()).await,
            Quota::Organizations => ctx.run(repo.active_organization_count()).await,
            Quota::Projects => ctx.run(repo.project_count()).await,
            Quota::Roles => ctx.run(repo.role_count()).await,
            Quota::Users => ctx.run(repo.active_user_count()).await,
        }
    }
}

#[async_trait]
impl LicenseService for LicenseServiceImpl {
    async fn expired(&self, ctx: &Context) -> Result<bool> {
        let _span = self.base.span(ctx, "service.license/expired");
        Ok(self.license.is_expired_at(Utc::now()))
    }

    async fn has_feature(&self, ctx: &Context, feature: &Feature) -> Result<bool> {
        let _span = self.base.span(ctx, "service.license/has_feature");
        Ok(self.license.features.contains(feature))
    }

    async fn within_threshold(&self, ctx: &Context, quota: Quota) -> Result<bool> {
        let _span = self.base.span(ctx, "service.license/within_threshold");

        let Some(max) = self.license.quotas.get(&quota).copied() else {
            return Err(Error::new(ErrorKind::QuotaInvalid));
        };

        let count = self
            .count(ctx, quota)
            .await
            .map_err(|e| Error::join(ErrorKind::QuotaUsageGet, e))?;

        Ok(count < u64::from(max))
    }

    async fn get_license(&self, ctx: &Context) -> Result<License> {
        let _span = self.base.span(ctx, "service.license/get_license");

        if !self
            .permission_service
            .ctx_user_has_system_role(ctx, &SystemRole::LICENSE_READERS)
            .await
        {
            return Err(Error::join(ErrorKind::LicenseGet, ErrorKind::NoPermission));
        }

        Ok(self.license.clone())
    }

    async fn ping(&self, ctx: &Context) -> Result<()> {
        let _span = self.base.span(ctx, "service.license/ping");

        if self.license.is_expired_at(Utc::now()) {
            return Err(Error::new(ErrorKind::LicenseInvalid));
        }

        Ok(())
    }
}

#[async_trait]
impl Pingable for LicenseServiceImpl {
    async fn ping(&self, ctx: &Context) -> std::result::Result<(), BoxError> {
        LicenseService::ping(self, ctx).await.map_err(Into::into)
    }
}
