//! Permission service
//!
//! Answers "may the principal do this" questions for other services and
//! manages grants on behalf of principals that hold `all` on the target.

use super::base::{BaseService, ServiceOption};
use crate::context::Context;
use crate::domain::{Id, Permission, PermissionKind, ResourceType, SystemRole};
use crate::error::{Error, ErrorKind, Result};
use crate::repository::PermissionRepository;
use async_trait::async_trait;
use std::sync::Arc;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionService: Send + Sync {
    /// Grant a permission. The principal must hold `all` on its target.
    async fn create(&self, ctx: &Context, permission: Permission) -> Result<Permission>;

    /// Revoke a permission. The principal must hold `all` on its target.
    async fn delete(&self, ctx: &Context, id: Id) -> Result<()>;

    /// Whether `subject` holds any of `kinds` on `target`
    async fn has_permission(
        &self,
        ctx: &Context,
        subject: Id,
        target: Id,
        kinds: &[PermissionKind],
    ) -> bool;

    /// Whether the principal of `ctx` holds any of `kinds` on `target`
    async fn ctx_user_permitted(&self, ctx: &Context, target: Id, kinds: &[PermissionKind])
        -> bool;

    /// Whether the principal of `ctx` holds any of `roles`
    async fn ctx_user_has_system_role(&self, ctx: &Context, roles: &[SystemRole]) -> bool;
}

pub struct PermissionServiceImpl {
    base: BaseService,
    permission_repo: Arc<dyn PermissionRepository>,
}

impl PermissionServiceImpl {
    /// Requires a permission repository
    pub fn new(options: impl IntoIterator<Item = ServiceOption>) -> Result<Self> {
        let base = BaseService::new(options)?;
        let permission_repo = base.require_permission_repository()?;

        Ok(Self {
            base,
            permission_repo,
        })
    }
}

#[async_trait]
impl PermissionService for PermissionServiceImpl {
    async fn create(&self, ctx: &Context, permission: Permission) -> Result<Permission> {
        let span = self.base.span(ctx, "service.permission/create");

        permission
            .validate()
            .map_err(|e| Error::join(ErrorKind::PermissionCreate, e))?;

        if ctx.principal().is_none() {
            return Err(Error::join(ErrorKind::PermissionCreate, ErrorKind::NoUser));
        }

        if !self
            .base
            .ctx_user_permitted(ctx, &span, permission.target, &[PermissionKind::All])
            .await
        {
            return Err(Error::join(
                ErrorKind::PermissionCreate,
                ErrorKind::NoPermission,
            ));
        }

        ctx.run(self.permission_repo.create(permission))
            .await
            .map_err(|e| Error::join(ErrorKind::PermissionCreate, e))
    }

    async fn delete(&self, ctx: &Context, id: Id) -> Result<()> {
        let span = self.base.span(ctx, "service.permission/delete");

        id.validate(ResourceType::Permission)
            .map_err(|e| Error::join(ErrorKind::PermissionDelete, e))?;

        if ctx.principal().is_none() {
            return Err(Error::join(ErrorKind::PermissionDelete, ErrorKind::NoUser));
        }

        let permission = ctx
            .run(self.permission_repo.get(id))
            .await
            .map_err(|e| Error::join(ErrorKind::PermissionDelete, e))?;

        if !self
            .base
            .ctx_user_permitted(ctx, &span, permission.target, &[PermissionKind::All])
            .await
        {
            return Err(Error::join(
                ErrorKind::PermissionDelete,
                ErrorKind::NoPermission,
            ));
        }

        ctx.run(self.permission_repo.delete(id))
            .await
            .map_err(|e| Error::join(ErrorKind::PermissionDelete, e))
    }

    async fn has_permission(
        &self,
        ctx: &Context,
        subject: Id,
        target: Id,
        kinds: &[PermissionKind],
    ) -> bool {
        let span = self.base.span(ctx, "service.permission/has_permission");
        self.base
            .has_permission(ctx, &span, subject, target, kinds)
            .await
    }

    async fn ctx_user_permitted(
        &self,
        ctx: &Context,
        target: Id,
        kinds: &[PermissionKind],
    ) -> bool {
        let span = self.base.span(ctx, "service.permission/ctx_user_permitted");
        self.base.ctx_user_permitted(ctx, &span, target, kinds).await
    }

    async fn ctx_user_has_system_role(&self, ctx: &Context, roles: &[SystemRole]) -> bool {
        let span = self
            .base
            .span(ctx, "service.permission/ctx_user_has_system_role");

        let Some(principal) = ctx.principal() else {
            return false;
        };

        span.add_event("check permission");
        let result = ctx
            .run(
                self.permission_repo
                    .has_any_system_role(principal, roles.to_vec()),
            )
            .await;
        span.add_event("permission checked");

        matches!(result, Ok(true))
    }
}
