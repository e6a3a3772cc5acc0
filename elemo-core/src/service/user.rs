//! User business logic

use super::base::{BaseService, ServiceOption};
use super::license::LicenseService;
use super::pagination;
use crate::context::Context;
use crate::domain::{
    Id, PermissionKind, Quota, ResourceType, User, UserPatch, UserStatus, UNUSABLE_PASSWORD,
};
use crate::error::{Error, ErrorKind, Result};
use crate::repository::UserRepository;
use async_trait::async_trait;
use std::sync::Arc;
use validator::Validate;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    async fn create(&self, ctx: &Context, user: User) -> Result<User>;
    async fn get(&self, ctx: &Context, id: Id) -> Result<User>;
    async fn get_by_email(&self, ctx: &Context, email: &str) -> Result<User>;
    async fn get_all(&self, ctx: &Context, offset: i64, limit: i64) -> Result<Vec<User>>;

    /// Users may update themselves; anyone else needs `write` on the user.
    async fn update(&self, ctx: &Context, id: Id, patch: UserPatch) -> Result<User>;

    /// Soft delete marks the user deleted and scrubs its password. `force`
    /// removes the user from the repository.
    async fn delete(&self, ctx: &Context, id: Id, force: bool) -> Result<()>;
}

pub struct UserServiceImpl {
    base: BaseService,
    user_repo: Arc<dyn UserRepository>,
    license_service: Arc<dyn LicenseService>,
}

impl UserServiceImpl {
    /// Requires a user repository, a permission repository and a license
    /// service
    pub fn new(options: impl IntoIterator<Item = ServiceOption>) -> Result<Self> {
        let base = BaseService::new(options)?;
        let user_repo = base.require_user_repository()?;
        base.require_permission_repository()?;
        let license_service = base.require_license_service()?;

        Ok(Self {
            base,
            user_repo,
            license_service,
        })
    }
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn create(&self, ctx: &Context, mut user: User) -> Result<User> {
        let span = self.base.span(ctx, "service.user/create");

        if user.email.is_empty() {
            return Err(Error::join(ErrorKind::UserCreate, ErrorKind::InvalidEmail));
        }

        user.validate().map_err(|e| {
            Error::join(ErrorKind::UserCreate, Error::join(ErrorKind::InvalidUser, e))
        })?;

        if !self
            .base
            .ctx_user_permitted(
                ctx,
                &span,
                Id::nil(ResourceType::User),
                &[PermissionKind::Create],
            )
            .await
        {
            return Err(Error::join(ErrorKind::UserCreate, ErrorKind::NoPermission));
        }

        let within = self
            .license_service
            .within_threshold(ctx, Quota::Users)
            .await
            .map_err(|e| Error::join(ErrorKind::UserCreate, e))?;
        if !within {
            return Err(Error::join(ErrorKind::UserCreate, ErrorKind::QuotaExceeded));
        }

        if user.status == UserStatus::Deleted {
            user.password = UNUSABLE_PASSWORD.to_string();
        }

        let user = ctx
            .run(self.user_repo.create(user))
            .await
            .map_err(|e| Error::join(ErrorKind::UserCreate, e))?;

        self.base
            .logger()
            .debug(&format!("user {} created", user.id));

        Ok(user)
    }

    async fn get(&self, ctx: &Context, id: Id) -> Result<User> {
        let _span = self.base.span(ctx, "service.user/get");

        id.validate(ResourceType::User)
            .map_err(|e| Error::join(ErrorKind::UserGet, e))?;

        ctx.run(self.user_repo.get(id))
            .await
            .map_err(|e| Error::join(ErrorKind::UserGet, e))
    }

    async fn get_by_email(&self, ctx: &Context, email: &str) -> Result<User> {
        let _span = self.base.span(ctx, "service.user/get_by_email");

        if email.is_empty() {
            return Err(Error::join(ErrorKind::UserGet, ErrorKind::InvalidEmail));
        }

        ctx.run(self.user_repo.get_by_email(email))
            .await
            .map_err(|e| Error::join(ErrorKind::UserGet, e))
    }

    async fn get_all(&self, ctx: &Context, offset: i64, limit: i64) -> Result<Vec<User>> {
        let _span = self.base.span(ctx, "service.user/get_all");

        let (offset, limit) = pagination(offset, limit).ok_or_else(|| {
            Error::join(ErrorKind::UserGetAll, ErrorKind::InvalidPaginationParams)
        })?;

        ctx.run(self.user_repo.get_all(offset, limit))
            .await
            .map_err(|e| Error::join(ErrorKind::UserGetAll, e))
    }

    async fn update(&self, ctx: &Context, id: Id, mut patch: UserPatch) -> Result<User> {
        let span = self.base.span(ctx, "service.user/update");

        id.validate(ResourceType::User)
            .map_err(|e| Error::join(ErrorKind::UserUpdate, e))?;

        let Some(principal) = ctx.principal() else {
            return Err(Error::join(ErrorKind::UserUpdate, ErrorKind::NoUser));
        };

        if principal != id
            && !self
                .base
                .ctx_user_permitted(ctx, &span, id, &[PermissionKind::Write])
                .await
        {
            return Err(Error::join(ErrorKind::UserUpdate, ErrorKind::NoPermission));
        }

        if patch.is_empty() {
            return Err(Error::join(ErrorKind::UserUpdate, ErrorKind::NoPatchData));
        }

        patch.validate().map_err(|e| {
            Error::join(ErrorKind::UserUpdate, Error::join(ErrorKind::InvalidUser, e))
        })?;

        if patch.status == Some(UserStatus::Deleted) {
            patch.password = Some(UNUSABLE_PASSWORD.to_string());
        }

        ctx.run(self.user_repo.update(id, patch))
            .await
            .map_err(|e| Error::join(ErrorKind::UserUpdate, e))
    }

    async fn delete(&self, ctx: &Context, id: Id, force: bool) -> Result<()> {
        let span = self.base.span(ctx, "service.user/delete");

        id.validate(ResourceType::User)
            .map_err(|e| Error::join(ErrorKind::UserDelete, e))?;

        let Some(principal) = ctx.principal() else {
            return Err(Error::join(ErrorKind::UserDelete, ErrorKind::NoUser));
        };

        if principal == id
            || !self
                .base
                .ctx_user_permitted(ctx, &span, id, &[PermissionKind::Delete])
                .await
        {
            return Err(Error::join(ErrorKind::UserDelete, ErrorKind::NoPermission));
        }

        if force {
            return ctx
                .run(self.user_repo.delete(id))
                .await
                .map_err(|e| Error::join(ErrorKind::UserDelete, e));
        }

        ctx.run(self.user_repo.update(id, UserPatch::soft_delete()))
            .await
            .map(|_| ())
            .map_err(|e| Error::join(ErrorKind::UserDelete, e))
    }
}
