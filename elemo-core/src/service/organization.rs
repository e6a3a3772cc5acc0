//! Organization business logic
//!
//! Organizations are quota-governed: creating one, or adding a member to
//! one, first asks the license service whether the resource still fits.

use super::base::{BaseService, ServiceOption};
use super::license::LicenseService;
use super::pagination;
use crate::context::Context;
use crate::domain::{
    Id, Organization, OrganizationMember, OrganizationPatch, Permission, PermissionKind, Quota,
    ResourceType, OWNER_ROLE,
};
use crate::error::{Error, ErrorKind, Result};
use crate::repository::{OrganizationRepository, PermissionRepository};
use crate::telemetry::SpanGuard;
use async_trait::async_trait;
use std::sync::Arc;
use validator::Validate;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationService: Send + Sync {
    /// Create an organization owned by `owner`.
    ///
    /// The principal must be the owner or hold `create` on organizations.
    async fn create(&self, ctx: &Context, owner: Id, organization: Organization)
        -> Result<Organization>;
    async fn get(&self, ctx: &Context, id: Id) -> Result<Organization>;
    async fn get_all(&self, ctx: &Context, offset: i64, limit: i64)
        -> Result<Vec<Organization>>;
    async fn update(&self, ctx: &Context, id: Id, patch: OrganizationPatch)
        -> Result<Organization>;
    async fn delete(&self, ctx: &Context, id: Id, force: bool) -> Result<()>;

    async fn add_member(&self, ctx: &Context, organization_id: Id, user_id: Id) -> Result<()>;

    /// Members annotated with their roles. Members holding `all` on the
    /// organization carry the `Owner` role.
    async fn get_members(&self, ctx: &Context, organization_id: Id)
        -> Result<Vec<OrganizationMember>>;

    /// Revoke a member's permissions on the organization and remove them.
    /// The owner cannot be removed.
    async fn remove_member(&self, ctx: &Context, organization_id: Id, user_id: Id)
        -> Result<()>;

    /// Email `user_id` an invitation link to the organization at `path`
    async fn invite(&self, ctx: &Context, organization_id: Id, user_id: Id, path: &str)
        -> Result<()>;
}

pub struct OrganizationServiceImpl {
    base: BaseService,
    organization_repo: Arc<dyn OrganizationRepository>,
    permission_repo: Arc<dyn PermissionRepository>,
    license_service: Arc<dyn LicenseService>,
}

impl OrganizationServiceImpl {
    /// Requires an organization repository, a permission repository and a
    /// license service. Invitations additionally need a user repository and
    /// an email service.
    pub fn new(options: impl IntoIterator<Item = ServiceOption>) -> Result<Self> {
        let base = BaseService::new(options)?;
        let organization_repo = base.require_organization_repository()?;
        let permission_repo = base.require_permission_repository()?;
        let license_service = base.require_license_service()?;

        Ok(Self {
            base,
            organization_repo,
            permission_repo,
            license_service,
        })
    }

    /// Principal present and holding one of `kinds` on the organization
    async fn authorize(
        &self,
        ctx: &Context,
        span: &SpanGuard,
        organization_id: Id,
        kinds: &[PermissionKind],
    ) -> std::result::Result<(), ErrorKind> {
        if ctx.principal().is_none() {
            return Err(ErrorKind::NoUser);
        }
        if !self
            .base
            .ctx_user_permitted(ctx, span, organization_id, kinds)
            .await
        {
            return Err(ErrorKind::NoPermission);
        }
        Ok(())
    }

    async fn check_quota(&self, ctx: &Context, quota: Quota) -> Result<()> {
        if !self.license_service.within_threshold(ctx, quota).await? {
            return Err(Error::new(ErrorKind::QuotaExceeded));
        }
        Ok(())
    }
}

#[async_trait]
impl OrganizationService for OrganizationServiceImpl {
    async fn create(
        &self,
        ctx: &Context,
        owner: Id,
        organization: Organization,
    ) -> Result<Organization> {
        let span = self.base.span(ctx, "service.organization/create");

        owner
            .validate(ResourceType::User)
            .map_err(|e| Error::join(ErrorKind::OrganizationCreate, e))?;

        let Some(principal) = ctx.principal() else {
            return Err(Error::join(ErrorKind::OrganizationCreate, ErrorKind::NoUser));
        };

        if principal != owner
            && !self
                .base
                .ctx_user_permitted(
                    ctx,
                    &span,
                    Id::nil(ResourceType::Organization),
                    &[PermissionKind::Create],
                )
                .await
        {
            return Err(Error::join(
                ErrorKind::OrganizationCreate,
                ErrorKind::NoPermission,
            ));
        }

        organization.validate().map_err(|e| {
            Error::join(
                ErrorKind::OrganizationCreate,
                Error::join(ErrorKind::InvalidOrganization, e),
            )
        })?;

        self.check_quota(ctx, Quota::Organizations)
            .await
            .map_err(|e| Error::join(ErrorKind::OrganizationCreate, e))?;

        let organization = ctx
            .run(self.organization_repo.create(owner, organization))
            .await
            .map_err(|e| Error::join(ErrorKind::OrganizationCreate, e))?;

        let grant = Permission::new(owner, organization.id, PermissionKind::All);
        if let Err(e) = ctx.run(self.permission_repo.create(grant)).await {
            // Outside the context: it may be the reason the grant failed
            if let Err(rollback) = self.organization_repo.delete(organization.id).await {
                self.base.logger().warn(&format!(
                    "failed to remove organization {} without owner: {}",
                    organization.id, rollback
                ));
            }
            return Err(Error::join(ErrorKind::OrganizationCreate, e));
        }

        Ok(organization)
    }

    async fn get(&self, ctx: &Context, id: Id) -> Result<Organization> {
        let _span = self.base.span(ctx, "service.organization/get");

        id.validate(ResourceType::Organization)
            .map_err(|e| Error::join(ErrorKind::OrganizationGet, e))?;

        ctx.run(self.organization_repo.get(id))
            .await
            .map_err(|e| Error::join(ErrorKind::OrganizationGet, e))
    }

    async fn get_all(&self, ctx: &Context, offset: i64, limit: i64) -> Result<Vec<Organization>> {
        let _span = self.base.span(ctx, "service.organization/get_all");

        let (offset, limit) = pagination(offset, limit).ok_or_else(|| {
            Error::join(
                ErrorKind::OrganizationGetAll,
                ErrorKind::InvalidPaginationParams,
            )
        })?;

        ctx.run(self.organization_repo.get_all(offset, limit))
            .await
            .map_err(|e| Error::join(ErrorKind::OrganizationGetAll, e))
    }

    async fn update(
        &self,
        ctx: &Context,
        id: Id,
        patch: OrganizationPatch,
    ) -> Result<Organization> {
        let span = self.base.span(ctx, "service.organization/update");

        id.validate(ResourceType::Organization)
            .map_err(|e| Error::join(ErrorKind::OrganizationUpdate, e))?;

        self.authorize(ctx, &span, id, &[PermissionKind::Write])
            .await
            .map_err(|kind| Error::join(ErrorKind::OrganizationUpdate, kind))?;

        if patch.is_empty() {
            return Err(Error::join(
                ErrorKind::OrganizationUpdate,
                ErrorKind::NoPatchData,
            ));
        }

        patch.validate().map_err(|e| {
            Error::join(
                ErrorKind::OrganizationUpdate,
                Error::join(ErrorKind::InvalidOrganization, e),
            )
        })?;

        ctx.run(self.organization_repo.update(id, patch))
            .await
            .map_err(|e| Error::join(ErrorKind::OrganizationUpdate, e))
    }

    async fn delete(&self, ctx: &Context, id: Id, force: bool) -> Result<()> {
        let span = self.base.span(ctx, "service.organization/delete");

        id.validate(ResourceType::Organization)
            .map_err(|e| Error::join(ErrorKind::OrganizationDelete, e))?;

        self.authorize(ctx, &span, id, &[PermissionKind::Delete])
            .await
            .map_err(|kind| Error::join(ErrorKind::OrganizationDelete, kind))?;

        if force {
            return ctx
                .run(self.organization_repo.delete(id))
                .await
                .map_err(|e| Error::join(ErrorKind::OrganizationDelete, e));
        }

        ctx.run(
            self.organization_repo
                .update(id, OrganizationPatch::soft_delete()),
        )
        .await
        .map(|_| ())
        .map_err(|e| Error::join(ErrorKind::OrganizationDelete, e))
    }

    async fn add_member(&self, ctx: &Context, organization_id: Id, user_id: Id) -> Result<()> {
        let span = self.base.span(ctx, "service.organization/add_member");

        organization_id
            .validate(ResourceType::Organization)
            .and_then(|_| user_id.validate(ResourceType::User))
            .map_err(|e| Error::join(ErrorKind::OrganizationAddMember, e))?;

        self.authorize(ctx, &span, organization_id, &[PermissionKind::Write])
            .await
            .map_err(|kind| Error::join(ErrorKind::OrganizationAddMember, kind))?;

        self.check_quota(ctx, Quota::Users)
            .await
            .map_err(|e| Error::join(ErrorKind::OrganizationAddMember, e))?;

        ctx.run(self.organization_repo.add_member(organization_id, user_id))
            .await
            .map_err(|e| Error::join(ErrorKind::OrganizationAddMember, e))
    }

    async fn get_members(
        &self,
        ctx: &Context,
        organization_id: Id,
    ) -> Result<Vec<OrganizationMember>> {
        let span = self.base.span(ctx, "service.organization/get_members");

        organization_id
            .validate(ResourceType::Organization)
            .map_err(|e| Error::join(ErrorKind::OrganizationGetMembers, e))?;

        let mut members = ctx
            .run(self.organization_repo.get_members(organization_id))
            .await
            .map_err(|e| Error::join(ErrorKind::OrganizationGetMembers, e))?;

        for member in &mut members {
            if self
                .base
                .has_permission(
                    ctx,
                    &span,
                    member.user.id,
                    organization_id,
                    &[PermissionKind::All],
                )
                .await
            {
                member.roles.insert(OWNER_ROLE.to_string());
            }
        }

        Ok(members)
    }

    async fn remove_member(&self, ctx: &Context, organization_id: Id, user_id: Id) -> Result<()> {
        let span = self.base.span(ctx, "service.organization/remove_member");

        organization_id
            .validate(ResourceType::Organization)
            .and_then(|_| user_id.validate(ResourceType::User))
            .map_err(|e| Error::join(ErrorKind::OrganizationRemoveMember, e))?;

        self.authorize(ctx, &span, organization_id, &[PermissionKind::Write])
            .await
            .map_err(|kind| Error::join(ErrorKind::OrganizationRemoveMember, kind))?;

        let granted: Vec<Permission> = ctx
            .run(self.permission_repo.get_by_target(organization_id))
            .await
            .map_err(|e| Error::join(ErrorKind::OrganizationRemoveMember, e))?
            .into_iter()
            .filter(|p| p.subject == user_id)
            .collect();

        if granted.iter().any(|p| p.kind == PermissionKind::All) {
            return Err(Error::join(
                ErrorKind::OrganizationRemoveMember,
                ErrorKind::NoPermission,
            ));
        }

        // Grants go before the membership: a non-member never holds any
        for permission in &granted {
            ctx.run(self.permission_repo.delete(permission.id))
                .await
                .map_err(|e| Error::join(ErrorKind::OrganizationRemoveMember, e))?;
        }

        ctx.run(
            self.organization_repo
                .remove_member(organization_id, user_id),
        )
        .await
        .map_err(|e| Error::join(ErrorKind::OrganizationRemoveMember, e))
    }

    async fn invite(
        &self,
        ctx: &Context,
        organization_id: Id,
        user_id: Id,
        path: &str,
    ) -> Result<()> {
        let span = self.base.span(ctx, "service.organization/invite");

        let user_repo = self
            .base
            .user_repository()
            .ok_or_else(|| {
                Error::join(ErrorKind::OrganizationInvite, ErrorKind::NoUserRepository)
            })?;
        let email_service = self
            .base
            .email_service()
            .ok_or_else(|| {
                Error::join(ErrorKind::OrganizationInvite, ErrorKind::NoEmailService)
            })?;

        organization_id
            .validate(ResourceType::Organization)
            .and_then(|_| user_id.validate(ResourceType::User))
            .map_err(|e| Error::join(ErrorKind::OrganizationInvite, e))?;

        self.authorize(ctx, &span, organization_id, &[PermissionKind::Write])
            .await
            .map_err(|kind| Error::join(ErrorKind::OrganizationInvite, kind))?;

        let organization = ctx
            .run(self.organization_repo.get(organization_id))
            .await
            .map_err(|e| Error::join(ErrorKind::OrganizationInvite, e))?;
        let user = ctx
            .run(user_repo.get(user_id))
            .await
            .map_err(|e| Error::join(ErrorKind::OrganizationInvite, e))?;

        email_service
            .send_organization_invitation_email(ctx, &organization, &user, path)
            .await
            .map_err(|e| Error::join(ErrorKind::OrganizationInvite, e))
    }
}
