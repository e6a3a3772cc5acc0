//! Organization repository

use super::RepositoryError;
use crate::domain::{Id, Organization, OrganizationMember, OrganizationPatch};
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Persist a new organization with `owner` as its first member
    async fn create(
        &self,
        owner: Id,
        organization: Organization,
    ) -> Result<Organization, RepositoryError>;
    async fn get(&self, id: Id) -> Result<Organization, RepositoryError>;
    async fn get_all(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Organization>, RepositoryError>;
    async fn update(
        &self,
        id: Id,
        patch: OrganizationPatch,
    ) -> Result<Organization, RepositoryError>;
    async fn delete(&self, id: Id) -> Result<(), RepositoryError>;

    // Membership
    async fn add_member(&self, organization_id: Id, user_id: Id) -> Result<(), RepositoryError>;
    async fn remove_member(&self, organization_id: Id, user_id: Id)
        -> Result<(), RepositoryError>;
    /// Members with their persisted roles
    async fn get_members(
        &self,
        organization_id: Id,
    ) -> Result<Vec<OrganizationMember>, RepositoryError>;
}
