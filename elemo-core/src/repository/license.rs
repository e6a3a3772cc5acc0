//! License usage repository
//!
//! Live counts of the resources a license caps.

use super::RepositoryError;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LicenseRepository: Send + Sync {
    async fn active_user_count(&self) -> Result<u64, RepositoryError>;
    async fn active_organization_count(&self) -> Result<u64, RepositoryError>;
    async fn document_count(&self) -> Result<u64, RepositoryError>;
    async fn namespace_count(&self) -> Result<u64, RepositoryError>;
    async fn project_count(&self) -> Result<u64, RepositoryError>;
    async fn role_count(&self) -> Result<u64, RepositoryError>;
}
