//! Permission repository

use super::RepositoryError;
use crate::domain::{Id, Permission, PermissionKind, SystemRole};
use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by permission lookups
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// The permission could not be read. Treated as "denied" by callers.
    #[error("failed to read permission")]
    Read,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn create(&self, permission: Permission) -> Result<Permission, RepositoryError>;
    async fn get(&self, id: Id) -> Result<Permission, RepositoryError>;
    async fn get_by_target(&self, target: Id) -> Result<Vec<Permission>, RepositoryError>;
    async fn delete(&self, id: Id) -> Result<(), RepositoryError>;

    /// Whether `subject` holds any of `kinds` on `target`
    async fn has_permission(
        &self,
        subject: Id,
        target: Id,
        kinds: Vec<PermissionKind>,
    ) -> Result<bool, PermissionError>;

    /// Whether `subject` holds any of `roles`
    async fn has_any_system_role(
        &self,
        subject: Id,
        roles: Vec<SystemRole>,
    ) -> Result<bool, PermissionError>;
}
