//! Repository contracts consumed by the service layer
//!
//! Storage engines live outside this crate; services only see these traits.

pub mod license;
pub mod organization;
pub mod permission;
pub mod user;

pub use license::LicenseRepository;
pub use organization::OrganizationRepository;
pub use permission::{PermissionError, PermissionRepository};
pub use user::UserRepository;

use crate::context::Context;
use crate::error::BoxError;
use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by repositories
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("entity not found")]
    NotFound,

    #[error("entity already exists")]
    AlreadyExists,

    #[error("storage error: {0}")]
    Storage(String),
}

/// Anything exposing a context-scoped liveness check
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Pingable: Send + Sync {
    async fn ping(&self, ctx: &Context) -> Result<(), BoxError>;
}
