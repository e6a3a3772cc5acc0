//! User repository

use super::RepositoryError;
use crate::domain::{Id, User, UserPatch};
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persist a new user and return it with its assigned id
    async fn create(&self, user: User) -> Result<User, RepositoryError>;
    async fn get(&self, id: Id) -> Result<User, RepositoryError>;
    async fn get_by_email(&self, email: &str) -> Result<User, RepositoryError>;
    async fn get_all(&self, offset: usize, limit: usize) -> Result<Vec<User>, RepositoryError>;
    async fn update(&self, id: Id, patch: UserPatch) -> Result<User, RepositoryError>;
    async fn delete(&self, id: Id) -> Result<(), RepositoryError>;
}
