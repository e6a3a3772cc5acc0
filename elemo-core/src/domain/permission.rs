//! Permission domain model

use super::common::{Id, ResourceType};
use crate::error::{Error, ErrorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of access a permission grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionKind {
    Create,
    Read,
    Write,
    Delete,
    /// Implies every other kind
    All,
}

impl PermissionKind {
    /// The requested kinds plus `All`, which always satisfies a check.
    pub fn with_all(kinds: &[PermissionKind]) -> Vec<PermissionKind> {
        let mut requested = kinds.to_vec();
        if !requested.contains(&PermissionKind::All) {
            requested.push(PermissionKind::All);
        }
        requested
    }
}

impl std::fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionKind::Create => write!(f, "create"),
            PermissionKind::Read => write!(f, "read"),
            PermissionKind::Write => write!(f, "write"),
            PermissionKind::Delete => write!(f, "delete"),
            PermissionKind::All => write!(f, "all"),
        }
    }
}

impl std::str::FromStr for PermissionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(PermissionKind::Create),
            "read" => Ok(PermissionKind::Read),
            "write" => Ok(PermissionKind::Write),
            "delete" => Ok(PermissionKind::Delete),
            "all" | "*" => Ok(PermissionKind::All),
            _ => Err(format!("Unknown permission kind: {}", s)),
        }
    }
}

/// Platform-wide role held by a principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemRole {
    Owner,
    Admin,
    Support,
}

impl SystemRole {
    /// Roles allowed to read the platform license
    pub const LICENSE_READERS: [SystemRole; 3] =
        [SystemRole::Owner, SystemRole::Admin, SystemRole::Support];
}

impl std::fmt::Display for SystemRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemRole::Owner => write!(f, "Owner"),
            SystemRole::Admin => write!(f, "Admin"),
            SystemRole::Support => write!(f, "Support"),
        }
    }
}

/// A grant of `kind` access on `target` to `subject`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    pub id: Id,
    pub subject: Id,
    pub target: Id,
    pub kind: PermissionKind,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Permission {
    pub fn new(subject: Id, target: Id, kind: PermissionKind) -> Self {
        Self {
            id: Id::nil(ResourceType::Permission),
            subject,
            target,
            kind,
            created_at: None,
            updated_at: None,
        }
    }

    /// Subject and target must be real resources; a subject never grants
    /// itself access to itself.
    pub fn validate(&self) -> Result<(), Error> {
        if self.subject.is_nil() || self.target.is_nil() || self.subject == self.target {
            return Err(Error::new(ErrorKind::InvalidPermission));
        }
        Ok(())
    }
}
