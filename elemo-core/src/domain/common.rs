//! Common types for domain models

use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of resource an [`Id`] points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Document,
    License,
    Namespace,
    Organization,
    Permission,
    Project,
    Role,
    Team,
    User,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Document => "document",
            ResourceType::License => "license",
            ResourceType::Namespace => "namespace",
            ResourceType::Organization => "organization",
            ResourceType::Permission => "permission",
            ResourceType::Project => "project",
            ResourceType::Role => "role",
            ResourceType::Team => "team",
            ResourceType::User => "user",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "document" => Ok(ResourceType::Document),
            "license" => Ok(ResourceType::License),
            "namespace" => Ok(ResourceType::Namespace),
            "organization" => Ok(ResourceType::Organization),
            "permission" => Ok(ResourceType::Permission),
            "project" => Ok(ResourceType::Project),
            "role" => Ok(ResourceType::Role),
            "team" => Ok(ResourceType::Team),
            "user" => Ok(ResourceType::User),
            _ => Err(format!("Unknown resource type: {}", s)),
        }
    }
}

/// Identifier of a resource, labelled with its resource type.
///
/// The nil id of a resource type stands for the type itself: permission
/// checks that ask "may the principal create a user" target `Id::nil(User)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id {
    inner: Uuid,
    kind: ResourceType,
}

impl Id {
    pub fn new(kind: ResourceType) -> Self {
        Self {
            inner: Uuid::new_v4(),
            kind,
        }
    }

    pub fn nil(kind: ResourceType) -> Self {
        Self {
            inner: Uuid::nil(),
            kind,
        }
    }

    pub fn from_uuid(inner: Uuid, kind: ResourceType) -> Self {
        Self { inner, kind }
    }

    pub fn is_nil(&self) -> bool {
        self.inner.is_nil()
    }

    pub fn kind(&self) -> ResourceType {
        self.kind
    }

    pub fn uuid(&self) -> Uuid {
        self.inner
    }

    /// Check that the id is set and points at a resource of `expected` type
    pub fn validate(&self, expected: ResourceType) -> Result<(), Error> {
        if self.is_nil() || self.kind != expected {
            return Err(Error::new(ErrorKind::InvalidId));
        }
        Ok(())
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.inner)
    }
}

impl std::str::FromStr for Id {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (kind, inner) = s
            .split_once(':')
            .ok_or_else(|| format!("Invalid id: {}", s))?;
        let kind = kind.parse()?;
        let inner = Uuid::parse_str(inner).map_err(|e| format!("Invalid id {}: {}", s, e))?;
        Ok(Self { inner, kind })
    }
}
