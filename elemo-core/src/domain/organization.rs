//! Organization domain model

use super::common::{Id, ResourceType};
use super::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

/// Role label given at read time to members holding `all` on the organization
pub const OWNER_ROLE: &str = "Owner";

/// Organization status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationStatus {
    #[default]
    Active,
    Deleted,
}

impl std::str::FromStr for OrganizationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(OrganizationStatus::Active),
            "deleted" => Ok(OrganizationStatus::Deleted),
            _ => Err(format!("Unknown organization status: {}", s)),
        }
    }
}

impl std::fmt::Display for OrganizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrganizationStatus::Active => write!(f, "active"),
            OrganizationStatus::Deleted => write!(f, "deleted"),
        }
    }
}

/// Organization entity.
///
/// The member, namespace and team lists are a snapshot taken when the
/// organization was read; membership itself lives in the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Organization {
    pub id: Id,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(url)]
    pub logo: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    pub status: OrganizationStatus,
    #[serde(default)]
    pub members: Vec<Id>,
    #[serde(default)]
    pub namespaces: Vec<Id>,
    #[serde(default)]
    pub teams: Vec<Id>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Organization {
    /// A new, not yet persisted organization. The repository assigns the id.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Id::nil(ResourceType::Organization),
            name: name.into(),
            email: email.into(),
            logo: None,
            website: None,
            status: OrganizationStatus::Active,
            members: Vec::new(),
            namespaces: Vec::new(),
            teams: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.status == OrganizationStatus::Deleted
    }

    pub fn has_member(&self, user_id: Id) -> bool {
        self.members.contains(&user_id)
    }
}

/// Partial update of an organization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct OrganizationPatch {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(url)]
    pub logo: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    pub status: Option<OrganizationStatus>,
}

impl OrganizationPatch {
    pub fn soft_delete() -> Self {
        Self {
            status: Some(OrganizationStatus::Deleted),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.logo.is_none()
            && self.website.is_none()
            && self.status.is_none()
    }

    pub fn apply(&self, organization: &mut Organization) {
        if let Some(name) = &self.name {
            organization.name = name.clone();
        }
        if let Some(email) = &self.email {
            organization.email = email.clone();
        }
        if let Some(logo) = &self.logo {
            organization.logo = Some(logo.clone());
        }
        if let Some(website) = &self.website {
            organization.website = Some(website.clone());
        }
        if let Some(status) = self.status {
            organization.status = status;
        }
    }
}

/// A user in an organization, with the roles they hold there
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationMember {
    #[serde(flatten)]
    pub user: User,
    pub roles: BTreeSet<String>,
}

impl OrganizationMember {
    pub fn new(user: User) -> Self {
        Self {
            user,
            roles: BTreeSet::new(),
        }
    }

    pub fn is_owner(&self) -> bool {
        self.roles.contains(OWNER_ROLE)
    }
}
