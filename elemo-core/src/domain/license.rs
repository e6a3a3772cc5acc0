//! License domain model

use super::common::{Id, ResourceType};
use crate::error::{Error, ErrorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use validator::Validate;

/// Address license holders write to for renewals
pub const RENEW_EMAIL: &str = "renew@elemo.app";

/// A countable resource capped by the license
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quota {
    Documents,
    Namespaces,
    Organizations,
    Projects,
    Roles,
    Users,
}

impl Quota {
    pub const ALL: [Quota; 6] = [
        Quota::Documents,
        Quota::Namespaces,
        Quota::Organizations,
        Quota::Projects,
        Quota::Roles,
        Quota::Users,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quota::Documents => "documents",
            Quota::Namespaces => "namespaces",
            Quota::Organizations => "organizations",
            Quota::Projects => "projects",
            Quota::Roles => "roles",
            Quota::Users => "users",
        }
    }
}

impl std::fmt::Display for Quota {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Quota {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Quota::ALL
            .into_iter()
            .find(|quota| quota.as_str() == s)
            .ok_or_else(|| Error::new(ErrorKind::QuotaInvalid))
    }
}

/// An opaque flag unlocked by the license
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feature(Cow<'static, str>);

impl Feature {
    pub const COMPONENTS: Feature = Feature(Cow::Borrowed("components"));
    pub const CUSTOM_FIELDS: Feature = Feature(Cow::Borrowed("custom_fields"));
    pub const CUSTOM_STATUSES: Feature = Feature(Cow::Borrowed("custom_statuses"));
    pub const MULTIPLE_ORGANIZATIONS: Feature = Feature(Cow::Borrowed("multiple_organizations"));
    pub const PERMISSIONS: Feature = Feature(Cow::Borrowed("permissions"));
    pub const RELEASES: Feature = Feature(Cow::Borrowed("releases"));

    pub fn new(name: impl Into<String>) -> Self {
        Feature(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The license the platform runs under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct License {
    pub id: Id,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 120))]
    pub organization: String,
    #[serde(default)]
    pub quotas: BTreeMap<Quota, u32>,
    #[serde(default)]
    pub features: BTreeSet<Feature>,
    pub expires_at: DateTime<Utc>,
}

impl License {
    pub fn new(
        email: impl Into<String>,
        organization: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Id::new(ResourceType::License),
            email: email.into(),
            organization: organization.into(),
            quotas: BTreeMap::new(),
            features: BTreeSet::new(),
            expires_at,
        }
    }

    pub fn with_quota(mut self, quota: Quota, max: u32) -> Self {
        self.quotas.insert(quota, max);
        self
    }

    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.features.insert(feature);
        self
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Structural check of the license record
    pub fn check(&self) -> Result<(), Error> {
        self.id.validate(ResourceType::License)?;
        self.validate()
            .map_err(|e| Error::join(ErrorKind::LicenseInvalid, e))
    }
}
