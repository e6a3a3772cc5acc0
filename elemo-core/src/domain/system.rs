//! System health and version models

use serde::{Deserialize, Serialize};

/// Health of a single probed resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Unknown => write!(f, "unknown"),
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Resources the system service probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthCheckComponent {
    GraphDatabase,
    RelationalDatabase,
    CacheDatabase,
    License,
}

impl std::fmt::Display for HealthCheckComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthCheckComponent::GraphDatabase => write!(f, "graph_database"),
            HealthCheckComponent::RelationalDatabase => write!(f, "relational_database"),
            HealthCheckComponent::CacheDatabase => write!(f, "cache_database"),
            HealthCheckComponent::License => write!(f, "license"),
        }
    }
}

/// Build identifiers disclosed as-is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub commit: String,
    pub date: String,
    pub rust_version: String,
}
