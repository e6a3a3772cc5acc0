//! System service: heartbeat, version and concurrent health checks

use super::base::{BaseService, ServiceOption};
use crate::context::Context;
use crate::domain::{HealthCheckComponent, HealthStatus, VersionInfo};
use crate::error::{Error, ErrorKind, Result};
use crate::repository::Pingable;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

/// Outcome of a health check: the status of every component and the
/// first failure observed, if any
#[derive(Debug)]
pub struct SystemHealth {
    pub components: BTreeMap<HealthCheckComponent, HealthStatus>,
    pub error: Option<Error>,
}

impl SystemHealth {
    pub fn is_healthy(&self) -> bool {
        self.error.is_none()
            && self
                .components
                .values()
                .all(|status| *status == HealthStatus::Healthy)
    }

    /// The component map, or the first failure
    pub fn into_result(self) -> Result<BTreeMap<HealthCheckComponent, HealthStatus>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.components),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SystemService: Send + Sync {
    async fn get_heartbeat(&self, ctx: &Context) -> Result<()>;

    /// Ping every registered resource concurrently
    async fn get_health(&self, ctx: &Context) -> SystemHealth;

    async fn get_version(&self, ctx: &Context) -> Result<VersionInfo>;
}

pub struct SystemServiceImpl {
    base: BaseService,
    resources: HashMap<HealthCheckComponent, Arc<dyn Pingable>>,
    version: VersionInfo,
}

impl SystemServiceImpl {
    /// Requires at least one resource and the version info
    pub fn new(
        resources: HashMap<HealthCheckComponent, Arc<dyn Pingable>>,
        version: Option<VersionInfo>,
        options: impl IntoIterator<Item = ServiceOption>,
    ) -> Result<Self> {
        let base = BaseService::new(options)?;

        if resources.is_empty() {
            return Err(Error::new(ErrorKind::NoResources));
        }
        let version = version.ok_or(ErrorKind::NoVersionInfo)?;

        Ok(Self {
            base,
            resources,
            version,
        })
    }
}

#[async_trait]
impl SystemService for SystemServiceImpl {
    async fn get_heartbeat(&self, ctx: &Context) -> Result<()> {
        let _span = self.base.span(ctx, "service.system/get_heartbeat");
        Ok(())
    }

    async fn get_health(&self, ctx: &Context) -> SystemHealth {
        let span = self.base.span(ctx, "service.system/get_health");

        let components = Arc::new(Mutex::new(
            self.resources
                .keys()
                .map(|component| (*component, HealthStatus::Unknown))
                .collect::<BTreeMap<_, _>>(),
        ));
        let (errors, mut first_error) = mpsc::channel::<Error>(1);

        let mut workers = JoinSet::new();
        for (component, resource) in &self.resources {
            span.add_event(&format!("Check {} health", component));

            let component = *component;
            let resource = Arc::clone(resource);
            let components = Arc::clone(&components);
            let errors = errors.clone();
            let ctx = ctx.clone();

            workers.spawn(async move {
                let status = match ctx.run(resource.ping(&ctx)).await {
                    Ok(()) => HealthStatus::Healthy,
                    Err(e) => {
                        // Only the first failure is kept.
                        let _ = errors.try_send(Error::join(ErrorKind::SystemHealthCheck, e));
                        HealthStatus::Unhealthy
                    }
                };
                components.lock().await.insert(component, status);
            });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                let _ = errors.try_send(Error::join(ErrorKind::SystemHealthCheck, e));
            }
        }
        drop(errors);

        let mut components = components.lock().await.clone();
        for status in components.values_mut() {
            if *status == HealthStatus::Unknown {
                *status = HealthStatus::Unhealthy;
            }
        }

        self.base
            .logger()
            .debug(&format!("checked health of {} components", components.len()));

        SystemHealth {
            components,
            error: first_error.try_recv().ok(),
        }
    }

    async fn get_version(&self, ctx: &Context) -> Result<VersionInfo> {
        let _span = self.base.span(ctx, "service.system/get_version");
        Ok(self.version.clone())
    }
}
