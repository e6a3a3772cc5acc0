//! Integration test infrastructure
//!
//! In-memory repositories and recording collaborators, so services can be
//! exercised end to end without a database or an SMTP relay.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use elemo_core::config::SmtpConfig;
use elemo_core::domain::{
    HealthCheckComponent, Id, License, Organization, OrganizationMember, OrganizationPatch,
    Permission, PermissionKind, Quota, ResourceType, SystemRole, User, UserPatch, VersionInfo,
};
use elemo_core::email::{EmailProviderError, EmailSender, Template};
use elemo_core::error::BoxError;
use elemo_core::repository::{
    LicenseRepository, OrganizationRepository, PermissionError, PermissionRepository, Pingable,
    RepositoryError, UserRepository,
};
use elemo_core::service::{
    EmailServiceImpl, LicenseServiceImpl, OrganizationServiceImpl, PermissionServiceImpl,
    ServiceOption, SystemServiceImpl, UserServiceImpl,
};
use elemo_core::telemetry::{SpanGuard, SpanHandle, Tracer};
use elemo_core::Context;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

// ============================================================================
// Test Fixtures
// ============================================================================

pub fn test_smtp_config() -> SmtpConfig {
    SmtpConfig {
        hostname: "elemo.example.com".to_string(),
        support_address: "support@example.com".to_string(),
        from_address: "no-reply@example.com".to_string(),
        ..Default::default()
    }
}

pub fn test_version() -> VersionInfo {
    VersionInfo {
        version: "1.0.0".to_string(),
        commit: "1234567890".to_string(),
        date: "2023-01-01T00:00:00Z".to_string(),
        rust_version: "1.80.0".to_string(),
    }
}

/// A license valid for another month with room for a handful of resources
pub fn test_license() -> License {
    License::new("info@example.com", "ACME Inc.", Utc::now() + Duration::days(30))
        .with_quota(Quota::Users, 10)
        .with_quota(Quota::Organizations, 5)
        .with_quota(Quota::Documents, 100)
}

pub fn test_user(username: &str) -> User {
    let mut user = User::new(username, format!("{}@example.com", username), "super-secret");
    user.first_name = "Test".to_string();
    user.last_name = "User".to_string();
    user
}

// ============================================================================
// Test Repository Implementations
// ============================================================================

pub struct TestUserRepository {
    users: RwLock<Vec<User>>,
}

impl TestUserRepository {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(vec![]),
        }
    }

    /// Store `user` directly, assigning an id when it has none
    pub async fn add_user(&self, mut user: User) -> User {
        if user.id.is_nil() {
            user.id = Id::new(ResourceType::User);
        }
        self.users.write().await.push(user.clone());
        user
    }

    pub async fn find(&self, id: Id) -> Option<User> {
        self.users.read().await.iter().find(|u| u.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

impl Default for TestUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for TestUserRepository {
    async fn create(&self, mut user: User) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::AlreadyExists);
        }

        user.id = Id::new(ResourceType::User);
        user.created_at = Some(Utc::now());
        users.push(user.clone());
        Ok(user)
    }

    async fn get(&self, id: Id) -> Result<User, RepositoryError> {
        self.find(id).await.ok_or(RepositoryError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> Result<User, RepositoryError> {
        let users = self.users.read().await;
        users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_all(&self, offset: usize, limit: usize) -> Result<Vec<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn update(&self, id: Id, patch: UserPatch) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepositoryError::NotFound)?;

        patch.apply(user);
        user.updated_at = Some(Utc::now());
        Ok(user.clone())
    }

    async fn delete(&self, id: Id) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        let pos = users
            .iter()
            .position(|u| u.id == id)
            .ok_or(RepositoryError::NotFound)?;
        users.remove(pos);
        Ok(())
    }
}

/// Organization repository resolving members through a user repository
pub struct TestOrganizationRepository {
    organizations: RwLock<Vec<Organization>>,
    members: RwLock<Vec<(Id, Id)>>,
    users: Arc<TestUserRepository>,
}

impl TestOrganizationRepository {
    pub fn new(users: Arc<TestUserRepository>) -> Self {
        Self {
            organizations: RwLock::new(vec![]),
            members: RwLock::new(vec![]),
            users,
        }
    }

    async fn member_ids(&self, organization_id: Id) -> Vec<Id> {
        self.members
            .read()
            .await
            .iter()
            .filter(|(org, _)| *org == organization_id)
            .map(|(_, user)| *user)
            .collect()
    }

    pub async fn find(&self, id: Id) -> Option<Organization> {
        self.organizations
            .read()
            .await
            .iter()
            .find(|o| o.id == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.organizations.read().await.len()
    }
}

#[async_trait]
impl OrganizationRepository for TestOrganizationRepository {
    async fn create(
        &self,
        owner: Id,
        mut organization: Organization,
    ) -> Result<Organization, RepositoryError> {
        organization.id = Id::new(ResourceType::Organization);
        organization.created_at = Some(Utc::now());
        organization.members = vec![owner];

        self.organizations.write().await.push(organization.clone());
        self.members.write().await.push((organization.id, owner));
        Ok(organization)
    }

    async fn get(&self, id: Id) -> Result<Organization, RepositoryError> {
        let mut organization = self.find(id).await.ok_or(RepositoryError::NotFound)?;
        organization.members = self.member_ids(id).await;
        Ok(organization)
    }

    async fn get_all(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Organization>, RepositoryError> {
        let organizations = self.organizations.read().await;
        Ok(organizations
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn update(
        &self,
        id: Id,
        patch: OrganizationPatch,
    ) -> Result<Organization, RepositoryError> {
        let mut organizations = self.organizations.write().await;
        let organization = organizations
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(RepositoryError::NotFound)?;

        patch.apply(organization);
        organization.updated_at = Some(Utc::now());
        Ok(organization.clone())
    }

    async fn delete(&self, id: Id) -> Result<(), RepositoryError> {
        let mut organizations = self.organizations.write().await;
        let pos = organizations
            .iter()
            .position(|o| o.id == id)
            .ok_or(RepositoryError::NotFound)?;
        organizations.remove(pos);
        self.members.write().await.retain(|(org, _)| *org != id);
        Ok(())
    }

    async fn add_member(&self, organization_id: Id, user_id: Id) -> Result<(), RepositoryError> {
        if self.find(organization_id).await.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let mut members = self.members.write().await;
        if members.contains(&(organization_id, user_id)) {
            return Err(RepositoryError::AlreadyExists);
        }
        members.push((organization_id, user_id));
        Ok(())
    }

    async fn remove_member(
        &self,
        organization_id: Id,
        user_id: Id,
    ) -> Result<(), RepositoryError> {
        let mut members = self.members.write().await;
        let pos = members
            .iter()
            .position(|m| *m == (organization_id, user_id))
            .ok_or(RepositoryError::NotFound)?;
        members.remove(pos);
        Ok(())
    }

    async fn get_members(
        &self,
        organization_id: Id,
    ) -> Result<Vec<OrganizationMember>, RepositoryError> {
        let mut members = Vec::new();
        for user_id in self.member_ids(organization_id).await {
            let user = self.users.get(user_id).await?;
            members.push(OrganizationMember::new(user));
        }
        Ok(members)
    }
}

/// Permission repository with switchable lookup and grant failures
pub struct TestPermissionRepository {
    permissions: RwLock<Vec<Permission>>,
    roles: RwLock<HashMap<Id, HashSet<SystemRole>>>,
    failing: AtomicBool,
    grants_failing: AtomicBool,
}

impl TestPermissionRepository {
    pub fn new() -> Self {
        Self {
            permissions: RwLock::new(vec![]),
            roles: RwLock::new(HashMap::new()),
            failing: AtomicBool::new(false),
            grants_failing: AtomicBool::new(false),
        }
    }

    /// Store a grant of `kind` on `target` to `subject`
    pub async fn grant(&self, subject: Id, target: Id, kind: PermissionKind) -> Permission {
        let mut permission = Permission::new(subject, target, kind);
        permission.id = Id::new(ResourceType::Permission);
        self.permissions.write().await.push(permission.clone());
        permission
    }

    pub async fn assign_role(&self, subject: Id, role: SystemRole) {
        self.roles
            .write()
            .await
            .entry(subject)
            .or_default()
            .insert(role);
    }

    /// Make every lookup fail with [`PermissionError::Read`]
    pub fn fail_lookups(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make `create`, `get_by_target` and `delete` fail with a storage error
    pub fn fail_grants(&self, failing: bool) {
        self.grants_failing.store(failing, Ordering::SeqCst);
    }

    fn check_grants(&self) -> Result<(), RepositoryError> {
        if self.grants_failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Storage("grant store unavailable".to_string()));
        }
        Ok(())
    }

    pub async fn granted_to(&self, subject: Id) -> Vec<Permission> {
        self.permissions
            .read()
            .await
            .iter()
            .filter(|p| p.subject == subject)
            .cloned()
            .collect()
    }
}

impl Default for TestPermissionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PermissionRepository for TestPermissionRepository {
    async fn create(&self, mut permission: Permission) -> Result<Permission, RepositoryError> {
        self.check_grants()?;
        permission.id = Id::new(ResourceType::Permission);
        permission.created_at = Some(Utc::now());
        self.permissions.write().await.push(permission.clone());
        Ok(permission)
    }

    async fn get(&self, id: Id) -> Result<Permission, RepositoryError> {
        let permissions = self.permissions.read().await;
        permissions
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_by_target(&self, target: Id) -> Result<Vec<Permission>, RepositoryError> {
        self.check_grants()?;
        let permissions = self.permissions.read().await;
        Ok(permissions
            .iter()
            .filter(|p| p.target == target)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Id) -> Result<(), RepositoryError> {
        self.check_grants()?;
        let mut permissions = self.permissions.write().await;
        let pos = permissions
            .iter()
            .position(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;
        permissions.remove(pos);
        Ok(())
    }

    async fn has_permission(
        &self,
        subject: Id,
        target: Id,
        kinds: Vec<PermissionKind>,
    ) -> Result<bool, PermissionError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PermissionError::Read);
        }

        let permissions = self.permissions.read().await;
        Ok(permissions
            .iter()
            .any(|p| p.subject == subject && p.target == target && kinds.contains(&p.kind)))
    }

    async fn has_any_system_role(
        &self,
        subject: Id,
        roles: Vec<SystemRole>,
    ) -> Result<bool, PermissionError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PermissionError::Read);
        }

        let held = self.roles.read().await;
        Ok(held
            .get(&subject)
            .is_some_and(|held| roles.iter().any(|role| held.contains(role))))
    }
}

/// License usage counters set by the test
pub struct TestLicenseRepository {
    counts: RwLock<HashMap<Quota, u64>>,
    failing: AtomicBool,
}

impl TestLicenseRepository {
    pub fn new() -> Self {
        Self {
            counts: RwLock::new(HashMap::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub async fn set_count(&self, quota: Quota, count: u64) {
        self.counts.write().await.insert(quota, count);
    }

    pub fn fail_counts(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    async fn count(&self, quota: Quota) -> Result<u64, RepositoryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Storage("counter unavailable".to_string()));
        }
        Ok(self.counts.read().await.get(&quota).copied().unwrap_or(0))
    }
}

impl Default for TestLicenseRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LicenseRepository for TestLicenseRepository {
    async fn active_user_count(&self) -> Result<u64, RepositoryError> {
        self.count(Quota::Users).await
    }

    async fn active_organization_count(&self) -> Result<u64, RepositoryError> {
        self.count(Quota::Organizations).await
    }

    async fn document_count(&self) -> Result<u64, RepositoryError> {
        self.count(Quota::Documents).await
    }

    async fn namespace_count(&self) -> Result<u64, RepositoryError> {
        self.count(Quota::Namespaces).await
    }

    async fn project_count(&self) -> Result<u64, RepositoryError> {
        self.count(Quota::Projects).await
    }

    async fn role_count(&self) -> Result<u64, RepositoryError> {
        self.count(Quota::Roles).await
    }
}

// ============================================================================
// Recording Collaborators
// ============================================================================

#[derive(Default)]
struct Recording {
    started: Vec<String>,
    events: Vec<String>,
    ended: usize,
}

/// Tracer remembering every span it started
#[derive(Default, Clone)]
pub struct RecordingTracer {
    recording: Arc<Mutex<Recording>>,
}

struct RecordingSpan {
    recording: Arc<Mutex<Recording>>,
}

impl SpanHandle for RecordingSpan {
    fn add_event(&self, message: &str) {
        self.recording.lock().unwrap().events.push(message.to_string());
    }

    fn end(&self) {
        self.recording.lock().unwrap().ended += 1;
    }
}

impl Tracer for RecordingTracer {
    fn start(&self, _ctx: &Context, name: &str) -> SpanGuard {
        self.recording.lock().unwrap().started.push(name.to_string());
        SpanGuard::new(
            name,
            Box::new(RecordingSpan {
                recording: Arc::clone(&self.recording),
            }),
        )
    }
}

impl RecordingTracer {
    pub fn started(&self) -> Vec<String> {
        self.recording.lock().unwrap().started.clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.recording.lock().unwrap().events.clone()
    }

    pub fn ended(&self) -> usize {
        self.recording.lock().unwrap().ended
    }

    pub fn reset(&self) {
        *self.recording.lock().unwrap() = Recording::default();
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub subject: String,
    pub to: String,
    pub template: Template,
}

/// Email sender keeping every message instead of delivering it
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<SentEmail>>,
    failing: AtomicBool,
}

impl RecordingEmailSender {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_sends(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_email(
        &self,
        _ctx: &Context,
        subject: &str,
        to: &str,
        template: &Template,
    ) -> Result<(), EmailProviderError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmailProviderError::SendFailed("relay refused".to_string()));
        }

        self.sent.lock().unwrap().push(SentEmail {
            subject: subject.to_string(),
            to: to.to_string(),
            template: template.clone(),
        });
        Ok(())
    }
}

/// Pingable answering with a fixed outcome
pub struct StaticPingable {
    healthy: bool,
}

impl StaticPingable {
    pub fn healthy() -> Arc<dyn Pingable> {
        Arc::new(Self { healthy: true })
    }

    pub fn unhealthy() -> Arc<dyn Pingable> {
        Arc::new(Self { healthy: false })
    }
}

#[async_trait]
impl Pingable for StaticPingable {
    async fn ping(&self, _ctx: &Context) -> Result<(), BoxError> {
        if self.healthy {
            Ok(())
        } else {
            Err(RepositoryError::Storage("connection refused".to_string()).into())
        }
    }
}

/// Pingable that never answers in time
pub struct HangingPingable;

#[async_trait]
impl Pingable for HangingPingable {
    async fn ping(&self, _ctx: &Context) -> Result<(), BoxError> {
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        Ok(())
    }
}

// ============================================================================
// Service Wiring
// ============================================================================

/// One set of in-memory collaborators shared by every service it builds
pub struct TestHarness {
    pub users: Arc<TestUserRepository>,
    pub organizations: Arc<TestOrganizationRepository>,
    pub permissions: Arc<TestPermissionRepository>,
    pub licenses: Arc<TestLicenseRepository>,
    pub sender: Arc<RecordingEmailSender>,
    pub tracer: RecordingTracer,
}

impl TestHarness {
    pub fn new() -> Self {
        let users = Arc::new(TestUserRepository::new());
        Self {
            organizations: Arc::new(TestOrganizationRepository::new(users.clone())),
            users,
            permissions: Arc::new(TestPermissionRepository::new()),
            licenses: Arc::new(TestLicenseRepository::new()),
            sender: Arc::new(RecordingEmailSender::default()),
            tracer: RecordingTracer::default(),
        }
    }

    fn tracer_option(&self) -> ServiceOption {
        ServiceOption::tracer(Arc::new(self.tracer.clone()))
    }

    pub fn permission_service(&self) -> PermissionServiceImpl {
        PermissionServiceImpl::new([
            self.tracer_option(),
            ServiceOption::permission_repository(self.permissions.clone()),
        ])
        .unwrap()
    }

    pub fn license_service(&self, license: License) -> LicenseServiceImpl {
        let license_repo: Arc<dyn LicenseRepository> = self.licenses.clone();
        LicenseServiceImpl::new(
            Some(license),
            Some(license_repo),
            [
                self.tracer_option(),
                ServiceOption::permission_service(Arc::new(self.permission_service())),
            ],
        )
        .unwrap()
    }

    pub fn email_service(&self) -> EmailServiceImpl {
        let sender: Arc<dyn EmailSender> = self.sender.clone();
        EmailServiceImpl::new(
            Some(sender),
            &test_smtp_config(),
            [self.tracer_option()],
        )
        .unwrap()
    }

    pub fn user_service(&self, license: License) -> UserServiceImpl {
        UserServiceImpl::new([
            self.tracer_option(),
            ServiceOption::user_repository(self.users.clone()),
            ServiceOption::permission_repository(self.permissions.clone()),
            ServiceOption::license_service(Arc::new(self.license_service(license))),
        ])
        .unwrap()
    }

    pub fn organization_service(&self, license: License) -> OrganizationServiceImpl {
        OrganizationServiceImpl::new([
            self.tracer_option(),
            ServiceOption::organization_repository(self.organizations.clone()),
            ServiceOption::permission_repository(self.permissions.clone()),
            ServiceOption::license_service(Arc::new(self.license_service(license))),
            ServiceOption::user_repository(self.users.clone()),
            ServiceOption::email_service(Arc::new(self.email_service())),
        ])
        .unwrap()
    }

    pub fn system_service(
        &self,
        resources: HashMap<HealthCheckComponent, Arc<dyn Pingable>>,
    ) -> SystemServiceImpl {
        SystemServiceImpl::new(resources, Some(test_version()), [self.tracer_option()]).unwrap()
    }

    /// A stored user acting as the principal of the returned context
    pub async fn signed_in(&self, username: &str) -> (User, Context) {
        let user = self.users.add_user(test_user(username)).await;
        let ctx = Context::new().with_user(user.id);
        (user, ctx)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
