//! Business logic layer
//!
//! Every service is built from an ordered list of [`ServiceOption`]s and
//! exposed behind a trait so callers and other services can swap it out.

pub mod base;
pub mod email;
pub mod license;
pub mod organization;
pub mod permission;
pub mod system;
pub mod user;

pub use base::{BaseService, ServiceOption};
pub use email::{EmailService, EmailServiceImpl};
pub use license::{LicenseService, LicenseServiceImpl};
pub use organization::{OrganizationService, OrganizationServiceImpl};
pub use permission::{PermissionService, PermissionServiceImpl};
pub use system::{SystemHealth, SystemService, SystemServiceImpl};
pub use user::{UserService, UserServiceImpl};

/// Validate offset/limit pagination parameters and convert them for the
/// repository layer
pub(crate) fn pagination(offset: i64, limit: i64) -> Option<(usize, usize)> {
    if offset < 0 || limit <= 0 {
        return None;
    }
    Some((usize::try_from(offset).ok()?, usize::try_from(limit).ok()?))
}
