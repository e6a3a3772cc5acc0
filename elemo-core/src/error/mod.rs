//! Error taxonomy for the service layer
//!
//! Every failure a service returns is an [`Error`]: an [`ErrorKind`] naming
//! where it happened, joined with an optional cause. Callers can match on the
//! kind of any error in the chain with [`Error::is`] or look for a concrete
//! cause type with [`Error::find_cause`].

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Boxed, thread-safe error used as the cause of a joined [`Error`]
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Service-wide result type
pub type Result<T> = std::result::Result<T, Error>;

/// Sentinel error kinds
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // Construction
    #[error("no logger provided")]
    NoLogger,
    #[error("no tracer provided")]
    NoTracer,
    #[error("no permission repository provided")]
    NoPermissionRepository,
    #[error("no user repository provided")]
    NoUserRepository,
    #[error("no organization repository provided")]
    NoOrganizationRepository,
    #[error("no license repository provided")]
    NoLicenseRepository,
    #[error("no license service provided")]
    NoLicenseService,
    #[error("no permission service provided")]
    NoPermissionService,
    #[error("no email service provided")]
    NoEmailService,
    #[error("no smtp client provided")]
    NoSMTPClient,
    #[error("no template renderer provided")]
    NoTemplateRenderer,
    #[error("no license provided")]
    NoLicense,
    #[error("no version info provided")]
    NoVersionInfo,
    #[error("no resources provided")]
    NoResources,

    // Authorization
    #[error("no user in context")]
    NoUser,
    #[error("no permission")]
    NoPermission,

    // Validation
    #[error("invalid id")]
    InvalidId,
    #[error("invalid email")]
    InvalidEmail,
    #[error("invalid user")]
    InvalidUser,
    #[error("invalid organization")]
    InvalidOrganization,
    #[error("invalid permission")]
    InvalidPermission,
    #[error("invalid pagination parameters")]
    InvalidPaginationParams,
    #[error("no patch data provided")]
    NoPatchData,

    // User operations
    #[error("failed to create user")]
    UserCreate,
    #[error("failed to get user")]
    UserGet,
    #[error("failed to get users")]
    UserGetAll,
    #[error("failed to update user")]
    UserUpdate,
    #[error("failed to delete user")]
    UserDelete,

    // Organization operations
    #[error("failed to create organization")]
    OrganizationCreate,
    #[error("failed to get organization")]
    OrganizationGet,
    #[error("failed to get organizations")]
    OrganizationGetAll,
    #[error("failed to update organization")]
    OrganizationUpdate,
    #[error("failed to delete organization")]
    OrganizationDelete,
    #[error("failed to add organization member")]
    OrganizationAddMember,
    #[error("failed to get organization members")]
    OrganizationGetMembers,
    #[error("failed to remove organization member")]
    OrganizationRemoveMember,
    #[error("failed to invite organization member")]
    OrganizationInvite,

    // Permission operations
    #[error("failed to create permission")]
    PermissionCreate,
    #[error("failed to delete permission")]
    PermissionDelete,

    // Email
    #[error("failed to send email")]
    EmailSend,

    // License
    #[error("failed to get license")]
    LicenseGet,
    #[error("license is invalid")]
    LicenseInvalid,
    #[error("invalid quota")]
    QuotaInvalid,
    #[error("failed to get quota usage")]
    QuotaUsageGet,
    #[error("quota exceeded")]
    QuotaExceeded,

    // System
    #[error("system health check failed")]
    SystemHealthCheck,
}

/// A sentinel kind, optionally joined with the error that caused it
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    cause: Option<BoxError>,
}

impl Error {
    /// Create a bare sentinel error
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, cause: None }
    }

    /// Join a sentinel kind with the underlying cause
    pub fn join(kind: ErrorKind, cause: impl Into<BoxError>) -> Self {
        Self {
            kind,
            cause: Some(cause.into()),
        }
    }

    /// The outermost kind of this error
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The directly joined cause, if any
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    /// Whether `kind` appears anywhere in the error chain
    pub fn is(&self, kind: ErrorKind) -> bool {
        if self.kind == kind {
            return true;
        }

        let mut source = self.source();
        while let Some(err) = source {
            if let Some(inner) = err.downcast_ref::<Error>() {
                if inner.kind == kind {
                    return true;
                }
            } else if let Some(inner) = err.downcast_ref::<ErrorKind>() {
                if *inner == kind {
                    return true;
                }
            }
            source = err.source();
        }

        false
    }

    /// Find the first cause of type `E` in the error chain
    pub fn find_cause<E: StdError + 'static>(&self) -> Option<&E> {
        let mut source = self.source();
        while let Some(err) = source {
            if let Some(found) = err.downcast_ref::<E>() {
                return Some(found);
            }
            source = err.source();
        }
        None
    }

    /// Whether a cause of type `E` appears in the error chain
    pub fn cause_is<E: StdError + 'static>(&self) -> bool {
        self.find_cause::<E>().is_some()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {}", self.kind, cause),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl PartialEq<ErrorKind> for Error {
    fn eq(&self, other: &ErrorKind) -> bool {
        self.cause.is_none() && self.kind == *other
    }
}
