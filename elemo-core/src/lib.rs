//! Elemo Core - application service layer
//!
//! This crate provides the services of the Elemo collaboration platform:
//! users, organizations, licensing, transactional email and system health.
//! Every service authorizes the principal carried by the request
//! [`Context`], enforces license quotas and traces each operation in a span.
//! Storage and transport live outside this crate behind the traits in
//! [`repository`] and [`email`].

pub mod config;
pub mod context;
pub mod domain;
pub mod email;
pub mod error;
pub mod repository;
pub mod service;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use context::Context;
pub use error::{Error, ErrorKind, Result};
