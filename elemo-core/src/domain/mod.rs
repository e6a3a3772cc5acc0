//! Domain models for Elemo Core

pub mod common;
pub mod license;
pub mod organization;
pub mod permission;
pub mod system;
pub mod user;

pub use common::*;
pub use license::*;
pub use organization::*;
pub use permission::*;
pub use system::*;
pub use user::*;
