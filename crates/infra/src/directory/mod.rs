//! Identity-directory boundary.
//!
//! This module defines the two read operations the login pipeline needs from
//! the directory (list tenant roles, list a role's permissions) plus the
//! factory that builds an authenticated client per invocation.

pub mod in_memory;
pub mod management;
pub mod r#trait;

pub use in_memory::{CallLog, InMemoryDirectory};
pub use management::{ManagementClient, ManagementClientFactory};
pub use r#trait::{
    Directory, DirectoryCredentials, DirectoryError, DirectoryFactory, DirectoryRole,
    PermissionRecord,
};
