//! `publish-scopes-core` — identifiers and the protocol gate.
//!
//! This crate contains **pure** primitives (no IO, no directory access).

pub mod error;
pub mod id;
pub mod protocol;

pub use error::CoreError;
pub use id::{RoleId, UserId};
pub use protocol::{Protocol, issues_id_token};
