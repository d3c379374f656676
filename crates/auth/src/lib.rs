//! `publish-scopes-auth` — pure role/permission model for the login pipeline.
//!
//! This crate is intentionally decoupled from HTTP and from the directory.

pub mod claims;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use claims::{ClaimError, IdToken, PERMISSIONS_CLAIM, RecordedClaims, permissions_claim_value};
pub use permissions::{Permission, permission_names};
pub use principal::{LoginUser, display_name};
pub use roles::{CandidateRoles, NormalizedRoles, Role, candidate_roles};
