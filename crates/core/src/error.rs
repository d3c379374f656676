//! Core error model.

use thiserror::Error;

/// Core-level error.
///
/// Keep this focused on deterministic input failures. Directory and
/// token-sink failures belong to the layers that talk to those systems.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// An identifier was invalid (e.g. blank).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A protocol name is not one of the known transaction protocols.
    #[error("unknown protocol: '{0}'")]
    UnknownProtocol(String),
}

impl CoreError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn unknown_protocol(name: impl Into<String>) -> Self {
        Self::UnknownProtocol(name.into())
    }
}
